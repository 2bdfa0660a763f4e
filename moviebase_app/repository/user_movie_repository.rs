use moviebase_types::{
    Result,
    movie::MovieId,
    user::UserId,
    user_movie::{ListType, MovieUserInfo, UserMovie},
};

use crate::tx::TxContext;

#[async_trait::async_trait]
pub trait UserMovieRepository: Send + Sync {
    /// Inserts a new row (assigning its id) or updates the one for the same user and movie.
    async fn save(&self, ctx: &TxContext, user_movie: &mut UserMovie) -> Result<()>;

    async fn delete(&self, ctx: &TxContext, user_movie: &UserMovie) -> Result<()>;

    async fn get_by_user_and_movie(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        movie_id: MovieId,
    ) -> Result<UserMovie>;

    /// Movies in the user's `list_type` list. `ListType::None` selects movies
    /// the user has not put in any list.
    async fn get_movies_by_user_and_list_type(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        list_type: ListType,
    ) -> Result<Vec<MovieUserInfo>>;

    async fn get_movie_by_user_and_list_type(
        &self,
        ctx: &TxContext,
        user_id: UserId,
        movie_id: MovieId,
        list_type: ListType,
    ) -> Result<MovieUserInfo>;
}
