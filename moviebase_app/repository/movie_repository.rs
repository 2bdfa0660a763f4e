use moviebase_types::{
    Result,
    movie::{Movie, MovieId, MovieInfo},
};

use crate::tx::TxContext;

#[async_trait::async_trait]
pub trait MovieRepository: Send + Sync {
    /// Lists every movie with its average user rating.
    async fn get_all(&self, ctx: &TxContext) -> Result<Vec<Movie>>;

    /// Find a movie by title and release date.
    async fn get_by_release_date_and_title(&self, ctx: &TxContext, info: &MovieInfo)
    -> Result<Movie>;

    /// Same lookup as `get_by_release_date_and_title`, returning only the id.
    async fn get_id_by_release_date_and_title(
        &self,
        ctx: &TxContext,
        info: &MovieInfo,
    ) -> Result<MovieId>;
}
