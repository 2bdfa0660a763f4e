use moviebase_types::{
    Result,
    user::{User, UserId},
};

use crate::tx::TxContext;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Find user by id.
    async fn get_by_id(&self, ctx: &TxContext, id: UserId) -> Result<User>;

    /// Find user by email.
    async fn get_by_email(&self, ctx: &TxContext, email: &str) -> Result<User>;

    /// Inserts the user and assigns its id, or updates it when it already has one.
    async fn save(&self, ctx: &TxContext, user: &mut User) -> Result<()>;

    async fn exists_by_email(&self, ctx: &TxContext, email: &str) -> Result<bool>;
}
