use serde::{Deserialize, Serialize};

use crate::{review::ReviewId, user::UserId};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReviewLike {
    pub user_id: UserId,
    pub review_id: ReviewId,
}

impl ReviewLike {
    pub fn new(user_id: UserId, review_id: ReviewId) -> Self {
        Self { user_id, review_id }
    }
}
