use serde::{Deserialize, Serialize};

use crate::domain::post::PostId;
use crate::domain::user::UserId;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reaction {
    pub user_id: UserId,
    pub post_id: PostId,
    #[serde(default)]
    pub emoji_name: String,
    #[serde(default)]
    pub create_at: i64,
}
