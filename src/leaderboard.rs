use serde::{Deserialize, Serialize};

use crate::error::Result;

/// One completed attempt at a quiz. Timestamps are UNIX seconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Member {
    pub name: String,
    pub score: i64,
    pub start: i64,
    pub end: i64,
    pub time_taken: i64,
}

/// Narrow interface to the external leaderboard service. Ranking and
/// participant storage live entirely on the other side of this seam.
pub trait Leaderboard {
    /// All members recorded for a quiz, in the collaborator's order.
    fn members(&self, quiz_id: i64) -> Result<Vec<Member>>;

    /// Top `limit` members for a quiz, ranked by the collaborator.
    fn top_members(&self, quiz_id: i64, limit: usize) -> Result<Vec<Member>>;

    /// Record a completed attempt.
    fn add_member(&self, quiz_id: i64, member: Member) -> Result<()>;
}
