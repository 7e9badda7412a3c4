pub mod error;
pub mod leaderboard;
pub mod quiz;
pub mod storage;
pub mod tracing;
pub mod types;

pub use error::{QuizError, Result};
pub use leaderboard::{Leaderboard, Member};
pub use quiz::QuizRepository;
pub use storage::SqliteStorage;
pub use types::{Answer, AnswerSpec, Question, Quiz};
