use crate::error::Result;
use crate::types::{Answer, AnswerSpec, Question, Quiz};

pub trait StorageTx {
    fn commit(self) -> Result<()>;
    fn rollback(self) -> Result<()>;
}

pub trait StorageRead {
    fn load_quiz(&self, id: i64) -> Result<Option<Quiz>>;
    fn load_question(&self, quiz_id: i64, num: u32) -> Result<Option<Question>>;
    /// Questions of a quiz ordered ascending by `num`.
    fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>>;
    /// Highest question number in use for a quiz, 0 when the quiz is empty.
    fn max_question_num(&self, quiz_id: i64) -> Result<u32>;
    /// Answers of one question, correct-first then insertion order.
    fn list_answers(&self, quiz_id: i64, num: u32) -> Result<Vec<Answer>>;
    /// Answers of every question, ordered by question number, then
    /// correct-first, then insertion order.
    fn list_all_answers(&self, quiz_id: i64) -> Result<Vec<Answer>>;
}

pub trait StorageWrite {
    fn save_quiz(&self, quiz: &Quiz) -> Result<()>;
    fn insert_question(&self, quiz_id: i64, num: u32, text: &str) -> Result<()>;
    /// Returns the number of rows changed.
    fn update_question_text(&self, quiz_id: i64, num: u32, text: &str) -> Result<usize>;
    /// Returns the number of rows deleted.
    fn delete_question(&self, quiz_id: i64, num: u32) -> Result<usize>;
    fn insert_answers(&self, quiz_id: i64, num: u32, answers: &[AnswerSpec]) -> Result<()>;
    /// Returns the number of rows deleted.
    fn delete_answers(&self, quiz_id: i64, num: u32) -> Result<usize>;
    /// Decrement by one the `num` of every question above `num`.
    fn renumber_questions_above(&self, quiz_id: i64, num: u32) -> Result<usize>;
    /// Decrement by one the `question_num` of every answer above `num`.
    fn renumber_answers_above(&self, quiz_id: i64, num: u32) -> Result<usize>;
}

pub trait Storage {
    type Tx: StorageTx + StorageRead + StorageWrite;

    /// Open a write transaction. Writers serialize here: the transaction
    /// takes the database write lock when it begins, not at first write.
    fn begin_tx(&self) -> Result<Self::Tx>;
}
