use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Quiz {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub active: bool,
}

/// One question of a quiz. `num` is 1-based and contiguous per quiz.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub quiz_id: i64,
    pub num: u32,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Answer {
    pub quiz_id: i64,
    pub question_num: u32,
    pub text: String,
    pub correct: bool,
}

/// Payload accepted by the answer insert paths.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerSpec {
    pub text: String,
    pub correct: bool,
}

impl AnswerSpec {
    pub fn new<T: Into<String>>(text: T, correct: bool) -> Self {
        Self {
            text: text.into(),
            correct,
        }
    }
}
