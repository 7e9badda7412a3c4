use std::collections::BTreeMap;
use std::sync::Arc;

use crate::error::{QuizError, Result};
use crate::leaderboard::{Leaderboard, Member};
use crate::storage::{Storage, StorageRead, StorageTx, StorageWrite};
use crate::types::{AnswerSpec, Quiz};

/// Repository over one quiz's questions, answers, and participants.
///
/// Call [`set_id`](Self::set_id) before anything else; every other operation
/// is scoped to the quiz loaded there. Question numbers stay contiguous
/// (1..=N): deletions renumber everything above the removed question, answers
/// included, inside a single transaction.
pub struct QuizRepository<S> {
    storage: S,
    leaderboard: Arc<dyn Leaderboard + Send + Sync>,
    quiz: Option<Quiz>,
    users: Option<Vec<Member>>,
}

impl<S> QuizRepository<S>
where
    S: Storage + StorageRead,
{
    pub fn new(storage: S, leaderboard: Arc<dyn Leaderboard + Send + Sync>) -> Self {
        Self {
            storage,
            leaderboard,
            quiz: None,
            users: None,
        }
    }

    /// Load quiz metadata by id. Fails with [`QuizError::NotFound`] when no
    /// such quiz exists, leaving no quiz state populated.
    pub fn set_id(&mut self, id: i64) -> Result<()> {
        let quiz = self.storage.load_quiz(id)?.ok_or(QuizError::NotFound)?;
        tracing::debug!(quiz_id = id, "loaded quiz");
        self.quiz = Some(quiz);
        self.users = None;
        Ok(())
    }

    fn current(&self) -> Result<&Quiz> {
        self.quiz.as_ref().ok_or(QuizError::NotFound)
    }

    pub fn id(&self) -> Result<i64> {
        Ok(self.current()?.id)
    }

    /// Quiz name, title-cased per word for display.
    pub fn name(&self) -> Result<String> {
        Ok(title_case(&self.current()?.name))
    }

    pub fn description(&self) -> Result<&str> {
        Ok(self.current()?.description.as_str())
    }

    pub fn is_active(&self) -> Result<bool> {
        Ok(self.current()?.active)
    }

    /// Answer texts for one question: the correct answers first, then the
    /// rest in insertion order. Returns a fresh vector on every call.
    pub fn answers(&self, num: u32) -> Result<Vec<String>> {
        let quiz_id = self.current()?.id;
        let answers = self.storage.list_answers(quiz_id, num)?;
        Ok(answers.into_iter().map(|a| a.text).collect())
    }

    /// Answer texts for every question of the quiz, keyed by question number,
    /// each list ordered correct-first.
    pub fn all_answers(&self) -> Result<BTreeMap<u32, Vec<String>>> {
        let quiz_id = self.current()?.id;
        let mut grouped: BTreeMap<u32, Vec<String>> = BTreeMap::new();
        for answer in self.storage.list_all_answers(quiz_id)? {
            grouped.entry(answer.question_num).or_default().push(answer.text);
        }
        Ok(grouped)
    }

    /// Replace a question's entire answer set atomically: either the old set
    /// or the new set survives a failure, never a mixture.
    pub fn update_answers(&self, num: u32, answers: &[AnswerSpec]) -> Result<()> {
        let quiz_id = self.current()?.id;
        let tx = self.storage.begin_tx()?;
        tx.delete_answers(quiz_id, num)?;
        tx.insert_answers(quiz_id, num, answers)?;
        tx.commit()?;
        tracing::debug!(quiz_id, num, count = answers.len(), "replaced answers");
        Ok(())
    }

    /// Bulk-insert answers for a question. No count or correctness-marker
    /// validation is applied here.
    pub fn add_answers(&self, num: u32, answers: &[AnswerSpec]) -> Result<()> {
        let quiz_id = self.current()?.id;
        let tx = self.storage.begin_tx()?;
        tx.insert_answers(quiz_id, num, answers)?;
        tx.commit()?;
        Ok(())
    }

    /// Remove all answers for one question of the current quiz.
    pub fn delete_answers(&self, num: u32) -> Result<()> {
        let quiz_id = self.current()?.id;
        let tx = self.storage.begin_tx()?;
        let removed = tx.delete_answers(quiz_id, num)?;
        tx.commit()?;
        tracing::debug!(quiz_id, num, removed, "deleted answers");
        Ok(())
    }

    /// Append a question with its answers, assigning the next number in the
    /// quiz's 1..=N sequence. Returns the assigned number.
    pub fn add_question(&self, text: &str, answers: &[AnswerSpec]) -> Result<u32> {
        if answers.is_empty() {
            return Err(QuizError::Constraint(
                "a question needs at least one answer".to_string(),
            ));
        }
        let quiz_id = self.current()?.id;
        let tx = self.storage.begin_tx()?;
        let num = tx.max_question_num(quiz_id)? + 1;
        tx.insert_question(quiz_id, num, text)?;
        tx.insert_answers(quiz_id, num, answers)?;
        tx.commit()?;
        tracing::debug!(quiz_id, num, "added question");
        Ok(num)
    }

    /// In-place text update; numbering and answers are untouched.
    pub fn update_question(&self, num: u32, text: &str) -> Result<()> {
        let quiz_id = self.current()?.id;
        let tx = self.storage.begin_tx()?;
        let changed = tx.update_question_text(quiz_id, num, text)?;
        if changed == 0 {
            tx.rollback()?;
            return Err(QuizError::NotFound);
        }
        tx.commit()?;
        Ok(())
    }

    /// Delete a question, its answers, and close the numbering gap: every
    /// question and answer above `num` moves down by one. Runs as a single
    /// transaction; a failure partway rolls everything back.
    pub fn delete_question(&self, num: u32) -> Result<()> {
        let quiz_id = self.current()?.id;
        let tx = self.storage.begin_tx()?;
        let deleted = tx.delete_question(quiz_id, num)?;
        if deleted == 0 {
            tx.rollback()?;
            return Err(QuizError::NotFound);
        }
        tx.delete_answers(quiz_id, num)?;
        let shifted = tx.renumber_questions_above(quiz_id, num)?;
        tx.renumber_answers_above(quiz_id, num)?;
        tx.commit()?;
        tracing::debug!(quiz_id, num, shifted, "deleted question");
        Ok(())
    }

    /// Text of one question; [`QuizError::NotFound`] when absent.
    pub fn question(&self, num: u32) -> Result<String> {
        let quiz_id = self.current()?.id;
        let question = self
            .storage
            .load_question(quiz_id, num)?
            .ok_or(QuizError::NotFound)?;
        Ok(question.text)
    }

    /// Mapping of question number to text for the whole quiz, ascending.
    pub fn questions(&self) -> Result<BTreeMap<u32, String>> {
        let quiz_id = self.current()?.id;
        let questions = self.storage.list_questions(quiz_id)?;
        Ok(questions.into_iter().map(|q| (q.num, q.text)).collect())
    }

    /// Cache the participant list for the current quiz from the leaderboard.
    pub fn populate_users(&mut self) -> Result<()> {
        let quiz_id = self.current()?.id;
        self.users = Some(self.leaderboard.members(quiz_id)?);
        Ok(())
    }

    /// Cached participants; empty until [`populate_users`](Self::populate_users).
    pub fn users(&self) -> &[Member] {
        self.users.as_deref().unwrap_or(&[])
    }

    /// Top-n leaderboard entries for the current quiz.
    pub fn get_leaders(&self, n: usize) -> Result<Vec<Member>> {
        let quiz_id = self.current()?.id;
        self.leaderboard.top_members(quiz_id, n)
    }

    /// Whether `username` is still available among the loaded participants.
    /// An unloaded cache reports every name as available.
    pub fn register_user(&self, username: &str) -> bool {
        !self.users().iter().any(|member| member.name == username)
    }

    /// Record a completed attempt with the leaderboard collaborator.
    pub fn add_quiz_taker(
        &self,
        user: &str,
        score: i64,
        start: i64,
        end: i64,
        time_taken: i64,
    ) -> Result<()> {
        let quiz_id = self.current()?.id;
        self.leaderboard.add_member(
            quiz_id,
            Member {
                name: user.to_string(),
                score,
                start,
                end,
                time_taken,
            },
        )
    }
}

/// Uppercase the first letter of each whitespace-separated word, leaving the
/// rest of the word untouched.
fn title_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut at_word_start = true;
    for ch in name.chars() {
        if at_word_start {
            out.extend(ch.to_uppercase());
        } else {
            out.push(ch);
        }
        at_word_start = ch.is_whitespace();
    }
    out
}
