use std::sync::{Arc, Mutex};

use quizstore::storage::{Storage, StorageTx, StorageWrite};
use quizstore::{
    AnswerSpec, Leaderboard, Member, Quiz, QuizRepository, Result, SqliteStorage,
};

struct RecordingLeaderboard {
    members: Mutex<Vec<(i64, Member)>>,
}

impl Leaderboard for RecordingLeaderboard {
    fn members(&self, quiz_id: i64) -> Result<Vec<Member>> {
        Ok(self
            .members
            .lock()
            .unwrap()
            .iter()
            .filter(|(id, _)| *id == quiz_id)
            .map(|(_, m)| m.clone())
            .collect())
    }

    fn top_members(&self, quiz_id: i64, limit: usize) -> Result<Vec<Member>> {
        let mut members = self.members(quiz_id)?;
        members.sort_by(|a, b| b.score.cmp(&a.score));
        members.truncate(limit);
        Ok(members)
    }

    fn add_member(&self, quiz_id: i64, member: Member) -> Result<()> {
        self.members.lock().unwrap().push((quiz_id, member));
        Ok(())
    }
}

#[test]
fn full_quiz_lifecycle() {
    quizstore::tracing::init();

    let dir = tempfile::tempdir().unwrap();
    let storage = SqliteStorage::new(dir.path().join("quiz.db"));
    storage.init().unwrap();

    let tx = storage.begin_tx().unwrap();
    tx.save_quiz(&Quiz {
        id: 1,
        name: "history 101".to_string(),
        description: "ancient to modern".to_string(),
        active: true,
    })
    .unwrap();
    tx.commit().unwrap();

    let leaderboard = Arc::new(RecordingLeaderboard {
        members: Mutex::new(Vec::new()),
    });
    let mut repo = QuizRepository::new(storage, leaderboard);

    assert!(repo.set_id(99).unwrap_err().is_not_found());
    repo.set_id(1).unwrap();
    assert_eq!(repo.name().unwrap(), "History 101");

    // Author the quiz.
    repo.add_question(
        "Year the Berlin Wall fell?",
        &[
            AnswerSpec::new("1989", true),
            AnswerSpec::new("1991", false),
            AnswerSpec::new("1979", false),
        ],
    )
    .unwrap();
    repo.add_question(
        "First Roman emperor?",
        &[AnswerSpec::new("Augustus", true), AnswerSpec::new("Caesar", false)],
    )
    .unwrap();
    repo.add_question(
        "Century of the French Revolution?",
        &[AnswerSpec::new("18th", true), AnswerSpec::new("17th", false)],
    )
    .unwrap();

    // Edit pass: tighten a question, replace an answer set.
    repo.update_question(2, "Who was the first Roman emperor?").unwrap();
    repo.update_answers(
        3,
        &[
            AnswerSpec::new("19th", false),
            AnswerSpec::new("18th", true),
        ],
    )
    .unwrap();
    assert_eq!(repo.answers(3).unwrap(), vec!["18th", "19th"]);

    // Drop the middle question and verify the renumber.
    repo.delete_question(2).unwrap();
    let questions = repo.questions().unwrap();
    assert_eq!(questions.len(), 2);
    assert_eq!(
        questions.get(&2).map(String::as_str),
        Some("Century of the French Revolution?")
    );
    assert_eq!(repo.answers(2).unwrap(), vec!["18th", "19th"]);

    let grouped = repo.all_answers().unwrap();
    assert_eq!(grouped[&1][0], "1989");
    assert_eq!(grouped[&2][0], "18th");

    // A participant takes the quiz.
    assert!(repo.register_user("ada"));
    repo.add_quiz_taker("ada", 2, 1_700_000_000, 1_700_000_090, 90).unwrap();
    repo.populate_users().unwrap();
    assert!(!repo.register_user("ada"));
    assert_eq!(repo.get_leaders(5).unwrap().len(), 1);
}
