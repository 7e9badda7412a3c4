use rusqlite::{params, types::Type, Connection, OptionalExtension};
use std::path::Path;

use super::traits::{Storage, StorageRead, StorageTx, StorageWrite};
use crate::error::Result;
use crate::types::{Answer, AnswerSpec, Question, Quiz};

const DB_SCHEMA_VERSION: i64 = 1;

#[derive(Clone)]
pub struct SqliteStorage {
    pub path: String,
}

pub struct SqliteTx {
    conn: Connection,
}

impl StorageTx for SqliteTx {
    fn commit(self) -> Result<()> {
        self.conn.execute("COMMIT", [])?;
        Ok(())
    }

    fn rollback(self) -> Result<()> {
        self.conn.execute("ROLLBACK", [])?;
        Ok(())
    }
}

fn column_u32(row: &rusqlite::Row<'_>, idx: usize) -> rusqlite::Result<u32> {
    let value: i64 = row.get(idx)?;
    value
        .try_into()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(idx, Type::Integer, Box::new(err)))
}

fn map_quiz_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Quiz> {
    let active_int: i64 = row.get(3)?;
    Ok(Quiz {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        active: active_int != 0,
    })
}

fn map_question_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Question> {
    Ok(Question {
        quiz_id: row.get(0)?,
        num: column_u32(row, 1)?,
        text: row.get(2)?,
    })
}

fn map_answer_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<Answer> {
    let correct_int: i64 = row.get(3)?;
    Ok(Answer {
        quiz_id: row.get(0)?,
        question_num: column_u32(row, 1)?,
        text: row.get(2)?,
        correct: correct_int != 0,
    })
}

fn db_load_quiz(conn: &Connection, id: i64) -> rusqlite::Result<Option<Quiz>> {
    conn.query_row(
        "SELECT id, name, description, active FROM quizzes WHERE id = ?1",
        params![id],
        map_quiz_row,
    )
    .optional()
}

fn db_load_question(conn: &Connection, quiz_id: i64, num: u32) -> rusqlite::Result<Option<Question>> {
    conn.query_row(
        "SELECT quiz_id, num, text FROM questions WHERE quiz_id = ?1 AND num = ?2",
        params![quiz_id, num as i64],
        map_question_row,
    )
    .optional()
}

fn db_list_questions(conn: &Connection, quiz_id: i64) -> rusqlite::Result<Vec<Question>> {
    let mut stmt = conn.prepare(
        "SELECT quiz_id, num, text FROM questions WHERE quiz_id = ?1 ORDER BY num ASC",
    )?;
    let mapped = stmt
        .query_map(params![quiz_id], map_question_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_max_question_num(conn: &Connection, quiz_id: i64) -> rusqlite::Result<u32> {
    let max: Option<i64> = conn.query_row(
        "SELECT max(num) FROM questions WHERE quiz_id = ?1",
        params![quiz_id],
        |row| row.get(0),
    )?;
    let max = max.unwrap_or(0);
    max.try_into()
        .map_err(|err| rusqlite::Error::FromSqlConversionFailure(0, Type::Integer, Box::new(err)))
}

fn db_list_answers(conn: &Connection, quiz_id: i64, num: u32) -> rusqlite::Result<Vec<Answer>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT quiz_id, question_num, text, correct
        FROM answers
        WHERE quiz_id = ?1
          AND question_num = ?2
        ORDER BY correct DESC, id ASC
        "#,
    )?;
    let mapped = stmt
        .query_map(params![quiz_id, num as i64], map_answer_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_list_all_answers(conn: &Connection, quiz_id: i64) -> rusqlite::Result<Vec<Answer>> {
    let mut stmt = conn.prepare(
        r#"
        SELECT quiz_id, question_num, text, correct
        FROM answers
        WHERE quiz_id = ?1
        ORDER BY question_num ASC, correct DESC, id ASC
        "#,
    )?;
    let mapped = stmt
        .query_map(params![quiz_id], map_answer_row)?
        .collect::<rusqlite::Result<Vec<_>>>()?;
    Ok(mapped)
}

fn db_save_quiz(conn: &Connection, quiz: &Quiz) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO quizzes (id, name, description, active) VALUES (?1, ?2, ?3, ?4)
                 ON CONFLICT(id) DO UPDATE SET name=excluded.name, description=excluded.description, active=excluded.active",
        params![quiz.id, quiz.name, quiz.description, quiz.active as i64],
    )?;
    Ok(())
}

fn db_insert_question(conn: &Connection, quiz_id: i64, num: u32, text: &str) -> rusqlite::Result<()> {
    conn.execute(
        "INSERT INTO questions (quiz_id, num, text) VALUES (?1, ?2, ?3)",
        params![quiz_id, num as i64, text],
    )?;
    Ok(())
}

fn db_update_question_text(
    conn: &Connection,
    quiz_id: i64,
    num: u32,
    text: &str,
) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE questions SET text = ?3 WHERE quiz_id = ?1 AND num = ?2",
        params![quiz_id, num as i64, text],
    )
}

fn db_delete_question(conn: &Connection, quiz_id: i64, num: u32) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM questions WHERE quiz_id = ?1 AND num = ?2",
        params![quiz_id, num as i64],
    )
}

fn db_insert_answers(
    conn: &Connection,
    quiz_id: i64,
    num: u32,
    answers: &[AnswerSpec],
) -> rusqlite::Result<()> {
    let mut stmt = conn.prepare(
        "INSERT INTO answers (quiz_id, question_num, text, correct) VALUES (?1, ?2, ?3, ?4)",
    )?;
    for answer in answers {
        stmt.execute(params![quiz_id, num as i64, answer.text, answer.correct as i64])?;
    }
    Ok(())
}

fn db_delete_answers(conn: &Connection, quiz_id: i64, num: u32) -> rusqlite::Result<usize> {
    conn.execute(
        "DELETE FROM answers WHERE quiz_id = ?1 AND question_num = ?2",
        params![quiz_id, num as i64],
    )
}

// Decrement in two steps through negative values so the (quiz_id, num)
// unique index never sees a transient collision mid-statement.
fn db_renumber_questions_above(conn: &Connection, quiz_id: i64, num: u32) -> rusqlite::Result<usize> {
    let shifted = conn.execute(
        "UPDATE questions SET num = -(num - 1) WHERE quiz_id = ?1 AND num > ?2",
        params![quiz_id, num as i64],
    )?;
    conn.execute(
        "UPDATE questions SET num = -num WHERE quiz_id = ?1 AND num < 0",
        params![quiz_id],
    )?;
    Ok(shifted)
}

fn db_renumber_answers_above(conn: &Connection, quiz_id: i64, num: u32) -> rusqlite::Result<usize> {
    conn.execute(
        "UPDATE answers SET question_num = question_num - 1 WHERE quiz_id = ?1 AND question_num > ?2",
        params![quiz_id, num as i64],
    )
}

impl StorageRead for SqliteTx {
    fn load_quiz(&self, id: i64) -> Result<Option<Quiz>> {
        Ok(db_load_quiz(&self.conn, id)?)
    }

    fn load_question(&self, quiz_id: i64, num: u32) -> Result<Option<Question>> {
        Ok(db_load_question(&self.conn, quiz_id, num)?)
    }

    fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>> {
        Ok(db_list_questions(&self.conn, quiz_id)?)
    }

    fn max_question_num(&self, quiz_id: i64) -> Result<u32> {
        Ok(db_max_question_num(&self.conn, quiz_id)?)
    }

    fn list_answers(&self, quiz_id: i64, num: u32) -> Result<Vec<Answer>> {
        Ok(db_list_answers(&self.conn, quiz_id, num)?)
    }

    fn list_all_answers(&self, quiz_id: i64) -> Result<Vec<Answer>> {
        Ok(db_list_all_answers(&self.conn, quiz_id)?)
    }
}

impl StorageWrite for SqliteTx {
    fn save_quiz(&self, quiz: &Quiz) -> Result<()> {
        Ok(db_save_quiz(&self.conn, quiz)?)
    }

    fn insert_question(&self, quiz_id: i64, num: u32, text: &str) -> Result<()> {
        Ok(db_insert_question(&self.conn, quiz_id, num, text)?)
    }

    fn update_question_text(&self, quiz_id: i64, num: u32, text: &str) -> Result<usize> {
        Ok(db_update_question_text(&self.conn, quiz_id, num, text)?)
    }

    fn delete_question(&self, quiz_id: i64, num: u32) -> Result<usize> {
        Ok(db_delete_question(&self.conn, quiz_id, num)?)
    }

    fn insert_answers(&self, quiz_id: i64, num: u32, answers: &[AnswerSpec]) -> Result<()> {
        Ok(db_insert_answers(&self.conn, quiz_id, num, answers)?)
    }

    fn delete_answers(&self, quiz_id: i64, num: u32) -> Result<usize> {
        Ok(db_delete_answers(&self.conn, quiz_id, num)?)
    }

    fn renumber_questions_above(&self, quiz_id: i64, num: u32) -> Result<usize> {
        Ok(db_renumber_questions_above(&self.conn, quiz_id, num)?)
    }

    fn renumber_answers_above(&self, quiz_id: i64, num: u32) -> Result<usize> {
        Ok(db_renumber_answers_above(&self.conn, quiz_id, num)?)
    }
}

impl Storage for SqliteStorage {
    type Tx = SqliteTx;

    fn begin_tx(&self) -> Result<Self::Tx> {
        let conn = self.open_conn()?;
        conn.execute("BEGIN IMMEDIATE", [])?;
        Ok(SqliteTx { conn })
    }
}

impl SqliteStorage {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_string_lossy().to_string(),
        }
    }

    /// Remove the backing database file to force a clean start.
    pub fn reset_all(&self) -> std::io::Result<()> {
        if !std::path::Path::new(&self.path).exists() {
            return Ok(());
        }
        std::fs::remove_file(&self.path)
    }

    pub fn init(&self) -> Result<()> {
        self.with_conn(|_conn| Ok(()))?;
        Ok(())
    }

    fn open_conn(&self) -> rusqlite::Result<Connection> {
        let conn = Connection::open(&self.path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        conn.pragma_update(None, "synchronous", "NORMAL")?;
        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.busy_timeout(std::time::Duration::from_millis(500))?;

        Self::migrate(&conn)?;
        Ok(conn)
    }

    fn with_conn<F, T>(&self, f: F) -> rusqlite::Result<T>
    where
        F: FnOnce(&Connection) -> rusqlite::Result<T>,
    {
        let conn = self.open_conn()?;
        f(&conn)
    }

    fn migrate(conn: &Connection) -> rusqlite::Result<()> {
        let version: i64 = conn.query_row("PRAGMA user_version", [], |row| row.get(0))?;

        if version == DB_SCHEMA_VERSION {
            return Ok(());
        }

        if version == 0 {
            log::info!(
                "SQLite schema migration: {} -> {}",
                version,
                DB_SCHEMA_VERSION
            );
            conn.execute_batch(
                r#"
            CREATE TABLE quizzes (
                id INTEGER PRIMARY KEY,
                name TEXT NOT NULL,
                description TEXT NOT NULL,
                active INTEGER NOT NULL CHECK (active IN (0, 1))
            );
            CREATE TABLE questions (
                quiz_id INTEGER NOT NULL REFERENCES quizzes(id),
                num INTEGER NOT NULL,
                text TEXT NOT NULL,
                UNIQUE (quiz_id, num)
            );
            CREATE TABLE answers (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                quiz_id INTEGER NOT NULL,
                question_num INTEGER NOT NULL,
                text TEXT NOT NULL,
                correct INTEGER NOT NULL CHECK (correct IN (0, 1)),
                FOREIGN KEY (quiz_id, question_num)
                    REFERENCES questions (quiz_id, num)
                    DEFERRABLE INITIALLY DEFERRED
            );
            CREATE INDEX answers_question_idx
                ON answers(quiz_id, question_num);
        "#,
            )?;
            conn.pragma_update(None, "user_version", DB_SCHEMA_VERSION)?;
            return Ok(());
        }

        Err(rusqlite::Error::SqliteFailure(
            rusqlite::ffi::Error::new(rusqlite::ffi::ErrorCode::SchemaChanged as i32),
            Some("database schema version mismatch; reset the database and retry".to_string()),
        ))
    }
}

impl StorageRead for SqliteStorage {
    fn load_quiz(&self, id: i64) -> Result<Option<Quiz>> {
        Ok(self.with_conn(|conn| db_load_quiz(conn, id))?)
    }

    fn load_question(&self, quiz_id: i64, num: u32) -> Result<Option<Question>> {
        Ok(self.with_conn(|conn| db_load_question(conn, quiz_id, num))?)
    }

    fn list_questions(&self, quiz_id: i64) -> Result<Vec<Question>> {
        Ok(self.with_conn(|conn| db_list_questions(conn, quiz_id))?)
    }

    fn max_question_num(&self, quiz_id: i64) -> Result<u32> {
        Ok(self.with_conn(|conn| db_max_question_num(conn, quiz_id))?)
    }

    fn list_answers(&self, quiz_id: i64, num: u32) -> Result<Vec<Answer>> {
        Ok(self.with_conn(|conn| db_list_answers(conn, quiz_id, num))?)
    }

    fn list_all_answers(&self, quiz_id: i64) -> Result<Vec<Answer>> {
        Ok(self.with_conn(|conn| db_list_all_answers(conn, quiz_id))?)
    }
}
