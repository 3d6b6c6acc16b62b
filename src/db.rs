use anyhow::{anyhow, Context, Result};
use rusqlite::{params, Connection};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use tracing::warn;

use crate::models::{ApplicationRecord, FailureRecord, Question, QuestionSet};

/// Longest text value written to any column.
pub const MAX_FIELD_CHARS: usize = 131_000;

pub struct Database {
    conn: Connection,
    path: PathBuf,
}

impl Database {
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open record store at {}", path.display()))?;
        Ok(Self { conn, path: path.to_path_buf() })
    }

    #[cfg(test)]
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn, path: PathBuf::from(":memory:") };
        db.init()?;
        Ok(db)
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    pub fn init(&self) -> Result<()> {
        self.conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS applied_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL,
                title TEXT NOT NULL,
                company TEXT NOT NULL,
                work_location TEXT NOT NULL,
                work_style TEXT NOT NULL,
                about_job TEXT NOT NULL,
                experience_required TEXT NOT NULL,
                skills TEXT NOT NULL,
                hr_name TEXT NOT NULL,
                hr_link TEXT NOT NULL,
                resume TEXT NOT NULL,
                reposted INTEGER NOT NULL DEFAULT 0,
                date_listed TEXT NOT NULL,
                date_applied TEXT NOT NULL,
                job_link TEXT NOT NULL,
                application_link TEXT NOT NULL,
                questions TEXT NOT NULL,
                connect_request TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE TABLE IF NOT EXISTS failed_jobs (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                job_id TEXT NOT NULL,
                job_link TEXT NOT NULL,
                resume TEXT NOT NULL,
                date_listed TEXT NOT NULL,
                date_tried TEXT NOT NULL,
                reason TEXT NOT NULL,
                detail TEXT NOT NULL,
                application_link TEXT NOT NULL,
                screenshot TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (datetime('now'))
            );

            CREATE INDEX IF NOT EXISTS idx_applied_job_id ON applied_jobs(job_id);
            CREATE INDEX IF NOT EXISTS idx_failed_job_id ON failed_jobs(job_id);
            "#,
        )?;
        Ok(())
    }

    pub fn ensure_initialized(&self) -> Result<()> {
        let tables: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM sqlite_master WHERE type='table' AND name='applied_jobs'",
            [],
            |row| row.get(0),
        )?;
        if tables == 0 {
            return Err(anyhow!(
                "Record store not initialized. Run 'autoapply init' first."
            ));
        }
        Ok(())
    }

    // --- Writes ---

    pub fn append_application(&self, record: &ApplicationRecord) -> Result<()> {
        let questions = questions_json(&record.job_id, &record.questions)?;
        self.conn
            .execute(
                "INSERT INTO applied_jobs (job_id, title, company, work_location, work_style,
                    about_job, experience_required, skills, hr_name, hr_link, resume, reposted,
                    date_listed, date_applied, job_link, application_link, questions, connect_request)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18)",
                params![
                    truncate(&record.job_id),
                    truncate(&record.title),
                    truncate(&record.company),
                    truncate(&record.work_location),
                    truncate(&record.work_style),
                    truncate(&record.about_job),
                    truncate(&record.experience_required),
                    truncate(&record.skills),
                    truncate(&record.hr_name),
                    truncate(&record.hr_link),
                    truncate(&record.resume),
                    record.reposted,
                    truncate(&record.date_listed),
                    truncate(&record.date_applied),
                    truncate(&record.job_link),
                    truncate(&record.application_link),
                    questions,
                    truncate(&record.connect_request),
                ],
            )
            .context("Failed to append application record")?;
        Ok(())
    }

    pub fn append_failure(&self, record: &FailureRecord) -> Result<()> {
        self.conn
            .execute(
                "INSERT INTO failed_jobs (job_id, job_link, resume, date_listed, date_tried,
                    reason, detail, application_link, screenshot)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)",
                params![
                    truncate(&record.job_id),
                    truncate(&record.job_link),
                    truncate(&record.resume),
                    truncate(&record.date_listed),
                    truncate(&record.date_tried),
                    truncate(&record.reason),
                    truncate(&record.detail),
                    truncate(&record.application_link),
                    truncate(&record.screenshot),
                ],
            )
            .context("Failed to append failure record")?;
        Ok(())
    }

    // --- Reads ---

    pub fn applied_job_ids(&self) -> Result<HashSet<String>> {
        let mut stmt = self.conn.prepare("SELECT job_id FROM applied_jobs")?;
        let rows = stmt.query_map([], |row| row.get::<_, String>(0))?;
        rows.collect::<Result<HashSet<_>, _>>()
            .context("Failed to read applied job ids")
    }

    pub fn list_applications(&self, limit: usize, company: Option<&str>) -> Result<Vec<ApplicationRecord>> {
        let mut sql = format!("SELECT {} FROM applied_jobs", APPLICATION_COLUMNS);
        if company.is_some() {
            sql.push_str(" WHERE LOWER(company) LIKE '%' || LOWER(?1) || '%'");
        }
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {}", limit));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if let Some(c) = company {
            stmt.query_map([c], Self::row_to_application)?
        } else {
            stmt.query_map([], Self::row_to_application)?
        };
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list applications")
    }

    pub fn get_application(&self, job_id: &str) -> Result<Option<ApplicationRecord>> {
        let result = self.conn.query_row(
            &format!(
                "SELECT {} FROM applied_jobs WHERE job_id = ?1 ORDER BY id DESC LIMIT 1",
                APPLICATION_COLUMNS
            ),
            [job_id],
            Self::row_to_application,
        );
        match result {
            Ok(record) => Ok(Some(record)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    pub fn list_failures(&self, limit: usize, reason: Option<&str>) -> Result<Vec<FailureRecord>> {
        let mut sql = format!("SELECT {} FROM failed_jobs", FAILURE_COLUMNS);
        if reason.is_some() {
            sql.push_str(" WHERE LOWER(reason) LIKE '%' || LOWER(?1) || '%'");
        }
        sql.push_str(&format!(" ORDER BY id DESC LIMIT {}", limit));

        let mut stmt = self.conn.prepare(&sql)?;
        let rows = if let Some(r) = reason {
            stmt.query_map([r], Self::row_to_failure)?
        } else {
            stmt.query_map([], Self::row_to_failure)?
        };
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list failures")
    }

    pub fn failures_for(&self, job_id: &str) -> Result<Vec<FailureRecord>> {
        let mut stmt = self.conn.prepare(&format!(
            "SELECT {} FROM failed_jobs WHERE job_id = ?1 ORDER BY id",
            FAILURE_COLUMNS
        ))?;
        let rows = stmt.query_map([job_id], Self::row_to_failure)?;
        rows.collect::<Result<Vec<_>, _>>()
            .context("Failed to list failures for job")
    }

    fn row_to_application(row: &rusqlite::Row) -> rusqlite::Result<ApplicationRecord> {
        let questions: String = row.get(16)?;
        // Older or hand-edited rows may hold something that isn't JSON.
        let questions: QuestionSet = serde_json::from_str(&questions).unwrap_or_default();
        Ok(ApplicationRecord {
            job_id: row.get(0)?,
            title: row.get(1)?,
            company: row.get(2)?,
            work_location: row.get(3)?,
            work_style: row.get(4)?,
            about_job: row.get(5)?,
            experience_required: row.get(6)?,
            skills: row.get(7)?,
            hr_name: row.get(8)?,
            hr_link: row.get(9)?,
            resume: row.get(10)?,
            reposted: row.get(11)?,
            date_listed: row.get(12)?,
            date_applied: row.get(13)?,
            job_link: row.get(14)?,
            application_link: row.get(15)?,
            questions,
            connect_request: row.get(17)?,
        })
    }

    fn row_to_failure(row: &rusqlite::Row) -> rusqlite::Result<FailureRecord> {
        Ok(FailureRecord {
            job_id: row.get(0)?,
            job_link: row.get(1)?,
            resume: row.get(2)?,
            date_listed: row.get(3)?,
            date_tried: row.get(4)?,
            reason: row.get(5)?,
            detail: row.get(6)?,
            application_link: row.get(7)?,
            screenshot: row.get(8)?,
        })
    }

    #[cfg(test)]
    pub(crate) fn conn(&self) -> &Connection {
        &self.conn
    }
}

const APPLICATION_COLUMNS: &str = "job_id, title, company, work_location, work_style, about_job,
    experience_required, skills, hr_name, hr_link, resume, reposted, date_listed, date_applied,
    job_link, application_link, questions, connect_request";

const FAILURE_COLUMNS: &str =
    "job_id, job_link, resume, date_listed, date_tried, reason, detail, application_link, screenshot";

/// The questions as a JSON array that fits one column. Whole questions are
/// dropped from the end rather than cutting the JSON mid-value.
fn questions_json(job_id: &str, questions: &QuestionSet) -> Result<String> {
    let mut kept: Vec<&Question> = questions.iter().collect();
    loop {
        let json = serde_json::to_string(&kept)?;
        if json.chars().count() <= MAX_FIELD_CHARS {
            if kept.len() < questions.len() {
                warn!(job_id, kept = kept.len(), total = questions.len(), "questions too long to store, dropped some");
            }
            return Ok(json);
        }
        kept.pop();
    }
}

pub fn truncate(s: &str) -> &str {
    match s.char_indices().nth(MAX_FIELD_CHARS) {
        Some((idx, _)) => &s[..idx],
        None => s,
    }
}
