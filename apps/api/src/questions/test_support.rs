//! In-memory repository and stub provider shared by unit and router tests.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;

use crate::llm_client::{LlmError, TextGenerator};
use crate::models::question::{QuestionRow, QuestionStats, QuestionType};
use crate::questions::repository::{GroupingKey, QuestionRepository};

#[derive(Default)]
pub struct InMemoryQuestionRepository {
    rows: Mutex<Vec<QuestionRow>>,
    next_id: Mutex<i64>,
}

impl InMemoryQuestionRepository {
    pub fn row_count(&self) -> usize {
        self.rows.lock().unwrap().len()
    }

    /// Writes a row bypassing the typed boundary, the way legacy data might look.
    pub fn insert_raw(&self, job_title: &str, question_type: &str, question_text: &str) -> i64 {
        let mut next_id = self.next_id.lock().unwrap();
        *next_id += 1;
        self.rows.lock().unwrap().push(QuestionRow {
            id: *next_id,
            job_title: job_title.to_string(),
            question_type: question_type.to_string(),
            question_text: question_text.to_string(),
            created_at: Utc::now(),
        });
        *next_id
    }
}

#[async_trait]
impl QuestionRepository for InMemoryQuestionRepository {
    async fn insert(
        &self,
        job_title: &str,
        question_type: QuestionType,
        question_text: &str,
    ) -> Result<i64, sqlx::Error> {
        Ok(self.insert_raw(job_title, question_type.as_str(), question_text))
    }

    async fn list_all(&self) -> Result<Vec<QuestionRow>, sqlx::Error> {
        Ok(self.rows.lock().unwrap().clone())
    }

    async fn delete_by_job_title(&self, job_title: &str) -> Result<u64, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.job_title != job_title);
        Ok((before - rows.len()) as u64)
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, sqlx::Error> {
        let mut rows = self.rows.lock().unwrap();
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok(rows.len() < before)
    }

    async fn count_all(&self) -> Result<i64, sqlx::Error> {
        Ok(self.rows.lock().unwrap().len() as i64)
    }

    async fn count_by(&self, key: GroupingKey) -> Result<BTreeMap<String, i64>, sqlx::Error> {
        let mut counts = BTreeMap::new();
        for row in self.rows.lock().unwrap().iter() {
            let value = match key {
                GroupingKey::JobTitle => &row.job_title,
                GroupingKey::QuestionType => &row.question_type,
            };
            *counts.entry(value.clone()).or_insert(0) += 1;
        }
        Ok(counts)
    }

    async fn count_snapshot(&self) -> Result<QuestionStats, sqlx::Error> {
        let rows = self.rows.lock().unwrap();
        let mut stats = QuestionStats {
            total: rows.len() as i64,
            by_job_title: BTreeMap::new(),
            by_type: BTreeMap::new(),
        };
        for row in rows.iter() {
            *stats.by_job_title.entry(row.job_title.clone()).or_insert(0) += 1;
            *stats.by_type.entry(row.question_type.clone()).or_insert(0) += 1;
        }
        Ok(stats)
    }
}

/// Wraps the in-memory repository and commits a foreign row after every
/// standalone count, the way a concurrent writer could between autocommit reads.
#[derive(Default)]
pub struct InterleavingWriteRepository {
    pub inner: InMemoryQuestionRepository,
}

impl InterleavingWriteRepository {
    fn concurrent_write(&self) {
        self.inner
            .insert_raw("Concurrent Writer", "technical", "written mid-read");
    }
}

#[async_trait]
impl QuestionRepository for InterleavingWriteRepository {
    async fn insert(
        &self,
        job_title: &str,
        question_type: QuestionType,
        question_text: &str,
    ) -> Result<i64, sqlx::Error> {
        self.inner.insert(job_title, question_type, question_text).await
    }

    async fn list_all(&self) -> Result<Vec<QuestionRow>, sqlx::Error> {
        self.inner.list_all().await
    }

    async fn delete_by_job_title(&self, job_title: &str) -> Result<u64, sqlx::Error> {
        self.inner.delete_by_job_title(job_title).await
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, sqlx::Error> {
        self.inner.delete_by_id(id).await
    }

    async fn count_all(&self) -> Result<i64, sqlx::Error> {
        let total = self.inner.count_all().await?;
        self.concurrent_write();
        Ok(total)
    }

    async fn count_by(&self, key: GroupingKey) -> Result<BTreeMap<String, i64>, sqlx::Error> {
        let counts = self.inner.count_by(key).await?;
        self.concurrent_write();
        Ok(counts)
    }

    async fn count_snapshot(&self) -> Result<QuestionStats, sqlx::Error> {
        let stats = self.inner.count_snapshot().await?;
        self.concurrent_write();
        Ok(stats)
    }
}

/// Provider stand-in returning a canned reply or API failure.
pub struct StubGenerator {
    reply: Result<String, u16>,
    delay: Option<Duration>,
    calls: AtomicUsize,
    last_prompt: Mutex<Option<String>>,
}

impl StubGenerator {
    pub fn replying(text: &str) -> Self {
        Self::new(Ok(text.to_string()))
    }

    pub fn failing(status: u16) -> Self {
        Self::new(Err(status))
    }

    fn new(reply: Result<String, u16>) -> Self {
        Self {
            reply,
            delay: None,
            calls: AtomicUsize::new(0),
            last_prompt: Mutex::new(None),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_prompt(&self) -> Option<String> {
        self.last_prompt.lock().unwrap().clone()
    }
}

#[async_trait]
impl TextGenerator for StubGenerator {
    async fn complete(&self, prompt: &str, _system: &str) -> Result<String, LlmError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.last_prompt.lock().unwrap() = Some(prompt.to_string());

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match &self.reply {
            Ok(text) => Ok(text.clone()),
            Err(status) => Err(LlmError::Api {
                status: *status,
                message: "stubbed provider failure".to_string(),
            }),
        }
    }
}
