use std::collections::BTreeMap;

use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};
use tracing::info;

use crate::models::question::{QuestionItem, QuestionRow, QuestionStats, QuestionType};

/// Column a count aggregate is grouped on. Column names never come from request input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupingKey {
    JobTitle,
    QuestionType,
}

impl GroupingKey {
    pub fn column(&self) -> &'static str {
        match self {
            GroupingKey::JobTitle => "job_title",
            GroupingKey::QuestionType => "question_type",
        }
    }
}

/// Storage contract for question rows.
///
/// Carried in `QuestionService` as `Arc<dyn QuestionRepository>`.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    async fn insert(
        &self,
        job_title: &str,
        question_type: QuestionType,
        question_text: &str,
    ) -> Result<i64, sqlx::Error>;

    /// Inserts every item under `job_title`, returning ids in item order.
    /// The default inserts one by one; backends with transactions should write all or nothing.
    async fn insert_set(
        &self,
        job_title: &str,
        items: &[QuestionItem],
    ) -> Result<Vec<i64>, sqlx::Error> {
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            ids.push(
                self.insert(job_title, item.question_type, &item.question)
                    .await?,
            );
        }
        Ok(ids)
    }

    /// Every row in insertion order.
    async fn list_all(&self) -> Result<Vec<QuestionRow>, sqlx::Error>;

    async fn delete_by_job_title(&self, job_title: &str) -> Result<u64, sqlx::Error>;

    /// Returns false when no row has that id.
    async fn delete_by_id(&self, id: i64) -> Result<bool, sqlx::Error>;

    async fn count_all(&self) -> Result<i64, sqlx::Error>;

    async fn count_by(&self, key: GroupingKey) -> Result<BTreeMap<String, i64>, sqlx::Error>;

    /// Total plus both groupings, all read from the same snapshot so the sums agree.
    async fn count_snapshot(&self) -> Result<QuestionStats, sqlx::Error>;
}

/// PostgreSQL-backed repository over the `questions` table.
#[derive(Clone)]
pub struct PgQuestionRepository {
    pool: PgPool,
}

impl PgQuestionRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

async fn insert_row<'e, E: PgExecutor<'e>>(
    executor: E,
    job_title: &str,
    question_type: QuestionType,
    question_text: &str,
) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>(
        r#"
        INSERT INTO questions (job_title, question_type, question_text)
        VALUES ($1, $2, $3)
        RETURNING id
        "#,
    )
    .bind(job_title)
    .bind(question_type.as_str())
    .bind(question_text)
    .fetch_one(executor)
    .await
}

async fn count_rows<'e, E: PgExecutor<'e>>(executor: E) -> Result<i64, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM questions")
        .fetch_one(executor)
        .await
}

async fn count_grouped<'e, E: PgExecutor<'e>>(
    executor: E,
    key: GroupingKey,
) -> Result<BTreeMap<String, i64>, sqlx::Error> {
    let column = key.column();
    let sql = format!("SELECT {column}, COUNT(*) FROM questions GROUP BY {column}");
    let rows: Vec<(String, i64)> = sqlx::query_as(&sql).fetch_all(executor).await?;
    Ok(rows.into_iter().collect())
}

#[async_trait]
impl QuestionRepository for PgQuestionRepository {
    async fn insert(
        &self,
        job_title: &str,
        question_type: QuestionType,
        question_text: &str,
    ) -> Result<i64, sqlx::Error> {
        insert_row(&self.pool, job_title, question_type, question_text).await
    }

    /// One transaction per set: commit on success, rollback when `tx` drops on error.
    async fn insert_set(
        &self,
        job_title: &str,
        items: &[QuestionItem],
    ) -> Result<Vec<i64>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        let mut ids = Vec::with_capacity(items.len());
        for item in items {
            ids.push(insert_row(&mut *tx, job_title, item.question_type, &item.question).await?);
        }
        tx.commit().await?;

        info!("Inserted {} question(s) for job title '{job_title}'", ids.len());
        Ok(ids)
    }

    async fn list_all(&self) -> Result<Vec<QuestionRow>, sqlx::Error> {
        sqlx::query_as::<_, QuestionRow>(
            r#"
            SELECT id, job_title, question_type, question_text, created_at
            FROM questions
            ORDER BY id ASC
            "#,
        )
        .fetch_all(&self.pool)
        .await
    }

    async fn delete_by_job_title(&self, job_title: &str) -> Result<u64, sqlx::Error> {
        let result = sqlx::query("DELETE FROM questions WHERE job_title = $1")
            .bind(job_title)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected())
    }

    async fn delete_by_id(&self, id: i64) -> Result<bool, sqlx::Error> {
        let result = sqlx::query("DELETE FROM questions WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn count_all(&self) -> Result<i64, sqlx::Error> {
        count_rows(&self.pool).await
    }

    async fn count_by(&self, key: GroupingKey) -> Result<BTreeMap<String, i64>, sqlx::Error> {
        count_grouped(&self.pool, key).await
    }

    /// Read-only REPEATABLE READ transaction: all three queries see one snapshot.
    async fn count_snapshot(&self) -> Result<QuestionStats, sqlx::Error> {
        let mut tx = self.pool.begin().await?;
        sqlx::query("SET TRANSACTION ISOLATION LEVEL REPEATABLE READ READ ONLY")
            .execute(&mut *tx)
            .await?;

        let stats = QuestionStats {
            total: count_rows(&mut *tx).await?,
            by_job_title: count_grouped(&mut *tx, GroupingKey::JobTitle).await?,
            by_type: count_grouped(&mut *tx, GroupingKey::QuestionType).await?,
        };
        tx.commit().await?;
        Ok(stats)
    }
}
