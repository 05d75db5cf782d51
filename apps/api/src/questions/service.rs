//! Question service: the only place generation, persistence and aggregation meet.
//!
//! Every operation is a stateless transaction against the repository; nothing is cached.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use crate::errors::AppError;
use crate::models::question::{QuestionItem, QuestionRow, QuestionSet, QuestionStats, QuestionType};
use crate::questions::generator::QuestionGenerator;
use crate::questions::repository::QuestionRepository;

/// Upper bound on `num_questions` for a single generation request.
pub const MAX_QUESTIONS_PER_REQUEST: u32 = 20;

#[derive(Clone)]
pub struct QuestionService {
    repo: Arc<dyn QuestionRepository>,
    generator: QuestionGenerator,
}

impl QuestionService {
    pub fn new(repo: Arc<dyn QuestionRepository>, generator: QuestionGenerator) -> Self {
        Self { repo, generator }
    }

    /// Generates questions for `job_title` and stores every usable item.
    /// Returns what was stored, which may differ in length from `num_questions`.
    pub async fn generate_and_store(
        &self,
        job_title: &str,
        num_questions: u32,
    ) -> Result<QuestionSet, AppError> {
        let job_title = normalize_job_title(job_title)?;
        if !(1..=MAX_QUESTIONS_PER_REQUEST).contains(&num_questions) {
            return Err(AppError::Validation(format!(
                "num_questions must be between 1 and {MAX_QUESTIONS_PER_REQUEST}"
            )));
        }

        let items = self.generator.generate(job_title, num_questions).await?;
        if items.len() != num_questions as usize {
            warn!(
                requested = num_questions,
                received = items.len(),
                "Provider returned a different number of questions than requested"
            );
        }

        self.repo.insert_set(job_title, &items).await?;
        info!("Stored {} generated question(s) for '{job_title}'", items.len());

        Ok(QuestionSet {
            job_title: job_title.to_string(),
            questions: items,
        })
    }

    /// Persists a client-supplied set with surrounding whitespace trimmed. Never calls the provider.
    pub async fn save_manual(&self, set: QuestionSet) -> Result<QuestionSet, AppError> {
        let job_title = normalize_job_title(&set.job_title)?;
        if set.questions.is_empty() {
            return Err(AppError::Validation("questions cannot be empty".to_string()));
        }
        let questions = set
            .questions
            .iter()
            .map(|q| match q.question.trim() {
                "" => Err(AppError::Validation("question text cannot be empty".to_string())),
                text => Ok(QuestionItem::new(q.question_type, text)),
            })
            .collect::<Result<Vec<_>, _>>()?;
        let set = QuestionSet {
            job_title: job_title.to_string(),
            questions,
        };

        self.repo.insert_set(&set.job_title, &set.questions).await?;
        info!(
            "Saved {} manual question(s) for '{}'",
            set.questions.len(),
            set.job_title
        );
        Ok(set)
    }

    pub async fn list_grouped(&self) -> Result<Vec<QuestionSet>, AppError> {
        let rows = self.repo.list_all().await?;
        Ok(group_by_job_title(rows))
    }

    /// Bulk delete. Zero matches is `NotFound`.
    pub async fn delete_by_job_title(&self, job_title: &str) -> Result<u64, AppError> {
        let deleted = self.repo.delete_by_job_title(job_title).await?;
        if deleted == 0 {
            return Err(AppError::NotFound(
                "No questions found for this job title".to_string(),
            ));
        }
        info!("Deleted {deleted} question(s) for '{job_title}'");
        Ok(deleted)
    }

    pub async fn delete_by_id(&self, id: i64) -> Result<(), AppError> {
        if !self.repo.delete_by_id(id).await? {
            return Err(AppError::NotFound("Question not found".to_string()));
        }
        info!("Deleted question {id}");
        Ok(())
    }

    /// All three aggregates come from one storage snapshot, so their sums always agree.
    pub async fn stats(&self) -> Result<QuestionStats, AppError> {
        Ok(self.repo.count_snapshot().await?)
    }
}

/// Trimmed job title, so " SRE" and "SRE" land in the same group.
fn normalize_job_title(job_title: &str) -> Result<&str, AppError> {
    let job_title = job_title.trim();
    if job_title.is_empty() {
        return Err(AppError::Validation("job_title cannot be empty".to_string()));
    }
    Ok(job_title)
}

/// Groups rows by job title, keeping first-seen title order and row order within a group.
/// Rows whose stored type is outside the known set are skipped.
pub fn group_by_job_title(rows: Vec<QuestionRow>) -> Vec<QuestionSet> {
    let mut sets: Vec<QuestionSet> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for row in rows {
        let question_type = match row.question_type.parse::<QuestionType>() {
            Ok(t) => t,
            Err(reason) => {
                warn!(id = row.id, %reason, "Skipping stored question with unknown type");
                continue;
            }
        };
        let item = QuestionItem::new(question_type, row.question_text);

        match index.get(&row.job_title) {
            Some(&i) => sets[i].questions.push(item),
            None => {
                index.insert(row.job_title.clone(), sets.len());
                sets.push(QuestionSet {
                    job_title: row.job_title,
                    questions: vec![item],
                });
            }
        }
    }

    sets
}
