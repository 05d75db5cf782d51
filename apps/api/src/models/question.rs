use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A single stored question. The table is flat: no relationships.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuestionRow {
    pub id: i64,
    pub job_title: String,
    /// Unconstrained in storage; the closed set is enforced by `QuestionType` at the boundary.
    pub question_type: String,
    pub question_text: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionType {
    Technical,
    Behavioral,
}

impl QuestionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            QuestionType::Technical => "technical",
            QuestionType::Behavioral => "behavioral",
        }
    }
}

impl fmt::Display for QuestionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lenient parse used for provider output and stored rows: trims and ignores case.
impl FromStr for QuestionType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "technical" => Ok(QuestionType::Technical),
            "behavioral" => Ok(QuestionType::Behavioral),
            other => Err(format!("unknown question type '{other}'")),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionItem {
    #[serde(rename = "type")]
    pub question_type: QuestionType,
    pub question: String,
}

impl QuestionItem {
    pub fn new(question_type: QuestionType, question: impl Into<String>) -> Self {
        Self {
            question_type,
            question: question.into(),
        }
    }
}

/// A job title and its questions, reconstructed from rows at read time.
/// Has no identity of its own; an inbound `id` is accepted and dropped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QuestionSet {
    pub job_title: String,
    pub questions: Vec<QuestionItem>,
}

#[derive(Debug, Deserialize)]
pub struct GenerateQuestionsRequest {
    pub job_title: String,
    #[serde(default = "default_num_questions")]
    pub num_questions: u32,
}

fn default_num_questions() -> u32 {
    2
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionStats {
    #[serde(rename = "total_questions")]
    pub total: i64,
    pub by_job_title: BTreeMap<String, i64>,
    pub by_type: BTreeMap<String, i64>,
}
