//! Generation client: job title and count in, validated question items out.

use std::sync::Arc;
use std::time::Duration;

use serde_json::Value;
use tracing::{debug, warn};

use crate::errors::AppError;
use crate::llm_client::prompts::JSON_ONLY_SYSTEM;
use crate::llm_client::TextGenerator;
use crate::models::question::{QuestionItem, QuestionType};
use crate::questions::extract::extract_json_object;
use crate::questions::prompts::GENERATE_QUESTIONS_PROMPT;

#[derive(Clone)]
pub struct QuestionGenerator {
    llm: Arc<dyn TextGenerator>,
    timeout: Duration,
}

impl QuestionGenerator {
    pub fn new(llm: Arc<dyn TextGenerator>, timeout: Duration) -> Self {
        Self { llm, timeout }
    }

    /// Asks the provider for `num_questions` labeled questions.
    ///
    /// Provider failures and timeouts map to `AppError::Generation`; replies
    /// that do not yield usable question JSON map to `AppError::MalformedResponse`.
    pub async fn generate(
        &self,
        job_title: &str,
        num_questions: u32,
    ) -> Result<Vec<QuestionItem>, AppError> {
        let prompt = build_prompt(job_title, num_questions);

        let text = tokio::time::timeout(self.timeout, self.llm.complete(&prompt, JSON_ONLY_SYSTEM))
            .await
            .map_err(|_| {
                AppError::Generation(format!(
                    "provider did not respond within {}s",
                    self.timeout.as_secs()
                ))
            })?
            .map_err(|e| AppError::Generation(e.to_string()))?;

        debug!(job_title, reply_len = text.len(), "Received generation reply");

        let parsed =
            extract_json_object(&text).map_err(|e| AppError::MalformedResponse(e.to_string()))?;
        parse_question_items(&parsed)
    }
}

pub fn build_prompt(job_title: &str, num_questions: u32) -> String {
    GENERATE_QUESTIONS_PROMPT
        .replace("{num_questions}", &num_questions.to_string())
        .replace("{job_title}", job_title)
}

/// Reads the `questions` array out of a parsed reply.
///
/// A missing or non-array `questions` key is an error. Individual items with
/// an unknown type or blank text are skipped; if none survive, that is an error too.
pub fn parse_question_items(value: &Value) -> Result<Vec<QuestionItem>, AppError> {
    let raw_items = value
        .get("questions")
        .ok_or_else(|| AppError::MalformedResponse("reply has no 'questions' key".to_string()))?
        .as_array()
        .ok_or_else(|| AppError::MalformedResponse("'questions' is not an array".to_string()))?;

    let items: Vec<QuestionItem> = raw_items
        .iter()
        .enumerate()
        .filter_map(|(index, raw)| match parse_item(raw) {
            Ok(item) => Some(item),
            Err(reason) => {
                warn!(index, %reason, "Skipping generated question");
                None
            }
        })
        .collect();

    if items.is_empty() {
        return Err(AppError::MalformedResponse(format!(
            "none of the {} generated items were usable",
            raw_items.len()
        )));
    }

    Ok(items)
}

fn parse_item(raw: &Value) -> Result<QuestionItem, String> {
    let question_type = raw
        .get("type")
        .and_then(Value::as_str)
        .ok_or("missing 'type'")?
        .parse::<QuestionType>()?;
    let question = raw
        .get("question")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|q| !q.is_empty())
        .ok_or("missing or empty 'question'")?;

    Ok(QuestionItem::new(question_type, question))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::questions::test_support::StubGenerator;
    use serde_json::json;

    fn generator(stub: StubGenerator) -> (QuestionGenerator, Arc<StubGenerator>) {
        let stub = Arc::new(stub);
        (
            QuestionGenerator::new(stub.clone(), Duration::from_secs(5)),
            stub,
        )
    }

    #[test]
    fn test_build_prompt_fills_placeholders() {
        let prompt = build_prompt("Backend Engineer", 4);
        assert!(prompt.contains("Generate exactly 4 interview questions for a Backend Engineer."));
        assert!(prompt.contains("\"questions\""));
        assert!(!prompt.contains("{num_questions}"));
    }

    #[test]
    fn test_parse_items_missing_key_is_malformed() {
        let err = parse_question_items(&json!({"items": []})).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_items_non_array_is_malformed() {
        let err = parse_question_items(&json!({"questions": "none"})).unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[test]
    fn test_parse_items_skips_unusable_entries() {
        let value = json!({"questions": [
            {"type": "Technical", "question": "  Explain MVCC  "},
            {"type": "situational", "question": "Unknown type"},
            {"type": "behavioral", "question": "   "},
            {"question": "No type"},
            "not an object",
            {"type": "behavioral", "question": "Describe a failure"}
        ]});
        let items = parse_question_items(&value).unwrap();
        assert_eq!(
            items,
            vec![
                QuestionItem::new(QuestionType::Technical, "Explain MVCC"),
                QuestionItem::new(QuestionType::Behavioral, "Describe a failure"),
            ]
        );
    }

    #[test]
    fn test_parse_items_all_unusable_is_malformed() {
        let value = json!({"questions": [{"type": "trivia", "question": "?"}]});
        assert!(matches!(
            parse_question_items(&value),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[test]
    fn test_parse_items_empty_array_is_malformed() {
        assert!(matches!(
            parse_question_items(&json!({"questions": []})),
            Err(AppError::MalformedResponse(_))
        ));
    }

    #[tokio::test]
    async fn test_generate_parses_fenced_reply() {
        let (generator, stub) = generator(StubGenerator::replying(
            "```json\n{\"questions\": [{\"type\": \"technical\", \"question\": \"What is a race condition?\"}]}\n```",
        ));
        let items = generator.generate("Rust Engineer", 1).await.unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].question_type, QuestionType::Technical);
        assert!(stub
            .last_prompt()
            .unwrap()
            .contains("1 interview questions for a Rust Engineer"));
    }

    #[tokio::test]
    async fn test_generate_prose_reply_is_malformed() {
        let (generator, _) = generator(StubGenerator::replying(
            "Here are some great questions you could ask a candidate!",
        ));
        let err = generator.generate("Rust Engineer", 2).await.unwrap_err();
        assert!(matches!(err, AppError::MalformedResponse(_)));
    }

    #[tokio::test]
    async fn test_generate_provider_failure_is_generation_error() {
        let (generator, _) = generator(StubGenerator::failing(401));
        let err = generator.generate("Rust Engineer", 2).await.unwrap_err();
        assert!(matches!(err, AppError::Generation(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_generate_timeout_is_generation_error() {
        let stub = Arc::new(
            StubGenerator::replying("{\"questions\": []}").with_delay(Duration::from_secs(30)),
        );
        let generator = QuestionGenerator::new(stub, Duration::from_secs(1));
        let err = generator.generate("Rust Engineer", 2).await.unwrap_err();
        match err {
            AppError::Generation(msg) => assert!(msg.contains("within 1s")),
            other => panic!("expected generation error, got {other:?}"),
        }
    }
}
