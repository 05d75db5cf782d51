// Question generation prompt templates.

pub const GENERATE_QUESTIONS_PROMPT: &str = r#"Generate exactly {num_questions} interview questions for a {job_title}.
Label each question as either "technical" or "behavioral".

OUTPUT SCHEMA (return exactly this structure):
{
  "questions": [
    { "type": "technical" | "behavioral", "question": "string" }
  ]
}"#;
