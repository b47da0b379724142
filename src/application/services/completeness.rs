use std::fmt;
use std::sync::Arc;

use serde::Deserialize;

use crate::application::ports::CompletionProvider;
use crate::domain::entities::RetrievedChunk;

/// Confidence assigned when there is no context to grade against.
pub const NO_CONTEXT_CONFIDENCE: f64 = 0.05;
/// Confidence assigned when the grader's reply cannot be parsed.
pub const UNPARSEABLE_GRADE_CONFIDENCE: f64 = 0.4;

const CONTEXT_PREFIX_CHARS: usize = 600;

#[derive(Debug)]
pub enum GraderError {
    CompletionError(String),
}

impl fmt::Display for GraderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraderError::CompletionError(msg) => write!(f, "Completion error: {}", msg),
        }
    }
}

impl std::error::Error for GraderError {}

#[derive(Debug, Clone, PartialEq)]
pub struct CompletenessGrade {
    pub confidence: f64,
    pub missing_info: Vec<String>,
}

#[derive(Deserialize)]
struct RawGrade {
    confidence: f64,
    missing_info: Vec<String>,
}

/// Grades whether an answer is fully supported by the retrieved context.
/// The grader model is asked for strict JSON at temperature zero; a reply
/// that does not parse (or reports an out-of-range confidence) degrades
/// to a low-confidence grade instead of failing the query.
pub struct CompletenessGrader {
    completions: Arc<dyn CompletionProvider>,
}

impl CompletenessGrader {
    pub fn new(completions: Arc<dyn CompletionProvider>) -> Self {
        Self { completions }
    }

    pub async fn grade(
        &self,
        question: &str,
        answer: &str,
        chunks: &[RetrievedChunk],
    ) -> Result<CompletenessGrade, GraderError> {
        if chunks.is_empty() {
            return Ok(CompletenessGrade {
                confidence: NO_CONTEXT_CONFIDENCE,
                missing_info: vec![
                    "No relevant documents were retrieved for this question.".to_string(),
                ],
            });
        }

        let context = chunks
            .iter()
            .map(|c| c.text.chars().take(CONTEXT_PREFIX_CHARS).collect::<String>())
            .collect::<Vec<_>>()
            .join("\n---\n");
        let prompt = build_prompt(question, answer, &context);

        let raw = self
            .completions
            .complete(&prompt, 0.0)
            .await
            .map_err(|e| GraderError::CompletionError(e.to_string()))?;

        Ok(parse_grade(&raw))
    }
}

fn build_prompt(question: &str, answer: &str, context: &str) -> String {
    format!(
        "You are grading whether an answer is fully supported by retrieved documents.\n\
         \n\
         Output JSON:\n\
         {{\n\
         \x20 \"confidence\": number (0 to 1),\n\
         \x20 \"missing_info\": string[]\n\
         }}\n\
         \n\
         Be conservative: if context does not clearly support the answer, reduce confidence \
         and list missing_info.\n\
         \n\
         QUESTION:\n{question}\n\
         \n\
         ANSWER:\n{answer}\n\
         \n\
         CONTEXT SNIPPETS:\n{context}"
    )
}

fn parse_grade(raw: &str) -> CompletenessGrade {
    match serde_json::from_str::<RawGrade>(raw) {
        Ok(grade) if (0.0..=1.0).contains(&grade.confidence) => CompletenessGrade {
            confidence: grade.confidence,
            missing_info: grade.missing_info,
        },
        _ => CompletenessGrade {
            confidence: UNPARSEABLE_GRADE_CONFIDENCE,
            missing_info: vec![
                "Completeness grading was uncertain due to formatting issues.".to_string(),
            ],
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::CompletionProviderError;
    use async_trait::async_trait;
    use uuid::Uuid;

    struct CannedCompletion {
        reply: String,
    }

    #[async_trait]
    impl CompletionProvider for CannedCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _temperature: f32,
        ) -> Result<String, CompletionProviderError> {
            Ok(self.reply.clone())
        }
    }

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            text: text.to_string(),
            distance: 0.1,
        }
    }

    fn grader(reply: &str) -> CompletenessGrader {
        CompletenessGrader::new(Arc::new(CannedCompletion {
            reply: reply.to_string(),
        }))
    }

    #[tokio::test]
    async fn test_no_context_fast_path_skips_the_model() {
        let grade = grader("ignored").grade("q", "a", &[]).await.unwrap();
        assert_eq!(grade.confidence, NO_CONTEXT_CONFIDENCE);
        assert_eq!(
            grade.missing_info,
            vec!["No relevant documents were retrieved for this question.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_well_formed_grade_is_passed_through() {
        let grade = grader(r#"{"confidence": 0.82, "missing_info": ["renewal terms"]}"#)
            .grade("q", "a", &[chunk("context")])
            .await
            .unwrap();
        assert_eq!(grade.confidence, 0.82);
        assert_eq!(grade.missing_info, vec!["renewal terms".to_string()]);
    }

    #[tokio::test]
    async fn test_unparseable_reply_falls_back_to_soft_grade() {
        let grade = grader("Sure! The answer looks complete to me.")
            .grade("q", "a", &[chunk("context")])
            .await
            .unwrap();
        assert_eq!(grade.confidence, UNPARSEABLE_GRADE_CONFIDENCE);
        assert_eq!(
            grade.missing_info,
            vec!["Completeness grading was uncertain due to formatting issues.".to_string()]
        );
    }

    #[tokio::test]
    async fn test_out_of_range_confidence_is_rejected() {
        let grade = grader(r#"{"confidence": 1.7, "missing_info": []}"#)
            .grade("q", "a", &[chunk("context")])
            .await
            .unwrap();
        assert_eq!(grade.confidence, UNPARSEABLE_GRADE_CONFIDENCE);
    }

    #[tokio::test]
    async fn test_context_is_truncated_to_prefixes() {
        struct PromptCapture {
            seen: std::sync::Mutex<Vec<String>>,
        }

        #[async_trait]
        impl CompletionProvider for PromptCapture {
            async fn complete(
                &self,
                prompt: &str,
                _temperature: f32,
            ) -> Result<String, CompletionProviderError> {
                self.seen.lock().unwrap().push(prompt.to_string());
                Ok(r#"{"confidence": 0.9, "missing_info": []}"#.to_string())
            }
        }

        let capture = Arc::new(PromptCapture {
            seen: std::sync::Mutex::new(vec![]),
        });
        let grader = CompletenessGrader::new(capture.clone());
        let long = "x".repeat(2000);
        grader.grade("q", "a", &[chunk(&long)]).await.unwrap();

        let prompts = capture.seen.lock().unwrap();
        assert!(prompts[0].contains(&"x".repeat(600)));
        assert!(!prompts[0].contains(&"x".repeat(601)));
    }
}
