use std::fmt;
use std::sync::Arc;

use regex::Regex;
use serde_json::Value;
use uuid::Uuid;

use crate::application::ports::CompletionProvider;
use crate::application::services::completeness::CompletenessGrader;
use crate::application::services::enrichment::{
    suggest_enrichment, topic_from_question, topics_from_missing_info,
};
use crate::application::services::external_enrichment::ExternalEnrichment;
use crate::application::services::retrieval::RetrievalService;
use crate::domain::entities::{Citation, CitationSource, ExternalSnippet, QueryRun, RetrievedChunk};
use crate::domain::repositories::QueryRunRepository;

const GENERATION_TEMPERATURE: f32 = 0.2;
const EXCERPT_MAX_CHARS: usize = 220;

#[derive(Debug)]
pub enum OrchestratorError {
    RetrievalError(String),
    GenerationError(String),
    GradingError(String),
    DatabaseError(String),
}

impl fmt::Display for OrchestratorError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OrchestratorError::RetrievalError(msg) => write!(f, "Retrieval error: {}", msg),
            OrchestratorError::GenerationError(msg) => write!(f, "Generation error: {}", msg),
            OrchestratorError::GradingError(msg) => write!(f, "Grading error: {}", msg),
            OrchestratorError::DatabaseError(msg) => write!(f, "Database error: {}", msg),
        }
    }
}

impl std::error::Error for OrchestratorError {}

/// Confidence and enrichment policy for the query flow.
#[derive(Debug, Clone)]
pub struct QueryPolicy {
    /// Answers built purely from external evidence never exceed this.
    pub external_confidence_cap: f64,
    /// Document-grounded answers below this trigger external enrichment.
    pub enrich_confidence_threshold: f64,
}

impl Default for QueryPolicy {
    fn default() -> Self {
        Self {
            external_confidence_cap: 0.6,
            enrich_confidence_threshold: 0.55,
        }
    }
}

/// The generation model's reply, parsed leniently: a well-formed JSON
/// object yields an answer plus citation candidates, anything else is
/// kept verbatim as the answer with no citations.
#[derive(Debug)]
enum GenerationOutcome {
    Parsed { answer: String, citations: Vec<Value> },
    Raw(String),
}

impl GenerationOutcome {
    fn from_reply(raw: &str) -> Self {
        let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(raw) else {
            return GenerationOutcome::Raw(raw.to_string());
        };

        let answer = match obj.get("answer") {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => raw.to_string(),
            Some(other) => other.to_string(),
        };
        let citations = match obj.get("citations") {
            Some(Value::Array(items)) => items.clone(),
            _ => Vec::new(),
        };
        GenerationOutcome::Parsed { answer, citations }
    }

    fn into_parts(self) -> (String, Vec<Value>) {
        match self {
            GenerationOutcome::Parsed { answer, citations } => (answer, citations),
            GenerationOutcome::Raw(answer) => (answer, Vec::new()),
        }
    }
}

/// Drives one question end to end: retrieve, generate, grade, decide on
/// external enrichment, validate citations, and persist the run. Every
/// branch persists exactly one immutable QueryRun.
pub struct QueryOrchestrator {
    retrieval: Arc<RetrievalService>,
    completions: Arc<dyn CompletionProvider>,
    grader: Arc<CompletenessGrader>,
    enrichment: Arc<ExternalEnrichment>,
    runs: Arc<dyn QueryRunRepository>,
    policy: QueryPolicy,
}

impl QueryOrchestrator {
    pub fn new(
        retrieval: Arc<RetrievalService>,
        completions: Arc<dyn CompletionProvider>,
        grader: Arc<CompletenessGrader>,
        enrichment: Arc<ExternalEnrichment>,
        runs: Arc<dyn QueryRunRepository>,
        policy: QueryPolicy,
    ) -> Self {
        Self {
            retrieval,
            completions,
            grader,
            enrichment,
            runs,
            policy,
        }
    }

    pub async fn ask(
        &self,
        question: &str,
        top_k: Option<i64>,
        document_ids: Option<&[Uuid]>,
    ) -> Result<QueryRun, OrchestratorError> {
        let chunks = self
            .retrieval
            .retrieve(question, top_k, document_ids)
            .await
            .map_err(|e| OrchestratorError::RetrievalError(e.to_string()))?;

        if chunks.is_empty() {
            return self.answer_without_documents(question).await;
        }
        self.answer_from_documents(question, &chunks).await
    }

    /// Nothing relevant in the knowledge base: try a single external lookup
    /// derived from the question itself, or refuse outright.
    async fn answer_without_documents(&self, question: &str) -> Result<QueryRun, OrchestratorError> {
        let topic = topic_from_question(question);
        let external = self.enrichment.enrich(&[topic]).await;

        if external.is_empty() {
            tracing::info!("No documents and no external evidence, refusing to answer");
            let run = QueryRun::new(
                question.to_string(),
                "I cannot answer this question because no relevant information was found in the \
                 uploaded documents, and no external sources could provide the missing information."
                    .to_string(),
                0.05,
                vec!["No relevant documents or passages were found for this question.".to_string()],
                vec!["Upload documents that directly cover this topic, then try again.".to_string()],
                false,
                Vec::new(),
            );
            self.persist(&run).await?;
            return Ok(run);
        }

        let (answer, raw_citations) = self
            .generate(question, &[], &external)
            .await?
            .into_parts();
        // Graded with no document context, so the grade bottoms out at the
        // no-context confidence; the cap below is what actually binds.
        let grade = self
            .grader
            .grade(question, &answer, &[])
            .await
            .map_err(|e| OrchestratorError::GradingError(e.to_string()))?;
        let suggestions = suggest_enrichment(&grade.missing_info);

        let mut missing_info =
            vec!["No uploaded documents contained relevant information.".to_string()];
        missing_info.extend(grade.missing_info);

        let run = QueryRun::new(
            question.to_string(),
            answer,
            grade.confidence.min(self.policy.external_confidence_cap),
            missing_info,
            suggestions,
            true,
            validate_citations(&raw_citations),
        );
        self.persist(&run).await?;
        Ok(run)
    }

    async fn answer_from_documents(
        &self,
        question: &str,
        chunks: &[RetrievedChunk],
    ) -> Result<QueryRun, OrchestratorError> {
        let (mut answer, mut raw_citations) =
            self.generate(question, chunks, &[]).await?.into_parts();
        let first_grade = self
            .grader
            .grade(question, &answer, chunks)
            .await
            .map_err(|e| OrchestratorError::GradingError(e.to_string()))?;

        // Suggestions always reflect the first, document-only grade: they
        // tell the user what to upload, which external evidence never fixes.
        let suggestions = suggest_enrichment(&first_grade.missing_info);
        let should_enrich = !first_grade.missing_info.is_empty()
            || first_grade.confidence < self.policy.enrich_confidence_threshold;

        let mut used_external = false;
        let mut grade = first_grade.clone();

        if should_enrich {
            let topics = topics_from_missing_info(&first_grade.missing_info, question);
            let external = self.enrichment.enrich(&topics).await;
            if !external.is_empty() {
                tracing::info!(
                    snippets = external.len(),
                    confidence = first_grade.confidence,
                    "Regenerating answer with external evidence"
                );
                used_external = true;
                (answer, raw_citations) = self
                    .generate(question, chunks, &external)
                    .await?
                    .into_parts();
                grade = self
                    .grader
                    .grade(question, &answer, chunks)
                    .await
                    .map_err(|e| OrchestratorError::GradingError(e.to_string()))?;
            }
        }

        let run = QueryRun::new(
            question.to_string(),
            answer,
            grade.confidence,
            grade.missing_info,
            suggestions,
            used_external,
            validate_citations(&raw_citations),
        );
        self.persist(&run).await?;
        Ok(run)
    }

    async fn generate(
        &self,
        question: &str,
        chunks: &[RetrievedChunk],
        external: &[ExternalSnippet],
    ) -> Result<GenerationOutcome, OrchestratorError> {
        let prompt = build_answer_prompt(question, chunks, external);
        let raw = self
            .completions
            .complete(&prompt, GENERATION_TEMPERATURE)
            .await
            .map_err(|e| OrchestratorError::GenerationError(e.to_string()))?;
        Ok(GenerationOutcome::from_reply(&raw))
    }

    async fn persist(&self, run: &QueryRun) -> Result<(), OrchestratorError> {
        self.runs
            .insert(run)
            .await
            .map_err(|e| OrchestratorError::DatabaseError(e.to_string()))
    }
}

fn build_answer_prompt(
    question: &str,
    chunks: &[RetrievedChunk],
    external: &[ExternalSnippet],
) -> String {
    let doc_context = chunks
        .iter()
        .map(|c| format!("DOC_CHUNK {} (doc {}):\n{}", c.chunk_id, c.document_id, c.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");
    let ext_context = external
        .iter()
        .map(|s| format!("EXTERNAL {} ({}) {}:\n{}", s.id, s.title, s.url, s.text))
        .collect::<Vec<_>>()
        .join("\n\n---\n\n");

    format!(
        "You are a knowledge base assistant.\n\
         \n\
         Answer using the uploaded documents first. You may use EXTERNAL snippets only to \
         fill gaps.\n\
         If you use external info, clearly indicate it and cite it.\n\
         \n\
         Return JSON exactly:\n\
         {{\n\
         \x20 \"answer\": string,\n\
         \x20 \"citations\": [\n\
         \x20   {{\n\
         \x20     \"source_type\": \"doc_chunk\" | \"external\",\n\
         \x20     \"chunk_id\"?: string,\n\
         \x20     \"document_id\"?: string,\n\
         \x20     \"url\"?: string,\n\
         \x20     \"title\"?: string,\n\
         \x20     \"excerpt\": string\n\
         \x20   }}\n\
         \x20 ]\n\
         }}\n\
         \n\
         Rules:\n\
         - Every major claim must have a citation.\n\
         - Excerpt max 200 chars, copied from the source text.\n\
         - If insufficient info even after external snippets, say what is missing.\n\
         \n\
         QUESTION:\n{question}\n\
         \n\
         DOCUMENT CHUNKS:\n{doc}\n\
         \n\
         EXTERNAL SNIPPETS:\n{ext}",
        question = question,
        doc = if doc_context.is_empty() { "(none)" } else { &doc_context },
        ext = if ext_context.is_empty() { "(none)" } else { &ext_context },
    )
}

/// Validate model-proposed citations before persistence. Unknown source
/// types and empty excerpts are dropped; excerpts are capped; id fields
/// keep only a syntactically valid UUID found anywhere inside the string
/// (models often emit "chunk 1234..." style prose around the id).
fn validate_citations(raw: &[Value]) -> Vec<Citation> {
    let uuid_re = Regex::new(
        r"(?i)[0-9a-f]{8}-[0-9a-f]{4}-[1-5][0-9a-f]{3}-[89ab][0-9a-f]{3}-[0-9a-f]{12}",
    )
    .ok();

    raw.iter()
        .filter_map(|c| {
            let source_type = match c.get("source_type").and_then(Value::as_str) {
                Some("doc_chunk") => CitationSource::DocChunk,
                Some("external") => CitationSource::External,
                _ => return None,
            };

            let excerpt: String = c
                .get("excerpt")
                .and_then(Value::as_str)
                .unwrap_or("")
                .chars()
                .take(EXCERPT_MAX_CHARS)
                .collect();
            if excerpt.is_empty() {
                return None;
            }

            let extract_uuid = |key: &str| -> Option<Uuid> {
                let value = c.get(key)?.as_str()?;
                let re = uuid_re.as_ref()?;
                let m = re.find(value)?;
                Uuid::parse_str(m.as_str()).ok()
            };

            let non_empty_str = |key: &str| -> Option<String> {
                c.get(key)
                    .and_then(Value::as_str)
                    .filter(|s| !s.is_empty())
                    .map(|s| s.to_string())
            };

            Some(Citation {
                source_type,
                chunk_id: extract_uuid("chunk_id"),
                document_id: extract_uuid("document_id"),
                url: non_empty_str("url"),
                title: non_empty_str("title"),
                excerpt,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::{
        CompletionProviderError, EmbeddingProvider, EmbeddingProviderError, KnowledgeSource,
        KnowledgeSourceError,
    };
    use crate::domain::entities::{DocumentChunk, Feedback};
    use crate::domain::repositories::{
        ChunkRepository, ChunkRepositoryError, QueryRunRepositoryError,
    };
    use crate::domain::value_objects::TrustedDomains;
    use async_trait::async_trait;
    use pgvector::Vector;
    use serde_json::json;
    use std::sync::Mutex;

    struct FakeEmbeddings;

    #[async_trait]
    impl EmbeddingProvider for FakeEmbeddings {
        async fn embed_batch(
            &self,
            texts: &[String],
        ) -> Result<Vec<Vector>, EmbeddingProviderError> {
            Ok(texts.iter().map(|_| Vector::from(vec![1.0, 0.0])).collect())
        }
    }

    struct FakeChunkRepo {
        hits: Vec<RetrievedChunk>,
    }

    #[async_trait]
    impl ChunkRepository for FakeChunkRepo {
        async fn replace_for_document(
            &self,
            _document_id: Uuid,
            _chunks: &[DocumentChunk],
        ) -> Result<(), ChunkRepositoryError> {
            Ok(())
        }

        async fn search(
            &self,
            _query_vector: &Vector,
            _limit: i64,
            _document_ids: Option<&[Uuid]>,
        ) -> Result<Vec<RetrievedChunk>, ChunkRepositoryError> {
            Ok(self.hits.clone())
        }

        async fn count_for_document(
            &self,
            _document_id: Uuid,
        ) -> Result<i64, ChunkRepositoryError> {
            Ok(self.hits.len() as i64)
        }
    }

    /// Replies in order: generation and grading calls share one script.
    struct ScriptedCompletion {
        replies: Mutex<Vec<String>>,
    }

    impl ScriptedCompletion {
        fn new(mut replies: Vec<String>) -> Arc<Self> {
            replies.reverse();
            Arc::new(Self {
                replies: Mutex::new(replies),
            })
        }
    }

    #[async_trait]
    impl CompletionProvider for ScriptedCompletion {
        async fn complete(
            &self,
            _prompt: &str,
            _temperature: f32,
        ) -> Result<String, CompletionProviderError> {
            self.replies
                .lock()
                .unwrap()
                .pop()
                .ok_or_else(|| CompletionProviderError::ApiError("script exhausted".to_string()))
        }
    }

    struct FakeKnowledge {
        snippets: Vec<ExternalSnippet>,
    }

    #[async_trait]
    impl KnowledgeSource for FakeKnowledge {
        fn summary_url(&self, topic: &str) -> String {
            format!("https://en.wikipedia.org/api/rest_v1/page/summary/{}", topic)
        }

        async fn fetch_summary(
            &self,
            _topic: &str,
        ) -> Result<Option<ExternalSnippet>, KnowledgeSourceError> {
            Ok(self.snippets.first().cloned())
        }
    }

    struct RecordingRunRepo {
        runs: Mutex<Vec<QueryRun>>,
    }

    #[async_trait]
    impl QueryRunRepository for RecordingRunRepo {
        async fn insert(&self, run: &QueryRun) -> Result<(), QueryRunRepositoryError> {
            self.runs.lock().unwrap().push(run.clone());
            Ok(())
        }

        async fn exists(&self, _id: Uuid) -> Result<bool, QueryRunRepositoryError> {
            Ok(true)
        }

        async fn insert_feedback(
            &self,
            _feedback: &Feedback,
        ) -> Result<(), QueryRunRepositoryError> {
            Ok(())
        }
    }

    fn chunk(text: &str) -> RetrievedChunk {
        RetrievedChunk {
            chunk_id: Uuid::new_v4(),
            document_id: Uuid::new_v4(),
            text: text.to_string(),
            distance: 0.2,
        }
    }

    fn snippet() -> ExternalSnippet {
        ExternalSnippet::new(
            "https://en.wikipedia.org/wiki/Photosynthesis".to_string(),
            "Photosynthesis".to_string(),
            "Photosynthesis converts light into chemical energy.".to_string(),
        )
    }

    fn orchestrator(
        hits: Vec<RetrievedChunk>,
        replies: Vec<String>,
        external: Vec<ExternalSnippet>,
    ) -> (QueryOrchestrator, Arc<RecordingRunRepo>) {
        let completions = ScriptedCompletion::new(replies);
        let retrieval = Arc::new(RetrievalService::new(
            Arc::new(FakeEmbeddings),
            Arc::new(FakeChunkRepo { hits }),
        ));
        let grader = Arc::new(CompletenessGrader::new(completions.clone()));
        let enrichment = Arc::new(ExternalEnrichment::new(
            Arc::new(FakeKnowledge { snippets: external }),
            TrustedDomains::from_csv("wikipedia.org"),
            3,
        ));
        let runs = Arc::new(RecordingRunRepo {
            runs: Mutex::new(vec![]),
        });
        (
            QueryOrchestrator::new(
                retrieval,
                completions,
                grader,
                enrichment,
                runs.clone(),
                QueryPolicy::default(),
            ),
            runs,
        )
    }

    fn generation(answer: &str) -> String {
        json!({ "answer": answer, "citations": [] }).to_string()
    }

    fn grade_reply(confidence: f64, missing: &[&str]) -> String {
        json!({ "confidence": confidence, "missing_info": missing }).to_string()
    }

    #[tokio::test]
    async fn test_no_documents_and_no_external_refuses() {
        let (orch, runs) = orchestrator(vec![], vec![], vec![]);

        let run = orch.ask("What is photosynthesis?", None, None).await.unwrap();

        assert_eq!(run.confidence, 0.05);
        assert!(!run.used_external);
        assert!(run.answer.starts_with("I cannot answer this question"));
        assert_eq!(
            run.missing_info,
            vec!["No relevant documents or passages were found for this question.".to_string()]
        );
        assert_eq!(
            run.enrichment_suggestions,
            vec!["Upload documents that directly cover this topic, then try again.".to_string()]
        );
        assert!(run.citations.is_empty());
        assert_eq!(runs.runs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_external_only_answer_is_capped() {
        // One generation call; the grader runs its no-context fast path
        // without calling the model.
        let (orch, runs) = orchestrator(
            vec![],
            vec![generation("Photosynthesis converts light to energy.")],
            vec![snippet()],
        );

        let run = orch.ask("What is photosynthesis?", None, None).await.unwrap();

        assert!(run.used_external);
        assert!(run.confidence <= 0.6);
        assert_eq!(
            run.missing_info[0],
            "No uploaded documents contained relevant information."
        );
        assert_eq!(runs.runs.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_confident_grounded_answer_skips_enrichment() {
        let (orch, _runs) = orchestrator(
            vec![chunk("The refund window is 30 days.")],
            vec![
                generation("Refunds are accepted within 30 days."),
                grade_reply(0.9, &[]),
            ],
            vec![snippet()],
        );

        let run = orch.ask("What is the refund window?", None, None).await.unwrap();

        assert!(!run.used_external);
        assert_eq!(run.confidence, 0.9);
        assert!(run.missing_info.is_empty());
        assert!(run.enrichment_suggestions.is_empty());
    }

    #[tokio::test]
    async fn test_low_confidence_triggers_enrichment_and_regrade() {
        let (orch, _runs) = orchestrator(
            vec![chunk("Partial information about the topic.")],
            vec![
                generation("A tentative answer."),
                grade_reply(0.3, &["definition of photosynthesis"]),
                generation("A fuller answer using external evidence."),
                grade_reply(0.8, &[]),
            ],
            vec![snippet()],
        );

        let run = orch.ask("What is photosynthesis?", None, None).await.unwrap();

        assert!(run.used_external);
        assert_eq!(run.answer, "A fuller answer using external evidence.");
        // Confidence comes from the regrade, uncapped in this branch.
        assert_eq!(run.confidence, 0.8);
        assert!(run.missing_info.is_empty());
        // Suggestions reflect the first grade's gaps.
        assert_eq!(run.enrichment_suggestions.len(), 1);
        assert!(run.enrichment_suggestions[0].contains("directly answers"));
    }

    #[tokio::test]
    async fn test_enrichment_without_evidence_keeps_first_answer() {
        let (orch, _runs) = orchestrator(
            vec![chunk("Partial information.")],
            vec![
                generation("A tentative answer."),
                grade_reply(0.3, &["missing background"]),
            ],
            vec![],
        );

        let run = orch.ask("What is photosynthesis?", None, None).await.unwrap();

        assert!(!run.used_external);
        assert_eq!(run.answer, "A tentative answer.");
        assert_eq!(run.confidence, 0.3);
        assert_eq!(run.missing_info, vec!["missing background".to_string()]);
    }

    #[tokio::test]
    async fn test_unparseable_generation_keeps_raw_text() {
        let (orch, _runs) = orchestrator(
            vec![chunk("context")],
            vec![
                "Here is my answer without any JSON.".to_string(),
                grade_reply(0.7, &[]),
            ],
            vec![],
        );

        let run = orch.ask("question?", None, None).await.unwrap();

        assert_eq!(run.answer, "Here is my answer without any JSON.");
        assert!(run.citations.is_empty());
    }

    #[test]
    fn test_citation_validation_drops_unknown_source_types() {
        let raw = vec![
            json!({ "source_type": "doc_chunk", "excerpt": "ok" }),
            json!({ "source_type": "hallucinated", "excerpt": "nope" }),
            json!({ "excerpt": "no type" }),
        ];
        let citations = validate_citations(&raw);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].source_type, CitationSource::DocChunk);
    }

    #[test]
    fn test_citation_validation_drops_empty_excerpts_and_caps_long_ones() {
        let raw = vec![
            json!({ "source_type": "external", "excerpt": "" }),
            json!({ "source_type": "external", "excerpt": "y".repeat(500) }),
        ];
        let citations = validate_citations(&raw);
        assert_eq!(citations.len(), 1);
        assert_eq!(citations[0].excerpt.chars().count(), 220);
    }

    #[test]
    fn test_citation_validation_extracts_embedded_uuids() {
        let id = Uuid::new_v4();
        let raw = vec![json!({
            "source_type": "doc_chunk",
            "chunk_id": format!("chunk {} from the context", id),
            "document_id": "not a uuid at all",
            "excerpt": "supported claim",
        })];
        let citations = validate_citations(&raw);
        assert_eq!(citations[0].chunk_id, Some(id));
        assert_eq!(citations[0].document_id, None);
    }

    #[test]
    fn test_citation_validation_keeps_only_non_empty_url_and_title() {
        let raw = vec![json!({
            "source_type": "external",
            "url": "https://en.wikipedia.org/wiki/Rust",
            "title": "",
            "excerpt": "from the article",
        })];
        let citations = validate_citations(&raw);
        assert_eq!(
            citations[0].url.as_deref(),
            Some("https://en.wikipedia.org/wiki/Rust")
        );
        assert_eq!(citations[0].title, None);
    }
}
