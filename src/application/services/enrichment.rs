use regex::Regex;
use std::sync::LazyLock;

const MAX_TOPICS: usize = 3;

static INTERROGATIVE_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)^(what|who|where|when|why|how|is|are|was|were|do|does|did|can|could|would|should)\s+",
    )
    .unwrap()
});

static MISSING_INFO_PREFIX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(definition|explanation|details|clarification|information|data)\s+(of|on|about|for)\s+")
        .unwrap()
});

static ARTICLE_PREFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)^(the\s+)?").unwrap());

/// Turn the grader's missing-information strings into concrete upload
/// suggestions. Classification is keyword-based and first-match-wins, so a
/// string mentioning both "policy" and "revenue" is treated as a policy gap.
pub fn suggest_enrichment(missing: &[String]) -> Vec<String> {
    let mut suggestions: Vec<String> = Vec::new();

    for m in missing {
        let lc = m.to_lowercase();
        let suggestion = if lc.contains("policy") || lc.contains("procedure") {
            "Upload the relevant internal policy/procedure document (PDF or DOCX) that governs this topic.".to_string()
        } else if lc.contains("financial") || lc.contains("quarter") || lc.contains("revenue") {
            "Upload quarterly financial reports or management accounts (e.g., Q1–Q4 PDF statements).".to_string()
        } else if lc.contains("contract") || lc.contains("sla") {
            "Upload the relevant contract/SLA or vendor agreement that defines obligations and timelines.".to_string()
        } else if lc.contains("metric") || lc.contains("kpi") || lc.contains("dashboard") {
            "Export and upload KPI dashboards or CSV extracts that contain the missing metrics.".to_string()
        } else {
            format!(
                "Add a document that directly answers: \"{}\" (e.g., an internal doc, report, or dataset extract).",
                m
            )
        };

        if !suggestions.contains(&suggestion) {
            suggestions.push(suggestion);
        }
    }

    suggestions
}

/// Reduce a question to a lookup topic: strip one leading interrogative,
/// drop question marks, lower-case. Falls back to the raw question when
/// stripping leaves nothing.
pub fn topic_from_question(question: &str) -> String {
    let lowered = question.to_lowercase();
    let stripped = INTERROGATIVE_PREFIX.replace(&lowered, "");
    let mut topic = stripped.replace('?', "").trim().to_string();

    // "what is X" strips to "is X"; peel the copula too.
    if let Some(rest) = topic.strip_prefix("is ") {
        topic = rest.trim().to_string();
    }

    if topic.is_empty() {
        question.to_string()
    } else {
        topic
    }
}

/// Derive up to three lookup topics from missing-information strings,
/// stripping grader boilerplate ("definition of", "details on", leading
/// "the"). Empty input falls back to the question-derived topic.
pub fn topics_from_missing_info(missing: &[String], fallback_question: &str) -> Vec<String> {
    if missing.is_empty() {
        return vec![topic_from_question(fallback_question)];
    }

    let mut topics: Vec<String> = Vec::new();
    for m in missing {
        let lowered = m.to_lowercase();
        let stripped = MISSING_INFO_PREFIX.replace(&lowered, "");
        let cleaned = ARTICLE_PREFIX.replace(&stripped, "").trim().to_string();
        let topic = if cleaned.is_empty() { m.clone() } else { cleaned };
        if !topics.contains(&topic) {
            topics.push(topic);
        }
        if topics.len() == MAX_TOPICS {
            break;
        }
    }
    topics
}
