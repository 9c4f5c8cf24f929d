use bytes::Bytes;
use serde::{Deserialize, Serialize};

/// Label used when the backend does not say where an excerpt came from.
pub const UNKNOWN_SOURCE: &str = "Unknown";

#[derive(Debug, Serialize)]
pub(crate) struct ChatRequest<'a> {
    pub query: &'a str,
}

#[derive(Debug, Serialize)]
pub(crate) struct UrlIngestRequest<'a> {
    pub url: &'a str,
}

/// Successful converse response.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    pub answer: String,
    #[serde(default)]
    pub sources: Vec<Citation>,
}

/// One retrieved chunk backing an answer. Extra fields such as the retrieval
/// score are ignored.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Citation {
    #[serde(default)]
    pub metadata: CitationMetadata,
    #[serde(default)]
    pub text: String,
}

impl Citation {
    pub fn source_label(&self) -> &str {
        self.metadata
            .source
            .as_deref()
            .filter(|source| !source.trim().is_empty())
            .unwrap_or(UNKNOWN_SOURCE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct CitationMetadata {
    #[serde(default)]
    pub source: Option<String>,
}

/// Successful ingest response; the message is optional on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct IngestReceipt {
    #[serde(default)]
    pub message: Option<String>,
}

/// Root endpoint summary: liveness plus the number of stored chunks.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct ServiceStatus {
    #[serde(default)]
    pub status: String,
    #[serde(default)]
    pub docs: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfUpload {
    pub file_name: String,
    pub bytes: Bytes,
}

#[derive(Debug, Deserialize)]
pub(crate) struct ErrorBody {
    #[serde(default)]
    pub detail: Option<serde_json::Value>,
}

impl ErrorBody {
    /// Human-readable detail: a plain string, or the joined `msg` fields of a
    /// validation error list.
    pub(crate) fn detail_text(&self) -> Option<String> {
        let detail = self.detail.as_ref()?;
        let text = match detail {
            serde_json::Value::Null => return None,
            serde_json::Value::String(text) => text.clone(),
            serde_json::Value::Array(items) => {
                let messages: Vec<String> = items
                    .iter()
                    .map(|item| match item.get("msg").and_then(|msg| msg.as_str()) {
                        Some(msg) => msg.to_string(),
                        None => item.to_string(),
                    })
                    .collect();
                messages.join("; ")
            }
            other => other.to_string(),
        };
        let text = text.trim();
        (!text.is_empty()).then(|| text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::{Answer, ErrorBody, ServiceStatus};

    #[test]
    fn answer_ignores_scores_and_defaults_missing_sources() {
        let raw = r#"{
            "answer": "Paris.",
            "sources": [
                {"metadata": {"source": "https://a.test"}, "text": "Paris is...", "score": 0.91},
                {"metadata": {}, "text": "orphan"}
            ]
        }"#;
        let answer: Answer = serde_json::from_str(raw).unwrap();
        assert_eq!(answer.sources.len(), 2);
        assert_eq!(answer.sources[0].source_label(), "https://a.test");
        assert_eq!(answer.sources[1].source_label(), "Unknown");

        let bare: Answer = serde_json::from_str(r#"{"answer": "no context"}"#).unwrap();
        assert!(bare.sources.is_empty());
    }

    #[test]
    fn string_detail_is_used_verbatim() {
        let body: ErrorBody =
            serde_json::from_str(r#"{"detail": "Database is empty. Add documents first."}"#)
                .unwrap();
        assert_eq!(
            body.detail_text().as_deref(),
            Some("Database is empty. Add documents first.")
        );
    }

    #[test]
    fn validation_detail_list_is_joined() {
        let body: ErrorBody = serde_json::from_str(
            r#"{"detail": [
                {"loc": ["body", "url"], "msg": "field required", "type": "value_error.missing"},
                {"loc": ["body"], "msg": "bad body"}
            ]}"#,
        )
        .unwrap();
        assert_eq!(
            body.detail_text().as_deref(),
            Some("field required; bad body")
        );
    }

    #[test]
    fn missing_or_blank_detail_is_none() {
        let body: ErrorBody = serde_json::from_str("{}").unwrap();
        assert_eq!(body.detail_text(), None);
        let body: ErrorBody = serde_json::from_str(r#"{"detail": "  "}"#).unwrap();
        assert_eq!(body.detail_text(), None);
    }

    #[test]
    fn status_defaults_missing_fields() {
        let status: ServiceStatus = serde_json::from_str(r#"{"status": "active"}"#).unwrap();
        assert_eq!(status.docs, 0);
    }
}
