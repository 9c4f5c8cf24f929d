use crate::{NoticeKind, Role, SessionStatus};

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppViewModel {
    pub entries: Vec<EntryView>,
    /// A question is in flight; the view shows a thinking placeholder.
    pub thinking: bool,
    pub notice: Option<NoticeView>,
    pub status: SessionStatus,
    pub chat_enabled: bool,
    pub ingest_enabled: bool,
    pub draft: String,
    pub staged_url: String,
    pub staged_pdf: Option<String>,
    pub confirming_reset: bool,
    pub knowledge_chunks: Option<u64>,
    /// At least one size query has answered; `knowledge_chunks` is `None` if it failed.
    pub knowledge_checked: bool,
    pub dirty: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub role: Role,
    pub text: String,
    pub citations: Vec<CitationView>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CitationView {
    pub label: String,
    pub preview: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeView {
    pub text: String,
    pub kind: NoticeKind,
}
