use std::time::Duration;

use bytes::Bytes;

use crate::view_model::{AppViewModel, CitationView, EntryView, NoticeView};

/// Session generation a request was issued under. Bumped by every confirmed reset.
pub type Epoch = u64;
/// Monotonic counter identifying the notice an expiry timer belongs to.
pub type NoticeGeneration = u64;
/// Sequence number of a knowledge base size query. Results from an older query
/// than the last one applied are dropped.
pub type StatusQueryId = u64;

/// How long a settled notice stays visible unless superseded.
pub const NOTICE_TTL: Duration = Duration::from_secs(5);
/// Number of excerpt characters shown in a citation panel.
pub const EXCERPT_PREVIEW_CHARS: usize = 150;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    User,
    Bot,
}

/// Backend-supplied excerpt supporting an answer. The full excerpt is kept;
/// only `preview()` is meant for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceCitation {
    pub source_label: String,
    pub excerpt: String,
}

impl SourceCitation {
    pub fn new(source_label: impl Into<String>, excerpt: impl Into<String>) -> Self {
        Self {
            source_label: source_label.into(),
            excerpt: excerpt.into(),
        }
    }

    pub fn preview(&self) -> String {
        let mut chars = self.excerpt.chars();
        let head: String = chars.by_ref().take(EXCERPT_PREVIEW_CHARS).collect();
        if chars.next().is_some() {
            format!("{head}...")
        } else {
            head
        }
    }
}

/// One line of the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    role: Role,
    text: String,
    sources: Vec<SourceCitation>,
}

impl ConversationEntry {
    pub fn user(text: impl Into<String>) -> Self {
        Self {
            role: Role::User,
            text: text.into(),
            sources: Vec::new(),
        }
    }

    pub fn bot(text: impl Into<String>, sources: Vec<SourceCitation>) -> Self {
        Self {
            role: Role::Bot,
            text: text.into(),
            sources,
        }
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn sources(&self) -> &[SourceCitation] {
        &self.sources
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PdfFile {
    pub name: String,
    pub bytes: Bytes,
}

impl PdfFile {
    pub fn new(name: impl Into<String>, bytes: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestSource {
    Url,
    Pdf,
}

/// A staged input handed to the service for ingestion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IngestTarget {
    Url(String),
    Pdf(PdfFile),
}

impl IngestTarget {
    pub fn source(&self) -> IngestSource {
        match self {
            IngestTarget::Url(_) => IngestSource::Url,
            IngestTarget::Pdf(_) => IngestSource::Pdf,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IngestPhase {
    #[default]
    Idle,
    Pending(IngestSource),
    Succeeded,
    Failed,
}

/// Single summary of what the session is doing, derived from the chat and
/// ingest channels. A question in flight takes precedence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Idle,
    ChatPending,
    IngestPending,
    IngestSucceeded,
    IngestFailed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Progress,
    Success,
    Failure,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub text: String,
    pub kind: NoticeKind,
    pub generation: NoticeGeneration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppState {
    conversation: Vec<ConversationEntry>,
    chat_pending: bool,
    ingest: IngestPhase,
    notice: Option<Notice>,
    notice_generation: NoticeGeneration,
    notice_ttl: Duration,
    epoch: Epoch,
    draft: String,
    staged_url: String,
    staged_pdf: Option<PdfFile>,
    confirming_reset: bool,
    knowledge_chunks: Option<u64>,
    knowledge_checked: bool,
    status_queries_issued: StatusQueryId,
    status_applied: StatusQueryId,
    deferred_notice: Option<String>,
    dirty: bool,
    follow: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            conversation: Vec::new(),
            chat_pending: false,
            ingest: IngestPhase::Idle,
            notice: None,
            notice_generation: 0,
            notice_ttl: NOTICE_TTL,
            epoch: 0,
            draft: String::new(),
            staged_url: String::new(),
            staged_pdf: None,
            confirming_reset: false,
            knowledge_chunks: None,
            knowledge_checked: false,
            status_queries_issued: 0,
            status_applied: 0,
            deferred_notice: None,
            dirty: false,
            follow: false,
        }
    }
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_notice_ttl(mut self, ttl: Duration) -> Self {
        self.notice_ttl = ttl;
        self
    }

    pub fn view(&self) -> AppViewModel {
        AppViewModel {
            entries: self.conversation.iter().map(entry_view).collect(),
            thinking: self.chat_pending,
            notice: self.notice.as_ref().map(|notice| NoticeView {
                text: notice.text.clone(),
                kind: notice.kind,
            }),
            status: self.status(),
            chat_enabled: !self.chat_pending && !self.confirming_reset,
            ingest_enabled: !matches!(self.ingest, IngestPhase::Pending(_))
                && !self.confirming_reset,
            draft: self.draft.clone(),
            staged_url: self.staged_url.clone(),
            staged_pdf: self.staged_pdf.as_ref().map(|pdf| pdf.name.clone()),
            confirming_reset: self.confirming_reset,
            knowledge_chunks: self.knowledge_chunks,
            knowledge_checked: self.knowledge_checked,
            dirty: self.dirty,
        }
    }

    pub fn status(&self) -> SessionStatus {
        if self.chat_pending {
            return SessionStatus::ChatPending;
        }
        match self.ingest {
            IngestPhase::Idle => SessionStatus::Idle,
            IngestPhase::Pending(_) => SessionStatus::IngestPending,
            IngestPhase::Succeeded => SessionStatus::IngestSucceeded,
            IngestPhase::Failed => SessionStatus::IngestFailed,
        }
    }

    pub fn conversation(&self) -> &[ConversationEntry] {
        &self.conversation
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn ingest_phase(&self) -> IngestPhase {
        self.ingest
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    pub fn staged_url(&self) -> &str {
        &self.staged_url
    }

    pub fn staged_pdf(&self) -> Option<&PdfFile> {
        self.staged_pdf.as_ref()
    }

    pub fn is_confirming_reset(&self) -> bool {
        self.confirming_reset
    }

    /// Returns whether a render is due and clears the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    /// Returns whether the conversation or thinking indicator changed since the
    /// last call, i.e. whether the view should follow the newest entry.
    pub fn consume_follow(&mut self) -> bool {
        std::mem::take(&mut self.follow)
    }

    pub(crate) fn is_chat_pending(&self) -> bool {
        self.chat_pending
    }

    pub(crate) fn set_chat_pending(&mut self, pending: bool) {
        if self.chat_pending != pending {
            self.chat_pending = pending;
            self.follow = true;
        }
        self.dirty = true;
    }

    pub(crate) fn set_ingest(&mut self, phase: IngestPhase) {
        self.ingest = phase;
        self.dirty = true;
    }

    pub(crate) fn push_entry(&mut self, entry: ConversationEntry) {
        self.conversation.push(entry);
        self.dirty = true;
        self.follow = true;
    }

    pub(crate) fn clear_conversation(&mut self) {
        self.conversation.clear();
        self.dirty = true;
        self.follow = true;
    }

    /// Replaces the current notice and returns its fresh generation. Any
    /// expiry scheduled for an older generation becomes a no-op.
    pub(crate) fn set_notice(&mut self, kind: NoticeKind, text: String) -> NoticeGeneration {
        self.notice_generation += 1;
        self.notice = Some(Notice {
            text,
            kind,
            generation: self.notice_generation,
        });
        self.dirty = true;
        self.notice_generation
    }

    /// Clears the notice only if it is still the one `generation` refers to.
    pub(crate) fn expire_notice(&mut self, generation: NoticeGeneration) -> bool {
        match &self.notice {
            Some(notice) if notice.generation == generation => {
                self.notice = None;
                self.dirty = true;
                true
            }
            _ => false,
        }
    }

    pub(crate) fn notice_ttl(&self) -> Duration {
        self.notice_ttl
    }

    pub(crate) fn advance_epoch(&mut self) -> Epoch {
        self.epoch += 1;
        self.epoch
    }

    pub(crate) fn draft(&self) -> &str {
        &self.draft
    }

    pub(crate) fn set_draft(&mut self, text: String) {
        self.draft = text;
        self.dirty = true;
    }

    pub(crate) fn set_staged_url(&mut self, url: String) {
        self.staged_url = url;
        self.dirty = true;
    }

    pub(crate) fn set_staged_pdf(&mut self, pdf: Option<PdfFile>) {
        self.staged_pdf = pdf;
        self.dirty = true;
    }

    pub(crate) fn set_confirming_reset(&mut self, confirming: bool) {
        self.confirming_reset = confirming;
        self.dirty = true;
    }

    pub(crate) fn next_status_query(&mut self) -> StatusQueryId {
        self.status_queries_issued += 1;
        self.status_queries_issued
    }

    /// Records a query result unless a newer query already answered. A failed
    /// query still counts as an answer, so the view can show the size as unknown.
    pub(crate) fn apply_status(&mut self, query: StatusQueryId, chunks: Option<u64>) {
        if query <= self.status_applied {
            return;
        }
        self.status_applied = query;
        if !self.knowledge_checked || self.knowledge_chunks != chunks {
            self.knowledge_checked = true;
            self.knowledge_chunks = chunks;
            self.dirty = true;
        }
    }

    /// Holds a failure notice until the banner is free again.
    pub(crate) fn defer_notice(&mut self, text: String) {
        self.deferred_notice = Some(text);
    }

    pub(crate) fn take_deferred_notice(&mut self) -> Option<String> {
        self.deferred_notice.take()
    }
}

fn entry_view(entry: &ConversationEntry) -> EntryView {
    EntryView {
        role: entry.role(),
        text: entry.text().to_string(),
        citations: entry
            .sources()
            .iter()
            .map(|source| CitationView {
                label: source.source_label.clone(),
                preview: source.preview(),
            })
            .collect(),
    }
}
