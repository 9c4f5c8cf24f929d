//! KB chat core: pure session controller and view-model helpers.
mod effect;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use msg::Msg;
pub use state::{
    AppState, ConversationEntry, Epoch, IngestPhase, IngestSource, IngestTarget, Notice,
    NoticeGeneration, NoticeKind, PdfFile, Role, SessionStatus, SourceCitation, StatusQueryId,
    EXCERPT_PREVIEW_CHARS, NOTICE_TTL,
};
pub use update::{
    update, CHAT_ERROR_PREFIX, INGEST_FAILURE_PREFIX, PDF_PROGRESS_TEXT, RESET_CONFIRM_PROMPT,
    RESET_DONE_TEXT, RESET_FAILURE_PREFIX, RESET_PROGRESS_TEXT, URL_PROGRESS_TEXT,
};
pub use view_model::{AppViewModel, CitationView, EntryView, NoticeView};
