//! KB chat client: Knowledge Service contract and request execution.
mod engine;
mod error;
mod service;
mod types;

pub use engine::{
    ChannelEventSink, EngineCommand, EngineError, EngineHandle, EventSink, ServiceEvent,
    ServiceOutcome, Ticket,
};
pub use error::ServiceError;
pub use service::{HttpKnowledgeService, KnowledgeService, ServiceSettings, DEFAULT_BASE_URL};
pub use types::{
    Answer, Citation, CitationMetadata, IngestReceipt, PdfUpload, ServiceStatus, UNKNOWN_SOURCE,
};
