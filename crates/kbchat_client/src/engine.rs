use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use kbchat_logging::{kb_debug, kb_info, kb_warn};
use thiserror::Error;

use crate::{Answer, IngestReceipt, KnowledgeService, PdfUpload, ServiceError, ServiceStatus};

/// Opaque caller tag echoed back on the matching event.
pub type Ticket = u64;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EngineCommand {
    Converse { ticket: Ticket, query: String },
    IngestUrl { ticket: Ticket, url: String },
    IngestPdf { ticket: Ticket, upload: PdfUpload },
    Reset { ticket: Ticket },
    Status { ticket: Ticket },
    StartTimer { ticket: Ticket, after: Duration },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceOutcome {
    Answer(Result<Answer, ServiceError>),
    UrlIngested(Result<IngestReceipt, ServiceError>),
    PdfIngested(Result<IngestReceipt, ServiceError>),
    Reset(Result<(), ServiceError>),
    Status(Result<ServiceStatus, ServiceError>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceEvent {
    Completed {
        ticket: Ticket,
        outcome: ServiceOutcome,
    },
    TimerElapsed {
        ticket: Ticket,
    },
}

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("failed to start async runtime: {0}")]
    Runtime(std::io::Error),
    #[error("failed to spawn engine thread: {0}")]
    Thread(std::io::Error),
}

pub trait EventSink: Send + Sync {
    fn emit(&self, event: ServiceEvent);
}

pub struct ChannelEventSink {
    tx: mpsc::Sender<ServiceEvent>,
}

impl ChannelEventSink {
    pub fn new(tx: mpsc::Sender<ServiceEvent>) -> Self {
        Self { tx }
    }
}

impl EventSink for ChannelEventSink {
    fn emit(&self, event: ServiceEvent) {
        let _ = self.tx.send(event);
    }
}

/// Runs service calls and timers on a background tokio runtime. Commands are
/// never cancelled: every one of them eventually reports exactly one event,
/// unless the handle is dropped first.
#[derive(Clone)]
pub struct EngineHandle {
    cmd_tx: mpsc::Sender<EngineCommand>,
}

impl EngineHandle {
    pub fn new(
        service: Arc<dyn KnowledgeService>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, EngineError> {
        let (cmd_tx, cmd_rx) = mpsc::channel::<EngineCommand>();
        let runtime = tokio::runtime::Runtime::new().map_err(EngineError::Runtime)?;

        thread::Builder::new()
            .name("kbchat-engine".to_string())
            .spawn(move || {
                while let Ok(command) = cmd_rx.recv() {
                    let service = service.clone();
                    let sink = sink.clone();
                    runtime.spawn(async move {
                        let event = handle_command(service.as_ref(), command).await;
                        sink.emit(event);
                    });
                }
                kb_info!("Engine command channel closed; shutting down runtime");
            })
            .map_err(EngineError::Thread)?;

        Ok(Self { cmd_tx })
    }

    pub fn send(&self, command: EngineCommand) {
        if self.cmd_tx.send(command).is_err() {
            kb_warn!("Engine thread is gone; command dropped");
        }
    }
}

async fn handle_command(service: &dyn KnowledgeService, command: EngineCommand) -> ServiceEvent {
    let (ticket, outcome) = match command {
        EngineCommand::Converse { ticket, query } => {
            kb_debug!("ticket={} converse query_len={}", ticket, query.len());
            (ticket, ServiceOutcome::Answer(service.converse(&query).await))
        }
        EngineCommand::IngestUrl { ticket, url } => {
            kb_debug!("ticket={} ingest url={}", ticket, url);
            (ticket, ServiceOutcome::UrlIngested(service.ingest_url(&url).await))
        }
        EngineCommand::IngestPdf { ticket, upload } => {
            kb_debug!(
                "ticket={} ingest pdf name={} bytes={}",
                ticket,
                upload.file_name,
                upload.bytes.len()
            );
            (ticket, ServiceOutcome::PdfIngested(service.ingest_pdf(upload).await))
        }
        EngineCommand::Reset { ticket } => {
            kb_debug!("ticket={} reset", ticket);
            (ticket, ServiceOutcome::Reset(service.reset().await))
        }
        EngineCommand::Status { ticket } => {
            (ticket, ServiceOutcome::Status(service.status().await))
        }
        EngineCommand::StartTimer { ticket, after } => {
            tokio::time::sleep(after).await;
            return ServiceEvent::TimerElapsed { ticket };
        }
    };

    if let Some(err) = outcome_error(&outcome) {
        kb_warn!("ticket={} request failed: {:?}", ticket, err);
    }
    ServiceEvent::Completed { ticket, outcome }
}

fn outcome_error(outcome: &ServiceOutcome) -> Option<&ServiceError> {
    match outcome {
        ServiceOutcome::Answer(result) => result.as_ref().err(),
        ServiceOutcome::UrlIngested(result) | ServiceOutcome::PdfIngested(result) => {
            result.as_ref().err()
        }
        ServiceOutcome::Reset(result) => result.as_ref().err(),
        ServiceOutcome::Status(result) => result.as_ref().err(),
    }
}
