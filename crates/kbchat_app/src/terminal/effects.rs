use std::sync::{mpsc, Arc};

use kbchat_client::{
    EngineCommand, EngineError, EngineHandle, EventSink, KnowledgeService, PdfUpload,
    ServiceEvent, ServiceOutcome,
};
use kbchat_core::{Effect, IngestSource, IngestTarget, Msg, SourceCitation};
use kbchat_logging::{clip_for_log, kb_debug, kb_info};

use super::app::LoopEvent;

/// Executes core effects on the engine. Request tickets carry the session
/// epoch, status queries their query id and timers the notice generation, so
/// completions map back to `Msg`s without any bookkeeping here.
pub struct EffectRunner {
    engine: EngineHandle,
}

impl EffectRunner {
    pub fn new(
        service: Arc<dyn KnowledgeService>,
        loop_tx: mpsc::Sender<LoopEvent>,
    ) -> Result<Self, EngineError> {
        let sink = Arc::new(LoopSink { loop_tx });
        let engine = EngineHandle::new(service, sink)?;
        Ok(Self { engine })
    }

    pub fn run(&self, effect: Effect) {
        match effect {
            Effect::Converse { epoch, query } => {
                kb_info!(
                    "Converse epoch={} query_len={} query={}",
                    epoch,
                    query.len(),
                    clip_for_log(&query, 80)
                );
                self.engine.send(EngineCommand::Converse {
                    ticket: epoch,
                    query,
                });
            }
            Effect::Ingest {
                epoch,
                target: IngestTarget::Url(url),
            } => {
                kb_info!("IngestUrl epoch={} url={}", epoch, url);
                self.engine
                    .send(EngineCommand::IngestUrl { ticket: epoch, url });
            }
            Effect::Ingest {
                epoch,
                target: IngestTarget::Pdf(file),
            } => {
                kb_info!(
                    "IngestPdf epoch={} name={} bytes={}",
                    epoch,
                    file.name,
                    file.bytes.len()
                );
                self.engine.send(EngineCommand::IngestPdf {
                    ticket: epoch,
                    upload: PdfUpload {
                        file_name: file.name,
                        bytes: file.bytes,
                    },
                });
            }
            Effect::ResetKnowledgeBase { epoch } => {
                kb_info!("ResetKnowledgeBase epoch={}", epoch);
                self.engine.send(EngineCommand::Reset { ticket: epoch });
            }
            Effect::ScheduleNoticeExpiry { generation, after } => {
                kb_debug!("Notice generation={} expires in {:?}", generation, after);
                self.engine.send(EngineCommand::StartTimer {
                    ticket: generation,
                    after,
                });
            }
            Effect::RefreshStatus { query } => {
                kb_debug!("Status query={}", query);
                self.engine.send(EngineCommand::Status { ticket: query });
            }
            Effect::ConfirmReset { .. } => {
                // Answered on stdin by the dispatch loop.
            }
        }
    }
}

struct LoopSink {
    loop_tx: mpsc::Sender<LoopEvent>,
}

impl EventSink for LoopSink {
    fn emit(&self, event: ServiceEvent) {
        let _ = self.loop_tx.send(LoopEvent::Msg(map_event(event)));
    }
}

fn map_event(event: ServiceEvent) -> Msg {
    match event {
        ServiceEvent::TimerElapsed { ticket } => {
            kb_debug!("Notice timer generation={} fired", ticket);
            Msg::NoticeExpired { generation: ticket }
        }
        ServiceEvent::Completed { ticket, outcome } => {
            kb_debug!("{} completed ticket={}", outcome_label(&outcome), ticket);
            map_outcome(ticket, outcome)
        }
    }
}

fn outcome_label(outcome: &ServiceOutcome) -> &'static str {
    match outcome {
        ServiceOutcome::Answer(_) => "Converse",
        ServiceOutcome::UrlIngested(_) => "IngestUrl",
        ServiceOutcome::PdfIngested(_) => "IngestPdf",
        ServiceOutcome::Reset(_) => "Reset",
        ServiceOutcome::Status(_) => "Status",
    }
}

/// `ticket` is the epoch for requests and the query id for status queries.
fn map_outcome(ticket: u64, outcome: ServiceOutcome) -> Msg {
    let epoch = ticket;
    match outcome {
        ServiceOutcome::Answer(result) => Msg::ChatAnswered {
            epoch,
            result: result
                .map(|answer| {
                    let sources = answer
                        .sources
                        .iter()
                        .map(|citation| {
                            SourceCitation::new(citation.source_label(), citation.text.clone())
                        })
                        .collect();
                    (answer.answer, sources)
                })
                .map_err(|err| err.to_string()),
        },
        ServiceOutcome::UrlIngested(result) => Msg::IngestFinished {
            epoch,
            source: IngestSource::Url,
            result: result
                .map(|receipt| receipt.message)
                .map_err(|err| err.to_string()),
        },
        ServiceOutcome::PdfIngested(result) => Msg::IngestFinished {
            epoch,
            source: IngestSource::Pdf,
            result: result
                .map(|receipt| receipt.message)
                .map_err(|err| err.to_string()),
        },
        ServiceOutcome::Reset(result) => Msg::ResetFinished {
            epoch,
            result: result.map_err(|err| err.to_string()),
        },
        ServiceOutcome::Status(result) => Msg::StatusLoaded {
            query: ticket,
            result: result
                .map(|status| status.docs)
                .map_err(|err| err.to_string()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kbchat_client::{
        Answer, Citation, CitationMetadata, IngestReceipt, ServiceError, ServiceStatus,
    };

    #[test]
    fn answers_map_to_core_citations() {
        let msg = map_event(ServiceEvent::Completed {
            ticket: 3,
            outcome: ServiceOutcome::Answer(Ok(Answer {
                answer: "Paris.".to_string(),
                sources: vec![
                    Citation {
                        metadata: CitationMetadata {
                            source: Some("atlas.pdf".to_string()),
                        },
                        text: "Paris is".to_string(),
                    },
                    Citation {
                        metadata: CitationMetadata::default(),
                        text: "orphan".to_string(),
                    },
                ],
            })),
        });

        assert_eq!(
            msg,
            Msg::ChatAnswered {
                epoch: 3,
                result: Ok((
                    "Paris.".to_string(),
                    vec![
                        SourceCitation::new("atlas.pdf", "Paris is"),
                        SourceCitation::new("Unknown", "orphan"),
                    ],
                )),
            }
        );
    }

    #[test]
    fn service_errors_become_display_text() {
        let msg = map_event(ServiceEvent::Completed {
            ticket: 1,
            outcome: ServiceOutcome::UrlIngested(Err(ServiceError::Status {
                status: 400,
                detail: Some("unreachable".to_string()),
            })),
        });
        assert_eq!(
            msg,
            Msg::IngestFinished {
                epoch: 1,
                source: IngestSource::Url,
                result: Err("unreachable".to_string()),
            }
        );
    }

    #[test]
    fn pdf_receipts_and_timers_map_through() {
        let msg = map_event(ServiceEvent::Completed {
            ticket: 2,
            outcome: ServiceOutcome::PdfIngested(Ok(IngestReceipt {
                message: Some("added 4 chunks".to_string()),
            })),
        });
        assert_eq!(
            msg,
            Msg::IngestFinished {
                epoch: 2,
                source: IngestSource::Pdf,
                result: Ok(Some("added 4 chunks".to_string())),
            }
        );
        assert_eq!(
            map_event(ServiceEvent::TimerElapsed { ticket: 9 }),
            Msg::NoticeExpired { generation: 9 }
        );
    }

    #[test]
    fn status_results_keep_their_query_id() {
        let msg = map_event(ServiceEvent::Completed {
            ticket: 4,
            outcome: ServiceOutcome::Status(Ok(ServiceStatus {
                status: "ok".to_string(),
                docs: 120,
            })),
        });
        assert_eq!(
            msg,
            Msg::StatusLoaded {
                query: 4,
                result: Ok(120),
            }
        );
    }
}
