use crate::{
    AppState, ConversationEntry, Effect, IngestPhase, IngestSource, IngestTarget, Msg, NoticeKind,
};

pub const CHAT_ERROR_PREFIX: &str = "⚠️ Error: ";
pub const URL_PROGRESS_TEXT: &str = "🌐 Scraping & chunking website...";
pub const PDF_PROGRESS_TEXT: &str = "📄 Parsing PDF & embedding...";
pub const INGEST_FAILURE_PREFIX: &str = "❌ Failed: ";
pub const RESET_PROGRESS_TEXT: &str = "🗑️ Resetting knowledge base...";
pub const RESET_FAILURE_PREFIX: &str = "❌ Reset failed: ";
pub const RESET_DONE_TEXT: &str = "✨ Knowledge base reset!";
pub const RESET_CONFIRM_PROMPT: &str = "Are you sure you want to clear the knowledge base?";

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: AppState, msg: Msg) -> (AppState, Vec<Effect>) {
    let effects = match msg {
        Msg::QuestionEdited(text) => {
            state.set_draft(text);
            Vec::new()
        }
        Msg::QuestionSubmitted => submit_question(&mut state),
        Msg::UrlEdited(url) => {
            state.set_staged_url(url);
            Vec::new()
        }
        Msg::UrlSubmitted => {
            let url = state.staged_url().trim().to_string();
            if url.is_empty() {
                return (state, Vec::new());
            }
            start_ingest(&mut state, IngestTarget::Url(url))
        }
        Msg::PdfChosen(file) => {
            state.set_staged_pdf(Some(file));
            Vec::new()
        }
        Msg::PdfCleared => {
            state.set_staged_pdf(None);
            Vec::new()
        }
        Msg::PdfSubmitted => match state.staged_pdf().cloned() {
            Some(file) => start_ingest(&mut state, IngestTarget::Pdf(file)),
            None => Vec::new(),
        },
        Msg::ResetRequested => {
            if state.is_confirming_reset() {
                return (state, Vec::new());
            }
            state.set_confirming_reset(true);
            vec![Effect::ConfirmReset {
                prompt: RESET_CONFIRM_PROMPT.to_string(),
            }]
        }
        Msg::ResetDeclined => {
            if state.is_confirming_reset() {
                state.set_confirming_reset(false);
            }
            Vec::new()
        }
        Msg::ResetConfirmed => {
            if !state.is_confirming_reset() {
                return (state, Vec::new());
            }
            state.set_confirming_reset(false);
            // Everything in flight now belongs to a superseded epoch and will be
            // dropped on arrival, so both channels go back to idle here.
            let epoch = state.advance_epoch();
            state.clear_conversation();
            state.set_chat_pending(false);
            state.set_ingest(IngestPhase::Idle);
            state.take_deferred_notice();
            state.set_notice(NoticeKind::Progress, RESET_PROGRESS_TEXT.to_string());
            vec![Effect::ResetKnowledgeBase { epoch }]
        }
        Msg::StatusRefreshRequested => vec![refresh_status(&mut state)],
        Msg::ChatAnswered { epoch, result } => {
            if epoch != state.epoch() || !state.is_chat_pending() {
                return (state, Vec::new());
            }
            let entry = match result {
                Ok((answer, sources)) => ConversationEntry::bot(answer, sources),
                Err(detail) => {
                    ConversationEntry::bot(format!("{CHAT_ERROR_PREFIX}{detail}"), Vec::new())
                }
            };
            state.push_entry(entry);
            state.set_chat_pending(false);
            Vec::new()
        }
        Msg::IngestFinished {
            epoch,
            source,
            result,
        } => {
            if epoch != state.epoch() || state.ingest_phase() != IngestPhase::Pending(source) {
                return (state, Vec::new());
            }
            finish_ingest(&mut state, source, result)
        }
        Msg::ResetFinished { epoch, result } => {
            if epoch != state.epoch() {
                return (state, Vec::new());
            }
            let pending_ingest = matches!(state.ingest_phase(), IngestPhase::Pending(_));
            let mut effects = Vec::new();
            match result {
                // An ingestion started after the reset owns the banner until it
                // settles; a failure is shown once that notice expires.
                Ok(()) if pending_ingest => {}
                Err(detail) if pending_ingest => {
                    state.defer_notice(format!("{RESET_FAILURE_PREFIX}{detail}"));
                }
                Ok(()) => {
                    effects.push(show_settled(
                        &mut state,
                        NoticeKind::Success,
                        RESET_DONE_TEXT.to_string(),
                    ));
                }
                Err(detail) => {
                    effects.push(show_settled(
                        &mut state,
                        NoticeKind::Failure,
                        format!("{RESET_FAILURE_PREFIX}{detail}"),
                    ));
                }
            }
            effects.push(refresh_status(&mut state));
            effects
        }
        Msg::StatusLoaded { query, result } => {
            state.apply_status(query, result.ok());
            Vec::new()
        }
        Msg::NoticeExpired { generation } => {
            if !state.expire_notice(generation) {
                return (state, Vec::new());
            }
            if matches!(
                state.ingest_phase(),
                IngestPhase::Succeeded | IngestPhase::Failed
            ) {
                state.set_ingest(IngestPhase::Idle);
            }
            match state.take_deferred_notice() {
                Some(text) => vec![show_settled(&mut state, NoticeKind::Failure, text)],
                None => Vec::new(),
            }
        }
    };

    (state, effects)
}

fn refresh_status(state: &mut AppState) -> Effect {
    Effect::RefreshStatus {
        query: state.next_status_query(),
    }
}

/// Shows a success or failure notice and schedules its expiry.
fn show_settled(state: &mut AppState, kind: NoticeKind, text: String) -> Effect {
    let generation = state.set_notice(kind, text);
    Effect::ScheduleNoticeExpiry {
        generation,
        after: state.notice_ttl(),
    }
}

fn submit_question(state: &mut AppState) -> Vec<Effect> {
    let query = state.draft().trim().to_string();
    if query.is_empty() || state.is_chat_pending() || state.is_confirming_reset() {
        return Vec::new();
    }

    // Optimistic: the user entry stays even if the request later fails.
    state.push_entry(ConversationEntry::user(query.clone()));
    state.set_draft(String::new());
    state.set_chat_pending(true);
    vec![Effect::Converse {
        epoch: state.epoch(),
        query,
    }]
}

fn start_ingest(state: &mut AppState, target: IngestTarget) -> Vec<Effect> {
    if matches!(state.ingest_phase(), IngestPhase::Pending(_)) || state.is_confirming_reset() {
        return Vec::new();
    }

    let source = target.source();
    let progress = match source {
        IngestSource::Url => URL_PROGRESS_TEXT,
        IngestSource::Pdf => PDF_PROGRESS_TEXT,
    };
    state.set_ingest(IngestPhase::Pending(source));
    state.set_notice(NoticeKind::Progress, progress.to_string());
    vec![Effect::Ingest {
        epoch: state.epoch(),
        target,
    }]
}

fn finish_ingest(
    state: &mut AppState,
    source: IngestSource,
    result: Result<Option<String>, String>,
) -> Vec<Effect> {
    let succeeded = result.is_ok();
    let (kind, text) = match result {
        Ok(message) => {
            let fallback = match source {
                IngestSource::Url => "URL ingested!",
                IngestSource::Pdf => "PDF ingested!",
            };
            let message = message
                .filter(|message| !message.trim().is_empty())
                .unwrap_or_else(|| fallback.to_string());
            match source {
                IngestSource::Url => state.set_staged_url(String::new()),
                IngestSource::Pdf => state.set_staged_pdf(None),
            }
            state.set_ingest(IngestPhase::Succeeded);
            (NoticeKind::Success, format!("✅ {message}"))
        }
        Err(detail) => {
            // The staged input is kept so the user can retry it as-is.
            state.set_ingest(IngestPhase::Failed);
            (NoticeKind::Failure, format!("{INGEST_FAILURE_PREFIX}{detail}"))
        }
    };

    let mut effects = vec![show_settled(state, kind, text)];
    if succeeded {
        effects.push(refresh_status(state));
    }
    effects
}
