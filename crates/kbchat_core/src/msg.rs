use crate::{Epoch, IngestSource, NoticeGeneration, PdfFile, StatusQueryId, SourceCitation};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User edited the question input.
    QuestionEdited(String),
    /// User submitted the current question draft.
    QuestionSubmitted,
    /// User edited the URL staging slot.
    UrlEdited(String),
    /// User asked to ingest the staged URL.
    UrlSubmitted,
    /// User picked a PDF for the file staging slot.
    PdfChosen(PdfFile),
    /// User emptied the file staging slot.
    PdfCleared,
    /// User asked to ingest the staged PDF.
    PdfSubmitted,
    /// User clicked reset; opens the confirmation step.
    ResetRequested,
    /// User answered yes to the reset confirmation.
    ResetConfirmed,
    /// User answered no to the reset confirmation.
    ResetDeclined,
    /// User asked for a fresh knowledge base size.
    StatusRefreshRequested,
    /// Converse request settled.
    ChatAnswered {
        epoch: Epoch,
        result: Result<(String, Vec<SourceCitation>), String>,
    },
    /// Ingest request settled. `Ok` carries the optional server message.
    IngestFinished {
        epoch: Epoch,
        source: IngestSource,
        result: Result<Option<String>, String>,
    },
    /// Reset request settled.
    ResetFinished {
        epoch: Epoch,
        result: Result<(), String>,
    },
    /// Knowledge base size query settled.
    StatusLoaded {
        query: StatusQueryId,
        result: Result<u64, String>,
    },
    /// A notice expiry timer fired.
    NoticeExpired { generation: NoticeGeneration },
}
