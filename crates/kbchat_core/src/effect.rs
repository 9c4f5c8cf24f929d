use std::time::Duration;

use crate::{Epoch, IngestTarget, NoticeGeneration, StatusQueryId};

/// Work the front end performs on behalf of the controller. Completions come
/// back as `Msg`s tagged with the same epoch or generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    Converse { epoch: Epoch, query: String },
    Ingest { epoch: Epoch, target: IngestTarget },
    ResetKnowledgeBase { epoch: Epoch },
    /// Ask the user a blocking yes/no question before a destructive reset.
    ConfirmReset { prompt: String },
    ScheduleNoticeExpiry {
        generation: NoticeGeneration,
        after: Duration,
    },
    RefreshStatus { query: StatusQueryId },
}
