//! Request progress and request generations.
//!
//! A request moves through `Idle → Preparing → Sending → Receiving` and ends
//! in `Done` or `Failed`. Stages only advance when the request itself
//! reaches that point, so a displayed stage can never run ahead of, or
//! outlive, the response it describes.
//!
//! [`RequestGate`] numbers submissions so that the response of a superseded
//! submission can be recognised and dropped.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;
use tokio::sync::watch;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStage {
    Idle,
    /// Local work before anything goes on the wire (validation, file read).
    Preparing,
    /// Request is being sent; no response headers yet.
    Sending,
    /// Response headers arrived; reading and decoding the body.
    Receiving,
    Done,
    Failed,
}

impl ProgressStage {
    fn rank(self) -> u8 {
        match self {
            ProgressStage::Idle => 0,
            ProgressStage::Preparing => 1,
            ProgressStage::Sending => 2,
            ProgressStage::Receiving => 3,
            ProgressStage::Done | ProgressStage::Failed => 4,
        }
    }

    pub fn is_terminal(self) -> bool {
        matches!(self, ProgressStage::Done | ProgressStage::Failed)
    }
}

/// The wording a feature shows for each active stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StageLabels {
    pub preparing: &'static str,
    pub sending: &'static str,
    pub receiving: &'static str,
}

impl StageLabels {
    pub fn label(&self, stage: ProgressStage) -> Option<&'static str> {
        match stage {
            ProgressStage::Preparing => Some(self.preparing),
            ProgressStage::Sending => Some(self.sending),
            ProgressStage::Receiving => Some(self.receiving),
            _ => None,
        }
    }
}

pub const IMAGE_STAGES: StageLabels = StageLabels {
    preparing: "Scanning image...",
    sending: "Processing image...",
    receiving: "Generating description...",
};

pub const TOPIC_STAGES: StageLabels = StageLabels {
    preparing: "Searching for articles...",
    sending: "Scraping article content...",
    receiving: "Summarising articles...",
};

pub const DOCUMENT_STAGES: StageLabels = StageLabels {
    preparing: "Reading document...",
    sending: "Uploading...",
    receiving: "Indexing document...",
};

pub const ANSWER_STAGES: StageLabels = StageLabels {
    preparing: "Preparing question...",
    sending: "Searching the document...",
    receiving: "Generating answer...",
};

/// Publishes the stage of the request in flight to any number of watchers.
#[derive(Debug)]
pub struct ProgressTracker {
    tx: watch::Sender<ProgressStage>,
}

impl Default for ProgressTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl ProgressTracker {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressStage::Idle);
        Self { tx }
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressStage> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> ProgressStage {
        *self.tx.borrow()
    }

    /// Move to `stage` if that is a step forward.
    ///
    /// `Preparing` is also accepted after a terminal stage, which starts the
    /// next request. Backward or repeated moves are ignored. Returns whether
    /// the stage changed.
    pub fn advance(&self, stage: ProgressStage) -> bool {
        self.tx.send_if_modified(|current| {
            let restart = stage == ProgressStage::Preparing && current.is_terminal();
            if restart || stage.rank() > current.rank() {
                *current = stage;
                true
            } else {
                false
            }
        })
    }

    /// Record how a request ended.
    pub fn finish<T, E>(&self, result: &Result<T, E>) {
        self.advance(match result {
            Ok(_) => ProgressStage::Done,
            Err(_) => ProgressStage::Failed,
        });
    }

    pub fn reset(&self) {
        self.tx.send_replace(ProgressStage::Idle);
    }
}

/// Identifies one submission handed out by a [`RequestGate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

/// Generation counter for submissions of one view.
///
/// Each [`RequestGate::begin`] supersedes every earlier ticket, as does
/// [`RequestGate::invalidate`] (the view was reset or left).
#[derive(Debug, Default)]
pub struct RequestGate {
    generation: AtomicU64,
}

impl RequestGate {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn begin(&self) -> Ticket {
        Ticket(self.generation.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: Ticket) -> bool {
        self.generation.load(Ordering::SeqCst) == ticket.0
    }

    /// Hand `value` back only if `ticket` is still the latest submission.
    pub fn accept<T>(&self, ticket: Ticket, value: T) -> Option<T> {
        self.is_current(ticket).then_some(value)
    }
}
