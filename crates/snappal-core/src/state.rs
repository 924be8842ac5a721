//! Application state machine (reducer).
//!
//! All state mutations happen in [`AnalysisState::update`]. It never performs
//! I/O: it mutates state and returns [`Effect`]s for the runtime to execute
//! (start the analysis, persist or clear storage, release image handles).
//!
//! ```text
//! idle ──Submit──▶ analyzing ──Ok──▶ complete ──SelectHistory──▶ complete
//!   ▲                  │                 │
//!   │                  └──Err──▶ error   │
//!   └────────Dismiss───────────┴─────────┘
//! ```

use std::collections::BTreeSet;

use snappal_types::{AnalysisResult, AnalysisStatus, MAX_HISTORY};

use crate::analysis::AnalysisError;
use crate::history::push_bounded;
use crate::images::SourceImage;

/// Inputs to the state machine.
#[derive(Debug)]
pub enum StateEvent {
    /// Persisted history was read at startup.
    HistoryLoaded(Vec<AnalysisResult>),
    /// The user submitted an image.
    Submit(SourceImage),
    /// The in-flight analysis resolved.
    AnalysisFinished(Result<AnalysisResult, AnalysisError>),
    /// The user picked a history entry (0-based).
    SelectHistory(usize),
    /// The user went back from a result or error.
    Dismiss,
    /// The user cleared history.
    ClearHistory,
}

/// Effects returned by the reducer for the runtime to execute.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Run the analysis and feed the outcome back as `AnalysisFinished`.
    StartAnalysis(SourceImage),
    /// Write the (already bounded) history to storage.
    PersistHistory(Vec<AnalysisResult>),
    /// Remove the persisted history slot.
    ClearStorage,
    /// Release a session-local image handle no longer referenced.
    ReleaseImage(String),
    /// Tell the user why an event was ignored.
    Notice(String),
}

/// State owned by one top-level controller.
#[derive(Debug, Clone, Default)]
pub struct AnalysisState {
    pub status: AnalysisStatus,
    pub current_result: Option<AnalysisResult>,
    /// Newest first, at most `MAX_HISTORY` entries.
    pub history: Vec<AnalysisResult>,
    pub error_msg: Option<String>,
}

impl AnalysisState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_analyzing(&self) -> bool {
        self.status == AnalysisStatus::Analyzing
    }

    /// Applies one event and returns the effects to execute.
    pub fn update(&mut self, event: StateEvent) -> Vec<Effect> {
        let before = self.referenced_images();
        let mut effects = match event {
            StateEvent::HistoryLoaded(mut entries) => {
                entries.truncate(MAX_HISTORY);
                self.history = entries;
                Vec::new()
            }
            StateEvent::Submit(image) => self.submit(image),
            StateEvent::AnalysisFinished(outcome) => self.finish(outcome),
            StateEvent::SelectHistory(index) => self.select(index),
            StateEvent::Dismiss => self.dismiss(),
            StateEvent::ClearHistory => {
                self.history.clear();
                vec![Effect::ClearStorage]
            }
        };

        let after = self.referenced_images();
        effects.extend(
            before
                .difference(&after)
                .map(|handle| Effect::ReleaseImage(handle.clone())),
        );
        effects
    }

    fn submit(&mut self, image: SourceImage) -> Vec<Effect> {
        if self.is_analyzing() {
            tracing::warn!("ignoring submission while an analysis is running");
            return vec![Effect::Notice(
                "An analysis is already running; wait for it to finish.".to_string(),
            )];
        }
        self.status = AnalysisStatus::Analyzing;
        self.error_msg = None;
        vec![Effect::StartAnalysis(image)]
    }

    fn finish(&mut self, outcome: Result<AnalysisResult, AnalysisError>) -> Vec<Effect> {
        if !self.is_analyzing() {
            tracing::warn!(status = %self.status, "dropping analysis outcome with no request in flight");
            return Vec::new();
        }
        match outcome {
            Ok(result) => {
                self.status = AnalysisStatus::Complete;
                self.current_result = Some(result.clone());
                push_bounded(&mut self.history, result);
                vec![Effect::PersistHistory(self.history.clone())]
            }
            Err(e) => {
                tracing::warn!(kind = %e.kind, error = %e, "analysis failed");
                self.status = AnalysisStatus::Error;
                self.error_msg = Some(e.to_string());
                Vec::new()
            }
        }
    }

    fn select(&mut self, index: usize) -> Vec<Effect> {
        if self.is_analyzing() {
            return vec![Effect::Notice(
                "An analysis is running; history is available when it finishes.".to_string(),
            )];
        }
        let Some(entry) = self.history.get(index) else {
            return vec![Effect::Notice(format!(
                "No history entry #{}.",
                index + 1
            ))];
        };
        self.current_result = Some(entry.clone());
        self.status = AnalysisStatus::Complete;
        self.error_msg = None;
        Vec::new()
    }

    fn dismiss(&mut self) -> Vec<Effect> {
        if matches!(
            self.status,
            AnalysisStatus::Complete | AnalysisStatus::Error
        ) {
            self.status = AnalysisStatus::Idle;
            self.current_result = None;
            self.error_msg = None;
        }
        Vec::new()
    }

    /// Image handles still reachable from the current result or history.
    fn referenced_images(&self) -> BTreeSet<String> {
        self.history
            .iter()
            .chain(self.current_result.iter())
            .map(|entry| entry.image_url.clone())
            .collect()
    }
}
