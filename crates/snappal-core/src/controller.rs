//! Runtime around the reducer: executes effects and runs analyses on tasks.

use std::sync::Arc;

use anyhow::{Result, anyhow, bail};
use snappal_types::AnalysisResult;
use tokio::sync::mpsc;

use crate::analysis::{Analyzer, GenerativeService};
use crate::history::HistoryStore;
use crate::images::{ImageRegistry, SourceImage};
use crate::state::{AnalysisState, Effect, StateEvent};

/// Owns the application state and performs the I/O its effects ask for.
///
/// Completed analyses arrive on the receiver returned by [`Controller::new`]
/// and must be fed back through [`Controller::dispatch`].
pub struct Controller<S> {
    state: AnalysisState,
    analyzer: Arc<Analyzer<S>>,
    store: HistoryStore,
    events: mpsc::UnboundedSender<StateEvent>,
}

impl<S: GenerativeService + 'static> Controller<S> {
    pub fn new(
        analyzer: Analyzer<S>,
        store: HistoryStore,
    ) -> (Self, mpsc::UnboundedReceiver<StateEvent>) {
        let (events, rx) = mpsc::unbounded_channel();
        let controller = Self {
            state: AnalysisState::new(),
            analyzer: Arc::new(analyzer),
            store,
            events,
        };
        (controller, rx)
    }

    pub fn state(&self) -> &AnalysisState {
        &self.state
    }

    pub fn images(&self) -> &ImageRegistry {
        self.analyzer.images()
    }

    /// Reads persisted history into the state.
    pub fn load_history(&mut self) {
        let entries = self.store.load();
        tracing::debug!(entries = entries.len(), "history loaded");
        self.dispatch(StateEvent::HistoryLoaded(entries));
    }

    /// The result's source image, if it was analyzed in this session.
    pub fn source_image(&self, result: &AnalysisResult) -> Option<SourceImage> {
        self.images().resolve(&result.image_url)
    }

    /// Applies an event and executes the resulting effects.
    ///
    /// Returns user-facing notices (rejected events, storage failures).
    pub fn dispatch(&mut self, event: StateEvent) -> Vec<String> {
        let effects = self.state.update(event);
        let mut notices = Vec::new();
        for effect in effects {
            if let Some(notice) = self.execute(effect) {
                notices.push(notice);
            }
        }
        notices
    }

    fn execute(&self, effect: Effect) -> Option<String> {
        match effect {
            Effect::StartAnalysis(image) => {
                self.spawn_analysis(image);
                None
            }
            Effect::PersistHistory(entries) => match self.store.save(&entries) {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "failed to persist history");
                    Some(format!("Could not save history: {e:#}"))
                }
            },
            Effect::ClearStorage => match self.store.clear() {
                Ok(()) => None,
                Err(e) => {
                    tracing::warn!(error = %format!("{e:#}"), "failed to clear history");
                    Some(format!("Could not clear saved history: {e:#}"))
                }
            },
            Effect::ReleaseImage(handle) => {
                self.images().revoke(&handle);
                None
            }
            Effect::Notice(message) => Some(message),
        }
    }

    fn spawn_analysis(&self, image: SourceImage) {
        let analyzer = Arc::clone(&self.analyzer);
        let events = self.events.clone();
        tokio::spawn(async move {
            let outcome = analyzer.analyze(&image).await;
            if events.send(StateEvent::AnalysisFinished(outcome)).is_err() {
                tracing::debug!("controller dropped before analysis finished");
            }
        });
    }

    /// Submits one image and waits for its outcome.
    ///
    /// # Errors
    /// Returns an error if the submission is rejected or the analysis fails.
    pub async fn analyze_once(
        &mut self,
        rx: &mut mpsc::UnboundedReceiver<StateEvent>,
        image: SourceImage,
    ) -> Result<AnalysisResult> {
        let notices = self.dispatch(StateEvent::Submit(image));
        if !self.state.is_analyzing() {
            bail!("{}", notices.join("\n"));
        }

        while let Some(event) = rx.recv().await {
            let StateEvent::AnalysisFinished(outcome) = event else {
                self.dispatch(event);
                continue;
            };
            let failure = outcome.as_ref().err().cloned();
            for notice in self.dispatch(StateEvent::AnalysisFinished(outcome)) {
                tracing::warn!("{notice}");
            }
            if let Some(e) = failure {
                return Err(e.into());
            }
            return self
                .state
                .current_result
                .clone()
                .ok_or_else(|| anyhow!("analysis finished without a result"));
        }
        bail!("analysis task ended without a result")
    }
}
