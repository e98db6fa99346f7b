//! Section orchestration split into focused submodules
//!
//! The [`SectionLoader`] struct and its methods are organized by domain:
//! - [`control`] - Request lifecycle (start, cancel, supersession)
//! - [`view_ops`] - Cached-payload operations (toggle, filter, re-render)

mod control;
mod view_ops;

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests;

use crate::client::FetchClient;
use crate::config::{Config, SectionConfig};
use crate::error::{Error, Result};
use crate::types::{SectionEvent, SectionId, TodoFilter};
use crate::view::SectionView;
use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::AtomicU64;
use tokio_util::sync::CancellationToken;

/// Handle of one in-flight request
///
/// The epoch distinguishes the settlement of this exact request from the
/// settlement of a request that has since superseded it.
pub(crate) struct InFlight {
    pub(crate) token: CancellationToken,
    pub(crate) epoch: u64,
}

/// Mutable state of one configured section
///
/// Created at construction, lives for the loader's lifetime. Only the
/// loader mutates it, always under the section map lock.
#[derive(Default)]
pub(crate) struct SectionState {
    /// Last successful payload, if any
    pub(crate) data: Option<serde_json::Value>,
    /// Handle of the current in-flight request
    pub(crate) in_flight: Option<InFlight>,
    /// Whether a request for the section is currently in flight
    pub(crate) loading: bool,
    /// Visibility filter applied when rendering
    pub(crate) filter: TodoFilter,
}

/// Main loader instance (cloneable - all fields are Arc-wrapped)
///
/// Owns one [`SectionState`] per configured section and routes every
/// settlement to the injected [`SectionView`] and the event stream.
/// Sections are independent: cancellation or failure of one never touches
/// another's state.
#[derive(Clone)]
pub struct SectionLoader {
    /// Configuration (wrapped in Arc for sharing across tasks)
    pub(crate) config: Arc<Config>,
    /// HTTP client shared by all section fetches
    pub(crate) client: FetchClient,
    /// Injected presentation adapter
    pub(crate) view: Arc<dyn SectionView>,
    /// Event broadcast channel sender (multiple subscribers supported)
    pub(crate) event_tx: tokio::sync::broadcast::Sender<SectionEvent>,
    /// Per-section state, keyed by section name
    pub(crate) sections: Arc<tokio::sync::Mutex<HashMap<SectionId, SectionState>>>,
    /// Monotonic source of request epochs
    pub(crate) next_epoch: Arc<AtomicU64>,
}

impl SectionLoader {
    /// Create a new SectionLoader instance
    ///
    /// Validates the configuration, builds the HTTP client and seeds one
    /// section state per configured section. Section states live for the
    /// loader's lifetime; nothing is fetched until [`start`](Self::start)
    /// or [`refresh_all`](Self::refresh_all) is called.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the configuration is invalid or the
    /// HTTP client cannot be built.
    pub fn new(config: Config, view: Arc<dyn SectionView>) -> Result<Self> {
        config.validate()?;
        let client = FetchClient::new(&config.http.user_agent)?;

        // Buffered so slow subscribers do not stall settlements
        let (event_tx, _rx) = tokio::sync::broadcast::channel(256);

        let sections = config
            .sections
            .iter()
            .map(|section| (section.name.clone(), SectionState::default()))
            .collect();

        tracing::info!(sections = config.sections.len(), "section loader initialized");

        Ok(Self {
            config: Arc::new(config),
            client,
            view,
            event_tx,
            sections: Arc::new(tokio::sync::Mutex::new(sections)),
            next_epoch: Arc::new(AtomicU64::new(0)),
        })
    }

    /// Subscribe to section lifecycle events
    ///
    /// Multiple subscribers are supported. Each subscriber receives all
    /// events independently; events are dropped silently when nobody
    /// listens.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use dashfetch::{Config, NoOpView, SectionLoader};
    /// use std::sync::Arc;
    ///
    /// # fn main() -> Result<(), Box<dyn std::error::Error>> {
    /// let loader = SectionLoader::new(Config::default(), Arc::new(NoOpView))?;
    ///
    /// let mut events = loader.subscribe();
    /// tokio::spawn(async move {
    ///     while let Ok(event) = events.recv().await {
    ///         tracing::info!(?event, "section event");
    ///     }
    /// });
    /// # Ok(())
    /// # }
    /// ```
    pub fn subscribe(&self) -> tokio::sync::broadcast::Receiver<SectionEvent> {
        self.event_tx.subscribe()
    }

    /// Get the current configuration
    pub fn get_config(&self) -> Arc<Config> {
        Arc::clone(&self.config)
    }

    /// Whether a request for the section is currently in flight
    pub async fn is_loading(&self, section: &SectionId) -> bool {
        let sections = self.sections.lock().await;
        sections.get(section).is_some_and(|state| state.loading)
    }

    /// Last successfully fetched payload for a section, if any
    pub async fn payload(&self, section: &SectionId) -> Option<serde_json::Value> {
        let sections = self.sections.lock().await;
        sections.get(section).and_then(|state| state.data.clone())
    }

    /// Emit an event to all subscribers
    ///
    /// send() returns Err if there are no receivers, which is fine - the
    /// event is dropped and loading continues.
    pub(crate) fn emit_event(&self, event: SectionEvent) {
        self.event_tx.send(event).ok();
    }

    /// Look up a section's configuration by name
    pub(crate) fn section_config(&self, name: &SectionId) -> Result<&SectionConfig> {
        self.config
            .section(name)
            .ok_or_else(|| Error::UnknownSection(name.to_string()))
    }
}
