//! Presentation adapter boundary
//!
//! The loader talks to exactly one injected [`SectionView`]; nothing else in
//! the crate touches a UI layer. Implementations render into whatever
//! surface the embedding application owns (DOM bridge, TUI, plain console).

use crate::types::SectionId;
use async_trait::async_trait;
use serde_json::Value;

/// Trait for presentation adapters
///
/// All methods are per-section; the loader never issues a call for a
/// section other than the one the triggering request belongs to. Retry is a
/// re-invocation of [`SectionLoader::start`](crate::SectionLoader::start);
/// implementations surfacing an error bind their retry affordance to it.
#[async_trait]
pub trait SectionView: Send + Sync {
    /// Toggle the loading indicator for a section
    async fn set_loading(&self, section: &SectionId, loading: bool);

    /// Surface a user-facing error message for a section
    async fn show_error(&self, section: &SectionId, message: &str);

    /// Clear any previously surfaced error for a section
    async fn clear_error(&self, section: &SectionId);

    /// Render a successful payload for a section
    async fn render(&self, section: &SectionId, payload: &Value);
}

/// View that ignores every notification
///
/// Useful for headless embedding where the event stream
/// ([`SectionLoader::subscribe`](crate::SectionLoader::subscribe)) is the
/// only consumer surface.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoOpView;

#[async_trait]
impl SectionView for NoOpView {
    async fn set_loading(&self, _section: &SectionId, _loading: bool) {}

    async fn show_error(&self, _section: &SectionId, _message: &str) {}

    async fn clear_error(&self, _section: &SectionId) {}

    async fn render(&self, _section: &SectionId, _payload: &Value) {}
}
