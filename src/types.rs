//! Core types for dashfetch

use serde::{Deserialize, Serialize};

/// Identifier of one independently fetched and rendered dataset
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub String);

impl SectionId {
    /// Create a new SectionId
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Get the section name as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for SectionId {
    fn from(name: &str) -> Self {
        Self(name.to_string())
    }
}

impl From<String> for SectionId {
    fn from(name: String) -> Self {
        Self(name)
    }
}

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One post item as served by a posts section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Post {
    /// Item identifier
    pub id: i64,
    /// Post title
    pub title: String,
    /// Post body text
    pub body: String,
}

/// One todo item as served by a todos section
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Todo {
    /// Item identifier
    pub id: i64,
    /// Todo title
    pub title: String,
    /// Completion flag
    pub completed: bool,
}

/// Visibility filter applied when rendering a section
///
/// Filtering happens at render time only; the cached payload is never
/// mutated by a filter change.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TodoFilter {
    /// Show every item
    #[default]
    All,
    /// Show only items not yet completed
    Active,
    /// Show only completed items
    Completed,
}

/// Event emitted during a section's fetch lifecycle
///
/// Events mirror every view notification so headless consumers can follow
/// section state without implementing a view.
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum SectionEvent {
    /// A fetch was started for the section
    Loading {
        /// Section the fetch belongs to
        section: SectionId,
    },

    /// The section's fetch settled successfully
    Loaded {
        /// Section the fetch belongs to
        section: SectionId,
        /// Number of items in the fetched payload
        count: usize,
    },

    /// The section's fetch settled with a classified failure
    Failed {
        /// Section the fetch belongs to
        section: SectionId,
        /// User-facing message for the failure
        message: String,
    },

    /// The section's fetch was canceled by the user
    Canceled {
        /// Section the fetch belongs to
        section: SectionId,
    },
}

impl SectionEvent {
    /// Section this event belongs to
    pub fn section(&self) -> &SectionId {
        match self {
            SectionEvent::Loading { section }
            | SectionEvent::Loaded { section, .. }
            | SectionEvent::Failed { section, .. }
            | SectionEvent::Canceled { section } => section,
        }
    }
}
