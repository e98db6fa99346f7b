//! # dashfetch
//!
//! Cancellation-aware JSON section loading for dashboard-style consumers.
//!
//! ## Design Philosophy
//!
//! dashfetch is designed to be:
//! - **Library-first** - No CLI or UI, purely a Rust crate for embedding
//! - **Classified failures** - Every fetch settles with a payload or exactly
//!   one tagged error, never an unclassified one
//! - **Cooperative cancellation** - Handles are values; triggering one is a
//!   request to abort, observed at the next suspension point
//! - **Event-driven** - Consumers subscribe to events, no polling required
//!
//! ## Quick Start
//!
//! ```no_run
//! use dashfetch::{Config, NoOpView, SectionLoader};
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let loader = SectionLoader::new(Config::default(), Arc::new(NoOpView))?;
//!
//!     // Subscribe to events
//!     let mut events = loader.subscribe();
//!     tokio::spawn(async move {
//!         while let Ok(event) = events.recv().await {
//!             println!("Event: {:?}", event);
//!         }
//!     });
//!
//!     // Fetch every configured section
//!     loader.refresh_all().await;
//!
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]

/// Fetch execution and outcome classification
pub mod client;
/// Configuration types
pub mod config;
/// Error types
pub mod error;
/// Section orchestration
pub mod loader;
/// Payload shape validation
pub mod schema;
/// Core types and events
pub mod types;
/// Presentation adapter boundary
pub mod view;

// Re-export commonly used types
pub use client::{FetchClient, RequestDescriptor};
pub use config::{Config, HttpConfig, SectionConfig};
pub use error::{Error, FetchError, Result, user_message};
pub use loader::SectionLoader;
pub use schema::{SchemaKind, Validator};
pub use types::{Post, SectionEvent, SectionId, Todo, TodoFilter};
pub use view::{NoOpView, SectionView};
