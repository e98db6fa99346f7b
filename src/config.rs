//! Configuration types for dashfetch

use crate::error::{Error, Result};
use crate::schema::SchemaKind;
use crate::types::SectionId;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use url::Url;

/// HTTP behavior configuration
///
/// Groups settings shared by every outbound request. Used as a nested
/// sub-config within [`Config`].
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct HttpConfig {
    /// Base endpoint every section path is resolved against
    /// (default: "https://jsonplaceholder.typicode.com")
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Per-request timeout (default: 8s, must be greater than zero)
    #[serde(default = "default_request_timeout")]
    pub request_timeout: Duration,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout: default_request_timeout(),
            user_agent: default_user_agent(),
        }
    }
}

/// One independently fetched dataset
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct SectionConfig {
    /// Section name, used as the routing key for state and view calls
    pub name: SectionId,

    /// Path relative to the base endpoint (e.g. "posts")
    pub path: String,

    /// Maximum item count requested via the `_limit` query parameter
    /// (default: 10)
    #[serde(default = "default_limit")]
    pub limit: u32,

    /// Per-section timeout override (falls back to the global request
    /// timeout)
    #[serde(default)]
    pub timeout: Option<Duration>,

    /// Payload schema the response must satisfy
    #[serde(default)]
    pub schema: SchemaKind,
}

/// Main configuration for [`SectionLoader`](crate::SectionLoader)
///
/// Defaults to two sections: `posts` (limit 10) and `todos` (limit 12).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    /// HTTP behavior settings
    #[serde(flatten)]
    pub http: HttpConfig,

    /// Configured sections (at least one required)
    #[serde(default = "default_sections")]
    pub sections: Vec<SectionConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http: HttpConfig::default(),
            sections: default_sections(),
        }
    }
}

impl Config {
    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the request timeout is zero, the base
    /// URL does not parse, the section list is empty, a per-section timeout
    /// override is zero, or two sections share a name.
    pub fn validate(&self) -> Result<()> {
        if self.http.request_timeout.is_zero() {
            return Err(Error::Config {
                message: "request_timeout must be greater than zero".to_string(),
                key: Some("request_timeout".to_string()),
            });
        }

        let base = Url::parse(&self.http.base_url).map_err(|e| Error::Config {
            message: format!("invalid base_url '{}': {}", self.http.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        if base.cannot_be_a_base() {
            return Err(Error::Config {
                message: format!("base_url '{}' cannot carry a path", self.http.base_url),
                key: Some("base_url".to_string()),
            });
        }

        if self.sections.is_empty() {
            return Err(Error::Config {
                message: "at least one section is required".to_string(),
                key: Some("sections".to_string()),
            });
        }

        let mut seen = std::collections::HashSet::new();
        for section in &self.sections {
            if !seen.insert(&section.name) {
                return Err(Error::Config {
                    message: format!("duplicate section name '{}'", section.name),
                    key: Some("sections".to_string()),
                });
            }
            if section.timeout.is_some_and(|t| t.is_zero()) {
                return Err(Error::Config {
                    message: format!("timeout for section '{}' must be greater than zero", section.name),
                    key: Some("sections".to_string()),
                });
            }
        }

        Ok(())
    }

    /// Look up a section's configuration by name
    pub fn section(&self, name: &SectionId) -> Option<&SectionConfig> {
        self.sections.iter().find(|s| &s.name == name)
    }

    /// Resolve the request URL for a section: base + path + `_limit`
    pub fn section_url(&self, section: &SectionConfig) -> Result<Url> {
        let mut url = Url::parse(&self.http.base_url).map_err(|e| Error::Config {
            message: format!("invalid base_url '{}': {}", self.http.base_url, e),
            key: Some("base_url".to_string()),
        })?;
        url.path_segments_mut()
            .map_err(|_| Error::Config {
                message: format!("base_url '{}' cannot carry a path", self.http.base_url),
                key: Some("base_url".to_string()),
            })?
            .pop_if_empty()
            .push(&section.path);
        url.query_pairs_mut()
            .append_pair("_limit", &section.limit.to_string());
        Ok(url)
    }

    /// Effective timeout for a section
    pub fn section_timeout(&self, section: &SectionConfig) -> Duration {
        section.timeout.unwrap_or(self.http.request_timeout)
    }
}

fn default_base_url() -> String {
    "https://jsonplaceholder.typicode.com".to_string()
}

fn default_request_timeout() -> Duration {
    Duration::from_millis(8000)
}

fn default_user_agent() -> String {
    format!("dashfetch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_limit() -> u32 {
    10
}

fn default_sections() -> Vec<SectionConfig> {
    vec![
        SectionConfig {
            name: "posts".into(),
            path: "posts".to_string(),
            limit: 10,
            timeout: None,
            schema: SchemaKind::PostList,
        },
        SectionConfig {
            name: "todos".into(),
            path: "todos".to_string(),
            limit: 12,
            timeout: None,
            schema: SchemaKind::TodoList,
        },
    ]
}
