//! Operations over a section's cached payload: toggle and filter.

use super::SectionLoader;
use crate::error::{Error, Result};
use crate::types::{SectionId, TodoFilter};
use serde_json::Value;

impl SectionLoader {
    /// Toggle the completed flag of one cached item
    ///
    /// The upstream endpoint does not persist updates, so this mutates the
    /// cached payload only and re-renders the section. Unknown item ids and
    /// sections without a fetched payload are a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] if the section is not configured.
    pub async fn toggle_item(&self, section: &SectionId, id: i64, completed: bool) -> Result<()> {
        {
            let mut sections = self.sections.lock().await;
            let Some(state) = sections.get_mut(section) else {
                return Err(Error::UnknownSection(section.to_string()));
            };
            let Some(items) = state.data.as_mut().and_then(Value::as_array_mut) else {
                return Ok(());
            };
            let Some(item) = items
                .iter_mut()
                .find(|item| item.get("id").and_then(Value::as_i64) == Some(id))
            else {
                return Ok(());
            };
            if let Some(fields) = item.as_object_mut() {
                tracing::debug!(section = %section, id, completed, "toggling cached item");
                fields.insert("completed".to_string(), Value::Bool(completed));
            }
        }

        self.render_current(section).await;
        Ok(())
    }

    /// Set the visibility filter for a section and re-render
    ///
    /// Filtering is applied at render time; the cached payload is never
    /// mutated by a filter change.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] if the section is not configured.
    pub async fn set_filter(&self, section: &SectionId, filter: TodoFilter) -> Result<()> {
        {
            let mut sections = self.sections.lock().await;
            let Some(state) = sections.get_mut(section) else {
                return Err(Error::UnknownSection(section.to_string()));
            };
            state.filter = filter;
        }

        self.render_current(section).await;
        Ok(())
    }

    /// Render the cached payload through the section's current filter
    ///
    /// No-op when nothing has been fetched yet.
    pub(crate) async fn render_current(&self, section: &SectionId) {
        let rendered = {
            let sections = self.sections.lock().await;
            let Some(state) = sections.get(section) else {
                return;
            };
            let Some(data) = &state.data else {
                return;
            };
            apply_filter(data, state.filter)
        };
        self.view.render(section, &rendered).await;
    }
}

/// Project a payload through a visibility filter
///
/// Non-array payloads pass through untouched. Items without a completed
/// flag count as not completed.
fn apply_filter(payload: &Value, filter: TodoFilter) -> Value {
    match filter {
        TodoFilter::All => payload.clone(),
        TodoFilter::Active | TodoFilter::Completed => {
            let Some(items) = payload.as_array() else {
                return payload.clone();
            };
            let wanted = matches!(filter, TodoFilter::Completed);
            Value::Array(
                items
                    .iter()
                    .filter(|item| {
                        item.get("completed").and_then(Value::as_bool).unwrap_or(false) == wanted
                    })
                    .cloned()
                    .collect(),
            )
        }
    }
}
