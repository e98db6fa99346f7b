//! Section request lifecycle: start, cancel, supersession.

use super::{InFlight, SectionLoader};
use crate::client::RequestDescriptor;
use crate::error::{Error, FetchError, Result, user_message};
use crate::types::{SectionEvent, SectionId};
use serde_json::Value;
use std::sync::atomic::Ordering;
use tokio_util::sync::CancellationToken;

impl SectionLoader {
    /// Start (or restart) a fetch for a section
    ///
    /// A request already in flight for the section is superseded: its
    /// handle is canceled and replaced before the new request is issued,
    /// and its settlement is discarded without reaching the view. The
    /// check-cancel-replace sequence runs under a single lock acquisition
    /// with no suspension point, so no other start or cancel can
    /// interleave.
    ///
    /// Retry after a failure is exactly this method called again; nothing
    /// retries automatically.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] if the section is not configured,
    /// or [`Error::Config`] if its URL cannot be resolved.
    pub async fn start(&self, section: &SectionId) -> Result<()> {
        let section_cfg = self.section_config(section)?;
        let url = self.config.section_url(section_cfg)?;
        let timeout = self.config.section_timeout(section_cfg);
        let validator = section_cfg.schema.validator();

        let (token, epoch) = {
            let mut sections = self.sections.lock().await;
            let Some(state) = sections.get_mut(section) else {
                return Err(Error::UnknownSection(section.to_string()));
            };

            if let Some(previous) = state.in_flight.take() {
                tracing::debug!(section = %section, "superseding in-flight request");
                previous.token.cancel();
            }

            let token = CancellationToken::new();
            let epoch = self.next_epoch.fetch_add(1, Ordering::Relaxed);
            state.in_flight = Some(InFlight {
                token: token.clone(),
                epoch,
            });
            state.loading = true;
            (token, epoch)
        };

        self.view.set_loading(section, true).await;
        self.view.clear_error(section).await;
        self.emit_event(SectionEvent::Loading {
            section: section.clone(),
        });

        tracing::info!(section = %section, url = %url, "starting section fetch");

        let mut descriptor = RequestDescriptor::new(url, timeout).with_cancel(token);
        if let Some(validator) = validator {
            descriptor = descriptor.with_validator(validator);
        }

        let loader = self.clone();
        let section = section.clone();
        tokio::spawn(async move {
            let outcome = loader.client.execute(descriptor).await;
            loader.settle(&section, epoch, outcome).await;
        });

        Ok(())
    }

    /// Cancel the in-flight request for one section, if any
    ///
    /// Triggering the handle does not touch the view; the canceled
    /// request's own settlement surfaces the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UnknownSection`] if the section is not configured.
    pub async fn cancel(&self, section: &SectionId) -> Result<()> {
        let sections = self.sections.lock().await;
        let Some(state) = sections.get(section) else {
            return Err(Error::UnknownSection(section.to_string()));
        };
        if let Some(in_flight) = &state.in_flight {
            tracing::info!(section = %section, "canceling section fetch");
            in_flight.token.cancel();
        }
        Ok(())
    }

    /// Cancel every in-flight request
    ///
    /// Sections settle independently; each surfaces its own canceled
    /// outcome through its own view calls.
    pub async fn cancel_all(&self) {
        let sections = self.sections.lock().await;
        let mut canceled = 0;
        for (name, state) in sections.iter() {
            if let Some(in_flight) = &state.in_flight {
                tracing::debug!(section = %name, "canceling in-flight request");
                in_flight.token.cancel();
                canceled += 1;
            }
        }
        if canceled > 0 {
            tracing::info!(canceled, "canceled all in-flight requests");
        }
    }

    /// Start a fetch for every configured section
    ///
    /// Sections that fail to start are logged and skipped; the others
    /// proceed.
    pub async fn refresh_all(&self) {
        let names: Vec<SectionId> = self
            .config
            .sections
            .iter()
            .map(|section| section.name.clone())
            .collect();

        let results = futures::future::join_all(names.iter().map(|name| self.start(name))).await;
        for (name, result) in names.iter().zip(results) {
            if let Err(e) = result {
                tracing::warn!(section = %name, error = %e, "failed to start section during refresh_all");
            }
        }
    }

    /// Route a settled request to the view and event stream
    ///
    /// A stale epoch means the request was superseded after it settled;
    /// its outcome is dropped without touching section state or the view.
    /// A matching epoch clears the handle, so an explicit user cancel (which
    /// leaves the handle installed) surfaces its canceled outcome here.
    async fn settle(
        &self,
        section: &SectionId,
        epoch: u64,
        outcome: std::result::Result<Value, FetchError>,
    ) {
        {
            let mut sections = self.sections.lock().await;
            let Some(state) = sections.get_mut(section) else {
                return;
            };
            let is_current = state
                .in_flight
                .as_ref()
                .is_some_and(|current| current.epoch == epoch);
            if !is_current {
                tracing::debug!(section = %section, epoch, "discarding superseded settlement");
                return;
            }
            state.in_flight = None;
            state.loading = false;
            if let Ok(payload) = &outcome {
                state.data = Some(payload.clone());
            }
        }

        match outcome {
            Ok(payload) => {
                let count = payload.as_array().map_or(1, Vec::len);
                tracing::info!(section = %section, count, "section loaded");
                self.render_current(section).await;
                self.emit_event(SectionEvent::Loaded {
                    section: section.clone(),
                    count,
                });
            }
            Err(err) => {
                let message = user_message(&err);
                if matches!(err, FetchError::Canceled { .. }) {
                    tracing::info!(section = %section, "section fetch canceled by user");
                    self.view.show_error(section, &message).await;
                    self.emit_event(SectionEvent::Canceled {
                        section: section.clone(),
                    });
                } else {
                    tracing::warn!(section = %section, error = %err, "section fetch failed");
                    self.view.show_error(section, &message).await;
                    self.emit_event(SectionEvent::Failed {
                        section: section.clone(),
                        message,
                    });
                }
            }
        }

        self.view.set_loading(section, false).await;
    }
}
