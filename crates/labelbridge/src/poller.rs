//! Polling supervisor: walks every sync-enabled tenant on a fixed cadence
//! and routes inbound labeler events to the review queue.
//!
//! Error isolation is deliberate and layered: a tenant whose poll fails is
//! logged and skipped until the next cycle (its cursor untouched); an event
//! whose processing fails is logged and skipped (its cursor already advanced
//! with the page, so the failure becomes a skip rather than a wedge).

use crate::error::BridgeError;
use crate::mapper::EventCategory;
use crate::review_queue::{REVIEW_SOURCE, ReviewQueue, ReviewQueueItem};
use crate::service::{LabelerBridge, classify_event};
use chrono::Utc;
use labelbridge_common::http_client::HttpClient;
use labelbridge_ozone::defs::ModEventView;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;

/// Poller configuration: a closed set, no option bags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollerConfig {
    /// Delay between cycles.
    pub interval: Duration,
    /// Master switch; when false, [`PollSupervisor::run`] returns immediately.
    pub enabled: bool,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(30_000),
            enabled: false,
        }
    }
}

/// Long-running supervisor driving `poll → classify → enqueue` per tenant.
pub struct PollSupervisor<C: HttpClient + Clone> {
    bridge: Arc<LabelerBridge<C>>,
    review_queue: Arc<dyn ReviewQueue>,
    config: PollerConfig,
}

impl<C: HttpClient + Clone> PollSupervisor<C> {
    pub fn new(
        bridge: Arc<LabelerBridge<C>>,
        review_queue: Arc<dyn ReviewQueue>,
        config: PollerConfig,
    ) -> Self {
        Self {
            bridge,
            review_queue,
            config,
        }
    }

    /// Run until the shutdown signal flips. The signal is checked before
    /// each tenant and during the inter-cycle sleep; the tenant currently
    /// being processed always drains its event page first.
    pub async fn run(&self, mut shutdown_rx: watch::Receiver<bool>) {
        if !self.config.enabled {
            tracing::info!("event poller disabled");
            return;
        }
        tracing::info!(
            interval_ms = self.config.interval.as_millis() as u64,
            "event poller started"
        );

        loop {
            if *shutdown_rx.borrow() {
                break;
            }

            self.run_cycle(&shutdown_rx).await;

            tokio::select! {
                _ = tokio::time::sleep(self.config.interval) => {}
                _ = shutdown_rx.changed() => {
                    break;
                }
            }
        }

        tracing::info!("event poller stopped");
    }

    /// One pass over every sync-enabled tenant.
    pub async fn run_cycle(&self, shutdown_rx: &watch::Receiver<bool>) {
        let tenants = match self.bridge.list_enabled_tenants().await {
            Ok(tenants) => tenants,
            Err(e) => {
                tracing::warn!(error = %e, "failed to list sync-enabled tenants");
                return;
            }
        };

        tracing::debug!(tenant_count = tenants.len(), "poll cycle starting");

        for tenant_id in tenants {
            if *shutdown_rx.borrow() {
                break;
            }
            self.poll_tenant(&tenant_id).await;
        }
    }

    /// Poll one tenant and process its page of events in stream order.
    async fn poll_tenant(&self, tenant_id: &str) {
        let outcome = match self.bridge.poll_events(tenant_id).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(tenant_id, error = %e, "event poll failed");
                return;
            }
        };

        if !outcome.events.is_empty() {
            tracing::debug!(
                tenant_id,
                event_count = outcome.events.len(),
                cursor = ?outcome.new_cursor,
                "processing labeler events"
            );
        }

        for event in &outcome.events {
            if let Err(e) = self.process_event(tenant_id, event).await {
                tracing::error!(
                    tenant_id,
                    event_id = event.id,
                    error = %e,
                    "event processing failed; skipping"
                );
            }
        }
    }

    async fn process_event(
        &self,
        tenant_id: &str,
        event: &ModEventView,
    ) -> Result<(), BridgeError> {
        let classified = classify_event(event);

        let Some(category) = classified.category else {
            tracing::debug!(tenant_id, event_id = event.id, kind = %event.event.kind, "unrecognized event kind; skipping");
            return Ok(());
        };
        let Some(subject_did) = classified.subject_did.clone() else {
            tracing::debug!(tenant_id, event_id = event.id, "event has no resolvable subject; skipping");
            return Ok(());
        };

        match category {
            EventCategory::Report | EventCategory::Label | EventCategory::Escalate => {
                let reason = match category {
                    EventCategory::Report => match &event.event.report_type {
                        Some(report_type) => format!(
                            "Report received from external labeler ({})",
                            report_type
                        ),
                        None => "Report received from external labeler".to_owned(),
                    },
                    EventCategory::Label => format!(
                        "Labels applied by external labeler: {}",
                        classified.labels.join(", ")
                    ),
                    EventCategory::Escalate => "Escalated from external labeler".to_owned(),
                    _ => unreachable!(),
                };

                // Label events carry policy context for triage.
                let policy_ids = if category == EventCategory::Label {
                    self.bridge
                        .map_labels_to_policies(tenant_id, &classified.labels)
                        .await?
                } else {
                    Vec::new()
                };

                self.review_queue
                    .enqueue(ReviewQueueItem {
                        tenant_id: tenant_id.to_owned(),
                        payload: serde_json::json!({
                            "reason": reason,
                            "category": category,
                            "subjectDid": subject_did,
                            "classified": classified,
                            "event": event,
                        }),
                        created_at: Utc::now(),
                        source: REVIEW_SOURCE.to_owned(),
                        correlation_id: Some(event.id.to_string()),
                        policy_ids,
                    })
                    .await?;
            }
            EventCategory::Takedown | EventCategory::Comment => {
                tracing::info!(
                    tenant_id,
                    event_id = event.id,
                    category = ?category,
                    subject_did = %subject_did,
                    "recorded external moderation event"
                );
            }
        }

        Ok(())
    }
}
