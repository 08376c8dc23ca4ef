//! ForwarderActor - Posts region summaries to a remote endpoint
//!
//! ## Message Flow
//!
//! ```text
//! broadcast SummaryEvent → serialize ForwardPayload → POST <url> (bounded timeout)
//!     ↑
//!     └─── Commands (ForwardNow, GetStats, Shutdown)
//! ```
//!
//! Network and protocol errors are logged and counted; they never reach the
//! coordinator.

use std::time::Duration;

use anyhow::{Context, Result};
use serde::Serialize;
use tokio::sync::{broadcast, mpsc, oneshot};
use tracing::{debug, error, instrument, trace, warn};

use crate::CropSuggestion;
use crate::config::ForwardConfig;

use super::messages::{ForwarderCommand, ForwarderStats, SummaryEvent};

/// JSON body sent to the remote endpoint
#[derive(Debug, Clone, Serialize)]
pub struct ForwardPayload {
    pub region: String,

    #[serde(rename = "deviceId")]
    pub device_id: String,

    /// Soil classification rendered as text
    pub soil: String,

    pub crops: Vec<CropSuggestion>,
}

impl From<&SummaryEvent> for ForwardPayload {
    fn from(event: &SummaryEvent) -> Self {
        Self {
            region: event.region.clone(),
            device_id: event.update.device_id.clone(),
            soil: event.update.soil.to_string(),
            crops: event.update.crops.clone(),
        }
    }
}

/// Actor forwarding every summary to one remote URL
pub struct ForwarderActor {
    config: ForwardConfig,

    /// HTTP client (reused across requests)
    client: reqwest::Client,

    command_rx: mpsc::Receiver<ForwarderCommand>,

    summary_rx: broadcast::Receiver<SummaryEvent>,

    stats: ForwarderStats,
}

impl ForwarderActor {
    pub fn new(
        config: ForwardConfig,
        command_rx: mpsc::Receiver<ForwarderCommand>,
        summary_rx: broadcast::Receiver<SummaryEvent>,
    ) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to build HTTP client")?;

        Ok(Self {
            config,
            client,
            command_rx,
            summary_rx,
            stats: ForwarderStats::default(),
        })
    }

    /// Run the actor's main loop
    #[instrument(skip(self), fields(url = %self.config.url))]
    pub async fn run(mut self) {
        debug!("starting forwarder actor");

        loop {
            tokio::select! {
                biased;

                result = self.summary_rx.recv() => {
                    match result {
                        Ok(event) => {
                            if let Err(e) = self.forward(&event).await {
                                error!("failed to forward summary: {:#}", e);
                            }
                        }
                        Err(broadcast::error::RecvError::Lagged(skipped)) => {
                            warn!("forwarder lagged, skipped {skipped} summaries");
                        }
                        Err(broadcast::error::RecvError::Closed) => {
                            warn!("summary channel closed, shutting down");
                            break;
                        }
                    }
                }

                Some(cmd) = self.command_rx.recv() => {
                    match cmd {
                        ForwarderCommand::ForwardNow { event, respond_to } => {
                            debug!("received ForwardNow command");
                            let result = self.forward(&event).await;
                            let _ = respond_to.send(result);
                        }

                        ForwarderCommand::GetStats { respond_to } => {
                            let _ = respond_to.send(self.stats.clone());
                        }

                        ForwarderCommand::Shutdown => {
                            debug!("received shutdown command");
                            break;
                        }
                    }
                }

                else => {
                    warn!("command channel closed, shutting down");
                    break;
                }
            }
        }

        debug!("forwarder actor stopped");
    }

    /// POST one summary, updating the sent/failed counters
    async fn forward(&mut self, event: &SummaryEvent) -> Result<()> {
        let result = self.post(event).await;

        match &result {
            Ok(()) => self.stats.sent += 1,
            Err(_) => self.stats.failed += 1,
        }

        result
    }

    #[instrument(skip(self, event), fields(region = %event.region, device = %event.update.device_id))]
    async fn post(&self, event: &SummaryEvent) -> Result<()> {
        let payload = ForwardPayload::from(event);

        trace!("forwarding summary to {}", self.config.url);

        let response = self
            .client
            .post(&self.config.url)
            .json(&payload)
            .send()
            .await
            .context("failed to send HTTP request")?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            anyhow::bail!("HTTP error: {} {}", status, body);
        }

        trace!("summary forwarded");
        Ok(())
    }
}

/// Handle for controlling a ForwarderActor
#[derive(Clone, Debug)]
pub struct ForwarderHandle {
    sender: mpsc::Sender<ForwarderCommand>,
}

impl ForwarderHandle {
    /// Spawn a forwarder subscribed to `summary_rx`
    pub fn spawn(
        config: ForwardConfig,
        summary_rx: broadcast::Receiver<SummaryEvent>,
    ) -> Result<Self> {
        let (cmd_tx, cmd_rx) = mpsc::channel(32);

        let actor = ForwarderActor::new(config, cmd_rx, summary_rx)?;

        tokio::spawn(actor.run());

        Ok(Self { sender: cmd_tx })
    }

    /// Forward a summary now and wait for the outcome
    pub async fn forward_now(&self, event: SummaryEvent) -> Result<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ForwarderCommand::ForwardNow {
                event,
                respond_to: tx,
            })
            .await
            .context("failed to send ForwardNow command")?;

        rx.await.context("failed to receive response")??;
        Ok(())
    }

    pub async fn get_stats(&self) -> Result<ForwarderStats> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(ForwarderCommand::GetStats { respond_to: tx })
            .await
            .context("failed to send GetStats command")?;

        rx.await.context("failed to receive response")
    }

    pub async fn shutdown(&self) -> Result<()> {
        self.sender
            .send(ForwarderCommand::Shutdown)
            .await
            .context("failed to send Shutdown command")?;
        Ok(())
    }
}
