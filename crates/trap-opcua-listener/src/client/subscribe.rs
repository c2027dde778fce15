// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! Subscription lifecycle.
//!
//! [`SubscribeClient`] connects once, creates a single subscription and
//! registers the data and event batches on it independently. The first
//! successful connect spawns the [`NotificationProcessor`]; both output
//! receivers are handed out by the matching `start_*` call.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use trap_core::Measurement;

use crate::config::{ConnectFailBehavior, ListenerConfig};
use crate::error::{OpcUaError, OpcUaResult, SubscriptionError};
use crate::monitoring::MonitoredItemCreateRequest;
use crate::plan::SubscriptionPlan;
use crate::types::TimestampsToReturn;

use super::processor::{HandleRegistry, HandleTarget, NotificationProcessor, ProcessorOptions};
use super::transport::{MonitoredItemCreateResult, OpcUaTransport, SubscriptionParameters};

/// Placeholder identifier for a failing item whose node is unknown.
const UNKNOWN_NODE: &str = "?";

// =============================================================================
// ClientState
// =============================================================================

/// Lifecycle state of a [`SubscribeClient`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ClientState {
    /// Not connected.
    #[default]
    Disconnected,
    /// Connect in progress.
    Connecting,
    /// Connected with a subscription, nothing registered yet.
    Connected,
    /// At least one batch is registered.
    Streaming,
    /// Stopped; terminal.
    Stopped,
}

impl ClientState {
    /// Returns `true` if a session is open.
    #[inline]
    pub fn is_connected(&self) -> bool {
        matches!(self, Self::Connected | Self::Streaming)
    }
}

impl fmt::Display for ClientState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disconnected => write!(f, "Disconnected"),
            Self::Connecting => write!(f, "Connecting"),
            Self::Connected => write!(f, "Connected"),
            Self::Streaming => write!(f, "Streaming"),
            Self::Stopped => write!(f, "Stopped"),
        }
    }
}

// =============================================================================
// SubscribeClient
// =============================================================================

/// Subscription client over an [`OpcUaTransport`].
pub struct SubscribeClient<T: OpcUaTransport> {
    transport: T,
    plan: SubscriptionPlan,
    options: ProcessorOptions,
    connect_fail_behavior: ConnectFailBehavior,
    subscription_interval: Duration,
    channel_capacity: usize,
    state: ClientState,
    disabled: bool,
    handles: HandleRegistry,
    cancel: CancellationToken,
    senders: Option<(mpsc::Sender<Measurement>, mpsc::Sender<Measurement>)>,
    data_rx: Option<mpsc::Receiver<Measurement>>,
    event_rx: Option<mpsc::Receiver<Measurement>>,
    processor: Option<JoinHandle<()>>,
}

impl<T: OpcUaTransport> SubscribeClient<T> {
    /// Validates the configuration and builds the client.
    ///
    /// Fails with a configuration error for any invalid point or filter;
    /// no connection is attempted.
    pub fn new(config: &ListenerConfig, transport: T) -> OpcUaResult<Self> {
        let plan = SubscriptionPlan::from_config(config)?;
        let (data_tx, data_rx) = mpsc::channel(config.channel_capacity);
        let (event_tx, event_rx) = mpsc::channel(config.channel_capacity);

        tracing::info!(
            endpoint = %config.endpoint,
            data_items = plan.data_requests.len(),
            event_items = plan.event_requests.len(),
            "OPC UA listener client created"
        );

        Ok(Self {
            transport,
            plan,
            options: ProcessorOptions::from_config(config),
            connect_fail_behavior: config.connect_fail_behavior,
            subscription_interval: config.subscription_interval,
            channel_capacity: config.channel_capacity,
            state: ClientState::Disconnected,
            disabled: false,
            handles: Arc::new(DashMap::new()),
            cancel: CancellationToken::new(),
            senders: Some((data_tx, event_tx)),
            data_rx: Some(data_rx),
            event_rx: Some(event_rx),
            processor: None,
        })
    }

    /// Returns the lifecycle state.
    pub fn state(&self) -> ClientState {
        self.state
    }

    /// Returns `true` once an `ignore` connect failure disabled streaming.
    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    /// Returns the subscription plan.
    pub fn plan(&self) -> &SubscriptionPlan {
        &self.plan
    }

    /// Returns the number of registered handles.
    pub fn registered_handles(&self) -> usize {
        self.handles.len()
    }

    /// Returns the transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Registers the data points and returns the data measurement stream.
    ///
    /// Returns `Ok(None)` without connecting when no data points are
    /// configured, when the connect failure policy swallowed a failure, or
    /// when the stream was already handed out.
    pub async fn start_data_stream(&mut self) -> OpcUaResult<Option<mpsc::Receiver<Measurement>>> {
        if !self.plan.has_data() {
            tracing::debug!("No data points configured, data stream not started");
            return Ok(None);
        }
        if !self.ensure_connected().await? {
            return Ok(None);
        }
        if self.data_rx.is_none() {
            tracing::warn!("Data stream already started");
            return Ok(None);
        }

        let requests = self.plan.data_requests.clone();
        self.register("items", &requests, HandleTarget::Data, |plan, i| {
            plan.node_ids.get(i).map(ToString::to_string)
        })
        .await?;

        self.state = ClientState::Streaming;
        tracing::info!(items = requests.len(), "Data streaming started");
        Ok(self.data_rx.take())
    }

    /// Registers the event notifiers and returns the event measurement
    /// stream.
    ///
    /// Same `Ok(None)` rules as [`start_data_stream`](Self::start_data_stream).
    pub async fn start_event_stream(
        &mut self,
    ) -> OpcUaResult<Option<mpsc::Receiver<Measurement>>> {
        if !self.plan.has_events() {
            tracing::debug!("No event groups configured, event stream not started");
            return Ok(None);
        }
        if !self.ensure_connected().await? {
            return Ok(None);
        }
        if self.event_rx.is_none() {
            tracing::warn!("Event stream already started");
            return Ok(None);
        }

        let requests = self.plan.event_requests.clone();
        self.register("event stream", &requests, HandleTarget::Event, |plan, i| {
            plan.event_mappings.get(i).map(|m| m.node_id.to_string())
        })
        .await?;

        self.state = ClientState::Streaming;
        tracing::info!(items = requests.len(), "Event streaming started");
        Ok(self.event_rx.take())
    }

    /// Stops streaming.
    ///
    /// Cancels the subscription and disconnects, logging but not returning
    /// failures, then cancels the processor. Returns the processor's join
    /// handle, or `None` when not connected.
    pub async fn stop(&mut self) -> Option<JoinHandle<()>> {
        if !self.state.is_connected() {
            return None;
        }

        if let Err(e) = self.transport.cancel_subscription().await {
            let error = OpcUaError::from(SubscriptionError::cancel_failed(e.to_string()));
            error.log("stop");
        }
        if let Err(e) = self.transport.disconnect().await {
            tracing::warn!(error = %e, "Disconnecting from server failed");
        }

        self.cancel.cancel();
        self.handles.clear();
        self.state = ClientState::Stopped;
        tracing::info!(endpoint = %self.options.endpoint, "OPC UA listener stopped");

        self.processor.take()
    }

    /// Connects and creates the subscription on first use.
    ///
    /// Returns `false` when the connect failure policy says to carry on
    /// without streaming.
    async fn ensure_connected(&mut self) -> OpcUaResult<bool> {
        if self.disabled {
            return Ok(false);
        }
        match self.state {
            ClientState::Connected | ClientState::Streaming => return Ok(true),
            ClientState::Stopped => return Err(OpcUaError::not_connected()),
            ClientState::Disconnected | ClientState::Connecting => {}
        }

        self.state = ClientState::Connecting;
        tracing::debug!(endpoint = %self.options.endpoint, "Connecting to OPC UA server");

        if let Err(error) = self.transport.connect().await {
            self.state = ClientState::Disconnected;
            return self.connect_failed(error);
        }

        let (tx, rx) = mpsc::channel(self.channel_capacity);
        let params = SubscriptionParameters::new(self.subscription_interval);
        let subscription_id = match self.transport.create_subscription(params, tx).await {
            Ok(id) => id,
            Err(e) => {
                if let Err(disconnect) = self.transport.disconnect().await {
                    tracing::warn!(error = %disconnect, "Disconnecting from server failed");
                }
                self.state = ClientState::Disconnected;
                let error = SubscriptionError::creation_failed(e.to_string()).into();
                return self.connect_failed(error);
            }
        };

        // The processor holds the only senders, so both outputs close when it exits.
        let Some((data_tx, event_tx)) = self.senders.take() else {
            return Err(OpcUaError::not_connected());
        };
        let processor = NotificationProcessor::new(
            Arc::new(self.plan.table.clone()),
            Arc::new(self.plan.event_mappings.clone()),
            Arc::clone(&self.handles),
            data_tx,
            event_tx,
            self.options.clone(),
            self.cancel.clone(),
        );
        self.processor = Some(tokio::spawn(processor.run(rx)));
        self.state = ClientState::Connected;

        tracing::info!(
            endpoint = %self.options.endpoint,
            subscription_id,
            interval = ?self.subscription_interval,
            "Subscription created"
        );
        Ok(true)
    }

    /// Applies the connect failure policy to a failed connect or
    /// subscription creation.
    fn connect_failed(&mut self, error: OpcUaError) -> OpcUaResult<bool> {
        match self.connect_fail_behavior {
            ConnectFailBehavior::Error => Err(error),
            ConnectFailBehavior::Retry => {
                tracing::warn!(
                    endpoint = %self.options.endpoint,
                    error = %error,
                    "Connecting failed, retrying at next interval"
                );
                Ok(false)
            }
            ConnectFailBehavior::Ignore => {
                tracing::error!(
                    endpoint = %self.options.endpoint,
                    error = %error,
                    "Connecting failed, streaming disabled for this run"
                );
                self.disabled = true;
                Ok(false)
            }
        }
    }

    /// Registers one batch.
    ///
    /// Handles go into the registry before the server is asked, since the
    /// processor is already draining and initial values may arrive while
    /// the call is in flight. They are removed again if registration fails.
    async fn register(
        &mut self,
        kind: &'static str,
        requests: &[MonitoredItemCreateRequest],
        target: fn(usize) -> HandleTarget,
        node_at: impl Fn(&SubscriptionPlan, usize) -> Option<String>,
    ) -> OpcUaResult<()> {
        for (index, request) in requests.iter().enumerate() {
            self.handles.insert(request.client_handle(), target(index));
        }

        let registered = match self.monitor(kind, requests).await {
            Ok(results) => check_results(&results, |i| node_at(&self.plan, i)),
            Err(e) => Err(e),
        };
        if registered.is_err() {
            for request in requests {
                self.handles.remove(&request.client_handle());
            }
        }
        registered
    }

    async fn monitor(
        &mut self,
        kind: &'static str,
        requests: &[MonitoredItemCreateRequest],
    ) -> OpcUaResult<Vec<MonitoredItemCreateResult>> {
        let results = self
            .transport
            .monitor_items(TimestampsToReturn::Both, requests)
            .await
            .map_err(|e| SubscriptionError::monitor_failed(kind, e.to_string()))?;

        if results.len() != requests.len() {
            return Err(SubscriptionError::ResultCountMismatch {
                expected: requests.len(),
                actual: results.len(),
            }
            .into());
        }
        Ok(results)
    }
}

impl<T: OpcUaTransport> fmt::Debug for SubscribeClient<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SubscribeClient")
            .field("endpoint", &self.options.endpoint)
            .field("state", &self.state)
            .field("disabled", &self.disabled)
            .field("handles", &self.handles.len())
            .finish()
    }
}

/// Fails on the first item with a non-good status.
fn check_results(
    results: &[MonitoredItemCreateResult],
    node_at: impl Fn(usize) -> Option<String>,
) -> OpcUaResult<()> {
    for (index, result) in results.iter().enumerate() {
        if !result.status.is_good() {
            let node_id = node_at(index).unwrap_or_else(|| UNKNOWN_NODE.to_string());
            return Err(OpcUaError::monitored_item_failed(node_id, result.status));
        }
    }
    Ok(())
}
