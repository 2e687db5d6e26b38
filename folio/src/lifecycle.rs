//! Install and activation of a proxy version.
//!
//! A [`Lifecycle`] walks one proxy version through
//! `Parsed → Installing → Installed → Activating → Activated`, ending in
//! `Redundant` once a newer version replaces it. The current state is
//! published on a [`watch`] channel.
//!
//! - **Install** opens the static partition and pre-populates it with the
//!   configured static assets. A missing asset is logged and skipped.
//! - **Activate** deletes every partition outside the current version triple
//!   and claims the connected clients.
//! - **Clear** aborts pending background writes, deletes every partition and
//!   tells each client.

use std::sync::Arc;

use folio_backend::{Backend, BackendResult, DeleteStatus, PartitionKind, Partitions};
use folio_core::{CacheEntry, CacheKey, ProxyRequest, Upstream};
use futures::future::join_all;
use tokio::sync::watch;
use tracing::{Instrument, debug, debug_span, info, warn};

use crate::clients::{ClientMessage, ClientNotification, Clients};
use crate::config::ProxyConfig;
use crate::error::ProxyError;
use crate::offload::OffloadManager;

/// Lifecycle state of one proxy version.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LifecycleState {
    /// Created, install not started.
    #[default]
    Parsed,
    /// Pre-populating the static partition.
    Installing,
    /// Installed and waiting to activate.
    Installed,
    /// Evicting superseded partitions.
    Activating,
    /// Serving requests and controlling clients.
    Activated,
    /// Replaced by a newer version.
    Redundant,
}

/// Outcome of [`Lifecycle::install`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InstallReport {
    /// Static paths stored in the static partition.
    pub cached: Vec<String>,
    /// Static paths that could not be fetched or stored.
    pub failed: Vec<String>,
}

/// Outcome of [`Lifecycle::activate`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ActivationReport {
    /// Superseded partitions that were deleted.
    pub deleted: Vec<String>,
    /// Clients newly claimed.
    pub claimed: usize,
}

/// Drives install, activation and cache clearing for one proxy version.
pub struct Lifecycle<B, U> {
    backend: B,
    upstream: U,
    config: Arc<ProxyConfig>,
    partitions: Partitions,
    clients: Clients,
    offload: OffloadManager,
    state: watch::Sender<LifecycleState>,
}

impl<B, U> Lifecycle<B, U>
where
    B: Backend,
    U: Upstream,
{
    /// Creates a lifecycle in the [`LifecycleState::Parsed`] state.
    pub fn new(backend: B, upstream: U, config: impl Into<Arc<ProxyConfig>>) -> Self {
        let config = config.into();
        let (state, _) = watch::channel(LifecycleState::Parsed);
        Lifecycle {
            backend,
            upstream,
            partitions: Partitions::new(&config.version),
            config,
            clients: Clients::new(),
            offload: OffloadManager::new(),
            state,
        }
    }

    /// Uses an existing client registry.
    pub fn with_clients(mut self, clients: Clients) -> Self {
        self.clients = clients;
        self
    }

    /// Shares the proxy's background writes, so clearing can abort them.
    pub fn with_offload(mut self, offload: OffloadManager) -> Self {
        self.offload = offload;
        self
    }

    /// Registry of connected clients.
    pub fn clients(&self) -> &Clients {
        &self.clients
    }

    /// Current state.
    pub fn state(&self) -> LifecycleState {
        *self.state.borrow()
    }

    /// Subscribes to state changes.
    pub fn subscribe(&self) -> watch::Receiver<LifecycleState> {
        self.state.subscribe()
    }

    /// Installs then activates, without waiting in between.
    pub async fn start(&self) -> Result<ActivationReport, ProxyError> {
        self.install().await;
        self.activate().await
    }

    /// Opens the static partition and pre-populates it.
    ///
    /// Never fails: assets that cannot be fetched or stored are listed in the
    /// report and the install carries on with the rest.
    pub async fn install(&self) -> InstallReport {
        self.transition(LifecycleState::Installing);
        let partition = self.partitions.name(PartitionKind::Static);

        let report = async {
            if let Err(err) = self.backend.open(partition).await {
                warn!(error = %err, "failed to open static partition");
            }

            let results = join_all(
                self.config
                    .static_assets
                    .iter()
                    .map(|path| self.precache(partition, path)),
            )
            .await;

            let mut report = InstallReport::default();
            for (path, stored) in self.config.static_assets.iter().zip(results) {
                if stored {
                    report.cached.push(path.clone());
                } else {
                    report.failed.push(path.clone());
                }
            }
            info!(
                cached = report.cached.len(),
                failed = report.failed.len(),
                "static assets pre-populated"
            );
            report
        }
        .instrument(debug_span!("install", partition))
        .await;

        self.transition(LifecycleState::Installed);
        report
    }

    async fn precache(&self, partition: &str, path: &str) -> bool {
        let url = match self.config.resolve(path) {
            Ok(url) => url,
            Err(err) => {
                warn!(path, error = %err, "static asset path does not resolve");
                return false;
            }
        };
        let key = CacheKey::from(&url);
        let response = match self.upstream.fetch(ProxyRequest::get(url)).await {
            Ok(response) if response.is_success() => response,
            Ok(response) => {
                debug!(path, status = %response.status(), "static asset not available");
                return false;
            }
            Err(err) => {
                debug!(path, error = %err, "static asset fetch failed");
                return false;
            }
        };
        match self
            .backend
            .write(partition, &key, CacheEntry::from_response(&response))
            .await
        {
            Ok(()) => true,
            Err(err) => {
                warn!(path, error = %err, "failed to store static asset");
                false
            }
        }
    }

    /// Deletes superseded partitions and claims connected clients.
    ///
    /// Fails only if the partition list cannot be read; a partition that
    /// fails to delete is logged and left for the next activation.
    pub async fn activate(&self) -> Result<ActivationReport, ProxyError> {
        self.transition(LifecycleState::Activating);

        let existing = self.backend.partitions().await?;
        let mut report = ActivationReport::default();
        for name in self.partitions.superseded(existing) {
            match self.backend.remove_partition(&name).await {
                Ok(DeleteStatus::Deleted(entries)) => {
                    info!(partition = %name, entries, "deleted superseded partition");
                    report.deleted.push(name);
                }
                Ok(DeleteStatus::Missing) => {
                    debug!(partition = %name, "superseded partition already gone");
                }
                Err(err) => warn!(partition = %name, error = %err, "failed to delete partition"),
            }
        }
        report.claimed = self.clients.claim();

        self.transition(LifecycleState::Activated);
        Ok(report)
    }

    /// Activates a waiting install immediately.
    ///
    /// Does nothing unless the lifecycle is [`LifecycleState::Installed`].
    pub async fn skip_waiting(&self) -> Result<Option<ActivationReport>, ProxyError> {
        if self.state() != LifecycleState::Installed {
            debug!(state = ?self.state(), "skip waiting ignored");
            return Ok(None);
        }
        self.activate().await.map(Some)
    }

    /// Deletes every partition and notifies connected clients.
    ///
    /// Pending writes on the shared [`OffloadManager`] are aborted first so
    /// they cannot recreate a partition afterwards. A partition that fails to
    /// delete is logged and skipped; clients are notified regardless.
    ///
    /// Returns the number of partitions deleted. Fails only if the partition
    /// list cannot be read, after the clients have been notified.
    pub async fn clear_all(&self) -> BackendResult<usize> {
        self.offload.cancel_all();
        self.offload.wait_idle().await;

        let listed = self.backend.partitions().await;
        let mut deleted = 0;
        for name in listed.iter().flatten() {
            match self.backend.remove_partition(name).await {
                Ok(DeleteStatus::Deleted(_)) => deleted += 1,
                Ok(DeleteStatus::Missing) => {}
                Err(err) => warn!(partition = %name, error = %err, "failed to clear partition"),
            }
        }
        let notified = self.clients.notify(ClientNotification::CacheCleared);
        info!(deleted, notified, "all partitions cleared");
        listed.map(|_| deleted)
    }

    /// Executes a client command.
    pub async fn handle_message(&self, message: ClientMessage) -> Result<(), ProxyError> {
        debug!(?message, "client message");
        match message {
            ClientMessage::SkipWaiting => {
                self.skip_waiting().await?;
            }
            ClientMessage::ClearCache => {
                self.clear_all().await?;
            }
        }
        Ok(())
    }

    /// Parses a JSON client command and executes it.
    pub async fn handle_raw_message(&self, message: &str) -> Result<(), ProxyError> {
        let message = serde_json::from_str::<ClientMessage>(message)?;
        self.handle_message(message).await
    }

    /// Marks this version as replaced by a newer one.
    pub fn retire(&self) {
        self.transition(LifecycleState::Redundant);
    }

    fn transition(&self, next: LifecycleState) {
        let previous = self.state.send_replace(next);
        debug!(?previous, ?next, "lifecycle transition");
    }
}
