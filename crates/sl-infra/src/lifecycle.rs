//! Create / read / update / delete workflows for a virtual guest.
//!
//! Every operation runs to completion on the caller's task: remote calls and
//! convergence waits are awaited in order, and nothing is shared between
//! two [`VirtualServer`]s except the remote API itself.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::softlayer::SoftLayerService;
use crate::translate;
use crate::types::{GuestId, InstanceSpec, ObservedState, Phase, VirtualServer};
use crate::waiter::{WaitConfig, wait_for_idle_transactions, wait_for_public_address};
use crate::{Error, Result, VirtualGuestService};

/// Timing for the two convergence waits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LifecycleTimeouts {
    pub transactions: WaitConfig,
    pub public_address: WaitConfig,
}

impl Default for LifecycleTimeouts {
    fn default() -> Self {
        let delay = Duration::from_secs(10);
        let min_poll_interval = Duration::from_secs(3);
        Self {
            transactions: WaitConfig::new(Duration::from_secs(10 * 60), delay, min_poll_interval),
            public_address: WaitConfig::new(
                Duration::from_secs(30 * 60),
                delay,
                min_poll_interval,
            ),
        }
    }
}

/// Drives virtual guests through their lifecycle against a [`VirtualGuestService`].
#[derive(Clone)]
pub struct Provisioner {
    client: Option<Arc<dyn VirtualGuestService>>,
    timeouts: LifecycleTimeouts,
}

impl Provisioner {
    pub fn new(client: Arc<dyn VirtualGuestService>) -> Self {
        Self {
            client: Some(client),
            timeouts: LifecycleTimeouts::default(),
        }
    }

    /// Build against SoftLayer using credentials from the environment.
    ///
    /// Missing credentials are not an error here; every operation on the
    /// returned provisioner fails with [`Error::ClientUnavailable`] instead.
    pub fn from_env() -> Self {
        match SoftLayerService::from_env() {
            Ok(service) => {
                info!(endpoint = %service.endpoint(), "registered SoftLayer guest service");
                Self::new(Arc::new(service))
            }
            Err(e) => {
                debug!("skipping SoftLayer guest service: {e}");
                Self {
                    client: None,
                    timeouts: LifecycleTimeouts::default(),
                }
            }
        }
    }

    pub fn with_timeouts(mut self, timeouts: LifecycleTimeouts) -> Self {
        self.timeouts = timeouts;
        self
    }

    pub fn is_configured(&self) -> bool {
        self.client.is_some()
    }

    fn client(&self, operation: &'static str) -> Result<&dyn VirtualGuestService> {
        self.client
            .as_deref()
            .ok_or(Error::ClientUnavailable { operation })
    }

    /// Order a guest, wait for it to settle, tag it and read it back.
    ///
    /// Once the provider has accepted the order, `server.id` stays set even
    /// if a later step fails: the guest exists and must be reconciled, not
    /// ordered again.
    pub async fn create(&self, server: &mut VirtualServer, spec: &InstanceSpec) -> Result<()> {
        let client = self.client("create")?;
        if let Some(id) = server.id {
            return Err(Error::AlreadyCreated(id));
        }

        let template = translate::guest_template(spec).map_err(Error::rejected("create"))?;

        server.phase = Phase::Creating;
        info!(hostname = %spec.name, domain = %spec.domain, "creating virtual guest");
        let guest = match client.create_object(&template).await {
            Ok(guest) => guest,
            Err(e) => {
                server.phase = Phase::Absent;
                return Err(Error::api("create virtual guest")(e));
            }
        };

        let id = GuestId(guest.id);
        server.id = Some(id);
        server.phase = Phase::Converging;
        info!(guest_id = %id, "virtual guest created");

        wait_for_idle_transactions(client, id, &self.timeouts.transactions, "create").await?;
        wait_for_public_address(client, id, &self.timeouts.public_address, "create").await?;

        server.phase = Phase::Tagging;
        if !spec.tags.is_empty() {
            info!(guest_id = %id, tags = ?spec.tags, "setting tags on virtual guest");
            client
                .set_tags(id, &spec.tags)
                .await
                .map_err(Error::api(format!("create virtual guest {id}: set tags")))?;
        }

        server.phase = Phase::Ready;
        self.read(server).await
    }

    /// Refresh the observed attributes and connection info.
    ///
    /// A guest the provider no longer knows is not an error: the handle is
    /// cleared and the server becomes [`Phase::Absent`].
    pub async fn read(&self, server: &mut VirtualServer) -> Result<()> {
        let client = self.client("read")?;
        let Some(id) = server.id else {
            return Ok(());
        };

        let guest = match client.get_object(id).await {
            Ok(guest) => guest,
            Err(e) if e.is_not_found() => {
                warn!(guest_id = %id, "virtual guest is gone, forgetting it");
                server.forget();
                return Ok(());
            }
            Err(e) => return Err(Error::api(format!("read virtual guest {id}"))(e)),
        };

        let observed = ObservedState::from(&guest);
        let connection = observed.connection_info();
        info!(guest_id = %id, host = %connection.host, "setting connection info");

        server.observed = Some(observed);
        server.connection = Some(connection);
        Ok(())
    }

    /// Push the mutable attributes of `spec` onto the existing guest.
    pub async fn update(&self, server: &mut VirtualServer, spec: &InstanceSpec) -> Result<()> {
        let client = self.client("update")?;
        let id = server.id.ok_or(Error::NotProvisioned {
            operation: "update",
        })?;

        let previous = server.phase;
        server.phase = Phase::Updating;
        let result = async {
            let mut guest = client
                .get_object(id)
                .await
                .map_err(Error::api(format!("update virtual guest {id}: read")))?;
            translate::apply_mutable_fields(&mut guest, spec);
            client
                .edit_object(id, &guest)
                .await
                .map_err(Error::api(format!("update virtual guest {id}")))
        }
        .await;

        match result {
            Ok(accepted) => {
                if !accepted {
                    warn!(guest_id = %id, "provider answered false to editObject");
                }
                info!(guest_id = %id, "virtual guest updated");
                server.phase = Phase::Ready;
                Ok(())
            }
            Err(e) => {
                server.phase = previous;
                Err(e)
            }
        }
    }

    /// Destroy the guest once the provider has no transactions running on it.
    pub async fn delete(&self, server: &mut VirtualServer) -> Result<()> {
        let client = self.client("delete")?;
        let Some(id) = server.id else {
            return Ok(());
        };

        let previous = server.phase;
        server.phase = Phase::Deleting;
        let result = async {
            wait_for_idle_transactions(client, id, &self.timeouts.transactions, "delete").await?;
            client
                .delete_object(id)
                .await
                .map_err(Error::api(format!("delete virtual guest {id}")))
        }
        .await;

        match result {
            Ok(accepted) => {
                if !accepted {
                    warn!(guest_id = %id, "provider answered false to deleteObject");
                }
                info!(guest_id = %id, "virtual guest deleted");
                server.forget();
                Ok(())
            }
            Err(e) => {
                server.phase = previous;
                Err(e)
            }
        }
    }
}
