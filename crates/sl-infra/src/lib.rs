pub mod lifecycle;
#[cfg(test)]
pub(crate) mod mock;
pub mod softlayer;
pub mod translate;
pub mod types;
pub mod waiter;

use std::time::Duration;

use async_trait::async_trait;
use softlayer_api::{Transaction, VirtualGuest, VirtualGuestTemplate};

pub use lifecycle::{LifecycleTimeouts, Provisioner};
pub use types::{
    ConnectionInfo, GuestId, ImageType, InstanceSpec, ObservedState, Phase, VirtualServer,
};
pub use waiter::WaitConfig;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {field}: {reason}")]
    Validation { field: &'static str, reason: String },

    #[error("{context}: {source}")]
    Api {
        context: String,
        #[source]
        source: softlayer_api::Error,
    },

    #[error("{context}: timed out after {elapsed:?} waiting for {target} (last state: {last_state})")]
    ConvergenceTimeout {
        context: String,
        target: String,
        last_state: String,
        elapsed: Duration,
    },

    #[error("{context}: unexpected state {state} while waiting for {target}")]
    UnexpectedState {
        context: String,
        target: String,
        state: String,
    },

    #[error("create: virtual guest {0} already exists")]
    AlreadyCreated(GuestId),

    #[error("{operation}: virtual guest has not been created")]
    NotProvisioned { operation: &'static str },

    #[error("{operation} virtual guest: {source}")]
    Rejected {
        operation: &'static str,
        #[source]
        source: Box<Error>,
    },

    #[error("{operation} virtual guest: softlayer client is not configured")]
    ClientUnavailable { operation: &'static str },

    #[error("invalid id: {0}")]
    InvalidId(String),

    #[error("missing env var: {0}")]
    MissingEnv(String),
}

impl Error {
    /// Wrap a remote failure with the operation it interrupted.
    pub(crate) fn api(context: impl Into<String>) -> impl FnOnce(softlayer_api::Error) -> Error {
        let context = context.into();
        move |source| Error::Api { context, source }
    }

    /// Attach the lifecycle operation to an error raised before any remote call.
    pub(crate) fn rejected(operation: &'static str) -> impl FnOnce(Error) -> Error {
        move |source| Error::Rejected {
            operation,
            source: Box::new(source),
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Remote CRUD surface for virtual guests.
///
/// The orchestrator only talks to the provider through this trait, so the
/// concrete transport can be swapped for a recording double in tests.
#[async_trait]
pub trait VirtualGuestService: Send + Sync + 'static {
    async fn create_object(
        &self,
        template: &VirtualGuestTemplate,
    ) -> softlayer_api::Result<VirtualGuest>;

    /// Errors must keep the provider's 404 distinguishable
    /// (see [`softlayer_api::Error::is_not_found`]).
    async fn get_object(&self, id: GuestId) -> softlayer_api::Result<VirtualGuest>;

    async fn edit_object(&self, id: GuestId, guest: &VirtualGuest) -> softlayer_api::Result<bool>;

    async fn delete_object(&self, id: GuestId) -> softlayer_api::Result<bool>;

    async fn get_active_transactions(&self, id: GuestId)
    -> softlayer_api::Result<Vec<Transaction>>;

    async fn set_tags(&self, id: GuestId, tags: &[String]) -> softlayer_api::Result<bool>;
}
