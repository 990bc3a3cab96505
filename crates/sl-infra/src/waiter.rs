//! Bounded-time polling until a remote object reaches a target state.
//!
//! [`wait_for`] is generic over the probe and its state labels. The two
//! instantiations the lifecycle needs, [`wait_for_idle_transactions`] and
//! [`wait_for_public_address`], live at the bottom of this module.

use std::fmt;
use std::future::Future;
use std::time::Duration;

use softlayer_api::{Transaction, VirtualGuest};
use tokio::time::{Instant, sleep};
use tracing::debug;

use crate::types::GuestId;
use crate::{Error, VirtualGuestService};

/// Timing of one polling session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WaitConfig {
    /// Upper bound on the whole session.
    pub timeout: Duration,
    /// Pause after the first pending observation.
    pub delay: Duration,
    /// Lower bound between later probes; pauses double from here.
    pub min_poll_interval: Duration,
    /// Cap for the doubling pause.
    pub max_poll_interval: Duration,
}

impl WaitConfig {
    pub fn new(timeout: Duration, delay: Duration, min_poll_interval: Duration) -> Self {
        Self {
            timeout,
            delay,
            min_poll_interval,
            max_poll_interval: Duration::from_secs(10),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum WaitError<S, E>
where
    S: fmt::Debug + fmt::Display,
    E: fmt::Debug + fmt::Display,
{
    #[error("{0}")]
    Probe(E),

    #[error("unexpected state {state}")]
    UnexpectedState { state: S },

    #[error("timed out after {elapsed:?} (last state: {last_state})")]
    Timeout { last_state: S, elapsed: Duration },
}

/// Call `probe` until it reports `target`.
///
/// Probe errors end the wait immediately. A label that is neither `target`
/// nor in `pending` is fatal. The probe is always called at least once, and
/// once more at the deadline before giving up.
pub async fn wait_for<T, S, E, F, Fut>(
    pending: &[S],
    target: S,
    config: &WaitConfig,
    mut probe: F,
) -> Result<T, WaitError<S, E>>
where
    S: Copy + PartialEq + fmt::Debug + fmt::Display,
    E: fmt::Debug + fmt::Display,
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<(T, S), E>>,
{
    let started = Instant::now();
    // A timeout too large to represent means no deadline at all.
    let deadline = started.checked_add(config.timeout);
    let max_interval = config.max_poll_interval.max(config.min_poll_interval);
    let mut interval = config.min_poll_interval;
    let mut attempt = 0u32;

    loop {
        let (observation, state) = probe().await.map_err(WaitError::Probe)?;
        attempt = attempt.saturating_add(1);

        if state == target {
            debug!(%state, attempt, "target state reached");
            return Ok(observation);
        }
        if !pending.contains(&state) {
            return Err(WaitError::UnexpectedState { state });
        }

        let now = Instant::now();
        if deadline.is_some_and(|deadline| now >= deadline) {
            return Err(WaitError::Timeout {
                last_state: state,
                elapsed: now - started,
            });
        }

        let pause = if attempt == 1 {
            config.delay
        } else {
            let pause = interval;
            interval = interval.saturating_mul(2).min(max_interval);
            pause
        };
        debug!(%state, %target, attempt, ?pause, "still pending");
        let pause = match deadline {
            Some(deadline) => pause.min(deadline - now),
            None => pause,
        };
        sleep(pause).await;
    }
}

fn into_error<S, E>(context: String, target: S, err: WaitError<S, E>) -> Error
where
    S: fmt::Debug + fmt::Display,
    E: fmt::Debug + fmt::Display + Into<Error>,
{
    match err {
        WaitError::Probe(e) => e.into(),
        WaitError::UnexpectedState { state } => Error::UnexpectedState {
            context,
            target: target.to_string(),
            state: state.to_string(),
        },
        WaitError::Timeout {
            last_state,
            elapsed,
        } => Error::ConvergenceTimeout {
            context,
            target: target.to_string(),
            last_state: last_state.to_string(),
            elapsed,
        },
    }
}

// ── Lifecycle probes ────────────────────────────────────────────────

/// Whether the provider is still running transactions against a guest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransactionState {
    Active,
    Idle,
}

impl fmt::Display for TransactionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Active => "active",
            Self::Idle => "idle",
        })
    }
}

/// Whether a guest has been given a public address yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressState {
    Unavailable,
    Available,
}

impl fmt::Display for AddressState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Unavailable => "unavailable",
            Self::Available => "available",
        })
    }
}

/// Block until `id` has no active transactions.
pub async fn wait_for_idle_transactions(
    client: &dyn VirtualGuestService,
    id: GuestId,
    config: &WaitConfig,
    operation: &str,
) -> crate::Result<Vec<Transaction>> {
    debug!(guest_id = %id, "waiting for zero active transactions");

    wait_for(
        &[TransactionState::Active],
        TransactionState::Idle,
        config,
        || async move {
            let transactions = client
                .get_active_transactions(id)
                .await
                .map_err(Error::api(format!(
                    "{operation} virtual guest {id}: get active transactions"
                )))?;
            let state = if transactions.is_empty() {
                TransactionState::Idle
            } else {
                TransactionState::Active
            };
            Ok::<_, Error>((transactions, state))
        },
    )
    .await
    .map_err(|e| {
        into_error(
            format!("{operation} virtual guest {id}"),
            TransactionState::Idle,
            e,
        )
    })
}

/// Block until `id` reports a non-empty primary public address.
pub async fn wait_for_public_address(
    client: &dyn VirtualGuestService,
    id: GuestId,
    config: &WaitConfig,
    operation: &str,
) -> crate::Result<VirtualGuest> {
    debug!(guest_id = %id, "waiting for a public address");

    wait_for(
        &[AddressState::Unavailable],
        AddressState::Available,
        config,
        || async move {
            let guest = client
                .get_object(id)
                .await
                .map_err(Error::api(format!(
                    "{operation} virtual guest {id}: get virtual guest"
                )))?;
            let state = if guest.primary_ip_address.is_empty() {
                AddressState::Unavailable
            } else {
                AddressState::Available
            };
            Ok::<_, Error>((guest, state))
        },
    )
    .await
    .map_err(|e| {
        into_error(
            format!("{operation} virtual guest {id}"),
            AddressState::Available,
            e,
        )
    })
}
