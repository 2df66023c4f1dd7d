//! Polling state machine for the registration long-running operation.
//!
//! One machine instance drives at most one registration attempt at a time:
//! submit, poll until terminal, bounded retry on transient transport
//! failures, cooperative cancellation. The returned future is the single
//! pending-completion slot, so exactly one outcome is ever delivered per
//! `register` call.

use std::future::Future;
use std::sync::{Mutex, PoisonError};
use std::time::Duration;

use tether_core::registration::{DeviceRegistrationState, OperationStatus};
use tether_core::wire::{RegistrationResponse, SubmitRequest};
use tokio::sync::{broadcast, watch};
use tokio::time::timeout;

use crate::config::ProvisioningConfig;
use crate::error::ProvisioningError;
use crate::transport::{ProvisioningTransport, TransportError};

/// Capacity of the status notification channel. Slow subscribers lag rather
/// than block the poll loop.
const STATUS_CHANNEL_CAPACITY: usize = 16;

/// Lifecycle driver for one registration attempt at a time.
///
/// `Idle -> Submitting -> Polling -> terminal`, with cancellation reachable
/// from any non-terminal point. Independent machine instances share nothing
/// and may run fully in parallel.
pub struct PollingStateMachine<T> {
    transport: T,
    config: ProvisioningConfig,
    state: Mutex<MachineState>,
    status_tx: broadcast::Sender<OperationStatus>,
}

enum MachineState {
    Idle,
    /// An attempt is in flight; the sender signals cancellation to it.
    InFlight { cancel: watch::Sender<bool> },
}

/// Mutable state of the in-flight attempt.
struct Session {
    /// Cumulative transient-failure count across submit and poll.
    retries: u32,
    /// Interval for the next poll or retry backoff. Server-refreshed.
    interval: Duration,
}

/// Resets the machine to idle when the attempt future concludes or is
/// dropped, so an abandoned `register` future cannot wedge the machine.
struct IdleGuard<'a> {
    state: &'a Mutex<MachineState>,
}

impl Drop for IdleGuard<'_> {
    fn drop(&mut self) {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner) = MachineState::Idle;
    }
}

impl<T: ProvisioningTransport> PollingStateMachine<T> {
    pub fn new(transport: T, config: ProvisioningConfig) -> Self {
        let (status_tx, _) = broadcast::channel(STATUS_CHANNEL_CAPACITY);
        Self {
            transport,
            config,
            state: Mutex::new(MachineState::Idle),
            status_tx,
        }
    }

    /// Subscribe to status notifications.
    ///
    /// One notification is broadcast per successful poll response, repeats
    /// of the same non-terminal status included, in poll-completion order.
    pub fn subscribe(&self) -> broadcast::Receiver<OperationStatus> {
        self.status_tx.subscribe()
    }

    /// Run one registration attempt to its terminal outcome.
    ///
    /// # Errors
    ///
    /// Fails with [`ProvisioningError::Busy`] if an attempt is already in
    /// flight; otherwise resolves to exactly one of the terminal outcomes in
    /// [`ProvisioningError`] or the assigned registration state.
    pub async fn register(
        &self,
        request: SubmitRequest,
    ) -> Result<DeviceRegistrationState, ProvisioningError> {
        let (mut cancel_rx, _guard) = self.begin()?;
        tracing::debug!(
            registration = %request.registration_id,
            force = request.force_registration,
            "submitting registration"
        );

        let budget = self.config.attempt_timeout;
        let outcome = match timeout(budget, self.run_attempt(&request, &mut cancel_rx)).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProvisioningError::Timeout { budget }),
        };

        // Best-effort teardown once the attempt has concluded. Cancellation
        // already tore the session down on the cancel path.
        if !matches!(outcome, Err(ProvisioningError::Cancelled)) {
            if let Err(e) = self.transport.end_session().await {
                tracing::debug!(error = %e, "session teardown after attempt failed");
            }
        }

        outcome
    }

    /// Cancel the in-flight attempt, if any.
    ///
    /// The pending `register` future resolves to
    /// [`ProvisioningError::Cancelled`] at its next suspension point; the
    /// outstanding network call is aborted via the transport's session-end
    /// primitive. No-op success when idle.
    pub async fn cancel(&self) -> Result<(), ProvisioningError> {
        if !self.signal_cancel() {
            return Ok(());
        }
        tracing::debug!("cancelling in-flight registration attempt");
        if let Err(e) = self.transport.end_session().await {
            tracing::debug!(error = %e, "session teardown during cancel failed");
        }
        Ok(())
    }

    /// Tear the transport session down, independent of an in-flight attempt.
    ///
    /// Cancels an attempt if one is running, then propagates any teardown
    /// failure (unlike the best-effort cleanup after a terminal outcome).
    pub async fn end_session(&self) -> Result<(), ProvisioningError> {
        self.signal_cancel();
        self.transport
            .end_session()
            .await
            .map_err(ProvisioningError::SessionEnd)
    }

    /// Claim the machine for one attempt, or fail with a busy error.
    fn begin(&self) -> Result<(watch::Receiver<bool>, IdleGuard<'_>), ProvisioningError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if let MachineState::InFlight { .. } = *state {
            return Err(ProvisioningError::Busy);
        }
        let (cancel_tx, cancel_rx) = watch::channel(false);
        *state = MachineState::InFlight { cancel: cancel_tx };
        Ok((cancel_rx, IdleGuard { state: &self.state }))
    }

    /// Signal cancellation to the in-flight attempt. Returns false when idle.
    fn signal_cancel(&self) -> bool {
        let state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        match &*state {
            MachineState::InFlight { cancel } => {
                let _ = cancel.send(true);
                true
            }
            MachineState::Idle => false,
        }
    }

    async fn run_attempt(
        &self,
        request: &SubmitRequest,
        cancel: &mut watch::Receiver<bool>,
    ) -> Result<DeviceRegistrationState, ProvisioningError> {
        let mut session = Session {
            retries: 0,
            interval: self.config.polling_interval,
        };

        let response = self
            .call_transport(&mut session, cancel, || self.transport.submit(request))
            .await?;

        if response.status.is_terminal() {
            tracing::debug!(status = %response.status, "registration concluded on submit");
            return map_terminal(response);
        }

        session.interval = response
            .retry_after()
            .unwrap_or(self.config.polling_interval);
        // The operation handle is assigned here, once; later responses
        // cannot reissue or mutate it.
        let operation_id = response.operation_id.ok_or_else(|| {
            ProvisioningError::Malformed {
                detail: "non-terminal response without operation id".to_string(),
            }
        })?;
        tracing::debug!(
            operation = %operation_id,
            interval_ms = session.interval.as_millis() as u64,
            "registration pending, polling"
        );

        loop {
            self.wait(cancel, session.interval).await?;

            let response = self
                .call_transport(&mut session, cancel, || {
                    self.transport.query_operation_status(&operation_id)
                })
                .await?;

            // Every successful poll response is broadcast, repeats included,
            // so observers can track liveness.
            let _ = self.status_tx.send(response.status);

            if response.status.is_terminal() {
                tracing::debug!(operation = %operation_id, status = %response.status, "registration concluded");
                return map_terminal(response);
            }

            session.interval = response
                .retry_after()
                .unwrap_or(self.config.polling_interval);
            tracing::trace!(
                operation = %operation_id,
                status = %response.status,
                interval_ms = session.interval.as_millis() as u64,
                "registration still pending"
            );
        }
    }

    /// Invoke one transport primitive with bounded transient-failure retry.
    ///
    /// Cancellation is observed both while the call is outstanding and
    /// during the backoff wait.
    async fn call_transport<F, Fut>(
        &self,
        session: &mut Session,
        cancel: &mut watch::Receiver<bool>,
        mut call: F,
    ) -> Result<RegistrationResponse, ProvisioningError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<RegistrationResponse, TransportError>>,
    {
        loop {
            if *cancel.borrow() {
                return Err(ProvisioningError::Cancelled);
            }

            let attempt = call();
            tokio::pin!(attempt);
            let result = tokio::select! {
                _ = cancel.changed() => return Err(ProvisioningError::Cancelled),
                result = &mut attempt => result,
            };

            match result {
                Ok(response) => return Ok(response),
                Err(TransportError::Malformed { detail }) => {
                    return Err(ProvisioningError::Malformed { detail });
                }
                Err(err) if session.retries < self.config.retry_limit => {
                    session.retries += 1;
                    tracing::debug!(
                        retry = session.retries,
                        error = %err,
                        "transient transport failure, backing off"
                    );
                    self.wait(cancel, session.interval).await?;
                }
                Err(source) => {
                    tracing::warn!(
                        retries = session.retries,
                        error = %source,
                        "transport retry bound exhausted"
                    );
                    return Err(ProvisioningError::Transport {
                        retries: session.retries,
                        source,
                    });
                }
            }
        }
    }

    /// Cancellable timer wait.
    async fn wait(
        &self,
        cancel: &mut watch::Receiver<bool>,
        period: Duration,
    ) -> Result<(), ProvisioningError> {
        if *cancel.borrow() {
            return Err(ProvisioningError::Cancelled);
        }
        tokio::select! {
            _ = cancel.changed() => Err(ProvisioningError::Cancelled),
            () = tokio::time::sleep(period) => Ok(()),
        }
    }
}

/// Map a terminal response into the attempt outcome.
fn map_terminal(
    response: RegistrationResponse,
) -> Result<DeviceRegistrationState, ProvisioningError> {
    match response.status {
        OperationStatus::Assigned => {
            let state = response
                .registration_state
                .ok_or_else(|| ProvisioningError::Malformed {
                    detail: "assigned response without registration state".to_string(),
                })?;
            if state.device_id.is_none() || state.assigned_hub.is_none() {
                return Err(ProvisioningError::Malformed {
                    detail: "assigned response missing device or hub identifier".to_string(),
                });
            }
            Ok(state)
        }
        status @ (OperationStatus::Failed | OperationStatus::Disabled) => {
            let detail = response
                .registration_state
                .as_ref()
                .map_or_else(|| "no detail provided".to_string(), DeviceRegistrationState::error_detail);
            Err(ProvisioningError::ServiceTerminal { status, detail })
        }
        status @ (OperationStatus::Unassigned | OperationStatus::Assigning) => {
            Err(ProvisioningError::Malformed {
                detail: format!("status {status} is not terminal"),
            })
        }
    }
}
