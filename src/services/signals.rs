//! Signal channel of the provider application.
//!
//! Signals are broadcast at most once to the subscriptions that exist when
//! they are emitted. There is no backlog: a subscription created after an
//! emission never observes it.
//!
//! A caller waiting for a signal that never arrives only sees
//! [`SignalWaitError::Timeout`]. It cannot tell a request still in flight from
//! one dropped before forwarding or one sent to an unreachable provider.

use std::time::Duration;

use thiserror::Error;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::models::DispatchSignal;

/// Default buffer capacity for the broadcast channel.
pub const DEFAULT_SIGNAL_CAPACITY: usize = 256;

/// Why waiting for a signal ended without one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SignalWaitError {
    #[error("No matching signal within {0:?}")]
    Timeout(Duration),

    #[error("Signal channel closed")]
    Closed,
}

/// Publish side of the signal channel.
#[derive(Clone)]
pub struct SignalHub {
    sender: broadcast::Sender<DispatchSignal>,
}

impl SignalHub {
    pub fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity.max(1));
        Self { sender }
    }

    /// Broadcasts to current subscriptions and returns how many received it.
    pub fn emit(&self, signal: DispatchSignal) -> usize {
        match self.sender.send(signal) {
            Ok(receivers) => receivers,
            Err(_) => {
                tracing::debug!("Signal emitted with no live subscriptions");
                0
            }
        }
    }

    /// Opens a subscription that sees every signal emitted from now on.
    pub fn subscribe(&self) -> SignalSubscription {
        SignalSubscription {
            receiver: self.sender.subscribe(),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for SignalHub {
    fn default() -> Self {
        Self::new(DEFAULT_SIGNAL_CAPACITY)
    }
}

/// One connection's subscription to the signal channel.
///
/// Released when dropped or passed to [`SignalSubscription::unsubscribe`].
pub struct SignalSubscription {
    receiver: broadcast::Receiver<DispatchSignal>,
}

impl SignalSubscription {
    /// Next signal, skipping over any lost to buffer overflow.
    pub async fn recv(&mut self) -> Result<DispatchSignal, SignalWaitError> {
        loop {
            match self.receiver.recv().await {
                Ok(signal) => return Ok(signal),
                Err(RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Signal subscription lagged, signals dropped");
                }
                Err(RecvError::Closed) => return Err(SignalWaitError::Closed),
            }
        }
    }

    pub async fn recv_timeout(&mut self, timeout: Duration) -> Result<DispatchSignal, SignalWaitError> {
        tokio::time::timeout(timeout, self.recv())
            .await
            .map_err(|_| SignalWaitError::Timeout(timeout))?
    }

    /// Waits for the first signal matching `predicate`, discarding others.
    pub async fn wait_for<F>(
        &mut self,
        timeout: Duration,
        mut predicate: F,
    ) -> Result<DispatchSignal, SignalWaitError>
    where
        F: FnMut(&DispatchSignal) -> bool,
    {
        let wait = async {
            loop {
                match self.recv().await {
                    Ok(signal) if predicate(&signal) => return Ok(signal),
                    Ok(_) => continue,
                    Err(e) => return Err(e),
                }
            }
        };
        tokio::time::timeout(timeout, wait)
            .await
            .map_err(|_| SignalWaitError::Timeout(timeout))?
    }

    pub fn unsubscribe(self) {}
}
