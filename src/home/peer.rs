//! Simulierter Remote-Peer
//!
//! Es gibt keine echte Verbindung: `connect()` setzt nach einer festen
//! Verzögerung einen Platzhalter-Stream. Der ausstehende Timer wird als
//! Handle gehalten und bei `disconnect()` oder Drop abgebrochen. Zusätzlich
//! schützt ein Generationszähler vor einem Timer, der bereits abgelaufen,
//! aber noch nicht angewendet ist.

use super::HomeEvent;
use parking_lot::Mutex;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Platzhalter für den Remote-Stream
pub const REMOTE_STREAM_PLACEHOLDER: &str = "remoteVideoStreamUrl";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "camelCase")]
pub enum PeerState {
    Idle,
    Searching,
    Connected { remote: String },
}

#[derive(Debug)]
struct PeerInner {
    state: PeerState,
    generation: u64,
}

pub struct SimulatedPeer {
    inner: Arc<Mutex<PeerInner>>,
    pending: Mutex<Option<JoinHandle<()>>>,
    delay: Duration,
    event_tx: broadcast::Sender<HomeEvent>,
}

impl SimulatedPeer {
    pub fn new(delay: Duration, event_tx: broadcast::Sender<HomeEvent>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(PeerInner {
                state: PeerState::Idle,
                generation: 0,
            })),
            pending: Mutex::new(None),
            delay,
            event_tx,
        }
    }

    pub fn state(&self) -> PeerState {
        self.inner.lock().state.clone()
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.inner.lock().state, PeerState::Connected { .. })
    }

    /// Plant die Verbindung. Ein bereits verbundener Peer bleibt bis zum
    /// Eintreffen des nächsten verbunden.
    pub fn connect(&self) {
        tracing::info!("Connecting to another user...");

        let generation = {
            let mut inner = self.inner.lock();
            inner.generation += 1;
            if inner.state == PeerState::Idle {
                inner.state = PeerState::Searching;
            }
            inner.generation
        };

        let inner = Arc::clone(&self.inner);
        let event_tx = self.event_tx.clone();
        let delay = self.delay;

        let task = tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            {
                let mut inner = inner.lock();
                if inner.generation != generation {
                    return;
                }
                inner.state = PeerState::Connected {
                    remote: REMOTE_STREAM_PLACEHOLDER.to_string(),
                };
            }

            tracing::info!("Remote user connected");
            let _ = event_tx.send(HomeEvent::PeerConnected {
                remote: REMOTE_STREAM_PLACEHOLDER.to_string(),
            });
        });

        if let Some(previous) = self.pending.lock().replace(task) {
            previous.abort();
        }
    }

    /// Bricht einen ausstehenden Verbindungsaufbau ab und trennt sofort
    pub fn disconnect(&self) {
        tracing::info!("Disconnecting...");
        self.cancel();
        let _ = self.event_tx.send(HomeEvent::PeerDisconnected);
    }

    /// Wie `disconnect()`, aber ohne Event (Teardown)
    pub fn cancel(&self) {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
        let mut inner = self.inner.lock();
        inner.generation += 1;
        inner.state = PeerState::Idle;
    }
}

impl Drop for SimulatedPeer {
    fn drop(&mut self) {
        if let Some(task) = self.pending.lock().take() {
            task.abort();
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
