use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::event::PlatformEvent;

/// Default channel buffer size between the gateway handler and the guard.
const DEFAULT_BUFFER_SIZE: usize = 256;

/// The bus connecting platform adapters to the spam guard.
///
/// Adapters clone `guard_tx`; the guard takes the single receiver.
/// Built on a bounded Tokio mpsc channel.
pub struct EventBus {
    pub guard_tx: mpsc::Sender<PlatformEvent>,
    pub guard_rx: Option<mpsc::Receiver<PlatformEvent>>,
}

impl EventBus {
    /// Create a new bus with the default buffer size.
    pub fn new() -> Self {
        Self::with_buffer_size(DEFAULT_BUFFER_SIZE)
    }

    /// Create a new bus with a custom buffer size.
    pub fn with_buffer_size(buffer: usize) -> Self {
        let (guard_tx, guard_rx) = mpsc::channel(buffer);

        info!(buffer_size = buffer, "EventBus initialized");

        Self {
            guard_tx,
            guard_rx: Some(guard_rx),
        }
    }

    /// Take the guard receiver (can only be called once).
    pub fn take_guard_rx(&mut self) -> Option<mpsc::Receiver<PlatformEvent>> {
        debug!("Guard receiver taken");
        self.guard_rx.take()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}
