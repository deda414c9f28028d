use crate::RoomEvent;
use std::sync::mpsc::{SyncSender, TrySendError};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DeliveryError {
    #[error("recipient is not keeping up")]
    Full,
    #[error("recipient is gone")]
    Closed,
}

/// Outbound half of a connection, as seen by the relay.
///
/// `try_deliver` must never block: a recipient that cannot take the event right
/// now loses it.
pub trait EventSink {
    fn try_deliver(&mut self, event: &RoomEvent) -> Result<(), DeliveryError>;
}

impl EventSink for SyncSender<RoomEvent> {
    fn try_deliver(&mut self, event: &RoomEvent) -> Result<(), DeliveryError> {
        self.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Disconnected(_) => DeliveryError::Closed,
        })
    }
}
