use system::{DeliveryError, EventSink, RoomEvent};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::mpsc::Sender;

/// Outbox of one websocket connection, held by the relay.
#[derive(Debug, Clone)]
pub struct ConnectionTx(Sender<RoomEvent>);

impl ConnectionTx {
    pub fn new(tx: Sender<RoomEvent>) -> Self {
        Self(tx)
    }
}

impl EventSink for ConnectionTx {
    fn try_deliver(&mut self, event: &RoomEvent) -> Result<(), DeliveryError> {
        self.0.try_send(event.clone()).map_err(|e| match e {
            TrySendError::Full(_) => DeliveryError::Full,
            TrySendError::Closed(_) => DeliveryError::Closed,
        })
    }
}
