use serde::Serialize;
use system::RoomSummary;
use tokio::sync::oneshot::Sender;

#[derive(Debug)]
pub enum AdminCommand {
    ListRooms { tx: Sender<RelayOverview> },
}

#[derive(Debug, Clone, Serialize)]
pub struct RelayOverview {
    pub connections: usize,
    pub rooms: Vec<RoomSummary>,
}
