use tokio::sync::mpsc::{channel, Sender};

use system::{ClientMessage, ConnectionId, Relay, RoomEvent};

use super::connection::ConnectionCommand;
use crate::admin::{AdminCommand, RelayOverview};
use crate::connection_tx::ConnectionTx;

pub type ServerTx = Sender<ServerCommand>;

#[derive(Debug)]
pub enum ServerCommand {
    Connection(ConnectionCommand),
    Admin(AdminCommand),
}

impl From<ConnectionCommand> for ServerCommand {
    fn from(command: ConnectionCommand) -> Self {
        ServerCommand::Connection(command)
    }
}

impl From<AdminCommand> for ServerCommand {
    fn from(command: AdminCommand) -> Self {
        ServerCommand::Admin(command)
    }
}

struct Server {
    relay: Relay<ConnectionTx>,
}

impl Server {
    fn new() -> Self {
        Self {
            relay: Relay::new(),
        }
    }

    fn handle_command(&mut self, command: ServerCommand) {
        match command {
            ServerCommand::Connection(command) => self.handle_connection_command(command),
            ServerCommand::Admin(command) => self.handle_admin_command(command),
        }
    }

    fn handle_connection_command(&mut self, command: ConnectionCommand) {
        match command {
            ConnectionCommand::Connect {
                tx,
                room_key,
                reply,
            } => {
                let connection_id = self.relay.connect(ConnectionTx::new(tx));
                if reply.send(connection_id).is_err() {
                    log::warn!("Connection {} went away before registration", connection_id);
                    self.relay.disconnect(&connection_id);
                    return;
                }
                if let Some(room_key) = room_key {
                    if let Err(err) = self.relay.join_room(&connection_id, room_key) {
                        log::warn!("Ignored initial join: {}", err);
                    }
                }
            }
            ConnectionCommand::Disconnect { from } => {
                self.relay.disconnect(&from);
            }
            ConnectionCommand::Message { from, message } => {
                self.handle_client_message(&from, message)
            }
        }
    }

    fn handle_client_message(&mut self, from: &ConnectionId, message: ClientMessage) {
        match message {
            ClientMessage::JoinRoom(room_key) => {
                if let Err(err) = self.relay.join_room(from, room_key) {
                    log::warn!("Ignored join: {}", err);
                }
            }
            ClientMessage::LeaveRoom => {
                self.relay.leave_room(from);
            }
            ClientMessage::Event(event) => self.dispatch(from, &event),
        }
    }

    fn dispatch(&mut self, from: &ConnectionId, event: &RoomEvent) {
        let report = self.relay.dispatch(from, event);
        for connection_id in report.closed {
            log::warn!("Reaping connection {}: outbox closed", connection_id);
            self.relay.disconnect(&connection_id);
        }
    }

    fn handle_admin_command(&mut self, command: AdminCommand) {
        match command {
            AdminCommand::ListRooms { tx } => {
                let _ = tx.send(RelayOverview {
                    connections: self.relay.connection_count(),
                    rooms: self.relay.room_summaries(),
                });
            }
        }
    }
}

pub fn spawn_server(queue_capacity: usize) -> ServerTx {
    let (srv_tx, mut srv_rx) = channel::<ServerCommand>(queue_capacity.max(1));

    tokio::spawn(async move {
        let mut server = Server::new();

        while let Some(command) = srv_rx.recv().await {
            server.handle_command(command);
        }
        log::info!("Relay task terminated");
    });

    srv_tx
}
