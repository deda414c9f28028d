use std::time::Instant;

use actix::{Actor, ActorContext, ActorFuture, AsyncContext, Running, StreamHandler, WrapFuture};
use actix_web::{web, Error, HttpRequest, HttpResponse};
use actix_web_actors::ws;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::oneshot;

use system::{ClientMessage, ConnectionId, ProtocolError, RoomEvent, RoomKey};

use crate::config::ConnectionSettings;
use crate::server::{ServerCommand, ServerTx};

#[derive(Debug)]
pub enum ConnectionCommand {
    Connect {
        tx: tokio::sync::mpsc::Sender<RoomEvent>,
        room_key: Option<RoomKey>,
        reply: oneshot::Sender<ConnectionId>,
    },
    Disconnect {
        from: ConnectionId,
    },
    Message {
        from: ConnectionId,
        message: ClientMessage,
    },
}

enum ConnectionState {
    Idle,
    Connected(ConnectionId),
}

struct ConnectionActor {
    state: ConnectionState,
    srv_tx: ServerTx,
    room_key: Option<RoomKey>,
    settings: ConnectionSettings,
    heartbeat: Instant,
}

impl ConnectionActor {
    fn new(srv_tx: ServerTx, room_key: Option<RoomKey>, settings: ConnectionSettings) -> Self {
        Self {
            state: ConnectionState::Idle,
            srv_tx,
            room_key,
            settings,
            heartbeat: Instant::now(),
        }
    }

    fn register(&mut self, ctx: &mut ws::WebsocketContext<Self>) {
        let (tx, rx) = tokio::sync::mpsc::channel::<RoomEvent>(self.settings.outbox_capacity);
        let (reply, reply_rx) = oneshot::channel::<ConnectionId>();
        let command = ConnectionCommand::Connect {
            tx,
            room_key: self.room_key.take(),
            reply,
        };

        ctx.add_stream(rx);

        // Nothing from the socket is handled until the relay knows this connection.
        let mut srv_tx = self.srv_tx.clone();
        ctx.wait(
            async move {
                srv_tx
                    .send(command.into())
                    .await
                    .map_err(|_| ())?;
                reply_rx.await.map_err(|_| ())
            }
            .into_actor(self)
            .map(|result, act, ctx| match result {
                Ok(connection_id) => {
                    log::info!("Connection {} opened", connection_id);
                    act.state = ConnectionState::Connected(connection_id);
                }
                Err(()) => {
                    log::error!("Relay is not running, closing connection");
                    ctx.stop();
                }
            }),
        );
    }

    fn start_heartbeat(&self, ctx: &mut ws::WebsocketContext<Self>) {
        let client_timeout = self.settings.client_timeout;
        ctx.run_interval(self.settings.heartbeat_interval, move |act, ctx| {
            if Instant::now().duration_since(act.heartbeat) > client_timeout {
                if let ConnectionState::Connected(id) = act.state {
                    log::info!("Connection {} timed out", id);
                }
                ctx.stop();
                return;
            }
            ctx.ping(b"");
        });
    }

    fn forward(&mut self, message: ClientMessage, ctx: &mut ws::WebsocketContext<Self>) {
        let from = match self.state {
            ConnectionState::Connected(from) => from,
            ConnectionState::Idle => return,
        };
        let command = ServerCommand::from(ConnectionCommand::Message { from, message });
        match self.srv_tx.try_send(command) {
            Ok(()) => {}
            Err(TrySendError::Full(command)) => {
                // Relay is busy: hold this connection back instead of dropping its input.
                let mut srv_tx = self.srv_tx.clone();
                ctx.wait(
                    async move {
                        let _ = srv_tx.send(command).await;
                    }
                    .into_actor(self),
                );
            }
            Err(TrySendError::Closed(_)) => ctx.stop(),
        }
    }

    fn handle_frame(
        &mut self,
        decoded: Result<ClientMessage, ProtocolError>,
        ctx: &mut ws::WebsocketContext<Self>,
    ) {
        match decoded {
            Ok(message) => {
                log::debug!("Ingress {:?}", message);
                self.forward(message, ctx);
            }
            Err(err) => log::warn!("Dropped frame: {}", err),
        }
    }
}

impl Actor for ConnectionActor {
    type Context = ws::WebsocketContext<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        self.register(ctx);
        self.start_heartbeat(ctx);
    }

    fn stopping(&mut self, _: &mut Self::Context) -> Running {
        if let ConnectionState::Connected(from) = self.state {
            let mut srv_tx = self.srv_tx.clone();
            tokio::spawn(async move {
                let _ = srv_tx
                    .send(ConnectionCommand::Disconnect { from }.into())
                    .await;
            });
        }

        Running::Stop
    }
}

/// Ingress
impl StreamHandler<Result<ws::Message, ws::ProtocolError>> for ConnectionActor {
    fn handle(&mut self, msg: Result<ws::Message, ws::ProtocolError>, ctx: &mut Self::Context) {
        let msg = match msg {
            Ok(msg) => msg,
            Err(err) => {
                log::warn!("Websocket protocol error: {}", err);
                ctx.stop();
                return;
            }
        };
        self.heartbeat = Instant::now();
        match msg {
            ws::Message::Ping(msg) => ctx.pong(&msg),
            ws::Message::Pong(_) => {}
            ws::Message::Text(text) => self.handle_frame(ClientMessage::decode(&text), ctx),
            ws::Message::Binary(bin) => self.handle_frame(ClientMessage::decode_slice(&bin), ctx),
            ws::Message::Close(reason) => {
                ctx.close(reason);
                ctx.stop();
            }
            ws::Message::Continuation(_) => {
                log::warn!("Fragmented frames are not supported");
                ctx.stop();
            }
            ws::Message::Nop => {}
        }
    }
}

/// Egress
impl StreamHandler<RoomEvent> for ConnectionActor {
    fn handle(&mut self, event: RoomEvent, ctx: &mut Self::Context) {
        match event.encode() {
            Ok(text) => ctx.text(text),
            Err(err) => log::error!("Failed to encode {}: {}", event.kind.as_str(), err),
        }
    }

    fn finished(&mut self, ctx: &mut Self::Context) {
        // The relay dropped our outbox, so this connection is no longer registered.
        ctx.stop();
    }
}

fn start_connection(
    req: &HttpRequest,
    stream: web::Payload,
    srv_tx: &ServerTx,
    settings: &ConnectionSettings,
    room_key: Option<RoomKey>,
) -> Result<HttpResponse, Error> {
    ws::start(
        ConnectionActor::new(srv_tx.clone(), room_key, *settings),
        req,
        stream,
    )
}

pub async fn ws_index(
    req: HttpRequest,
    stream: web::Payload,
    srv_tx: web::Data<ServerTx>,
    settings: web::Data<ConnectionSettings>,
) -> Result<HttpResponse, Error> {
    start_connection(&req, stream, srv_tx.get_ref(), settings.get_ref(), None)
}

pub async fn ws_room(
    req: HttpRequest,
    stream: web::Payload,
    room_key: web::Path<String>,
    srv_tx: web::Data<ServerTx>,
    settings: web::Data<ConnectionSettings>,
) -> Result<HttpResponse, Error> {
    let room_key = RoomKey::new(room_key.into_inner())
        .map_err(|err| actix_web::error::ErrorBadRequest(err.to_string()))?;
    start_connection(
        &req,
        stream,
        srv_tx.get_ref(),
        settings.get_ref(),
        Some(room_key),
    )
}
