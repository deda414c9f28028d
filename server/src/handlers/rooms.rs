use crate::admin::{AdminCommand, RelayOverview};
use crate::server::ServerTx;
use actix_web::{error, web, HttpResponse, Responder};
use system::serde_json::json;
use system::RoomKey;

pub fn configure_room_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::resource("/rooms")
            .route(web::post().to(post))
            .route(web::get().to(get)),
    );
}

pub(crate) async fn fetch_overview(srv_tx: &ServerTx) -> Result<RelayOverview, error::Error> {
    let (tx, rx) = tokio::sync::oneshot::channel::<RelayOverview>();

    srv_tx
        .clone()
        .send(AdminCommand::ListRooms { tx }.into())
        .await
        .map_err(|_| error::ErrorInternalServerError("Internal Server Error"))?;

    rx.await
        .map_err(|_| error::ErrorInternalServerError("Receiver await error"))
}

/// Hands out a fresh room key. The room itself appears once someone joins it.
async fn post() -> Result<impl Responder, error::Error> {
    Ok(HttpResponse::Ok().json(json!({ "roomKey": RoomKey::generate() })))
}

async fn get(srv_tx: web::Data<ServerTx>) -> Result<impl Responder, error::Error> {
    let overview = fetch_overview(srv_tx.get_ref()).await?;
    Ok(HttpResponse::Ok().json(overview))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionCommand;
    use crate::server::spawn_server;
    use actix_web::{test, App};
    use system::serde_json::Value;

    #[actix_rt::test]
    async fn it_lists_active_rooms() {
        let mut srv_tx = spawn_server(16);
        let mut app =
            test::init_service(App::new().data(srv_tx.clone()).configure(configure_room_handlers))
                .await;

        let req = test::TestRequest::get().uri("/rooms").to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(body, json!({ "connections": 0, "rooms": [] }));

        let (tx, _rx) = tokio::sync::mpsc::channel(8);
        let (reply, reply_rx) = tokio::sync::oneshot::channel();
        srv_tx
            .send(
                ConnectionCommand::Connect {
                    tx,
                    room_key: Some(RoomKey::new("abc123").expect("")),
                    reply,
                }
                .into(),
            )
            .await
            .expect("");
        reply_rx.await.expect("");

        let req = test::TestRequest::get().uri("/rooms").to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(
            body,
            json!({ "connections": 1, "rooms": [{ "roomKey": "abc123", "members": 1 }] })
        );
    }

    #[actix_rt::test]
    async fn it_generates_room_keys() {
        let mut app = test::init_service(App::new().configure(configure_room_handlers)).await;
        let req = test::TestRequest::post().uri("/rooms").to_request();
        let body: Value = test::read_response_json(&mut app, req).await;
        assert_eq!(body["roomKey"].as_str().map(str::len), Some(6));
    }
}
