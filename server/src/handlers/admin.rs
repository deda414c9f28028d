use crate::handlers::rooms::fetch_overview;
use crate::server::ServerTx;
use actix_web::web;
use actix_web::Responder;
use actix_web::Result;
use askama_actix::Template;
use system::RoomSummary;

#[derive(Template)]
#[template(path = "admin-index.html")]
pub struct AdminIndexTemplate {
    connections: usize,
    rooms: Vec<RoomSummary>,
}

pub fn configure_admin_handlers(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin").service(
            web::resource("/")
                .name("admin_index")
                .route(web::get().to(admin_index)),
        ),
    );
}

pub async fn admin_index(srv_tx: web::Data<ServerTx>) -> Result<impl Responder> {
    let overview = fetch_overview(srv_tx.get_ref()).await?;
    Ok(AdminIndexTemplate {
        connections: overview.connections,
        rooms: overview.rooms,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::connection::ConnectionCommand;
    use crate::server::spawn_server;
    use actix_web::{test, App};
    use system::RoomKey;

    #[actix_rt::test]
    async fn it_renders_rooms_escaped() {
        let mut srv_tx = spawn_server(16);
        for key in &["abc123", "<b>"] {
            let (tx, _rx) = tokio::sync::mpsc::channel(8);
            let (reply, reply_rx) = tokio::sync::oneshot::channel();
            srv_tx
                .send(
                    ConnectionCommand::Connect {
                        tx,
                        room_key: Some(RoomKey::new(*key).expect("")),
                        reply,
                    }
                    .into(),
                )
                .await
                .expect("");
            reply_rx.await.expect("");
        }

        let mut app =
            test::init_service(App::new().data(srv_tx).configure(configure_admin_handlers)).await;
        let req = test::TestRequest::get().uri("/admin/").to_request();
        let body = test::read_response(&mut app, req).await;
        let body = String::from_utf8(body.to_vec()).expect("");

        assert!(body.contains("abc123"));
        assert!(body.contains("&lt;b&gt;"));
        assert!(!body.contains("<b>"));
    }
}
