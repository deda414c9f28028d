use crate::connection::{ws_index, ws_room};
use crate::handlers::admin::configure_admin_handlers;
use crate::handlers::rooms::configure_room_handlers;
use actix_web::web;

mod admin;
mod rooms;

pub fn root(cfg: &mut web::ServiceConfig) {
    cfg.service(web::resource("/ws/").route(web::get().to(ws_index)))
        .service(web::resource("/ws/{room_key}").route(web::get().to(ws_room)));

    configure_room_handlers(cfg);
    configure_admin_handlers(cfg);
}
