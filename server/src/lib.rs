pub extern crate actix_web;

mod admin;
pub mod config;
pub mod connection;
mod connection_tx;
pub mod handlers;
pub mod server;
