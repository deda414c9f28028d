use clap::Parser;
use std::time::Duration;

#[derive(Debug, Clone, Parser)]
#[command(name = "relay-server", about = "Room-scoped broadcast relay for collaborative boards")]
pub struct Config {
    /// Address to listen on
    #[arg(long, env = "RELAY_BIND", default_value = "127.0.0.1:4000")]
    pub bind: String,

    /// Seconds between pings sent to each client
    #[arg(long, env = "RELAY_HEARTBEAT_INTERVAL", default_value_t = 10)]
    pub heartbeat_interval: u64,

    /// Seconds of client silence before the connection is dropped
    #[arg(long, env = "RELAY_CLIENT_TIMEOUT", default_value_t = 30)]
    pub client_timeout: u64,

    /// Events buffered per connection before new ones are dropped
    #[arg(long, env = "RELAY_OUTBOX_CAPACITY", default_value_t = 32)]
    pub outbox_capacity: usize,

    /// Commands buffered in front of the relay task
    #[arg(long, env = "RELAY_QUEUE_CAPACITY", default_value_t = 1024)]
    pub queue_capacity: usize,

    /// Only accept browser connections from this origin (any origin if unset)
    #[arg(long, env = "RELAY_ALLOWED_ORIGIN")]
    pub allowed_origin: Option<String>,
}

impl Config {
    pub fn connection_settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            heartbeat_interval: Duration::from_secs(self.heartbeat_interval),
            client_timeout: Duration::from_secs(self.client_timeout),
            outbox_capacity: self.outbox_capacity.max(1),
        }
    }
}

/// Per-connection knobs shared by every websocket actor.
#[derive(Debug, Clone, Copy)]
pub struct ConnectionSettings {
    pub heartbeat_interval: Duration,
    pub client_timeout: Duration,
    pub outbox_capacity: usize,
}

impl Default for ConnectionSettings {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_secs(10),
            client_timeout: Duration::from_secs(30),
            outbox_capacity: 32,
        }
    }
}
