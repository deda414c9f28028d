mod message;
mod relay;
mod traits;
mod types;

pub use message::*;
pub use relay::*;
pub use traits::*;
pub use types::*;

pub extern crate serde;
pub extern crate serde_json;
