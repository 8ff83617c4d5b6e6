pub mod hub;
pub mod protocol;
pub mod registry;
pub mod ws;

pub use hub::SessionHub;
pub use protocol::{ServerMessage, UserGameCommand};
pub use registry::{ConnId, Connection, ConnectionRegistry};
