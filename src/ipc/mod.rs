//! IPC module for scanner bridge and UI communication

mod protocol;
mod server;

pub use protocol::{Notification, Request, Response, MAX_FRAME_LEN};
pub use server::Server;
