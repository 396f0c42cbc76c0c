//! IPC Inbound Adapter
//!
//! Unix-socket server that drives the application layer.

mod handlers;
mod server;

pub use handlers::{IpcReply, handle_line};
pub use server::{IpcServer, MAX_REQUEST_BYTES};
