//! Adapters - boundary implementations around the application core.

pub mod events;
pub mod http;
pub mod websocket;
