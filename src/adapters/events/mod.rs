//! Event fan-out adapters implementing the notification sink port.

mod broadcast;

pub use broadcast::BroadcastSink;
