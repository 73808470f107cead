//! Ports - trait interfaces between the application core and adapters.

mod notification_sink;

pub use notification_sink::NotificationSink;
