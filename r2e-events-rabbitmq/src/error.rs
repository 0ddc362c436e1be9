use std::fmt;

/// Errors raised by [`crate::RabbitMqBus`].
#[derive(Debug)]
pub enum TaskBusError {
    /// The underlying AMQP connection/channel/operation failed.
    Amqp(lapin::Error),
    /// The task payload could not be serialized or deserialized.
    Encode(serde_json::Error),
}

impl fmt::Display for TaskBusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Amqp(e) => write!(f, "amqp error: {e}"),
            Self::Encode(e) => write!(f, "task payload encoding error: {e}"),
        }
    }
}

impl std::error::Error for TaskBusError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Amqp(e) => Some(e),
            Self::Encode(e) => Some(e),
        }
    }
}
