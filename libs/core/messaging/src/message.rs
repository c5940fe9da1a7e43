/// A message received from the bus.
///
/// The payload is opaque bytes; envelope formats belong to the producer and
/// consumer, not to the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    /// Subject the message was published on.
    pub subject: String,
    /// Raw payload bytes.
    pub payload: Vec<u8>,
}

impl Message {
    pub fn new(subject: impl Into<String>, payload: impl Into<Vec<u8>>) -> Self {
        Self {
            subject: subject.into(),
            payload: payload.into(),
        }
    }
}
