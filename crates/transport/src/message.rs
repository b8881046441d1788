//! Transport envelope.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

/// A single record as seen by business code, independent of the broker client.
///
/// Records are read-only once received; the transport owns them for the
/// duration of one handler invocation.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Message {
    /// Routing key, also used to correlate records for the same entity.
    pub key: Vec<u8>,
    /// Encoded payload.
    pub value: Vec<u8>,
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    /// Broker timestamp, if the broker provided one.
    pub timestamp: Option<DateTime<Utc>>,
    pub headers: HashMap<String, Vec<u8>>,
}

impl Message {
    /// Creates a record for `topic` with the given key and payload.
    pub fn new(topic: impl Into<String>, key: impl Into<Vec<u8>>, value: impl Into<Vec<u8>>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
            topic: topic.into(),
            ..Self::default()
        }
    }

    /// Returns the value of a header, or `None` when absent.
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        self.headers.get(name).map(Vec::as_slice)
    }

    /// Returns the key as UTF-8 text, replacing invalid sequences.
    pub fn key_str(&self) -> std::borrow::Cow<'_, str> {
        String::from_utf8_lossy(&self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_header_is_absent() {
        let msg = Message::new("order.paid", "k", "v");
        assert_eq!(msg.header("trace-id"), None);
    }

    #[test]
    fn test_header_lookup() {
        let mut msg = Message::new("order.paid", "k", "v");
        msg.headers.insert("trace-id".to_string(), b"abc".to_vec());
        msg.headers.insert("empty".to_string(), Vec::new());

        assert_eq!(msg.header("trace-id"), Some(&b"abc"[..]));
        assert_eq!(msg.header("empty"), Some(&[][..]));
    }

    #[test]
    fn test_key_str_is_lossy() {
        let msg = Message::new("t", vec![0x66, 0x6f, 0xff], Vec::new());
        assert_eq!(msg.key_str(), "fo\u{fffd}");
    }
}
