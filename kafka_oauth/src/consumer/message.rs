use chrono::{DateTime, Utc};
use rdkafka::message::{BorrowedMessage, Headers};
use rdkafka::Message;
use std::collections::HashMap;
use std::time::Duration;

/// An owned copy of a consumed record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KafkaMessage {
    pub topic: String,
    pub partition: i32,
    pub offset: i64,
    pub timestamp: DateTime<Utc>,
    pub key: Option<String>,
    pub body: Option<String>,
    pub headers: HashMap<String, String>,
}

impl From<&BorrowedMessage<'_>> for KafkaMessage {
    fn from(message: &BorrowedMessage<'_>) -> Self {
        let milliseconds = message.timestamp().to_millis().unwrap_or(0).unsigned_abs();
        let timestamp = DateTime::UNIX_EPOCH + Duration::from_millis(milliseconds);

        let headers = message
            .headers()
            .map(|h| {
                h.iter()
                    .map(|header| {
                        (
                            header.key.to_owned(),
                            header.value.map_or_else(String::new, |v| {
                                String::from_utf8_lossy(v).to_string()
                            }),
                        )
                    })
                    .collect::<HashMap<_, _>>()
            })
            .unwrap_or_default();

        Self {
            topic: message.topic().to_owned(),
            partition: message.partition(),
            offset: message.offset(),
            timestamp,
            key: message
                .key()
                .map(|key| String::from_utf8_lossy(key).to_string()),
            body: message
                .payload()
                .map(|body| String::from_utf8_lossy(body).to_string()),
            headers,
        }
    }
}
