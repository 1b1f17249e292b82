use rdkafka::error::KafkaError;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("Required environment variables not set: {}", .0.join(", "))]
    MissingRequired(Vec<&'static str>),
}

#[derive(Debug, Error)]
pub enum ConnectionError {
    #[error("Failed to create kafka client")]
    Create(#[source] KafkaError),
    #[error("Failed to subscribe to topic {topic}")]
    Subscribe {
        topic: String,
        #[source]
        error: KafkaError,
    },
}

#[derive(Debug, Error)]
pub enum FetchError {
    /// The HTTP round trip did not complete.
    #[error("Token request to {endpoint} failed")]
    Transport {
        endpoint: String,
        #[source]
        error: reqwest::Error,
    },
    /// The response arrived, possibly with an error status, but carried no usable access token.
    #[error("Failed to parse token response: {0}")]
    Parse(String),
}

#[derive(Debug, Error)]
pub enum DeliveryError {
    #[error("Failed to produce to topic {topic}")]
    Enqueue {
        topic: String,
        #[source]
        error: KafkaError,
    },
    #[error("Message delivery failed: {0}")]
    Rejected(String),
    #[error("{0} message(s) were not delivered")]
    Undelivered(i32),
}

#[derive(Debug, Error)]
pub enum StreamError {
    #[error("Consumer error")]
    Consume(#[source] KafkaError),
}
