use crate::connection_settings::ConnectionSettings;
use crate::consumer::message::KafkaMessage;
use crate::contexts::{MainClientContext, RefreshHandler};
use crate::error::ConnectionError;
use rdkafka::consumer::{BaseConsumer, CommitMode, Consumer};
use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::{debug, info, warn};

/// The calls the consume loop makes into the broker client.
pub trait ConsumerClient {
    fn poll(&self, timeout: Duration) -> Option<KafkaResult<KafkaMessage>>;

    /// Commits final offsets and leaves the consumer group.
    fn close(&self);
}

pub struct ConsumerWrapper<R: RefreshHandler> {
    consumer: BaseConsumer<MainClientContext<R>>,
}

impl<R: RefreshHandler> ConsumerWrapper<R> {
    pub fn create(
        settings: &ConnectionSettings,
        context: MainClientContext<R>,
    ) -> Result<Self, ConnectionError> {
        // https://raw.githubusercontent.com/confluentinc/librdkafka/master/CONFIGURATION.md
        let consumer: BaseConsumer<MainClientContext<R>> = ClientConfig::from(settings)
            .create_with_context(context)
            .map_err(ConnectionError::Create)?;

        consumer
            .subscribe(&[settings.topic.as_str()])
            .map_err(|error| ConnectionError::Subscribe {
                topic: settings.topic.clone(),
                error,
            })?;

        info!("Subscribed to topic {}", settings.topic);

        Ok(Self { consumer })
    }
}

impl<R: RefreshHandler> ConsumerClient for ConsumerWrapper<R> {
    fn poll(&self, timeout: Duration) -> Option<KafkaResult<KafkaMessage>> {
        self.consumer
            .poll(timeout)
            .map(|result| result.map(|message| KafkaMessage::from(&message)))
    }

    fn close(&self) {
        info!("Closing consumer");

        match self.consumer.commit_consumer_state(CommitMode::Sync) {
            Ok(()) => debug!("Committed final offsets"),
            Err(KafkaError::ConsumerCommit(RDKafkaErrorCode::NoOffset)) => {
                debug!("No offsets to commit")
            }
            Err(e) => warn!("Error while committing final offsets: {e}"),
        }

        self.consumer.unsubscribe();
    }
}
