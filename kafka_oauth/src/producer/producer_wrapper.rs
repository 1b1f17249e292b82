use crate::connection_settings::ConnectionSettings;
use crate::contexts::{DeliveryTracker, MainClientContext, RefreshHandler};
use crate::error::ConnectionError;
use rdkafka::error::KafkaResult;
use rdkafka::message::{Header, OwnedHeaders};
use rdkafka::producer::{BaseProducer, BaseRecord, Producer, PurgeConfig};
use rdkafka::ClientConfig;
use std::time::Duration;
use tracing::info;

#[derive(Debug, Clone, Copy)]
pub struct OutboundMessage<'a> {
    pub topic: &'a str,
    pub key: &'a str,
    pub body: &'a str,
    pub headers: &'a [(&'a str, &'a str)],
}

/// The calls the produce loop makes into the broker client.
pub trait ProducerClient {
    fn enqueue(&self, message: &OutboundMessage<'_>) -> KafkaResult<()>;

    /// Serves delivery reports and other queued callbacks.
    fn poll(&self, timeout: Duration);

    fn flush(&self, timeout: Duration) -> KafkaResult<()>;

    fn in_flight_count(&self) -> i32;

    fn deliveries(&self) -> &DeliveryTracker;

    fn close(&self);
}

pub struct ProducerWrapper<R: RefreshHandler> {
    producer: BaseProducer<MainClientContext<R>>,
}

impl<R: RefreshHandler> ProducerWrapper<R> {
    pub fn create(
        settings: &ConnectionSettings,
        context: MainClientContext<R>,
    ) -> Result<Self, ConnectionError> {
        let producer: BaseProducer<MainClientContext<R>> = ClientConfig::from(settings)
            .create_with_context(context)
            .map_err(ConnectionError::Create)?;

        Ok(Self { producer })
    }
}

impl<R: RefreshHandler> ProducerClient for ProducerWrapper<R> {
    fn enqueue(&self, message: &OutboundMessage<'_>) -> KafkaResult<()> {
        let headers = message
            .headers
            .iter()
            .fold(OwnedHeaders::new(), |headers, &(key, value)| {
                headers.insert(Header {
                    key,
                    value: Some(value),
                })
            });

        let record = BaseRecord::to(message.topic)
            .key(message.key)
            .payload(message.body)
            .headers(headers);

        self.producer.send(record).map_err(|(e, _)| e)
    }

    fn poll(&self, timeout: Duration) {
        self.producer.poll(timeout);
    }

    fn flush(&self, timeout: Duration) -> KafkaResult<()> {
        self.producer.flush(timeout)
    }

    fn in_flight_count(&self) -> i32 {
        self.producer.in_flight_count()
    }

    fn deliveries(&self) -> &DeliveryTracker {
        self.producer.context().deliveries()
    }

    fn close(&self) {
        let outstanding = self.producer.in_flight_count();
        if outstanding > 0 {
            info!("Purging {outstanding} undelivered message(s)");
            self.producer
                .purge(PurgeConfig::default().queue().inflight());
        }
        // Serve the delivery reports produced by the purge.
        self.producer.poll(Duration::ZERO);
        info!("Producer closed");
    }
}
