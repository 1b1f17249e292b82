use crate::consumer::consumer_wrapper::ConsumerClient;
use crate::consumer::message::KafkaMessage;
use crate::error::StreamError;
use crate::run_state::RunState;
use rdkafka::error::KafkaError;
use std::time::Duration;
use tracing::{debug, error, info};

pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_millis(500);

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ConsumeSummary {
    pub messages: u64,
    pub partition_eofs: u64,
}

/// Polls until stopped or until the stream reports an error.
///
/// Partition EOF markers only mean the partition has no more data for now.
/// Any other error ends the loop. The client is closed exactly once either way.
pub struct ConsumeLoop<'a, C> {
    client: &'a C,
    run_state: RunState,
    poll_timeout: Duration,
}

impl<'a, C: ConsumerClient> ConsumeLoop<'a, C> {
    pub fn new(client: &'a C, run_state: RunState) -> Self {
        Self {
            client,
            run_state,
            poll_timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    pub fn with_poll_timeout(mut self, poll_timeout: Duration) -> Self {
        self.poll_timeout = poll_timeout;
        self
    }

    pub fn run<H>(self, mut handler: H) -> Result<ConsumeSummary, StreamError>
    where
        H: FnMut(&KafkaMessage),
    {
        let result = self.poll_until_stopped(&mut handler);
        self.client.close();

        result
    }

    fn poll_until_stopped<H>(&self, handler: &mut H) -> Result<ConsumeSummary, StreamError>
    where
        H: FnMut(&KafkaMessage),
    {
        let mut summary = ConsumeSummary::default();

        while self.run_state.is_running() {
            match self.client.poll(self.poll_timeout) {
                None => debug!("Waiting..."),
                Some(Err(KafkaError::PartitionEOF(partition))) => {
                    summary.partition_eofs += 1;
                    debug!("Reached end of partition {partition}, waiting for more data");
                }
                Some(Err(e)) => {
                    error!("Consumer error: {e}");
                    return Err(StreamError::Consume(e));
                }
                Some(Ok(message)) => {
                    summary.messages += 1;
                    handler(&message);
                }
            }
        }

        info!("Stop requested, leaving consume loop");

        Ok(summary)
    }
}

pub fn log_message(message: &KafkaMessage) {
    info!(
        "Consumed event from topic {}: key = {} value = {}",
        message.topic,
        message.key.as_deref().unwrap_or_default(),
        message.body.as_deref().unwrap_or_default()
    );
}
