use crate::error::DeliveryError;
use crate::producer::producer_wrapper::{OutboundMessage, ProducerClient};
use crate::producer::sample_records::{sample_record, SOURCE_HEADER};
use crate::run_state::RunState;
use std::time::Duration;
use tracing::{debug, error, info, warn};

pub const DEFAULT_MESSAGE_COUNT: usize = 10;
pub const DEFAULT_FLUSH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum LoopState {
    Running,
    Draining,
    Stopped,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ProduceSummary {
    pub enqueued: u64,
    pub delivered: u64,
}

/// Enqueues a fixed number of messages, then flushes and checks that nothing is left.
///
/// Enqueue errors, failed delivery reports and messages still in flight after the
/// flush all end the loop with an error. The client is closed exactly once.
pub struct ProduceLoop<'a, P> {
    client: &'a P,
    run_state: RunState,
    topic: &'a str,
    message_count: usize,
    flush_timeout: Duration,
    state: LoopState,
}

impl<'a, P: ProducerClient> ProduceLoop<'a, P> {
    pub fn new(client: &'a P, run_state: RunState, topic: &'a str) -> Self {
        Self {
            client,
            run_state,
            topic,
            message_count: DEFAULT_MESSAGE_COUNT,
            flush_timeout: DEFAULT_FLUSH_TIMEOUT,
            state: LoopState::Running,
        }
    }

    pub fn with_message_count(mut self, message_count: usize) -> Self {
        self.message_count = message_count;
        self
    }

    pub fn with_flush_timeout(mut self, flush_timeout: Duration) -> Self {
        self.flush_timeout = flush_timeout;
        self
    }

    pub fn run(mut self) -> Result<ProduceSummary, DeliveryError> {
        let result = self.produce_and_drain();
        self.client.close();
        self.transition(LoopState::Stopped);

        result
    }

    fn produce_and_drain(&mut self) -> Result<ProduceSummary, DeliveryError> {
        let mut summary = ProduceSummary::default();

        for index in 0..self.message_count {
            if !self.run_state.is_running() {
                info!("Stop requested after {} message(s)", summary.enqueued);
                break;
            }

            let (key, body) = sample_record(index);
            let message = OutboundMessage {
                topic: self.topic,
                key,
                body,
                headers: &[SOURCE_HEADER],
            };

            if let Err(e) = self.client.enqueue(&message) {
                error!("Failed to produce to topic {}: {}", self.topic, e);
                return Err(DeliveryError::Enqueue {
                    topic: self.topic.to_owned(),
                    error: e,
                });
            }
            summary.enqueued += 1;
            info!(
                "Produced event to topic {}: key = {:>12} value = {:>12}",
                self.topic, key, body
            );

            self.client.poll(Duration::ZERO);
            self.check_deliveries()?;
        }

        self.transition(LoopState::Draining);
        info!("Flushing final messages..");
        let flush_result = self.client.flush(self.flush_timeout);
        self.check_deliveries()?;

        let outstanding = self.client.in_flight_count();
        if outstanding > 0 {
            error!("{outstanding} message(s) were not delivered");
            return Err(DeliveryError::Undelivered(outstanding));
        }
        if let Err(e) = flush_result {
            warn!("Flush reported an error with no messages outstanding: {e}");
        }

        summary.delivered = self.client.deliveries().delivered();
        info!(
            "{} events were produced to topic {}.",
            summary.enqueued, self.topic
        );

        Ok(summary)
    }

    fn check_deliveries(&self) -> Result<(), DeliveryError> {
        match self.client.deliveries().first_failure() {
            Some(reason) => Err(DeliveryError::Rejected(reason.to_owned())),
            None => Ok(()),
        }
    }

    fn transition(&mut self, state: LoopState) {
        debug!("Producer loop {:?} -> {:?}", self.state, state);
        self.state = state;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contexts::DeliveryTracker;
    use rdkafka::error::{KafkaError, KafkaResult, RDKafkaErrorCode};
    use std::cell::{Cell, RefCell};

    /// Delivers (or rejects) everything enqueued on the next poll or flush.
    #[derive(Default)]
    struct FakeProducer {
        enqueued: RefCell<Vec<(String, String, String)>>,
        pending: Cell<i32>,
        polls: Cell<usize>,
        closes: Cell<usize>,
        deliveries: DeliveryTracker,
        reject_deliveries: bool,
        fail_enqueue_at: Option<usize>,
        stuck_on_flush: bool,
    }

    impl FakeProducer {
        fn serve_reports(&self) {
            if self.stuck_on_flush {
                return;
            }
            for _ in 0..self.pending.replace(0) {
                if self.reject_deliveries {
                    self.deliveries
                        .record_failed("Broker: Topic authorization failed".to_owned());
                } else {
                    self.deliveries.record_delivered();
                }
            }
        }
    }

    impl ProducerClient for FakeProducer {
        fn enqueue(&self, message: &OutboundMessage<'_>) -> KafkaResult<()> {
            if self.fail_enqueue_at == Some(self.enqueued.borrow().len()) {
                return Err(KafkaError::MessageProduction(RDKafkaErrorCode::QueueFull));
            }
            assert_eq!(message.headers, &[SOURCE_HEADER]);
            self.enqueued.borrow_mut().push((
                message.topic.to_owned(),
                message.key.to_owned(),
                message.body.to_owned(),
            ));
            self.pending.set(self.pending.get() + 1);
            Ok(())
        }

        fn poll(&self, _timeout: Duration) {
            self.polls.set(self.polls.get() + 1);
            if !self.stuck_on_flush {
                self.serve_reports();
            }
        }

        fn flush(&self, _timeout: Duration) -> KafkaResult<()> {
            self.serve_reports();
            if self.pending.get() > 0 {
                return Err(KafkaError::Flush(RDKafkaErrorCode::OperationTimedOut));
            }
            Ok(())
        }

        fn in_flight_count(&self) -> i32 {
            self.pending.get()
        }

        fn deliveries(&self) -> &DeliveryTracker {
            &self.deliveries
        }

        fn close(&self) {
            self.closes.set(self.closes.get() + 1);
        }
    }

    #[test]
    fn ten_delivered_messages_succeed() {
        let producer = FakeProducer::default();

        let summary = ProduceLoop::new(&producer, RunState::new(), "hub1")
            .with_message_count(10)
            .run()
            .unwrap();

        assert_eq!(
            summary,
            ProduceSummary {
                enqueued: 10,
                delivered: 10
            }
        );
        assert_eq!(producer.in_flight_count(), 0);
        assert_eq!(producer.polls.get(), 10);
        assert_eq!(producer.closes.get(), 1);
        assert!(producer
            .enqueued
            .borrow()
            .iter()
            .all(|(topic, _, _)| topic == "hub1"));
    }

    #[test]
    fn enqueue_failure_stops_immediately() {
        let producer = FakeProducer {
            fail_enqueue_at: Some(3),
            ..FakeProducer::default()
        };

        let result = ProduceLoop::new(&producer, RunState::new(), "hub1").run();

        assert!(matches!(result, Err(DeliveryError::Enqueue { .. })));
        assert_eq!(producer.enqueued.borrow().len(), 3);
        assert_eq!(producer.closes.get(), 1);
    }

    #[test]
    fn rejected_delivery_is_fatal() {
        let producer = FakeProducer {
            reject_deliveries: true,
            ..FakeProducer::default()
        };

        let result = ProduceLoop::new(&producer, RunState::new(), "hub1").run();

        match result {
            Err(DeliveryError::Rejected(reason)) => {
                assert_eq!(reason, "Broker: Topic authorization failed")
            }
            other => panic!("unexpected result {other:?}"),
        }
        assert_eq!(producer.enqueued.borrow().len(), 1);
        assert_eq!(producer.closes.get(), 1);
    }

    #[test]
    fn outstanding_messages_after_flush_are_reported() {
        let producer = FakeProducer {
            stuck_on_flush: true,
            ..FakeProducer::default()
        };

        let result = ProduceLoop::new(&producer, RunState::new(), "hub1")
            .with_message_count(4)
            .run();

        assert!(matches!(result, Err(DeliveryError::Undelivered(4))));
        assert_eq!(producer.closes.get(), 1);
    }

    #[test]
    fn stop_request_skips_remaining_messages() {
        let producer = FakeProducer::default();
        let run_state = RunState::new();
        run_state.stop();

        let summary = ProduceLoop::new(&producer, run_state, "hub1").run().unwrap();

        assert_eq!(summary, ProduceSummary::default());
        assert_eq!(producer.closes.get(), 1);
    }
}
