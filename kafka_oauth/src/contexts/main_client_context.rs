use crate::contexts::delivery_tracker::DeliveryTracker;
use crate::contexts::refresh_handler::RefreshHandler;
use rdkafka::client::OAuthToken;
use rdkafka::consumer::ConsumerContext;
use rdkafka::message::DeliveryResult;
use rdkafka::producer::ProducerContext;
use rdkafka::{ClientContext, Message};
use std::error::Error;
use tracing::{error, trace};

pub struct MainClientContext<R> {
    refresh_handler: R,
    deliveries: DeliveryTracker,
}

impl<R> MainClientContext<R> {
    pub fn new(refresh_handler: R) -> Self {
        Self {
            refresh_handler,
            deliveries: DeliveryTracker::default(),
        }
    }

    pub fn deliveries(&self) -> &DeliveryTracker {
        &self.deliveries
    }
}

impl<R: RefreshHandler> ClientContext for MainClientContext<R> {
    const ENABLE_REFRESH_OAUTH_TOKEN: bool = R::ENABLED;

    fn generate_oauth_token(
        &self,
        oauthbearer_config: Option<&str>,
    ) -> Result<OAuthToken, Box<dyn Error>> {
        self.refresh_handler.generate_token(oauthbearer_config)
    }
}

impl<R: RefreshHandler> ConsumerContext for MainClientContext<R> {}

impl<R: RefreshHandler> ProducerContext for MainClientContext<R> {
    type DeliveryOpaque = ();

    fn delivery(&self, delivery_result: &DeliveryResult<'_>, _delivery_opaque: Self::DeliveryOpaque) {
        match delivery_result {
            Ok(message) => {
                trace!(
                    "Delivered message to topic {}, partition {}, offset {}",
                    message.topic(),
                    message.partition(),
                    message.offset()
                );
                self.deliveries.record_delivered();
            }
            Err((e, message)) => {
                error!(
                    "Message delivery to topic {} failed: {}",
                    message.topic(),
                    e
                );
                self.deliveries.record_failed(e.to_string());
            }
        }
    }
}
