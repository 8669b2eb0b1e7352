use std::time::Duration;

use async_trait::async_trait;
use rdkafka::config::ClientConfig;
use rdkafka::error::KafkaError;
use rdkafka::producer::FutureProducer;
use rdkafka::producer::FutureRecord;
use rdkafka::util::Timeout;
use thiserror::Error;

use crate::account::errors::EventPublisherError;
use crate::account::events::AccountEvent;
use crate::account::events::AccountRegisteredEvent;
use crate::account::events::AccountUpdatedEvent;
use crate::account::events::PasswordResetRequestedEvent;
use crate::account::ports::EventPublisher;
use crate::config::KafkaConfig;
use crate::outbound::events::messages::AccountEventMessage;

/// Upper bound on local delivery, retries included.
const DELIVERY_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum KafkaProducerError {
    #[error("Failed to create Kafka producer: {0}")]
    Client(#[from] KafkaError),

    #[error("Failed to deliver account event: {0}")]
    Delivery(String),

    #[error("Failed to serialize account event: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl From<KafkaProducerError> for EventPublisherError {
    fn from(err: KafkaProducerError) -> Self {
        match err {
            KafkaProducerError::Serialization(e) => {
                EventPublisherError::SerializationFailed(e.to_string())
            }
            KafkaProducerError::Client(_) | KafkaProducerError::Delivery(_) => {
                EventPublisherError::PublishFailed(err.to_string())
            }
        }
    }
}

/// Publishes account events as JSON to a single topic.
pub struct KafkaEventProducer {
    producer: FutureProducer,
    topic: String,
}

impl KafkaEventProducer {
    /// Idempotent producer acknowledged by all in-sync replicas.
    pub fn new(config: &KafkaConfig) -> Result<Self, KafkaProducerError> {
        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &config.brokers)
            .set("client.id", "identity-service")
            .set("message.timeout.ms", DELIVERY_TIMEOUT.as_millis().to_string())
            .set("enable.idempotence", "true")
            .set("acks", "all")
            .set("retries", "10")
            .set("retry.backoff.ms", "100")
            .set("compression.type", "lz4")
            .create()?;

        tracing::info!(
            brokers = %config.brokers,
            topic = %config.topic,
            "Kafka producer for account events created"
        );

        Ok(Self {
            producer,
            topic: config.topic.clone(),
        })
    }

    /// Keyed by account ID so that one account's events stay ordered within a
    /// partition.
    async fn publish(&self, event: AccountEvent) -> Result<(), KafkaProducerError> {
        let payload = serde_json::to_vec(&AccountEventMessage::from(&event))?;
        let record = FutureRecord::to(&self.topic)
            .key(event.account_id())
            .payload(&payload);

        match self
            .producer
            .send(record, Timeout::After(DELIVERY_TIMEOUT))
            .await
        {
            Ok((partition, offset)) => {
                tracing::debug!(
                    event_id = event.event_id(),
                    event_type = event.event_type(),
                    account_id = event.account_id(),
                    topic = %self.topic,
                    partition,
                    offset,
                    "Account event delivered"
                );
                Ok(())
            }
            Err((e, _)) => {
                tracing::error!(
                    event_id = event.event_id(),
                    event_type = event.event_type(),
                    topic = %self.topic,
                    error = %e,
                    "Account event not delivered"
                );
                Err(KafkaProducerError::Delivery(e.to_string()))
            }
        }
    }
}

#[async_trait]
impl EventPublisher for KafkaEventProducer {
    async fn publish_account_registered(
        &self,
        event: &AccountRegisteredEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(AccountEvent::AccountRegistered(event.clone()))
            .await
            .map_err(Into::into)
    }

    async fn publish_account_updated(
        &self,
        event: &AccountUpdatedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(AccountEvent::AccountUpdated(event.clone()))
            .await
            .map_err(Into::into)
    }

    async fn publish_password_reset_requested(
        &self,
        event: &PasswordResetRequestedEvent,
    ) -> Result<(), EventPublisherError> {
        self.publish(AccountEvent::PasswordResetRequested(event.clone()))
            .await
            .map_err(Into::into)
    }
}
