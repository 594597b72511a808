//! Kafka request/response service shell (part of C8).
//!
//! One process invocation handles at most one message: poll the input
//! topic with a fixed timeout, validate, produce a response keyed by
//! the same `uuid`, flush, and return. There is no persistent consumer
//! loop inside this crate; running it repeatedly is the caller's job
//! (a supervisor, a cron, a long-lived wrapper script).

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eth_node::HttpEthNode;
use rdkafka::consumer::{Consumer, StreamConsumer};
use rdkafka::producer::{FutureProducer, FutureRecord};
use rdkafka::{ClientConfig, Message};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument, warn};

use crate::config::KafkaSettings;
use crate::descriptor::AssetDescriptor;
use crate::error::{AppError, InfraError};
use crate::scanner::ScanConstants;
use crate::validators::gas_profile::{GasProfileValidator, GasValidatorFacade};

/// One request read from the input topic: the node to validate
/// against plus the descriptor itself, flattened into the same JSON
/// object.
#[derive(Debug, Clone, Deserialize)]
pub struct KafkaRequest {
    /// Ethereum JSON-RPC URL to validate `descriptor` against.
    pub node: String,
    /// Correlates this request with its response.
    pub uuid: String,
    /// The descriptor to validate.
    #[serde(flatten)]
    pub descriptor: AssetDescriptor,
}

/// The response produced on the output topic for one [`KafkaRequest`].
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct KafkaResponse {
    /// Echoes the request's `uuid`.
    pub uuid: String,
    /// Whether the descriptor's gas profile passed.
    pub result: bool,
    /// Empty on success; otherwise a human-readable failure reason.
    pub message: String,
}

/// Abstracts the Kafka I/O so [`KafkaLoop::run`] can be exercised
/// against a mocked transport in tests without a real broker.
#[async_trait]
pub trait KafkaTransport: Send + Sync {
    /// Poll for the next request, waiting at most `timeout`.
    async fn recv_request(&self, timeout: Duration) -> Result<Option<KafkaRequest>, AppError>;

    /// Produce `response` and flush before returning.
    async fn send_response(&self, response: &KafkaResponse) -> Result<(), AppError>;
}

/// `rdkafka`-backed [`KafkaTransport`] against `input_topic`/`output_topic`.
pub struct RdKafkaTransport {
    consumer: StreamConsumer,
    producer: FutureProducer,
    output_topic: String,
}

impl RdKafkaTransport {
    /// Build a transport from [`KafkaSettings`], subscribing the
    /// consumer to `input_topic` under `group_id` with
    /// `auto.offset.reset=earliest`.
    ///
    /// # Errors
    /// Returns an error if the consumer or producer cannot be built, or
    /// if the subscription fails.
    pub fn new(settings: &KafkaSettings) -> Result<Self, AppError> {
        let consumer: StreamConsumer = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .set("group.id", &settings.group_id)
            .set("auto.offset.reset", "earliest")
            .set("enable.auto.commit", "true")
            .create()
            .map_err(|e| InfraError::Kafka(Box::new(e)))?;

        consumer
            .subscribe(&[settings.input_topic.as_str()])
            .map_err(|e| InfraError::Kafka(Box::new(e)))?;

        let producer: FutureProducer = ClientConfig::new()
            .set("bootstrap.servers", &settings.brokers)
            .create()
            .map_err(|e| InfraError::Kafka(Box::new(e)))?;

        Ok(Self {
            consumer,
            producer,
            output_topic: settings.output_topic.clone(),
        })
    }
}

#[async_trait]
impl KafkaTransport for RdKafkaTransport {
    async fn recv_request(&self, timeout: Duration) -> Result<Option<KafkaRequest>, AppError> {
        match tokio::time::timeout(timeout, self.consumer.recv()).await {
            Ok(Ok(message)) => {
                let payload = message
                    .payload()
                    .ok_or_else(|| InfraError::DescriptorFile("empty Kafka message payload".into()))?;
                let request: KafkaRequest =
                    serde_json::from_slice(payload).map_err(InfraError::Serialization)?;
                Ok(Some(request))
            }
            Ok(Err(err)) => Err(AppError::Infra(InfraError::Kafka(Box::new(err)))),
            Err(_elapsed) => Ok(None),
        }
    }

    async fn send_response(&self, response: &KafkaResponse) -> Result<(), AppError> {
        let payload = serde_json::to_vec(response).map_err(InfraError::Serialization)?;
        let record = FutureRecord::to(&self.output_topic)
            .key(&response.uuid)
            .payload(&payload);

        self.producer
            .send(record, Duration::from_secs(5))
            .await
            .map_err(|(err, _)| InfraError::Kafka(Box::new(err)))?;

        Ok(())
    }
}

/// Drives exactly one request/response cycle per [`KafkaLoop::run`]
/// call, per §6 "One message per invocation".
pub struct KafkaLoop {
    scan_constants: ScanConstants,
    receipt_concurrency: usize,
    hard_fork_block: u64,
    digest_delta: f64,
}

impl KafkaLoop {
    /// Build a loop against the gas-profile validator tuning this
    /// process was configured with.
    #[must_use]
    pub fn new(
        scan_constants: ScanConstants,
        receipt_concurrency: usize,
        hard_fork_block: u64,
        digest_delta: f64,
    ) -> Self {
        Self {
            scan_constants,
            receipt_concurrency,
            hard_fork_block,
            digest_delta,
        }
    }

    /// Poll `transport` once (waiting at most `poll_timeout`); if a
    /// request arrives, validate it and produce the response before
    /// returning. A node connection failure is reported as a failed
    /// validation result, not a run-fatal error.
    ///
    /// # Errors
    /// Propagates transport-level errors (malformed payload, broker
    /// I/O failure producing the response).
    #[instrument(skip(self, transport))]
    pub async fn run(&self, transport: &impl KafkaTransport, poll_timeout: Duration) -> Result<(), AppError> {
        let Some(request) = transport.recv_request(poll_timeout).await? else {
            info!("no message received within poll timeout, closing");
            return Ok(());
        };

        let response = self.process_request(&request).await;
        transport.send_response(&response).await?;
        Ok(())
    }

    /// Validate one request's descriptor via the [`GasValidatorFacade`]
    /// (§9 Open Question: the Kafka shell is wired against this façade,
    /// not the full `isValidContract` orchestrator).
    async fn process_request(&self, request: &KafkaRequest) -> KafkaResponse {
        let node = match HttpEthNode::new(&request.node).await {
            Ok(node) => Arc::new(node),
            Err(err) => {
                warn!(uuid = %request.uuid, error = %err, "failed to connect to node");
                return KafkaResponse {
                    uuid: request.uuid.clone(),
                    result: false,
                    message: err.to_string(),
                };
            }
        };

        let facade = GasValidatorFacade::new(GasProfileValidator::new(
            node,
            self.scan_constants,
            self.receipt_concurrency,
            self.hard_fork_block,
            self.digest_delta,
        ));

        let (result, message) = facade.validate(&request.descriptor).await;
        KafkaResponse {
            uuid: request.uuid.clone(),
            result,
            message,
        }
    }
}
