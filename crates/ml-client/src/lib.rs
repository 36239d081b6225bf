//! Client for the pretrained latent-factor rating model.
//!
//! The model runs as a separate gRPC service. This crate provides:
//! - The [`RatingModel`] capability the predictor depends on
//! - [`ModelClient`], the tonic binding of that capability
//! - Validation of the service response (one score per requested item)

use std::time::Duration;

use thiserror::Error;
use tonic::transport::{Channel, Endpoint};
use tracing::{debug, error, info};

// Include the generated protobuf code
pub mod ratings {
    tonic::include_proto!("ratings");
}

use ratings::{latent_factor_model_client::LatentFactorModelClient, PredictRequest};

/// Errors that can occur when interacting with the model service
#[derive(Error, Debug, Clone, PartialEq)]
pub enum MLClientError {
    #[error("Failed to connect to model service: {0}")]
    ConnectionError(String),

    #[error("Failed to score candidates: {0}")]
    ScoringError(String),

    #[error("Invalid response from model service: {0}")]
    InvalidResponse(String),
}

/// Predicts ratings for one user over a batch of items.
///
/// Implementations return exactly one score per entry of `item_indices`,
/// in the same order.
#[tonic::async_trait]
pub trait RatingModel: Send + Sync {
    async fn predict(
        &self,
        user_index: u32,
        item_indices: Vec<u32>,
    ) -> Result<Vec<f32>, MLClientError>;
}

/// gRPC client for the rating model service.
///
/// Cloning is cheap; clones share the underlying channel.
#[derive(Clone)]
pub struct ModelClient {
    client: LatentFactorModelClient<Channel>,
    service_addr: String,
}

impl ModelClient {
    /// Connect to the model service, failing if it is not reachable.
    ///
    /// `timeout` bounds both the connection attempt and every request.
    pub async fn connect(
        addr: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MLClientError> {
        let addr = addr.into();
        info!("Connecting to model service at {}", addr);

        let channel = endpoint(&addr, timeout)?
            .connect()
            .await
            .map_err(|e| MLClientError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client: LatentFactorModelClient::new(channel),
            service_addr: addr,
        })
    }

    /// Build a client that connects on first use.
    ///
    /// Lets the HTTP service start while the model service is still coming
    /// up; the similarity and embedding flows never need it.
    pub fn connect_lazy(
        addr: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, MLClientError> {
        let addr = addr.into();
        let channel = endpoint(&addr, timeout)?.connect_lazy();
        Ok(Self {
            client: LatentFactorModelClient::new(channel),
            service_addr: addr,
        })
    }

    /// Get the address of the model service this client talks to.
    pub fn service_address(&self) -> &str {
        &self.service_addr
    }
}

fn endpoint(addr: &str, timeout: Duration) -> Result<Endpoint, MLClientError> {
    let endpoint = Endpoint::from_shared(addr.to_string())
        .map_err(|e| MLClientError::ConnectionError(format!("{}: {}", addr, e)))?;
    Ok(endpoint.timeout(timeout).connect_timeout(timeout))
}

#[tonic::async_trait]
impl RatingModel for ModelClient {
    async fn predict(
        &self,
        user_index: u32,
        item_indices: Vec<u32>,
    ) -> Result<Vec<f32>, MLClientError> {
        let expected_len = item_indices.len();
        debug!("Scoring {} items for user index {}", expected_len, user_index);

        let request = tonic::Request::new(PredictRequest {
            user_index,
            item_indices,
        });

        let mut client = self.client.clone();
        let response = client.predict(request).await.map_err(|e| {
            error!("gRPC error while scoring items: {}", e);
            MLClientError::ScoringError(e.to_string())
        })?;

        let scores = response.into_inner().scores;
        if scores.len() != expected_len {
            error!(
                "Mismatch in number of scores returned: expected {}, got {}",
                expected_len,
                scores.len()
            );
            return Err(MLClientError::InvalidResponse(format!(
                "expected {} scores, got {}",
                expected_len,
                scores.len()
            )));
        }
        Ok(scores)
    }
}
