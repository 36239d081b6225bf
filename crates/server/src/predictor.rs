//! Latent-factor rating prediction over a candidate batch.

use std::sync::Arc;
use std::time::Duration;

use data_loader::{IdentifierIndex, UserId};
use ml_client::{MLClientError, RatingModel};
use sources::Candidate;
use tracing::{debug, instrument};

use crate::error::RecommendError;

/// Encodes a user and a batch of candidates and asks the model for one
/// predicted rating per candidate.
#[derive(Clone)]
pub struct RatingPredictor {
    encoding: Arc<IdentifierIndex>,
    model: Arc<dyn RatingModel>,
    timeout: Duration,
}

impl RatingPredictor {
    pub fn new(encoding: Arc<IdentifierIndex>, model: Arc<dyn RatingModel>, timeout: Duration) -> Self {
        Self {
            encoding,
            model,
            timeout,
        }
    }

    /// Predict ratings for `candidates`.
    ///
    /// Candidates whose title cannot be encoded are dropped; the output is
    /// aligned with the surviving candidates, in input order. The model is
    /// called once for the whole batch and never for an empty one.
    #[instrument(skip(self, candidates), fields(user = %user_id, candidates = candidates.len()))]
    pub async fn predict(
        &self,
        user_id: &UserId,
        candidates: Vec<Candidate>,
    ) -> Result<Vec<(Candidate, f32)>, RecommendError> {
        let user_index = self
            .encoding
            .encode_user(user_id)
            .map_err(|_| RecommendError::UnknownUser(user_id.clone()))?;

        let encoded: Vec<Candidate> = candidates
            .into_iter()
            .filter_map(|mut candidate| {
                if candidate.item_index.is_none() {
                    candidate.item_index = self.encoding.encode_item(&candidate.title).ok();
                }
                candidate.item_index.map(|_| candidate)
            })
            .collect();

        if encoded.is_empty() {
            debug!("No encodable candidates, skipping model call");
            return Ok(Vec::new());
        }

        let item_indices: Vec<u32> = encoded
            .iter()
            .filter_map(|candidate| candidate.item_index.map(|index| index.0))
            .collect();

        let scores = tokio::time::timeout(self.timeout, self.model.predict(user_index.0, item_indices))
            .await
            .map_err(|_| RecommendError::Timeout {
                operation: "rating prediction",
                timeout: self.timeout,
            })??;

        debug!("Model returned {} scores", scores.len());
        if scores.len() != encoded.len() {
            return Err(RecommendError::Model(MLClientError::InvalidResponse(format!(
                "expected {} scores, got {}",
                encoded.len(),
                scores.len()
            ))));
        }
        Ok(encoded.into_iter().zip(scores).collect())
    }
}
