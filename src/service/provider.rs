//! Scene service trait.

use crate::error::Result;
use crate::references::ReferenceImage;
use crate::service::types::{ScenePart, Suggestion};
use async_trait::async_trait;

/// A generative service that composites photos and proposes refinements.
///
/// Both operations carry the full ordered set of reference images. Neither
/// retries; the caller decides what a failure means for its workflow.
#[async_trait]
pub trait SceneService: Send + Sync {
    /// Submits the reference images and instruction text, returning the
    /// response parts in order. An empty part list, or one with no inline
    /// image, is a valid response.
    async fn generate_composite(
        &self,
        images: &[ReferenceImage],
        prompt: &str,
    ) -> Result<Vec<ScenePart>>;

    /// Asks the service to enumerate distinct refinement opportunities for
    /// the given images. A batch that fails schema validation is an error;
    /// partial batches are never returned.
    async fn suggest_refinements(&self, images: &[ReferenceImage]) -> Result<Vec<Suggestion>>;
}
