#![warn(missing_docs)]
//! Yulestudio - AI holiday photo compositing.
//!
//! Turns a handful of reference photos plus a set of editing "directives"
//! into one stylized holiday composite via Gemini image generation.
//! Directives come from three places: the fixed holiday preset, user-written
//! entries, and AI-suggested refinements from scene analysis. A pure
//! composer renders the active set plus fixed style constraints into the
//! instruction prompt, and the [`Studio`] orchestrator drives the request
//! lifecycle.
//!
//! # Quick Start
//!
//! ```no_run
//! use yulestudio::{GeminiService, Studio};
//!
//! #[tokio::main]
//! async fn main() -> yulestudio::Result<()> {
//!     let service = GeminiService::builder().build()?;
//!     let mut studio = Studio::new(service);
//!     studio.add_reference(&std::fs::read("family.jpg")?, "image/jpeg")?;
//!
//!     // First photos with no directives yet: let analysis propose some.
//!     if studio.wants_auto_analysis() {
//!         studio.analyze().await;
//!     }
//!
//!     studio.generate().await;
//!     if let Some(photo) = studio.result_photo() {
//!         photo.save("holiday_photo.png")?;
//!     } else if let Some(error) = studio.status().error {
//!         eprintln!("{error}");
//!     }
//!     Ok(())
//! }
//! ```

mod directives;
mod error;
mod ids;
mod prompt;
mod references;
pub mod service;
mod studio;

pub use directives::{Directive, DirectiveSet, PresetOptions};
pub use error::{Result, StudioError};
pub use ids::{IdAllocator, SequenceAllocator, UuidAllocator};
pub use prompt::{compose, compose_preset, StyleBlock};
pub use references::{ReferenceImage, ReferenceStore, MAX_REFERENCE_IMAGES};
pub use service::{
    detect_media_type, GeminiModel, GeminiService, GeminiServiceBuilder, GeneratedPhoto,
    SceneService, ScenePart, Suggestion,
};
pub use studio::{AnalysisState, GenerationState, PromptMode, StatusSnapshot, Studio};

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::error::{Result, StudioError};
    pub use crate::service::{GeminiService, SceneService};
    pub use crate::studio::{GenerationState, StatusSnapshot, Studio};
}
