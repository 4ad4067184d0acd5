//! Scene service abstraction and the Gemini-backed implementation.

mod gemini;
mod provider;
mod types;

pub use gemini::{GeminiModel, GeminiService, GeminiServiceBuilder};
pub use provider::SceneService;
pub use types::{
    detect_media_type, extension_for, GeneratedPhoto, ScenePart, Suggestion,
    COMPOSITE_ASPECT_RATIO,
};
