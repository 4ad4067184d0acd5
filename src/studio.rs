//! Session orchestration: reference photos, directives, and the generation
//! workflow over a scene service.

use crate::directives::{Directive, DirectiveSet, PresetOptions};
use crate::error::StudioError;
use crate::prompt::{compose, compose_preset, StyleBlock};
use crate::references::{ReferenceImage, ReferenceStore, MAX_REFERENCE_IMAGES};
use crate::service::{GeneratedPhoto, SceneService, ScenePart};

/// Shown when generation is requested with no reference photos.
const NO_IMAGES_MESSAGE: &str = "Please upload at least one reference photo.";

/// Shown when the service reply carried no image.
const NO_IMAGE_PRODUCED_MESSAGE: &str =
    "The service did not produce an image. Try again with clearer instructions.";

/// Generation request lifecycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenerationState {
    /// No request made yet, or the session was reset.
    Idle,
    /// Checking preconditions before any service call.
    Validating,
    /// One request is in flight; further requests are rejected.
    Requesting,
    /// The composite came back and is ready to display or save.
    Succeeded(GeneratedPhoto),
    /// The attempt failed; retrying re-enters validation with the same
    /// inputs.
    Failed {
        /// User-facing description of the failure.
        message: String,
    },
}

impl GenerationState {
    /// True while a request is in flight.
    pub fn is_requesting(&self) -> bool {
        matches!(self, Self::Requesting)
    }

    /// User-facing error message, when failed.
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// The finished photo, when succeeded.
    pub fn photo(&self) -> Option<&GeneratedPhoto> {
        match self {
            Self::Succeeded(photo) => Some(photo),
            _ => None,
        }
    }
}

/// Scene analysis lifecycle, independent of generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnalysisState {
    /// No analysis run yet.
    Idle,
    /// One analysis request is in flight.
    Analyzing,
    /// Analysis completed (possibly with an empty result).
    Done,
}

/// How the instruction prompt is assembled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PromptMode {
    /// Compose from the session's directive list.
    Directives,
    /// Compose from the fixed toggle set.
    Preset(PresetOptions),
}

/// Combined view of both state machines, for presentation only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// A generation request is in flight.
    pub is_generating: bool,
    /// An analysis request is in flight.
    pub is_analyzing: bool,
    /// User-facing error from the last generation attempt.
    pub error: Option<String>,
    /// Data URL of the finished composite.
    pub result_url: Option<String>,
}

/// One editing session: reference photos, directives, and the workflow
/// around a scene service.
///
/// Generation and analysis run as two independent state machines over
/// disjoint fields. An analysis that finishes after a generation request
/// has started only ever touches the directive list, never generation
/// state.
pub struct Studio<S> {
    service: S,
    references: ReferenceStore,
    directives: DirectiveSet,
    style: StyleBlock,
    prompt_mode: PromptMode,
    generation: GenerationState,
    analysis: AnalysisState,
    auto_analysis_done: bool,
}

impl<S: SceneService> Studio<S> {
    /// Creates a session over the given service.
    pub fn new(service: S) -> Self {
        Self::with_parts(service, ReferenceStore::new(), DirectiveSet::new())
    }

    /// Creates a session with injected stores, for deterministic ids.
    pub fn with_parts(service: S, references: ReferenceStore, directives: DirectiveSet) -> Self {
        Self {
            service,
            references,
            directives,
            style: StyleBlock::default(),
            prompt_mode: PromptMode::Directives,
            generation: GenerationState::Idle,
            analysis: AnalysisState::Idle,
            auto_analysis_done: false,
        }
    }

    /// Adds a reference photo. Fails once the session cap is reached.
    pub fn add_reference(
        &mut self,
        bytes: &[u8],
        media_type: &str,
    ) -> Result<&ReferenceImage, StudioError> {
        if self.references.is_full() {
            return Err(StudioError::Validation(format!(
                "At most {MAX_REFERENCE_IMAGES} reference photos per session."
            )));
        }
        Ok(self.references.add(bytes, media_type))
    }

    /// Removes a reference photo by id. No-op when absent.
    pub fn remove_reference(&mut self, id: &str) -> bool {
        self.references.remove(id)
    }

    /// Reference photos in upload order.
    pub fn references(&self) -> &[ReferenceImage] {
        self.references.images()
    }

    /// Current directives in list order.
    pub fn directives(&self) -> &[Directive] {
        self.directives.directives()
    }

    /// Flips a directive's active flag. No-op for unknown ids.
    pub fn toggle_directive(&mut self, id: &str) -> bool {
        self.directives.toggle(id)
    }

    /// Adds a user-written directive. Whitespace-only text is rejected.
    pub fn add_custom_directive(&mut self, text: &str) -> bool {
        self.directives.add_custom(text).is_some()
    }

    /// Switches prompt assembly to the fixed toggle set.
    pub fn use_preset(&mut self, options: PresetOptions) {
        self.prompt_mode = PromptMode::Preset(options);
    }

    /// How the next prompt will be assembled.
    pub fn prompt_mode(&self) -> &PromptMode {
        &self.prompt_mode
    }

    /// The instruction string the next generation request will carry.
    pub fn composed_prompt(&self) -> String {
        match &self.prompt_mode {
            PromptMode::Directives => compose(self.directives.directives(), &self.style),
            PromptMode::Preset(options) => compose_preset(options, &self.style),
        }
    }

    /// True when analysis should fire automatically: photos are present,
    /// no directives exist yet, and no run has happened.
    pub fn wants_auto_analysis(&self) -> bool {
        !self.references.is_empty()
            && self.directives.is_empty()
            && !self.auto_analysis_done
            && self.analysis == AnalysisState::Idle
    }

    /// Runs scene analysis and replaces the directive list with the result.
    ///
    /// Analysis is advisory: service failures are logged and yield an empty
    /// list, never an error on the generation workflow. Re-running replaces
    /// the whole list, including custom entries and toggle state.
    pub async fn analyze(&mut self) -> &[Directive] {
        self.analysis = AnalysisState::Analyzing;
        self.auto_analysis_done = true;

        let suggestions = match self
            .service
            .suggest_refinements(self.references.images())
            .await
        {
            Ok(suggestions) => suggestions,
            Err(error) => {
                tracing::warn!(%error, "scene analysis failed, continuing without suggestions");
                Vec::new()
            }
        };

        tracing::debug!(count = suggestions.len(), "scene analysis complete");
        self.directives.replace_with_suggestions(suggestions);
        self.analysis = AnalysisState::Done;
        self.directives.directives()
    }

    /// Runs one generation attempt, driving the state machine to
    /// `Succeeded` or `Failed`.
    ///
    /// Preconditions are checked first: with no reference photos the attempt
    /// fails without a service call. A call while a previous request is
    /// still marked in flight returns the state unchanged. There is no
    /// automatic retry and no cancellation; retrying is simply calling this
    /// again.
    pub async fn generate(&mut self) -> &GenerationState {
        if self.generation.is_requesting() {
            return &self.generation;
        }

        self.generation = GenerationState::Validating;
        if self.references.is_empty() {
            self.generation = GenerationState::Failed {
                message: NO_IMAGES_MESSAGE.to_string(),
            };
            return &self.generation;
        }

        let prompt = self.composed_prompt();
        tracing::debug!(
            images = self.references.len(),
            prompt_len = prompt.len(),
            "submitting generation request"
        );
        self.generation = GenerationState::Requesting;

        let outcome = self
            .service
            .generate_composite(self.references.images(), &prompt)
            .await;

        self.generation = match outcome {
            Ok(parts) => match first_inline(parts) {
                Some((media_type, payload)) => {
                    match GeneratedPhoto::from_base64(media_type, &payload) {
                        Ok(photo) => GenerationState::Succeeded(photo),
                        Err(error) => GenerationState::Failed {
                            message: error.user_message(),
                        },
                    }
                }
                None => GenerationState::Failed {
                    message: NO_IMAGE_PRODUCED_MESSAGE.to_string(),
                },
            },
            Err(error) => {
                tracing::warn!(%error, "generation request failed");
                GenerationState::Failed {
                    message: error.user_message(),
                }
            }
        };
        &self.generation
    }

    /// Abandons in-flight bookkeeping and clears results and errors. The
    /// session-reset escape hatch for a `Requesting` state left behind by a
    /// dropped future.
    pub fn reset(&mut self) {
        self.generation = GenerationState::Idle;
        self.analysis = AnalysisState::Idle;
    }

    /// Current generation state.
    pub fn generation(&self) -> &GenerationState {
        &self.generation
    }

    /// Current analysis state.
    pub fn analysis(&self) -> AnalysisState {
        self.analysis
    }

    /// The finished composite, when the last attempt succeeded.
    pub fn result_photo(&self) -> Option<&GeneratedPhoto> {
        self.generation.photo()
    }

    /// Both state machines flattened for presentation.
    pub fn status(&self) -> StatusSnapshot {
        StatusSnapshot {
            is_generating: matches!(
                self.generation,
                GenerationState::Validating | GenerationState::Requesting
            ),
            is_analyzing: self.analysis == AnalysisState::Analyzing,
            error: self.generation.error().map(str::to_string),
            result_url: self.result_photo().map(GeneratedPhoto::to_data_url),
        }
    }
}

/// Scans response parts for the first inline image.
fn first_inline(parts: Vec<ScenePart>) -> Option<(String, String)> {
    parts.into_iter().find_map(|part| match part {
        ScenePart::Inline { media_type, data } => Some((media_type, data)),
        ScenePart::Text(_) => None,
    })
}
