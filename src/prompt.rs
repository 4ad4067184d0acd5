//! Deterministic prompt composition.

use crate::directives::{Directive, PresetOptions};

/// Fixed style and technical constraints appended to every prompt.
///
/// These are global and non-negotiable; directive toggles never remove
/// them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleBlock {
    /// Opening instruction naming the overall task.
    pub preamble: String,
    /// Identity and scene constraints.
    pub constraints: Vec<String>,
    /// Photographic quality requirements.
    pub technical: Vec<String>,
}

impl Default for StyleBlock {
    fn default() -> Self {
        Self {
            preamble: "Generate a professional high-quality photograph based on the \
                       provided reference images."
                .into(),
            constraints: vec![
                "Preserve the identity and facial features of every person in the \
                 reference photos."
                    .into(),
                "Set the scene in a cozy, luxurious Christmas living room.".into(),
            ],
            technical: vec![
                "Cinematic lighting, high HDR (High Dynamic Range), vibrant colors.".into(),
                "Exceptional definition, sharp focus on the subjects, soft bokeh on \
                 the background."
                    .into(),
                "Perfect exposure and contrast, clear and bright atmosphere (not dark).".into(),
                "Professional photography style, 8k resolution feel.".into(),
            ],
        }
    }
}

/// Renders the active directives plus the fixed style block into the
/// instruction string sent to the generative service.
///
/// Pure: the same inputs produce byte-identical output. Inactive directives
/// are omitted entirely, never rendered as negations, and directives whose
/// description trims to empty are skipped.
pub fn compose(directives: &[Directive], style: &StyleBlock) -> String {
    let fragments: Vec<&str> = directives
        .iter()
        .filter(|d| d.is_active && !d.description.trim().is_empty())
        .map(|d| d.description.as_str())
        .collect();
    render(&fragments, style)
}

/// Renders the preset toggle variant.
///
/// Fragments are emitted in the fixed table order: pose first, then costume
/// and removal fixes, then environment.
pub fn compose_preset(options: &PresetOptions, style: &StyleBlock) -> String {
    let fragments: Vec<&str> = PRESET_FRAGMENTS
        .iter()
        .filter(|(enabled, _)| enabled(options))
        .map(|(_, fragment)| *fragment)
        .collect();
    render(&fragments, style)
}

/// Instruction fragment per preset flag, in rendering order.
static PRESET_FRAGMENTS: &[(fn(&PresetOptions) -> bool, &str)] = &[
    // Pose
    (
        |o| o.eye_contact,
        "Ensure everyone is looking directly at the camera with natural, warm \
         smiles and expressions.",
    ),
    // Costume and removal
    (
        |o| o.straighten_antlers,
        "The reindeer hood's antlers must be perfectly upright and firm, not \
         floppy or folded down.",
    ),
    (
        |o| o.remove_dog,
        "Do not include the white dog from the original photos in the new image.",
    ),
    // Environment
    (
        |o| o.white_tree,
        "The Christmas tree must be snowy white, decorated with elegant silver \
         and gold ornaments.",
    ),
    (
        |o| o.toy_train,
        "At the base of the tree, include a classic detailed toy train set.",
    ),
    (
        |o| o.snowy_window,
        "Background: a large window revealing a deep green forest with soft, \
         light snowflakes falling outside.",
    ),
];

fn render(fragments: &[&str], style: &StyleBlock) -> String {
    let mut sections = vec![style.preamble.clone()];
    if !fragments.is_empty() {
        sections.push(section("REQUESTED ADJUSTMENTS", fragments.iter().copied()));
    }
    sections.push(section(
        "CORE REQUIREMENTS",
        style.constraints.iter().map(String::as_str),
    ));
    sections.push(section(
        "TECHNICAL SPECS",
        style.technical.iter().map(String::as_str),
    ));
    sections.join("\n\n")
}

fn section<'a>(title: &str, lines: impl Iterator<Item = &'a str>) -> String {
    let mut out = format!("{title}:");
    for line in lines {
        out.push_str("\n- ");
        out.push_str(line);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn directive(description: &str, is_active: bool) -> Directive {
        Directive {
            id: format!("id-{description}"),
            label: "Test".into(),
            description: description.into(),
            is_active,
            is_ai_generated: false,
        }
    }

    #[test]
    fn test_compose_includes_active_excludes_inactive() {
        let directives = vec![
            directive("Increase exposure by one stop", true),
            directive("Add falling snow", false),
            directive("Straighten the horizon", true),
        ];
        let prompt = compose(&directives, &StyleBlock::default());

        assert!(prompt.contains("Increase exposure by one stop"));
        assert!(prompt.contains("Straighten the horizon"));
        assert!(!prompt.contains("Add falling snow"));
    }

    #[test]
    fn test_compose_is_deterministic() {
        let directives = vec![
            directive("Increase exposure by one stop", true),
            directive("Add falling snow", true),
        ];
        let style = StyleBlock::default();
        assert_eq!(compose(&directives, &style), compose(&directives, &style));
    }

    #[test]
    fn test_compose_preserves_directive_order() {
        let directives = vec![
            directive("first adjustment", true),
            directive("second adjustment", true),
        ];
        let prompt = compose(&directives, &StyleBlock::default());
        let first = prompt.find("first adjustment").unwrap();
        let second = prompt.find("second adjustment").unwrap();
        assert!(first < second);
    }

    #[test]
    fn test_compose_skips_empty_descriptions() {
        let directives = vec![directive("  ", true), directive("Real work", true)];
        let prompt = compose(&directives, &StyleBlock::default());
        assert!(!prompt.contains("REQUESTED ADJUSTMENTS:\n-  "));
        assert!(prompt.contains("Real work"));
    }

    #[test]
    fn test_compose_without_active_directives_omits_section() {
        let directives = vec![directive("Add falling snow", false)];
        let prompt = compose(&directives, &StyleBlock::default());
        assert!(!prompt.contains("REQUESTED ADJUSTMENTS"));
        assert!(prompt.contains("CORE REQUIREMENTS"));
        assert!(prompt.contains("TECHNICAL SPECS"));
    }

    #[test]
    fn test_style_block_always_appended() {
        let prompt = compose(&[], &StyleBlock::default());
        assert!(prompt.starts_with("Generate a professional high-quality photograph"));
        assert!(prompt.contains("Preserve the identity and facial features"));
        assert!(prompt.contains("8k resolution feel"));
    }

    #[test]
    fn test_preset_renders_enabled_fragments_only() {
        let options = PresetOptions {
            remove_dog: false,
            ..PresetOptions::default()
        };
        let prompt = compose_preset(&options, &StyleBlock::default());
        assert!(prompt.contains("antlers must be perfectly upright"));
        assert!(!prompt.contains("white dog"));
    }

    #[test]
    fn test_preset_order_groups_pose_costume_environment() {
        let prompt = compose_preset(&PresetOptions::default(), &StyleBlock::default());
        let pose = prompt.find("looking directly at the camera").unwrap();
        let costume = prompt.find("antlers").unwrap();
        let removal = prompt.find("white dog").unwrap();
        let environment = prompt.find("toy train").unwrap();
        assert!(pose < costume);
        assert!(costume < removal);
        assert!(removal < environment);
    }

    #[test]
    fn test_preset_all_disabled_still_carries_style() {
        let options = PresetOptions {
            eye_contact: false,
            straighten_antlers: false,
            remove_dog: false,
            white_tree: false,
            toy_train: false,
            snowy_window: false,
        };
        let prompt = compose_preset(&options, &StyleBlock::default());
        assert!(!prompt.contains("REQUESTED ADJUSTMENTS"));
        assert!(prompt.contains("TECHNICAL SPECS"));
    }
}
