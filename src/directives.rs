//! Editing directives: the per-session list of instructions to apply.

use crate::ids::{IdAllocator, UuidAllocator};
use crate::service::Suggestion;

/// Label given to user-written directives.
const CUSTOM_LABEL: &str = "Custom";

/// One atomic, independently toggleable edit instruction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    /// Unique id within the session.
    pub id: String,
    /// Short display name.
    pub label: String,
    /// Instruction text rendered into the prompt.
    pub description: String,
    /// Whether the directive participates in composition.
    pub is_active: bool,
    /// Whether the directive came from scene analysis.
    pub is_ai_generated: bool,
}

/// Ordered, mutable collection of directives.
///
/// Rendering order is list order: analysis suggestions in service order,
/// custom entries prepended most-recent-first. Toggling never reorders.
pub struct DirectiveSet {
    directives: Vec<Directive>,
    ids: Box<dyn IdAllocator>,
}

impl Default for DirectiveSet {
    fn default() -> Self {
        Self::new()
    }
}

impl DirectiveSet {
    /// Creates an empty set with random ids.
    pub fn new() -> Self {
        Self::with_allocator(Box::new(UuidAllocator))
    }

    /// Creates an empty set with an injected id allocator.
    pub fn with_allocator(ids: Box<dyn IdAllocator>) -> Self {
        Self {
            directives: Vec::new(),
            ids,
        }
    }

    /// Flips `is_active` on the directive with the given id. No-op when
    /// absent.
    pub fn toggle(&mut self, id: &str) -> bool {
        match self.directives.iter_mut().find(|d| d.id == id) {
            Some(directive) => {
                directive.is_active = !directive.is_active;
                true
            }
            None => false,
        }
    }

    /// Adds a user-written directive at the front of the list.
    ///
    /// Text that trims to empty is rejected and the set is left unchanged.
    pub fn add_custom(&mut self, text: &str) -> Option<&Directive> {
        let description = text.trim();
        if description.is_empty() {
            return None;
        }
        self.directives.insert(
            0,
            Directive {
                id: self.ids.next_id(),
                label: CUSTOM_LABEL.to_string(),
                description: description.to_string(),
                is_active: true,
                is_ai_generated: false,
            },
        );
        self.directives.first()
    }

    /// Replaces the whole list with fresh analysis suggestions.
    ///
    /// Previous entries, including custom ones and their toggle state, are
    /// discarded; suggestions describe the current image set.
    pub fn replace_with_suggestions(&mut self, suggestions: Vec<Suggestion>) {
        self.directives = suggestions
            .into_iter()
            .map(|suggestion| Directive {
                id: self.ids.next_id(),
                label: suggestion.label,
                description: suggestion.description,
                is_active: true,
                is_ai_generated: true,
            })
            .collect();
    }

    /// Directives in list order.
    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// Active directives in list order.
    pub fn active(&self) -> impl Iterator<Item = &Directive> {
        self.directives.iter().filter(|d| d.is_active)
    }

    /// Looks up a directive by id.
    pub fn get(&self, id: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.id == id)
    }

    /// Number of directives in the set.
    pub fn len(&self) -> usize {
        self.directives.len()
    }

    /// True when the set holds no directives.
    pub fn is_empty(&self) -> bool {
        self.directives.is_empty()
    }
}

/// Fixed toggle set used by the preset workflow.
///
/// Each flag maps to one instruction fragment; rendering order and grouping
/// live in [`crate::prompt::compose_preset`]. All flags default to on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresetOptions {
    /// Everyone looks at the camera with natural smiles.
    pub eye_contact: bool,
    /// The reindeer hood's antlers stand upright.
    pub straighten_antlers: bool,
    /// The white dog from the originals is left out.
    pub remove_dog: bool,
    /// The tree is snowy white with silver and gold ornaments.
    pub white_tree: bool,
    /// A toy train runs at the base of the tree.
    pub toy_train: bool,
    /// A window reveals a snowy forest outside.
    pub snowy_window: bool,
}

impl Default for PresetOptions {
    fn default() -> Self {
        Self {
            eye_contact: true,
            straighten_antlers: true,
            remove_dog: true,
            white_tree: true,
            toy_train: true,
            snowy_window: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::SequenceAllocator;

    fn set() -> DirectiveSet {
        DirectiveSet::with_allocator(Box::new(SequenceAllocator::new("dir")))
    }

    fn suggestion(label: &str, description: &str) -> Suggestion {
        Suggestion {
            label: label.into(),
            description: description.into(),
        }
    }

    #[test]
    fn test_add_custom_prepends_active_entry() {
        let mut set = set();
        set.add_custom("Warm up the color temperature");
        set.add_custom("Add falling snow");

        let directives = set.directives();
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].description, "Add falling snow");
        assert_eq!(directives[1].description, "Warm up the color temperature");
        assert!(directives[0].is_active);
        assert!(!directives[0].is_ai_generated);
        assert_eq!(directives[0].label, "Custom");
    }

    #[test]
    fn test_add_custom_trims_text() {
        let mut set = set();
        set.add_custom("  Brighten the fireplace  ");
        assert_eq!(set.directives()[0].description, "Brighten the fireplace");
    }

    #[test]
    fn test_add_custom_whitespace_is_noop() {
        let mut set = set();
        set.add_custom("Keep this");
        assert!(set.add_custom("   \t\n").is_none());
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn test_toggle_flips_active_flag() {
        let mut set = set();
        set.add_custom("Add falling snow");
        let id = set.directives()[0].id.clone();

        assert!(set.toggle(&id));
        assert!(!set.get(&id).unwrap().is_active);
        assert!(set.toggle(&id));
        assert!(set.get(&id).unwrap().is_active);
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let mut set = set();
        set.add_custom("Add falling snow");
        let before: Vec<_> = set.directives().to_vec();
        assert!(!set.toggle("missing"));
        assert_eq!(set.directives(), before.as_slice());
    }

    #[test]
    fn test_replace_with_suggestions_drops_previous_state() {
        let mut set = set();
        set.add_custom("Custom entry");
        set.replace_with_suggestions(vec![
            suggestion("Lighting", "Increase exposure by one stop"),
            suggestion("Framing", "Center the subjects"),
        ]);

        let directives = set.directives();
        assert_eq!(directives.len(), 2);
        assert_eq!(directives[0].label, "Lighting");
        assert!(directives[0].is_active);
        assert!(directives[0].is_ai_generated);
        assert!(directives.iter().all(|d| d.description != "Custom entry"));
    }

    #[test]
    fn test_replace_with_empty_suggestions_clears_set() {
        let mut set = set();
        set.add_custom("Custom entry");
        set.replace_with_suggestions(Vec::new());
        assert!(set.is_empty());
    }

    #[test]
    fn test_active_iterates_in_list_order() {
        let mut set = set();
        set.replace_with_suggestions(vec![
            suggestion("A", "first"),
            suggestion("B", "second"),
            suggestion("C", "third"),
        ]);
        let second = set.directives()[1].id.clone();
        set.toggle(&second);

        let active: Vec<_> = set.active().map(|d| d.description.as_str()).collect();
        assert_eq!(active, vec!["first", "third"]);
    }
}
