use std::collections::HashMap;

use crate::{constants::SUPPORTED_EVENT_TYPES, event::Event, prefs::Preferences};

/// Returns every distinct event type in `events`, in first-seen order
///
/// `FRAME_END` is included so it shows up (as unsupported) in toggle lists.
pub fn discover_types(events: &[Event]) -> Vec<String> {
    let mut types: Vec<String> = vec![];
    for event in events {
        if !types.iter().any(|t| t == event.event_type()) {
            types.push(event.event_type().to_string());
        }
    }
    types
}

/// Returns how many events there are of each type
pub fn count_types(events: &[Event]) -> HashMap<String, usize> {
    let mut counts = HashMap::new();
    for event in events {
        *counts.entry(event.event_type().to_string()).or_insert(0) += 1;
    }
    counts
}

pub fn is_supported_type(event_type: &str) -> bool {
    SUPPORTED_EVENT_TYPES.contains(&event_type)
}

/// The preference key holding the visibility of an event type
pub fn toggle_key(event_type: &str) -> String {
    format!("SAVE_CHECKBOX_{event_type}")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TypeToggle {
    pub event_type: String,
    pub enabled: bool,
    /// Unsupported types are listed but can never be enabled
    pub supported: bool,
}

/// Result of reconciling the toggle list against a new set of types
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TypeListDiff {
    pub added: Vec<String>,
    pub removed: Vec<String>,
}

impl TypeListDiff {
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.removed.is_empty()
    }
}

/// Per-type visibility for the currently displayed event sequence
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ToggleState {
    toggles: Vec<TypeToggle>,
}

fn seed_toggle<P: Preferences + ?Sized>(event_type: &str, prefs: &mut P) -> TypeToggle {
    let key = toggle_key(event_type);
    let supported = is_supported_type(event_type);
    let enabled = if supported {
        prefs.get_bool(&key, false)
    } else {
        prefs.set_bool(&key, false);
        false
    };
    TypeToggle {
        event_type: event_type.to_string(),
        enabled,
        supported,
    }
}

impl ToggleState {
    /// Builds the toggle list for `types`, seeding each entry from `prefs`
    pub fn build<P: Preferences + ?Sized>(types: &[String], prefs: &mut P) -> Self {
        Self {
            toggles: types.iter().map(|t| seed_toggle(t, prefs)).collect(),
        }
    }

    /// Brings the toggle list in line with `types`
    ///
    /// Entries for types that are still present keep their current state, new
    /// types are seeded from `prefs` and the final order follows `types`.
    pub fn reconcile<P: Preferences + ?Sized>(&mut self, types: &[String], prefs: &mut P) -> TypeListDiff {
        let mut diff = TypeListDiff::default();
        let mut previous = std::mem::take(&mut self.toggles);

        for event_type in types {
            match previous.iter().position(|t| t.event_type == *event_type) {
                Some(i) => self.toggles.push(previous.remove(i)),
                None => {
                    diff.added.push(event_type.clone());
                    self.toggles.push(seed_toggle(event_type, prefs));
                }
            }
        }
        diff.removed = previous.into_iter().map(|t| t.event_type).collect();

        diff
    }

    /// Enables or disables a type, persisting the new state
    ///
    /// Returns `true` if the visible state actually changed.
    pub fn set_enabled<P: Preferences + ?Sized>(&mut self, event_type: &str, enabled: bool, prefs: &mut P) -> bool {
        let toggle = match self.toggles.iter_mut().find(|t| t.event_type == event_type) {
            Some(toggle) => toggle,
            None => {
                log::warn!("Can't toggle unknown event type {event_type}");
                return false;
            }
        };
        if !toggle.supported {
            log::debug!("Ignoring toggle of unsupported event type {event_type}");
            return false;
        }

        prefs.set_bool(&toggle_key(event_type), enabled);
        let changed = toggle.enabled != enabled;
        toggle.enabled = enabled;
        changed
    }

    pub fn is_enabled(&self, event_type: &str) -> bool {
        self.toggles
            .iter()
            .any(|t| t.event_type == event_type && t.enabled)
    }

    pub fn iter(&self) -> impl Iterator<Item = &TypeToggle> {
        self.toggles.iter()
    }

    pub fn len(&self) -> usize {
        self.toggles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.toggles.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{event::parse, prefs::MemoryPreferences};

    fn types(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn discover_types_first_seen_order() {
        let events = parse(
            "PPU_EVENT SPR_FETCH_START lx=10 ly=5 cycles=20\n\
             PPU_EVENT FRAME_END\n\
             PPU_EVENT SPR_FETCH_END cycles=30 ly=5\n\
             PPU_EVENT SPR_FETCH_START lx=1 ly=6 cycles=2\n\
             PPU_EVENT FRAME_END",
        );
        assert_eq!(
            discover_types(&events),
            types(&["SPR_FETCH_START", "FRAME_END", "SPR_FETCH_END"])
        );
        assert!(discover_types(&[]).is_empty());

        let counts = count_types(&events);
        assert_eq!(counts["SPR_FETCH_START"], 2);
        assert_eq!(counts["FRAME_END"], 2);
        assert_eq!(counts["SPR_FETCH_END"], 1);
    }

    #[test]
    fn build_seeds_from_preferences() {
        let mut prefs = MemoryPreferences::new();
        prefs.set_bool("SAVE_CHECKBOX_LX_INC", true);
        prefs.set_bool("SAVE_CHECKBOX_CHANGE_MODE", true);

        let state = ToggleState::build(&types(&["LX_INC", "SPR_FETCH_END", "CHANGE_MODE"]), &mut prefs);
        assert!(state.is_enabled("LX_INC"));
        assert!(!state.is_enabled("SPR_FETCH_END"));

        // Unsupported types are forced off, and that is written back
        assert!(!state.is_enabled("CHANGE_MODE"));
        assert!(!state.iter().nth(2).unwrap().supported);
        assert_eq!(prefs.get("SAVE_CHECKBOX_CHANGE_MODE").as_deref(), Some("false"));
    }

    #[test]
    fn set_enabled_persists() {
        let mut prefs = MemoryPreferences::new();
        let mut state = ToggleState::build(&types(&["LX_INC", "FRAME_END"]), &mut prefs);

        assert!(state.set_enabled("LX_INC", true, &mut prefs));
        assert!(state.is_enabled("LX_INC"));
        assert_eq!(prefs.get("SAVE_CHECKBOX_LX_INC").as_deref(), Some("true"));
        assert!(!state.set_enabled("LX_INC", true, &mut prefs));

        assert!(!state.set_enabled("FRAME_END", true, &mut prefs));
        assert!(!state.is_enabled("FRAME_END"));
        assert!(!state.set_enabled("NOT_LOADED", true, &mut prefs));

        let rebuilt = ToggleState::build(&types(&["LX_INC"]), &mut prefs);
        assert!(rebuilt.is_enabled("LX_INC"));
    }

    #[test]
    fn reconcile_diffs_type_list() {
        let mut prefs = MemoryPreferences::new();
        prefs.set_bool("SAVE_CHECKBOX_SPR_FETCH_END", true);
        let mut state = ToggleState::build(&types(&["LX_INC", "FRAME_END"]), &mut prefs);
        state.set_enabled("LX_INC", true, &mut prefs);

        let diff = state.reconcile(&types(&["SPR_FETCH_END", "LX_INC"]), &mut prefs);
        assert_eq!(diff.added, types(&["SPR_FETCH_END"]));
        assert_eq!(diff.removed, types(&["FRAME_END"]));

        let order: Vec<_> = state.iter().map(|t| t.event_type.as_str()).collect();
        assert_eq!(order, vec!["SPR_FETCH_END", "LX_INC"]);
        assert!(state.is_enabled("LX_INC"));
        assert!(state.is_enabled("SPR_FETCH_END"));

        assert!(state.reconcile(&types(&["SPR_FETCH_END", "LX_INC"]), &mut prefs).is_empty());
    }
}
