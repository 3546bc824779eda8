//! Per-view style sheets and merge semantics.
//!
//! A view's style is the running merge of every `updateStyle` patch applied
//! to it: omitted keys keep their current values, an explicit JSON null
//! clears a key. Merging reports what actually changed, split by pipeline
//! stage, so re-applying an identical patch is a no-op end to end.

use serde_json::{Map, Value};

use super::split::is_layout_key;

// ---------------------------------------------------------------------------
// StyleDelta
// ---------------------------------------------------------------------------

/// What one merge changed.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleDelta {
    /// A layout-affecting key changed value or was cleared.
    pub layout_changed: bool,
    /// Paint keys that changed, with their new values (`None` = cleared).
    /// These are forwarded to the native view as prop updates.
    pub paint: Vec<(String, Option<Value>)>,
}

impl StyleDelta {
    /// Whether the merge changed nothing.
    pub fn is_empty(&self) -> bool {
        !self.layout_changed && self.paint.is_empty()
    }
}

// ---------------------------------------------------------------------------
// StyleSheet
// ---------------------------------------------------------------------------

/// The merged style state of one view.
///
/// Declarations are camelCase keys with JSON values. The map is sorted, so
/// iteration (and therefore layout resolution) is deterministic and
/// shorthands like `margin` apply before their side-specific overrides.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct StyleSheet {
    declarations: Map<String, Value>,
}

impl StyleSheet {
    /// Create an empty sheet.
    pub fn new() -> Self {
        Self::default()
    }

    /// Merge a patch into the sheet and report the delta.
    pub fn merge(&mut self, patch: &Map<String, Value>) -> StyleDelta {
        let mut delta = StyleDelta::default();
        for (key, value) in patch {
            let changed = if value.is_null() {
                self.declarations.remove(key).is_some()
            } else if self.declarations.get(key) == Some(value) {
                false
            } else {
                self.declarations.insert(key.clone(), value.clone());
                true
            };
            if changed {
                if is_layout_key(key) {
                    delta.layout_changed = true;
                } else {
                    let new_value = (!value.is_null()).then(|| value.clone());
                    delta.paint.push((key.clone(), new_value));
                }
            }
        }
        delta
    }

    /// The current value for `key`, if set.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.declarations.get(key)
    }

    /// All current declarations, key-sorted.
    pub fn declarations(&self) -> &Map<String, Value> {
        &self.declarations
    }

    /// Number of set keys.
    pub fn len(&self) -> usize {
        self.declarations.len()
    }

    /// Whether nothing is set.
    pub fn is_empty(&self) -> bool {
        self.declarations.is_empty()
    }
}

// ===========================================================================
// Tests
// ===========================================================================
