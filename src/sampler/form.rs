//! An assembled test form: the ordered items for one administration.

use serde::Serialize;

use crate::bank::item::{ControlKind, ItemDefinition};

/// One slot of a form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FormEntry {
    /// Item shown in this slot.
    pub item: ItemDefinition,
    /// Set on meta items placed by periodic injection. Presentation hint
    /// only; scoring ignores it.
    pub is_meta_injection: bool,
}

/// Ordered item sequence. Built at session start, consumed item by item,
/// never persisted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TestForm {
    entries: Vec<FormEntry>,
}

impl TestForm {
    #[must_use]
    pub(crate) fn from_entries(entries: Vec<FormEntry>) -> Self {
        Self { entries }
    }

    /// Slots in presentation order.
    #[must_use]
    pub fn entries(&self) -> &[FormEntry] {
        &self.entries
    }

    /// Items in presentation order.
    pub fn items(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.entries.iter().map(|entry| &entry.item)
    }

    /// Number of slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True for a form with no slots.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Slot at `position`.
    #[must_use]
    pub fn get(&self, position: usize) -> Option<&FormEntry> {
        self.entries.get(position)
    }

    /// Items of one kind, in form order.
    pub fn of_kind(&self, kind: ControlKind) -> impl Iterator<Item = &ItemDefinition> {
        self.items().filter(move |item| item.control_kind == kind)
    }

    /// Regular items tagged `category`.
    #[must_use]
    pub fn count_in(&self, category: &str) -> usize {
        self.of_kind(ControlKind::None)
            .filter(|item| item.category == category)
            .count()
    }

    /// Meta items placed by periodic injection.
    #[must_use]
    pub fn meta_injection_count(&self) -> usize {
        self.entries
            .iter()
            .filter(|entry| entry.is_meta_injection)
            .count()
    }

    /// Consume the form into its slots.
    #[must_use]
    pub fn into_entries(self) -> Vec<FormEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a TestForm {
    type Item = &'a FormEntry;
    type IntoIter = std::slice::Iter<'a, FormEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}
