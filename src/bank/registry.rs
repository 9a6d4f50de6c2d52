//! Immutable item bank: validated at load time, partitioned by control kind.

use std::collections::{HashMap, HashSet};
use std::fs;
use std::path::Path;

use serde::Deserialize;

use crate::bank::item::{ControlKind, ItemDefinition, MetaSubtype, RawItemRecord};
use crate::core::errors::{InventoryError, Result};

/// Static question bank for one inventory.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ItemBank {
    items: Vec<ItemDefinition>,
    index: HashMap<String, usize>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum BankDocument {
    Table { items: Vec<RawItemRecord> },
    Rows(Vec<RawItemRecord>),
}

impl ItemBank {
    /// Build a bank from already-typed definitions.
    pub fn from_items(items: Vec<ItemDefinition>) -> Result<Self> {
        let mut index = HashMap::with_capacity(items.len());
        for (position, item) in items.iter().enumerate() {
            if item.control_kind == ControlKind::Meta && item.meta_subtype.is_none() {
                return Err(InventoryError::invalid_bank(format!(
                    "meta item {} has no subtype",
                    item.id
                )));
            }
            if index.insert(item.id.clone(), position).is_some() {
                return Err(InventoryError::invalid_bank(format!(
                    "duplicate item id {}",
                    item.id
                )));
            }
        }
        Ok(Self { items, index })
    }

    /// Normalize tabular rows and build a bank.
    pub fn from_records(records: Vec<RawItemRecord>) -> Result<Self> {
        let items = records
            .into_iter()
            .map(ItemDefinition::from_record)
            .collect::<Result<Vec<_>>>()?;
        Self::from_items(items)
    }

    /// Load a bank from a `.toml` (`[[items]]`) or `.json` file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path).map_err(|source| InventoryError::io(path, source))?;
        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase);
        let document: BankDocument = match extension.as_deref() {
            Some("toml") => toml::from_str(&raw)?,
            Some("json") => serde_json::from_str(&raw)?,
            _ => {
                return Err(InventoryError::UnsupportedFormat {
                    path: path.to_path_buf(),
                });
            }
        };
        let records = match document {
            BankDocument::Table { items } | BankDocument::Rows(items) => items,
        };
        let bank = Self::from_records(records)?;
        tracing::debug!(
            path = %path.display(),
            items = bank.len(),
            categories = bank.categories().len(),
            "loaded item bank"
        );
        Ok(bank)
    }

    /// All items in load order.
    #[must_use]
    pub fn items(&self) -> &[ItemDefinition] {
        &self.items
    }

    /// Number of items.
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    /// True for a bank with no items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Item by id.
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&ItemDefinition> {
        self.index.get(id).map(|&position| &self.items[position])
    }

    /// Substantive items, in bank order.
    pub fn regular(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items.iter().filter(|item| item.is_regular())
    }

    /// Central probe rewordings, in bank order.
    pub fn main_controls(&self) -> impl Iterator<Item = &ItemDefinition> {
        self.items
            .iter()
            .filter(|item| item.control_kind == ControlKind::MainControl)
    }

    /// Meta items of one subtype, in bank order.
    pub fn meta_of(&self, subtype: MetaSubtype) -> impl Iterator<Item = &ItemDefinition> {
        self.items.iter().filter(move |item| {
            item.control_kind == ControlKind::Meta && item.meta_subtype == Some(subtype)
        })
    }

    /// Meta subtypes present in the bank, in round-robin order.
    #[must_use]
    pub fn meta_subtypes(&self) -> Vec<MetaSubtype> {
        MetaSubtype::ALL
            .into_iter()
            .filter(|subtype| self.meta_of(*subtype).next().is_some())
            .collect()
    }

    /// Regular categories in order of first appearance.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.regular()
            .map(|item| item.category.as_str())
            .filter(|category| seen.insert(*category))
            .collect()
    }
}
