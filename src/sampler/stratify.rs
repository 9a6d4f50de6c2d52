//! Form sampler: stratified draw across regular categories, periodic meta
//! injection, random placement of main-control rewordings.
//!
//! Randomness is always injected. Production callers pass `rand::rng()`;
//! tests pass a seeded `StdRng` and assert structure only.

use std::collections::HashMap;

use rand::Rng;
use rand::seq::SliceRandom;

use crate::bank::item::{ItemDefinition, MetaSubtype};
use crate::bank::registry::ItemBank;
use crate::core::config::{Config, SamplerConfig};
use crate::sampler::form::{FormEntry, TestForm};

/// Builds test forms from a bank according to a fixed sampler config.
#[derive(Debug, Clone, Default)]
pub struct FormSampler {
    config: SamplerConfig,
}

impl FormSampler {
    /// Sampler with an explicit configuration.
    #[must_use]
    pub fn new(config: SamplerConfig) -> Self {
        Self { config }
    }

    /// Sampler using the `[sampler]` section of `config`.
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        Self::new(config.sampler.clone())
    }

    /// Assemble one form of roughly `target_size` items.
    ///
    /// The regular budget is `target_size` minus every main-control item
    /// minus `target_size / meta_interval` meta slots (no slots reserved when
    /// the bank has no meta items). Categories short on items give what they
    /// have; the shortfall is topped up from the unused pool.
    pub fn build_form<R: Rng>(&self, bank: &ItemBank, target_size: usize, rng: &mut R) -> TestForm {
        if bank.is_empty() {
            return TestForm::default();
        }
        let interval = self.config.meta_interval.max(1);
        let controls: Vec<&ItemDefinition> = bank.main_controls().collect();
        let meta_subtypes = bank.meta_subtypes();
        let reserved_meta = if meta_subtypes.is_empty() {
            0
        } else {
            target_size / interval
        };
        let regular_target = target_size
            .saturating_sub(controls.len())
            .saturating_sub(reserved_meta);

        let mut regular = self.draw_regular(bank, regular_target, rng);
        regular.shuffle(rng);

        let mut meta = MetaRotation::new(bank, &meta_subtypes, rng);
        let mut entries = Vec::with_capacity(regular.len() + regular.len() / interval + controls.len());
        for (position, item) in regular.into_iter().enumerate() {
            entries.push(FormEntry {
                item: item.clone(),
                is_meta_injection: false,
            });
            if (position + 1) % interval == 0
                && let Some(injected) = meta.next(rng)
            {
                entries.push(FormEntry {
                    item: injected.clone(),
                    is_meta_injection: true,
                });
            }
        }

        for control in controls {
            let slot = rng.random_range(0..=entries.len());
            entries.insert(
                slot,
                FormEntry {
                    item: control.clone(),
                    is_meta_injection: false,
                },
            );
        }

        let form = TestForm::from_entries(entries);
        tracing::debug!(
            target_size,
            regular_target,
            size = form.len(),
            injected = form.meta_injection_count(),
            "form assembled"
        );
        form
    }

    fn draw_regular<'b, R: Rng>(
        &self,
        bank: &'b ItemBank,
        regular_target: usize,
        rng: &mut R,
    ) -> Vec<&'b ItemDefinition> {
        let declared: Vec<&str> = if self.config.categories.is_empty() {
            bank.categories()
        } else {
            self.config.categories.iter().map(String::as_str).collect()
        };
        if declared.is_empty() || regular_target == 0 {
            return Vec::new();
        }

        let mut by_category: HashMap<&str, Vec<&'b ItemDefinition>> = HashMap::new();
        for item in bank.regular() {
            by_category.entry(item.category.as_str()).or_default().push(item);
        }

        let per_category = regular_target / declared.len();
        let mut selected = Vec::with_capacity(regular_target);
        let mut unused = Vec::new();
        for category in &declared {
            let Some(mut pool) = by_category.remove(category) else {
                tracing::debug!(category, "category has no items in bank; skipping");
                continue;
            };
            pool.shuffle(rng);
            let take = per_category.min(pool.len());
            unused.extend(pool.drain(take..));
            selected.extend(pool);
        }

        if selected.len() < regular_target {
            unused.shuffle(rng);
            let shortfall = regular_target - selected.len();
            selected.extend(unused.into_iter().take(shortfall));
        }
        selected
    }
}

/// Round-robin over subtypes; each subtype deals from its own shuffled deck
/// and reshuffles only once the deck is exhausted.
struct MetaRotation<'b> {
    decks: Vec<(Vec<&'b ItemDefinition>, usize)>,
    turn: usize,
}

impl<'b> MetaRotation<'b> {
    fn new<R: Rng>(bank: &'b ItemBank, subtypes: &[MetaSubtype], rng: &mut R) -> Self {
        let decks = subtypes
            .iter()
            .map(|subtype| {
                let mut deck: Vec<&ItemDefinition> = bank.meta_of(*subtype).collect();
                deck.shuffle(rng);
                (deck, 0)
            })
            .filter(|(deck, _)| !deck.is_empty())
            .collect();
        Self { decks, turn: 0 }
    }

    fn next<R: Rng>(&mut self, rng: &mut R) -> Option<&'b ItemDefinition> {
        if self.decks.is_empty() {
            return None;
        }
        let slot = self.turn % self.decks.len();
        self.turn += 1;
        let (deck, cursor) = &mut self.decks[slot];
        if *cursor == deck.len() {
            deck.shuffle(rng);
            *cursor = 0;
        }
        let item = deck[*cursor];
        *cursor += 1;
        Some(item)
    }
}

/// Build a form with the default sampler and the thread-local RNG.
#[must_use]
pub fn build_form(bank: &ItemBank, target_size: usize) -> TestForm {
    FormSampler::default().build_form(bank, target_size, &mut rand::rng())
}
