//! Outfit recommendation screen state: base item selection, free-text
//! query, occasion tags and the ranked results.

use std::collections::HashSet;

use crate::api::model::{ItemRecord, Outfit, RecommendationRequest};

/// Occasions offered out of the box; users can add their own.
pub const DEFAULT_OCCASIONS: [&str; 5] = ["casual", "work", "date", "formal", "sport"];

#[derive(Debug)]
pub struct RecommendState {
    pub query: String,
    pub budget: String,
    /// `(name, selected)` in display order, defaults first.
    pub occasions: Vec<(String, bool)>,
    /// Server ids of the base items to build outfits around.
    pub selected_items: HashSet<String>,
    /// Everything the item store knows about, for the picker.
    pub all_items: Vec<ItemRecord>,
    pub outfits: Vec<Outfit>,
    pub loading: bool,
}

impl Default for RecommendState {
    fn default() -> Self {
        Self {
            query: String::new(),
            budget: String::new(),
            occasions: DEFAULT_OCCASIONS
                .iter()
                .map(|name| (name.to_string(), false))
                .collect(),
            selected_items: HashSet::new(),
            all_items: Vec::new(),
            outfits: Vec::new(),
            loading: false,
        }
    }
}

impl RecommendState {
    /// Toggle an occasion tag; unknown names are appended as custom tags,
    /// already selected.
    pub fn toggle_occasion(&mut self, name: &str) {
        let name = name.trim();
        if name.is_empty() {
            return;
        }
        match self.occasions.iter_mut().find(|(n, _)| n == name) {
            Some((_, selected)) => *selected = !*selected,
            None => self.occasions.push((name.to_string(), true)),
        }
    }

    pub fn toggle_item(&mut self, id: &str) {
        if !self.selected_items.remove(id) {
            self.selected_items.insert(id.to_string());
        }
    }

    /// Build the request payload from the current form.
    pub fn request(&self) -> RecommendationRequest {
        let mut selected: Vec<String> = self.selected_items.iter().cloned().collect();
        selected.sort();
        RecommendationRequest {
            selected_item_ids: selected,
            query: self.query.trim().to_string(),
            occasions: self
                .occasions
                .iter()
                .filter(|(_, on)| *on)
                .map(|(name, _)| name.clone())
                .collect(),
            source: None,
            budget: if self.budget.trim().is_empty() {
                None
            } else {
                Some(self.budget.trim().to_string())
            },
        }
    }
}
