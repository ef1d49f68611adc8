use crate::messages::{LabelKey, Messages};
use clap::ValueEnum;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

/// Which earlier period the current one is compared against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DateCompare {
    #[default]
    Prev,
    Yoy,
}

impl DateCompare {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Prev => "prev",
            Self::Yoy => "yoy",
        }
    }

    const fn label(self) -> LabelKey {
        match self {
            Self::Prev => LabelKey::PreviousPeriod,
            Self::Yoy => LabelKey::PreviousYear,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompareOption {
    pub label: String,
    pub value: DateCompare,
}

#[must_use]
pub fn compare_options(messages: &Messages) -> Vec<CompareOption> {
    [DateCompare::Prev, DateCompare::Yoy]
        .into_iter()
        .map(|value| CompareOption {
            label: messages.format(value.label()).to_string(),
            value,
        })
        .collect()
}

/// Per-website comparison selection, owned by the caller and passed in
/// wherever it is read.
#[derive(Debug, Clone, Default)]
pub struct CompareStore {
    selections: FxHashMap<String, DateCompare>,
}

impl CompareStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(&mut self, website_id: impl Into<String>, compare: DateCompare) {
        self.selections.insert(website_id.into(), compare);
    }

    #[must_use]
    pub fn get(&self, website_id: &str) -> Option<DateCompare> {
        self.selections.get(website_id).copied()
    }

    /// The value the selector shows: the stored choice or `prev`.
    #[must_use]
    pub fn selected(&self, website_id: &str) -> DateCompare {
        self.get(website_id).unwrap_or_default()
    }

    /// The comparison to request from the query service, only in compare mode.
    #[must_use]
    pub fn effective(&self, website_id: &str, compare_mode: bool) -> Option<DateCompare> {
        if compare_mode {
            self.get(website_id)
        } else {
            None
        }
    }
}
