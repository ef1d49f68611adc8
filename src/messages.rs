use crate::error::MessagesError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LabelKey {
    Views,
    Visits,
    Visitors,
    BounceRate,
    VisitDuration,
    PreviousPeriod,
    PreviousYear,
    Total,
    Average,
    Transactions,
    UniqueCustomers,
}

impl LabelKey {
    pub const ALL: [Self; 11] = [
        Self::Views,
        Self::Visits,
        Self::Visitors,
        Self::BounceRate,
        Self::VisitDuration,
        Self::PreviousPeriod,
        Self::PreviousYear,
        Self::Total,
        Self::Average,
        Self::Transactions,
        Self::UniqueCustomers,
    ];

    #[must_use]
    pub const fn id(self) -> &'static str {
        match self {
            Self::Views => "views",
            Self::Visits => "visits",
            Self::Visitors => "visitors",
            Self::BounceRate => "bounceRate",
            Self::VisitDuration => "visitDuration",
            Self::PreviousPeriod => "previousPeriod",
            Self::PreviousYear => "previousYear",
            Self::Total => "total",
            Self::Average => "average",
            Self::Transactions => "transactions",
            Self::UniqueCustomers => "uniqueCustomers",
        }
    }

    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|key| key.id() == id)
    }

    const fn default_text(self) -> &'static str {
        match self {
            Self::Views => "Views",
            Self::Visits => "Visits",
            Self::Visitors => "Visitors",
            Self::BounceRate => "Bounce rate",
            Self::VisitDuration => "Visit duration",
            Self::PreviousPeriod => "Previous period",
            Self::PreviousYear => "Previous year",
            Self::Total => "Total",
            Self::Average => "Average",
            Self::Transactions => "Transactions",
            Self::UniqueCustomers => "Unique Customers",
        }
    }
}

/// Label texts keyed by symbolic id.
#[derive(Debug, Clone)]
pub struct Messages {
    labels: FxHashMap<LabelKey, String>,
}

impl Default for Messages {
    fn default() -> Self {
        let labels = LabelKey::ALL
            .into_iter()
            .map(|key| (key, key.default_text().to_string()))
            .collect();
        Self { labels }
    }
}

impl Messages {
    /// English defaults overlaid with the entries of a JSON object such as
    /// `{"views": "Vues", "bounceRate": "Taux de rebond"}`.
    pub fn from_json(input: &str) -> Result<Self, MessagesError> {
        let overrides: FxHashMap<String, String> = serde_json::from_str(input)?;
        let mut messages = Self::default();
        for (id, text) in overrides {
            let key = LabelKey::from_id(&id).ok_or(MessagesError::UnknownKey(id))?;
            messages.set(key, text);
        }
        Ok(messages)
    }

    pub fn set(&mut self, key: LabelKey, text: impl Into<String>) {
        self.labels.insert(key, text.into());
    }

    #[must_use]
    pub fn format(&self, key: LabelKey) -> &str {
        self.labels
            .get(&key)
            .map_or_else(|| key.default_text(), String::as_str)
    }
}
