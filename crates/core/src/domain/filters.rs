use crate::domain::ranking::RankingRecord;
use crate::time::local_date::window_floor;
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Day windows offered by the period selector.
pub const PERIOD_CHOICES: [u32; 4] = [7, 30, 90, 365];

/// Window applied by servers when a request leaves `days` unset.
pub const DEFAULT_DAYS: u32 = 30;

/// Dashboard filter selection. `None` (or a blank string) means "all".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RankingFilters {
    pub product: Option<String>,
    pub keyword: Option<String>,
    pub days: Option<u32>,
}

impl RankingFilters {
    pub fn new(product: Option<String>, keyword: Option<String>, days: Option<u32>) -> Self {
        Self {
            product,
            keyword,
            days,
        }
        .normalized()
    }

    pub fn for_product(product: impl Into<String>) -> Self {
        Self::new(Some(product.into()), None, None)
    }

    pub fn normalized(self) -> Self {
        Self {
            product: blank_to_none(self.product),
            keyword: blank_to_none(self.keyword),
            days: self.days,
        }
    }

    pub fn days_or_default(&self) -> u32 {
        self.days.unwrap_or(DEFAULT_DAYS)
    }

    /// Whether `record` falls inside this selection, with the day window ending at `today`.
    pub fn matches(&self, record: &RankingRecord, today: NaiveDate) -> bool {
        if let Some(product) = self.product.as_deref() {
            if record.product_name != product {
                return false;
            }
        }
        if let Some(keyword) = self.keyword.as_deref() {
            if record.keyword != keyword {
                return false;
            }
        }
        record.date > window_floor(today, self.days_or_default())
    }

    /// Query parameters in the names the history endpoint accepts.
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        let mut out = Vec::with_capacity(3);
        if let Some(p) = &self.product {
            out.push(("sku_name", p.clone()));
        }
        if let Some(k) = &self.keyword {
            out.push(("keyword", k.clone()));
        }
        if let Some(d) = self.days {
            out.push(("days", d.to_string()));
        }
        out
    }
}

fn blank_to_none(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}
