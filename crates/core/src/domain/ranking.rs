use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::NonZeroU32;

/// 1-based placement in a marketplace's search results. Lower is better.
///
/// "Not found within the tracked depth" is modelled as `Option::<Rank>::None`, never as a
/// numeric value, so it can't take part in a minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Rank(NonZeroU32);

impl Rank {
    pub fn new(value: u32) -> Option<Self> {
        NonZeroU32::new(value).map(Self)
    }

    pub fn get(self) -> u32 {
        self.0.get()
    }
}

impl fmt::Display for Rank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Marketplace {
    Amazon,
    Rakuten,
}

impl Marketplace {
    pub const ALL: [Marketplace; 2] = [Marketplace::Amazon, Marketplace::Rakuten];

    /// Label shown in legends and dataset names.
    pub fn label(self) -> &'static str {
        match self {
            Marketplace::Amazon => "Amazon",
            Marketplace::Rakuten => "楽天",
        }
    }
}

/// One dated observation of a product's placement for a keyword.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankingRecord {
    pub date: NaiveDate,
    pub product_name: String,
    pub keyword: String,
    pub amazon_rank: Option<Rank>,
    pub rakuten_rank: Option<Rank>,
}

impl RankingRecord {
    pub fn rank(&self, marketplace: Marketplace) -> Option<Rank> {
        match marketplace {
            Marketplace::Amazon => self.amazon_rank,
            Marketplace::Rakuten => self.rakuten_rank,
        }
    }

    pub fn combination(&self) -> CombinationKey {
        CombinationKey {
            product_name: self.product_name.clone(),
            keyword: self.keyword.clone(),
        }
    }
}

/// Identity of one plotted line pair.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CombinationKey {
    pub product_name: String,
    pub keyword: String,
}

impl CombinationKey {
    pub fn new(product_name: impl Into<String>, keyword: impl Into<String>) -> Self {
        Self {
            product_name: product_name.into(),
            keyword: keyword.into(),
        }
    }
}

impl fmt::Display for CombinationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.product_name, self.keyword)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rank_zero_is_not_a_rank() {
        assert_eq!(Rank::new(0), None);
        assert_eq!(Rank::new(3).map(Rank::get), Some(3));
    }

    #[test]
    fn rank_orders_lower_as_better() {
        let best = Rank::new(1).unwrap();
        let worse = Rank::new(40).unwrap();
        assert!(best < worse);
        assert_eq!([worse, best].into_iter().min(), Some(best));
    }

    #[test]
    fn combination_display_matches_legend_prefix() {
        let key = CombinationKey::new("リノンロックオイル", "ヘアオイル");
        assert_eq!(key.to_string(), "リノンロックオイル - ヘアオイル");
    }
}
