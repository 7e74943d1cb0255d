use crate::domain::ranking::{Marketplace, Rank, RankingRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;

/// Best placement reached in a marketplace across the filtered records.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case", tag = "kind", content = "rank")]
pub enum BestRank {
    Ranked(Rank),
    NotRanked,
}

impl fmt::Display for BestRank {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BestRank::Ranked(rank) => write!(f, "{rank}位"),
            BestRank::NotRanked => f.write_str(OUT_OF_RANGE_LABEL),
        }
    }
}

impl From<Option<Rank>> for BestRank {
    fn from(rank: Option<Rank>) -> Self {
        rank.map_or(BestRank::NotRanked, BestRank::Ranked)
    }
}

pub const OUT_OF_RANGE_LABEL: &str = "圏外";
pub const NO_DATE_PLACEHOLDER: &str = "-";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SummaryStats {
    pub best_amazon_rank: BestRank,
    pub best_rakuten_rank: BestRank,
    pub latest_date: Option<NaiveDate>,
}

impl SummaryStats {
    pub fn best(&self, marketplace: Marketplace) -> BestRank {
        match marketplace {
            Marketplace::Amazon => self.best_amazon_rank,
            Marketplace::Rakuten => self.best_rakuten_rank,
        }
    }

    pub fn view(&self) -> StatsView {
        StatsView::from(self)
    }
}

pub fn summarize(records: &[RankingRecord]) -> SummaryStats {
    let best = |marketplace: Marketplace| -> BestRank {
        records
            .iter()
            .filter_map(|r| r.rank(marketplace))
            .min()
            .into()
    };

    SummaryStats {
        best_amazon_rank: best(Marketplace::Amazon),
        best_rakuten_rank: best(Marketplace::Rakuten),
        latest_date: records.iter().map(|r| r.date).max(),
    }
}

/// Display strings for the three stats cards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatsView {
    pub amazon_best: String,
    pub rakuten_best: String,
    pub last_update: String,
}

impl From<&SummaryStats> for StatsView {
    fn from(stats: &SummaryStats) -> Self {
        Self {
            amazon_best: stats.best_amazon_rank.to_string(),
            rakuten_best: stats.best_rakuten_rank.to_string(),
            last_update: stats
                .latest_date
                .map_or_else(|| NO_DATE_PLACEHOLDER.to_string(), |d| d.format("%Y-%m-%d").to_string()),
        }
    }
}
