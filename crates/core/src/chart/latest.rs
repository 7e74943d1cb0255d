use crate::domain::ranking::{CombinationKey, Rank, RankingRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap, HashSet};

/// Distinct keywords in the order they first appear; feeds the keyword selector.
pub fn distinct_keywords(records: &[RankingRecord]) -> Vec<String> {
    let mut seen = HashSet::new();
    records
        .iter()
        .filter(|r| seen.insert(r.keyword.as_str()))
        .map(|r| r.keyword.clone())
        .collect()
}

/// Distinct product names, sorted, for the product filter.
pub fn sorted_products(records: &[RankingRecord]) -> Vec<String> {
    sorted_distinct(records.iter().map(|r| r.product_name.as_str()))
}

/// Distinct keywords across all products, sorted.
pub fn sorted_keywords(records: &[RankingRecord]) -> Vec<String> {
    sorted_distinct(records.iter().map(|r| r.keyword.as_str()))
}

fn sorted_distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    values
        .collect::<BTreeSet<_>>()
        .into_iter()
        .map(str::to_string)
        .collect()
}

/// Most recent observation for one product/keyword pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LatestRanking {
    pub product: String,
    pub keyword: String,
    pub amazon: Option<Rank>,
    pub rakuten: Option<Rank>,
    pub date: NaiveDate,
}

/// Latest observation per combination, in first-seen combination order.
///
/// On equal dates the later record wins.
pub fn latest_rankings(records: &[RankingRecord]) -> Vec<LatestRanking> {
    let mut order: Vec<CombinationKey> = Vec::new();
    let mut latest: HashMap<CombinationKey, &RankingRecord> = HashMap::new();

    for record in records {
        let key = record.combination();
        match latest.get_mut(&key) {
            Some(current) => {
                if record.date >= current.date {
                    *current = record;
                }
            }
            None => {
                order.push(key.clone());
                latest.insert(key, record);
            }
        }
    }

    order
        .into_iter()
        .filter_map(|key| latest.remove(&key))
        .map(|r| LatestRanking {
            product: r.product_name.clone(),
            keyword: r.keyword.clone(),
            amazon: r.amazon_rank,
            rakuten: r.rakuten_rank,
            date: r.date,
        })
        .collect()
}
