use crate::domain::ranking::{CombinationKey, Marketplace, Rank, RankingRecord};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};

/// Sorted, duplicate-free observation dates shared by every plotted series.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct DateAxis(Vec<NaiveDate>);

impl DateAxis {
    pub fn from_dates(dates: impl IntoIterator<Item = NaiveDate>) -> Self {
        let mut dates: Vec<NaiveDate> = dates
            .into_iter()
            .collect::<HashSet<_>>()
            .into_iter()
            .collect();
        dates.sort_unstable();
        Self(dates)
    }

    pub fn dates(&self) -> &[NaiveDate] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &NaiveDate> {
        self.0.iter()
    }
}

/// Per-marketplace sparse rank maps for one combination. A missing date means no observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseSeries {
    pub amazon: BTreeMap<NaiveDate, Rank>,
    pub rakuten: BTreeMap<NaiveDate, Rank>,
}

impl SparseSeries {
    pub fn get(&self, marketplace: Marketplace) -> &BTreeMap<NaiveDate, Rank> {
        match marketplace {
            Marketplace::Amazon => &self.amazon,
            Marketplace::Rakuten => &self.rakuten,
        }
    }

    fn get_mut(&mut self, marketplace: Marketplace) -> &mut BTreeMap<NaiveDate, Rank> {
        match marketplace {
            Marketplace::Amazon => &mut self.amazon,
            Marketplace::Rakuten => &mut self.rakuten,
        }
    }
}

/// Combinations in the order they were first encountered.
#[derive(Debug, Clone, Default)]
pub struct Combinations {
    entries: Vec<(CombinationKey, SparseSeries)>,
    index: HashMap<CombinationKey, usize>,
}

impl Combinations {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, key: &CombinationKey) -> Option<&SparseSeries> {
        self.index.get(key).map(|&i| &self.entries[i].1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&CombinationKey, &SparseSeries)> {
        self.entries.iter().map(|(k, s)| (k, s))
    }

    pub fn keys(&self) -> impl Iterator<Item = &CombinationKey> {
        self.entries.iter().map(|(k, _)| k)
    }

    fn entry(&mut self, record: &RankingRecord) -> &mut SparseSeries {
        let key = record.combination();
        let i = match self.index.get(&key) {
            Some(&i) => i,
            None => {
                let i = self.entries.len();
                self.index.insert(key.clone(), i);
                self.entries.push((key, SparseSeries::default()));
                i
            }
        };
        &mut self.entries[i].1
    }
}

#[derive(Debug, Clone, Default)]
pub struct Aggregation {
    pub axis: DateAxis,
    pub combinations: Combinations,
}

/// Groups records by combination and marketplace and collects the shared date axis.
///
/// Absent ranks leave the sparse maps untouched; a repeated (date, combination, marketplace)
/// keeps the value from the later record.
pub fn aggregate(records: &[RankingRecord]) -> Aggregation {
    let mut dates = HashSet::new();
    let mut combinations = Combinations::default();

    for record in records {
        dates.insert(record.date);
        let series = combinations.entry(record);
        for marketplace in Marketplace::ALL {
            if let Some(rank) = record.rank(marketplace) {
                series.get_mut(marketplace).insert(record.date, rank);
            }
        }
    }

    Aggregation {
        axis: DateAxis::from_dates(dates),
        combinations,
    }
}
