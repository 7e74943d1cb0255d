use crate::chart::aggregate::{Combinations, DateAxis};
use crate::domain::ranking::{CombinationKey, Marketplace, Rank};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;

pub const DEFAULT_PALETTE: [&str; 5] = ["#FF6384", "#36A2EB", "#FFCE56", "#4BC0C0", "#9966FF"];

/// `#RRGGBB` line color.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Color(String);

impl Color {
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let s = s.trim();
        let hex = s
            .strip_prefix('#')
            .ok_or_else(|| anyhow::anyhow!("color must start with '#': {s:?}"))?;
        anyhow::ensure!(
            hex.len() == 6 && hex.chars().all(|c| c.is_ascii_hexdigit()),
            "color must be #RRGGBB: {s:?}"
        );
        Ok(Self(s.to_ascii_uppercase()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Same color with an `#RRGGBBAA` alpha suffix, used for fills.
    pub fn with_alpha(&self, alpha: u8) -> String {
        format!("{}{alpha:02x}", self.0)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered, non-empty color cycle. Combination `i` gets `colors[i % len]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Palette(Vec<Color>);

impl Palette {
    pub fn new(colors: Vec<Color>) -> anyhow::Result<Self> {
        anyhow::ensure!(!colors.is_empty(), "palette must contain at least one color");
        Ok(Self(colors))
    }

    /// Parses a comma separated list such as `#FF6384,#36A2EB`.
    pub fn parse(s: &str) -> anyhow::Result<Self> {
        let colors = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(Color::parse)
            .collect::<anyhow::Result<Vec<_>>>()?;
        Self::new(colors)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn color_for(&self, index: usize) -> &Color {
        &self.0[index % self.0.len()]
    }
}

impl Default for Palette {
    fn default() -> Self {
        Self(DEFAULT_PALETTE.iter().map(|c| Color(c.to_string())).collect())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StrokeStyle {
    Solid,
    Dashed,
}

impl StrokeStyle {
    pub fn for_marketplace(marketplace: Marketplace) -> Self {
        match marketplace {
            Marketplace::Amazon => StrokeStyle::Solid,
            Marketplace::Rakuten => StrokeStyle::Dashed,
        }
    }
}

/// One position on the date axis: a rank, or nothing observed there.
///
/// Serializes as the rank number or `null`, which line renderers draw as a break.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum SeriesPoint {
    Rank(Rank),
    Gap,
}

impl SeriesPoint {
    pub fn rank(self) -> Option<Rank> {
        match self {
            SeriesPoint::Rank(r) => Some(r),
            SeriesPoint::Gap => None,
        }
    }

    pub fn is_gap(self) -> bool {
        matches!(self, SeriesPoint::Gap)
    }
}

impl From<Option<Rank>> for SeriesPoint {
    fn from(rank: Option<Rank>) -> Self {
        rank.map_or(SeriesPoint::Gap, SeriesPoint::Rank)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dataset {
    pub label: String,
    pub combination: CombinationKey,
    pub marketplace: Marketplace,
    pub color: Color,
    pub stroke_style: StrokeStyle,
    pub points: Vec<SeriesPoint>,
}

impl Dataset {
    fn dense(
        axis: &DateAxis,
        key: &CombinationKey,
        marketplace: Marketplace,
        color: &Color,
        sparse: &BTreeMap<NaiveDate, Rank>,
    ) -> Self {
        let points = axis
            .iter()
            .map(|date| SeriesPoint::from(sparse.get(date).copied()))
            .collect();

        Self {
            label: format!("{key} ({})", marketplace.label()),
            combination: key.clone(),
            marketplace,
            color: color.clone(),
            stroke_style: StrokeStyle::for_marketplace(marketplace),
            points,
        }
    }
}

/// Expands every combination into an Amazon/Rakuten dataset pair aligned to `axis`.
///
/// Pairs come out in combination order, Amazon first, both in the combination's palette color.
pub fn build_datasets(axis: &DateAxis, combinations: &Combinations, palette: &Palette) -> Vec<Dataset> {
    let mut out = Vec::with_capacity(combinations.len() * Marketplace::ALL.len());
    for (index, (key, series)) in combinations.iter().enumerate() {
        let color = palette.color_for(index);
        for marketplace in Marketplace::ALL {
            out.push(Dataset::dense(
                axis,
                key,
                marketplace,
                color,
                series.get(marketplace),
            ));
        }
    }
    out
}
