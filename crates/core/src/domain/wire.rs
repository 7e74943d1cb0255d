use crate::domain::ranking::{Rank, RankingRecord};
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Rank value the ranking store writes when a product was not found within the search depth.
pub const OUT_OF_RANGE_SENTINEL: u64 = 999;

/// Spreadsheet cell text for the same "not found" outcome.
pub const OUT_OF_RANGE_TEXT: &str = "圏外";

const DATE_FORMATS: [&str; 2] = ["%Y-%m-%d", "%Y/%m/%d"];

/// A ranking row exactly as it travels over HTTP and sits in the JSON export.
///
/// Every field is optional here; [`WireRankingRecord::into_record`] decides what is usable.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct WireRankingRecord {
    #[serde(rename = "日付", default)]
    pub date: Option<String>,
    #[serde(rename = "SKU名", default)]
    pub product_name: Option<String>,
    #[serde(rename = "キーワード", default)]
    pub keyword: Option<String>,
    #[serde(rename = "Amazon順位", default)]
    pub amazon_rank: Option<Value>,
    #[serde(rename = "楽天順位", default)]
    pub rakuten_rank: Option<Value>,
}

impl WireRankingRecord {
    pub fn into_record(self) -> Result<RankingRecord, &'static str> {
        let date = self.date.as_deref().ok_or("missing date")?;
        let date = parse_date(date).ok_or("unparseable date")?;

        let product_name = non_empty(self.product_name).ok_or("missing product name")?;
        let keyword = non_empty(self.keyword).ok_or("missing keyword")?;

        let amazon_rank = parse_rank(self.amazon_rank.as_ref()).ok_or("invalid Amazon rank")?;
        let rakuten_rank = parse_rank(self.rakuten_rank.as_ref()).ok_or("invalid Rakuten rank")?;

        Ok(RankingRecord {
            date,
            product_name,
            keyword,
            amazon_rank,
            rakuten_rank,
        })
    }
}

impl From<&RankingRecord> for WireRankingRecord {
    fn from(record: &RankingRecord) -> Self {
        Self {
            date: Some(record.date.format("%Y-%m-%d").to_string()),
            product_name: Some(record.product_name.clone()),
            keyword: Some(record.keyword.clone()),
            amazon_rank: record.amazon_rank.map(|r| Value::from(r.get())),
            rakuten_rank: record.rakuten_rank.map(|r| Value::from(r.get())),
        }
    }
}

/// Converts wire rows into records, dropping rows that can't be attributed to a
/// date/combination/marketplace.
pub fn decode_records(rows: Vec<WireRankingRecord>) -> Vec<RankingRecord> {
    let total = rows.len();
    let mut out = Vec::with_capacity(total);
    let mut dropped: usize = 0;
    let mut first_reason: Option<&'static str> = None;

    for row in rows {
        match row.into_record() {
            Ok(record) => out.push(record),
            Err(reason) => {
                dropped += 1;
                first_reason.get_or_insert(reason);
            }
        }
    }

    if let Some(reason) = first_reason {
        tracing::warn!(
            dropped,
            total,
            first_reason = reason,
            "dropped malformed ranking records"
        );
    }

    out
}

pub fn encode_records(records: &[RankingRecord]) -> Vec<WireRankingRecord> {
    records.iter().map(WireRankingRecord::from).collect()
}

fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    DATE_FORMATS
        .iter()
        .find_map(|fmt| NaiveDate::parse_from_str(s, fmt).ok())
}

fn non_empty(s: Option<String>) -> Option<String> {
    s.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

/// `Some(None)` is an explicit "not ranked"; `None` means the value is unusable.
fn parse_rank(v: Option<&Value>) -> Option<Option<Rank>> {
    let n = match v {
        None | Some(Value::Null) => return Some(None),
        Some(Value::Number(n)) => number_to_u64(n)?,
        // Sheet-backed exports keep ranks as cell text.
        Some(Value::String(s)) => {
            let s = s.trim();
            if s.is_empty() || s == OUT_OF_RANGE_TEXT {
                return Some(None);
            }
            s.parse::<u64>().ok()?
        }
        Some(_) => return None,
    };

    if n == OUT_OF_RANGE_SENTINEL {
        return Some(None);
    }

    let n = u32::try_from(n).ok()?;
    Rank::new(n).map(Some)
}

fn number_to_u64(n: &serde_json::Number) -> Option<u64> {
    if let Some(n) = n.as_u64() {
        return Some(n);
    }
    // Integral floats such as `5.0` come out of spreadsheet tooling.
    let f = n.as_f64()?;
    if !f.is_finite() || f.fract() != 0.0 || f <= 0.0 || f > u32::MAX as f64 {
        return None;
    }
    Some(f as u64)
}

/// JSON envelope shared by the API and its clients.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum Envelope<T> {
    Success(T),
    Error { message: String },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Data<T> {
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkuNames {
    pub sku_names: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(v: Value) -> WireRankingRecord {
        serde_json::from_value(v).unwrap()
    }

    #[test]
    fn decodes_backend_field_names() {
        let rec = wire(json!({
            "日付": "2024-01-01",
            "SKU名": "P1",
            "キーワード": "K1",
            "Amazon順位": 5,
            "楽天順位": null
        }))
        .into_record()
        .unwrap();

        assert_eq!(rec.date, NaiveDate::from_ymd_opt(2024, 1, 1).unwrap());
        assert_eq!(rec.product_name, "P1");
        assert_eq!(rec.keyword, "K1");
        assert_eq!(rec.amazon_rank, Rank::new(5));
        assert_eq!(rec.rakuten_rank, None);
    }

    #[test]
    fn sentinel_and_integral_floats_are_normalized() {
        let rec = wire(json!({
            "日付": "2024/01/02",
            "SKU名": "P1",
            "キーワード": "K1",
            "Amazon順位": 999,
            "楽天順位": 12.0
        }))
        .into_record()
        .unwrap();

        assert_eq!(rec.amazon_rank, None);
        assert_eq!(rec.rakuten_rank, Rank::new(12));
    }

    #[test]
    fn sheet_cell_text_is_understood() {
        let rec = wire(json!({
            "日付": "2024-01-03",
            "SKU名": "P1",
            "キーワード": "K1",
            "Amazon順位": "7",
            "楽天順位": "圏外"
        }))
        .into_record()
        .unwrap();

        assert_eq!(rec.amazon_rank, Rank::new(7));
        assert_eq!(rec.rakuten_rank, None);
    }

    #[test]
    fn rejects_zero_fractional_and_non_numeric_ranks() {
        for bad in [json!(0), json!(-3), json!(2.5), json!("seven"), json!("0"), json!(true)] {
            let res = wire(json!({
                "日付": "2024-01-01",
                "SKU名": "P1",
                "キーワード": "K1",
                "Amazon順位": bad,
            }))
            .into_record();
            assert!(res.is_err(), "accepted {bad}");
        }
    }

    #[test]
    fn decode_drops_rows_missing_required_fields() {
        let rows = vec![
            wire(json!({"日付": "2024-01-01", "SKU名": "P1", "キーワード": "K1", "Amazon順位": 3})),
            wire(json!({"SKU名": "P1", "キーワード": "K1", "Amazon順位": 1})),
            wire(json!({"日付": "2024-01-01", "SKU名": "  ", "キーワード": "K1"})),
            wire(json!({"日付": "yesterday", "SKU名": "P1", "キーワード": "K1"})),
        ];

        let records = decode_records(rows);
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].amazon_rank, Rank::new(3));
    }

    #[test]
    fn encodes_absent_ranks_as_null() {
        let rec = RankingRecord {
            date: NaiveDate::from_ymd_opt(2024, 3, 9).unwrap(),
            product_name: "P1".to_string(),
            keyword: "K1".to_string(),
            amazon_rank: None,
            rakuten_rank: Rank::new(4),
        };

        let v = serde_json::to_value(WireRankingRecord::from(&rec)).unwrap();
        assert_eq!(
            v,
            json!({
                "日付": "2024-03-09",
                "SKU名": "P1",
                "キーワード": "K1",
                "Amazon順位": null,
                "楽天順位": 4
            })
        );
    }

    #[test]
    fn envelope_round_trips_status_tag() {
        let ok: Envelope<SkuNames> =
            serde_json::from_value(json!({"status": "success", "sku_names": ["A", "B"]})).unwrap();
        assert!(matches!(ok, Envelope::Success(SkuNames { ref sku_names, .. }) if sku_names.len() == 2));

        let err: Envelope<SkuNames> =
            serde_json::from_value(json!({"status": "error", "message": "sheet unavailable"}))
                .unwrap();
        assert!(matches!(err, Envelope::Error { ref message } if message == "sheet unavailable"));
    }
}
