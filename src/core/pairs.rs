//! Currency-pair metadata catalog loaded from a local JSON file.

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt::Display;
use std::fs;
use std::path::Path;
use tracing::debug;

pub const INVESTING_DOT_COM: &str = "investingdotcom";
pub const YAHOO_FINANCE: &str = "yahoofinance";

/// Older catalogs spell the Yahoo key this way.
const YAHOO_FINANCE_LEGACY: &str = "yahoofiannce";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Basis,
    Counter,
}

impl Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Basis => write!(f, "basis"),
            Side::Counter => write!(f, "counter"),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CurrencyCode {
    pub iso: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LegCurrency {
    pub code: CurrencyCode,
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct LegYield {
    #[serde(default)]
    pub code: HashMap<String, String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PairLeg {
    pub currency: LegCurrency,
    #[serde(rename = "yield", default)]
    pub yield_info: Option<LegYield>,
}

impl PairLeg {
    pub fn iso(&self) -> &str {
        &self.currency.code.iso
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PairRecord {
    pub basis: PairLeg,
    pub counter: PairLeg,
    #[serde(default)]
    pub delimiter: HashMap<String, String>,
}

impl PairRecord {
    pub fn leg(&self, side: Side) -> &PairLeg {
        match side {
            Side::Basis => &self.basis,
            Side::Counter => &self.counter,
        }
    }

    /// Concatenated ISO codes, e.g. `EURUSD`.
    pub fn canonical(&self) -> String {
        format!("{}{}", self.basis.iso(), self.counter.iso())
    }

    pub fn delimiter(&self, provider: &str) -> Option<&str> {
        provider_entry(&self.delimiter, provider)
    }
}

fn provider_entry<'a>(entries: &'a HashMap<String, String>, provider: &str) -> Option<&'a str> {
    entries
        .get(provider)
        .or_else(|| match provider {
            YAHOO_FINANCE => entries.get(YAHOO_FINANCE_LEGACY),
            _ => None,
        })
        .map(String::as_str)
}

/// Reads the pair catalog. Records are only checked for the fields every
/// record must carry; provider-specific keys are resolved on lookup.
pub fn load_pair_metadata<P: AsRef<Path>>(path: P) -> Result<Vec<PairRecord>> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read pair metadata: {}", path.display()))?;
    let records: Vec<PairRecord> = serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse pair metadata: {}", path.display()))?;
    debug!(count = records.len(), "Loaded pair metadata");
    Ok(records)
}

/// Pair codes in the notation of `provider`, e.g. `EUR/USD`, in catalog order.
pub fn pairs_from_metadata(records: &[PairRecord], provider: &str) -> Result<Vec<String>> {
    records
        .iter()
        .map(|record| -> Result<String> {
            let delimiter = record.delimiter(provider).ok_or_else(|| {
                anyhow!(
                    "No {} delimiter for pair {}",
                    provider,
                    record.canonical()
                )
            })?;
            Ok(format!(
                "{}{}{}",
                record.basis.iso(),
                delimiter,
                record.counter.iso()
            ))
        })
        .collect()
}

/// Yield code of `currency` on the given side, taken from the first record
/// whose leg matches.
pub fn lookup_yield_code(
    currency: &str,
    side: Side,
    provider: &str,
    records: &[PairRecord],
) -> Result<String> {
    let leg = records
        .iter()
        .map(|record| record.leg(side))
        .find(|leg| leg.iso() == currency)
        .ok_or_else(|| anyhow!("No {} currency {} in pair metadata", side, currency))?;

    leg.yield_info
        .as_ref()
        .and_then(|y| provider_entry(&y.code, provider))
        .map(str::to_string)
        .ok_or_else(|| anyhow!("No {} yield code for {} currency {}", provider, side, currency))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const CATALOG: &str = r#"[
        {
            "basis": {
                "currency": {"code": {"iso": "EUR"}, "name": "Euro"},
                "yield": {"code": {"yahoofinance": "EU3M"}}
            },
            "counter": {
                "currency": {"code": {"iso": "USD"}},
                "yield": {"code": {"yahoofinance": "^IRX"}}
            },
            "delimiter": {"investingdotcom": "/", "yahoofinance": ""}
        },
        {
            "basis": {
                "currency": {"code": {"iso": "GBP"}},
                "yield": {"code": {"yahoofiannce": "UK3M"}}
            },
            "counter": {
                "currency": {"code": {"iso": "USD"}},
                "yield": {"code": {"yahoofinance": "^IRX-2"}}
            },
            "delimiter": {"investingdotcom": "/"}
        }
    ]"#;

    fn records() -> Vec<PairRecord> {
        serde_json::from_str(CATALOG).unwrap()
    }

    #[test]
    fn test_pairs_from_metadata_single_record() {
        let json = r#"[{
            "basis": {"currency": {"code": {"iso": "EUR"}}},
            "counter": {"currency": {"code": {"iso": "USD"}}},
            "delimiter": {"investingdotcom": "/"}
        }]"#;
        let records: Vec<PairRecord> = serde_json::from_str(json).unwrap();
        assert_eq!(
            pairs_from_metadata(&records, INVESTING_DOT_COM).unwrap(),
            vec!["EUR/USD".to_string()]
        );
    }

    #[test]
    fn test_pairs_from_metadata_preserves_order() {
        let pairs = pairs_from_metadata(&records(), INVESTING_DOT_COM).unwrap();
        assert_eq!(pairs, vec!["EUR/USD", "GBP/USD"]);
    }

    #[test]
    fn test_pairs_from_metadata_missing_delimiter() {
        let result = pairs_from_metadata(&records(), YAHOO_FINANCE);
        assert_eq!(
            result.unwrap_err().to_string(),
            "No yahoofinance delimiter for pair GBPUSD"
        );
    }

    #[test]
    fn test_lookup_yield_code_first_match_wins() {
        let records = records();
        assert_eq!(
            lookup_yield_code("USD", Side::Counter, YAHOO_FINANCE, &records).unwrap(),
            "^IRX"
        );
        assert_eq!(
            lookup_yield_code("EUR", Side::Basis, YAHOO_FINANCE, &records).unwrap(),
            "EU3M"
        );
    }

    #[test]
    fn test_lookup_yield_code_accepts_legacy_key() {
        assert_eq!(
            lookup_yield_code("GBP", Side::Basis, YAHOO_FINANCE, &records()).unwrap(),
            "UK3M"
        );
    }

    #[test]
    fn test_lookup_yield_code_unmatched_currency() {
        let result = lookup_yield_code("USD", Side::Basis, YAHOO_FINANCE, &records());
        assert_eq!(
            result.unwrap_err().to_string(),
            "No basis currency USD in pair metadata"
        );
    }

    #[test]
    fn test_load_pair_metadata_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(CATALOG.as_bytes()).unwrap();

        let records = load_pair_metadata(file.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[1].canonical(), "GBPUSD");
    }

    #[test]
    fn test_load_pair_metadata_errors() {
        let missing = load_pair_metadata("/nonexistent/pairs.json");
        assert!(
            missing
                .unwrap_err()
                .to_string()
                .contains("Failed to read pair metadata")
        );

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{not json").unwrap();
        let malformed = load_pair_metadata(file.path());
        assert!(
            malformed
                .unwrap_err()
                .to_string()
                .contains("Failed to parse pair metadata")
        );
    }
}
