//! Configuration types for the travel cost engine.
//!
//! This module contains the strongly-typed workspace configuration and the
//! reference data (DSA regions and rates, currencies and exchange rates)
//! that are deserialized from YAML configuration files.

use chrono::NaiveDate;
use chrono_tz::Tz;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::{EngineError, EngineResult};

/// The currency code that selects the USD columns of a DSA rate.
pub const USD_CODE: &str = "USD";

/// Identifier of a DSA region.
pub type RegionId = u32;

/// Workspace (tenant) level settings.
///
/// Thresholds are optional; `None` disables the corresponding side of the
/// send-for-payment threshold check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkspaceConfig {
    /// Business area code used as the prefix of invoice reference numbers.
    pub business_area_code: String,
    /// Timezone in which itinerary timestamps are cast to calendar dates.
    pub timezone: Tz,
    /// Maximum USD overrun on traveler expenses before re-approval is forced.
    #[serde(default)]
    pub threshold_traveler_usd: Option<Decimal>,
    /// Maximum USD overrun on travel agency expenses before re-approval is forced.
    #[serde(default)]
    pub threshold_agency_usd: Option<Decimal>,
}

/// A DSA rate effective from a given date.
///
/// Holds the four daily amounts: local and USD, each with a reduced
/// variant for days beyond the 60th day of a mission.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsaRate {
    /// The first date on which this rate is in force.
    pub effective_from: NaiveDate,
    /// Daily amount in local currency.
    pub local: Decimal,
    /// Daily amount in local currency from day 61 onward.
    pub local_over60: Decimal,
    /// Daily amount in USD.
    pub usd: Decimal,
    /// Daily amount in USD from day 61 onward.
    pub usd_over60: Decimal,
}

impl DsaRate {
    /// Picks the amount from the local/USD by normal/over-60 matrix.
    ///
    /// `USD` is identified by exact code match; any other code selects the
    /// local columns.
    ///
    /// # Example
    ///
    /// ```
    /// use travel_cost_engine::config::DsaRate;
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let rate = DsaRate {
    ///     effective_from: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
    ///     local: Decimal::new(30000, 0),
    ///     local_over60: Decimal::new(22500, 0),
    ///     usd: Decimal::new(100, 0),
    ///     usd_over60: Decimal::new(75, 0),
    /// };
    /// assert_eq!(rate.amount(true, "USD"), Decimal::new(75, 0));
    /// assert_eq!(rate.amount(false, "HUF"), Decimal::new(30000, 0));
    /// ```
    pub fn amount(&self, over_60: bool, currency_code: &str) -> Decimal {
        match (currency_code == USD_CODE, over_60) {
            (true, false) => self.usd,
            (true, true) => self.usd_over60,
            (false, false) => self.local,
            (false, true) => self.local_over60,
        }
    }

    fn has_negative_amount(&self) -> bool {
        [self.local, self.local_over60, self.usd, self.usd_over60]
            .iter()
            .any(|amount| *amount < Decimal::ZERO)
    }
}

/// A geographic zone whose rate history determines the per-diem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DsaRegion {
    /// Unique identifier of the region.
    pub id: RegionId,
    /// Country name.
    pub country: String,
    /// Name of the area within the country.
    pub area_name: String,
    /// Short area code.
    #[serde(default)]
    pub area_code: String,
    /// Rate history (sorted oldest first once loaded).
    #[serde(default)]
    pub rates: Vec<DsaRate>,
}

impl DsaRegion {
    /// Human readable label, e.g. `Hungary - Budapest`.
    pub fn label(&self) -> String {
        format!("{} - {}", self.country, self.area_name)
    }
}

/// One entry of a currency's exchange rate history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExchangeRate {
    /// The first date the rate is valid.
    pub valid_from: NaiveDate,
    /// The last date the rate is valid.
    pub valid_to: NaiveDate,
    /// Multiplier converting one unit of the currency into USD.
    pub x_rate: Decimal,
}

/// A currency with its exchange rate history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Currency {
    /// ISO-like currency code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Number of decimal places used for display.
    #[serde(default)]
    pub decimal_places: u32,
    /// Exchange rates (sorted by `valid_from` once loaded).
    #[serde(default)]
    pub exchange_rates: Vec<ExchangeRate>,
}

impl Currency {
    /// Returns the most recent exchange rate, if any.
    pub fn latest_exchange_rate(&self) -> Option<&ExchangeRate> {
        self.exchange_rates.last()
    }
}

/// Regions file structure (`dsa_regions.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct RegionsConfig {
    /// All DSA regions with their rates.
    pub regions: Vec<DsaRegion>,
}

/// Currencies file structure (`currencies.yaml`).
#[derive(Debug, Clone, Deserialize)]
pub struct CurrenciesConfig {
    /// All currencies with their exchange rates.
    pub currencies: Vec<Currency>,
}

/// Read-only reference data shared by every calculation.
#[derive(Debug, Clone, Default)]
pub struct ReferenceData {
    regions: HashMap<RegionId, DsaRegion>,
    currencies: HashMap<String, Currency>,
}

impl ReferenceData {
    /// Builds reference data, sorting histories and rejecting inconsistencies.
    pub fn new(regions: Vec<DsaRegion>, currencies: Vec<Currency>) -> EngineResult<Self> {
        let mut region_map = HashMap::with_capacity(regions.len());
        for mut region in regions {
            if region.rates.iter().any(DsaRate::has_negative_amount) {
                return Err(EngineError::InvalidConfig {
                    message: format!("region {} has a negative DSA amount", region.id),
                });
            }
            region.rates.sort_by(|a, b| a.effective_from.cmp(&b.effective_from));
            let id = region.id;
            if region_map.insert(id, region).is_some() {
                return Err(EngineError::InvalidConfig {
                    message: format!("duplicate DSA region id {}", id),
                });
            }
        }

        let mut currency_map = HashMap::with_capacity(currencies.len());
        for mut currency in currencies {
            currency
                .exchange_rates
                .sort_by(|a, b| a.valid_from.cmp(&b.valid_from));
            let code = currency.code.clone();
            if currency_map.insert(code.clone(), currency).is_some() {
                return Err(EngineError::InvalidConfig {
                    message: format!("duplicate currency code {}", code),
                });
            }
        }

        Ok(Self {
            regions: region_map,
            currencies: currency_map,
        })
    }

    /// Gets a region by id.
    pub fn region(&self, id: RegionId) -> EngineResult<&DsaRegion> {
        self.regions
            .get(&id)
            .ok_or(EngineError::RegionNotFound { region_id: id })
    }

    /// Gets a currency by code.
    pub fn currency(&self, code: &str) -> EngineResult<&Currency> {
        self.currencies
            .get(code)
            .ok_or_else(|| EngineError::CurrencyNotFound {
                code: code.to_string(),
            })
    }

    /// Returns the `x_rate` of the currency's most recent exchange rate.
    pub fn latest_x_rate(&self, code: &str) -> EngineResult<Decimal> {
        self.currency(code)?
            .latest_exchange_rate()
            .map(|rate| rate.x_rate)
            .ok_or_else(|| EngineError::MissingExchangeRate {
                currency: code.to_string(),
            })
    }

    /// Returns all regions.
    pub fn regions(&self) -> impl Iterator<Item = &DsaRegion> {
        self.regions.values()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn rate(from: NaiveDate, usd: &str) -> DsaRate {
        DsaRate {
            effective_from: from,
            local: dec("1000"),
            local_over60: dec("800"),
            usd: dec(usd),
            usd_over60: dec("1"),
        }
    }

    #[test]
    fn test_amount_matrix() {
        let r = DsaRate {
            effective_from: date(2024, 1, 1),
            local: dec("1"),
            local_over60: dec("2"),
            usd: dec("3"),
            usd_over60: dec("4"),
        };
        assert_eq!(r.amount(false, "HUF"), dec("1"));
        assert_eq!(r.amount(true, "HUF"), dec("2"));
        assert_eq!(r.amount(false, "USD"), dec("3"));
        assert_eq!(r.amount(true, "USD"), dec("4"));
        // exact code match only
        assert_eq!(r.amount(false, "usd"), dec("1"));
    }

    #[test]
    fn test_reference_data_sorts_rate_history() {
        let region = DsaRegion {
            id: 1,
            country: "Kenya".to_string(),
            area_name: "Nairobi".to_string(),
            area_code: "NBO".to_string(),
            rates: vec![rate(date(2024, 6, 1), "120"), rate(date(2024, 1, 1), "100")],
        };
        let data = ReferenceData::new(vec![region], vec![]).unwrap();
        let rates = &data.region(1).unwrap().rates;
        assert_eq!(rates[0].effective_from, date(2024, 1, 1));
        assert_eq!(rates[1].effective_from, date(2024, 6, 1));
    }

    #[test]
    fn test_duplicate_region_rejected() {
        let region = DsaRegion {
            id: 1,
            country: "Kenya".to_string(),
            area_name: "Nairobi".to_string(),
            area_code: String::new(),
            rates: vec![],
        };
        let result = ReferenceData::new(vec![region.clone(), region], vec![]);
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_negative_rate_rejected() {
        let region = DsaRegion {
            id: 1,
            country: "Kenya".to_string(),
            area_name: "Nairobi".to_string(),
            area_code: String::new(),
            rates: vec![rate(date(2024, 1, 1), "-5")],
        };
        let result = ReferenceData::new(vec![region], vec![]);
        assert!(matches!(result, Err(EngineError::InvalidConfig { .. })));
    }

    #[test]
    fn test_latest_x_rate_uses_most_recent_entry() {
        let currency = Currency {
            code: "HUF".to_string(),
            name: "Forint".to_string(),
            decimal_places: 0,
            exchange_rates: vec![
                ExchangeRate {
                    valid_from: date(2024, 2, 1),
                    valid_to: date(2024, 2, 29),
                    x_rate: dec("0.0028"),
                },
                ExchangeRate {
                    valid_from: date(2024, 1, 1),
                    valid_to: date(2024, 1, 31),
                    x_rate: dec("0.0027"),
                },
            ],
        };
        let data = ReferenceData::new(vec![], vec![currency]).unwrap();
        assert_eq!(data.latest_x_rate("HUF").unwrap(), dec("0.0028"));
    }

    #[test]
    fn test_missing_exchange_rate_is_an_error() {
        let currency = Currency {
            code: "KES".to_string(),
            name: "Shilling".to_string(),
            decimal_places: 2,
            exchange_rates: vec![],
        };
        let data = ReferenceData::new(vec![], vec![currency]).unwrap();
        match data.latest_x_rate("KES") {
            Err(EngineError::MissingExchangeRate { currency }) => assert_eq!(currency, "KES"),
            other => panic!("Expected MissingExchangeRate, got {:?}", other),
        }
        assert!(matches!(
            data.latest_x_rate("EUR"),
            Err(EngineError::CurrencyNotFound { .. })
        ));
    }

    #[test]
    fn test_region_label() {
        let region = DsaRegion {
            id: 3,
            country: "Hungary".to_string(),
            area_name: "Budapest".to_string(),
            area_code: "BUD".to_string(),
            rates: vec![],
        };
        assert_eq!(region.label(), "Hungary - Budapest");
    }
}
