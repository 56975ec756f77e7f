//! Per-day DSA deductions.

use chrono::{Datelike, NaiveDate, Weekday};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Weight of a provided breakfast.
pub const BREAKFAST_WEIGHT: Decimal = Decimal::from_parts(5, 0, 0, false, 2);
/// Weight of a provided lunch.
pub const LUNCH_WEIGHT: Decimal = Decimal::from_parts(10, 0, 0, false, 2);
/// Weight of a provided dinner.
pub const DINNER_WEIGHT: Decimal = Decimal::from_parts(15, 0, 0, false, 2);
/// Weight of provided accommodation.
pub const ACCOMMODATION_WEIGHT: Decimal = Decimal::from_parts(50, 0, 0, false, 2);
/// Weight of a day without DSA.
pub const NO_DSA_WEIGHT: Decimal = Decimal::ONE;

/// Meals and accommodation provided to the traveler on a given date.
///
/// A trip has at most one deduction per date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deduction {
    /// The date the deduction applies to.
    pub date: NaiveDate,
    /// Breakfast was provided.
    #[serde(default)]
    pub breakfast: bool,
    /// Lunch was provided.
    #[serde(default)]
    pub lunch: bool,
    /// Dinner was provided.
    #[serde(default)]
    pub dinner: bool,
    /// Accommodation was provided.
    #[serde(default)]
    pub accommodation: bool,
    /// No DSA is due on this date at all.
    #[serde(default)]
    pub no_dsa: bool,
}

impl Deduction {
    /// Creates a deduction with nothing ticked.
    pub fn new(date: NaiveDate) -> Self {
        Self {
            date,
            breakfast: false,
            lunch: false,
            dinner: false,
            accommodation: false,
            no_dsa: false,
        }
    }

    /// Returns the share of the daily DSA to deduct, clamped to `[0, 1]`.
    ///
    /// # Examples
    ///
    /// ```
    /// use travel_cost_engine::models::Deduction;
    /// use chrono::NaiveDate;
    /// use rust_decimal::Decimal;
    ///
    /// let mut deduction = Deduction::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    /// deduction.breakfast = true;
    /// deduction.lunch = true;
    /// assert_eq!(deduction.multiplier(), Decimal::new(15, 2));
    ///
    /// deduction.no_dsa = true;
    /// assert_eq!(deduction.multiplier(), Decimal::ONE);
    /// ```
    pub fn multiplier(&self) -> Decimal {
        let weights = [
            (self.breakfast, BREAKFAST_WEIGHT),
            (self.lunch, LUNCH_WEIGHT),
            (self.dinner, DINNER_WEIGHT),
            (self.accommodation, ACCOMMODATION_WEIGHT),
            (self.no_dsa, NO_DSA_WEIGHT),
        ];

        let total: Decimal = weights
            .iter()
            .filter(|(ticked, _)| *ticked)
            .map(|(_, weight)| *weight)
            .sum();

        total.clamp(Decimal::ZERO, Decimal::ONE)
    }

    /// Returns the day of the week of the deduction date.
    pub fn day_of_week(&self) -> Weekday {
        self.date.weekday()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn dec(s: &str) -> Decimal {
        Decimal::from_str(s).unwrap()
    }

    fn deduction() -> Deduction {
        Deduction::new(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap())
    }

    #[test]
    fn test_empty_deduction_has_zero_multiplier() {
        assert_eq!(deduction().multiplier(), Decimal::ZERO);
    }

    #[test]
    fn test_single_weights() {
        let mut d = deduction();
        d.breakfast = true;
        assert_eq!(d.multiplier(), dec("0.05"));

        let mut d = deduction();
        d.lunch = true;
        assert_eq!(d.multiplier(), dec("0.10"));

        let mut d = deduction();
        d.dinner = true;
        assert_eq!(d.multiplier(), dec("0.15"));

        let mut d = deduction();
        d.accommodation = true;
        assert_eq!(d.multiplier(), dec("0.50"));
    }

    #[test]
    fn test_all_meals_and_accommodation() {
        let mut d = deduction();
        d.breakfast = true;
        d.lunch = true;
        d.dinner = true;
        d.accommodation = true;
        assert_eq!(d.multiplier(), dec("0.80"));
    }

    #[test]
    fn test_multiplier_clamped_to_one() {
        let mut d = deduction();
        d.no_dsa = true;
        d.accommodation = true;
        d.dinner = true;
        assert_eq!(d.multiplier(), Decimal::ONE);
    }

    #[test]
    fn test_day_of_week() {
        // 2024-03-01 is a Friday
        assert_eq!(deduction().day_of_week(), Weekday::Fri);
    }
}
