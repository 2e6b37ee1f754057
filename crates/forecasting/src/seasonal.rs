//! Seasonal and weekday multipliers.

use std::collections::BTreeMap;

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};

use careforecast_core::ServiceName;

/// Multiplier applied to every month in `from_month..=to_month`.
///
/// Ranges wrap around the year end, so `11..=2` means November through February.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonalRule {
    pub from_month: u32,
    pub to_month: u32,
    pub multiplier: f64,
}

impl SeasonalRule {
    pub const fn new(from_month: u32, to_month: u32, multiplier: f64) -> Self {
        Self { from_month, to_month, multiplier }
    }

    pub fn covers(&self, month: u32) -> bool {
        if self.from_month <= self.to_month {
            (self.from_month..=self.to_month).contains(&month)
        } else {
            month >= self.from_month || month <= self.to_month
        }
    }
}

/// Service name → seasonal rules. The first matching rule wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeasonalTable {
    rules: BTreeMap<String, Vec<SeasonalRule>>,
}

impl SeasonalTable {
    pub fn new(rules: BTreeMap<String, Vec<SeasonalRule>>) -> Self {
        Self { rules }
    }

    pub fn factor(&self, service: &ServiceName, month: u32) -> f64 {
        self.rules
            .get(service.as_str())
            .and_then(|rules| rules.iter().find(|r| r.covers(month)))
            .map_or(1.0, |r| r.multiplier)
    }
}

impl Default for SeasonalTable {
    fn default() -> Self {
        Self::new(BTreeMap::from([
            (
                "Emergency".to_string(),
                vec![SeasonalRule::new(11, 2, 1.15), SeasonalRule::new(6, 8, 1.10)],
            ),
            ("Maternity".to_string(), vec![SeasonalRule::new(3, 5, 1.12)]),
            ("Surgery".to_string(), vec![SeasonalRule::new(7, 8, 0.90)]),
        ]))
    }
}

/// Calendar adjustments applied per forecast day.
#[derive(Debug, Copy, Clone)]
pub struct SeasonalAdjuster<'a> {
    table: &'a SeasonalTable,
}

impl<'a> SeasonalAdjuster<'a> {
    pub fn new(table: &'a SeasonalTable) -> Self {
        Self { table }
    }

    pub fn seasonal_factor(&self, date: NaiveDate, service: &ServiceName) -> f64 {
        self.table.factor(service, date.month())
    }

    pub fn weekday_factor(&self, date: NaiveDate) -> f64 {
        weekday_factor(date)
    }
}

/// Saturday 0.85, Sunday 0.75, weekdays 1.0.
pub fn weekday_factor(date: NaiveDate) -> f64 {
    match date.weekday() {
        Weekday::Sat => 0.85,
        Weekday::Sun => 0.75,
        _ => 1.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn svc(name: &str) -> ServiceName {
        ServiceName::new(name).unwrap()
    }

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn emergency_peaks_in_winter_and_summer() {
        let table = SeasonalTable::default();
        let adj = SeasonalAdjuster::new(&table);
        let emergency = svc("Emergency");

        for month in [11, 12, 1, 2] {
            assert_eq!(adj.seasonal_factor(date(2025, month, 10), &emergency), 1.15, "month {month}");
        }
        for month in [6, 7, 8] {
            assert_eq!(adj.seasonal_factor(date(2025, month, 10), &emergency), 1.10, "month {month}");
        }
        for month in [3, 4, 5, 9, 10] {
            assert_eq!(adj.seasonal_factor(date(2025, month, 10), &emergency), 1.0, "month {month}");
        }
    }

    #[test]
    fn maternity_spring_and_surgery_summer() {
        let table = SeasonalTable::default();
        let adj = SeasonalAdjuster::new(&table);

        assert_eq!(adj.seasonal_factor(date(2025, 4, 1), &svc("Maternity")), 1.12);
        assert_eq!(adj.seasonal_factor(date(2025, 6, 1), &svc("Maternity")), 1.0);
        assert_eq!(adj.seasonal_factor(date(2025, 7, 1), &svc("Surgery")), 0.90);
        assert_eq!(adj.seasonal_factor(date(2025, 6, 30), &svc("Surgery")), 1.0);
    }

    #[test]
    fn unknown_services_are_neutral() {
        let table = SeasonalTable::default();
        let adj = SeasonalAdjuster::new(&table);
        assert_eq!(adj.seasonal_factor(date(2025, 1, 1), &svc("Cardiology")), 1.0);
        assert_eq!(adj.seasonal_factor(date(2025, 1, 1), &svc("Urgences")), 1.0);
    }

    #[test]
    fn weekends_are_damped() {
        // 2025-01-15 is a Wednesday.
        assert_eq!(weekday_factor(date(2025, 1, 15)), 1.0);
        assert_eq!(weekday_factor(date(2025, 1, 18)), 0.85);
        assert_eq!(weekday_factor(date(2025, 1, 19)), 0.75);
        assert_eq!(weekday_factor(date(2025, 1, 20)), 1.0);
    }

    #[test]
    fn rules_deserialize_from_configuration() {
        let json = r#"{"Urgences": [{"from_month": 11, "to_month": 2, "multiplier": 1.15}]}"#;
        let table: SeasonalTable = serde_json::from_str(json).unwrap();
        assert_eq!(table.factor(&svc("Urgences"), 12), 1.15);
        assert_eq!(table.factor(&svc("Urgences"), 5), 1.0);
    }
}
