//! Structural adjustments from live operational state: staffing, investment, alerts.

use std::time::Duration;

use chrono::{Months, NaiveDate, NaiveDateTime, NaiveTime};
use serde::Serialize;

use careforecast_core::ServiceName;

use crate::jitter::JitterSource;
use crate::provider::{bounded, ForecastProviders};

/// Staff at or below this count contribute nothing.
pub const STAFFING_BASELINE: u64 = 2;
pub const STAFFING_STEP: f64 = 0.02;
pub const STAFFING_CAP: f64 = 0.20;

/// Currency units per 1% investment impact.
pub const INVESTMENT_UNIT: f64 = 50_000.0;
pub const INVESTMENT_STEP: f64 = 0.01;
pub const INVESTMENT_CAP: f64 = 0.15;

pub const ALERT_STEP: f64 = 0.03;
pub const ALERT_CAP: f64 = 0.15;

pub const BASE_CONFIDENCE: f64 = 85.0;
pub const MAX_CONFIDENCE: f64 = 95.0;
const STAFFING_CONFIDENCE_BONUS: f64 = 2.0;
const INVESTMENT_CONFIDENCE_BONUS: f64 = 3.0;

pub fn staffing_impact(active_staff: u64) -> f64 {
    (active_staff.saturating_sub(STAFFING_BASELINE) as f64 * STAFFING_STEP).min(STAFFING_CAP)
}

pub fn investment_impact(total_amount: f64) -> f64 {
    if !total_amount.is_finite() || total_amount <= 0.0 {
        return 0.0;
    }
    (total_amount / INVESTMENT_UNIT * INVESTMENT_STEP).min(INVESTMENT_CAP)
}

pub fn alert_impact(open_alerts: u64) -> f64 {
    (open_alerts as f64 * ALERT_STEP).min(ALERT_CAP)
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize)]
pub struct DynamicFactors {
    pub multiplier: f64,
    /// Final confidence score, already clamped to `[0, MAX_CONFIDENCE]`.
    pub confidence_bonus: f64,
    pub staffing_impact: f64,
    pub investment_impact: f64,
    pub alert_impact: f64,
}

impl DynamicFactors {
    pub fn from_impacts(staffing_impact: f64, investment_impact: f64, alert_impact: f64, jitter: f64) -> Self {
        let mut confidence = BASE_CONFIDENCE + jitter;
        if staffing_impact > 0.0 {
            confidence += STAFFING_CONFIDENCE_BONUS;
        }
        if investment_impact > 0.0 {
            confidence += INVESTMENT_CONFIDENCE_BONUS;
        }

        Self {
            multiplier: 1.0 + staffing_impact + investment_impact - alert_impact,
            confidence_bonus: confidence.clamp(0.0, MAX_CONFIDENCE),
            staffing_impact,
            investment_impact,
            alert_impact,
        }
    }

    /// No structural adjustment; confidence at its base.
    pub fn neutral() -> Self {
        Self::from_impacts(0.0, 0.0, 0.0, 0.0)
    }
}

pub struct DynamicFactorEngine<'a> {
    providers: &'a ForecastProviders,
    jitter: &'a dyn JitterSource,
    timeout: Duration,
    investment_lookback_months: u32,
}

impl<'a> DynamicFactorEngine<'a> {
    pub fn new(
        providers: &'a ForecastProviders,
        jitter: &'a dyn JitterSource,
        timeout: Duration,
        investment_lookback_months: u32,
    ) -> Self {
        Self {
            providers,
            jitter,
            timeout,
            investment_lookback_months,
        }
    }

    /// Each read is independent: a failed read zeroes only its own impact.
    ///
    /// `today` anchors the investment lookback; staffing and alerts are always
    /// current state.
    pub async fn factors(&self, service: &ServiceName, today: NaiveDate) -> DynamicFactors {
        let since = investment_cutoff(today, self.investment_lookback_months);
        let p = self.providers;

        let (staff, investments, alerts) = futures::join!(
            bounded("active_staff", service, self.timeout, p.staffing.active_count(service)),
            bounded(
                "recent_investments",
                service,
                self.timeout,
                p.investments.recent_investments(service, since)
            ),
            bounded("open_alerts", service, self.timeout, p.alerts.open_alert_count(service)),
        );

        let total_invested = investments.map_or(0.0, |amounts| amounts.iter().sum::<f64>().max(0.0));

        DynamicFactors::from_impacts(
            staff.map_or(0.0, staffing_impact),
            investment_impact(total_invested),
            alerts.map_or(0.0, alert_impact),
            self.jitter.next_jitter(),
        )
    }
}

/// Midnight `months` before `anchor`, saturating at the earliest representable date.
pub fn investment_cutoff(anchor: NaiveDate, months: u32) -> NaiveDateTime {
    anchor
        .checked_sub_months(Months::new(months))
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}
