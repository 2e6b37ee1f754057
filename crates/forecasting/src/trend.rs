//! Signed relative trend between the oldest and most recent parts of the history window.

use careforecast_core::HistoricalWindow;

use crate::baseline::BaselineEstimator;

#[derive(Debug, Copy, Clone)]
pub struct TrendCalculator<'a> {
    estimator: BaselineEstimator<'a>,
    sub_window_months: u32,
}

impl<'a> TrendCalculator<'a> {
    pub fn new(estimator: BaselineEstimator<'a>, sub_window_months: u32) -> Self {
        Self {
            estimator,
            sub_window_months,
        }
    }

    /// `(recent - older) / older`, or `0.0` when the older average is not positive.
    pub async fn trend(&self, window: &HistoricalWindow) -> f64 {
        let recent = window.trailing(self.sub_window_months);
        let older = window.leading(self.sub_window_months);
        let (recent_avg, older_avg) =
            futures::join!(self.estimator.estimate(&recent), self.estimator.estimate(&older));
        relative_change(recent_avg, older_avg)
    }
}

pub fn relative_change(recent: f64, older: f64) -> f64 {
    if older > 0.0 {
        (recent - older) / older
    } else {
        0.0
    }
}
