//! Fiscal-year period boundaries and the month columns built from them.

use crate::month_key::MonthKey;
use crate::utils::fiscal_year_bounds;
use chrono::NaiveDate;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An inclusive run of consecutive months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MonthRange {
    pub start: MonthKey,
    pub end: MonthKey,
}

impl MonthRange {
    pub fn new(start: MonthKey, end: MonthKey) -> Self {
        Self { start, end }
    }

    pub fn months(&self) -> Vec<MonthKey> {
        MonthKey::range_inclusive(self.start, self.end)
    }

    pub fn contains(&self, month: MonthKey) -> bool {
        self.start <= month && month <= self.end
    }
}

/// Baseline, actual (year to date) and forecast segments for one target fiscal year.
///
/// `actual` and `forecast` together cover the target year exactly once. Either
/// may be empty: before the year starts there are no actuals, and once it has
/// ended there is nothing left to forecast.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct PeriodBoundaries {
    pub fiscal_year: i32,
    pub baseline: MonthRange,
    pub actual: Option<MonthRange>,
    pub forecast: Option<MonthRange>,
    pub is_rolling: bool,
}

impl PeriodBoundaries {
    pub fn baseline_months(&self) -> Vec<MonthKey> {
        self.baseline.months()
    }

    pub fn actual_months(&self) -> Vec<MonthKey> {
        self.actual.map(|r| r.months()).unwrap_or_default()
    }

    pub fn forecast_months(&self) -> Vec<MonthKey> {
        self.forecast.map(|r| r.months()).unwrap_or_default()
    }

    /// Trailing history for the projection methods: the baseline year followed
    /// by whatever actuals the target year already has.
    pub fn history_months(&self) -> Vec<MonthKey> {
        let mut months = self.baseline_months();
        months.extend(self.actual_months());
        months
    }

    pub fn month_columns(&self) -> Vec<MonthColumn> {
        build_month_columns(Some(self.baseline), self.actual, self.forecast)
    }
}

/// Splits fiscal year `fiscal_year` into baseline, actual and forecast months as seen on `today`.
pub fn compute_periods(
    fiscal_year: i32,
    today: NaiveDate,
    fiscal_year_end_month: u32,
) -> PeriodBoundaries {
    let (fy_start, fy_end) = fiscal_year_bounds(fiscal_year, fiscal_year_end_month);
    let baseline = MonthRange::new(fy_start.add_months(-12), fy_end.add_months(-12));
    let current = MonthKey::from_date(today);

    let (actual, forecast, is_rolling) = if current < fy_start {
        (None, Some(MonthRange::new(fy_start, fy_end)), false)
    } else if current > fy_end {
        (Some(MonthRange::new(fy_start, fy_end)), None, false)
    } else {
        // The current month is still open, so actuals stop at the month before it
        let last_complete = current.prev();
        let actual = if last_complete >= fy_start {
            Some(MonthRange::new(fy_start, last_complete))
        } else {
            None
        };
        (actual, Some(MonthRange::new(current, fy_end)), true)
    };

    PeriodBoundaries {
        fiscal_year,
        baseline,
        actual,
        forecast,
        is_rolling,
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct MonthColumn {
    pub key: MonthKey,
    pub label: String,
    pub is_actual: bool,
    pub is_forecast: bool,
    pub is_baseline: bool,
}

/// Lays out table columns: baseline months, then actual months, then forecast months.
pub fn build_month_columns(
    baseline: Option<MonthRange>,
    actual: Option<MonthRange>,
    forecast: Option<MonthRange>,
) -> Vec<MonthColumn> {
    let column = |key: MonthKey, is_baseline: bool, is_actual: bool, is_forecast: bool| MonthColumn {
        key,
        label: key.label(),
        is_actual,
        is_forecast,
        is_baseline,
    };

    let mut columns = Vec::new();
    if let Some(range) = baseline {
        columns.extend(range.months().into_iter().map(|k| column(k, true, false, false)));
    }
    if let Some(range) = actual {
        columns.extend(range.months().into_iter().map(|k| column(k, false, true, false)));
    }
    if let Some(range) = forecast {
        columns.extend(range.months().into_iter().map(|k| column(k, false, false, true)));
    }
    columns
}

/// Index of the last column in the leading baseline block, `None` when there is no baseline.
pub fn last_baseline_index(columns: &[MonthColumn]) -> Option<usize> {
    columns
        .iter()
        .take_while(|c| c.is_baseline)
        .count()
        .checked_sub(1)
}

/// Index of the last actual column, where the actual/forecast separator is drawn.
pub fn last_actual_index(columns: &[MonthColumn]) -> Option<usize> {
    columns.iter().rposition(|c| c.is_actual)
}
