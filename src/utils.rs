use crate::error::{ForecastError, Result};
use crate::month_key::MonthKey;
use std::collections::BTreeMap;

pub fn validate_fiscal_year_end_month(month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(ForecastError::InvalidFiscalYearEndMonth(month));
    }
    Ok(())
}

/// First and last month of fiscal year `fiscal_year`.
///
/// A fiscal year is named after the calendar year it ends in, so with a June
/// year end FY2025 runs from 2024-07 to 2025-06. `fiscal_year_end_month` is
/// expected to be validated already.
pub fn fiscal_year_bounds(fiscal_year: i32, fiscal_year_end_month: u32) -> (MonthKey, MonthKey) {
    let end = MonthKey::january(fiscal_year).add_months(fiscal_year_end_month as i32 - 1);
    let start = end.add_months(-11);
    (start, end)
}

/// The fiscal year a month belongs to.
pub fn fiscal_year_for_month(month: MonthKey, fiscal_year_end_month: u32) -> i32 {
    // If we're past the fiscal year end month, the FY ends next calendar year
    if month.month() <= fiscal_year_end_month {
        month.year()
    } else {
        month.year() + 1
    }
}

/// Replaces NaN and infinities with zero.
pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Sums `values` over `months`, treating absent months as zero.
pub fn sum_over(values: &BTreeMap<MonthKey, f64>, months: &[MonthKey]) -> f64 {
    months
        .iter()
        .map(|m| values.get(m).copied().unwrap_or(0.0))
        .sum()
}

/// Parses a period string in the format "YYYY-MM" or "YYYY-MM:YYYY-MM"
/// Returns every month in the period, in order
pub fn parse_period_string(period: &str) -> Result<Vec<MonthKey>> {
    let parts: Vec<&str> = period.split(':').collect();

    match parts.len() {
        1 => {
            let month: MonthKey = parts[0].parse()?;
            Ok(vec![month])
        }
        2 => {
            let start: MonthKey = parts[0].parse()?;
            let end: MonthKey = parts[1].parse()?;
            if end < start {
                return Err(ForecastError::InvalidPeriod(format!(
                    "Period '{}' ends ({}) before it starts ({})",
                    period, end, start
                )));
            }
            Ok(MonthKey::range_inclusive(start, end))
        }
        _ => Err(ForecastError::InvalidPeriod(format!(
            "Invalid period format: {}. Expected 'YYYY-MM' or 'YYYY-MM:YYYY-MM'",
            period
        ))),
    }
}
