use crate::month_key::MonthKey;
use crate::schema::{ForecastMethod, GrowthBasis, Line};
use crate::seasonality::{distribute_by_shares, historical_shares};
use crate::utils::finite_or_zero;
use log::debug;
use std::collections::BTreeMap;

/// Applies a line's forecast method over the requested forecast months.
///
/// `lines` is the snapshot driver-based lines read their drivers from.
/// `history_months` is the trailing window the growth and seasonal methods
/// work from; it normally covers the baseline year plus any actuals of the
/// current year.
pub struct Forecaster<'a> {
    lines: &'a [Line],
    forecast_months: &'a [MonthKey],
    history_months: &'a [MonthKey],
}

impl<'a> Forecaster<'a> {
    pub fn new(
        lines: &'a [Line],
        forecast_months: &'a [MonthKey],
        history_months: &'a [MonthKey],
    ) -> Self {
        Self {
            lines,
            forecast_months,
            history_months,
        }
    }

    /// Forecast values for exactly the requested months. Never NaN or infinite.
    pub fn forecast_line(&self, line: &Line) -> BTreeMap<MonthKey, f64> {
        let values = match &line.forecast_method {
            Some(ForecastMethod::None) => vec![0.0; self.forecast_months.len()],
            Some(ForecastMethod::StraightLine {
                base_amount,
                percentage_increase,
            }) => self.straight_line(line, *base_amount, *percentage_increase),
            Some(ForecastMethod::GrowthRate {
                growth_rate,
                basis: GrowthBasis::MonthOverMonth,
            }) => self.month_over_month(line, *growth_rate),
            Some(ForecastMethod::GrowthRate {
                growth_rate,
                basis: GrowthBasis::YearOverYear,
            }) => self.year_over_year(line, *growth_rate),
            Some(ForecastMethod::SeasonalPattern {
                percentage_increase,
            }) => self.seasonal_pattern(line, *percentage_increase),
            Some(ForecastMethod::DriverBased {
                driver_line_id,
                driver_percentage,
            }) => self.driver_based(line, driver_line_id, *driver_percentage),
            Some(ForecastMethod::Manual) => self
                .forecast_months
                .iter()
                .map(|m| line.forecast(m))
                .collect(),
            Some(ForecastMethod::Unrecognized) | None => self.straight_line(line, None, 0.0),
        };

        self.forecast_months
            .iter()
            .zip(values)
            .map(|(month, value)| (*month, finite_or_zero(value)))
            .collect()
    }

    fn straight_line(&self, line: &Line, base_amount: Option<f64>, percentage_increase: f64) -> Vec<f64> {
        let average = line
            .analysis
            .as_ref()
            .map(|a| a.average_per_month)
            .unwrap_or(0.0);
        let amount = base_amount.unwrap_or(average) * (1.0 + percentage_increase);
        vec![amount; self.forecast_months.len()]
    }

    fn month_over_month(&self, line: &Line, growth_rate: f64) -> Vec<f64> {
        let mut previous = self.last_actual(line);
        self.forecast_months
            .iter()
            .map(|_| {
                previous = finite_or_zero(previous * (1.0 + growth_rate));
                previous
            })
            .collect()
    }

    fn year_over_year(&self, line: &Line, growth_rate: f64) -> Vec<f64> {
        let mut values: Vec<f64> = Vec::with_capacity(self.forecast_months.len());
        for i in 0..self.forecast_months.len() {
            let base = match self.history_months.get(i) {
                Some(month) => line.actual(month),
                None if i >= 12 => values[i - 12],
                None => 0.0,
            };
            values.push(finite_or_zero(base * (1.0 + growth_rate)));
        }
        values
    }

    fn seasonal_pattern(&self, line: &Line, percentage_increase: f64) -> Vec<f64> {
        let history: Vec<f64> = self.history_months.iter().map(|m| line.actual(m)).collect();
        if history.is_empty() {
            return vec![0.0; self.forecast_months.len()];
        }

        let total: f64 = history.iter().sum();
        let monthly_average = total / history.len() as f64;
        let forecast_total =
            monthly_average * self.forecast_months.len() as f64 * (1.0 + percentage_increase);

        distribute_by_shares(
            forecast_total,
            &historical_shares(&history),
            self.forecast_months.len(),
        )
    }

    fn driver_based(&self, line: &Line, driver_line_id: &str, driver_percentage: f64) -> Vec<f64> {
        match self.lines.iter().find(|l| l.id == driver_line_id) {
            Some(driver) => self
                .forecast_months
                .iter()
                .map(|m| driver.forecast(m) * driver_percentage)
                .collect(),
            None => {
                debug!(
                    "Line '{}' references missing driver '{}'; forecasting zero",
                    line.id, driver_line_id
                );
                vec![0.0; self.forecast_months.len()]
            }
        }
    }

    /// Latest recorded actual within the history window, or zero.
    fn last_actual(&self, line: &Line) -> f64 {
        self.history_months
            .iter()
            .rev()
            .find_map(|m| line.actual_months.get(m).copied())
            .unwrap_or(0.0)
    }
}
