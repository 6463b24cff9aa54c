//! # Forecast Engine
//!
//! A library for turning sparse historical monthly actuals into complete
//! forward-looking monthly projections for every line of a profit and loss
//! statement.
//!
//! ## Core Concepts
//!
//! - **Periods**: A target fiscal year is split into a baseline year (the year
//!   before), actual months already closed, and months still to forecast
//! - **Lines**: One statement account each, holding actuals, forecasts and a
//!   chosen forecast method
//! - **Methods**: Straight line, growth rate, seasonal pattern, driver based,
//!   manual, or none
//! - **Drivers**: A driver-based line is a share of another line's forecast, so
//!   lines are evaluated after the lines that drive them
//! - **Purity**: Every operation takes a snapshot of lines and returns a new
//!   one; identical inputs always give identical outputs
//!
//! ## Example
//!
//! ```rust,ignore
//! use forecast_engine::*;
//! use chrono::NaiveDate;
//!
//! let periods = compute_periods(2025, NaiveDate::from_ymd_opt(2024, 10, 15).unwrap());
//! let baseline = periods.baseline_months();
//!
//! let lines = vec![
//!     Line::new("sales", "Sales", LineCategory::Revenue)
//!         .with_actuals(baseline.iter().map(|m| (*m, 1000.0)))
//!         .with_method(ForecastMethod::StraightLine {
//!             base_amount: None,
//!             percentage_increase: 0.1,
//!         }),
//!     Line::new("cogs", "Cost of goods sold", LineCategory::CostOfSales).with_method(
//!         ForecastMethod::DriverBased {
//!             driver_line_id: "sales".to_string(),
//!             driver_percentage: 0.4,
//!         },
//!     ),
//! ];
//!
//! let updated = recalculate_all(
//!     &lines,
//!     &baseline,
//!     &periods.forecast_months(),
//!     Some(periods.history_months().as_slice()),
//! );
//! ```

pub mod aggregator;
pub mod analysis;
pub mod engine;
pub mod error;
pub mod month_key;
pub mod overrides;
pub mod periods;
pub mod resolver;
pub mod schema;
pub mod seasonality;
pub mod utils;

pub use aggregator::{ProfitAndLoss, StatementAggregator, ValueSource};
pub use analysis::{revenue_total, LineAnalyzer};
pub use engine::Forecaster;
pub use error::{ForecastError, Result};
pub use month_key::MonthKey;
pub use overrides::{replace_line, LineEdit, LineEdits};
pub use periods::{
    build_month_columns, last_actual_index, last_baseline_index, MonthColumn, MonthRange,
    PeriodBoundaries,
};
pub use resolver::{driver_diagnostics, DependencyResolver, DriverIssue};
pub use schema::*;
pub use seasonality::{distribute_by_shares, historical_shares};
pub use utils::*;

use chrono::NaiveDate;
use log::{debug, info, warn};

/// Entry point for period calculation and full recalculation under one set of settings.
#[derive(Debug, Clone, Default)]
pub struct ForecastEngine {
    settings: ForecastSettings,
}

impl ForecastEngine {
    pub fn new(settings: ForecastSettings) -> Result<Self> {
        settings.validate()?;
        Ok(Self { settings })
    }

    pub fn settings(&self) -> &ForecastSettings {
        &self.settings
    }

    /// The fiscal year `today` falls in.
    pub fn current_fiscal_year(&self, today: NaiveDate) -> i32 {
        fiscal_year_for_month(MonthKey::from_date(today), self.settings.fiscal_year_end_month)
    }

    pub fn compute_periods(&self, fiscal_year: i32, today: NaiveDate) -> PeriodBoundaries {
        periods::compute_periods(fiscal_year, today, self.settings.fiscal_year_end_month)
    }

    /// Recomputes analysis and forecasts for every line.
    ///
    /// Analysis always uses `baseline_months`. The projection methods look back
    /// over `history_months` when given, otherwise over the baseline. Returned
    /// lines carry forecasts for exactly `forecast_months`; the input is not
    /// modified.
    pub fn recalculate_all(
        &self,
        lines: &[Line],
        baseline_months: &[MonthKey],
        forecast_months: &[MonthKey],
        history_months: Option<&[MonthKey]>,
    ) -> Vec<Line> {
        info!(
            "Recalculating {} lines over {} forecast months",
            lines.len(),
            forecast_months.len()
        );

        let history_months = match history_months {
            Some(months) if !months.is_empty() => months,
            _ => baseline_months,
        };
        debug!(
            "Analysis window has {} months, method history has {}",
            baseline_months.len(),
            history_months.len()
        );

        let analyzer = LineAnalyzer::new(self.settings.trend_threshold_pct);
        let analysed: Vec<Line> = lines
            .iter()
            .map(|line| Line {
                analysis: analyzer.analyze(line, lines, baseline_months),
                ..line.clone()
            })
            .collect();

        for issue in driver_diagnostics(&analysed) {
            warn!("Driver problem: {:?}", issue);
        }

        DependencyResolver::new(
            forecast_months,
            history_months,
            self.settings.resolution,
            self.settings.iteration_cap,
        )
        .resolve(analysed)
    }
}

/// Period boundaries for a July to June fiscal year.
pub fn compute_periods(fiscal_year: i32, today: NaiveDate) -> PeriodBoundaries {
    ForecastEngine::default().compute_periods(fiscal_year, today)
}

pub fn recalculate_all(
    lines: &[Line],
    baseline_months: &[MonthKey],
    forecast_months: &[MonthKey],
    history_months: Option<&[MonthKey]>,
) -> Vec<Line> {
    ForecastEngine::default().recalculate_all(lines, baseline_months, forecast_months, history_months)
}
