use crate::error::{ForecastError, Result};
use crate::month_key::MonthKey;
use crate::utils::validate_fiscal_year_end_month;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum LineCategory {
    #[schemars(description = "Revenue from sales of goods or services")]
    Revenue,

    #[schemars(description = "Direct costs attributable to the goods or services sold")]
    CostOfSales,

    #[schemars(description = "Operating expenses like salaries, rent, marketing, utilities")]
    OperatingExpenses,

    #[schemars(description = "Non-operating income such as interest income or grants")]
    OtherIncome,

    #[schemars(description = "Non-operating expenses such as interest or depreciation")]
    OtherExpenses,
}

impl LineCategory {
    pub const ALL: [LineCategory; 5] = [
        LineCategory::Revenue,
        LineCategory::CostOfSales,
        LineCategory::OperatingExpenses,
        LineCategory::OtherIncome,
        LineCategory::OtherExpenses,
    ];

    /// Sign this category carries in the net profit rollup.
    pub fn rollup_sign(&self) -> f64 {
        match self {
            LineCategory::Revenue | LineCategory::OtherIncome => 1.0,
            LineCategory::CostOfSales
            | LineCategory::OperatingExpenses
            | LineCategory::OtherExpenses => -1.0,
        }
    }

    pub fn is_expense(&self) -> bool {
        self.rollup_sign() < 0.0
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum GrowthBasis {
    #[schemars(
        description = "Compound from the last actual value: each forecast month is the previous forecast month times (1 + growth_rate)."
    )]
    MonthOverMonth,

    #[schemars(
        description = "Compound from the same month a year earlier: the matching historical actual, or the forecast twelve months before."
    )]
    YearOverYear,
}

impl Default for GrowthBasis {
    fn default() -> Self {
        Self::MonthOverMonth
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
#[serde(rename_all = "PascalCase", tag = "method")]
pub enum ForecastMethod {
    #[schemars(description = "Every forecast month is zero.")]
    None,

    #[schemars(
        description = "A flat monthly amount: base_amount (or the historical monthly average) times (1 + percentage_increase)."
    )]
    StraightLine {
        #[serde(default)]
        #[schemars(description = "Monthly amount to project. Defaults to the historical monthly average.")]
        base_amount: Option<f64>,
        #[serde(default)]
        #[schemars(description = "Uplift as a fraction, e.g. 0.1 for +10%.")]
        percentage_increase: f64,
    },

    #[schemars(description = "Compounding growth from historical actuals.")]
    GrowthRate {
        #[schemars(description = "Growth per period as a fraction, e.g. 0.05 for +5%.")]
        growth_rate: f64,
        #[serde(default)]
        basis: GrowthBasis,
    },

    #[schemars(
        description = "Reproduces the historical shape of the year, scaled to the historical average times (1 + percentage_increase)."
    )]
    SeasonalPattern {
        #[serde(default)]
        #[schemars(description = "Uplift as a fraction, e.g. 0.1 for +10%.")]
        percentage_increase: f64,
    },

    #[schemars(description = "A fixed share of another line's forecast, month by month.")]
    DriverBased {
        #[schemars(description = "Id of the line whose forecast drives this one.")]
        driver_line_id: String,
        #[schemars(description = "Share of the driver as a fraction, e.g. 0.25 for 25%.")]
        driver_percentage: f64,
    },

    #[schemars(description = "User-entered forecast values are kept exactly as they are.")]
    Manual,

    /// Any method name this version does not know. Projected as the default straight line.
    #[serde(other)]
    #[schemars(skip)]
    Unrecognized,
}

impl ForecastMethod {
    pub fn driver_line_id(&self) -> Option<&str> {
        match self {
            ForecastMethod::DriverBased { driver_line_id, .. } => Some(driver_line_id.as_str()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum TrendDirection {
    Up,
    Down,
    Stable,
}

/// Descriptive metrics for one line over the analysis window.
///
/// Always derived from `actual_months`; callers may drop and recompute it at will.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct LineAnalysis {
    pub total: f64,
    pub average_per_month: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Share of total revenue in percent. Revenue lines only.")]
    pub pct_of_total_revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schemars(description = "Size relative to total revenue in percent. Cost of Sales and Operating Expenses lines only.")]
    pub pct_of_revenue: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_direction: Option<TrendDirection>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trend_percentage: Option<f64>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct Line {
    #[schemars(description = "Stable identifier. Driver references and edits resolve lines by this id.")]
    pub id: String,

    #[schemars(description = "The account name as it appears in the profit and loss statement")]
    pub name: String,

    pub category: LineCategory,

    #[serde(default)]
    #[schemars(description = "Historical values keyed by YYYY-MM. Never written by the engine.")]
    pub actual_months: BTreeMap<MonthKey, f64>,

    #[serde(default)]
    #[schemars(description = "Projected values keyed by YYYY-MM. Replaced wholesale on every recalculation.")]
    pub forecast_months: BTreeMap<MonthKey, f64>,

    #[serde(default)]
    #[schemars(description = "Projection strategy. Absent means a straight line at the historical average.")]
    pub forecast_method: Option<ForecastMethod>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub analysis: Option<LineAnalysis>,
}

impl Line {
    pub fn new(id: impl Into<String>, name: impl Into<String>, category: LineCategory) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            category,
            actual_months: BTreeMap::new(),
            forecast_months: BTreeMap::new(),
            forecast_method: None,
            analysis: None,
        }
    }

    pub fn with_actual(mut self, month: MonthKey, value: f64) -> Self {
        self.actual_months.insert(month, value);
        self
    }

    pub fn with_actuals<I>(mut self, values: I) -> Self
    where
        I: IntoIterator<Item = (MonthKey, f64)>,
    {
        self.actual_months.extend(values);
        self
    }

    pub fn with_forecast(mut self, month: MonthKey, value: f64) -> Self {
        self.forecast_months.insert(month, value);
        self
    }

    pub fn with_method(mut self, method: ForecastMethod) -> Self {
        self.forecast_method = Some(method);
        self
    }

    pub fn actual(&self, month: &MonthKey) -> f64 {
        self.actual_months.get(month).copied().unwrap_or(0.0)
    }

    pub fn forecast(&self, month: &MonthKey) -> f64 {
        self.forecast_months.get(month).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ResolutionStrategy {
    #[schemars(
        description = "Evaluate driver-based lines after their drivers. Lines caught in a driver cycle fall back to capped fixed-point sweeps."
    )]
    DependencyGraph,

    #[schemars(
        description = "Recompute every line iteration_cap times, each sweep reading the previous sweep's forecasts. No cycle detection."
    )]
    FixedPointSweep,
}

impl Default for ResolutionStrategy {
    fn default() -> Self {
        Self::DependencyGraph
    }
}

fn default_fiscal_year_end_month() -> u32 {
    6
}

fn default_iteration_cap() -> usize {
    5
}

fn default_trend_threshold_pct() -> f64 {
    5.0
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, JsonSchema)]
pub struct ForecastSettings {
    #[serde(default = "default_fiscal_year_end_month")]
    #[schemars(
        description = "The month when the fiscal year ends (1 = January, 12 = December). For a July-June fiscal year, use 6."
    )]
    pub fiscal_year_end_month: u32,

    #[serde(default = "default_iteration_cap")]
    #[schemars(description = "Maximum number of recompute sweeps used to settle driver-based lines.")]
    pub iteration_cap: usize,

    #[serde(default = "default_trend_threshold_pct")]
    #[schemars(description = "Half-on-half change in percent below which a trend is reported as stable.")]
    pub trend_threshold_pct: f64,

    #[serde(default)]
    pub resolution: ResolutionStrategy,
}

impl Default for ForecastSettings {
    fn default() -> Self {
        Self {
            fiscal_year_end_month: default_fiscal_year_end_month(),
            iteration_cap: default_iteration_cap(),
            trend_threshold_pct: default_trend_threshold_pct(),
            resolution: ResolutionStrategy::default(),
        }
    }
}

impl ForecastSettings {
    pub fn validate(&self) -> Result<()> {
        validate_fiscal_year_end_month(self.fiscal_year_end_month)?;
        if self.iteration_cap == 0 {
            return Err(ForecastError::InvalidIterationCap(self.iteration_cap));
        }
        if !self.trend_threshold_pct.is_finite() || self.trend_threshold_pct < 0.0 {
            return Err(ForecastError::InvalidThreshold(self.trend_threshold_pct));
        }
        Ok(())
    }
}

/// A full forecast document: settings plus every statement line.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ForecastModel {
    #[serde(default)]
    pub settings: ForecastSettings,

    #[schemars(description = "Every profit and loss line, in display order.")]
    pub lines: Vec<Line>,
}

impl ForecastModel {
    pub fn generate_json_schema() -> schemars::schema::RootSchema {
        schemars::schema_for!(ForecastModel)
    }

    pub fn schema_as_json() -> std::result::Result<String, serde_json::Error> {
        let schema = Self::generate_json_schema();
        serde_json::to_string_pretty(&schema)
    }

    pub fn from_json(json: &str) -> Result<Self> {
        let model: ForecastModel = serde_json::from_str(json)?;
        model.settings.validate()?;
        Ok(model)
    }
}
