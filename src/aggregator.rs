use crate::month_key::MonthKey;
use crate::periods::MonthColumn;
use crate::schema::{Line, LineCategory};
use crate::utils::finite_or_zero;
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "PascalCase")]
pub enum ValueSource {
    Actual,
    Forecast,
}

impl ValueSource {
    /// Baseline and actual columns read actuals; forecast columns read forecasts.
    pub fn for_column(column: &MonthColumn) -> Self {
        if column.is_forecast {
            ValueSource::Forecast
        } else {
            ValueSource::Actual
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct ProfitAndLoss {
    pub category_totals: BTreeMap<LineCategory, f64>,
    pub gross_profit: f64,
    pub net_profit: f64,
    pub gross_margin_pct: f64,
    pub net_margin_pct: f64,
}

/// Statement totals over a line collection. Everything is recomputed from the
/// lines on each call; nothing is cached.
pub struct StatementAggregator<'a> {
    lines: &'a [Line],
}

impl<'a> StatementAggregator<'a> {
    pub fn new(lines: &'a [Line]) -> Self {
        Self { lines }
    }

    fn value(line: &Line, month: &MonthKey, source: ValueSource) -> f64 {
        match source {
            ValueSource::Actual => line.actual(month),
            ValueSource::Forecast => line.forecast(month),
        }
    }

    pub fn category_total(&self, category: LineCategory, month: &MonthKey, source: ValueSource) -> f64 {
        self.lines
            .iter()
            .filter(|l| l.category == category)
            .map(|l| Self::value(l, month, source))
            .sum()
    }

    pub fn gross_profit(&self, month: &MonthKey, source: ValueSource) -> f64 {
        self.category_total(LineCategory::Revenue, month, source)
            - self.category_total(LineCategory::CostOfSales, month, source)
    }

    pub fn net_profit(&self, month: &MonthKey, source: ValueSource) -> f64 {
        LineCategory::ALL
            .iter()
            .map(|c| c.rollup_sign() * self.category_total(*c, month, source))
            .sum()
    }

    pub fn gross_margin(&self, month: &MonthKey, source: ValueSource) -> f64 {
        margin(
            self.gross_profit(month, source),
            self.category_total(LineCategory::Revenue, month, source),
        )
    }

    pub fn net_margin(&self, month: &MonthKey, source: ValueSource) -> f64 {
        margin(
            self.net_profit(month, source),
            self.category_total(LineCategory::Revenue, month, source),
        )
    }

    pub fn month_summary(&self, month: &MonthKey, source: ValueSource) -> ProfitAndLoss {
        self.summary(|category| self.category_total(category, month, source))
    }

    /// Category total summed over `months`, e.g. a fiscal year to date.
    pub fn category_total_over(&self, category: LineCategory, months: &[MonthKey], source: ValueSource) -> f64 {
        months
            .iter()
            .map(|m| self.category_total(category, m, source))
            .sum()
    }

    pub fn gross_profit_over(&self, months: &[MonthKey], source: ValueSource) -> f64 {
        months.iter().map(|m| self.gross_profit(m, source)).sum()
    }

    pub fn net_profit_over(&self, months: &[MonthKey], source: ValueSource) -> f64 {
        months.iter().map(|m| self.net_profit(m, source)).sum()
    }

    pub fn period_summary(&self, months: &[MonthKey], source: ValueSource) -> ProfitAndLoss {
        self.summary(|category| self.category_total_over(category, months, source))
    }

    /// Category total across table columns, reading actuals or forecasts per column.
    pub fn column_total(&self, category: LineCategory, columns: &[MonthColumn]) -> f64 {
        columns
            .iter()
            .map(|c| self.category_total(category, &c.key, ValueSource::for_column(c)))
            .sum()
    }

    /// Full-year figures for the target year: actuals so far plus the forecast
    /// for the rest. Baseline columns are ignored.
    pub fn fiscal_year_summary(&self, columns: &[MonthColumn]) -> ProfitAndLoss {
        let current: Vec<MonthColumn> = columns.iter().filter(|c| !c.is_baseline).cloned().collect();
        self.summary(|category| self.column_total(category, &current))
    }

    fn summary<F>(&self, total_for: F) -> ProfitAndLoss
    where
        F: Fn(LineCategory) -> f64,
    {
        let category_totals: BTreeMap<LineCategory, f64> =
            LineCategory::ALL.iter().map(|c| (*c, total_for(*c))).collect();
        let total = |c: LineCategory| category_totals.get(&c).copied().unwrap_or(0.0);

        let revenue = total(LineCategory::Revenue);
        let gross_profit = revenue - total(LineCategory::CostOfSales);
        let net_profit = gross_profit - total(LineCategory::OperatingExpenses)
            + total(LineCategory::OtherIncome)
            - total(LineCategory::OtherExpenses);

        ProfitAndLoss {
            gross_margin_pct: margin(gross_profit, revenue),
            net_margin_pct: margin(net_profit, revenue),
            category_totals,
            gross_profit,
            net_profit,
        }
    }
}

/// Profit as a percentage of revenue; zero when there is no revenue.
fn margin(profit: f64, revenue: f64) -> f64 {
    if revenue == 0.0 {
        return 0.0;
    }
    finite_or_zero(100.0 * profit / revenue)
}
