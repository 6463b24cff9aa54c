use crate::month_key::MonthKey;
use crate::schema::{Line, LineAnalysis, LineCategory, TrendDirection};
use crate::utils::{finite_or_zero, sum_over};

pub struct LineAnalyzer {
    stable_threshold_pct: f64,
}

impl Default for LineAnalyzer {
    fn default() -> Self {
        Self::new(5.0)
    }
}

impl LineAnalyzer {
    pub fn new(stable_threshold_pct: f64) -> Self {
        Self {
            stable_threshold_pct,
        }
    }

    /// Metrics for `line` over `window`, normally the baseline year.
    ///
    /// Returns `None` for an empty window. Ratios whose denominator is zero are
    /// left out rather than reported as NaN.
    pub fn analyze(&self, line: &Line, lines: &[Line], window: &[MonthKey]) -> Option<LineAnalysis> {
        if window.is_empty() {
            return None;
        }

        let total = sum_over(&line.actual_months, window);
        let average_per_month = finite_or_zero(total / window.len() as f64);
        let total_revenue = revenue_total(lines, window);

        let mut analysis = LineAnalysis {
            total,
            average_per_month,
            pct_of_total_revenue: None,
            pct_of_revenue: None,
            trend_direction: None,
            trend_percentage: None,
        };

        match line.category {
            LineCategory::Revenue => {
                analysis.pct_of_total_revenue = share_of(total, total_revenue);
            }
            LineCategory::CostOfSales | LineCategory::OperatingExpenses => {
                analysis.pct_of_revenue = share_of(total, total_revenue);
                if let Some((direction, pct)) = self.trend(line, window) {
                    analysis.trend_direction = Some(direction);
                    analysis.trend_percentage = Some(pct);
                }
            }
            LineCategory::OtherIncome | LineCategory::OtherExpenses => {}
        }

        Some(analysis)
    }

    /// Compares the mean of the second half of the window with the first half.
    fn trend(&self, line: &Line, window: &[MonthKey]) -> Option<(TrendDirection, f64)> {
        let (first, second) = window.split_at(window.len() / 2);
        if first.is_empty() || second.is_empty() {
            return None;
        }

        let first_avg = sum_over(&line.actual_months, first) / first.len() as f64;
        let second_avg = sum_over(&line.actual_months, second) / second.len() as f64;
        if first_avg == 0.0 {
            return None;
        }

        let change_pct = 100.0 * (second_avg - first_avg) / first_avg;
        if !change_pct.is_finite() {
            return None;
        }

        let direction = if change_pct.abs() < self.stable_threshold_pct {
            TrendDirection::Stable
        } else if change_pct > 0.0 {
            TrendDirection::Up
        } else {
            TrendDirection::Down
        };
        Some((direction, change_pct))
    }
}

/// Sum of actuals across every Revenue line over `window`.
pub fn revenue_total(lines: &[Line], window: &[MonthKey]) -> f64 {
    lines
        .iter()
        .filter(|l| l.category == LineCategory::Revenue)
        .map(|l| sum_over(&l.actual_months, window))
        .sum()
}

fn share_of(part: f64, whole: f64) -> Option<f64> {
    if whole == 0.0 {
        return None;
    }
    let pct = 100.0 * part / whole;
    pct.is_finite().then_some(pct)
}
