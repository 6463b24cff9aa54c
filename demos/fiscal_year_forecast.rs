use chrono::NaiveDate;
use forecast_engine::*;

fn main() {
    println!("📊 Fiscal Year Forecast Demo\n");

    let today = NaiveDate::from_ymd_opt(2024, 10, 15).unwrap();
    let fiscal_year = ForecastEngine::default().current_fiscal_year(today);
    let periods = compute_periods(fiscal_year, today);
    let baseline = periods.baseline_months();
    let forecast = periods.forecast_months();
    let history = periods.history_months();

    println!("📅 Periods for FY{} as of {}:", fiscal_year, today);
    println!(
        "  Baseline: {} to {}",
        periods.baseline.start, periods.baseline.end
    );
    if let Some(actual) = periods.actual {
        println!("  Actual:   {} to {}", actual.start, actual.end);
    }
    if let Some(range) = periods.forecast {
        println!("  Forecast: {} to {}", range.start, range.end);
    }
    println!();

    let mut sales = Line::new("sales", "Sales", LineCategory::Revenue).with_method(
        ForecastMethod::SeasonalPattern {
            percentage_increase: 0.08,
        },
    );
    for (i, month) in history.iter().enumerate() {
        sales
            .actual_months
            .insert(*month, 40_000.0 + 2_500.0 * (i % 6) as f64);
    }

    let lines = vec![
        sales,
        Line::new("cogs", "Cost of sales", LineCategory::CostOfSales).with_method(
            ForecastMethod::DriverBased {
                driver_line_id: "sales".to_string(),
                driver_percentage: 0.35,
            },
        ),
        Line::new("wages", "Wages", LineCategory::OperatingExpenses)
            .with_actuals(baseline.iter().map(|m| (*m, 12_000.0)))
            .with_method(ForecastMethod::StraightLine {
                base_amount: None,
                percentage_increase: 0.04,
            }),
        Line::new("rent", "Rent", LineCategory::OperatingExpenses)
            .with_actuals(baseline.iter().map(|m| (*m, 3_500.0))),
        Line::new("loan", "Loan interest", LineCategory::OtherExpenses).with_method(
            ForecastMethod::GrowthRate {
                growth_rate: -0.01,
                basis: GrowthBasis::MonthOverMonth,
            },
        ),
    ];

    let updated = recalculate_all(&lines, &baseline, &forecast, Some(history.as_slice()));
    let aggregator = StatementAggregator::new(&updated);

    print!("{:<16}", "");
    for month in &forecast {
        print!("{:>10}", month.label());
    }
    println!();
    for line in &updated {
        print!("{:<16}", line.name);
        for month in &forecast {
            print!("{:>10.0}", line.forecast(month));
        }
        println!();
    }
    print!("{:<16}", "Net profit");
    for month in &forecast {
        print!("{:>10.0}", aggregator.net_profit(month, ValueSource::Forecast));
    }
    println!("\n");

    let fy = aggregator.fiscal_year_summary(&periods.month_columns());
    println!("✅ FY{} outlook (actuals to date plus forecast):", fiscal_year);
    println!("  Gross profit: {:.2}", fy.gross_profit);
    println!("  Net profit:   {:.2}", fy.net_profit);
    println!("  Net margin:   {:.1}%", fy.net_margin_pct);

    for issue in driver_diagnostics(&updated) {
        println!("⚠️  {:?}", issue);
    }
}
