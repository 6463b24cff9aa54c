use chrono::NaiveDate;
use forecast_engine::*;

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

fn straight_line(percentage_increase: f64) -> ForecastMethod {
    ForecastMethod::StraightLine {
        base_amount: None,
        percentage_increase,
    }
}

fn driver(id: &str, pct: f64) -> ForecastMethod {
    ForecastMethod::DriverBased {
        driver_line_id: id.to_string(),
        driver_percentage: pct,
    }
}

/// A small cafe: two revenue streams, a driven cost of sales line, and a
/// spread of overheads, with a year of baseline history and a quarter of YTD.
fn cafe_lines(periods: &PeriodBoundaries) -> Vec<Line> {
    let baseline = periods.baseline_months();
    let ytd = periods.actual_months();

    let mut coffee = Line::new("coffee", "Coffee sales", LineCategory::Revenue)
        .with_method(ForecastMethod::SeasonalPattern {
            percentage_increase: 0.05,
        });
    for (i, m) in baseline.iter().enumerate() {
        // Busy winter (Jun-Aug), quiet summer
        let value = match m.month() {
            6..=8 => 18_000.0,
            12 | 1 => 9_000.0,
            _ => 12_000.0 + i as f64 * 100.0,
        };
        coffee.actual_months.insert(*m, value);
    }
    for m in &ytd {
        coffee.actual_months.insert(*m, 17_500.0);
    }

    let catering = Line::new("catering", "Catering", LineCategory::Revenue)
        .with_actuals(baseline.iter().map(|m| (*m, 3_000.0)))
        .with_actuals(ytd.iter().map(|m| (*m, 3_400.0)))
        .with_method(ForecastMethod::GrowthRate {
            growth_rate: 0.02,
            basis: GrowthBasis::MonthOverMonth,
        });

    let beans = Line::new("beans", "Coffee beans & milk", LineCategory::CostOfSales)
        .with_actuals(baseline.iter().map(|m| (*m, 4_200.0)))
        .with_method(driver("coffee", 0.3));

    let wages = Line::new("wages", "Wages", LineCategory::OperatingExpenses)
        .with_actuals(baseline.iter().enumerate().map(|(i, m)| {
            (*m, if i < 6 { 8_000.0 } else { 9_000.0 })
        }))
        .with_method(straight_line(0.03));

    let rent = Line::new("rent", "Rent", LineCategory::OperatingExpenses)
        .with_actuals(baseline.iter().map(|m| (*m, 2_500.0)))
        .with_method(ForecastMethod::StraightLine {
            base_amount: Some(2_750.0),
            percentage_increase: 0.0,
        });

    let interest = Line::new("interest", "Interest received", LineCategory::OtherIncome)
        .with_actuals(baseline.iter().map(|m| (*m, 25.0)));

    let depreciation = Line::new("depreciation", "Depreciation", LineCategory::OtherExpenses)
        .with_method(ForecastMethod::Manual)
        .with_actuals(baseline.iter().map(|m| (*m, 400.0)))
        .with_forecast(periods.forecast_months()[0], 400.0);

    vec![coffee, catering, beans, wages, rent, interest, depreciation]
}

#[test]
fn test_cafe_full_year_forecast() {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let baseline = periods.baseline_months();
    let forecast = periods.forecast_months();
    let history = periods.history_months();
    let lines = cafe_lines(&periods);

    let updated = recalculate_all(&lines, &baseline, &forecast, Some(history.as_slice()));
    assert_eq!(updated.len(), lines.len());

    for line in &updated {
        assert_eq!(line.forecast_months.len(), forecast.len(), "{}", line.id);
        assert!(line.forecast_months.values().all(|v| v.is_finite()));
        assert!(line.analysis.is_some(), "{} should be analysed", line.id);
    }

    // Beans follow coffee at 30%
    let coffee = &updated[0];
    let beans = &updated[2];
    for m in &forecast {
        assert!((beans.forecast(m) - coffee.forecast(m) * 0.3).abs() < 1e-9);
    }

    // Wages trend up 12.5% across the baseline year
    let wages = updated[3].analysis.as_ref().unwrap();
    assert_eq!(wages.trend_direction, Some(TrendDirection::Up));
    assert!((wages.trend_percentage.unwrap() - 12.5).abs() < 1e-9);
    assert!((updated[3].forecast(&forecast[0]) - 8_500.0 * 1.03).abs() < 1e-9);

    // Manual depreciation keeps the entered month and zero elsewhere
    assert_eq!(updated[6].forecast(&forecast[0]), 400.0);
    assert_eq!(updated[6].forecast(&forecast[1]), 0.0);

    // Catering compounds from the last YTD actual
    assert!((updated[1].forecast(&forecast[0]) - 3_400.0 * 1.02).abs() < 1e-9);

    let columns = periods.month_columns();
    let fy = StatementAggregator::new(&updated).fiscal_year_summary(&columns);
    assert!(fy.category_totals[&LineCategory::Revenue] > 0.0);
    assert!(fy.net_margin_pct.is_finite());
}

#[test]
fn test_determinism() {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let lines = cafe_lines(&periods);
    let history = periods.history_months();

    let first = recalculate_all(
        &lines,
        &periods.baseline_months(),
        &periods.forecast_months(),
        Some(history.as_slice()),
    );
    let second = recalculate_all(
        &lines,
        &periods.baseline_months(),
        &periods.forecast_months(),
        Some(history.as_slice()),
    );

    assert_eq!(first, second);
    assert_eq!(
        serde_json::to_string(&first).unwrap(),
        serde_json::to_string(&second).unwrap()
    );
}

#[test]
fn test_aggregate_consistency() {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let lines = cafe_lines(&periods);
    let updated = recalculate_all(
        &lines,
        &periods.baseline_months(),
        &periods.forecast_months(),
        None,
    );
    let agg = StatementAggregator::new(&updated);

    for column in periods.month_columns() {
        for source in [ValueSource::Actual, ValueSource::Forecast] {
            for category in LineCategory::ALL {
                let expected: f64 = updated
                    .iter()
                    .filter(|l| l.category == category)
                    .map(|l| match source {
                        ValueSource::Actual => l.actual(&column.key),
                        ValueSource::Forecast => l.forecast(&column.key),
                    })
                    .sum();
                let total = agg.category_total(category, &column.key, source);
                assert!((total - expected).abs() < 1e-9);
            }
        }
    }
}

#[test]
fn test_straight_line_scenario() {
    let periods = compute_periods(2026, date(2025, 3, 1));
    let baseline = periods.baseline_months();
    let forecast = periods.forecast_months();
    let lines = vec![Line::new("sales", "Sales", LineCategory::Revenue)
        .with_actuals(baseline.iter().map(|m| (*m, 1000.0)))
        .with_method(straight_line(0.1))];

    let updated = recalculate_all(&lines, &baseline, &forecast, None);

    assert_eq!(forecast.len(), 12);
    let analysis = updated[0].analysis.as_ref().unwrap();
    assert!((analysis.total - 12_000.0).abs() < 1e-9);
    let first = updated[0].forecast(&forecast[0]);
    assert!((first - 1100.0).abs() < 1e-9);
    // Flat: every month is the same value
    assert!(updated[0].forecast_months.values().all(|v| *v == first));
}

#[test]
fn test_seasonal_round_trip() {
    let periods = compute_periods(2026, date(2025, 3, 1));
    let baseline = periods.baseline_months();
    let forecast = periods.forecast_months();
    let mut line = Line::new("sales", "Sales", LineCategory::Revenue).with_method(
        ForecastMethod::SeasonalPattern {
            percentage_increase: 0.0,
        },
    );
    for (i, m) in baseline.iter().enumerate() {
        line.actual_months.insert(*m, 500.0 + 75.0 * i as f64);
    }
    let historical_total: f64 = line.actual_months.values().sum();

    let updated = recalculate_all(&[line.clone()], &baseline, &forecast, None);
    let average = updated[0].analysis.as_ref().unwrap().average_per_month;
    let forecast_total: f64 = updated[0].forecast_months.values().sum();

    assert!((forecast_total - average * forecast.len() as f64).abs() < 1e-6);
    for (h, f) in baseline.iter().zip(&forecast) {
        let historical_share = line.actual(h) / historical_total;
        let forecast_share = updated[0].forecast(f) / forecast_total;
        assert!((historical_share - forecast_share).abs() < 1e-12);
    }
}

#[test]
fn test_driver_propagation() {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let baseline = periods.baseline_months();
    let forecast = periods.forecast_months();
    let lines = vec![
        Line::new("b", "Merchant fees", LineCategory::CostOfSales).with_method(driver("a", 0.25)),
        Line::new("a", "Sales", LineCategory::Revenue)
            .with_actuals(baseline.iter().map(|m| (*m, 1000.0)))
            .with_method(straight_line(0.0)),
    ];

    for resolution in [
        ResolutionStrategy::DependencyGraph,
        ResolutionStrategy::FixedPointSweep,
    ] {
        let engine = ForecastEngine::new(ForecastSettings {
            resolution,
            ..ForecastSettings::default()
        })
        .unwrap();
        let updated = engine.recalculate_all(&lines, &baseline, &forecast, None);

        for m in &forecast {
            assert_eq!(updated[1].forecast(m), 1000.0);
            assert_eq!(updated[0].forecast(m), 250.0);
        }
    }
}

#[test]
fn test_cycle_termination() {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let baseline = periods.baseline_months();
    let forecast = periods.forecast_months();
    let lines = vec![
        Line::new("a", "A", LineCategory::Revenue)
            .with_actuals(baseline.iter().map(|m| (*m, 1000.0)))
            .with_forecast(forecast[0], 1000.0)
            .with_method(driver("b", 1.5)),
        Line::new("b", "B", LineCategory::CostOfSales).with_method(driver("a", 2.0)),
    ];

    for resolution in [
        ResolutionStrategy::DependencyGraph,
        ResolutionStrategy::FixedPointSweep,
    ] {
        let engine = ForecastEngine::new(ForecastSettings {
            resolution,
            ..ForecastSettings::default()
        })
        .unwrap();
        let updated = engine.recalculate_all(&lines, &baseline, &forecast, None);

        for line in &updated {
            assert_eq!(line.forecast_months.len(), forecast.len());
            assert!(line.forecast_months.values().all(|v| v.is_finite()));
        }
    }

    let issues = driver_diagnostics(&lines);
    assert_eq!(issues.len(), 2);
    assert!(issues.iter().all(|i| matches!(i, DriverIssue::Cycle { .. })));
}

#[test]
fn test_missing_driver_scenario() {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let lines = vec![Line::new("fees", "Fees", LineCategory::CostOfSales)
        .with_actuals(periods.baseline_months().iter().map(|m| (*m, 80.0)))
        .with_method(driver("no-such-line", 0.5))];

    let updated = recalculate_all(
        &lines,
        &periods.baseline_months(),
        &periods.forecast_months(),
        None,
    );

    assert!(updated[0].forecast_months.values().all(|v| *v == 0.0));
    assert_eq!(updated[0].forecast_months.len(), 9);
}

#[test]
fn test_growth_rate_scenario() {
    let history = parse_period_string("2024-01:2024-06").unwrap();
    let forecast = parse_period_string("2024-07:2024-09").unwrap();
    let lines = vec![Line::new("sales", "Sales", LineCategory::Revenue)
        .with_actual(history[5], 100.0)
        .with_method(ForecastMethod::GrowthRate {
            growth_rate: 0.05,
            basis: GrowthBasis::MonthOverMonth,
        })];

    let updated = recalculate_all(&lines, &history, &forecast, None);
    let values: Vec<f64> = updated[0].forecast_months.values().copied().collect();

    assert!((values[0] - 105.0).abs() < 1e-9);
    assert!((values[1] - 110.25).abs() < 1e-9);
    assert!((values[2] - 115.7625).abs() < 1e-9);
}

#[test]
fn test_zero_revenue_net_margin() {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let lines = vec![Line::new("rent", "Rent", LineCategory::OperatingExpenses)
        .with_actuals(periods.baseline_months().iter().map(|m| (*m, 2_000.0)))];

    let updated = recalculate_all(
        &lines,
        &periods.baseline_months(),
        &periods.forecast_months(),
        None,
    );
    let agg = StatementAggregator::new(&updated);

    for m in periods.forecast_months() {
        let margin = agg.net_margin(&m, ValueSource::Forecast);
        assert_eq!(margin, 0.0);
    }
    let fy = agg.fiscal_year_summary(&periods.month_columns());
    assert_eq!(fy.net_margin_pct, 0.0);
    assert!(fy.net_profit < 0.0);
}

#[test]
fn test_edit_then_recalculate() -> anyhow::Result<()> {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let baseline = periods.baseline_months();
    let forecast = periods.forecast_months();
    let lines = cafe_lines(&periods);

    let edits = LineEdits::new(vec![
        LineEdit::SetMethod {
            target: "coffee".to_string(),
            method: Some(ForecastMethod::StraightLine {
                base_amount: Some(20_000.0),
                percentage_increase: 0.0,
            }),
        },
        LineEdit::SetManualValue {
            target: "rent".to_string(),
            month: forecast[2],
            value: 0.0,
        },
    ]);
    let edited = edits.apply(&lines)?;
    let updated = recalculate_all(&edited, &baseline, &forecast, None);

    for m in &forecast {
        assert!((updated[2].forecast(m) - 6_000.0).abs() < 1e-9);
    }
    assert_eq!(updated[4].forecast_method, Some(ForecastMethod::Manual));
    assert_eq!(updated[4].forecast(&forecast[2]), 0.0);

    // Deleting the driver zeroes the dependent line instead of failing
    let without_coffee = LineEdit::DeleteLine {
        target: "coffee".to_string(),
    }
    .apply(&updated)?;
    let updated = recalculate_all(&without_coffee, &baseline, &forecast, None);
    let beans = updated.iter().find(|l| l.id == "beans").unwrap();
    assert!(beans.forecast_months.values().all(|v| *v == 0.0));

    Ok(())
}

#[test]
fn test_model_round_trip_through_json() -> anyhow::Result<()> {
    let periods = compute_periods(2025, date(2024, 10, 2));
    let model = ForecastModel {
        settings: ForecastSettings::default(),
        lines: cafe_lines(&periods),
    };

    let json = serde_json::to_string_pretty(&model)?;
    let parsed = ForecastModel::from_json(&json)?;
    assert_eq!(parsed.lines, model.lines);

    let unknown = r#"{ "lines": [ { "id": "x", "name": "X", "category": "Revenue",
        "forecast_method": { "method": "Holt" } } ] }"#;
    let parsed = ForecastModel::from_json(unknown)?;
    assert_eq!(parsed.lines[0].forecast_method, Some(ForecastMethod::Unrecognized));
    assert_eq!(parsed.settings.fiscal_year_end_month, 6);

    Ok(())
}

#[test]
fn test_schema_generation() {
    let schema = ForecastModel::schema_as_json().unwrap();
    assert!(schema.contains("actual_months"));
    assert!(schema.contains("SeasonalPattern"));
}
