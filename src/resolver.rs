use crate::engine::Forecaster;
use crate::month_key::MonthKey;
use crate::schema::{Line, ResolutionStrategy};
use log::{debug, warn};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Something wrong with a line's driver reference. These never fail a
/// recalculation; they are reported so the caller can flag the line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum DriverIssue {
    /// The driver id matches no line, so the forecast is zero.
    MissingDriver {
        line_id: String,
        driver_line_id: String,
    },
    /// The line is part of a driver cycle (A drives B drives A).
    Cycle { line_id: String },
    /// The line is driven, directly or not, by a line in a cycle.
    DependsOnCycle { line_id: String },
}

/// Driver edges between lines, by position in the collection.
struct DriverGraph {
    drivers: Vec<Option<usize>>,
    dependents: Vec<Vec<usize>>,
}

impl DriverGraph {
    fn build(lines: &[Line]) -> Self {
        let mut index: BTreeMap<&str, usize> = BTreeMap::new();
        for (i, line) in lines.iter().enumerate() {
            index.entry(line.id.as_str()).or_insert(i);
        }

        let mut drivers = vec![None; lines.len()];
        let mut dependents = vec![Vec::new(); lines.len()];
        for (i, line) in lines.iter().enumerate() {
            let driver = line
                .forecast_method
                .as_ref()
                .and_then(|m| m.driver_line_id())
                .and_then(|id| index.get(id).copied());
            if let Some(j) = driver {
                drivers[i] = Some(j);
                dependents[j].push(i);
            }
        }

        Self {
            drivers,
            dependents,
        }
    }

    /// Kahn's algorithm, taking the lowest ready position first. Returns the
    /// evaluation order and, separately, every line that could not be ordered.
    fn topological_order(&self) -> (Vec<usize>, BTreeSet<usize>) {
        let mut in_degree: Vec<usize> = self.drivers.iter().map(|d| usize::from(d.is_some())).collect();
        let mut ready: BTreeSet<usize> = (0..in_degree.len()).filter(|&i| in_degree[i] == 0).collect();
        let mut order = Vec::with_capacity(in_degree.len());

        while let Some(next) = ready.pop_first() {
            order.push(next);
            for &dependent in &self.dependents[next] {
                in_degree[dependent] -= 1;
                if in_degree[dependent] == 0 {
                    ready.insert(dependent);
                }
            }
        }

        let ordered: BTreeSet<usize> = order.iter().copied().collect();
        let unresolved = (0..in_degree.len()).filter(|i| !ordered.contains(i)).collect();
        (order, unresolved)
    }

    /// Each line has at most one driver, so following drivers from `start`
    /// either ends or loops within `len` steps.
    fn is_on_cycle(&self, start: usize) -> bool {
        let mut current = self.drivers[start];
        for _ in 0..self.drivers.len() {
            match current {
                None => return false,
                Some(i) if i == start => return true,
                Some(i) => current = self.drivers[i],
            }
        }
        false
    }
}

/// Reports dangling and cyclic driver references.
pub fn driver_diagnostics(lines: &[Line]) -> Vec<DriverIssue> {
    let graph = DriverGraph::build(lines);
    let (_, unresolved) = graph.topological_order();
    let mut issues = Vec::new();

    for (i, line) in lines.iter().enumerate() {
        let Some(driver_id) = line.forecast_method.as_ref().and_then(|m| m.driver_line_id()) else {
            continue;
        };
        if graph.drivers[i].is_none() {
            issues.push(DriverIssue::MissingDriver {
                line_id: line.id.clone(),
                driver_line_id: driver_id.to_string(),
            });
        } else if unresolved.contains(&i) {
            if graph.is_on_cycle(i) {
                issues.push(DriverIssue::Cycle {
                    line_id: line.id.clone(),
                });
            } else {
                issues.push(DriverIssue::DependsOnCycle {
                    line_id: line.id.clone(),
                });
            }
        }
    }

    issues
}

/// Recomputes every line's forecast so driver-based lines see their drivers'
/// final values.
pub struct DependencyResolver<'a> {
    forecast_months: &'a [MonthKey],
    history_months: &'a [MonthKey],
    strategy: ResolutionStrategy,
    iteration_cap: usize,
}

impl<'a> DependencyResolver<'a> {
    pub fn new(
        forecast_months: &'a [MonthKey],
        history_months: &'a [MonthKey],
        strategy: ResolutionStrategy,
        iteration_cap: usize,
    ) -> Self {
        Self {
            forecast_months,
            history_months,
            strategy,
            iteration_cap,
        }
    }

    pub fn resolve(&self, lines: Vec<Line>) -> Vec<Line> {
        match self.strategy {
            ResolutionStrategy::DependencyGraph => self.resolve_in_order(lines),
            ResolutionStrategy::FixedPointSweep => {
                let all: BTreeSet<usize> = (0..lines.len()).collect();
                self.sweep_until_cap(lines, &all)
            }
        }
    }

    fn resolve_in_order(&self, mut lines: Vec<Line>) -> Vec<Line> {
        let graph = DriverGraph::build(&lines);
        let (order, unresolved) = graph.topological_order();

        // Drivers come before their dependents, so reading the live collection is safe
        for &i in &order {
            let forecast = Forecaster::new(&lines, self.forecast_months, self.history_months)
                .forecast_line(&lines[i]);
            lines[i].forecast_months = forecast;
        }
        debug!("Resolved {} lines in dependency order", order.len());

        if unresolved.is_empty() {
            return lines;
        }

        warn!(
            "{} lines depend on a driver cycle; settling them with {} fixed-point sweeps",
            unresolved.len(),
            self.iteration_cap
        );
        self.sweep_until_cap(lines, &unresolved)
    }

    /// Runs exactly `iteration_cap` sweeps over the selected lines. Every sweep
    /// reads the previous sweep's forecasts, never values from the sweep in progress.
    fn sweep_until_cap(&self, lines: Vec<Line>, selected: &BTreeSet<usize>) -> Vec<Line> {
        (0..self.iteration_cap).fold(lines, |snapshot, sweep| {
            debug!("Driver sweep {} of {}", sweep + 1, self.iteration_cap);
            self.sweep(&snapshot, selected)
        })
    }

    fn sweep(&self, snapshot: &[Line], selected: &BTreeSet<usize>) -> Vec<Line> {
        let forecaster = Forecaster::new(snapshot, self.forecast_months, self.history_months);
        snapshot
            .iter()
            .enumerate()
            .map(|(i, line)| {
                if selected.contains(&i) {
                    Line {
                        forecast_months: forecaster.forecast_line(line),
                        ..line.clone()
                    }
                } else {
                    line.clone()
                }
            })
            .collect()
    }
}
