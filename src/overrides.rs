use crate::error::{ForecastError, Result};
use crate::month_key::MonthKey;
use crate::schema::{ForecastMethod, Line, LineCategory};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// An ordered batch of edits, applied to a line collection as a unit.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema, Default)]
pub struct LineEdits {
    #[serde(default)]
    pub edits: Vec<LineEdit>,
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum LineEdit {
    /// Append a new line. Ids are not checked for uniqueness; the first line
    /// with a given id is the one drivers and edits resolve to.
    AddLine { line: Line },

    /// Swap in a whole new value for the line with the same id.
    ReplaceLine { line: Line },

    DeleteLine { target: String },

    Rename { target: String, new_name: String },

    Recategorize {
        target: String,
        category: LineCategory,
    },

    /// Change or clear the forecast method.
    SetMethod {
        target: String,
        method: Option<ForecastMethod>,
    },

    SetActual {
        target: String,
        month: MonthKey,
        value: f64,
    },

    /// Override one forecast month by hand. The line switches to `Manual`,
    /// keeping its other current forecast values.
    SetManualValue {
        target: String,
        month: MonthKey,
        value: f64,
    },
}

impl LineEdits {
    pub fn new(edits: Vec<LineEdit>) -> Self {
        Self { edits }
    }

    /// Applies every edit in order and returns the new collection. The input
    /// is left untouched.
    pub fn apply(&self, lines: &[Line]) -> Result<Vec<Line>> {
        self.edits
            .iter()
            .try_fold(lines.to_vec(), |current, edit| edit.apply(&current))
    }
}

impl LineEdit {
    pub fn apply(&self, lines: &[Line]) -> Result<Vec<Line>> {
        match self {
            LineEdit::AddLine { line } => {
                let mut next = lines.to_vec();
                next.push(line.clone());
                Ok(next)
            }
            LineEdit::ReplaceLine { line } => replace_line(lines, line.clone()),
            LineEdit::DeleteLine { target } => {
                find_line(lines, target)?;
                Ok(lines.iter().filter(|l| &l.id != target).cloned().collect())
            }
            LineEdit::Rename { target, new_name } => update_line(lines, target, |line| Line {
                name: new_name.clone(),
                ..line.clone()
            }),
            LineEdit::Recategorize { target, category } => {
                update_line(lines, target, |line| Line {
                    category: *category,
                    ..line.clone()
                })
            }
            LineEdit::SetMethod { target, method } => update_line(lines, target, |line| Line {
                forecast_method: method.clone(),
                ..line.clone()
            }),
            LineEdit::SetActual {
                target,
                month,
                value,
            } => update_line(lines, target, |line| {
                let mut actual_months = line.actual_months.clone();
                actual_months.insert(*month, *value);
                Line {
                    actual_months,
                    ..line.clone()
                }
            }),
            LineEdit::SetManualValue {
                target,
                month,
                value,
            } => update_line(lines, target, |line| {
                let mut forecast_months = line.forecast_months.clone();
                forecast_months.insert(*month, *value);
                Line {
                    forecast_months,
                    forecast_method: Some(ForecastMethod::Manual),
                    ..line.clone()
                }
            }),
        }
    }
}

fn find_line<'a>(lines: &'a [Line], id: &str) -> Result<&'a Line> {
    lines
        .iter()
        .find(|l| l.id == id)
        .ok_or_else(|| ForecastError::UnknownLine(id.to_string()))
}

/// Builds a new collection where the line with `id` is replaced by `update(line)`.
fn update_line<F>(lines: &[Line], id: &str, update: F) -> Result<Vec<Line>>
where
    F: FnOnce(&Line) -> Line,
{
    let updated = update(find_line(lines, id)?);
    replace_line(lines, updated)
}

/// Returns a new collection with every line sharing `line.id` replaced by `line`.
pub fn replace_line(lines: &[Line], line: Line) -> Result<Vec<Line>> {
    find_line(lines, &line.id)?;
    Ok(lines
        .iter()
        .map(|l| if l.id == line.id { line.clone() } else { l.clone() })
        .collect())
}
