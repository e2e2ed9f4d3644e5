//! Free-text quantity parsing and per-ingredient aggregation.
//!
//! Catalog measures are loose strings such as `"1 1/2 oz"`, `"2.5 cl"` or
//! `"a dash"`. [`parse_measure`] turns one into a number and a unit, and
//! [`aggregate_measures`] sums the measures of one ingredient across several
//! cocktails into a single display quantity for the shopping list.
//!
//! Neither function fails: malformed input degrades to `None` or to a
//! zero-valued measure that keeps the original text.

use serde::Serialize;

// ---------------------------------------------------------------------------
// ParsedMeasure
// ---------------------------------------------------------------------------

/// A single quantity split into its numeric value and trailing unit text.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ParsedMeasure {
    pub value: f64,
    pub unit: String,
    pub original: String,
}

/// Parse one free-text quantity.
///
/// Recognizes an optional leading integer followed by an optional `a/b`
/// fraction (`"1 1/2 oz"`, `"1/2 oz"`, `"3 oz"`), then a decimal prefix
/// (`"2.5 oz"`, `".75 oz"`). Whatever follows the number, trimmed, is the
/// unit. Text without a numeric prefix is kept verbatim as a zero-valued unit.
/// A zero denominator contributes nothing to the value.
///
/// Returns `None` for missing, empty, or whitespace-only input.
pub fn parse_measure(text: Option<&str>) -> Option<ParsedMeasure> {
    let trimmed = text?.trim();
    if trimmed.is_empty() {
        return None;
    }

    let (value, rest) = mixed_number(trimmed)
        .or_else(|| decimal_number(trimmed))
        .unwrap_or((0.0, trimmed));

    Some(ParsedMeasure {
        value,
        unit: rest.trim().to_string(),
        original: trimmed.to_string(),
    })
}

/// Split a run of ASCII digits off the front of `s`.
fn leading_digits(s: &str) -> (&str, &str) {
    let end = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    s.split_at(end)
}

/// `a/b` at the very start of `s`, returning the fraction's value and the rest.
fn fraction(s: &str) -> Option<(f64, &str)> {
    let (num, rest) = leading_digits(s);
    let rest = rest.strip_prefix('/')?;
    let (den, rest) = leading_digits(rest);
    if num.is_empty() || den.is_empty() {
        return None;
    }
    let num: f64 = num.parse().ok()?;
    let den: f64 = den.parse().ok()?;
    let value = if den == 0.0 { 0.0 } else { num / den };
    Some((value, rest))
}

/// Optional whole number, optional fraction. `None` when neither is present
/// or when the number continues as a decimal.
fn mixed_number(s: &str) -> Option<(f64, &str)> {
    if let Some(parsed) = fraction(s) {
        return Some(parsed);
    }

    let (whole, rest) = leading_digits(s);
    if whole.is_empty() || rest.starts_with('.') {
        return None;
    }
    let mut value: f64 = whole.parse().ok()?;

    let after_space = rest.trim_start();
    if after_space.len() < rest.len() {
        if let Some((frac, tail)) = fraction(after_space) {
            value += frac;
            return Some((value, tail));
        }
    }
    Some((value, rest))
}

fn decimal_number(s: &str) -> Option<(f64, &str)> {
    let end = s
        .char_indices()
        .find(|(_, c)| !(c.is_ascii_digit() || *c == '.'))
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    let (number, rest) = s.split_at(end);
    let value: f64 = number.parse().ok()?;
    Some((value, rest))
}

// ---------------------------------------------------------------------------
// AggregatedMeasure
// ---------------------------------------------------------------------------

/// The combined quantity of one ingredient across several recipes.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregatedMeasure {
    /// Sum of all values; `0` when the measures use more than one unit.
    pub total: f64,
    /// The shared unit, or a comma-separated list of unit keys when mixed.
    pub unit: String,
    /// Number of non-blank input measures.
    pub count: usize,
    pub has_multiple_units: bool,
    pub display: String,
}

struct UnitGroup {
    key: String,
    values: Vec<f64>,
    examples: Vec<String>,
}

/// Combine the measures one ingredient has across recipes.
///
/// Measures are grouped by unit, compared case-insensitively. A single group
/// is summed and rendered as a friendly quantity (`"3 oz"`, `"1 1/2 oz"`,
/// `"1.33 oz"`); several groups are summarized as `"{count}× (oz, dash)"`
/// without summing.
///
/// Returns `None` when no input is a non-blank measure.
pub fn aggregate_measures(measures: &[Option<&str>]) -> Option<AggregatedMeasure> {
    let valid: Vec<&str> = measures
        .iter()
        .flatten()
        .copied()
        .filter(|m| !m.trim().is_empty())
        .collect();
    if valid.is_empty() {
        return None;
    }
    let count = valid.len();

    let mut groups: Vec<UnitGroup> = Vec::new();
    for parsed in valid.iter().filter_map(|m| parse_measure(Some(m))) {
        let key = parsed.unit.to_lowercase();
        let idx = match groups.iter().position(|g| g.key == key) {
            Some(idx) => idx,
            None => {
                groups.push(UnitGroup {
                    key,
                    values: Vec::new(),
                    examples: Vec::new(),
                });
                groups.len() - 1
            }
        };
        let group = &mut groups[idx];
        group.values.push(parsed.value);
        if !group.examples.contains(&parsed.original) {
            group.examples.push(parsed.original);
        }
    }

    match groups.as_slice() {
        [] => None,
        [group] => Some(single_unit(group, count)),
        _ => {
            let unit = groups
                .iter()
                .map(|g| g.key.as_str())
                .collect::<Vec<_>>()
                .join(", ");
            Some(AggregatedMeasure {
                total: 0.0,
                display: format!("{count}× ({unit})"),
                unit,
                count,
                has_multiple_units: true,
            })
        }
    }
}

fn single_unit(group: &UnitGroup, count: usize) -> AggregatedMeasure {
    let total: f64 = group.values.iter().sum();
    let first = group.examples.first().map(String::as_str).unwrap_or("");
    let stripped = first
        .trim_start_matches(|c: char| c.is_ascii_digit() || c == '.' || c == '/' || c.is_whitespace())
        .trim();
    let unit = if stripped.is_empty() {
        group.key.clone()
    } else {
        stripped.to_string()
    };

    let display = if total == 0.0 {
        first.to_string()
    } else {
        with_unit(&format_quantity(total), &unit)
    };

    AggregatedMeasure {
        total,
        unit,
        count,
        has_multiple_units: false,
        display,
    }
}

fn with_unit(quantity: &str, unit: &str) -> String {
    if unit.is_empty() {
        quantity.to_string()
    } else {
        format!("{quantity} {unit}")
    }
}

/// Render a positive quantity as a whole number, a mixed number with a
/// common kitchen fraction, or a decimal rounded to two places.
pub fn format_quantity(total: f64) -> String {
    let whole = total.floor();
    let frac = total - whole;

    if frac == 0.0 {
        return format!("{whole}");
    }

    let vulgar = if frac == 0.5 {
        Some("1/2")
    } else if frac == 0.25 {
        Some("1/4")
    } else if frac == 0.75 {
        Some("3/4")
    } else {
        None
    };

    match vulgar {
        Some(v) if whole > 0.0 => format!("{whole} {v}"),
        Some(v) => v.to_string(),
        None => {
            let fixed = format!("{total:.2}");
            fixed.trim_end_matches('0').trim_end_matches('.').to_string()
        }
    }
}
