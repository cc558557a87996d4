// 🧮 Aggregate Calculator - pure functions over a ledger snapshot
//
// Policy for empty input:
//   sum / average / count -> 0
//   min / max             -> EmptyInput (no number is a safe stand-in)

use crate::error::{EngineError, EngineResult};
use crate::ledger::LineItem;
use serde::{Deserialize, Serialize};

/// Sum of all values, `0.0` for an empty ledger
pub fn sum(values: &[f64]) -> f64 {
    values.iter().sum()
}

pub fn count(values: &[f64]) -> usize {
    values.len()
}

/// Arithmetic mean, `0.0` (not NaN) for an empty ledger
pub fn average(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    sum(values) / values.len() as f64
}

pub fn min(values: &[f64]) -> EngineResult<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::min)
        .ok_or(EngineError::EmptyInput { operation: "min" })
}

pub fn max(values: &[f64]) -> EngineResult<f64> {
    values
        .iter()
        .copied()
        .reduce(f64::max)
        .ok_or(EngineError::EmptyInput { operation: "max" })
}

/// unit_price * quantity
pub fn line_total(line: &LineItem) -> f64 {
    line.unit_price * f64::from(line.quantity)
}

pub fn grand_total(lines: &[LineItem]) -> f64 {
    lines.iter().map(line_total).sum()
}

// ============================================================================
// SUMMARY
// ============================================================================

/// All aggregates of one ledger in a single pass-friendly struct
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Summary {
    pub count: usize,
    pub sum: f64,
    pub average: f64,
    pub min: Option<f64>,
    pub max: Option<f64>,
}

impl Summary {
    pub fn summary(&self) -> String {
        match (self.min, self.max) {
            (Some(min), Some(max)) => format!(
                "{} values, sum {:.2}, avg {:.2}, range {:.2}..{:.2}",
                self.count, self.sum, self.average, min, max
            ),
            _ => "no values".to_string(),
        }
    }
}

pub fn summarize(values: &[f64]) -> Summary {
    Summary {
        count: count(values),
        sum: sum(values),
        average: average(values),
        min: min(values).ok(),
        max: max(values).ok(),
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_empty_input_policy() {
        assert_eq!(sum(&[]), 0.0);
        assert_eq!(average(&[]), 0.0);
        assert_eq!(count(&[]), 0);
        assert_eq!(min(&[]), Err(EngineError::EmptyInput { operation: "min" }));
        assert_eq!(max(&[]), Err(EngineError::EmptyInput { operation: "max" }));
    }

    #[test]
    fn test_basic_aggregates() {
        let grades = [85.0, 90.0, 88.0];
        assert_eq!(sum(&grades), 263.0);
        assert!(approx(average(&grades), 263.0 / 3.0));
        assert_eq!(count(&grades), 3);
        assert_eq!(min(&grades), Ok(85.0));
        assert_eq!(max(&grades), Ok(90.0));
    }

    #[test]
    fn test_single_value() {
        assert_eq!(min(&[-4.5]), Ok(-4.5));
        assert_eq!(max(&[-4.5]), Ok(-4.5));
        assert_eq!(average(&[-4.5]), -4.5);
    }

    #[test]
    fn test_line_totals() {
        let lines = vec![
            LineItem::new("laptop", 999.99, 2),
            LineItem::new("mouse", 29.99, 2),
        ];
        assert!(approx(line_total(&lines[0]), 1999.98));
        assert!(approx(grand_total(&lines), 2059.96));
        assert_eq!(grand_total(&[]), 0.0);
    }

    #[test]
    fn test_summarize() {
        let s = summarize(&[92.0, 87.0, 91.0]);
        assert_eq!(s.count, 3);
        assert_eq!(s.sum, 270.0);
        assert_eq!(s.average, 90.0);
        assert_eq!(s.min, Some(87.0));
        assert_eq!(s.max, Some(92.0));
        assert_eq!(s.summary(), "3 values, sum 270.00, avg 90.00, range 87.00..92.00");

        let empty = summarize(&[]);
        assert_eq!(empty.average, 0.0);
        assert_eq!(empty.min, None);
        assert_eq!(empty.summary(), "no values");
    }
}
