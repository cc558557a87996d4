// 📒 Ledger Accumulator - the numeric contributions attached to an entity
//
// Two shapes, one per store:
//   Ledger    -> ordered grades, append-only
//   LineItems -> one (unit_price, quantity) cart line, merged by product key
//
// Entries are never edited in place. Grades only grow; a line only has its
// quantity incremented (merge) or replaced (set_quantity).

use crate::aggregate;
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};

// ============================================================================
// FLAVOR
// ============================================================================

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Flavor {
    /// Append-only numeric ledger (grades)
    #[default]
    Ledger,

    /// Merge-by-key line items (cart)
    LineItems,
}

impl Flavor {
    pub fn as_str(&self) -> &'static str {
        match self {
            Flavor::Ledger => "ledger",
            Flavor::LineItems => "line-item",
        }
    }
}

// ============================================================================
// LINE ITEM
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_key: String,
    pub unit_price: f64,
    pub quantity: u32,
}

impl LineItem {
    pub fn new(product_key: impl Into<String>, unit_price: f64, quantity: u32) -> Self {
        LineItem {
            product_key: product_key.into(),
            unit_price,
            quantity,
        }
    }

    pub fn total(&self) -> f64 {
        aggregate::line_total(self)
    }
}

// ============================================================================
// LEDGER
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Ledger {
    Values(Vec<f64>),
    Line(LineItem),
}

impl Ledger {
    pub fn flavor(&self) -> Flavor {
        match self {
            Ledger::Values(_) => Flavor::Ledger,
            Ledger::Line(_) => Flavor::LineItems,
        }
    }

    /// Numbers the aggregate calculator sees for this ledger.
    /// A cart line contributes its line total.
    pub fn contributions(&self) -> Vec<f64> {
        match self {
            Ledger::Values(values) => values.clone(),
            Ledger::Line(line) => vec![line.total()],
        }
    }

    pub fn values(&self) -> Option<&[f64]> {
        match self {
            Ledger::Values(values) => Some(values),
            Ledger::Line(_) => None,
        }
    }

    pub fn line(&self) -> Option<&LineItem> {
        match self {
            Ledger::Values(_) => None,
            Ledger::Line(line) => Some(line),
        }
    }

    /// Append one grade. Caller has already validated `value`.
    pub(crate) fn append(&mut self, value: f64) -> EngineResult<()> {
        match self {
            Ledger::Values(values) => {
                values.push(value);
                Ok(())
            }
            Ledger::Line(_) => Err(EngineError::FlavorMismatch {
                operation: "append",
                expected: Flavor::Ledger.as_str(),
            }),
        }
    }

    /// Increment a line's quantity; the line keeps its original unit price
    pub(crate) fn merge_quantity(&mut self, quantity: u32) -> EngineResult<u32> {
        match self {
            Ledger::Line(line) => {
                let merged = line.quantity.checked_add(quantity).ok_or_else(|| {
                    EngineError::invalid(format!(
                        "quantity overflow merging {} into {}",
                        quantity, line.product_key
                    ))
                })?;
                line.quantity = merged;
                Ok(merged)
            }
            Ledger::Values(_) => Err(EngineError::FlavorMismatch {
                operation: "add_line",
                expected: Flavor::LineItems.as_str(),
            }),
        }
    }

    pub(crate) fn replace_quantity(&mut self, quantity: u32) -> EngineResult<()> {
        match self {
            Ledger::Line(line) => {
                line.quantity = quantity;
                Ok(())
            }
            Ledger::Values(_) => Err(EngineError::FlavorMismatch {
                operation: "set_quantity",
                expected: Flavor::LineItems.as_str(),
            }),
        }
    }
}

// ============================================================================
// ARGUMENT CHECKS
// ============================================================================

pub(crate) fn check_value(value: f64) -> EngineResult<f64> {
    if !value.is_finite() {
        return Err(EngineError::invalid(format!(
            "ledger value must be finite, got {}",
            value
        )));
    }
    Ok(value)
}

pub(crate) fn check_unit_price(unit_price: f64) -> EngineResult<f64> {
    if !unit_price.is_finite() || unit_price < 0.0 {
        return Err(EngineError::invalid(format!(
            "unit price must be a finite non-negative number, got {}",
            unit_price
        )));
    }
    Ok(unit_price)
}

pub(crate) fn check_quantity(quantity: i64) -> EngineResult<u32> {
    if quantity < 0 {
        return Err(EngineError::invalid(format!(
            "quantity must not be negative, got {}",
            quantity
        )));
    }
    u32::try_from(quantity)
        .map_err(|_| EngineError::invalid(format!("quantity {} is too large", quantity)))
}

// ============================================================================
// TESTS
// ============================================================================
