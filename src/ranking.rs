// 🏆 Ranking Engine - top-N view over a Record Store
//
// 1. Snapshot the store (insertion order)
// 2. One metric per entity
// 3. Sort descending; equal metrics keep insertion order
// 4. Truncate to n (fewer entities -> all of them, never padded)
//
// Reads only. The metric runs on the snapshot, outside the store lock.

use crate::aggregate;
use crate::entities::{Entity, EntityId, RecordStore};
use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

// ============================================================================
// METRICS
// ============================================================================

/// Anything that turns an entity into one comparable number
pub trait MetricFn {
    fn measure(&self, entity: &Entity) -> f64;
}

impl<F> MetricFn for F
where
    F: Fn(&Entity) -> f64,
{
    fn measure(&self, entity: &Entity) -> f64 {
        self(entity)
    }
}

/// Built-in metrics over an entity's ledger contributions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Metric {
    Average,
    Sum,
    Count,
    /// Highest contribution; empty ledgers rank last
    Max,
    /// Lowest contribution; empty ledgers rank last
    Min,
    /// unit_price * quantity for cart lines, 0 for grade ledgers
    LineTotal,
}

impl MetricFn for Metric {
    fn measure(&self, entity: &Entity) -> f64 {
        let values = entity.contributions();
        match self {
            Metric::Average => aggregate::average(&values),
            Metric::Sum => aggregate::sum(&values),
            Metric::Count => aggregate::count(&values) as f64,
            Metric::Max => aggregate::max(&values).unwrap_or(f64::NEG_INFINITY),
            Metric::Min => aggregate::min(&values).unwrap_or(f64::NEG_INFINITY),
            Metric::LineTotal => entity.ledger.line().map(aggregate::line_total).unwrap_or(0.0),
        }
    }
}

// ============================================================================
// RANKED PROJECTION
// ============================================================================

/// Lightweight view of a ranked entity - no ledger state
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranked {
    pub id: EntityId,
    pub key: String,
    pub metric: f64,
}

// ============================================================================
// RANKING
// ============================================================================

/// Every entity, ordered by metric (highest first), ties in insertion order
pub fn rank<M: MetricFn>(store: &RecordStore, metric: M) -> EngineResult<Vec<Ranked>> {
    let mut scored = Vec::new();
    for (position, entity) in store.all().into_iter().enumerate() {
        let value = metric.measure(&entity);
        if value.is_nan() {
            return Err(EngineError::invalid(format!(
                "metric for {:?} (id {}) is NaN",
                entity.key, entity.id
            )));
        }
        scored.push((
            position,
            Ranked {
                id: entity.id,
                key: entity.key,
                metric: value,
            },
        ));
    }

    // Position is an explicit secondary key so ties never depend on sort internals
    scored.sort_by(|(pos_a, a), (pos_b, b)| {
        b.metric
            .partial_cmp(&a.metric)
            .unwrap_or(Ordering::Equal)
            .then(pos_a.cmp(pos_b))
    });

    Ok(scored.into_iter().map(|(_, ranked)| ranked).collect())
}

/// The `n` highest-ranked entities (all of them if there are fewer than `n`)
pub fn top_n<M: MetricFn>(store: &RecordStore, metric: M, n: usize) -> EngineResult<Vec<Ranked>> {
    let mut ranked = rank(store, metric)?;
    ranked.truncate(n);
    Ok(ranked)
}

// ============================================================================
// TESTS
// ============================================================================
