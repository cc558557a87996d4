// 🗂️ Record Entity + Record Store
//
// "The id is IDENTITY (never reused), the key is a VALUE (display/lookup name)"
//
// - Ids come from a store-wide counter starting at 1; clear() does not reset it
// - Key lookups are case-insensitive, first match in insertion order wins
// - Every read hands back an owned copy, never a reference into the store
// - One RwLock per store serializes all mutations

use crate::aggregate;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::ledger::{check_quantity, check_unit_price, check_value, Flavor, Ledger, LineItem};
use crate::ranking::{self, MetricFn, Ranked};
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::debug;

pub type EntityId = u64;

// ============================================================================
// ENTITY
// ============================================================================

/// Plain data record. Derived numbers (average, totals) live in `aggregate`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Stable identity - unique within the store, never reused
    pub id: EntityId,

    /// Display/lookup name (product key for cart lines)
    pub key: String,

    pub ledger: Ledger,

    pub created_at: DateTime<Utc>,

    /// Extensible attributes, e.g. {"age": 20}
    pub metadata: serde_json::Value,
}

impl Entity {
    fn new(id: EntityId, key: String, ledger: Ledger, metadata: serde_json::Value) -> Self {
        Entity {
            id,
            key,
            ledger,
            created_at: Utc::now(),
            metadata,
        }
    }

    /// Case-insensitive exact match on the key
    pub fn matches_key(&self, key: &str) -> bool {
        self.key.to_lowercase() == key.to_lowercase()
    }

    pub fn contributions(&self) -> Vec<f64> {
        self.ledger.contributions()
    }

    pub fn average(&self) -> f64 {
        aggregate::average(&self.contributions())
    }

    pub fn total(&self) -> f64 {
        aggregate::sum(&self.contributions())
    }
}

/// Target for `remove`: by id or by (case-insensitive) key
#[derive(Debug, Clone, PartialEq)]
pub enum EntityRef {
    Id(EntityId),
    Key(String),
}

impl From<EntityId> for EntityRef {
    fn from(id: EntityId) -> Self {
        EntityRef::Id(id)
    }
}

impl From<&str> for EntityRef {
    fn from(key: &str) -> Self {
        EntityRef::Key(key.to_string())
    }
}

impl From<String> for EntityRef {
    fn from(key: String) -> Self {
        EntityRef::Key(key)
    }
}

// ============================================================================
// RECORD STORE
// ============================================================================

struct StoreState {
    /// Insertion order
    entities: Vec<Entity>,
    next_id: EntityId,
}

impl StoreState {
    fn position_by_key(&self, key: &str) -> Option<usize> {
        self.entities.iter().position(|e| e.matches_key(key))
    }

    fn position_by_id(&self, id: EntityId) -> Option<usize> {
        self.entities.iter().position(|e| e.id == id)
    }

    fn insert(&mut self, key: String, ledger: Ledger, metadata: serde_json::Value) -> Entity {
        let id = self.next_id;
        self.next_id += 1;
        let entity = Entity::new(id, key, ledger, metadata);
        self.entities.push(entity.clone());
        entity
    }
}

/// Keyed collection of entities, all holding the same ledger shape
pub struct RecordStore {
    config: EngineConfig,
    state: RwLock<StoreState>,
}

impl RecordStore {
    /// Create an empty store for one ledger shape, default settings otherwise
    pub fn new(flavor: Flavor) -> Self {
        RecordStore::build(EngineConfig::new(flavor))
    }

    pub fn with_config(config: EngineConfig) -> EngineResult<Self> {
        config.validate()?;
        Ok(RecordStore::build(config))
    }

    fn build(config: EngineConfig) -> Self {
        RecordStore {
            config,
            state: RwLock::new(StoreState {
                entities: Vec::new(),
                next_id: 1,
            }),
        }
    }

    pub fn flavor(&self) -> Flavor {
        self.config.flavor
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn require(&self, flavor: Flavor, operation: &'static str) -> EngineResult<()> {
        if self.config.flavor != flavor {
            return Err(EngineError::FlavorMismatch {
                operation,
                expected: flavor.as_str(),
            });
        }
        Ok(())
    }

    // ------------------------------------------------------------------------
    // Record operations
    // ------------------------------------------------------------------------

    /// Create an entity with an initial grade ledger (may be empty)
    pub fn create(&self, key: impl Into<String>, values: Vec<f64>) -> EngineResult<Entity> {
        self.create_with_metadata(key, values, serde_json::json!({}))
    }

    pub fn create_with_metadata(
        &self,
        key: impl Into<String>,
        values: Vec<f64>,
        metadata: serde_json::Value,
    ) -> EngineResult<Entity> {
        self.require(Flavor::Ledger, "create")?;
        for value in &values {
            check_value(*value)?;
        }

        let key = key.into();
        let mut state = self.state.write();
        let entity = state.insert(key, Ledger::Values(values), metadata);
        debug!(id = entity.id, key = %entity.key, "entity created");
        Ok(entity)
    }

    /// First entity (insertion order) whose key matches, ignoring case
    pub fn find_by_key(&self, key: &str) -> EngineResult<Entity> {
        let state = self.state.read();
        state
            .position_by_key(key)
            .map(|pos| state.entities[pos].clone())
            .ok_or_else(|| EngineError::not_found(format!("no entity with key {:?}", key)))
    }

    pub fn find_by_id(&self, id: EntityId) -> EngineResult<Entity> {
        let state = self.state.read();
        state
            .position_by_id(id)
            .map(|pos| state.entities[pos].clone())
            .ok_or_else(|| EngineError::not_found(format!("no entity with id {}", id)))
    }

    /// Delete one entity; returns whether anything was deleted
    pub fn remove(&self, target: impl Into<EntityRef>) -> bool {
        let target = target.into();
        let mut state = self.state.write();
        let position = match &target {
            EntityRef::Id(id) => state.position_by_id(*id),
            EntityRef::Key(key) => state.position_by_key(key),
        };

        match position {
            Some(pos) => {
                let removed = state.entities.remove(pos);
                debug!(id = removed.id, key = %removed.key, "entity removed");
                true
            }
            None => false,
        }
    }

    /// Snapshot of every entity, insertion order
    pub fn all(&self) -> Vec<Entity> {
        self.state.read().entities.clone()
    }

    pub fn len(&self) -> usize {
        self.state.read().entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entity. The id counter keeps counting.
    pub fn clear(&self) {
        let mut state = self.state.write();
        let dropped = state.entities.len();
        state.entities.clear();
        debug!(dropped, next_id = state.next_id, "store cleared");
    }

    // ------------------------------------------------------------------------
    // Grade ledger
    // ------------------------------------------------------------------------

    pub fn append(&self, id: EntityId, value: f64) -> EngineResult<()> {
        self.require(Flavor::Ledger, "append")?;
        let value = check_value(value)?;

        let mut state = self.state.write();
        let pos = state
            .position_by_id(id)
            .ok_or_else(|| EngineError::not_found(format!("no entity with id {}", id)))?;
        state.entities[pos].ledger.append(value)?;
        debug!(id, value, "value appended");
        Ok(())
    }

    /// Append to the first entity matching `key`; `Ok(false)` if none does
    pub fn append_by_key(&self, key: &str, value: f64) -> EngineResult<bool> {
        self.require(Flavor::Ledger, "append")?;
        let value = check_value(value)?;

        let mut state = self.state.write();
        let Some(pos) = state.position_by_key(key) else {
            return Ok(false);
        };
        let entity = &mut state.entities[pos];
        entity.ledger.append(value)?;
        debug!(id = entity.id, key = %entity.key, value, "value appended");
        Ok(true)
    }

    /// Copy of an entity's grades, in append order
    pub fn values(&self, id: EntityId) -> EngineResult<Vec<f64>> {
        self.require(Flavor::Ledger, "values")?;
        let entity = self.find_by_id(id)?;
        Ok(entity.ledger.values().map(<[f64]>::to_vec).unwrap_or_default())
    }

    // ------------------------------------------------------------------------
    // Line items
    // ------------------------------------------------------------------------

    /// Add `quantity` of a product. An existing line for the same product key
    /// (case-insensitive) has its quantity incremented; otherwise a new line
    /// is appended. Returns the resulting line entity.
    pub fn add_line(
        &self,
        product_key: impl Into<String>,
        unit_price: f64,
        quantity: i64,
    ) -> EngineResult<Entity> {
        self.require(Flavor::LineItems, "add_line")?;
        let unit_price = check_unit_price(unit_price)?;
        let quantity = check_quantity(quantity)?;
        let product_key = product_key.into();

        let mut state = self.state.write();
        if let Some(pos) = state.position_by_key(&product_key) {
            let entity = &mut state.entities[pos];
            let merged = entity.ledger.merge_quantity(quantity)?;
            debug!(id = entity.id, key = %entity.key, added = quantity, quantity = merged, "line merged");
            return Ok(entity.clone());
        }

        let line = LineItem::new(product_key.clone(), unit_price, quantity);
        let entity = state.insert(product_key, Ledger::Line(line), serde_json::json!({}));
        debug!(id = entity.id, key = %entity.key, unit_price, quantity, "line added");
        Ok(entity)
    }

    /// Replace a line's quantity. `Ok(false)` when no such line exists.
    pub fn set_quantity(&self, product_key: &str, quantity: i64) -> EngineResult<bool> {
        self.require(Flavor::LineItems, "set_quantity")?;
        let quantity = check_quantity(quantity)?;

        let mut state = self.state.write();
        let Some(pos) = state.position_by_key(product_key) else {
            return Ok(false);
        };
        let entity = &mut state.entities[pos];
        entity.ledger.replace_quantity(quantity)?;
        debug!(id = entity.id, key = %entity.key, quantity, "quantity set");
        Ok(true)
    }

    /// Delete every line for `product_key`; returns whether any was deleted
    pub fn remove_line(&self, product_key: &str) -> EngineResult<bool> {
        self.require(Flavor::LineItems, "remove_line")?;

        let mut state = self.state.write();
        let before = state.entities.len();
        state.entities.retain(|e| !e.matches_key(product_key));
        let removed = before - state.entities.len();
        if removed > 0 {
            debug!(key = product_key, removed, "line removed");
        }
        Ok(removed > 0)
    }

    pub fn line(&self, product_key: &str) -> EngineResult<LineItem> {
        self.require(Flavor::LineItems, "line")?;
        let entity = self.find_by_key(product_key)?;
        entity
            .ledger
            .line()
            .cloned()
            .ok_or_else(|| EngineError::not_found(format!("no line for {:?}", product_key)))
    }

    /// Copy of every cart line, insertion order
    pub fn lines(&self) -> EngineResult<Vec<LineItem>> {
        self.require(Flavor::LineItems, "lines")?;
        let state = self.state.read();
        Ok(state
            .entities
            .iter()
            .filter_map(|e| e.ledger.line().cloned())
            .collect())
    }

    /// Sum of unit_price * quantity over all lines
    pub fn grand_total(&self) -> EngineResult<f64> {
        let lines = self.lines()?;
        Ok(aggregate::grand_total(&lines))
    }

    // ------------------------------------------------------------------------
    // Ranking
    // ------------------------------------------------------------------------

    pub fn top_n<M: MetricFn>(&self, metric: M, n: usize) -> EngineResult<Vec<Ranked>> {
        ranking::top_n(self, metric, n)
    }

    /// Top-N using the configured `default_top_n`
    pub fn top_n_default<M: MetricFn>(&self, metric: M) -> EngineResult<Vec<Ranked>> {
        ranking::top_n(self, metric, self.config.default_top_n)
    }
}

impl Default for RecordStore {
    fn default() -> Self {
        RecordStore::new(Flavor::default())
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn grade_book() -> RecordStore {
        let store = RecordStore::new(Flavor::Ledger);
        store.create("Alice", vec![85.0, 90.0, 88.0]).unwrap();
        store.create("Bob", vec![92.0, 87.0, 91.0]).unwrap();
        store.create("Charlie", vec![78.0, 82.0, 80.0]).unwrap();
        store
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_create_assigns_increasing_ids() {
        let store = grade_book();
        let ids: Vec<EntityId> = store.all().iter().map(|e| e.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());
    }

    #[test]
    fn test_create_with_empty_ledger() {
        let store = RecordStore::new(Flavor::Ledger);
        let dana = store.create("Dana", Vec::new()).unwrap();
        assert_eq!(dana.ledger, Ledger::Values(Vec::new()));
        assert_eq!(dana.average(), 0.0);
        assert_eq!(dana.total(), 0.0);
    }

    #[test]
    fn test_create_with_metadata() {
        let store = RecordStore::new(Flavor::Ledger);
        let alice = store
            .create_with_metadata("Alice", vec![85.0], serde_json::json!({"age": 20}))
            .unwrap();
        assert_eq!(alice.metadata["age"], 20);
        assert_eq!(store.find_by_id(alice.id).unwrap().metadata["age"], 20);
    }

    #[test]
    fn test_create_rejects_non_finite_without_consuming_id() {
        let store = RecordStore::new(Flavor::Ledger);
        let err = store.create("Bad", vec![1.0, f64::NAN]).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { .. }));
        assert!(store.is_empty());

        let next = store.create("Good", vec![]).unwrap();
        assert_eq!(next.id, 1);
    }

    #[test]
    fn test_find_by_key_is_case_insensitive() {
        let store = grade_book();
        let alice = store.find_by_key("ALICE").unwrap();
        assert_eq!(alice.key, "Alice");
        assert_eq!(store.find_by_key("alice").unwrap().id, alice.id);
    }

    #[test]
    fn test_find_missing_is_not_found() {
        let store = grade_book();
        assert!(store.find_by_key("Zed").unwrap_err().is_not_found());
        assert!(store.find_by_id(42).unwrap_err().is_not_found());
    }

    #[test]
    fn test_duplicate_keys_first_match_wins() {
        let store = RecordStore::new(Flavor::Ledger);
        let first = store.create("Sam", vec![1.0]).unwrap();
        let second = store.create("SAM", vec![2.0]).unwrap();
        assert_ne!(first.id, second.id);
        assert_eq!(store.find_by_key("sam").unwrap().id, first.id);
    }

    #[test]
    fn test_reads_are_copies() {
        let store = grade_book();
        let mut alice = store.find_by_key("Alice").unwrap();
        alice.key = "Mallory".to_string();
        alice.ledger = Ledger::Values(vec![0.0]);

        let fresh = store.find_by_key("Alice").unwrap();
        assert_eq!(fresh.ledger, Ledger::Values(vec![85.0, 90.0, 88.0]));

        let mut all = store.all();
        all.clear();
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn test_remove_is_idempotent() {
        let store = grade_book();
        let bob = store.find_by_key("Bob").unwrap();
        assert!(store.remove(bob.id));
        assert!(!store.remove(bob.id));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_by_key_keeps_order() {
        let store = grade_book();
        assert!(store.remove("alice"));
        let keys: Vec<String> = store.all().into_iter().map(|e| e.key).collect();
        assert_eq!(keys, vec!["Bob", "Charlie"]);
        assert!(!store.remove("alice"));
    }

    #[test]
    fn test_clear_never_reuses_ids() {
        let store = grade_book();
        store.clear();
        assert!(store.is_empty());

        let dana = store.create("Dana", vec![]).unwrap();
        assert_eq!(dana.id, 4);
    }

    #[test]
    fn test_append_and_values() {
        let store = grade_book();
        let charlie = store.find_by_key("Charlie").unwrap();
        store.append(charlie.id, 100.0).unwrap();
        assert_eq!(
            store.values(charlie.id).unwrap(),
            vec![78.0, 82.0, 80.0, 100.0]
        );
    }

    #[test]
    fn test_append_missing_entity() {
        let store = grade_book();
        assert!(store.append(99, 1.0).unwrap_err().is_not_found());
    }

    #[test]
    fn test_append_by_key() {
        let store = grade_book();
        assert!(store.append_by_key("bob", 95.0).unwrap());
        assert!(!store.append_by_key("nobody", 95.0).unwrap());

        let bob = store.find_by_key("Bob").unwrap();
        assert_eq!(store.values(bob.id).unwrap(), vec![92.0, 87.0, 91.0, 95.0]);
    }

    #[test]
    fn test_append_rejects_infinite() {
        let store = grade_book();
        let err = store.append(1, f64::INFINITY).unwrap_err();
        assert!(matches!(err, EngineError::InvalidArgument { .. }));
        assert_eq!(store.values(1).unwrap(), vec![85.0, 90.0, 88.0]);
    }

    #[test]
    fn test_grade_store_rejects_cart_operations() {
        let store = grade_book();
        for err in [
            store.add_line("laptop", 999.99, 1).unwrap_err(),
            store.set_quantity("laptop", 2).unwrap_err(),
            store.remove_line("laptop").unwrap_err(),
            store.grand_total().unwrap_err(),
        ] {
            assert!(matches!(err, EngineError::FlavorMismatch { .. }));
        }
    }

    // ------------------------------------------------------------------------
    // Cart flavor
    // ------------------------------------------------------------------------

    fn cart() -> RecordStore {
        let store = RecordStore::new(Flavor::LineItems);
        store.add_line("laptop", 999.99, 1).unwrap();
        store.add_line("laptop", 999.99, 1).unwrap();
        store.add_line("mouse", 29.99, 2).unwrap();
        store
    }

    #[test]
    fn test_add_line_merges_same_product() {
        let store = cart();
        let lines = store.lines().unwrap();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], LineItem::new("laptop", 999.99, 2));
        assert_eq!(lines[1], LineItem::new("mouse", 29.99, 2));
        assert!(approx(store.grand_total().unwrap(), 2059.96));
    }

    #[test]
    fn test_add_line_merge_is_case_insensitive_and_keeps_price() {
        let store = cart();
        let entity = store.add_line("LAPTOP", 500.0, 3).unwrap();
        assert_eq!(entity.key, "laptop");
        assert_eq!(store.line("laptop").unwrap(), LineItem::new("laptop", 999.99, 5));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_remove_line_updates_total() {
        let store = cart();
        assert!(store.remove_line("mouse").unwrap());
        assert!(approx(store.grand_total().unwrap(), 999.99 * 2.0));
        assert!(!store.remove_line("mouse").unwrap());
    }

    #[test]
    fn test_set_quantity() {
        let store = cart();
        assert!(store.set_quantity("mouse", 5).unwrap());
        assert_eq!(store.line("mouse").unwrap().quantity, 5);

        // absent line is a no-op
        assert!(!store.set_quantity("keyboard", 1).unwrap());
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_negative_quantity_rejected_before_mutation() {
        let store = cart();
        let before = store.lines().unwrap();

        assert!(matches!(
            store.add_line("laptop", 999.99, -1).unwrap_err(),
            EngineError::InvalidArgument { .. }
        ));
        assert!(matches!(
            store.set_quantity("mouse", -3).unwrap_err(),
            EngineError::InvalidArgument { .. }
        ));
        assert!(matches!(
            store.add_line("cable", -5.0, 1).unwrap_err(),
            EngineError::InvalidArgument { .. }
        ));

        assert_eq!(store.lines().unwrap(), before);
    }

    #[test]
    fn test_cart_rejects_grade_operations() {
        let store = cart();
        for err in [
            store.create("Alice", vec![]).unwrap_err(),
            store.append(1, 1.0).unwrap_err(),
            store.values(1).unwrap_err(),
        ] {
            assert!(matches!(err, EngineError::FlavorMismatch { .. }));
        }
    }

    #[test]
    fn test_empty_cart_total_is_zero() {
        let store = RecordStore::new(Flavor::LineItems);
        assert_eq!(store.grand_total().unwrap(), 0.0);
        assert!(store.lines().unwrap().is_empty());
        assert!(store.line("laptop").unwrap_err().is_not_found());
    }

    #[test]
    fn test_cart_clear() {
        let store = cart();
        store.clear();
        assert_eq!(store.grand_total().unwrap(), 0.0);
        assert_eq!(store.add_line("mouse", 29.99, 1).unwrap().id, 3);
    }

    #[test]
    fn test_with_config_validates() {
        let config = EngineConfig {
            flavor: Flavor::Ledger,
            default_top_n: 0,
        };
        assert!(RecordStore::with_config(config).is_err());
    }

    #[test]
    fn test_store_is_shareable_across_threads() {
        let store = Arc::new(RecordStore::new(Flavor::Ledger));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for i in 0..25 {
                        store.create(format!("s{}-{}", t, i), vec![i as f64]).unwrap();
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let mut ids: Vec<EntityId> = store.all().iter().map(|e| e.id).collect();
        assert_eq!(ids.len(), 100);
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 100);
    }
}
