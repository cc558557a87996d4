// Entity Models
// "Identity persists, values change"
//
// Each entity has:
// - Stable integer identity that is never reused
// - A case-insensitive lookup key
// - A ledger of numeric contributions owned by the store

pub mod record;

pub use record::{Entity, EntityId, EntityRef, RecordStore};
