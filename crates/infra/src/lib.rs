//! Infrastructure layer: inventory store backends and the mutation pipeline.

pub mod in_flight;
pub mod mutator;
pub mod store;


pub use in_flight::{InFlightGuard, InFlightSet};
pub use mutator::{
    InventoryMutator, MutationError, MutationReport, MutatorConfig, RefreshMode, RetryPolicy,
};
pub use store::{
    COLLECTION, InMemoryInventoryStore, InventoryStore, PostgresInventoryStore, StoreError,
    StoredItem,
};
