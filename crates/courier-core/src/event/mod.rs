//! Registros del log de eventos y trait EventLogStore.

mod store;
mod types;

pub use store::{EventLogStore, InMemoryEventLog};
pub use types::{EventRecord, LifecycleEventType, NewEventRecord};
