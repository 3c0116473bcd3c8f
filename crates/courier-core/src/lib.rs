//! courier-core: vista derivada de entregas sobre un log de eventos append-only
pub mod constants;
pub mod cursor;
pub mod errors;
pub mod event;
pub mod model;
pub mod normalize;
pub mod search;
pub mod status;

pub use cursor::{decode_cursor, encode_cursor, CursorBoundary};
pub use errors::DeliveryCoreError;
pub use event::{EventLogStore, EventRecord, InMemoryEventLog, LifecycleEventType, NewEventRecord};
pub use model::{Delivery, DeliveryPage};
pub use normalize::{normalize_event, NormalizedEvent};
pub use search::{search_deliveries, DeliverySearchParams};
pub use status::derive_deliveries;
