// courier-domain library entry point
pub mod channel;
pub mod context;
pub mod error;
pub use channel::{ChannelType, MessageVariant, ProviderRef};
pub use context::DeliveryContext;
pub use error::DomainError;
