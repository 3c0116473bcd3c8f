//! Modelos derivados expuestos por la búsqueda (Delivery, DeliveryPage).

mod delivery;

pub use delivery::{Delivery, DeliveryPage};
