//! courier-persistence
//!
//! Implementación Postgres (Diesel) del log de eventos de entrega. El log es
//! propiedad de la ingesta; este crate sólo materializa el contrato
//! `EventLogStore` del core sobre una tabla append-only, con paridad 1:1
//! respecto al backend en memoria: la misma búsqueda sobre los mismos eventos
//! debe producir la misma página.
//!
//! Módulos:
//! - `pg`: store sobre Postgres (tabla `delivery_events`, sin updates ni
//!   deletes) con retry/backoff para errores transitorios.
//! - `migrations`: runner embebido de migraciones Diesel.
//! - `config`: carga de configuración desde variables de entorno / `.env`.
//! - `schema`: tabla Diesel declarada para compilar queries.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::init_dotenv;
pub use error::PersistenceError;
pub use pg::{build_dev_pool_from_env, build_pool, ConnectionProvider, PgEventLog, PgPool, PoolProvider};
