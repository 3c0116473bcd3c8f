//! Implementación Postgres (Diesel) del `EventLogStore` del core.
//!
//! Objetivo del módulo:
//! - Proveer un log de eventos durable con paridad 1:1 respecto al backend en
//!   memoria: append-only con orden total por `seq` (BIGSERIAL), sin updates
//!   ni deletes.
//! - Lectura por `workspace_id` ordenada por `seq`, equivalente al backend
//!   in-memory; la derivación de estado del core queda aislada del mapeo
//!   dominio ↔ filas.
//! - Manejo básico de errores transitorios: reintento con backoff en `append`
//!   y `list`.
//!
//! La validación de ingesta (tipo de evento presente) ocurre ANTES de tocar
//! la base: un registro malformado nunca se inserta.

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, warn};
use serde_json::Value;
use uuid::Uuid;

use courier_core::{DeliveryCoreError, EventLogStore, EventRecord, NewEventRecord};

use crate::config::DbConfig;
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::delivery_events;

/// Alias de tipo para el pool r2d2 de conexiones Postgres.
///
/// Al construirlo se corre automáticamente el set de migraciones pendientes
/// (una sola vez).
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones.
///
/// Permite inyectar un pool real (producción / tests de integración) o
/// simular en tests unitarios sin acoplar a r2d2.
///
/// Contrato: devuelve una conexión válida o `PersistenceError::TransientIo`
/// en caso de error.
pub trait ConnectionProvider: Send + Sync + 'static {
    /// Obtiene una conexión lista para ejecutar consultas Diesel.
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError>;
}

/// Implementación concreta de `ConnectionProvider` respaldada por un `PgPool`.
pub struct PoolProvider {
    pub pool: PgPool,
}
impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<r2d2::PooledConnection<ConnectionManager<PgConnection>>, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Construye un pool y corre las migraciones pendientes.
pub fn build_pool(url: &str, min: u32, max: u32) -> Result<PgPool, PersistenceError> {
    let manager = ConnectionManager::<PgConnection>::new(url);
    let pool = r2d2::Pool::builder().min_idle(Some(min))
                                    .max_size(max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    let mut conn = pool.get()
                       .map_err(|e| PersistenceError::TransientIo(format!("pool get: {e}")))?;
    run_pending_migrations(&mut conn)?;
    Ok(pool)
}

/// Pool de desarrollo a partir de `DATABASE_URL` (+ `.env` si existe).
pub fn build_dev_pool_from_env() -> Result<PgPool, PersistenceError> {
    crate::config::init_dotenv();
    let cfg = DbConfig::from_env();
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

/// Fila para insertar en `delivery_events`. El `seq` lo asigna la base
/// (BIGSERIAL) y se devuelve vía `RETURNING`.
#[derive(Insertable, Debug)]
#[diesel(table_name = delivery_events)]
struct NewEventRow<'a> {
    workspace_id: &'a Uuid,
    user_id: &'a str,
    message_id: &'a Uuid,
    event_type: &'a str,
    ts: DateTime<Utc>,
    payload: &'a Value,
}

/// Fila mapeada de `delivery_events` para lecturas.
#[derive(Queryable, Debug)]
struct EventRow {
    seq: i64,
    workspace_id: Uuid,
    user_id: String,
    message_id: Uuid,
    event_type: String,
    ts: DateTime<Utc>,
    payload: Value,
}

impl From<EventRow> for EventRecord {
    fn from(row: EventRow) -> Self {
        EventRecord { seq: row.seq as u64,
                      workspace_id: row.workspace_id,
                      user_id: row.user_id,
                      message_id: row.message_id,
                      event_type: row.event_type,
                      ts: row.ts,
                      payload: row.payload }
    }
}

/// Determina si un error es transitorio (recomendado reintentar con backoff).
///
/// Cubre conflictos de serialización, errores de IO de pool/conexión y
/// mensajes comunes de desconexión/timeout detectados por texto
/// (best-effort, sin acoplar a SQLSTATE).
fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict => true,
        PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access due to concurrent update")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Retry simple con backoff exponencial muy pequeño (hasta 3 intentos,
/// 15/30/45 ms). No altera semántica: sólo repite la unidad de trabajo.
fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < 3 => {
                let delay_ms = 15 * ((attempts + 1) as u64);
                warn!("retryable error (attempt {}): {:?} -> sleeping {}ms",
                      attempts + 1,
                      e,
                      delay_ms);
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempts += 1;
            }
            r => return r,
        }
    }
}

fn storage_error(e: PersistenceError) -> DeliveryCoreError {
    DeliveryCoreError::Storage(e.to_string())
}

/// Log de eventos sobre Postgres (append-only).
///
/// Responsabilidades:
/// - `append`: validar e insertar un registro, devolviendo el `seq` asignado.
/// - `list`: devolver todos los eventos de un workspace ordenados por `seq`
///   (misma vista que el backend in-memory).
pub struct PgEventLog<P: ConnectionProvider> {
    pub provider: P,
}
impl<P: ConnectionProvider> PgEventLog<P> {
    /// Crea un `PgEventLog` a partir de un `ConnectionProvider` (generalmente
    /// `PoolProvider`).
    pub fn new(provider: P) -> Self {
        Self { provider }
    }
}

impl<P: ConnectionProvider> EventLogStore for PgEventLog<P> {
    fn append(&mut self, workspace_id: Uuid, record: NewEventRecord) -> Result<EventRecord, DeliveryCoreError> {
        if record.event_type.trim().is_empty() {
            return Err(DeliveryCoreError::MalformedEvent);
        }
        debug!("append:start workspace_id={workspace_id} event_type={}", record.event_type);
        let seq: i64 = with_retry(|| {
                           let mut conn = self.provider.connection()?;
                           diesel::insert_into(delivery_events::table)
                               .values(NewEventRow { workspace_id: &workspace_id,
                                                     user_id: &record.user_id,
                                                     message_id: &record.message_id,
                                                     event_type: &record.event_type,
                                                     ts: record.ts,
                                                     payload: &record.payload })
                               .returning(delivery_events::seq)
                               .get_result(&mut conn)
                               .map_err(PersistenceError::from)
                       }).map_err(storage_error)?;
        debug!("append:done workspace_id={workspace_id} seq={seq}");
        Ok(EventRecord { seq: seq as u64,
                         workspace_id,
                         user_id: record.user_id,
                         message_id: record.message_id,
                         event_type: record.event_type,
                         ts: record.ts,
                         payload: record.payload })
    }

    fn list(&self, workspace_id: Uuid) -> Result<Vec<EventRecord>, DeliveryCoreError> {
        debug!("list:start workspace_id={workspace_id}");
        let rows: Vec<EventRow> = with_retry(|| {
                                      let mut conn = self.provider.connection()?;
                                      delivery_events::table.filter(delivery_events::workspace_id.eq(workspace_id))
                                                            .order(delivery_events::seq.asc())
                                                            .load(&mut conn)
                                                            .map_err(PersistenceError::from)
                                  }).map_err(storage_error)?;
        debug!("list:done workspace_id={workspace_id} count={}", rows.len());
        Ok(rows.into_iter().map(EventRecord::from).collect())
    }
}
