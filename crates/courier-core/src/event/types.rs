//! Tipos de evento de ciclo de vida y registros crudos del log.
//!
//! Rol en el sistema:
//! - La ingesta (colaborador externo) valida y persiste `EventRecord`s en un
//!   log append-only; nunca se mutan ni se borran.
//! - El `message_id` es estable para todos los eventos de un mismo intento de
//!   entrega; `seq` es el orden de inserción asignado por el store y actúa
//!   como clave secundaria determinista en la agregación.
//! - El enum `LifecycleEventType` define el conjunto cerrado de etapas que sí
//!   son relevantes para el estado de entrega; cualquier otra etiqueta cruda
//!   queda fuera de la agregación sin ser un error.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// Etapas del ciclo de vida de una entrega.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LifecycleEventType {
    /// Despacho del mensaje. Único tipo que transporta el `variant` completo
    /// y los identificadores contextuales. Invariante: debería ser el primer
    /// evento de un `message_id`.
    Dispatched,
    Delivered,
    Opened,
    Clicked,
    Bounced,
    Complained,
    Failed,
}

impl LifecycleEventType {
    /// Interpreta la etiqueta cruda del registro. `None` si el tipo no forma
    /// parte del conjunto de ciclo de vida (no es un error: simplemente no es
    /// relevante para el estado de entrega).
    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "dispatched" => Some(Self::Dispatched),
            "delivered" => Some(Self::Delivered),
            "opened" => Some(Self::Opened),
            "clicked" => Some(Self::Clicked),
            "bounced" => Some(Self::Bounced),
            "complained" => Some(Self::Complained),
            "failed" => Some(Self::Failed),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Dispatched => "dispatched",
            Self::Delivered => "delivered",
            Self::Opened => "opened",
            Self::Clicked => "clicked",
            Self::Bounced => "bounced",
            Self::Complained => "complained",
            Self::Failed => "failed",
        }
    }
}

impl std::fmt::Display for LifecycleEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Registro inmutable del log, tal como lo persiste la ingesta.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventRecord {
    /// Orden de inserción asignado por el store (clave de desempate).
    pub seq: u64,
    pub workspace_id: Uuid,
    pub user_id: String,
    pub message_id: Uuid,
    /// Etiqueta cruda; puede no pertenecer al conjunto de ciclo de vida.
    pub event_type: String,
    pub ts: DateTime<Utc>,
    /// Payload semi-estructurado; su shape varía por tipo y por versión de
    /// esquema (flat legacy vs. `variant` anidado).
    pub payload: Value,
}

/// Registro aún sin `seq` ni workspace: entrada del append.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewEventRecord {
    pub user_id: String,
    pub message_id: Uuid,
    pub event_type: String,
    pub ts: DateTime<Utc>,
    pub payload: Value,
}
