//! Vista derivada de una entrega.
//!
//! Una `Delivery` existe por cada `message_id` distinto observado dentro de
//! un workspace. No se persiste: es una proyección pura del conjunto de
//! eventos visible al momento de la consulta, recalculable siempre.
use chrono::{DateTime, Utc};
use courier_domain::{DeliveryContext, MessageVariant};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::event::LifecycleEventType;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Delivery {
    pub workspace_id: Uuid,
    pub user_id: String,
    pub message_id: Uuid,
    /// Tipo del evento más reciente del grupo. Nunca se almacena.
    pub status: LifecycleEventType,
    /// Timestamp del evento ganador.
    pub updated_at: DateTime<Utc>,
    /// Identificadores del evento de despacho; vacío si el grupo no tiene
    /// despacho (escenario de eventos parciales).
    #[serde(flatten)]
    pub context: DeliveryContext,
    /// Payload de canal del evento de despacho, si existe.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub variant: Option<MessageVariant>,
}

/// Página de resultados: items en el orden total de la búsqueda más el token
/// para continuar. `cursor` presente sii quedan resultados detrás de la
/// frontera.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPage {
    pub items: Vec<Delivery>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cursor: Option<String>,
}
