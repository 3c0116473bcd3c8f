//! Codec de cursor keyset para la paginación de entregas.
//!
//! El cursor codifica la posición en el orden total de la búsqueda
//! (`updated_at` desc, `message_id` desc) del último item devuelto: frontera
//! por valores de la clave de orden, no por offset de fila. Inserciones
//! concurrentes nunca desplazan la frontera, por lo que un caller a mitad de
//! paginación no ve duplicados ni saltos por debajo de ella.
//!
//! Formato: claims JSON `{v, workspaceId, updatedAt (micros), messageId}`
//! en base64 url-safe sin padding. El token queda ligado al workspace que lo
//! originó: decodificarlo contra otro workspace es `InvalidCursor`.
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::constants::CURSOR_VERSION;
use crate::errors::DeliveryCoreError;
use crate::model::Delivery;

#[derive(Debug, Serialize, Deserialize)]
struct CursorClaims {
    v: u8,
    #[serde(rename = "workspaceId")]
    workspace_id: Uuid,
    /// Micros desde epoch: conserva la precisión del timestamp del evento.
    #[serde(rename = "updatedAt")]
    updated_at_micros: i64,
    #[serde(rename = "messageId")]
    message_id: Uuid,
}

/// Frontera decodificada: se retoma estrictamente después de esta posición.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorBoundary {
    pub updated_at: DateTime<Utc>,
    pub message_id: Uuid,
}

/// Codifica la posición del último item de la página.
pub fn encode_cursor(workspace_id: Uuid, last: &Delivery) -> String {
    let claims = CursorClaims { v: CURSOR_VERSION,
                                workspace_id,
                                updated_at_micros: last.updated_at.timestamp_micros(),
                                message_id: last.message_id };
    let bytes = serde_json::to_vec(&claims).expect("serialize cursor claims");
    URL_SAFE_NO_PAD.encode(bytes)
}

/// Decodifica y valida un token. Cualquier token alterado, de versión
/// desconocida o emitido para otro workspace se rechaza con `InvalidCursor`.
pub fn decode_cursor(token: &str, workspace_id: Uuid) -> Result<CursorBoundary, DeliveryCoreError> {
    let bytes = URL_SAFE_NO_PAD.decode(token.as_bytes())
                               .map_err(|_| DeliveryCoreError::InvalidCursor)?;
    let claims: CursorClaims =
        serde_json::from_slice(&bytes).map_err(|_| DeliveryCoreError::InvalidCursor)?;
    if claims.v != CURSOR_VERSION || claims.workspace_id != workspace_id {
        return Err(DeliveryCoreError::InvalidCursor);
    }
    let updated_at = DateTime::from_timestamp_micros(claims.updated_at_micros)
        .ok_or(DeliveryCoreError::InvalidCursor)?;
    Ok(CursorBoundary { updated_at, message_id: claims.message_id })
}
