//! Identificadores contextuales que acompañan al evento de despacho.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Contexto de origen de un envío: journey/run/node/template/broadcast.
///
/// Todos los campos son opcionales: un envío puede originarse fuera de un
/// journey (p. ej. un broadcast) y los eventos posteriores al despacho no
/// están obligados a repetirlos. La agregación los toma únicamente del evento
/// de despacho del grupo.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeliveryContext {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub journey_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub run_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub node_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub template_id: Option<Uuid>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub broadcast_id: Option<Uuid>,
}

impl DeliveryContext {
    /// `true` si ningún identificador está presente.
    pub fn is_empty(&self) -> bool {
        self.journey_id.is_none()
            && self.run_id.is_none()
            && self.node_id.is_none()
            && self.template_id.is_none()
            && self.broadcast_id.is_none()
    }
}
