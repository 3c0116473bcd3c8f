//! Normalizador de eventos: shapes heterogéneas → representación canónica.
//!
//! El payload de un evento de despacho existe en dos versiones de esquema:
//! - vigente, anidada: `{"variant": {"type": "Email", ...}, "journeyId": ...}`
//! - legacy, plana: `{"channel": "Email", "from": ..., "to": ..., ...}`
//!
//! Ambas se modelan como un conjunto cerrado de shapes de entrada
//! (`DispatchPayload`) con una conversión explícita y total hacia
//! `MessageVariant`; la derivación de estado nunca inspecciona presencia de
//! campos. Las dos shapes deben producir Deliveries idénticas aguas abajo.
use serde::Deserialize;
use serde_json::Value;

use chrono::{DateTime, Utc};
use courier_domain::{ChannelType, DeliveryContext, MessageVariant};
use uuid::Uuid;

use crate::errors::DeliveryCoreError;
use crate::event::{EventRecord, LifecycleEventType};

/// Evento canónico de ciclo de vida, listo para la agregación.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedEvent {
    pub seq: u64,
    pub user_id: String,
    pub message_id: Uuid,
    pub event_type: LifecycleEventType,
    pub ts: DateTime<Utc>,
    pub context: DeliveryContext,
    /// Sólo presente en eventos de despacho.
    pub variant: Option<MessageVariant>,
}

/// Shapes reconocidas del payload de despacho. `untagged`: se intenta primero
/// la vigente (requiere la clave `variant`) y después la legacy (requiere
/// `channel`).
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum DispatchPayload {
    Nested(NestedDispatch),
    Legacy(LegacyDispatch),
}

#[derive(Debug, Deserialize)]
struct NestedDispatch {
    variant: MessageVariant,
    #[serde(flatten)]
    context: DeliveryContext,
}

/// Shape plana histórica: campos de canal al tope del payload.
#[derive(Debug, Deserialize)]
struct LegacyDispatch {
    channel: ChannelType,
    #[serde(default)]
    from: Option<String>,
    #[serde(default)]
    to: Option<String>,
    #[serde(default)]
    subject: Option<String>,
    #[serde(default)]
    body: Option<String>,
    #[serde(flatten)]
    context: DeliveryContext,
}

impl LegacyDispatch {
    /// Conversión total de la shape legacy al `variant` vigente. Los campos
    /// legacy sin equivalente actual se omiten (no se inventan valores).
    fn into_parts(self) -> (DeliveryContext, MessageVariant) {
        let variant = match self.channel {
            ChannelType::Email => MessageVariant::Email { from: self.from.unwrap_or_default(),
                                                          to: self.to.unwrap_or_default(),
                                                          subject: self.subject,
                                                          body: self.body,
                                                          provider: None },
            ChannelType::Sms => MessageVariant::Sms { from: self.from,
                                                      to: self.to.unwrap_or_default(),
                                                      body: self.body,
                                                      provider: None },
            ChannelType::Push => MessageVariant::Push { to: self.to.unwrap_or_default(),
                                                        title: self.subject,
                                                        body: self.body,
                                                        provider: None },
        };
        (self.context, variant)
    }
}

/// Normaliza un registro crudo del log.
///
/// - `Ok(None)`: el tipo no pertenece al ciclo de vida; queda fuera de la
///   agregación sin ser un error.
/// - `Err(MalformedEvent)`: el registro no declara tipo alguno. Esto se
///   detecta también en el append; en el camino de consulta no debería
///   observarse nunca.
///
/// Función pura, sin efectos.
pub fn normalize_event(record: &EventRecord) -> Result<Option<NormalizedEvent>, DeliveryCoreError> {
    if record.event_type.trim().is_empty() {
        return Err(DeliveryCoreError::MalformedEvent);
    }
    let Some(event_type) = LifecycleEventType::parse(&record.event_type) else {
        return Ok(None);
    };

    let (context, variant) = if event_type == LifecycleEventType::Dispatched {
        parse_dispatch_payload(&record.payload)
    } else {
        // Los eventos no-despacho sólo aportan identificadores; el variant es
        // propiedad exclusiva del despacho.
        (parse_context(&record.payload), None)
    };

    Ok(Some(NormalizedEvent { seq: record.seq,
                              user_id: record.user_id.clone(),
                              message_id: record.message_id,
                              event_type,
                              ts: truncate_to_micros(record.ts),
                              context,
                              variant }))
}

/// Canonicaliza el timestamp a microsegundos. Tanto `timestamptz` de Postgres
/// como el claim `updatedAt` del cursor llevan micros; truncar aquí asegura
/// que el orden derivado y la frontera keyset midan con el mismo reloj, sin
/// importar el backend del log.
fn truncate_to_micros(ts: DateTime<Utc>) -> DateTime<Utc> {
    DateTime::from_timestamp_micros(ts.timestamp_micros()).unwrap_or(ts)
}

/// Interpreta el payload de un despacho. Si no calza con ninguna shape
/// conocida se degrada a contexto-solo (variant ausente): la normalización es
/// total sobre su dominio declarado.
fn parse_dispatch_payload(payload: &Value) -> (DeliveryContext, Option<MessageVariant>) {
    match serde_json::from_value::<DispatchPayload>(payload.clone()) {
        Ok(DispatchPayload::Nested(n)) => (n.context, Some(n.variant)),
        Ok(DispatchPayload::Legacy(l)) => {
            let (context, variant) = l.into_parts();
            (context, Some(variant))
        }
        Err(_) => (parse_context(payload), None),
    }
}

fn parse_context(payload: &Value) -> DeliveryContext {
    serde_json::from_value(payload.clone()).unwrap_or_default()
}
