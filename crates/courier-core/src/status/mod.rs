//! Derivación de estado: de grupos de eventos a una `Delivery` por mensaje.
//!
//! El estado nunca se almacena; es una función pura del conjunto de eventos
//! visible a la consulta. El fold por grupo (`DeliveryBuilder::apply`) es
//! incremental: la llegada de un evento nuevo para un `message_id` existente
//! sólo toca ese grupo, y el resultado es observablemente equivalente a
//! recomputar desde el conjunto completo.
use std::collections::HashMap;

use chrono::{DateTime, Utc};
use courier_domain::{DeliveryContext, MessageVariant};
use uuid::Uuid;

use crate::event::LifecycleEventType;
use crate::model::Delivery;
use crate::normalize::NormalizedEvent;

/// Acumulador incremental de una entrega (un `message_id`).
#[derive(Debug, Clone)]
pub struct DeliveryBuilder {
    user_id: String,
    message_id: Uuid,
    status: LifecycleEventType,
    updated_at: DateTime<Utc>,
    latest_seq: u64,
    dispatch_seq: Option<u64>,
    context: DeliveryContext,
    variant: Option<MessageVariant>,
}

impl DeliveryBuilder {
    pub fn start(ev: NormalizedEvent) -> Self {
        let mut builder = Self { user_id: ev.user_id.clone(),
                                 message_id: ev.message_id,
                                 status: ev.event_type,
                                 updated_at: ev.ts,
                                 latest_seq: ev.seq,
                                 dispatch_seq: None,
                                 context: DeliveryContext::default(),
                                 variant: None };
        builder.absorb_dispatch(&ev);
        builder
    }

    /// Aplica un evento del mismo grupo.
    ///
    /// Gana el evento con máximo `(ts, seq)`: el desempate por orden de
    /// inserción hace el resultado estable y reproducible para un conjunto
    /// fijo de eventos.
    pub fn apply(&mut self, ev: NormalizedEvent) {
        debug_assert_eq!(ev.message_id, self.message_id);
        if (ev.ts, ev.seq) > (self.updated_at, self.latest_seq) {
            self.status = ev.event_type;
            self.updated_at = ev.ts;
            self.latest_seq = ev.seq;
        }
        self.absorb_dispatch(&ev);
    }

    /// El contexto y el variant provienen del despacho del grupo (primero por
    /// `seq` si hubiera más de uno). Si el grupo no tiene despacho quedan
    /// ausentes, nunca adivinados.
    fn absorb_dispatch(&mut self, ev: &NormalizedEvent) {
        if ev.event_type != LifecycleEventType::Dispatched {
            return;
        }
        match self.dispatch_seq {
            Some(existing) if existing <= ev.seq => {}
            _ => {
                self.dispatch_seq = Some(ev.seq);
                self.context = ev.context.clone();
                self.variant = ev.variant.clone();
            }
        }
    }

    pub fn into_delivery(self, workspace_id: Uuid) -> Delivery {
        Delivery { workspace_id,
                   user_id: self.user_id,
                   message_id: self.message_id,
                   status: self.status,
                   updated_at: self.updated_at,
                   context: self.context,
                   variant: self.variant }
    }
}

/// Agrupa eventos normalizados por `message_id` y produce exactamente una
/// `Delivery` por grupo. El orden de salida no está definido; lo fija el
/// planner de búsqueda.
pub fn derive_deliveries(workspace_id: Uuid,
                         events: impl IntoIterator<Item = NormalizedEvent>)
                         -> Vec<Delivery> {
    let mut groups: HashMap<Uuid, DeliveryBuilder> = HashMap::new();
    for ev in events {
        match groups.get_mut(&ev.message_id) {
            Some(builder) => builder.apply(ev),
            None => {
                groups.insert(ev.message_id, DeliveryBuilder::start(ev));
            }
        }
    }
    groups.into_values().map(|b| b.into_delivery(workspace_id)).collect()
}
