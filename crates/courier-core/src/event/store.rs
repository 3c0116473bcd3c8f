use std::collections::HashMap;

use uuid::Uuid;

use super::{EventRecord, NewEventRecord};
use crate::errors::DeliveryCoreError;

/// Log de eventos append-only, particionado por workspace.
pub trait EventLogStore {
    /// Valida y agrega un registro, devolviéndolo completo (con `seq`).
    /// Un registro sin tipo de evento se rechaza con `MalformedEvent`.
    fn append(&mut self, workspace_id: Uuid, record: NewEventRecord) -> Result<EventRecord, DeliveryCoreError>;

    /// Agrega un lote en orden; es el punto de entrada del colaborador de
    /// ingesta. Falla en el primer registro inválido.
    fn append_batch(&mut self,
                    workspace_id: Uuid,
                    batch: Vec<NewEventRecord>)
                    -> Result<Vec<EventRecord>, DeliveryCoreError> {
        let mut out = Vec::with_capacity(batch.len());
        for record in batch {
            out.push(self.append(workspace_id, record)?);
        }
        Ok(out)
    }

    /// Lista todos los eventos de un workspace (orden ascendente por `seq`).
    /// Un workspace sin eventos devuelve un vector vacío, no un error.
    fn list(&self, workspace_id: Uuid) -> Result<Vec<EventRecord>, DeliveryCoreError>;
}

pub struct InMemoryEventLog {
    pub inner: HashMap<Uuid, Vec<EventRecord>>,
}

impl Default for InMemoryEventLog {
    fn default() -> Self {
        Self { inner: HashMap::new() }
    }
}

impl EventLogStore for InMemoryEventLog {
    fn append(&mut self, workspace_id: Uuid, record: NewEventRecord) -> Result<EventRecord, DeliveryCoreError> {
        if record.event_type.trim().is_empty() {
            return Err(DeliveryCoreError::MalformedEvent);
        }
        let vec = self.inner.entry(workspace_id).or_default();
        let seq = vec.len() as u64;
        let ev = EventRecord { seq,
                               workspace_id,
                               user_id: record.user_id,
                               message_id: record.message_id,
                               event_type: record.event_type,
                               ts: record.ts,
                               payload: record.payload };
        vec.push(ev.clone());
        Ok(ev)
    }

    fn list(&self, workspace_id: Uuid) -> Result<Vec<EventRecord>, DeliveryCoreError> {
        Ok(self.inner.get(&workspace_id).cloned().unwrap_or_default())
    }
}
