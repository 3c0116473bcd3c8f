//! Planner de búsqueda de entregas y ensamblado de páginas.
//!
//! `search_deliveries` es la operación de consulta del core: traduce filtros
//! opcionales más un cursor a un plan de escaneo/agregación sobre el log de
//! eventos, en cuatro pasos:
//! 1. normalizar los registros crudos del workspace (los tipos ajenos al
//!    ciclo de vida quedan fuera, en silencio);
//! 2. derivar una `Delivery` por `message_id` (último evento gana);
//! 3. filtrar sobre la vista DERIVADA (journey/broadcast desde el contexto
//!    del despacho, canal desde el variant) y ordenar por el orden total
//!    `updated_at` desc, `message_id` desc;
//! 4. acotar la ventana con la frontera keyset y ensamblar la página.
//!
//! La consulta es de sólo lectura e idempotente: no muta estado compartido y
//! con un log sin cambios devuelve páginas idénticas.
use uuid::Uuid;

use courier_domain::ChannelType;

use crate::constants::DEFAULT_PAGE_LIMIT;
use crate::cursor::{decode_cursor, encode_cursor, CursorBoundary};
use crate::errors::DeliveryCoreError;
use crate::event::EventLogStore;
use crate::model::{Delivery, DeliveryPage};
use crate::normalize::normalize_event;
use crate::status::derive_deliveries;

/// Parámetros de `search_deliveries`. `workspace_id` es obligatorio; los
/// filtros restantes son opcionales y conjuntivos (semántica AND).
#[derive(Debug, Clone)]
pub struct DeliverySearchParams {
    pub workspace_id: Uuid,
    pub user_id: Option<String>,
    pub journey_id: Option<Uuid>,
    pub message_id: Option<Uuid>,
    pub broadcast_id: Option<Uuid>,
    pub channel: Option<ChannelType>,
    /// Cota superior de items por página. Cero es `InvalidArgument`.
    pub limit: usize,
    pub cursor: Option<String>,
}

impl DeliverySearchParams {
    /// Parámetros sin filtros para un workspace, con el límite por defecto.
    pub fn for_workspace(workspace_id: Uuid) -> Self {
        Self { workspace_id,
               user_id: None,
               journey_id: None,
               message_id: None,
               broadcast_id: None,
               channel: None,
               limit: DEFAULT_PAGE_LIMIT,
               cursor: None }
    }
}

/// Ejecuta la búsqueda y devuelve una página de entregas.
///
/// Garantías:
/// - devuelve a lo sumo `limit` entregas por llamada;
/// - un workspace sin eventos produce una página vacía, no un error;
/// - bajo inserciones concurrentes, los items por debajo de la frontera del
///   cursor no se duplican ni se saltan (semántica keyset).
pub fn search_deliveries<S>(store: &S,
                            params: &DeliverySearchParams)
                            -> Result<DeliveryPage, DeliveryCoreError>
    where S: EventLogStore + ?Sized
{
    if params.limit == 0 {
        return Err(DeliveryCoreError::InvalidArgument("limit must be positive".into()));
    }
    let boundary = match params.cursor.as_deref() {
        Some(token) => Some(decode_cursor(token, params.workspace_id)?),
        None => None,
    };

    let records = store.list(params.workspace_id)?;
    // Registros malformados no llegan al camino de consulta (el append los
    // rechaza); si apareciera alguno se excluye igual que un tipo ajeno.
    let normalized = records.iter().filter_map(|r| normalize_event(r).ok().flatten());

    let mut deliveries = derive_deliveries(params.workspace_id, normalized);
    deliveries.retain(|d| matches_filters(d, params));
    deliveries.sort_by(|a, b| {
                  b.updated_at
                   .cmp(&a.updated_at)
                   .then_with(|| b.message_id.cmp(&a.message_id))
              });
    if let Some(boundary) = boundary {
        deliveries.retain(|d| is_after_boundary(d, &boundary));
    }

    Ok(assemble_page(deliveries, params.limit, params.workspace_id))
}

/// Filtrado sobre la vista derivada, nunca sobre eventos individuales: un
/// filtro por journey debe calzar con el contexto del despacho del grupo, no
/// con cualquier evento que lo mencione incidentalmente.
fn matches_filters(d: &Delivery, p: &DeliverySearchParams) -> bool {
    if let Some(user_id) = &p.user_id {
        if &d.user_id != user_id {
            return false;
        }
    }
    if let Some(journey_id) = p.journey_id {
        if d.context.journey_id != Some(journey_id) {
            return false;
        }
    }
    if let Some(message_id) = p.message_id {
        if d.message_id != message_id {
            return false;
        }
    }
    if let Some(broadcast_id) = p.broadcast_id {
        if d.context.broadcast_id != Some(broadcast_id) {
            return false;
        }
    }
    if let Some(channel) = p.channel {
        if d.variant.as_ref().map(|v| v.channel()) != Some(channel) {
            return false;
        }
    }
    true
}

/// Posición estrictamente posterior a la frontera bajo el orden total
/// descendente (`updated_at`, `message_id`).
fn is_after_boundary(d: &Delivery, boundary: &CursorBoundary) -> bool {
    (d.updated_at, d.message_id) < (boundary.updated_at, boundary.message_id)
}

/// Ensamblador de resultados: recorta la ventana al límite pedido y emite el
/// cursor sólo si quedaron entregas detrás. El orden del planner se preserva
/// sin modificación.
fn assemble_page(mut ordered: Vec<Delivery>, limit: usize, workspace_id: Uuid) -> DeliveryPage {
    let cursor = if ordered.len() > limit {
        ordered.truncate(limit);
        ordered.last().map(|last| encode_cursor(workspace_id, last))
    } else {
        None
    };
    DeliveryPage { items: ordered, cursor }
}
