//! Errores del core (todos recuperables: el caller corrige y reintenta).

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Serialize, Deserialize)]
pub enum DeliveryCoreError {
    /// El evento no declara su tipo de ciclo de vida. Se rechaza en el append
    /// (lado ingesta); nunca llega a la derivación de estado.
    #[error("event is missing its lifecycle event type")] MalformedEvent,
    /// El cursor no decodifica a una frontera válida o no corresponde al
    /// workspace consultado.
    #[error("invalid pagination cursor")] InvalidCursor,
    #[error("invalid argument: {0}")] InvalidArgument(String),
    #[error("storage: {0}")] Storage(String),
}
