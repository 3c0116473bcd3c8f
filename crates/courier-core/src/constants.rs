//! Constantes del core de búsqueda.
//!
//! Este módulo agrupa valores estáticos que participan en la compatibilidad
//! entre versiones del formato de cursor y en los defaults de paginación.

/// Tamaño de página por defecto cuando el caller no especifica `limit`.
pub const DEFAULT_PAGE_LIMIT: usize = 20;

/// Versión lógica del formato de cursor. Se incluye en los claims del token
/// para que un cambio incompatible de formato invalide cursors antiguos de
/// forma explícita (`InvalidCursor`) en lugar de decodificarlos mal.
pub const CURSOR_VERSION: u8 = 1;
