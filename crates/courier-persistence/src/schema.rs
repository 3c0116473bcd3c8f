//! Esquema Diesel (declarado manualmente). Reemplazable con `diesel print-schema`.

diesel::table! {
    delivery_events (seq) {
        seq -> BigInt,
        workspace_id -> Uuid,
        user_id -> Text,
        message_id -> Uuid,
        event_type -> Text,
        ts -> Timestamptz,
        payload -> Jsonb,
    }
}
