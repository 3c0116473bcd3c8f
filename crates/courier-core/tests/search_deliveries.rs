use chrono::{DateTime, Duration, TimeZone, Utc};
use courier_core::{search_deliveries, DeliveryCoreError, DeliverySearchParams, EventLogStore,
                   InMemoryEventLog, LifecycleEventType, NewEventRecord};
use courier_domain::ChannelType;
use serde_json::{json, Value};
use uuid::Uuid;

fn base_ts() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 0, 0).unwrap()
}

fn at_offset(offset_ms: i64) -> DateTime<Utc> {
    base_ts() + Duration::milliseconds(offset_ms)
}

fn event(user_id: &str, message_id: Uuid, event_type: &str, offset_ms: i64, payload: Value) -> NewEventRecord {
    NewEventRecord { user_id: user_id.into(),
                     message_id,
                     event_type: event_type.into(),
                     ts: at_offset(offset_ms),
                     payload }
}

fn email_dispatch_payload(journey_id: Uuid, body: &str, subject: &str) -> Value {
    json!({
        "journeyId": journey_id,
        "runId": Uuid::new_v4(),
        "nodeId": Uuid::new_v4(),
        "templateId": Uuid::new_v4(),
        "variant": {
            "type": "Email",
            "from": "test-from@email.com",
            "to": "test-to@email.com",
            "body": body,
            "subject": subject,
            "provider": { "type": "Sendgrid" }
        }
    })
}

fn context_payload(journey_id: Uuid) -> Value {
    json!({ "journeyId": journey_id })
}

#[test]
fn three_message_scenario_orders_by_latest_event() {
    let workspace_id = Uuid::new_v4();
    let journey_id = Uuid::new_v4();
    // ids fijos para que el desempate por message_id desc sea observable:
    // msg1 y msg2 comparten updated_at (@20) y msg2 > msg1.
    let msg1 = Uuid::from_u128(1);
    let msg2 = Uuid::from_u128(2);
    let msg3 = Uuid::from_u128(3);

    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("u1", msg1, "dispatched", 0, email_dispatch_payload(journey_id, "body1", "subject1")),
                            event("u1", msg1, "delivered", 10, context_payload(journey_id)),
                            event("u1", msg1, "opened", 20, context_payload(journey_id)),
                            event("u1", msg2, "dispatched", 10, email_dispatch_payload(journey_id, "body2", "subject2")),
                            event("u1", msg2, "bounced", 20, context_payload(journey_id)),
                            // shape legacy plana, por compatibilidad hacia atrás
                            event("u1", msg3, "dispatched", 40,
                                  json!({
                                      "journeyId": journey_id,
                                      "channel": "Email",
                                      "from": "test-from@email.com",
                                      "to": "test-to@email.com",
                                      "body": "body3",
                                      "subject": "subject3"
                                  }))])
         .unwrap();

    let page = search_deliveries(&store, &DeliverySearchParams::for_workspace(workspace_id)).unwrap();
    assert_eq!(page.items.len(), 3);
    assert!(page.cursor.is_none());

    let statuses: Vec<LifecycleEventType> = page.items.iter().map(|d| d.status).collect();
    assert_eq!(statuses,
               vec![LifecycleEventType::Dispatched,
                    LifecycleEventType::Bounced,
                    LifecycleEventType::Opened]);
    assert_eq!(page.items[0].message_id, msg3);
    assert_eq!(page.items[0].updated_at, at_offset(40));
    assert_eq!(page.items[1].message_id, msg2);
    assert_eq!(page.items[2].message_id, msg1);

    // la entrega legacy expone el mismo variant que una anidada equivalente
    assert_eq!(page.items[0].variant.as_ref().map(|v| v.channel()), Some(ChannelType::Email));
    // el contexto del despacho acompaña a todos los grupos
    for d in &page.items {
        assert_eq!(d.context.journey_id, Some(journey_id));
    }
}

#[test]
fn filter_by_user_id_matches_only_that_user() {
    let workspace_id = Uuid::new_v4();
    let journey_id = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("wanted-user", Uuid::new_v4(), "dispatched", 0,
                                  email_dispatch_payload(journey_id, "body", "subject")),
                            event("other-user", Uuid::new_v4(), "dispatched", 0,
                                  email_dispatch_payload(journey_id, "body", "subject"))])
         .unwrap();

    let params = DeliverySearchParams { user_id: Some("wanted-user".into()),
                                        limit: 10,
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let page = search_deliveries(&store, &params).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].user_id, "wanted-user");
}

#[test]
fn filter_by_journey_id_uses_dispatch_context() {
    let workspace_id = Uuid::new_v4();
    let wanted = Uuid::new_v4();
    let other = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("u1", Uuid::new_v4(), "dispatched", 0,
                                  email_dispatch_payload(wanted, "body", "subject")),
                            event("u2", Uuid::new_v4(), "dispatched", 0,
                                  email_dispatch_payload(other, "body", "subject"))])
         .unwrap();

    let params = DeliverySearchParams { journey_id: Some(wanted),
                                        limit: 10,
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let page = search_deliveries(&store, &params).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].context.journey_id, Some(wanted));
}

#[test]
fn filter_by_channel_reads_the_variant() {
    let workspace_id = Uuid::new_v4();
    let journey_id = Uuid::new_v4();
    let sms_message = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("u1", Uuid::new_v4(), "dispatched", 0,
                                  email_dispatch_payload(journey_id, "body", "subject")),
                            event("u2", sms_message, "dispatched", 0,
                                  json!({
                                      "journeyId": journey_id,
                                      "variant": { "type": "Sms", "to": "+5215555555555", "body": "hola" }
                                  }))])
         .unwrap();

    let params = DeliverySearchParams { channel: Some(ChannelType::Sms),
                                        limit: 10,
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let page = search_deliveries(&store, &params).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].message_id, sms_message);
}

#[test]
fn filter_by_message_and_broadcast() {
    let workspace_id = Uuid::new_v4();
    let broadcast_id = Uuid::new_v4();
    let wanted_message = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("u1", wanted_message, "dispatched", 0,
                                  json!({
                                      "broadcastId": broadcast_id,
                                      "variant": { "type": "Email", "from": "a@x.com", "to": "b@x.com" }
                                  })),
                            event("u2", Uuid::new_v4(), "dispatched", 5,
                                  email_dispatch_payload(Uuid::new_v4(), "body", "subject"))])
         .unwrap();

    let params = DeliverySearchParams { message_id: Some(wanted_message),
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let page = search_deliveries(&store, &params).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].message_id, wanted_message);

    let params = DeliverySearchParams { broadcast_id: Some(broadcast_id),
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let page = search_deliveries(&store, &params).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].context.broadcast_id, Some(broadcast_id));
}

#[test]
fn paginates_fifteen_deliveries_in_two_pages() {
    let workspace_id = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    for i in 0..15u32 {
        store.append(workspace_id,
                     event(&format!("u{i}"), Uuid::new_v4(), "dispatched", i as i64,
                           email_dispatch_payload(Uuid::new_v4(), "body", "subject")))
             .unwrap();
    }

    let params = DeliverySearchParams { limit: 10, ..DeliverySearchParams::for_workspace(workspace_id) };
    let first = search_deliveries(&store, &params).unwrap();
    assert_eq!(first.items.len(), 10);
    let cursor = first.cursor.clone().expect("cursor is missing");

    let params = DeliverySearchParams { limit: 10,
                                        cursor: Some(cursor),
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let second = search_deliveries(&store, &params).unwrap();
    assert_eq!(second.items.len(), 5);
    assert!(second.cursor.is_none());

    // completitud y no-solapamiento: la unión de páginas es el resultado
    // completo sin duplicados
    let mut seen: Vec<Uuid> = first.items
                                   .iter()
                                   .chain(second.items.iter())
                                   .map(|d| d.message_id)
                                   .collect();
    seen.sort();
    seen.dedup();
    assert_eq!(seen.len(), 15);
}

#[test]
fn submicrosecond_timestamps_do_not_break_pagination_completeness() {
    // Los timestamps con resto sub-microsegundo se canonicalizan a micros al
    // normalizar; la frontera keyset (también en micros) no puede saltarse
    // entregas que queden entre el valor truncado y el original.
    let workspace_id = Uuid::new_v4();
    let first_msg = Uuid::new_v4();
    let second_msg = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![NewEventRecord { user_id: "u1".into(),
                                             message_id: first_msg,
                                             event_type: "dispatched".into(),
                                             ts: base_ts() + Duration::nanoseconds(900),
                                             payload: email_dispatch_payload(Uuid::new_v4(), "b", "s") },
                            NewEventRecord { user_id: "u1".into(),
                                             message_id: second_msg,
                                             event_type: "dispatched".into(),
                                             ts: base_ts() + Duration::nanoseconds(400),
                                             payload: email_dispatch_payload(Uuid::new_v4(), "b", "s") }])
         .unwrap();

    let params = DeliverySearchParams { limit: 1, ..DeliverySearchParams::for_workspace(workspace_id) };
    let first = search_deliveries(&store, &params).unwrap();
    assert_eq!(first.items.len(), 1);
    let cursor = first.cursor.clone().expect("cursor is missing");

    let params = DeliverySearchParams { limit: 1,
                                        cursor: Some(cursor),
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let second = search_deliveries(&store, &params).unwrap();
    assert_eq!(second.items.len(), 1, "la segunda página perdió la entrega restante");
    assert_ne!(second.items[0].message_id, first.items[0].message_id);
}

#[test]
fn pagination_is_stable_under_concurrent_inserts() {
    let workspace_id = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    let mut original: Vec<Uuid> = Vec::new();
    for i in 0..5u32 {
        let message_id = Uuid::new_v4();
        original.push(message_id);
        store.append(workspace_id,
                     event(&format!("u{i}"), message_id, "dispatched", i as i64,
                           email_dispatch_payload(Uuid::new_v4(), "body", "subject")))
             .unwrap();
    }

    let params = DeliverySearchParams { limit: 3, ..DeliverySearchParams::for_workspace(workspace_id) };
    let first = search_deliveries(&store, &params).unwrap();
    assert_eq!(first.items.len(), 3);
    let cursor = first.cursor.clone().expect("cursor is missing");

    // llegan eventos nuevos, más recientes, mientras el caller pagina
    for i in 0..4u32 {
        store.append(workspace_id,
                     event("late", Uuid::new_v4(), "dispatched", 1_000 + i as i64,
                           email_dispatch_payload(Uuid::new_v4(), "body", "subject")))
             .unwrap();
    }

    let params = DeliverySearchParams { limit: 10,
                                        cursor: Some(cursor),
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    let second = search_deliveries(&store, &params).unwrap();

    // por debajo de la frontera no hay duplicados ni saltos: exactamente las
    // dos entregas originales restantes, ninguna de las nuevas
    let mut all: Vec<Uuid> = first.items.iter().chain(second.items.iter()).map(|d| d.message_id).collect();
    all.sort();
    all.dedup();
    assert_eq!(all.len(), 5);
    let mut expected = original.clone();
    expected.sort();
    assert_eq!(all, expected);
}

#[test]
fn zero_limit_is_an_invalid_argument() {
    let store = InMemoryEventLog::default();
    let params = DeliverySearchParams { limit: 0, ..DeliverySearchParams::for_workspace(Uuid::new_v4()) };
    assert!(matches!(search_deliveries(&store, &params),
                     Err(DeliveryCoreError::InvalidArgument(_))));
}

#[test]
fn malformed_cursor_is_rejected() {
    let workspace_id = Uuid::new_v4();
    let store = InMemoryEventLog::default();
    let params = DeliverySearchParams { cursor: Some("garbage!!".into()),
                                        ..DeliverySearchParams::for_workspace(workspace_id) };
    assert_eq!(search_deliveries(&store, &params),
               Err(DeliveryCoreError::InvalidCursor));
}

#[test]
fn cursor_from_another_workspace_is_rejected() {
    let workspace_a = Uuid::new_v4();
    let workspace_b = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    for i in 0..3u32 {
        store.append(workspace_a,
                     event("u1", Uuid::new_v4(), "dispatched", i as i64,
                           email_dispatch_payload(Uuid::new_v4(), "body", "subject")))
             .unwrap();
    }
    let params = DeliverySearchParams { limit: 2, ..DeliverySearchParams::for_workspace(workspace_a) };
    let page = search_deliveries(&store, &params).unwrap();
    let cursor = page.cursor.expect("cursor is missing");

    let params = DeliverySearchParams { cursor: Some(cursor),
                                        ..DeliverySearchParams::for_workspace(workspace_b) };
    assert_eq!(search_deliveries(&store, &params),
               Err(DeliveryCoreError::InvalidCursor));
}

#[test]
fn empty_workspace_yields_an_empty_page() {
    let store = InMemoryEventLog::default();
    let page = search_deliveries(&store, &DeliverySearchParams::for_workspace(Uuid::new_v4())).unwrap();
    assert!(page.items.is_empty());
    assert!(page.cursor.is_none());
}

#[test]
fn search_is_idempotent_over_an_unchanged_log() {
    let workspace_id = Uuid::new_v4();
    let journey_id = Uuid::new_v4();
    let msg = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("u1", msg, "dispatched", 0, email_dispatch_payload(journey_id, "b", "s")),
                            event("u1", msg, "delivered", 10, context_payload(journey_id))])
         .unwrap();

    let params = DeliverySearchParams::for_workspace(workspace_id);
    let a = search_deliveries(&store, &params).unwrap();
    let b = search_deliveries(&store, &params).unwrap();
    assert_eq!(a, b);
}

#[test]
fn legacy_and_nested_payloads_yield_identical_deliveries() {
    let workspace_id = Uuid::new_v4();
    let journey_id = Uuid::new_v4();
    let nested_msg = Uuid::new_v4();
    let legacy_msg = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("u1", nested_msg, "dispatched", 0,
                                  json!({
                                      "journeyId": journey_id,
                                      "variant": {
                                          "type": "Email",
                                          "from": "a@x.com",
                                          "to": "b@x.com",
                                          "subject": "s",
                                          "body": "b"
                                      }
                                  })),
                            event("u1", legacy_msg, "dispatched", 0,
                                  json!({
                                      "journeyId": journey_id,
                                      "channel": "Email",
                                      "from": "a@x.com",
                                      "to": "b@x.com",
                                      "subject": "s",
                                      "body": "b"
                                  }))])
         .unwrap();

    let page = search_deliveries(&store, &DeliverySearchParams::for_workspace(workspace_id)).unwrap();
    assert_eq!(page.items.len(), 2);
    // mismos valores de campos → mismo registro derivado, módulo message_id
    assert_eq!(page.items[0].variant, page.items[1].variant);
    assert_eq!(page.items[0].context, page.items[1].context);
    assert_eq!(page.items[0].status, page.items[1].status);
}

#[test]
fn unrecognized_event_types_do_not_steal_the_status() {
    let workspace_id = Uuid::new_v4();
    let journey_id = Uuid::new_v4();
    let msg = Uuid::new_v4();
    let orphan = Uuid::new_v4();
    let mut store = InMemoryEventLog::default();
    store.append_batch(workspace_id,
                       vec![event("u1", msg, "dispatched", 0, email_dispatch_payload(journey_id, "b", "s")),
                            event("u1", msg, "delivered", 10, context_payload(journey_id)),
                            // más reciente pero ajeno al ciclo de vida
                            event("u1", msg, "CustomTrackEvent", 20, json!({})),
                            // grupo formado sólo por tipos ajenos: excluido
                            event("u2", orphan, "AnotherCustomEvent", 0, json!({}))])
         .unwrap();

    let page = search_deliveries(&store, &DeliverySearchParams::for_workspace(workspace_id)).unwrap();
    assert_eq!(page.items.len(), 1);
    assert_eq!(page.items[0].message_id, msg);
    assert_eq!(page.items[0].status, LifecycleEventType::Delivered);
    assert_eq!(page.items[0].updated_at, at_offset(10));
}

#[test]
fn append_rejects_an_event_without_type() {
    let mut store = InMemoryEventLog::default();
    let result = store.append(Uuid::new_v4(),
                              event("u1", Uuid::new_v4(), "", 0, json!({})));
    assert_eq!(result, Err(DeliveryCoreError::MalformedEvent));
}
