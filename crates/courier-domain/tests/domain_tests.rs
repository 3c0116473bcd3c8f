use std::str::FromStr;

use courier_domain::{ChannelType, DeliveryContext, MessageVariant, ProviderRef};
use serde_json::json;

#[test]
fn channel_parses_case_insensitive() {
    assert_eq!(ChannelType::from_str("email").unwrap(), ChannelType::Email);
    assert_eq!(ChannelType::from_str("Email").unwrap(), ChannelType::Email);
    assert_eq!(ChannelType::from_str("SMS").unwrap(), ChannelType::Sms);
    assert_eq!(ChannelType::from_str("push").unwrap(), ChannelType::Push);
    assert!(ChannelType::from_str("pigeon").is_err());
}

#[test]
fn variant_deserializes_from_tagged_json() {
    let v: MessageVariant = serde_json::from_value(json!({
        "type": "Email",
        "from": "from@example.com",
        "to": "to@example.com",
        "subject": "hello",
        "body": "<p>hi</p>",
        "provider": { "type": "Sendgrid" }
    }))
    .unwrap();
    assert_eq!(v.channel(), ChannelType::Email);
    match v {
        MessageVariant::Email { from, to, subject, provider, .. } => {
            assert_eq!(from, "from@example.com");
            assert_eq!(to, "to@example.com");
            assert_eq!(subject.as_deref(), Some("hello"));
            assert_eq!(provider, Some(ProviderRef { kind: "Sendgrid".into() }));
        }
        other => panic!("expected email variant, got {other:?}"),
    }
}

#[test]
fn variant_serializes_with_type_tag() {
    let v = MessageVariant::Sms { from: None,
                                  to: "+5215555555555".into(),
                                  body: Some("hola".into()),
                                  provider: None };
    let j = serde_json::to_value(&v).unwrap();
    assert_eq!(j["type"], "Sms");
    assert_eq!(j["to"], "+5215555555555");
    assert!(j.get("from").is_none(), "optional fields must be omitted");
}

#[test]
fn context_roundtrips_camel_case() {
    let j = json!({
        "journeyId": "6a3c7bd4-3bcb-4a68-9e9e-0a4bdcdaf171",
        "runId": "0d4f1f58-14a1-4bd5-9f5e-26eb33d04ba2"
    });
    let ctx: DeliveryContext = serde_json::from_value(j.clone()).unwrap();
    assert!(ctx.journey_id.is_some());
    assert!(ctx.node_id.is_none());
    assert!(!ctx.is_empty());
    assert_eq!(serde_json::to_value(&ctx).unwrap(), j);
    assert!(DeliveryContext::default().is_empty());
}
