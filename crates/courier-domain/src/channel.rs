//! Canales de envío y payload `variant` asociado al evento de despacho.
//!
//! El `variant` es la fuente de verdad de los campos específicos del canal
//! (remitente, destinatario, asunto, cuerpo, proveedor). Sólo el evento de
//! despacho lo transporta; el resto de eventos del mismo `message_id` lo
//! heredan vía la agregación.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

/// Canal por el cual se envió el mensaje.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ChannelType {
    Email,
    Sms,
    Push,
}

impl ChannelType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ChannelType::Email => "Email",
            ChannelType::Sms => "Sms",
            ChannelType::Push => "Push",
        }
    }
}

impl fmt::Display for ChannelType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelType {
    type Err = DomainError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Acepta mayúsculas/minúsculas para uso desde CLI y filtros externos.
        match s.to_ascii_lowercase().as_str() {
            "email" => Ok(ChannelType::Email),
            "sms" => Ok(ChannelType::Sms),
            "push" => Ok(ChannelType::Push),
            other => Err(DomainError::UnknownChannel(other.to_string())),
        }
    }
}

/// Referencia al proveedor de envío (Sendgrid, Twilio, FCM, ...).
///
/// Se modela como string abierta: el conjunto de proveedores cambia con más
/// frecuencia que el esquema de eventos y no participa en la agregación.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProviderRef {
    #[serde(rename = "type")]
    pub kind: String,
}

/// Payload específico del canal, etiquetado por `type` en JSON (shape anidada
/// vigente: `{"variant": {"type": "Email", "from": ..., ...}}`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum MessageVariant {
    Email {
        from: String,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        subject: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderRef>,
    },
    Sms {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        from: Option<String>,
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderRef>,
    },
    Push {
        to: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        title: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        body: Option<String>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        provider: Option<ProviderRef>,
    },
}

impl MessageVariant {
    /// Canal al que pertenece el variant.
    pub fn channel(&self) -> ChannelType {
        match self {
            MessageVariant::Email { .. } => ChannelType::Email,
            MessageVariant::Sms { .. } => ChannelType::Sms,
            MessageVariant::Push { .. } => ChannelType::Push,
        }
    }
}
