use serde::{Deserialize, Serialize};

/// Push envelope delivered by the scheduler or message bus
///
/// The matcher only needs the trigger to exist; the payload is logged and
/// otherwise ignored.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TriggerRequest {
    #[serde(default)]
    pub message: Option<PushMessage>,
    #[serde(default)]
    pub subscription: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PushMessage {
    #[serde(default, alias = "messageId", rename = "message_id")]
    pub message_id: Option<String>,
    #[serde(default)]
    pub data: Option<String>,
}

impl TriggerRequest {
    pub fn message_id(&self) -> Option<&str> {
        self.message.as_ref()?.message_id.as_deref()
    }
}
