use serde::de::Error as _;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::{CqError, Result};

use super::action::Endpoint;
use super::message::Message;

#[derive(Deserialize, Serialize, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum MessageType {
    Private,
    Group,
    Discuss,
}

/// A message reported by the service.
///
/// `message` accepts both the segment array and the raw markup string form.
#[derive(Deserialize, Serialize, Clone, Debug)]
pub struct MessageEvent {
    /// Unix timestamp of the event.
    pub time: i64,

    /// The bot's own id.
    pub self_id: i64,

    pub message_type: MessageType,

    pub sub_type: Option<String>,

    pub message_id: i64,

    /// The sender.
    pub user_id: i64,

    pub group_id: Option<i64>,

    pub discuss_id: Option<i64>,

    pub message: Message,

    pub raw_message: Option<String>,

    /// extra
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl MessageEvent {
    /// Where a reply to this message should go.
    ///
    /// `None` when a group or discuss event is missing its id.
    pub fn endpoint(&self) -> Option<Endpoint> {
        match self.message_type {
            MessageType::Private => Some(Endpoint::Private {
                user_id: self.user_id,
            }),
            MessageType::Group => self.group_id.map(|group_id| Endpoint::Group { group_id }),
            MessageType::Discuss => self
                .discuss_id
                .map(|discuss_id| Endpoint::Discuss { discuss_id }),
        }
    }
}

#[derive(Debug, Serialize, Clone)]
#[serde(untagged)]
pub enum Event {
    Message(MessageEvent),
    Extra(Value),
}

impl TryFrom<Value> for Event {
    type Error = CqError;

    fn try_from(value: Value) -> Result<Self> {
        match value.get("post_type").and_then(Value::as_str) {
            Some("message") => {
                // segment failures are MalformedSegment, everything else MalformedEvent
                let message = value.get("message").filter(|m| m.is_array() || m.is_string());
                if let Some(message) = message {
                    Message::from_value(message)?;
                }
                match MessageEvent::deserialize(&value) {
                    Ok(event) => Ok(Event::Message(event)),
                    Err(e) => {
                        log::debug!("failed to decode message event {value}: {e}");
                        Err(CqError::MalformedEvent {
                            record: value.to_string(),
                            source: e,
                        })
                    }
                }
            }
            _ => Ok(Event::Extra(value)),
        }
    }
}

impl<'de> Deserialize<'de> for Event {
    fn deserialize<D>(deserializer: D) -> Result<Event, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let value = Value::deserialize(deserializer)?;
        Event::try_from(value).map_err(D::Error::custom)
    }
}
