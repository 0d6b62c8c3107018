use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::GetField;
use crate::store::{Item, StoreResult};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub sender: String,
    pub time: i64,
    pub message: String,
}

impl Message {
    pub(crate) fn from_item(item: &Item) -> StoreResult<Self> {
        Ok(Self {
            sender: item.get_str_field("sender")?,
            time: item.get_i64_field("timestamp")?,
            message: item.get_str_field("body")?,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationSummary {
    pub id: String,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conversation {
    pub id: String,
    pub participants: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last: Option<i64>,
    pub messages: Vec<Message>,
}

pub(crate) fn participant_item(conversation_id: &str, username: &str) -> Item {
    json!({ "conversation_id": conversation_id, "username": username })
}

pub(crate) fn message_item(conversation_id: &str, timestamp: i64, sender: &str, body: &str) -> Item {
    json!({
        "conversation_id": conversation_id,
        "timestamp": timestamp,
        "sender": sender,
        "body": body,
    })
}
