mod detail;
mod directory;
mod model;
mod msg;
mod new;

pub use detail::get_conversation;
pub use directory::list_conversations;
pub use model::{Conversation, ConversationSummary, Message};
pub use msg::append_message;
pub use new::create_conversation;

use axum::{Router, routing::get};

use crate::AppState;
use crate::store::{QueryRequest, StoreClient, StoreResult, Table, query_all};
use crate::GetField;

pub fn router() -> Router<AppState> {
    Router::new()
        .route(
            "/conversations",
            get(directory::conversations).post(new::new_conversation),
        )
        .route(
            "/conversations/{id}",
            get(detail::conversation).post(msg::post_message),
        )
}

pub(crate) async fn roster<S: StoreClient>(
    store: &S,
    conversation_id: &str,
) -> StoreResult<Vec<String>> {
    let records = query_all(store, QueryRequest::new(Table::Participants, conversation_id)).await?;
    records
        .iter()
        .map(|item| item.get_str_field("username"))
        .collect()
}
