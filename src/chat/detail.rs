use axum::{Json, debug_handler, extract::{Path, State}};

use crate::auth::AuthUser;
use crate::store::{QueryRequest, SqliteStore, StoreClient, Table, query_all};
use crate::{AppError, AppResult};

use super::model::{Conversation, Message};

#[debug_handler]
pub(crate) async fn conversation(
    State(store): State<SqliteStore>,
    AuthUser(username): AuthUser,
    Path(id): Path<String>,
) -> AppResult<Json<Conversation>> {
    Ok(Json(get_conversation(&store, &id, &username).await?))
}

/// The full ordered history of one conversation, gated on membership.
/// The membership check runs against the roster loaded in this call, not
/// anything cached earlier.
pub async fn get_conversation<S: StoreClient>(
    store: &S,
    id: &str,
    username: &str,
) -> AppResult<Conversation> {
    let records = query_all(store, QueryRequest::new(Table::Messages, id)).await?;
    let messages = records
        .iter()
        .map(Message::from_item)
        .collect::<Result<Vec<_>, _>>()?;

    let participants = super::roster(store, id).await?;
    if participants.is_empty() {
        // no membership records at all: the id was never created
        return Err(AppError::NotFound);
    }
    if !participants.iter().any(|p| p == username) {
        return Err(AppError::Unauthorized);
    }

    let last = messages.last().map(|m| m.time);
    Ok(Conversation {
        id: id.to_owned(),
        participants,
        last,
        messages,
    })
}
