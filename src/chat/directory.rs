use axum::{Json, debug_handler, extract::State};
use futures_util::{StreamExt, TryStreamExt, stream, try_join};

use crate::auth::AuthUser;
use crate::store::{Index, QueryRequest, SqliteStore, StoreClient, Table, query_all};
use crate::{AppResult, GetField};

use super::model::ConversationSummary;

// caps in-flight per-conversation fetches so a long membership list
// cannot exhaust the store pool
const FANOUT_LIMIT: usize = 8;

#[debug_handler]
pub(crate) async fn conversations(
    State(store): State<SqliteStore>,
    AuthUser(username): AuthUser,
) -> AppResult<Json<Vec<ConversationSummary>>> {
    Ok(Json(list_conversations(&store, &username).await?))
}

/// Every conversation the user participates in, with roster and the
/// timestamp of its newest message. Ids come back in index order.
pub async fn list_conversations<S: StoreClient>(
    store: &S,
    username: &str,
) -> AppResult<Vec<ConversationSummary>> {
    let memberships = query_all(
        store,
        QueryRequest::new(Table::Participants, username).via(Index::ParticipantsByUsername),
    )
    .await?;
    let ids = memberships
        .iter()
        .map(|item| item.get_str_field("conversation_id"))
        .collect::<Result<Vec<_>, _>>()?;

    tracing::debug!(username, conversations = ids.len(), "listing conversations");

    let summaries = stream::iter(ids)
        .map(|id| summarize(store, id))
        .buffered(FANOUT_LIMIT)
        .try_collect::<Vec<_>>()
        .await?;
    Ok(summaries)
}

async fn summarize<S: StoreClient>(store: &S, id: String) -> AppResult<ConversationSummary> {
    let (last, participants) = try_join!(last_activity(store, &id), async {
        super::roster(store, &id).await.map_err(crate::AppError::from)
    })?;
    Ok(ConversationSummary {
        id,
        participants,
        last,
    })
}

async fn last_activity<S: StoreClient>(store: &S, id: &str) -> AppResult<Option<i64>> {
    let page = store
        .query(QueryRequest::new(Table::Messages, id).newest_first().limit(1))
        .await?;
    match page.items.first() {
        Some(item) => Ok(Some(item.get_i64_field("timestamp")?)),
        None => Ok(None),
    }
}
