use std::collections::BTreeSet;

use axum::{Json, debug_handler, extract::State};
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::store::{SqliteStore, StoreClient, Table};
use crate::AppResult;

use super::model::participant_item;

#[debug_handler]
pub(crate) async fn new_conversation(
    State(store): State<SqliteStore>,
    AuthUser(username): AuthUser,
    Json(users): Json<Vec<String>>,
) -> AppResult<Json<String>> {
    Ok(Json(create_conversation(&store, &username, &users).await?))
}

/// Mints a fresh conversation and writes one membership record per member.
/// The batch is not transactional: a failure can leave some records behind,
/// and a retry mints a new id rather than repairing this one.
pub async fn create_conversation<S: StoreClient>(
    store: &S,
    creator: &str,
    others: &[String],
) -> AppResult<String> {
    let id = Uuid::now_v7().to_string();

    let mut members: BTreeSet<&str> = others.iter().map(String::as_str).collect();
    members.insert(creator);

    let records = members
        .iter()
        .map(|member| participant_item(&id, member))
        .collect();
    store.batch_write_items(Table::Participants, records).await?;

    tracing::info!(%id, members = members.len(), "created conversation");
    Ok(id)
}
