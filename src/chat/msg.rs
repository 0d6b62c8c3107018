use axum::{Json, debug_handler, extract::{Path, State}};
use time::OffsetDateTime;

use crate::auth::AuthUser;
use crate::store::{SqliteStore, StoreClient, Table};
use crate::AppResult;

use super::model::message_item;

#[debug_handler]
pub(crate) async fn post_message(
    State(store): State<SqliteStore>,
    AuthUser(username): AuthUser,
    Path(id): Path<String>,
    Json(body): Json<String>,
) -> AppResult<()> {
    append_message(&store, &id, &username, &body).await
}

/// Appends one message, stamped with the server clock as its sort key.
/// Posting does not check that the conversation exists or that the sender
/// is a member; the authorizer in front owns that decision.
pub async fn append_message<S: StoreClient>(
    store: &S,
    conversation_id: &str,
    sender: &str,
    body: &str,
) -> AppResult<()> {
    let timestamp = now_millis();
    store
        .put_item(
            Table::Messages,
            message_item(conversation_id, timestamp, sender, body),
        )
        .await?;
    Ok(())
}

fn now_millis() -> i64 {
    (OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000) as i64
}

#[cfg(test)]
mod tests {
    use crate::chat::testutil;
    use crate::chat::{create_conversation, get_conversation};

    use super::*;

    #[tokio::test]
    async fn appended_message_lands_at_the_end() {
        let store = testutil::store(100).await;
        let id = create_conversation(&store, "Student", &["Brian".to_owned()])
            .await
            .unwrap();

        append_message(&store, &id, "Student", "hi").await.unwrap();

        let convo = get_conversation(&store, &id, "Brian").await.unwrap();
        assert_eq!(convo.messages.len(), 1);
        let newest = convo.messages.last().unwrap();
        assert_eq!(newest.sender, "Student");
        assert_eq!(newest.message, "hi");
        assert_eq!(convo.last, Some(newest.time));
    }

    #[tokio::test]
    async fn appends_do_not_check_membership() {
        let store = testutil::store(100).await;
        // no conversation was ever created for this id
        append_message(&store, "ghost", "ann", "anyone there?")
            .await
            .unwrap();

        let records = crate::store::query_all(
            &store,
            crate::store::QueryRequest::new(Table::Messages, "ghost"),
        )
        .await
        .unwrap();
        assert_eq!(records.len(), 1);
    }

    #[tokio::test]
    async fn stamps_move_forward_between_appends() {
        let store = testutil::store(100).await;
        let id = create_conversation(&store, "ann", &["bob".to_owned()])
            .await
            .unwrap();

        append_message(&store, &id, "ann", "first").await.unwrap();
        std::thread::sleep(std::time::Duration::from_millis(5));
        append_message(&store, &id, "bob", "second").await.unwrap();

        let convo = get_conversation(&store, &id, "ann").await.unwrap();
        assert_eq!(convo.messages.len(), 2);
        assert!(convo.messages[0].time < convo.messages[1].time);
        assert_eq!(convo.messages[1].message, "second");
    }
}
