use serde_json::json;
use sqlx::SqlitePool;

use crate::GetField;

use super::{Cursor, Index, Item, QueryPage, QueryRequest, StoreError, StoreClient, StoreResult, Table};

const DEFAULT_PAGE_LIMIT: u32 = 100;

/// Sort-keyed store over two SQLite tables with keyset cursor paging.
#[derive(Clone)]
pub struct SqliteStore {
    pool: SqlitePool,
    page_limit: u32,
}

impl SqliteStore {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            page_limit: DEFAULT_PAGE_LIMIT,
        }
    }

    pub fn with_page_limit(pool: SqlitePool, page_limit: u32) -> Self {
        Self { pool, page_limit }
    }

    pub async fn migrate(&self) -> StoreResult<()> {
        sqlx::query(
            "CREATE TABLE IF NOT EXISTS participants (
                conversation_id TEXT NOT NULL,
                username TEXT NOT NULL,
                PRIMARY KEY (conversation_id, username)
            )",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE INDEX IF NOT EXISTS participants_by_username
             ON participants (username, conversation_id)",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query(
            "CREATE TABLE IF NOT EXISTS messages (
                conversation_id TEXT NOT NULL,
                ts INTEGER NOT NULL,
                sender TEXT NOT NULL,
                body TEXT NOT NULL,
                PRIMARY KEY (conversation_id, ts)
            )",
        )
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    // overwrite on an identical key, like a plain put into a keyed store
    async fn put_one(&self, table: Table, item: &Item) -> StoreResult<()> {
        match table {
            Table::Participants => {
                sqlx::query(
                    "INSERT OR REPLACE INTO participants (conversation_id, username) VALUES (?,?)",
                )
                .bind(item.get_str_field("conversation_id")?)
                .bind(item.get_str_field("username")?)
                .execute(&self.pool)
                .await?;
            }
            Table::Messages => {
                sqlx::query(
                    "INSERT OR REPLACE INTO messages (conversation_id, ts, sender, body) VALUES (?,?,?,?)",
                )
                .bind(item.get_str_field("conversation_id")?)
                .bind(item.get_i64_field("timestamp")?)
                .bind(item.get_str_field("sender")?)
                .bind(item.get_str_field("body")?)
                .execute(&self.pool)
                .await?;
            }
        }
        Ok(())
    }
}

fn sort_sql(base: &str, sort_key: &str, cursored: bool, forward: bool) -> String {
    let bound = if cursored {
        format!(" AND {sort_key} {} ?", if forward { ">" } else { "<" })
    } else {
        String::new()
    };
    let order = if forward { "ASC" } else { "DESC" };
    format!("{base}{bound} ORDER BY {sort_key} {order} LIMIT ?")
}

impl StoreClient for SqliteStore {
    async fn query(&self, req: QueryRequest) -> StoreResult<QueryPage> {
        let page_size = req
            .limit
            .map_or(self.page_limit, |l| l.min(self.page_limit))
            .max(1) as usize;
        let fetch = page_size as i64 + 1;

        match (req.table, req.index) {
            (Table::Participants, None) => {
                let sql = sort_sql(
                    "SELECT conversation_id, username FROM participants WHERE conversation_id=?",
                    "username",
                    req.cursor.is_some(),
                    req.scan_forward,
                );
                let mut query = sqlx::query_as::<_, (String, String)>(&sql).bind(&req.partition);
                if let Some(Cursor(after)) = &req.cursor {
                    query = query.bind(after);
                }
                let mut rows = query.bind(fetch).fetch_all(&self.pool).await?;

                let next_cursor = if rows.len() > page_size {
                    rows.truncate(page_size);
                    Some(Cursor(rows[page_size - 1].1.clone()))
                } else {
                    None
                };
                let items = rows
                    .into_iter()
                    .map(|(id, user)| json!({ "conversation_id": id, "username": user }))
                    .collect();
                Ok(QueryPage { items, next_cursor })
            }

            (Table::Participants, Some(Index::ParticipantsByUsername)) => {
                let sql = sort_sql(
                    "SELECT conversation_id, username FROM participants WHERE username=?",
                    "conversation_id",
                    req.cursor.is_some(),
                    req.scan_forward,
                );
                let mut query = sqlx::query_as::<_, (String, String)>(&sql).bind(&req.partition);
                if let Some(Cursor(after)) = &req.cursor {
                    query = query.bind(after);
                }
                let mut rows = query.bind(fetch).fetch_all(&self.pool).await?;

                let next_cursor = if rows.len() > page_size {
                    rows.truncate(page_size);
                    Some(Cursor(rows[page_size - 1].0.clone()))
                } else {
                    None
                };
                let items = rows
                    .into_iter()
                    .map(|(id, user)| json!({ "conversation_id": id, "username": user }))
                    .collect();
                Ok(QueryPage { items, next_cursor })
            }

            (Table::Messages, None) => {
                let sql = sort_sql(
                    "SELECT ts, sender, body FROM messages WHERE conversation_id=?",
                    "ts",
                    req.cursor.is_some(),
                    req.scan_forward,
                );
                let mut query =
                    sqlx::query_as::<_, (i64, String, String)>(&sql).bind(&req.partition);
                if let Some(Cursor(after)) = &req.cursor {
                    let after: i64 = after
                        .parse()
                        .map_err(|_| StoreError::Malformed(format!("bad cursor {after:?}")))?;
                    query = query.bind(after);
                }
                let mut rows = query.bind(fetch).fetch_all(&self.pool).await?;

                let next_cursor = if rows.len() > page_size {
                    rows.truncate(page_size);
                    Some(Cursor(rows[page_size - 1].0.to_string()))
                } else {
                    None
                };
                let conversation_id = req.partition.as_str();
                let items = rows
                    .into_iter()
                    .map(|(ts, sender, body)| {
                        json!({
                            "conversation_id": conversation_id,
                            "timestamp": ts,
                            "sender": sender,
                            "body": body,
                        })
                    })
                    .collect();
                Ok(QueryPage { items, next_cursor })
            }

            (Table::Messages, Some(index)) => Err(StoreError::Unavailable(format!(
                "index {index:?} does not cover the messages table"
            ))),
        }
    }

    async fn put_item(&self, table: Table, item: Item) -> StoreResult<()> {
        self.put_one(table, &item).await
    }

    // sequential, no transaction: a mid-batch failure leaves earlier writes in place
    async fn batch_write_items(&self, table: Table, items: Vec<Item>) -> StoreResult<()> {
        for item in &items {
            self.put_one(table, item).await?;
        }
        Ok(())
    }
}
