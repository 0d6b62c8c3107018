mod sqlite;

pub use sqlite::SqliteStore;

use std::future::Future;

use serde_json::Value;

/// One persisted record, as a JSON object keyed by attribute name.
pub type Item = Value;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Table {
    Participants,
    Messages,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Index {
    ParticipantsByUsername,
}

/// Opaque continuation token. Callers only pass it back unchanged.
#[derive(Clone, Debug)]
pub struct Cursor(pub(crate) String);

#[derive(Clone, Debug)]
pub struct QueryRequest {
    pub table: Table,
    pub index: Option<Index>,
    pub partition: String,
    pub scan_forward: bool,
    pub limit: Option<u32>,
    pub cursor: Option<Cursor>,
}

impl QueryRequest {
    pub fn new(table: Table, partition: impl Into<String>) -> Self {
        Self {
            table,
            index: None,
            partition: partition.into(),
            scan_forward: true,
            limit: None,
            cursor: None,
        }
    }

    pub fn via(mut self, index: Index) -> Self {
        self.index = Some(index);
        self
    }

    pub fn newest_first(mut self) -> Self {
        self.scan_forward = false;
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }
}

#[derive(Debug)]
pub struct QueryPage {
    pub items: Vec<Item>,
    pub next_cursor: Option<Cursor>,
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed record: {0}")]
    Malformed(String),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Sort-keyed key-value store: point writes, batched writes, range queries
/// by partition (optionally through a secondary index) with cursor paging.
pub trait StoreClient: Send + Sync {
    fn query(&self, req: QueryRequest) -> impl Future<Output = StoreResult<QueryPage>> + Send;

    fn put_item(&self, table: Table, item: Item) -> impl Future<Output = StoreResult<()>> + Send;

    fn batch_write_items(
        &self,
        table: Table,
        items: Vec<Item>,
    ) -> impl Future<Output = StoreResult<()>> + Send;
}

/// Follows the continuation cursor until the query is exhausted, returning
/// every matching item in store order. A failed page discards the lot.
pub async fn query_all<S: StoreClient>(store: &S, req: QueryRequest) -> StoreResult<Vec<Item>> {
    let mut req = req;
    let mut items = Vec::new();
    loop {
        let page = store.query(req.clone()).await?;
        items.extend(page.items);
        match page.next_cursor {
            Some(cursor) => req.cursor = Some(cursor),
            None => return Ok(items),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use serde_json::json;

    use super::*;

    struct Scripted {
        pages: Mutex<VecDeque<StoreResult<QueryPage>>>,
    }

    impl Scripted {
        fn new(pages: Vec<StoreResult<QueryPage>>) -> Self {
            Self {
                pages: Mutex::new(pages.into()),
            }
        }
    }

    impl StoreClient for Scripted {
        async fn query(&self, _req: QueryRequest) -> StoreResult<QueryPage> {
            self.pages
                .lock()
                .unwrap()
                .pop_front()
                .expect("query past the scripted pages")
        }

        async fn put_item(&self, _table: Table, _item: Item) -> StoreResult<()> {
            Err(StoreError::Unavailable("scripted".into()))
        }

        async fn batch_write_items(&self, _table: Table, _items: Vec<Item>) -> StoreResult<()> {
            Err(StoreError::Unavailable("scripted".into()))
        }
    }

    fn page(values: &[i64], next: Option<&str>) -> StoreResult<QueryPage> {
        Ok(QueryPage {
            items: values.iter().map(|v| json!({ "n": v })).collect(),
            next_cursor: next.map(|c| Cursor(c.to_owned())),
        })
    }

    #[tokio::test]
    async fn drains_every_page_in_order() {
        let store = Scripted::new(vec![
            page(&[1, 2], Some("a")),
            page(&[3], Some("b")),
            page(&[4, 5], None),
        ]);

        let items = query_all(&store, QueryRequest::new(Table::Messages, "c1"))
            .await
            .unwrap();
        let ns: Vec<i64> = items.iter().map(|i| i["n"].as_i64().unwrap()).collect();
        assert_eq!(ns, vec![1, 2, 3, 4, 5]);
    }

    #[tokio::test]
    async fn single_page_needs_one_call() {
        let store = Scripted::new(vec![page(&[7], None)]);
        let items = query_all(&store, QueryRequest::new(Table::Messages, "c1"))
            .await
            .unwrap();
        assert_eq!(items.len(), 1);
        assert!(store.pages.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn failed_page_drops_partial_results() {
        let store = Scripted::new(vec![
            page(&[1, 2], Some("a")),
            Err(StoreError::Unavailable("boom".into())),
        ]);

        let err = query_all(&store, QueryRequest::new(Table::Messages, "c1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Unavailable(_)));
    }
}
