pub mod auth;
pub mod chat;
pub mod store;

mod appresult;

pub use appresult::{AppError, AppResult};

use axum::extract::FromRef;
use serde_json::Value;

use crate::store::{SqliteStore, StoreError};

#[derive(Clone, FromRef)]
pub struct AppState {
    pub store: SqliteStore,
}

pub trait GetField {
    fn get_str_field(&self, field: &str) -> Result<String, StoreError>;
    fn get_i64_field(&self, field: &str) -> Result<i64, StoreError>;
}

impl GetField for Value {
    fn get_str_field(&self, field: &str) -> Result<String, StoreError> {
        Ok(self
            .get(field)
            .ok_or_else(|| StoreError::Malformed(format!("expected {field} in {self}")))?
            .as_str()
            .ok_or_else(|| StoreError::Malformed(format!("expected {field} in {self} to be string")))?
            .to_owned())
    }

    fn get_i64_field(&self, field: &str) -> Result<i64, StoreError> {
        self.get(field)
            .ok_or_else(|| StoreError::Malformed(format!("expected {field} in {self}")))?
            .as_i64()
            .ok_or_else(|| StoreError::Malformed(format!("expected {field} in {self} to be integer")))
    }
}
