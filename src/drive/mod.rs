//! File store access.
//!
//! The HTTP handlers talk to the file store only through [`FileStore`], so
//! the Drive client can be replaced by an in-memory store in tests.

pub mod client;
pub mod credentials;
pub mod query;

pub use client::{DriveClient, DriveClientConfig};
pub use credentials::Credentials;
pub use query::Query;

use crate::models::DocumentRecord;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("request failed: {0}")]
    Request(String),
    #[error("Drive API error {status}: {message}")]
    Api { status: u16, message: String },
    #[error("failed to decode Drive response: {0}")]
    Decode(String),
}

/// Parameters of one search call.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchRequest {
    /// Query string; `None` matches everything visible to the caller.
    pub query: Option<String>,
    /// Partial-response field selector.
    pub fields: String,
    pub page_token: Option<String>,
    pub page_size: Option<u32>,
}

impl SearchRequest {
    pub fn new(fields: impl Into<String>) -> Self {
        Self {
            fields: fields.into(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: Option<String>) -> Self {
        self.query = query;
        self
    }

    pub fn with_page_token(mut self, page_token: Option<String>) -> Self {
        self.page_token = page_token;
        self
    }

    pub fn with_page_size(mut self, page_size: u32) -> Self {
        self.page_size = Some(page_size);
        self
    }
}

/// One page of search results.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchPage {
    #[serde(default)]
    pub files: Vec<DocumentRecord>,
    #[serde(default)]
    pub next_page_token: Option<String>,
}

/// The remote file store search API.
#[async_trait::async_trait]
pub trait FileStore: Send + Sync {
    async fn search(&self, request: &SearchRequest) -> Result<SearchPage, StoreError>;
}

/// Run a search and follow continuation tokens until the last page.
///
/// Each token is followed at most once; a token that was already requested
/// ends the walk.
pub async fn search_all(
    store: &dyn FileStore,
    request: &SearchRequest,
) -> Result<Vec<DocumentRecord>, StoreError> {
    let mut request = request.clone();
    let mut records = Vec::new();
    let mut pages = 0usize;
    let mut seen: HashSet<String> = request.page_token.iter().cloned().collect();

    loop {
        let page = store.search(&request).await?;
        pages += 1;
        records.extend(page.files);

        match page.next_page_token {
            Some(token) if seen.insert(token.clone()) => {
                request.page_token = Some(token);
            }
            Some(token) => {
                warn!("Page token {:?} was already requested, stopping", token);
                break;
            }
            None => break,
        }
    }

    debug!("Collected {} records over {} pages", records.len(), pages);
    Ok(records)
}

#[cfg(test)]
pub(crate) mod testing {
    //! In-memory store used by handler tests.

    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Serves canned pages keyed by `(query, page_token)` and records every
    /// request it receives.
    #[derive(Default)]
    pub struct StaticStore {
        pages: HashMap<(Option<String>, Option<String>), SearchPage>,
        failure: Option<String>,
        pub requests: Mutex<Vec<SearchRequest>>,
    }

    impl StaticStore {
        pub fn new() -> Self {
            Self::default()
        }

        /// A store whose every search fails with `message`.
        pub fn failing(message: &str) -> Self {
            Self {
                failure: Some(message.to_string()),
                ..Self::default()
            }
        }

        pub fn with_page(
            mut self,
            query: Option<&str>,
            page_token: Option<&str>,
            files: Vec<DocumentRecord>,
            next_page_token: Option<&str>,
        ) -> Self {
            self.pages.insert(
                (query.map(String::from), page_token.map(String::from)),
                SearchPage {
                    files,
                    next_page_token: next_page_token.map(String::from),
                },
            );
            self
        }

        pub fn recorded(&self) -> Vec<SearchRequest> {
            self.requests.lock().unwrap().clone()
        }
    }

    #[async_trait::async_trait]
    impl FileStore for StaticStore {
        async fn search(&self, request: &SearchRequest) -> Result<SearchPage, StoreError> {
            self.requests.lock().unwrap().push(request.clone());

            if let Some(ref message) = self.failure {
                return Err(StoreError::Request(message.clone()));
            }

            Ok(self
                .pages
                .get(&(request.query.clone(), request.page_token.clone()))
                .cloned()
                .unwrap_or_default())
        }
    }
}
