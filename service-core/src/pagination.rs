//! Offset-based pagination over any counted, sliceable source.
//!
//! [`paginate`] is the single entry point: it normalizes the incoming
//! [`PageQuery`], issues the slice fetch and the total count concurrently,
//! and computes the page links. Requesting a page past the end is a tolerant
//! read: it returns an empty page, never an error.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::AppError;

pub const DEFAULT_PAGE: u64 = 1;
pub const DEFAULT_LIMIT: u64 = 20;

/// Incoming pagination parameters. `page` and `limit` are coerced to >= 1;
/// `all=true` collapses the result to a single page holding every row.
#[derive(Debug, Clone, Deserialize)]
pub struct PageQuery {
    #[serde(default = "default_page")]
    pub page: u64,
    #[serde(default = "default_limit")]
    pub limit: u64,
    #[serde(default)]
    pub all: bool,
}

impl Default for PageQuery {
    fn default() -> Self {
        PageQuery {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
            all: false,
        }
    }
}

fn default_page() -> u64 {
    DEFAULT_PAGE
}

fn default_limit() -> u64 {
    DEFAULT_LIMIT
}

/// One page of results plus the metadata clients need to walk the set.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Page<T> {
    pub total: u64,
    pub limit: u64,
    pub current_page: u64,
    pub first_page: u64,
    pub last_page: u64,
    pub next_page: Option<u64>,
    pub previous_page: Option<u64>,
    pub data: Vec<T>,
}

impl<T> Page<T> {
    /// Compute page links for a sliced fetch. An empty set still has one
    /// (empty) page so `lastPage` is never zero.
    pub fn new(total: u64, page: u64, limit: u64, data: Vec<T>) -> Self {
        let last_page = total.div_ceil(limit).max(1);
        Page {
            total,
            limit,
            current_page: page,
            first_page: 1,
            last_page,
            next_page: (page < last_page).then(|| page + 1),
            previous_page: (page > 1).then(|| page - 1),
            data,
        }
    }

    /// The `all=true` shape: everything on one page, `limit` equal to the
    /// total, no neighbouring pages.
    pub fn collapsed(data: Vec<T>) -> Self {
        let total = data.len() as u64;
        Page {
            total,
            limit: total,
            current_page: 1,
            first_page: 1,
            last_page: 1,
            next_page: None,
            previous_page: None,
            data,
        }
    }

    pub fn map<U>(self, f: impl FnMut(T) -> U) -> Page<U> {
        Page {
            total: self.total,
            limit: self.limit,
            current_page: self.current_page,
            first_page: self.first_page,
            last_page: self.last_page,
            next_page: self.next_page,
            previous_page: self.previous_page,
            data: self.data.into_iter().map(f).collect(),
        }
    }
}

impl<T: Serialize> Page<T> {
    pub fn into_values(self) -> Result<Page<Value>, serde_json::Error> {
        let data = self
            .data
            .into_iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Page {
            total: self.total,
            limit: self.limit,
            current_page: self.current_page,
            first_page: self.first_page,
            last_page: self.last_page,
            next_page: self.next_page,
            previous_page: self.previous_page,
            data,
        })
    }
}

/// A listable resource: a sliced fetch plus a total count over the same
/// filter. Failures propagate unmodified.
#[async_trait]
pub trait PageSource: Send + Sync {
    type Item: Send;

    /// Fetch up to `take` rows starting at `skip`; `None` means no limit.
    async fn fetch(&self, skip: u64, take: Option<u64>) -> Result<Vec<Self::Item>, AppError>;

    /// Count the full matching set, not just the requested slice.
    async fn count(&self) -> Result<u64, AppError>;
}

/// Run one paginated read against `source`.
pub async fn paginate<S: PageSource>(source: &S, query: &PageQuery) -> Result<Page<S::Item>, AppError> {
    if query.all {
        let data = source.fetch(0, None).await?;
        return Ok(Page::collapsed(data));
    }

    let page = query.page.max(1);
    let limit = query.limit.max(1);
    let skip = (page - 1) * limit;

    let (data, total) = tokio::try_join!(source.fetch(skip, Some(limit)), source.count())?;

    Ok(Page::new(total, page, limit, data))
}
