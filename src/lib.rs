pub mod access;
pub mod catalog;
pub mod config;
pub mod error;
pub mod executor;
pub mod expression;
pub mod filter;
pub mod search;
pub mod store;

pub use catalog::Catalog;
pub use config::SearchConfig;
pub use error::{SearchError, SearchResult};
pub use search::{CriteriaSearchExecutor, RawSearchRequest, SearchRequest};
pub use store::{BackingStore, CancellationToken, MemoryStore};
