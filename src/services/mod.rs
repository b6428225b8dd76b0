//! Services Layer
//!
//! One service per data need. Each binds a query-key factory, a domain API
//! client, a transform, and a freshness policy, and hands callers a
//! [`QueryOutcome`](crate::cache::QueryOutcome): data and error can coexist
//! (stale-while-error), `is_stale` flags values past their window.
//!
//! # Architecture
//!
//! ```text
//! Screen --> Service --> QueryCache --> Domain client --> Transform
//!                            │
//!                            └──> KvStore (persisted snapshot)
//! ```
//!
//! # Services
//!
//! - `SeriesService` - Indicators, series history charts, metadata
//! - `QuotesService` - Current/historical currency, equity, bond quotes
//! - `CryptoService` - Prices, klines, live polling ticker
//! - `NewsService` - Paged news with next-page prefetch
//! - `AlertsService` - Alert CRUD with list invalidation

pub mod alerts_service;
pub mod crypto_service;
pub mod news_service;
pub mod quotes_service;
pub mod series_service;

pub use alerts_service::AlertsService;
pub use crypto_service::{CryptoService, CryptoTicker};
pub use news_service::NewsService;
pub use quotes_service::QuotesService;
pub use series_service::SeriesService;
