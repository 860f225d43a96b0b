pub mod query_cache;

mod macros;

pub use query_cache::CacheKey;
pub use query_cache::CacheSweeperHandle;
pub use query_cache::QueryCache;
pub use query_cache::RetryPolicy;
