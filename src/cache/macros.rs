/// A macro to route an upstream call through the query cache.
///
/// Expands to `QueryCache::fetch` with a loader closure that re-evaluates
/// the given expression on every attempt, so retries issue a fresh request.
///
/// # Arguments
/// * `$cache`: The `QueryCache` to read from and populate.
/// * `$key`: The `CacheKey` identifying the request.
/// * `$request`: An expression producing a future of `AppResult<T>`. It must
///   only borrow `Copy` values (references, ids) since it is re-run on retry.
///
/// # Example
/// ```rust,ignore
/// let detail: MovieDetail = cached!(self.cache, CacheKey::detail(id), self.request_detail(id))?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $request:expr) => {{
        $cache.fetch($key, move || $request).await
    }};
}
