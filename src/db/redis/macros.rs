/// Read-through caching over [`Cache`](crate::db::Cache).
///
/// Returns the cached value for `$key` when present. Otherwise awaits
/// `$block`, queues the result for a background write with `$ttl` seconds
/// and returns it. A failing cache read is logged and treated as a miss, so
/// Redis being down never fails the wrapped computation.
///
/// # Example
/// ```rust,ignore
/// let embedding: Embedding = cached!(cache, key, 3600, provider.embed(prompt))?;
/// ```
#[macro_export]
macro_rules! cached {
    ($cache:expr, $key:expr, $ttl:expr, $block:expr) => {{
        let key = $key;
        match $cache.get_from_cache(&key).await {
            Ok(Some(cached)) => {
                tracing::debug!(key = %key, "Cache hit");
                Ok(cached)
            }
            result => {
                if let Err(e) = result {
                    tracing::warn!(key = %key, error = %e, "Cache read failed, computing value");
                }
                match $block.await {
                    Ok(value) => {
                        $cache.set_in_background(&key, &value, $ttl);
                        Ok(value)
                    }
                    Err(e) => Err(e),
                }
            }
        }
    }};
}
