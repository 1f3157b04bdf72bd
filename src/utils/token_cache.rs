use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Result, anyhow};
use moka::future::Cache;
use once_cell::sync::Lazy;

/// key   => "{scope}|{subject}"
/// value => bearer access token
///
/// Google tokens live 60 minutes; the 55-minute TTL keeps a safety
/// margin so a cached token is never handed out near expiry.
pub static TOKEN_CACHE: Lazy<Cache<String, String>> = Lazy::new(|| {
    Cache::builder()
        .max_capacity(64)
        .time_to_live(Duration::from_secs(55 * 60))
        .build()
});

pub fn cache_key(scope: &str, subject: Option<&str>) -> String {
    format!("{}|{}", scope, subject.unwrap_or(""))
}

/// Fetch-through lookup: concurrent callers for the same key share one
/// mint round-trip.
pub async fn cached_token<F>(key: String, mint: F) -> Result<String>
where
    F: Future<Output = Result<String>>,
{
    TOKEN_CACHE
        .try_get_with(key, mint)
        .await
        .map_err(|e: Arc<anyhow::Error>| anyhow!("{e:#}"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cache_key_separates_scope_and_subject() {
        assert_eq!(
            cache_key("https://www.googleapis.com/auth/spreadsheets", None),
            "https://www.googleapis.com/auth/spreadsheets|"
        );
        assert_eq!(
            cache_key("scope-a", Some("admin@example.com")),
            "scope-a|admin@example.com"
        );
    }

    #[actix_web::test]
    async fn cached_token_mints_once_per_key() {
        use std::sync::atomic::{AtomicUsize, Ordering};
        static MINTS: AtomicUsize = AtomicUsize::new(0);

        let mint = || async {
            MINTS.fetch_add(1, Ordering::SeqCst);
            Ok("tok".to_string())
        };

        let a = cached_token("k-mint-once|".into(), mint()).await.unwrap();
        let b = cached_token("k-mint-once|".into(), mint()).await.unwrap();
        assert_eq!(a, "tok");
        assert_eq!(b, "tok");
        assert_eq!(MINTS.load(Ordering::SeqCst), 1);
    }

    #[actix_web::test]
    async fn mint_failures_are_not_cached() {
        let bad = cached_token("k-fail|".into(), async { Err(anyhow!("boom")) }).await;
        assert!(bad.is_err());

        let good = cached_token("k-fail|".into(), async { Ok("tok".to_string()) }).await;
        assert_eq!(good.unwrap(), "tok");
    }
}
