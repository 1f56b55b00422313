use axum::http::HeaderMap;

use crate::error::ApiError;

/// Checks a rate limit stored in Redis.
///
/// Uses the INCR + EXPIRE strategy:
/// - Increments a counter for `key`
/// - On first increment, sets TTL to `window_secs`
/// - Returns 429 if counter exceeds `max_attempts`
///
/// When Redis is unreachable the request is let through.
pub async fn check_rate_limit(
    redis: &redis::Client,
    key: &str,
    max_attempts: u64,
    window_secs: u64,
) -> Result<(), ApiError> {
    let mut conn = match redis.get_multiplexed_async_connection().await {
        Ok(conn) => conn,
        Err(e) => {
            tracing::warn!("Rate limit skipped, Redis unavailable: {}", e);
            return Ok(());
        }
    };

    let count: u64 = redis::cmd("INCR")
        .arg(key)
        .query_async(&mut conn)
        .await
        .unwrap_or(0);

    if count == 1 {
        // Set TTL only on first increment to avoid resetting the window on each attempt
        let _: Result<(), _> = redis::cmd("EXPIRE")
            .arg(key)
            .arg(window_secs)
            .query_async(&mut conn)
            .await;
    }

    if count > max_attempts {
        return Err(ApiError::TooManyRequests(
            "Trop de demandes. Réessayez dans quelques minutes.",
        ));
    }

    Ok(())
}

/// Client address as reported by the reverse proxy.
pub fn client_ip(headers: &HeaderMap) -> String {
    headers
        .get("x-real-ip")
        .and_then(|v| v.to_str().ok())
        .or_else(|| {
            headers
                .get("x-forwarded-for")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.split(',').next())
        })
        .map(|ip| ip.trim().to_string())
        .filter(|ip| !ip.is_empty())
        .unwrap_or_else(|| "unknown".into())
}

/// Per-IP and global limits of a public form (`kind` is e.g. `orphanage` or `partner`).
pub async fn check_public_form(
    redis: &redis::Client,
    headers: &HeaderMap,
    kind: &str,
    per_ip_per_hour: u64,
) -> Result<(), ApiError> {
    let ip = client_ip(headers);
    check_rate_limit(redis, &format!("rate:{kind}:ip:{ip}"), per_ip_per_hour, 3600).await?;
    check_rate_limit(redis, &format!("rate:{kind}:global"), per_ip_per_hour * 40, 3600).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn real_ip_wins_over_forwarded_for() {
        let mut headers = HeaderMap::new();
        headers.insert("x-forwarded-for", HeaderValue::from_static("10.0.0.1, 172.16.0.1"));
        assert_eq!(client_ip(&headers), "10.0.0.1");
        headers.insert("x-real-ip", HeaderValue::from_static("192.168.1.20"));
        assert_eq!(client_ip(&headers), "192.168.1.20");
    }

    #[test]
    fn missing_headers_fall_back_to_unknown() {
        assert_eq!(client_ip(&HeaderMap::new()), "unknown");
    }
}
