//! Small helpers for rate-limit friendly networking.

use anyhow::{anyhow, Result};
use rand::{thread_rng, Rng};

/// Statuses worth retrying: rate limiting and transient upstream failures
pub fn is_transient(status: u16) -> bool {
    matches!(status, 429 | 500 | 502 | 503 | 504)
}

/// Send `rb`, retrying transient statuses and transport errors up to
/// `max_retries` times with jittered exponential backoff. The final response
/// is returned as-is, whatever its status.
pub async fn send_with_backoff(
    rb: reqwest::RequestBuilder,
    label: &str,
    max_retries: u32,
) -> Result<reqwest::Response> {
    let mut attempt = 0u32;
    loop {
        let req = rb
            .try_clone()
            .ok_or_else(|| anyhow!("request for {label} cannot be retried (streaming body)"))?;
        match req.send().await {
            Ok(r) => {
                if is_transient(r.status().as_u16()) && attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!(
                        "[net] {} {} retry={} backoff={}ms",
                        r.status().as_u16(),
                        label,
                        attempt,
                        back_ms
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Ok(r);
            }
            Err(e) => {
                if attempt < max_retries {
                    attempt += 1;
                    let back_ms = backoff_delay_ms(attempt);
                    log::warn!(
                        "[net] err {} retry={} backoff={}ms : {}",
                        label,
                        attempt,
                        back_ms,
                        e
                    );
                    tokio::time::sleep(std::time::Duration::from_millis(back_ms)).await;
                    continue;
                }
                return Err(anyhow!(e).context(format!("request failed: {label}")));
            }
        }
    }
}

/// 300, 600, 1200, 2400, 4800, 9600 ms plus up to 250 ms of jitter
pub fn backoff_delay_ms(attempt: u32) -> u64 {
    let base = 300u64.saturating_mul(1u64 << (attempt.clamp(1, 6) - 1));
    let jitter: u64 = thread_rng().gen_range(0..=250);
    base + jitter
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backoff_grows_and_caps() {
        let first = backoff_delay_ms(1);
        assert!((300..=550).contains(&first));
        let third = backoff_delay_ms(3);
        assert!((1200..=1450).contains(&third));
        let capped = backoff_delay_ms(40);
        assert!((9600..=9850).contains(&capped));
    }

    #[test]
    fn test_transient_statuses() {
        assert!(is_transient(429));
        assert!(is_transient(503));
        assert!(!is_transient(404));
        assert!(!is_transient(400));
    }
}
