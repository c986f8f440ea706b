//! Network reachability probe

use std::time::Duration;

use tokio::net::TcpStream;
use tokio::time::timeout;
use tracing::debug;

/// Whether a TCP connection to `addr` succeeds within `limit`
pub async fn is_reachable(addr: &str, limit: Duration) -> bool {
    match timeout(limit, TcpStream::connect(addr)).await {
        Ok(Ok(_)) => true,
        Ok(Err(e)) => {
            debug!("Network probe to {} failed: {}", addr, e);
            false
        }
        Err(_) => {
            debug!("Network probe to {} timed out after {:?}", addr, limit);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_listening_address_is_reachable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap().to_string();

        assert!(is_reachable(&addr, Duration::from_secs(2)).await);
    }

    #[tokio::test]
    async fn test_malformed_address_is_unreachable() {
        assert!(!is_reachable("127.0.0.1:not-a-port", Duration::from_millis(200)).await);
    }
}
