use crate::error::ScanError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::net::IpAddr;

/// A host resolved once, before any worker starts.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Target {
    pub hostname: String,
    pub ip: IpAddr,
}

/// Name resolution seam used by the scanner.
#[async_trait]
pub trait Resolve: Send + Sync {
    async fn resolve(&self, host: &str) -> Result<Target, ScanError>;
}

/// Resolves through the operating system, preferring IPv4 addresses.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

#[async_trait]
impl Resolve for SystemResolver {
    async fn resolve(&self, host: &str) -> Result<Target, ScanError> {
        let hostname = host.trim();
        let fail = |reason: String| ScanError::Resolution {
            host: hostname.to_string(),
            reason,
        };
        if hostname.is_empty() {
            return Err(fail("empty hostname".into()));
        }
        if let Ok(ip) = hostname.parse::<IpAddr>() {
            return Ok(Target {
                hostname: hostname.to_string(),
                ip,
            });
        }

        let addrs: Vec<IpAddr> = tokio::net::lookup_host((hostname, 0))
            .await
            .map_err(|e| fail(e.to_string()))?
            .map(|sa| sa.ip())
            .collect();
        let ip = addrs
            .iter()
            .find(|ip| ip.is_ipv4())
            .or_else(|| addrs.first())
            .copied()
            .ok_or_else(|| fail("no addresses returned".into()))?;

        Ok(Target {
            hostname: hostname.to_string(),
            ip,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::Ipv4Addr;

    #[tokio::test]
    async fn literal_address_skips_lookup() {
        let t = SystemResolver.resolve(" 127.0.0.1 ").await.unwrap();
        assert_eq!(t.ip, IpAddr::V4(Ipv4Addr::LOCALHOST));
        assert_eq!(t.hostname, "127.0.0.1");
    }

    #[tokio::test]
    async fn empty_host_is_a_resolution_error() {
        let err = SystemResolver.resolve("   ").await.unwrap_err();
        assert!(matches!(err, ScanError::Resolution { .. }));
    }
}
