use crate::error::{IngestError, Result};
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr};
use url::{Host, Url};

/// Characters that never appear in a legitimate clone URL
const URL_METACHARS: &[char] = &[';', '&', '|', '`', '$', '(', ')', '<', '>', '\'', '"'];

/// Outbound fetch policy: which URLs the sandbox may clone from
///
/// Screening is two-stage. Syntax screening needs no network and already
/// rejects bad schemes, credentials, and IP-literal hosts in blocked
/// ranges. Host screening resolves domain names and refuses the URL if
/// *any* resolved address is blocked, so a DNS rebind to a private range
/// fails before a connection is opened.
#[derive(Debug, Clone)]
pub struct FetchPolicy {
    allowed_schemes: Vec<String>,
}

impl Default for FetchPolicy {
    fn default() -> Self {
        Self {
            allowed_schemes: vec!["https".to_string(), "http".to_string()],
        }
    }
}

impl FetchPolicy {
    pub fn new(allowed_schemes: Vec<String>) -> Self {
        Self { allowed_schemes }
    }

    /// Stricter preset for deployments that never clone over plain http
    pub fn https_only() -> Self {
        Self {
            allowed_schemes: vec!["https".to_string()],
        }
    }

    /// Full pre-connection screening of a repository URL
    pub async fn screen(&self, raw: &str) -> Result<Url> {
        let url = self.screen_syntax(raw)?;
        self.screen_host(&url).await?;
        Ok(url)
    }

    /// Network-free checks: parse, scheme, credentials, and IP literals
    pub fn screen_syntax(&self, raw: &str) -> Result<Url> {
        let raw = raw.trim();
        if raw.chars().any(|c| c.is_control() || c.is_whitespace()) {
            return Err(IngestError::InvalidUrl(
                "url contains whitespace or control bytes".to_string(),
            ));
        }
        // The URL is passed as a single argv element, so these could not
        // reach a shell anyway; refusing them up front keeps the contract
        // independent of how the fetch is spawned
        if raw.contains(URL_METACHARS) {
            return Err(IngestError::InvalidUrl(
                "url contains shell metacharacters".to_string(),
            ));
        }

        let url = Url::parse(raw).map_err(|e| IngestError::InvalidUrl(e.to_string()))?;

        let scheme = url.scheme();
        if !self.allowed_schemes.iter().any(|s| s == scheme) {
            return Err(IngestError::InvalidProtocol {
                scheme: scheme.to_string(),
            });
        }

        if !url.username().is_empty() || url.password().is_some() {
            return Err(IngestError::InvalidUrl(
                "credentials embedded in url".to_string(),
            ));
        }

        match url.host() {
            None => {
                return Err(IngestError::InvalidUrl("url has no host".to_string()));
            }
            Some(Host::Ipv4(ip)) => screen_ipv4(ip)?,
            Some(Host::Ipv6(ip)) => screen_ipv6(ip)?,
            Some(Host::Domain(domain)) => screen_domain_name(domain)?,
        }

        Ok(url)
    }

    /// Resolve a domain host and screen every address it maps to
    pub async fn screen_host(&self, url: &Url) -> Result<()> {
        let domain = match url.host() {
            Some(Host::Domain(domain)) => domain.to_string(),
            // IP literals were already screened syntactically
            _ => return Ok(()),
        };
        let port = url.port_or_known_default().unwrap_or(443);

        let addrs = tokio::net::lookup_host((domain.as_str(), port))
            .await
            .map_err(|e| IngestError::InvalidUrl(format!("cannot resolve {domain}: {e}")))?;

        for addr in addrs {
            if let Err(err) = screen_ip(addr.ip()) {
                log::warn!("refusing {domain}: resolves into a blocked range");
                return Err(err);
            }
        }
        Ok(())
    }
}

fn screen_domain_name(domain: &str) -> Result<()> {
    let lowered = domain.to_ascii_lowercase();
    let blocked = lowered == "localhost"
        || lowered.ends_with(".localhost")
        || lowered.ends_with(".local")
        || lowered.ends_with(".internal");
    if blocked {
        return Err(IngestError::BlockedHost {
            host: domain.to_string(),
        });
    }
    Ok(())
}

fn screen_ip(ip: IpAddr) -> Result<()> {
    match ip {
        IpAddr::V4(v4) => screen_ipv4(v4),
        IpAddr::V6(v6) => screen_ipv6(v6),
    }
}

fn screen_ipv4(ip: Ipv4Addr) -> Result<()> {
    let blocked = ip.is_loopback()
        || ip.is_private()
        || ip.is_link_local()
        || ip.is_unspecified()
        || ip.is_broadcast()
        || is_cgnat(ip);
    if blocked {
        return Err(IngestError::BlockedHost {
            host: ip.to_string(),
        });
    }
    Ok(())
}

fn screen_ipv6(ip: Ipv6Addr) -> Result<()> {
    if let Some(mapped) = ip.to_ipv4_mapped() {
        return screen_ipv4(mapped);
    }
    let blocked =
        ip.is_loopback() || ip.is_unspecified() || is_unique_local(ip) || is_v6_link_local(ip);
    if blocked {
        return Err(IngestError::BlockedHost {
            host: ip.to_string(),
        });
    }
    Ok(())
}

/// Carrier-grade NAT, 100.64.0.0/10
fn is_cgnat(ip: Ipv4Addr) -> bool {
    let octets = ip.octets();
    octets[0] == 100 && (octets[1] & 0xc0) == 64
}

/// fc00::/7
fn is_unique_local(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xfe00) == 0xfc00
}

/// fe80::/10
fn is_v6_link_local(ip: Ipv6Addr) -> bool {
    (ip.segments()[0] & 0xffc0) == 0xfe80
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_public_urls_pass_syntax_screening() {
        let policy = FetchPolicy::default();
        assert!(policy.screen_syntax("https://github.com/org/repo").is_ok());
        assert!(policy.screen_syntax("http://example.com/repo.git").is_ok());
    }

    #[test]
    fn test_disallowed_scheme() {
        let policy = FetchPolicy::default();
        let err = policy.screen_syntax("ftp://example.com/repo").unwrap_err();
        assert_eq!(err.reason_code(), "invalid-protocol");

        let err = policy
            .screen_syntax("file:///etc/passwd")
            .unwrap_err();
        assert_eq!(err.reason_code(), "invalid-protocol");
    }

    #[test]
    fn test_https_only_preset_refuses_http() {
        let policy = FetchPolicy::https_only();
        assert!(policy.screen_syntax("https://example.com/r").is_ok());
        assert_eq!(
            policy
                .screen_syntax("http://example.com/r")
                .unwrap_err()
                .reason_code(),
            "invalid-protocol"
        );
    }

    #[test]
    fn test_loopback_and_private_literals_are_blocked() {
        let policy = FetchPolicy::default();
        for url in [
            "http://127.0.0.1/x",
            "http://10.0.0.5/x",
            "http://192.168.1.1/repo",
            "http://172.16.0.1/repo",
            "http://169.254.169.254/latest/meta-data",
            "http://100.64.1.2/repo",
            "http://0.0.0.0/x",
            "http://[::1]/x",
            "http://[fc00::1]/x",
            "http://[fe80::1]/x",
            "http://[::ffff:127.0.0.1]/x",
        ] {
            let err = policy.screen_syntax(url).unwrap_err();
            assert_eq!(err.reason_code(), "blocked-host", "url: {url}");
        }
    }

    #[test]
    fn test_localhost_domains_are_blocked() {
        let policy = FetchPolicy::default();
        for url in [
            "http://localhost/x",
            "http://localhost:8080/x",
            "https://foo.localhost/x",
            "https://metadata.google.internal/computeMetadata",
            "https://printer.local/x",
        ] {
            let err = policy.screen_syntax(url).unwrap_err();
            assert_eq!(err.reason_code(), "blocked-host", "url: {url}");
        }
    }

    #[test]
    fn test_shell_metacharacters_are_refused() {
        let policy = FetchPolicy::default();
        for url in [
            "https://example.com/$(whoami)",
            "https://example.com/a;rm",
            "https://example.com/a|b",
            "https://example.com/`id`",
            "https://example.com/a&b=c",
        ] {
            let err = policy.screen_syntax(url).unwrap_err();
            assert_eq!(err.reason_code(), "invalid-url", "url: {url}");
        }
    }

    #[test]
    fn test_credentials_and_garbage_are_invalid() {
        let policy = FetchPolicy::default();
        assert_eq!(
            policy
                .screen_syntax("https://user:pw@example.com/r")
                .unwrap_err()
                .reason_code(),
            "invalid-url"
        );
        assert_eq!(
            policy.screen_syntax("not a url").unwrap_err().reason_code(),
            "invalid-url"
        );
        assert_eq!(
            policy
                .screen_syntax("https://exa mple.com/r")
                .unwrap_err()
                .reason_code(),
            "invalid-url"
        );
    }

    #[tokio::test]
    async fn test_ip_literal_screening_needs_no_network() {
        let policy = FetchPolicy::default();
        let err = policy.screen("http://127.0.0.1/x").await.unwrap_err();
        assert_eq!(err.reason_code(), "blocked-host");
        let err = policy.screen("http://10.0.0.5/x").await.unwrap_err();
        assert_eq!(err.reason_code(), "blocked-host");
    }
}
