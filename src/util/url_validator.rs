use std::net::IpAddr;
use thiserror::Error;
use url::Url;

/// Errors that can occur during URL validation.
#[derive(Error, Debug)]
pub enum UrlValidationError {
    /// The URL string could not be parsed.
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    /// The URL uses a scheme other than http or https.
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    /// The URL points to a private/internal IP address.
    #[error("Private IP address not allowed: {0}")]
    PrivateIp(String),
    /// The URL points to localhost.
    #[error("Localhost not allowed")]
    Localhost,
    /// The API base uses plain HTTP on a non-local host.
    #[error("Insecure base URL: HTTPS required (except localhost for testing)")]
    InsecureBase,
}

/// Validates a locator returned inside an API response before following it.
///
/// Evolution-chain locators are opaque URLs handed to us by the remote API.
/// Following them blindly would let a hostile or compromised response point
/// the client at internal services, so this rejects:
/// - Non-HTTP(S) schemes (e.g., `file://`, `ftp://`)
/// - Localhost addresses (`localhost`, `127.0.0.1`, `::1`)
/// - Private IP ranges (RFC 1918, link-local, unique local IPv6)
///
/// ```
/// use dexterm::util::validate_url;
///
/// let url = validate_url("https://pokeapi.co/api/v2/evolution-chain/1/").unwrap();
/// assert_eq!(url.host_str(), Some("pokeapi.co"));
///
/// assert!(validate_url("http://localhost/evolution-chain/1/").is_err());
/// assert!(validate_url("http://192.168.1.1/").is_err());
/// assert!(validate_url("file:///etc/passwd").is_err());
/// ```
pub fn validate_url(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str)?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    if let Some(host) = url.host_str() {
        if host == "localhost" {
            return Err(UrlValidationError::Localhost);
        }

        let host_for_parse = host
            .strip_prefix('[')
            .and_then(|h| h.strip_suffix(']'))
            .unwrap_or(host);

        if let Ok(ip) = host_for_parse.parse::<IpAddr>() {
            if ip.is_loopback() {
                return Err(UrlValidationError::Localhost);
            }
            if is_private_ip(&ip) {
                return Err(UrlValidationError::PrivateIp(ip.to_string()));
            }
        }
    }

    Ok(url)
}

/// Validates the configured API base URL.
///
/// HTTPS is required. Plain HTTP is accepted only for `localhost` and
/// `127.0.0.1`, which is what local mock servers bind to. A trailing slash is
/// stripped so paths can be appended with `format!("{base}/...")`.
pub fn validate_api_base(base: &str) -> Result<String, UrlValidationError> {
    let url = Url::parse(base)?;

    match url.scheme() {
        "https" => {}
        "http" => {
            let is_local = matches!(url.host_str(), Some("localhost") | Some("127.0.0.1"));
            if !is_local {
                return Err(UrlValidationError::InsecureBase);
            }
            tracing::warn!(base_url = %base, "Using non-HTTPS API base URL (localhost only)");
        }
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }

    Ok(base.trim_end_matches('/').to_string())
}

fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(ipv4) => {
            ipv4.is_private() || ipv4.is_loopback() || ipv4.is_link_local() || ipv4.is_unspecified()
        }
        IpAddr::V6(ipv6) => {
            if ipv6.is_loopback() || ipv6.is_unspecified() {
                return true;
            }
            let segments = ipv6.segments();
            // Unique Local (fc00::/7)
            let is_unique_local = (segments[0] & 0xfe00) == 0xfc00;
            // Link-Local (fe80::/10)
            let is_link_local = (segments[0] & 0xffc0) == 0xfe80;
            is_unique_local || is_link_local
        }
    }
}
