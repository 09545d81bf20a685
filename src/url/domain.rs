use std::net::IpAddr;
use url::Url;

/// Second-level labels that act as public suffixes under a country TLD
/// (`example.co.uk` is registrable, `co.uk` is not).
const MULTI_PART_SUFFIXES: &[&str] = &[
    "ac", "co", "com", "edu", "gov", "gob", "ltd", "me", "net", "nic", "or", "org", "plc", "sch",
];

/// Extracts the lowercase host from a URL
///
/// # Examples
///
/// ```
/// use url::Url;
/// use legal_scout::url::extract_domain;
///
/// let url = Url::parse("https://EXAMPLE.COM/path").unwrap();
/// assert_eq!(extract_domain(&url), Some("example.com".to_string()));
/// ```
pub fn extract_domain(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Reduces a host to its registrable-domain equivalent
///
/// `privacy.anthropic.com` and `www.anthropic.com` both become
/// `anthropic.com`; `shop.example.co.uk` becomes `example.co.uk`.
/// IP addresses and single-label hosts are returned unchanged.
///
/// # Examples
///
/// ```
/// use legal_scout::url::root_domain;
///
/// assert_eq!(root_domain("support.anthropic.com"), "anthropic.com");
/// assert_eq!(root_domain("shop.example.co.uk"), "example.co.uk");
/// ```
pub fn root_domain(host: &str) -> String {
    let host = host.trim_end_matches('.').to_lowercase();

    if host.parse::<IpAddr>().is_ok() || host.starts_with('[') {
        return host;
    }

    let labels: Vec<&str> = host.split('.').filter(|l| !l.is_empty()).collect();
    if labels.len() <= 2 {
        return labels.join(".");
    }

    let tld = labels[labels.len() - 1];
    let second = labels[labels.len() - 2];
    let keep = if tld.len() == 2 && MULTI_PART_SUFFIXES.contains(&second) {
        3
    } else {
        2
    };

    labels[labels.len() - keep..].join(".")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_simple_domain() {
        let url = Url::parse("https://example.com/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_with_port() {
        let url = Url::parse("https://example.com:8080/").unwrap();
        assert_eq!(extract_domain(&url), Some("example.com".to_string()));
    }

    #[test]
    fn test_extract_mixed_case() {
        let url = Url::parse("https://Privacy.Example.COM/").unwrap();
        assert_eq!(extract_domain(&url), Some("privacy.example.com".to_string()));
    }

    #[test]
    fn test_root_of_bare_domain() {
        assert_eq!(root_domain("example.com"), "example.com");
    }

    #[test]
    fn test_root_of_subdomains() {
        assert_eq!(root_domain("www.example.com"), "example.com");
        assert_eq!(root_domain("privacy.anthropic.com"), "anthropic.com");
        assert_eq!(root_domain("a.b.c.example.org"), "example.org");
    }

    #[test]
    fn test_root_of_country_suffix() {
        assert_eq!(root_domain("example.co.uk"), "example.co.uk");
        assert_eq!(root_domain("legal.example.co.uk"), "example.co.uk");
        assert_eq!(root_domain("www.example.com.au"), "example.com.au");
    }

    #[test]
    fn test_root_of_ip_address() {
        assert_eq!(root_domain("127.0.0.1"), "127.0.0.1");
    }

    #[test]
    fn test_root_of_single_label() {
        assert_eq!(root_domain("localhost"), "localhost");
    }
}
