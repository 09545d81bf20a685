/// Checks if a host falls under an allowed-domain pattern
///
/// Patterns match the domain itself and every subdomain below it. A leading
/// `*.` is accepted and means the same thing, and a leading `www.` on either
/// side is ignored.
///
/// # Examples
///
/// ```
/// use legal_scout::url::matches_domain;
///
/// assert!(matches_domain("anthropic.com", "anthropic.com"));
/// assert!(matches_domain("anthropic.com", "support.anthropic.com"));
/// assert!(matches_domain("*.anthropic.com", "privacy.anthropic.com"));
/// assert!(!matches_domain("anthropic.com", "notanthropic.com"));
/// ```
pub fn matches_domain(pattern: &str, candidate: &str) -> bool {
    let base = strip_www(pattern.trim().strip_prefix("*.").unwrap_or(pattern.trim()));
    let candidate = strip_www(candidate);

    if base.is_empty() || candidate.is_empty() {
        return false;
    }

    candidate.eq_ignore_ascii_case(base)
        || candidate
            .to_ascii_lowercase()
            .ends_with(&format!(".{}", base.to_ascii_lowercase()))
}

fn strip_www(host: &str) -> &str {
    host.strip_prefix("www.").unwrap_or(host)
}
