//! Robots.txt parsing
//!
//! Sitemap declarations and crawl delays are read line by line; allow and
//! disallow rules are matched with the robotstxt crate.

use robotstxt::DefaultMatcher;
use url::Url;

/// Directives read from one robots.txt file
#[derive(Debug, Clone, Default)]
pub struct RobotsTxt {
    /// Absolute sitemap URLs from `Sitemap:` lines, in file order
    pub sitemaps: Vec<String>,

    /// Raw robots.txt content (empty means allow all)
    content: String,
}

/// Parses robots.txt content
///
/// `Sitemap:` lines are matched case-insensitively and may appear anywhere in
/// the file. Values that are not absolute http(s) URLs are dropped. Malformed
/// content yields no sitemaps and allows everything.
///
/// # Example
///
/// ```
/// use legal_scout::robots::parse_robots_txt;
///
/// let robots = parse_robots_txt("User-agent: *\nSitemap: https://example.com/sitemap.xml\n");
/// assert_eq!(robots.sitemaps, vec!["https://example.com/sitemap.xml"]);
/// ```
pub fn parse_robots_txt(text: &str) -> RobotsTxt {
    let mut sitemaps: Vec<String> = Vec::new();

    for line in text.lines() {
        let line = line.split('#').next().unwrap_or("").trim();
        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        if !key.trim().eq_ignore_ascii_case("sitemap") {
            continue;
        }

        let value = value.trim();
        let absolute = Url::parse(value)
            .map(|u| matches!(u.scheme(), "http" | "https"))
            .unwrap_or(false);
        if absolute && !sitemaps.iter().any(|s| s == value) {
            sitemaps.push(value.to_string());
        }
    }

    RobotsTxt {
        sitemaps,
        content: text.to_string(),
    }
}

impl RobotsTxt {
    /// A robots file that allows everything and declares nothing
    pub fn allow_all() -> Self {
        Self::default()
    }

    /// Checks if a URL is allowed for the given user agent
    pub fn is_allowed(&self, url: &str, user_agent: &str) -> bool {
        if self.content.trim().is_empty() {
            return true;
        }

        let mut matcher = DefaultMatcher::default();
        matcher.one_agent_allowed_by_robots(&self.content, user_agent, url)
    }

    /// Gets the crawl delay in seconds for a specific user agent
    ///
    /// A group naming the agent wins over the `*` group.
    pub fn crawl_delay(&self, user_agent: &str) -> Option<f64> {
        let mut current_user_agents: Vec<String> = Vec::new();
        let mut in_rules = false;
        let mut crawl_delay_for_wildcard: Option<f64> = None;
        let mut crawl_delay_for_agent: Option<f64> = None;

        let normalized_agent = user_agent.to_lowercase();

        for line in self.content.lines() {
            let trimmed = line.split('#').next().unwrap_or("").trim();
            let Some((key, value)) = trimmed.split_once(':') else {
                continue;
            };
            let key = key.trim().to_lowercase();
            let value = value.trim();

            match key.as_str() {
                "user-agent" => {
                    // A user-agent line after rules starts a new group
                    if in_rules {
                        current_user_agents.clear();
                        in_rules = false;
                    }
                    current_user_agents.push(value.to_lowercase());
                }
                "crawl-delay" => {
                    in_rules = true;
                    let Some(delay) = value.parse::<f64>().ok().filter(|d| d.is_finite() && *d >= 0.0)
                    else {
                        continue;
                    };
                    if current_user_agents
                        .iter()
                        .any(|ua| ua != "*" && normalized_agent.contains(ua.as_str()))
                    {
                        crawl_delay_for_agent = Some(delay);
                    } else if current_user_agents.iter().any(|ua| ua == "*") {
                        crawl_delay_for_wildcard = Some(delay);
                    }
                }
                "sitemap" => {}
                _ => in_rules = true,
            }
        }

        crawl_delay_for_agent.or(crawl_delay_for_wildcard)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_two_sitemap_lines() {
        let content = "User-agent: *\nDisallow: /admin\n\nSitemap: https://example.com/sitemap-pages.xml\nsitemap: https://example.com/sitemap-legal.xml\n";
        let robots = parse_robots_txt(content);
        assert_eq!(
            robots.sitemaps,
            vec![
                "https://example.com/sitemap-pages.xml",
                "https://example.com/sitemap-legal.xml"
            ]
        );
    }

    #[test]
    fn test_sitemap_case_and_spacing() {
        let content = "SITEMAP:https://example.com/a.xml\n  SiteMap :  https://example.com/b.xml  # main\n";
        let robots = parse_robots_txt(content);
        assert_eq!(
            robots.sitemaps,
            vec!["https://example.com/a.xml", "https://example.com/b.xml"]
        );
    }

    #[test]
    fn test_relative_and_duplicate_sitemaps_dropped() {
        let content = "Sitemap: /sitemap.xml\nSitemap: https://example.com/s.xml\nSitemap: https://example.com/s.xml\n";
        let robots = parse_robots_txt(content);
        assert_eq!(robots.sitemaps, vec!["https://example.com/s.xml"]);
    }

    #[test]
    fn test_garbage_yields_nothing() {
        let robots = parse_robots_txt("This is not valid robots.txt {{{");
        assert!(robots.sitemaps.is_empty());
        assert!(robots.is_allowed("https://example.com/any/path", "TestBot"));
    }

    #[test]
    fn test_allow_all() {
        let robots = RobotsTxt::allow_all();
        assert!(robots.is_allowed("https://example.com/admin", "TestBot"));
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }

    #[test]
    fn test_disallow_specific() {
        let robots = parse_robots_txt("User-agent: *\nDisallow: /admin");
        assert!(robots.is_allowed("https://example.com/privacy", "TestBot"));
        assert!(!robots.is_allowed("https://example.com/admin/users", "TestBot"));
    }

    #[test]
    fn test_specific_user_agent() {
        let robots = parse_robots_txt("User-agent: BadBot\nDisallow: /\n\nUser-agent: *\nAllow: /");
        assert!(robots.is_allowed("https://example.com/page", "GoodBot"));
        assert!(!robots.is_allowed("https://example.com/page", "BadBot"));
    }

    #[test]
    fn test_crawl_delay_wildcard() {
        let robots = parse_robots_txt("User-agent: *\nCrawl-delay: 10\nDisallow: /admin");
        assert_eq!(robots.crawl_delay("TestBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_specific_agent() {
        let robots =
            parse_robots_txt("User-agent: TestBot\nCrawl-delay: 5\n\nUser-agent: *\nCrawl-delay: 10");
        assert_eq!(robots.crawl_delay("TestBot"), Some(5.0));
        assert_eq!(robots.crawl_delay("OtherBot"), Some(10.0));
    }

    #[test]
    fn test_crawl_delay_after_disallow() {
        let robots = parse_robots_txt("User-agent: *\nDisallow: /tmp\nCrawl-delay: 2.5");
        assert_eq!(robots.crawl_delay("LegalScout"), Some(2.5));
    }

    #[test]
    fn test_crawl_delay_multiple_user_agents() {
        let robots = parse_robots_txt("User-agent: BotA\nUser-agent: BotB\nCrawl-delay: 3");
        assert_eq!(robots.crawl_delay("BotA"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotB"), Some(3.0));
        assert_eq!(robots.crawl_delay("BotC"), None);
    }

    #[test]
    fn test_crawl_delay_invalid_value() {
        let robots = parse_robots_txt("User-agent: *\nCrawl-delay: soon");
        assert_eq!(robots.crawl_delay("TestBot"), None);
    }
}
