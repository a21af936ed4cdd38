use crate::{match_title, split_raw, Framework, Frameworks, Source};
use regex::Regex;

/// A single case-insensitive pattern. When the pattern has a capture group,
/// its first match becomes the framework version.
#[derive(Debug, Clone)]
pub struct FingerRule {
    pub name: String,
    pub source: Source,
    header: Option<String>,
    pattern: Regex,
}

impl FingerRule {
    pub fn header(name: &str, header: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(FingerRule {
            name: name.to_string(),
            source: Source::Header,
            header: Some(header.to_ascii_lowercase()),
            pattern: compile(pattern)?,
        })
    }

    pub fn body(name: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(FingerRule { name: name.to_string(), source: Source::Body, header: None, pattern: compile(pattern)? })
    }

    pub fn title(name: &str, pattern: &str) -> Result<Self, regex::Error> {
        Ok(FingerRule { name: name.to_string(), source: Source::Title, header: None, pattern: compile(pattern)? })
    }

    fn check(&self, text: &str) -> Option<Framework> {
        let caps = self.pattern.captures(text)?;
        let fw = Framework::new(self.name.clone(), self.source);
        Some(match caps.get(1).map(|m| m.as_str()).filter(|v| !v.is_empty()) {
            Some(v) => fw.with_version(v),
            None => fw,
        })
    }
}

fn compile(pattern: &str) -> Result<Regex, regex::Error> {
    Regex::new(&format!("(?i){}", pattern))
}

// (name, source, header, pattern)
const BUILTIN: &[(&str, Source, &str, &str)] = &[
    ("nginx", Source::Header, "server", r"nginx(?:/([\d.]+))?"),
    ("apache", Source::Header, "server", r"apache(?:/([\d.]+))?"),
    ("iis", Source::Header, "server", r"microsoft-iis(?:/([\d.]+))?"),
    ("caddy", Source::Header, "server", r"caddy"),
    ("cloudflare", Source::Header, "server", r"cloudflare"),
    ("php", Source::Header, "x-powered-by", r"php(?:/([\d.]+))?"),
    ("express", Source::Header, "x-powered-by", r"express"),
    ("aspnet", Source::Header, "x-powered-by", r"asp\.net"),
    ("aspnet", Source::Header, "x-aspnet-version", r"([\d.]+)"),
    ("django", Source::Header, "x-powered-by", r"django"),
    ("php", Source::Header, "set-cookie", r"phpsessid="),
    ("java", Source::Header, "set-cookie", r"jsessionid="),
    ("laravel", Source::Header, "set-cookie", r"laravel_session="),
    ("jenkins", Source::Header, "x-jenkins", r"(\d[\d.]*)?"),
    ("drupal", Source::Header, "x-drupal-cache", r""),
    ("wordpress", Source::Body, "", r#"<meta[^>]+content="wordpress ([\d.]+)""#),
    ("wordpress", Source::Body, "", r"wp-content/"),
    ("joomla", Source::Body, "", r"joomla!"),
    ("drupal", Source::Body, "", r"/sites/default/files"),
    ("angular", Source::Body, "", r"ng-app"),
    ("react", Source::Body, "", r"react-dom|data-reactroot"),
    ("nextjs", Source::Body, "", r"__next_data__"),
    ("nuxt", Source::Body, "", r"window\.__nuxt"),
    ("jquery", Source::Body, "", r"jquery[.-]?([\d.]*\d)?(?:\.min)?\.js"),
    ("dir-listing", Source::Title, "", r"index of /"),
    ("wordpress", Source::Title, "", r"wordpress"),
    ("grafana", Source::Title, "", r"grafana"),
    ("kibana", Source::Title, "", r"kibana"),
    ("jenkins", Source::Title, "", r"jenkins"),
];

/// Ordered rule set applied to raw responses.
#[derive(Debug, Clone)]
pub struct FingerEngine {
    rules: Vec<FingerRule>,
}

impl Default for FingerEngine {
    fn default() -> Self { Self::builtin() }
}

impl FingerEngine {
    pub fn new(rules: Vec<FingerRule>) -> Self { FingerEngine { rules } }

    /// Common servers, languages, CMSes and JS frameworks.
    pub fn builtin() -> Self {
        let rules = BUILTIN
            .iter()
            .filter_map(|(name, source, header, pattern)| match source {
                Source::Header => FingerRule::header(name, header, pattern).ok(),
                Source::Body => FingerRule::body(name, pattern).ok(),
                Source::Title => FingerRule::title(name, pattern).ok(),
            })
            .collect();
        FingerEngine { rules }
    }

    pub fn push(&mut self, rule: FingerRule) { self.rules.push(rule); }

    pub fn len(&self) -> usize { self.rules.len() }

    pub fn is_empty(&self) -> bool { self.rules.is_empty() }

    /// Runs every rule over `raw` (header block followed by body).
    pub fn detect(&self, raw: &str) -> Frameworks {
        let (head, body) = split_raw(raw);
        let headers: Vec<(String, &str)> = head
            .lines()
            .skip(1)
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim()))
            .collect();
        let title = match_title(body);

        let mut out = Frameworks::new();
        for rule in &self.rules {
            let hit = match rule.source {
                Source::Header => headers
                    .iter()
                    .filter(|(k, _)| Some(k) == rule.header.as_ref())
                    .find_map(|(_, v)| rule.check(v)),
                Source::Body => rule.check(body),
                Source::Title if !title.is_empty() => rule.check(&title),
                Source::Title => None,
            };
            if let Some(fw) = hit {
                out.insert(fw);
            }
        }
        out
    }
}
