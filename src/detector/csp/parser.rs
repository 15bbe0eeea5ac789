//! Content-Security-Policy header parser.
//!
//! Parsing never fails: problems are reported as [`Notice`]s positioned by
//! `line:column` (1-based, relative to the header value) and the offending
//! directive or token is dropped or kept as the browser would.

use std::fmt;

/// How serious a parse notice is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Error,
    Warning,
    Info,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub severity: Severity,
    pub line: usize,
    pub column: usize,
    pub message: String,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}", self.line, self.column, self.message)
    }
}

/// A recognised directive. `name` is lower-case; values keep their case.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive {
    pub name: String,
    pub values: Vec<String>,
    pub line: usize,
    pub column: usize,
}

impl Directive {
    /// Whether any value equals `source`, ignoring ASCII case.
    pub fn has(&self, source: &str) -> bool {
        self.values.iter().any(|v| v.eq_ignore_ascii_case(source))
    }
}

/// Parsed policy: recognised directives in header order, first occurrence
/// of each name only.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Policy {
    directives: Vec<Directive>,
}

impl Policy {
    pub fn get(&self, name: &str) -> Option<&Directive> {
        self.directives.iter().find(|d| d.name == name)
    }

    pub fn directives(&self) -> &[Directive] {
        &self.directives
    }

    /// The directive that governs `name` once fallbacks are applied.
    pub fn resolve(&self, name: &str) -> Option<&Directive> {
        fallback_chain(name).iter().find_map(|n| self.get(n))
    }
}

/// Lookup order for a directive, itself first.
pub fn fallback_chain(name: &str) -> &'static [&'static str] {
    match name {
        "script-src" => &["script-src", "default-src"],
        "style-src" => &["style-src", "default-src"],
        "frame-src" => &["frame-src", "child-src", "default-src"],
        "worker-src" => &["worker-src", "child-src", "script-src", "default-src"],
        "frame-ancestors" => &["frame-ancestors"],
        "form-action" => &["form-action"],
        "img-src" => &["img-src", "default-src"],
        "connect-src" => &["connect-src", "default-src"],
        "font-src" => &["font-src", "default-src"],
        "media-src" => &["media-src", "default-src"],
        "object-src" => &["object-src", "default-src"],
        "manifest-src" => &["manifest-src", "default-src"],
        "prefetch-src" => &["prefetch-src", "default-src"],
        "child-src" => &["child-src", "default-src"],
        _ => &[],
    }
}

const SOURCE_LIST_DIRECTIVES: &[&str] = &[
    "default-src",
    "script-src",
    "script-src-elem",
    "script-src-attr",
    "style-src",
    "style-src-elem",
    "style-src-attr",
    "img-src",
    "connect-src",
    "font-src",
    "object-src",
    "media-src",
    "frame-src",
    "child-src",
    "worker-src",
    "manifest-src",
    "prefetch-src",
    "fenced-frame-src",
    "base-uri",
    "form-action",
    "frame-ancestors",
    "navigate-to",
];

const OTHER_DIRECTIVES: &[&str] = &[
    "sandbox",
    "report-uri",
    "report-to",
    "upgrade-insecure-requests",
    "block-all-mixed-content",
    "require-trusted-types-for",
    "trusted-types",
    "require-sri-for",
    "plugin-types",
    "webrtc",
];

const FLAG_DIRECTIVES: &[&str] = &["upgrade-insecure-requests", "block-all-mixed-content"];

const KEYWORDS: &[&str] = &[
    "self",
    "none",
    "unsafe-inline",
    "unsafe-eval",
    "unsafe-hashes",
    "strict-dynamic",
    "report-sample",
    "unsafe-allow-redirects",
    "wasm-unsafe-eval",
    "inline-speculation-rules",
];

const SANDBOX_TOKENS: &[&str] = &[
    "allow-downloads",
    "allow-forms",
    "allow-modals",
    "allow-orientation-lock",
    "allow-pointer-lock",
    "allow-popups",
    "allow-popups-to-escape-sandbox",
    "allow-presentation",
    "allow-same-origin",
    "allow-scripts",
    "allow-storage-access-by-user-activation",
    "allow-top-navigation",
    "allow-top-navigation-by-user-activation",
    "allow-top-navigation-to-custom-protocols",
];

/// Parse `text` into a policy and the notices raised along the way.
pub fn parse(text: &str) -> (Policy, Vec<Notice>) {
    let mut parser = Parser {
        text,
        notices: Vec::new(),
    };
    let policy = parser.run();
    (policy, parser.notices)
}

struct Parser<'a> {
    text: &'a str,
    notices: Vec<Notice>,
}

impl<'a> Parser<'a> {
    fn run(&mut self) -> Policy {
        self.check_characters();

        let mut policy = Policy::default();
        let mut start = 0;
        for segment in self.text.split(';') {
            let tokens = tokens(segment, start);
            start += segment.len() + 1;

            let Some(((name_at, raw_name), values)) = tokens.split_first() else {
                continue;
            };
            let name = raw_name.to_ascii_lowercase();
            if !is_known_directive(&name) {
                self.notice(
                    Severity::Warning,
                    *name_at,
                    format!("Unrecognized directive {raw_name}"),
                );
                continue;
            }
            if policy.get(&name).is_some() {
                self.notice(
                    Severity::Warning,
                    *name_at,
                    format!("Duplicate directive {name}; this occurrence is ignored"),
                );
                continue;
            }

            self.check_values(&name, values);
            let (line, column) = position(self.text, *name_at);
            policy.directives.push(Directive {
                name,
                values: values.iter().map(|(_, v)| v.to_string()).collect(),
                line,
                column,
            });
        }
        policy
    }

    fn check_characters(&mut self) {
        let text = self.text;
        for (at, c) in text.char_indices() {
            if !(c.is_ascii_graphic() || c == ' ' || c == '\t') {
                self.notice(
                    Severity::Error,
                    at,
                    format!("Disallowed character {c:?} in policy"),
                );
            }
        }
    }

    fn check_values(&mut self, name: &str, values: &[(usize, &str)]) {
        if FLAG_DIRECTIVES.contains(&name) {
            if let Some((at, _)) = values.first() {
                self.notice(
                    Severity::Error,
                    *at,
                    format!("The {name} directive does not accept a value"),
                );
            }
            return;
        }

        if name == "sandbox" {
            for (at, token) in values {
                if !SANDBOX_TOKENS.iter().any(|t| t.eq_ignore_ascii_case(token)) {
                    self.notice(
                        Severity::Error,
                        *at,
                        format!("Unrecognized sandbox keyword {token}"),
                    );
                }
            }
            return;
        }

        if name == "report-uri" {
            if let Some((at, _)) = values.first() {
                self.notice(
                    Severity::Info,
                    *at,
                    "report-uri is deprecated in favour of the report-to directive".to_string(),
                );
            }
            return;
        }

        if !SOURCE_LIST_DIRECTIVES.contains(&name) {
            return;
        }

        for (at, token) in values {
            self.check_source(*at, token);
        }

        if values.len() > 1 {
            if let Some((at, _)) = values.iter().find(|(_, v)| v.eq_ignore_ascii_case("'none'")) {
                self.notice(
                    Severity::Warning,
                    *at,
                    format!("'none' has no effect in {name} when combined with other sources"),
                );
            }
        }
    }

    fn check_source(&mut self, at: usize, token: &str) {
        if let Some(inner) = token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')) {
            if !is_quoted_source(inner) {
                self.notice(
                    Severity::Error,
                    at,
                    format!("Unrecognized source expression {token}"),
                );
            }
            return;
        }

        if KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(token)) {
            self.notice(
                Severity::Warning,
                at,
                format!(
                    "This host name is unusual, and likely meant to be a keyword that is missing the required quotes: '{token}'."
                ),
            );
            return;
        }

        if token == "*" || is_scheme_source(token) || is_host_source(token) {
            return;
        }
        self.notice(
            Severity::Error,
            at,
            format!("Invalid source expression {token}"),
        );
    }

    fn notice(&mut self, severity: Severity, at: usize, message: String) {
        let (line, column) = position(self.text, at);
        self.notices.push(Notice {
            severity,
            line,
            column,
            message,
        });
    }
}

fn is_known_directive(name: &str) -> bool {
    SOURCE_LIST_DIRECTIVES.contains(&name) || OTHER_DIRECTIVES.contains(&name)
}

/// Whitespace-separated tokens of `segment` with their byte offsets in the
/// full header value.
fn tokens(segment: &str, base: usize) -> Vec<(usize, &str)> {
    let mut out = Vec::new();
    let mut start = None;
    for (i, c) in segment.char_indices() {
        match (c.is_whitespace(), start) {
            (true, Some(s)) => {
                out.push((base + s, &segment[s..i]));
                start = None;
            }
            (false, None) => start = Some(i),
            _ => {}
        }
    }
    if let Some(s) = start {
        out.push((base + s, &segment[s..]));
    }
    out
}

/// 1-based line and column (in characters) of byte offset `at`.
fn position(text: &str, at: usize) -> (usize, usize) {
    let before = &text[..at];
    let line = before.matches('\n').count() + 1;
    let line_start = before.rfind('\n').map_or(0, |i| i + 1);
    let column = before[line_start..].chars().count() + 1;
    (line, column)
}

fn is_quoted_source(inner: &str) -> bool {
    if KEYWORDS.iter().any(|k| k.eq_ignore_ascii_case(inner)) {
        return true;
    }
    let lower = inner.to_ascii_lowercase();
    ["nonce-", "sha256-", "sha384-", "sha512-"]
        .iter()
        .any(|prefix| lower.starts_with(prefix) && lower.len() > prefix.len())
}

fn is_scheme(s: &str) -> bool {
    let mut chars = s.chars();
    chars.next().is_some_and(|c| c.is_ascii_alphabetic())
        && chars.all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '.' | '-'))
}

fn is_scheme_source(token: &str) -> bool {
    token.strip_suffix(':').is_some_and(is_scheme)
}

fn is_host_source(token: &str) -> bool {
    let rest = match token.split_once("://") {
        Some((scheme, rest)) if is_scheme(scheme) => rest,
        Some(_) => return false,
        None => token,
    };

    let (authority, _path) = match rest.find('/') {
        Some(i) => rest.split_at(i),
        None => (rest, ""),
    };
    let (host, port) = match authority.split_once(':') {
        Some((host, port)) => (host, Some(port)),
        None => (authority, None),
    };

    if let Some(port) = port {
        if port != "*" && (port.is_empty() || !port.bytes().all(|b| b.is_ascii_digit())) {
            return false;
        }
    }

    if host == "*" {
        return true;
    }
    let host = host.strip_prefix("*.").unwrap_or(host);
    !host.is_empty()
        && host.split('.').all(|label| {
            !label.is_empty() && label.bytes().all(|b| b.is_ascii_alphanumeric() || b == b'-')
        })
}
