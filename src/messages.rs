//! Read-only message table for human-readable alert text.
//!
//! Detectors look up names, descriptions and solutions by key instead of
//! hard-coding them, so a deployment can override wording (or translate it)
//! from the `[messages]` configuration section. Unknown keys resolve to the
//! key itself so a missing entry is visible rather than silently empty.

use std::collections::HashMap;

/// Key/value message catalog with positional `{0}`, `{1}`... placeholders.
#[derive(Debug, Clone)]
pub struct Messages {
    entries: HashMap<String, String>,
}

impl Messages {
    /// Catalog with the built-in English messages.
    pub fn new() -> Self {
        let entries = DEFAULTS
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Self { entries }
    }

    /// Built-in catalog with `overrides` replacing or adding entries.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> Self {
        let mut messages = Self::new();
        for (key, value) in overrides {
            messages.entries.insert(key.clone(), value.clone());
        }
        messages
    }

    pub fn get<'a>(&'a self, key: &'a str) -> &'a str {
        self.entries.get(key).map(String::as_str).unwrap_or(key)
    }

    /// Look up `key` and substitute `{n}` with `args[n]`.
    ///
    /// Substituted text is never scanned again. Placeholders without a
    /// matching argument are kept as written.
    pub fn format(&self, key: &str, args: &[&str]) -> String {
        let template = self.get(key);
        let mut text = String::with_capacity(template.len());
        let mut rest = template;
        while let Some(open) = rest.find('{') {
            text.push_str(&rest[..open]);
            let after = &rest[open + 1..];
            let arg = after.find('}').and_then(|close| {
                let index: usize = after[..close].parse().ok()?;
                Some((*args.get(index)?, close))
            });
            match arg {
                Some((value, close)) => {
                    text.push_str(value);
                    rest = &after[close + 1..];
                }
                None => {
                    text.push('{');
                    rest = after;
                }
            }
        }
        text.push_str(rest);
        text
    }
}

impl Default for Messages {
    fn default() -> Self {
        Self::new()
    }
}

const DEFAULTS: &[(&str, &str)] = &[
    // content-type-missing
    ("content_type.name", "Content-Type Header Missing"),
    ("content_type.name.empty", "Content-Type Header Empty"),
    ("content_type.desc", "The Content-Type header was either missing or empty."),
    ("content_type.soln", "Ensure each page is setting the specific and appropriate content-type value for the content being delivered."),
    // cors-wildcard
    ("cors.name", "Cross-Domain Misconfiguration"),
    ("cors.desc", "Web browser data loading may be possible, due to a Cross Origin Resource Sharing (CORS) misconfiguration on the web server."),
    ("cors.otherinfo", "The CORS misconfiguration on the web server permits cross-domain read requests from arbitrary third party domains, using unauthenticated APIs on this domain."),
    ("cors.soln", "Ensure that sensitive data is not available in an unauthenticated manner. Configure the Access-Control-Allow-Origin HTTP header to a more restrictive set of domains, or remove all CORS headers entirely."),
    // x-powered-by
    ("x_powered_by.name", "Server Leaks Information via \"X-Powered-By\" HTTP Response Header Field(s)"),
    ("x_powered_by.desc", "The web/application server is leaking information via one or more \"X-Powered-By\" HTTP response headers."),
    ("x_powered_by.soln", "Ensure that your web server, application server, load balancer, etc. is configured to suppress \"X-Powered-By\" headers."),
    // x-aspnet-version
    ("x_aspnet_version.name", "X-AspNet-Version Response Header"),
    ("x_aspnet_version.desc", "Server leaks information via \"X-AspNet-Version\"/\"X-AspNetMvc-Version\" HTTP response header field(s)."),
    ("x_aspnet_version.soln", "Configure the server so it will not return those headers."),
    // x-debug-token
    ("x_debug_token.name", "X-Debug-Token Information Leak"),
    ("x_debug_token.desc", "The response contained an X-Debug-Token or X-Debug-Token-Link header. This indicates that Symfony's Profiler may be in use and exposing sensitive data."),
    ("x_debug_token.soln", "Limit access to Symfony's Profiler, either via authentication/authorization or limiting inclusion of the header to specific clients."),
    // server-version
    ("server_version.name", "Server Leaks Version Information via \"Server\" HTTP Response Header Field"),
    ("server_version.desc", "The web/application server is leaking version information via the \"Server\" HTTP response header."),
    ("server_version.soln", "Ensure that your web server, application server, load balancer, etc. is configured to suppress the \"Server\" header or provide generic details."),
    // application-error
    ("application_error.name", "Application Error Disclosure"),
    ("application_error.desc", "This page contains an error/warning message that may disclose sensitive information like the location of the file that produced the unhandled exception."),
    ("application_error.otherinfo", "Matched signature: {0}"),
    ("application_error.soln", "Review the source code of this page. Implement custom error pages."),
    // directory-listing
    ("directory_listing.name", "Directory Browsing"),
    ("directory_listing.desc", "It is possible to view the directory listing. Directory listing may reveal hidden scripts, include files, backup source files, etc."),
    ("directory_listing.otherinfo", "Matched signature: {0}"),
    ("directory_listing.soln", "Disable directory browsing. If this is required, make sure the listed files does not induce risks."),
    // cookie scope
    ("cookie_scope.name", "Loosely Scoped Cookie"),
    ("cookie_scope.desc", "Cookies can be scoped by domain or path. A cookie scoped to a parent domain is sent to every subdomain of that domain, including ones that may be less trusted."),
    ("cookie_scope.otherinfo", "The origin domain used for comparison was:\n{0}\n{1}"),
    ("cookie_scope.soln", "Always scope cookies to a FQDN (Fully Qualified Domain Name)."),
    // csp
    ("csp.name", "CSP"),
    ("csp.desc", "Content Security Policy (CSP) is an added layer of security that helps to detect and mitigate certain types of attacks."),
    ("csp.soln", "Ensure that your web server, application server, load balancer, etc. is properly configured to set the Content-Security-Policy header."),
    ("csp.notices.name", "Notices"),
    ("csp.notices.errors", "Errors:"),
    ("csp.notices.warnings", "Warnings:"),
    ("csp.notices.infoitems", "Info Items:"),
    ("csp.wildcard.name", "Wildcard Directive"),
    ("csp.wildcard.desc", "The following directives either allow wildcard sources (or ancestors), are not defined, or are overly broadly defined: \n{0}"),
    ("csp.wildcard.extended", "\n\nThe directive(s): {0} are among the directives that do not fallback to default-src, missing/excluding them is the same as allowing anything."),
    ("csp.scriptsrc.unsafe.name", "script-src unsafe-inline"),
    ("csp.scriptsrc.unsafe.desc", "script-src includes unsafe-inline."),
    ("csp.stylesrc.unsafe.name", "style-src unsafe-inline"),
    ("csp.stylesrc.unsafe.desc", "style-src includes unsafe-inline."),
    ("csp.scriptsrc.hashes.name", "script-src unsafe-hashes"),
    ("csp.scriptsrc.hashes.desc", "script-src includes unsafe-hashes, which allows hashed inline event handlers and style attributes to run."),
    ("csp.stylesrc.hashes.name", "style-src unsafe-hashes"),
    ("csp.stylesrc.hashes.desc", "style-src includes unsafe-hashes, which allows hashed inline style attributes to be applied."),
    ("csp.malformed.name", "Malformed Policy (Non-ASCII)"),
    ("csp.malformed.otherinfo", "A non-ASCII character was encountered while attempting to parse the policy, thus rendering it invalid (no further evaluation occurred). The following invalid characters were collected: {0}"),
    ("csp.xcsp.name", "X-Content-Security-Policy"),
    ("csp.xcsp.desc", "The response contained the deprecated X-Content-Security-Policy header. The standard Content-Security-Policy header should be used instead."),
    ("csp.xwkcsp.name", "X-WebKit-CSP"),
    ("csp.xwkcsp.desc", "The response contained the deprecated X-WebKit-CSP header. The standard Content-Security-Policy header should be used instead."),
    // outdated software
    ("outdated.name", "Outdated Software Version"),
    ("outdated.desc", "The response advertises a software version that is older than the latest known release."),
    ("outdated.otherinfo", "Detected {0} version {1}; latest known version is {2}."),
    ("outdated.soln", "Upgrade to the latest release of the software."),
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_present() {
        let messages = Messages::new();
        assert_eq!(messages.get("cors.name"), "Cross-Domain Misconfiguration");
    }

    #[test]
    fn unknown_key_resolves_to_itself() {
        let messages = Messages::new();
        assert_eq!(messages.get("no.such.key"), "no.such.key");
    }

    #[test]
    fn format_substitutes_positional_args() {
        let messages = Messages::new();
        let text = messages.format("outdated.otherinfo", &["Apache", "2.2.1", "2.4.62"]);
        assert_eq!(
            text,
            "Detected Apache version 2.2.1; latest known version is 2.4.62."
        );
    }

    #[test]
    fn substituted_text_is_not_expanded_again() {
        let messages = Messages::new();
        let text = messages.format("outdated.otherinfo", &["{1}{2}", "2.2.1", "2.4.62"]);
        assert_eq!(
            text,
            "Detected {1}{2} version 2.2.1; latest known version is 2.4.62."
        );
    }

    #[test]
    fn placeholders_without_args_are_kept() {
        let mut overrides = HashMap::new();
        overrides.insert("t".to_string(), "{0} {5} {x} {".to_string());
        let messages = Messages::with_overrides(&overrides);
        assert_eq!(messages.format("t", &["a"]), "a {5} {x} {");
    }

    #[test]
    fn overrides_replace_defaults() {
        let mut overrides = HashMap::new();
        overrides.insert("cors.name".to_string(), "CORS zu offen".to_string());
        let messages = Messages::with_overrides(&overrides);
        assert_eq!(messages.get("cors.name"), "CORS zu offen");
        assert_eq!(messages.get("csp.name"), "CSP");
    }
}
