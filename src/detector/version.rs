//! Software version recency scoring.
//!
//! Two version encodings are in use: semantic `MAJOR.MINOR[.PATCH]` and
//! date stamps written `D-YYYY-MM-DD`. Dated versions are scored by their
//! age relative to [`ScanContext::today`], semantic ones by their distance
//! from the latest known release.

use chrono::{Datelike, NaiveDate};

use crate::alert::{Confidence, Risk};
use crate::exchange::Exchange;

use super::{DetectorResult, ScanContext};

pub const RULE_ID: u32 = 10116;

const PRODUCT_HEADERS: &[&str] = &["Server", "X-Powered-By"];

/// A parsed version string.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionSpec {
    Semantic { major: u32, minor: u32, patch: u32 },
    Dated(NaiveDate),
    Unparseable,
}

impl VersionSpec {
    /// Parse `D-YYYY-MM-DD` or `MAJOR.MINOR[.PATCH]`. The `D-` prefix is
    /// case-sensitive; anything else is [`VersionSpec::Unparseable`].
    pub fn parse(version: &str) -> Self {
        if let Some(date) = version.strip_prefix("D-") {
            return parse_date(date).map_or(Self::Unparseable, Self::Dated);
        }

        let parts: Vec<&str> = version.split('.').collect();
        if !(2..=3).contains(&parts.len()) {
            return Self::Unparseable;
        }
        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Self::Unparseable;
            }
            match part.parse() {
                Ok(n) => *slot = n,
                Err(_) => return Self::Unparseable,
            }
        }
        let [major, minor, patch] = numbers;
        Self::Semantic {
            major,
            minor,
            patch,
        }
    }
}

fn parse_date(text: &str) -> Option<NaiveDate> {
    let b = text.as_bytes();
    let shaped = b.len() == 10
        && b[4] == b'-'
        && b[7] == b'-'
        && b
            .iter()
            .enumerate()
            .all(|(i, c)| i == 4 || i == 7 || c.is_ascii_digit());
    if !shaped {
        return None;
    }
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// Whole calendar months from `from` to `to`; negative when `from` is later.
fn whole_months(from: NaiveDate, to: NaiveDate) -> i32 {
    let mut months = (to.year() - from.year()) * 12 + to.month() as i32 - from.month() as i32;
    if months > 0 && to.day() < from.day() {
        months -= 1;
    }
    months
}

/// Risk tier of a dated version, or `None` when `version` is not a
/// well-formed `D-YYYY-MM-DD` stamp.
///
/// Future dates are [`Risk::Info`]. Up to two whole months old is
/// [`Risk::Low`], up to thirteen is [`Risk::Medium`], anything older
/// [`Risk::High`].
pub fn date_risk(version: Option<&str>, today: NaiveDate) -> Option<Risk> {
    let VersionSpec::Dated(date) = VersionSpec::parse(version?) else {
        return None;
    };
    if date > today {
        return Some(Risk::Info);
    }
    Some(match whole_months(date, today) {
        i32::MIN..=2 => Risk::Low,
        3..=13 => Risk::Medium,
        _ => Risk::High,
    })
}

/// Risk tier of `current` against `latest`.
///
/// At or ahead of `latest` is [`Risk::Info`]. One minor release behind is
/// [`Risk::Low`]; two to four minors, or one major, is [`Risk::Medium`];
/// further behind, or unparseable on either side, is [`Risk::High`].
pub fn version_risk(current: &str, latest: &str) -> Risk {
    let (
        VersionSpec::Semantic {
            major: cur_major,
            minor: cur_minor,
            ..
        },
        VersionSpec::Semantic {
            major: new_major,
            minor: new_minor,
            ..
        },
    ) = (VersionSpec::parse(current), VersionSpec::parse(latest))
    else {
        return Risk::High;
    };

    if (cur_major, cur_minor) >= (new_major, new_minor) {
        return Risk::Info;
    }
    if cur_major == new_major {
        return match new_minor - cur_minor {
            1 => Risk::Low,
            2..=4 => Risk::Medium,
            _ => Risk::High,
        };
    }
    if new_major - cur_major == 1 {
        Risk::Medium
    } else {
        Risk::High
    }
}

/// Risk tier of a major-only token such as `Apache/2` against `latest`.
///
/// Only the majors can be compared, so a matching major is not reported.
/// `None` when either side does not parse.
fn major_only_risk(current: &str, latest: &str) -> Option<Risk> {
    let current: u32 = current.parse().ok()?;
    let VersionSpec::Semantic { major: latest, .. } = VersionSpec::parse(latest) else {
        return None;
    };
    Some(match latest.checked_sub(current) {
        None | Some(0) => Risk::Info,
        Some(1) => Risk::Medium,
        Some(_) => Risk::High,
    })
}

/// Leading `digits[.digits]*` run of a header version token, so
/// `8.1.2-1ubuntu2` scores as `8.1.2`.
fn numeric_prefix(raw: &str) -> &str {
    let end = raw
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(raw.len());
    raw[..end].trim_end_matches('.')
}

/// Outdated `product/version` tokens in `Server` and `X-Powered-By`, for
/// products listed in the latest-version table.
pub fn detect(exchange: &Exchange, ctx: &ScanContext) -> DetectorResult {
    if ctx.latest_versions.is_empty() {
        return Ok(Vec::new());
    }

    let mut alerts = Vec::new();
    for header in exchange.response_headers().iter() {
        if !PRODUCT_HEADERS
            .iter()
            .any(|n| header.name.eq_ignore_ascii_case(n))
        {
            continue;
        }
        for token in header.value.split_whitespace() {
            let Some((product, raw_version)) = token.split_once('/') else {
                continue;
            };
            let Some(latest) = ctx.latest_versions.get(&product.to_ascii_lowercase()) else {
                continue;
            };

            let (current, risk) = if latest.starts_with("D-") {
                match date_risk(Some(raw_version), ctx.today) {
                    Some(risk) => (raw_version, risk),
                    None => continue,
                }
            } else {
                let current = numeric_prefix(raw_version);
                if current.is_empty() {
                    continue;
                }
                if current.contains('.') {
                    (current, version_risk(current, latest))
                } else {
                    match major_only_risk(current, latest) {
                        Some(risk) => (current, risk),
                        None => continue,
                    }
                }
            };
            if risk == Risk::Info {
                continue;
            }

            alerts.push(
                ctx.alert(RULE_ID, "outdated", exchange)
                    .risk(risk)
                    .confidence(Confidence::Medium)
                    .evidence(token)
                    .other_info(
                        ctx.messages
                            .format("outdated.otherinfo", &[product, current, latest.as_str()]),
                    )
                    .param(header.name.clone())
                    .cwe(1104)
                    .wasc(45)
                    .build(),
            );
        }
    }
    Ok(alerts)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detector::testutil::context;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 10).unwrap()
    }

    #[test]
    fn parses_both_encodings() {
        assert_eq!(
            VersionSpec::parse("2.16.0"),
            VersionSpec::Semantic {
                major: 2,
                minor: 16,
                patch: 0
            }
        );
        assert_eq!(
            VersionSpec::parse("D-2025-07-06"),
            VersionSpec::Dated(NaiveDate::from_ymd_opt(2025, 7, 6).unwrap())
        );
        assert_eq!(
            VersionSpec::parse("1.2"),
            VersionSpec::Semantic {
                major: 1,
                minor: 2,
                patch: 0
            }
        );
    }

    #[test]
    fn malformed_versions_are_unparseable() {
        for bad in [
            "",
            "2",
            "2.x.0",
            "1.2.3.4",
            "d-2025-07-06",
            "D-2025-7-6",
            "D-2025-13-01",
            "v1.2",
        ] {
            assert_eq!(VersionSpec::parse(bad), VersionSpec::Unparseable, "{bad}");
        }
    }

    #[test]
    fn date_risk_fixtures() {
        assert_eq!(date_risk(Some("2020-01-01"), today()), None);
        assert_eq!(date_risk(Some("D-2030-03-29"), today()), Some(Risk::Info));
        assert_eq!(date_risk(Some("D-2025-07-06"), today()), Some(Risk::Low));
        assert_eq!(date_risk(Some("D-2010-09-01"), today()), Some(Risk::High));
    }

    #[test]
    fn date_risk_unknown_inputs() {
        assert_eq!(date_risk(None, today()), None);
        assert_eq!(date_risk(Some("d-2025-07-06"), today()), None);
        assert_eq!(date_risk(Some("D-2025-02-30"), today()), None);
    }

    #[test]
    fn date_risk_tier_boundaries() {
        assert_eq!(date_risk(Some("D-2025-07-10"), today()), Some(Risk::Low));
        assert_eq!(date_risk(Some("D-2025-05-10"), today()), Some(Risk::Low));
        assert_eq!(date_risk(Some("D-2025-04-11"), today()), Some(Risk::Low));
        assert_eq!(date_risk(Some("D-2025-04-10"), today()), Some(Risk::Medium));
        assert_eq!(date_risk(Some("D-2024-06-10"), today()), Some(Risk::Medium));
        assert_eq!(date_risk(Some("D-2024-06-11"), today()), Some(Risk::Medium));
        assert_eq!(date_risk(Some("D-2024-05-10"), today()), Some(Risk::High));
    }

    #[test]
    fn version_risk_fixtures() {
        assert_eq!(version_risk("2.18.1", "2.16.0"), Risk::Info);
        assert_eq!(version_risk("2.15.0", "2.16.0"), Risk::Low);
        assert_eq!(version_risk("2.14.1", "2.16.0"), Risk::Medium);
        assert_eq!(version_risk("2.8.0", "2.16.0"), Risk::High);
    }

    #[test]
    fn version_risk_majors_and_garbage() {
        assert_eq!(version_risk("2.16.0", "2.16.0"), Risk::Info);
        assert_eq!(version_risk("2.16.0", "2.16.9"), Risk::Info);
        assert_eq!(version_risk("1.99.0", "2.0.0"), Risk::Medium);
        assert_eq!(version_risk("0.9.0", "2.0.0"), Risk::High);
        assert_eq!(version_risk("3.0.0", "2.16.0"), Risk::Info);
        assert_eq!(version_risk("banana", "2.16.0"), Risk::High);
        assert_eq!(version_risk("2.16.0", ""), Risk::High);
    }

    #[test]
    fn detects_outdated_server() {
        let ctx = context().with_latest_version("Apache", "2.4.62");
        let ex = Exchange::new("GET", "https://example.com/")
            .with_response_header("Server", "Apache/2.2.15 (CentOS)")
            .with_response_header("X-Powered-By", "PHP/8.1.2-1ubuntu2.14");
        let alerts = detect(&ex, &ctx).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].evidence, "Apache/2.2.15");
        assert_eq!(alerts[0].risk, Risk::Medium);
        assert_eq!(alerts[0].param, "Server");
        assert_eq!(
            alerts[0].other_info,
            "Detected Apache version 2.2.15; latest known version is 2.4.62."
        );
    }

    #[test]
    fn numeric_prefix_strips_distro_suffix() {
        let ctx = context().with_latest_version("php", "8.3.0");
        let ex = Exchange::new("GET", "https://example.com/")
            .with_response_header("X-Powered-By", "PHP/8.1.2-1ubuntu2.14");
        let alerts = detect(&ex, &ctx).unwrap();
        assert_eq!(alerts[0].risk, Risk::Medium);
        assert!(alerts[0].other_info.contains("version 8.1.2;"));
    }

    #[test]
    fn current_release_is_not_reported() {
        let ctx = context().with_latest_version("nginx", "1.27.0");
        let ex = Exchange::new("GET", "https://example.com/")
            .with_response_header("Server", "nginx/1.27.0");
        assert!(detect(&ex, &ctx).unwrap().is_empty());
    }

    #[test]
    fn dated_products_score_by_age() {
        let ctx = context().with_latest_version("firmware", "D-2025-06-01");
        let ex = Exchange::new("GET", "https://example.com/")
            .with_response_header("Server", "firmware/D-2023-01-15")
            .with_response_header("Server", "firmware/2023");
        let alerts = detect(&ex, &ctx).unwrap();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].risk, Risk::High);
    }

    #[test]
    fn tokens_without_a_version_are_skipped() {
        let ctx = context().with_latest_version("Apache", "2.4.62");
        for server in ["Apache/", "Apache/unknown", "Apache/.", "Apache/2"] {
            let ex =
                Exchange::new("GET", "https://example.com/").with_response_header("Server", server);
            assert!(detect(&ex, &ctx).unwrap().is_empty(), "{server}");
        }
    }

    #[test]
    fn major_only_tokens_compare_majors() {
        let ctx = context().with_latest_version("Apache", "2.4.62");
        let ex = Exchange::new("GET", "https://example.com/")
            .with_response_header("Server", "Apache/1")
            .with_response_header("X-Powered-By", "Apache/0");
        let alerts = detect(&ex, &ctx).unwrap();
        let risks: Vec<Risk> = alerts.iter().map(|a| a.risk).collect();
        assert_eq!(risks, vec![Risk::Medium, Risk::High]);
        assert_eq!(
            alerts[0].other_info,
            "Detected Apache version 1; latest known version is 2.4.62."
        );
    }

    #[test]
    fn empty_table_is_no_finding() {
        let ex = Exchange::new("GET", "https://example.com/")
            .with_response_header("Server", "Apache/1.3.0");
        assert!(detect(&ex, &context()).unwrap().is_empty());
    }
}
