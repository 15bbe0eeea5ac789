use chrono::NaiveDate;

use headerguard::alert::{Alert, Risk};
use headerguard::detector::{Registry, ScanContext};
use headerguard::engine::Engine;
use headerguard::exchange::{self, Exchange};
use headerguard::sink::{AlertSink, JsonLinesSink, MemorySink};

fn engine() -> Engine {
    let ctx = ScanContext::new()
        .unwrap()
        .with_today(NaiveDate::from_ymd_opt(2025, 7, 10).unwrap())
        .with_latest_version("Apache", "2.4.62");
    Engine::with_parts(Registry::builtin(), ctx)
}

fn rule_ids(alerts: &[Alert]) -> Vec<u32> {
    alerts.iter().map(|a| a.rule_id).collect()
}

const CAPTURE: &str = r#"[
  {
    "request": {"method": "GET", "uri": "https://shop.example.com/account"},
    "request_headers": [{"name": "Host", "value": "shop.example.com"}],
    "status": 200,
    "response_headers": [
      {"name": "Content-Type", "value": "text/html; charset=UTF-8"},
      {"name": "Server", "value": "Apache/2.2.15 (CentOS)"},
      {"name": "X-Powered-By", "value": "PHP/5.4.16"},
      {"name": "Set-Cookie", "value": "session=abc; Domain=example.com; Path=/; HttpOnly"},
      {"name": "Content-Security-Policy", "value": "default-src *; image-src 'self'; frame-ancestors 'self'; form-action 'self'; script-src 'self'; style-src 'self'"}
    ],
    "body": "<html><body>Welcome</body></html>"
  },
  {
    "request": {"method": "GET", "uri": "https://static.example.com/files/"},
    "status": 200,
    "response_headers": [
      {"name": "Content-Type", "value": "text/html"},
      {"name": "Access-Control-Allow-Origin", "value": "*"}
    ],
    "body": "<html><head><title>Index of /files</title></head></html>"
  },
  {
    "request": {"method": "GET", "uri": "https://api.example.com/v1/orders"},
    "status": 500,
    "response_headers": [
      {"name": "Content-Type", "value": "application/json"}
    ],
    "body": "{\"error\": \"internal\"}"
  }
]"#;

#[test]
fn scans_a_json_capture_end_to_end() {
    let exchanges = exchange::from_json(CAPTURE).unwrap();
    assert_eq!(exchanges.len(), 3);

    let reports = engine().scan_batch(&exchanges);
    assert!(reports.iter().all(|r| r.failures.is_empty()));

    let shop = rule_ids(&reports[0].alerts);
    for expected in [10036, 10037, 90033, 10055, 10116] {
        assert!(shop.contains(&expected), "missing {expected} in {shop:?}");
    }
    let csp: Vec<&Alert> = reports[0].alerts.iter().filter(|a| a.rule_id == 10055).collect();
    assert_eq!(csp.len(), 2);
    assert_eq!(csp[0].risk, Risk::Low);
    assert_eq!(csp[1].risk, Risk::Medium);

    let listing = rule_ids(&reports[1].alerts);
    assert!(listing.contains(&10033));
    assert!(listing.contains(&10098));

    let api = &reports[2].alerts;
    assert_eq!(rule_ids(api), vec![90022]);
    assert_eq!(api[0].risk, Risk::Low);
    assert_eq!(api[0].evidence, "HTTP/1.1 500");
}

#[test]
fn alerts_carry_the_request_uri() {
    let exchanges = exchange::from_json(CAPTURE).unwrap();
    let engine = engine();
    for ex in &exchanges {
        for alert in engine.scan(ex).alerts {
            assert_eq!(alert.uri, ex.request.uri);
        }
    }
}

#[test]
fn leak_headers_collapse_into_one_alert() {
    let ex = Exchange::new("GET", "https://www.example.com/")
        .with_response_header("X-Powered-By", "PHP/8.1")
        .with_response_header("x-powered-by", "Express")
        .with_response_header("X-POWERED-BY", "Servlet/3.0");
    let report = engine().scan(&ex);
    let leaks: Vec<&Alert> = report.alerts.iter().filter(|a| a.rule_id == 10037).collect();
    assert_eq!(leaks.len(), 1);
    assert_eq!(leaks[0].evidence, "X-Powered-By: PHP/8.1");
    assert_eq!(leaks[0].other_info, "x-powered-by: Express\nX-POWERED-BY: Servlet/3.0");
}

#[test]
fn cookie_scope_fixtures() {
    let cases = [
        ("https://test.example.com/", "example.com", true),
        ("https://test.example.com/", "test.example.com", false),
        ("https://TesT.org/", "tEst.org", false),
        ("https://example.com/", "stage.example.com", false),
    ];
    let engine = engine();
    for (uri, domain, loose) in cases {
        let ex = Exchange::new("GET", uri)
            .with_response_header("Set-Cookie", &format!("id=1; domain={domain}"));
        let report = engine.scan(&ex);
        assert_eq!(
            rule_ids(&report.alerts).contains(&90033),
            loose,
            "{uri} with domain={domain}"
        );
    }

    let ex = Exchange::new("GET", "https://example.com/")
        .with_response_header("Set-Cookie", "id=1; domain=com");
    assert!(engine.scan(&ex).failures.is_empty());
}

#[test]
fn malformed_exchange_does_not_fail_detectors() {
    let ex = Exchange::new("GET", "not a uri")
        .without_response_headers()
        .with_status(0)
        .with_body("Traceback (most recent call last):");
    let report = engine().scan(&ex);
    assert!(report.failures.is_empty());
    assert_eq!(rule_ids(&report.alerts), vec![90022]);
}

#[test]
fn json_lines_sink_receives_all_alerts() {
    let exchanges = exchange::from_json(CAPTURE).unwrap();
    let engine = engine();
    let sink = JsonLinesSink::new(Vec::new());
    let mut total = 0;
    for ex in &exchanges {
        total += engine.scan_into(ex, &sink).unwrap().alerts.len();
    }

    let out = String::from_utf8(sink.into_inner().unwrap()).unwrap();
    let parsed: Vec<Alert> = out
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();
    assert_eq!(parsed.len(), total);
}

#[test]
fn sink_can_be_shared_by_threads() {
    let exchanges = exchange::from_json(CAPTURE).unwrap();
    let engine = engine();
    let sink = MemorySink::new();
    std::thread::scope(|scope| {
        for ex in &exchanges {
            let (engine, sink) = (&engine, &sink);
            scope.spawn(move || engine.scan_into(ex, sink as &dyn AlertSink).unwrap());
        }
    });
    let expected: usize = exchanges.iter().map(|ex| engine.scan(ex).alerts.len()).sum();
    assert_eq!(sink.len(), expected);
}
