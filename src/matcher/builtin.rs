//! Built-in rule sets for the body-pattern detectors.
//!
//! | Set | Used by | Covers |
//! |-----|---------|--------|
//! | [`application_errors`] | `application-error` | ASP.NET, Java, PHP, Python, Ruby, database driver errors |
//! | [`directory_listings`] | `directory-listing` | Apache, nginx, IIS, Tomcat, lighttpd, Python `http.server` |
//!
//! Both lists are ordered: earlier entries take priority when several
//! signatures appear in the same body. Configuration may replace either set.

use super::MatchRule;

/// Application error signatures, most specific first.
pub fn application_errors() -> Vec<MatchRule> {
    vec![
        // === Database drivers ===
        MatchRule::literal("odbc-driver", "Microsoft OLE DB Provider for ODBC Drivers"),
        MatchRule::literal("oledb-sql-server", "Microsoft OLE DB Provider for SQL Server"),
        MatchRule::regex("mssql-syntax", r"(?i)Line\s\d+:\sIncorrect\ssyntax\snear\s'[^']*'"),
        MatchRule::regex("mysql-syntax", r"You have an error in your SQL syntax[^<\n]*"),
        MatchRule::literal("mysql-fetch", "supplied argument is not a valid MySQL result resource"),
        MatchRule::regex("postgres-error", r"PostgreSQL query failed:[^<\n]*"),
        MatchRule::regex("oracle-error", r"ORA-\d{5}:[^<\n]*"),
        MatchRule::literal("sqlite-error", "SQLite/JDBCDriver"),
        // === ASP.NET ===
        MatchRule::literal("aspnet-server-error", "Server Error in '/' Application"),
        MatchRule::literal(
            "aspnet-unhandled",
            "An unhandled exception occurred during the execution of the",
        ),
        MatchRule::literal("aspnet-yellow-screen", "[HttpException (0x80004005)"),
        // === Java ===
        MatchRule::regex("java-stack-trace", r"at [a-zA-Z0-9_.$]+\([A-Za-z0-9_]+\.java:\d+\)"),
        MatchRule::literal("java-servlet-exception", "javax.servlet.ServletException"),
        MatchRule::literal("tomcat-exception-report", "The server encountered an internal error"),
        // === PHP ===
        MatchRule::regex("php-fatal", r"<b>(?:Fatal error|Parse error|Warning)</b>:[^<]*"),
        MatchRule::regex("php-include", r"failed to open stream: [^<\n]*"),
        // === Python / Ruby ===
        MatchRule::literal("python-traceback", "Traceback (most recent call last):"),
        MatchRule::literal(
            "django-debug",
            "You're seeing this error because you have <code>DEBUG = True</code>",
        ),
        MatchRule::literal("rails-exception", "ActionController::RoutingError"),
        // === Generic ===
        MatchRule::literal("generic-internal-error", "Internal Server Error"),
    ]
}

/// Directory listing signatures.
pub fn directory_listings() -> Vec<MatchRule> {
    vec![
        // Apache / nginx / lighttpd autoindex
        MatchRule::regex("autoindex-title", r"<title>Index of /[^<]*</title>"),
        MatchRule::regex("autoindex-heading", r"<h1>Index of /[^<]*</h1>"),
        // IIS
        MatchRule::literal("iis-parent", "[To Parent Directory]"),
        MatchRule::regex("iis-title", r"<title>[^<]* - /[^<]*</title>\s*</head>\s*<body><H1>"),
        // Tomcat
        MatchRule::regex("tomcat-listing", r"<title>Directory Listing For [^<]*</title>"),
        // Python http.server
        MatchRule::regex("python-listing", r"<title>Directory listing for /[^<]*</title>"),
        MatchRule::literal("parent-directory-link", ">Parent Directory</a>"),
    ]
}
