//! Server-rendered page shown when a brokered login fails.

use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use domain::error::Error;

const STYLES: &str = r#"
body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: #f4f5f7;
    color: #1f2329;
    display: flex;
    justify-content: center;
    align-items: center;
    min-height: 100vh;
    margin: 0;
}

.card {
    background: #ffffff;
    border-radius: 8px;
    box-shadow: 0 2px 8px rgba(0, 0, 0, 0.08);
    max-width: 420px;
    padding: 2rem;
    text-align: center;
}

.error-title {
    font-size: 1.25rem;
    font-weight: 600;
    margin-bottom: 0.75rem;
}

.error-code {
    color: #8f959e;
    font-family: monospace;
    font-size: 0.75rem;
    margin-top: 1rem;
}
"#;

/// Renders the failure page for a login. Always `502 Bad Gateway`.
pub(crate) fn render(err: &Error) -> Response {
    (
        StatusCode::BAD_GATEWAY,
        Html(render_page(&err.user_message(), err.reason())),
    )
        .into_response()
}

fn render_page(message: &str, reason: &str) -> String {
    let mut html = String::with_capacity(2048);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("<meta charset=\"utf-8\">\n<title>Login failed</title>\n<style>");
    html.push_str(STYLES);
    html.push_str("</style>\n</head>\n<body>\n<div class=\"card\">\n");
    html.push_str("<div class=\"error-title\">Login failed</div>\n");
    html.push_str("<div class=\"error-description\">");
    html.push_str(&html_escape(message));
    html.push_str("</div>\n<div class=\"error-code\">");
    html.push_str(&html_escape(reason));
    html.push_str("</div>\n</div>\n</body>\n</html>\n");
    html
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}
