//! Server-rendered pages for the landing and home views.

use serde_json::{Map, Value};

const SHARED_STYLES: &str = r#"
* {
    margin: 0;
    padding: 0;
    box-sizing: border-box;
}

body {
    font-family: -apple-system, BlinkMacSystemFont, "Segoe UI", Roboto, sans-serif;
    background: #f4f6fb;
    min-height: 100vh;
    display: flex;
    justify-content: center;
    align-items: center;
    color: #1f2430;
    line-height: 1.5;
}

.card {
    background: #ffffff;
    border: 1px solid #e1e5ee;
    border-radius: 12px;
    padding: 2rem;
    min-width: 360px;
    max-width: 640px;
}

h1 {
    font-size: 1.25rem;
    margin-bottom: 1rem;
}

.btn-clever {
    display: inline-block;
    padding: 0.625rem 1.25rem;
    border-radius: 6px;
    background: #1464ff;
    color: #ffffff;
    font-weight: 600;
    text-decoration: none;
}

table {
    width: 100%;
    border-collapse: collapse;
    margin-top: 1rem;
}

th, td {
    text-align: left;
    padding: 0.375rem 0.5rem;
    border-bottom: 1px solid #e1e5ee;
    font-size: 0.875rem;
}

th {
    color: #6c757d;
    font-weight: 500;
}
"#;

fn html_page(title: &str, content: &str) -> String {
    let mut html = String::with_capacity(content.len() + 1500);
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n");
    html.push_str("    <meta charset=\"UTF-8\">\n");
    html.push_str(
        "    <meta name=\"viewport\" content=\"width=device-width, initial-scale=1.0\">\n",
    );
    html.push_str("    <title>");
    html.push_str(&html_escape(title));
    html.push_str(" - Clever Instant Login</title>\n");
    html.push_str("    <style>");
    html.push_str(SHARED_STYLES);
    html.push_str("</style>\n</head>\n<body>\n");
    html.push_str(content);
    html.push_str("\n</body>\n</html>");
    html
}

/// Renders the landing page with the Clever login link.
pub fn render_index(authorization_url: &str) -> String {
    let mut content = String::with_capacity(512);
    content.push_str("<div class=\"card\">\n");
    content.push_str("<h1>Clever Instant Login</h1>\n");
    content.push_str("<a class=\"btn-clever\" href=\"");
    content.push_str(&html_escape(authorization_url));
    content.push_str("\">Log in with Clever</a>\n");
    content.push_str("</div>");

    html_page("Login", &content)
}

/// Renders the authenticated page from the stored profile.
///
/// # Arguments
///
/// * `user_id` - Clever user id kept in the session
/// * `data` - Profile fields from `/me`
pub fn render_home(user_id: &str, data: &Map<String, Value>) -> String {
    let mut content = String::with_capacity(1024);
    content.push_str("<div class=\"card\">\n");
    content.push_str("<h1>Welcome</h1>\n");
    content.push_str("<p>Signed in as <code>");
    content.push_str(&html_escape(user_id));
    content.push_str("</code></p>\n");

    content.push_str("<table>\n<tr><th>Field</th><th>Value</th></tr>\n");
    for (key, value) in data {
        content.push_str("<tr><td>");
        content.push_str(&html_escape(key));
        content.push_str("</td><td>");
        content.push_str(&html_escape(&display_value(value)));
        content.push_str("</td></tr>\n");
    }
    content.push_str("</table>\n</div>");

    html_page("Home", &content)
}

fn display_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
