//! Template filling and small HTML helpers shared by the page handlers.

use super::templates;
use crate::types::{FieldErrors, User};

/// Escape HTML special characters.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

/// Escape text and keep its line breaks.
pub fn linebreaks(s: &str) -> String {
    html_escape(s).replace('\n', "<br>\n")
}

/// Substitute `{{name}}` placeholders in a single pass.
///
/// Values are inserted verbatim (callers escape them) and are never rescanned,
/// so user text containing `{{...}}` stays literal. Unknown placeholders render
/// as empty strings.
pub fn fill(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                if let Some((_, value)) = values.iter().find(|(k, _)| *k == key) {
                    out.push_str(value);
                }
                rest = &after[end + 2..];
            }
            None => {
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

/// Navigation links for the header.
pub fn nav(user: Option<&User>) -> String {
    match user {
        Some(user) => format!(
            r#"<a href="/">Tasks</a><a href="/tasks/new">New task</a><span class="muted" style="color:#cdd">{}</span><form class="inline" method="post" action="/logout"><button type="submit">Log out</button></form>"#,
            html_escape(&user.username)
        ),
        None => r#"<a href="/">Tasks</a><a href="/login">Log in</a><a href="/register">Register</a>"#
            .to_string(),
    }
}

/// Wrap page content in the base layout.
pub fn page(title: &str, user: Option<&User>, message: &str, content: &str) -> String {
    fill(
        templates::BASE_TEMPLATE,
        &[
            ("title", &html_escape(title)),
            ("nav", &nav(user)),
            ("message", message),
            ("content", content),
        ],
    )
}

/// Full error page.
pub fn error_page(status: u16, title: &str, message: &str) -> String {
    let body = fill(
        templates::ERROR_TEMPLATE,
        &[
            ("status", &status.to_string()),
            ("title", &html_escape(title)),
            ("message", &html_escape(message)),
        ],
    );
    page(title, None, "", &body)
}

/// Render a `msg` query value (`success:...` or `error:...`) as a flash box.
pub fn flash_message(msg: Option<&str>) -> String {
    msg.filter(|m| !m.is_empty())
        .map(|m| {
            let (class, text) = if let Some(stripped) = m.strip_prefix("success:") {
                ("message-success", stripped)
            } else if let Some(stripped) = m.strip_prefix("error:") {
                ("message-error", stripped)
            } else {
                ("message-success", m)
            };
            format!(
                r#"<div class="message {}">{}</div>"#,
                class,
                html_escape(text)
            )
        })
        .unwrap_or_default()
}

/// URL that shows an error flash message on the target page.
pub fn with_error_message(path: &str, text: &str) -> String {
    format!("{}?msg={}", path, urlencoding::encode(&format!("error:{}", text)))
}

/// Error list for one form field, empty when the field is valid.
pub fn field_errors(errors: &FieldErrors, field: &str) -> String {
    let messages = errors.for_field(field);
    if messages.is_empty() {
        return String::new();
    }
    let items: String = messages
        .iter()
        .map(|m| format!("<li>{}</li>", html_escape(m)))
        .collect();
    format!(r#"<ul class="errorlist">{}</ul>"#, items)
}

/// `<option>` list with the matching code pre-selected.
pub fn select_options<'a>(
    choices: impl IntoIterator<Item = (&'a str, &'a str)>,
    selected: Option<&str>,
) -> String {
    choices
        .into_iter()
        .map(|(code, label)| {
            let sel = if selected == Some(code) { " selected" } else { "" };
            format!(r#"<option value="{}"{}>{}</option>"#, code, sel, label)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a millisecond timestamp as `YYYY-MM-DD HH:MM` (UTC).
pub fn format_timestamp(ms: i64) -> String {
    chrono::DateTime::from_timestamp_millis(ms)
        .map(|dt| dt.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_is_single_pass() {
        let out = fill(
            "<h1>{{title}}</h1><p>{{ body }}</p>{{missing}}",
            &[("title", "{{body}}"), ("body", "text")],
        );
        assert_eq!(out, "<h1>{{body}}</h1><p>text</p>");
    }

    #[test]
    fn fill_keeps_unterminated_braces() {
        assert_eq!(fill("a {{b", &[("b", "x")]), "a {{b");
    }

    #[test]
    fn flash_message_picks_class_from_prefix() {
        assert!(flash_message(Some("error:Nope")).contains("message-error"));
        assert!(flash_message(Some("success:Saved")).contains("message-success"));
        assert_eq!(flash_message(None), "");
    }

    #[test]
    fn select_marks_selected_choice() {
        let html = select_options([("a", "A"), ("b", "B")], Some("b"));
        assert!(html.contains(r#"<option value="b" selected>B</option>"#));
        assert!(html.contains(r#"<option value="a">A</option>"#));
    }

    #[test]
    fn timestamp_formats_in_utc() {
        assert_eq!(format_timestamp(0), "1970-01-01 00:00");
    }

    #[test]
    fn linebreaks_escapes_first() {
        assert_eq!(linebreaks("<b>\nx"), "&lt;b&gt;<br>\nx");
    }
}
