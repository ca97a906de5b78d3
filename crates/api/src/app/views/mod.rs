//! Server-rendered HTML pages.
//!
//! Pages are plain `format!` templates. Every piece of user-supplied text goes
//! through [`escape`] before it is interpolated.

use std::fmt::Write as _;

use axum::response::Html;

use stockroom_catalog::ValidationErrors;

pub mod articles;
pub mod categories;
pub mod home;
pub mod inventories;

/// HTML-escape text for element content and quoted attribute values.
pub fn escape(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Wrap page content in the shared document shell and navigation.
pub fn layout(title: &str, body: &str) -> Html<String> {
    Html(format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>{title} | Stockroom</title>
</head>
<body>
<nav>
<a href="/catalog">Home</a>
<a href="/catalog/category">Categories</a>
<a href="/catalog/inventory">Inventories</a>
<a href="/catalog/category/create">New category</a>
<a href="/catalog/article/create">New article</a>
<a href="/catalog/inventory/create">New inventory</a>
</nav>
<main>
<h1>{title}</h1>
{body}
</main>
</body>
</html>
"#,
        title = escape(title),
    ))
}

pub fn error_page(title: &str, message: &str) -> Html<String> {
    layout(title, &format!("<p>{}</p>", escape(message)))
}

/// Error summary shown above a form.
pub fn error_summary(errors: &ValidationErrors) -> String {
    if errors.is_empty() {
        return String::new();
    }
    let mut out = String::from("<ul class=\"errors\">\n");
    for e in errors.iter() {
        let _ = writeln!(out, "<li>{}</li>", escape(&e.message));
    }
    out.push_str("</ul>\n");
    out
}

/// Single-line text input with its label and any field error.
pub fn text_field(
    label: &str,
    name: &str,
    value: &str,
    errors: &ValidationErrors,
) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label>\n<input type=\"text\" id=\"{name}\" name=\"{name}\" value=\"{value}\">{error}</p>\n",
        label = escape(label),
        value = escape(value),
        error = field_error(errors, name),
    )
}

pub fn textarea_field(
    label: &str,
    name: &str,
    value: &str,
    errors: &ValidationErrors,
) -> String {
    format!(
        "<p><label for=\"{name}\">{label}</label>\n<textarea id=\"{name}\" name=\"{name}\">{value}</textarea>{error}</p>\n",
        label = escape(label),
        value = escape(value),
        error = field_error(errors, name),
    )
}

/// `<select>` over `(value, text)` options, marking `selected` when it matches.
pub fn select_field<'a>(
    label: &str,
    name: &str,
    options: impl IntoIterator<Item = (String, &'a str)>,
    selected: &str,
    errors: &ValidationErrors,
) -> String {
    let mut opts = String::from("<option value=\"\">--</option>\n");
    for (value, text) in options {
        let mark = if value == selected.trim() { " selected" } else { "" };
        let _ = writeln!(
            opts,
            "<option value=\"{}\"{mark}>{}</option>",
            escape(&value),
            escape(text)
        );
    }
    format!(
        "<p><label for=\"{name}\">{label}</label>\n<select id=\"{name}\" name=\"{name}\">\n{opts}</select>{error}</p>\n",
        label = escape(label),
        error = field_error(errors, name),
    )
}

pub fn hidden_version(version: Option<u64>) -> String {
    match version {
        Some(v) => format!("<input type=\"hidden\" name=\"version\" value=\"{v}\">\n"),
        None => String::new(),
    }
}

fn field_error(errors: &ValidationErrors, field: &str) -> String {
    errors
        .for_field(field)
        .map(|m| format!(" <span class=\"error\">{}</span>", escape(m)))
        .unwrap_or_default()
}

/// Banner shown when a save lost an optimistic concurrency race.
pub const CONFLICT_MESSAGE: &str =
    "This record was modified by someone else. Review the current values and save again.";

pub fn notice(message: &str) -> String {
    format!("<p class=\"notice\">{}</p>\n", escape(message))
}

#[cfg(test)]
mod tests {
    use super::*;
    use stockroom_catalog::FieldError;

    #[test]
    fn escape_neutralises_markup() {
        assert_eq!(
            escape(r#"<script>alert("x & 'y'")</script>"#),
            "&lt;script&gt;alert(&quot;x &amp; &#39;y&#39;&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("plain"), "plain");
    }

    #[test]
    fn text_field_shows_value_and_error() {
        let errors = ValidationErrors::from(FieldError::new("name", "Name must be specified."));
        let html = text_field("Name", "name", "<b>", &errors);
        assert!(html.contains("value=\"&lt;b&gt;\""));
        assert!(html.contains("Name must be specified."));
    }

    #[test]
    fn select_marks_the_chosen_option() {
        let html = select_field(
            "Category",
            "category",
            vec![("a".to_string(), "Tools"), ("b".to_string(), "Toys")],
            "b",
            &ValidationErrors::new(),
        );
        assert!(html.contains("<option value=\"b\" selected>Toys</option>"));
        assert!(html.contains("<option value=\"a\">Tools</option>"));
    }
}
