use std::fmt::Write as _;

use axum::response::Html;

use stockroom_catalog::validation::CategoryInput;
use stockroom_catalog::{Article, Category, ValidationErrors};

use super::{error_summary, escape, hidden_version, layout, notice, text_field, textarea_field};

pub fn list(categories: &[Category]) -> Html<String> {
    let mut body = String::new();
    if categories.is_empty() {
        body.push_str("<p>There are no categories yet.</p>\n");
    } else {
        body.push_str("<ul>\n");
        for c in categories {
            let _ = writeln!(
                body,
                "<li><a href=\"{}\">{}</a> {}</li>",
                c.url(),
                escape(&c.name),
                escape(&c.description)
            );
        }
        body.push_str("</ul>\n");
    }
    body.push_str("<p><a href=\"/catalog/category/create\">Create category</a></p>\n");
    layout("Categories", &body)
}

pub fn detail(category: &Category, articles: &[Article]) -> Html<String> {
    let mut body = format!(
        "<p><strong>Description:</strong> {}</p>\n<p><strong>Examples:</strong> {}</p>\n<h2>Articles</h2>\n",
        escape(&category.description),
        escape(&category.examples)
    );
    article_list(&mut body, articles);
    let _ = write!(
        body,
        "<p><a href=\"{url}/update\">Update category</a> <a href=\"{url}/delete\">Delete category</a></p>\n",
        url = category.url()
    );
    layout(&format!("Category: {}", category.name), &body)
}

/// Create/update form. `version` is `Some` for updates.
pub fn form(
    title: &str,
    values: &CategoryInput,
    version: Option<u64>,
    errors: &ValidationErrors,
    banner: Option<&str>,
) -> Html<String> {
    let mut body = String::new();
    if let Some(msg) = banner {
        body.push_str(&notice(msg));
    }
    body.push_str(&error_summary(errors));
    body.push_str("<form method=\"post\">\n");
    body.push_str(&hidden_version(version));
    body.push_str(&text_field("Name", "name", &values.name, errors));
    body.push_str(&textarea_field("Description", "description", &values.description, errors));
    body.push_str(&textarea_field("Examples", "examples", &values.examples, errors));
    body.push_str("<button type=\"submit\">Submit</button>\n</form>\n");
    layout(title, &body)
}

/// Delete confirmation. With dependents present, the delete is refused.
pub fn delete_confirm(category: &Category, articles: &[Article]) -> Html<String> {
    let mut body = format!("<p>{}</p>\n", escape(&category.description));
    if articles.is_empty() {
        body.push_str(
            "<p>Do you really want to delete this category?</p>\n\
             <form method=\"post\"><button type=\"submit\">Delete</button></form>\n",
        );
    } else {
        body.push_str(
            "<p>This category cannot be deleted until the following articles are removed:</p>\n",
        );
        article_list(&mut body, articles);
    }
    layout(&format!("Delete category: {}", category.name), &body)
}

fn article_list(body: &mut String, articles: &[Article]) {
    if articles.is_empty() {
        body.push_str("<p>No articles in this category.</p>\n");
        return;
    }
    body.push_str("<ul>\n");
    for a in articles {
        let _ = writeln!(
            body,
            "<li><a href=\"{}\">{}</a> {} ({} in stock, {})</li>",
            a.url(),
            escape(&a.name),
            escape(&a.short_description),
            a.stock_number,
            a.price
        );
    }
    body.push_str("</ul>\n");
}
