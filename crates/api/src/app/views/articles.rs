use std::fmt::Write as _;

use axum::response::Html;

use stockroom_catalog::validation::ArticleInput;
use stockroom_catalog::{Article, Category, Inventory, ValidationErrors};

use super::{
    error_summary, escape, hidden_version, layout, notice, select_field, text_field,
    textarea_field,
};

/// Article page with a stock-transfer form.
///
/// `owners` fills the suggestion list of the transfer form; any other owner
/// name may still be typed.
pub fn detail(article: &Article, category: Option<&Category>, owners: &[String]) -> Html<String> {
    let category_html = match category {
        Some(c) => format!("<a href=\"{}\">{}</a>", c.url(), escape(&c.name)),
        None => "(unknown)".to_string(),
    };

    let mut body = format!(
        "<p>{short}</p>\n\
         <dl>\n\
         <dt>Category</dt><dd>{category_html}</dd>\n\
         <dt>Price</dt><dd>{price}</dd>\n\
         <dt>In stock</dt><dd>{stock}</dd>\n\
         </dl>\n\
         <p>{detail}</p>\n",
        short = escape(&article.short_description),
        price = article.price,
        stock = article.stock_number,
        detail = escape(&article.detail_description),
    );

    let _ = write!(
        body,
        "<h2>Add to inventory</h2>\n\
         <form method=\"post\" action=\"{url}/add_inventory\">\n\
         <p><label for=\"owner\">Owner</label>\n\
         <input type=\"text\" id=\"owner\" name=\"owner\" list=\"owners\"></p>\n\
         <datalist id=\"owners\">\n",
        url = article.url()
    );
    for owner in owners {
        let _ = writeln!(body, "<option value=\"{}\">", escape(owner));
    }
    let _ = write!(
        body,
        "</datalist>\n\
         <p><label for=\"quantity\">Quantity</label>\n\
         <input type=\"number\" id=\"quantity\" name=\"quantity\" min=\"0\" value=\"1\"></p>\n\
         <button type=\"submit\">Transfer</button>\n\
         </form>\n\
         <p><a href=\"{url}/update\">Update article</a> <a href=\"{url}/delete\">Delete article</a></p>\n",
        url = article.url()
    );

    layout(&format!("Article: {}", article.name), &body)
}

/// Create/update form. `version` is `Some` for updates.
pub fn form(
    title: &str,
    values: &ArticleInput,
    categories: &[Category],
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
    body.push_str(&text_field(
        "Short description",
        "short_description",
        &values.short_description,
        errors,
    ));
    body.push_str(&select_field(
        "Category",
        "category",
        categories.iter().map(|c| (c.id.to_string(), c.name.as_str())),
        &values.category,
        errors,
    ));
    body.push_str(&text_field("Price", "price", &values.price, errors));
    body.push_str(&text_field("Stock number", "stock_number", &values.stock_number, errors));
    body.push_str(&textarea_field(
        "Detail description",
        "detail_description",
        &values.detail_description,
        errors,
    ));
    body.push_str("<button type=\"submit\">Submit</button>\n</form>\n");
    layout(title, &body)
}

/// Delete confirmation. With holders present, the delete is refused.
pub fn delete_confirm(article: &Article, holders: &[Inventory]) -> Html<String> {
    let mut body = format!("<p>{}</p>\n", escape(&article.short_description));
    if holders.is_empty() {
        body.push_str(
            "<p>Do you really want to delete this article?</p>\n\
             <form method=\"post\"><button type=\"submit\">Delete</button></form>\n",
        );
    } else {
        body.push_str(
            "<p>This article cannot be deleted while the following inventories hold it:</p>\n<ul>\n",
        );
        for inv in holders {
            let held = inv.line_for(article.id).map(|l| l.quantity).unwrap_or(0);
            let _ = writeln!(
                body,
                "<li><a href=\"{}\">{}</a> ({held} held)</li>",
                inv.url(),
                escape(&inv.owner)
            );
        }
        body.push_str("</ul>\n");
    }
    layout(&format!("Delete article: {}", article.name), &body)
}
