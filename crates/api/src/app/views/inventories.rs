use std::collections::HashMap;
use std::fmt::Write as _;

use axum::response::Html;

use stockroom_catalog::validation::InventoryInput;
use stockroom_catalog::{Article, Inventory, Price, ValidationErrors};
use stockroom_core::ArticleId;

use super::{error_summary, escape, layout, text_field};

/// Articles keyed by id, for resolving inventory lines.
pub type ArticleIndex<'a> = HashMap<ArticleId, &'a Article>;

pub fn index(articles: &[Article]) -> ArticleIndex<'_> {
    articles.iter().map(|a| (a.id, a)).collect()
}

fn total(inventory: &Inventory, articles: &ArticleIndex<'_>) -> Price {
    inventory.total_amount(|id| articles.get(&id).map(|a| a.price))
}

pub fn list(inventories: &[Inventory], articles: &ArticleIndex<'_>) -> Html<String> {
    let mut body = String::new();
    if inventories.is_empty() {
        body.push_str("<p>There are no inventories yet.</p>\n");
    } else {
        body.push_str(
            "<table>\n<tr><th>Owner</th><th>Articles</th><th>Total amount</th></tr>\n",
        );
        for inv in inventories {
            let _ = writeln!(
                body,
                "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td></tr>",
                inv.url(),
                escape(&inv.owner),
                inv.number_of_articles(),
                total(inv, articles)
            );
        }
        body.push_str("</table>\n");
    }
    body.push_str("<p><a href=\"/catalog/inventory/create\">Create inventory</a></p>\n");
    layout("Inventories", &body)
}

pub fn detail(inventory: &Inventory, articles: &ArticleIndex<'_>) -> Html<String> {
    let mut body = String::new();
    lines_table(&mut body, inventory, articles);
    let _ = write!(
        body,
        "<p><a href=\"{}/delete\">Delete inventory</a></p>\n",
        inventory.url()
    );
    layout(&format!("Inventory: {}", inventory.owner), &body)
}

pub fn form(values: &InventoryInput, errors: &ValidationErrors) -> Html<String> {
    let mut body = error_summary(errors);
    body.push_str("<form method=\"post\">\n");
    body.push_str(&text_field("Owner", "owner", &values.owner, errors));
    body.push_str("<button type=\"submit\">Submit</button>\n</form>\n");
    layout("Create inventory", &body)
}

/// Delete confirmation. A non-empty inventory cannot be deleted.
pub fn delete_confirm(inventory: &Inventory, articles: &ArticleIndex<'_>) -> Html<String> {
    let mut body = String::new();
    if inventory.is_empty() {
        body.push_str(
            "<p>Do you really want to delete this inventory?</p>\n\
             <form method=\"post\"><button type=\"submit\">Delete</button></form>\n",
        );
    } else {
        body.push_str(
            "<p>This inventory cannot be deleted while it still holds articles:</p>\n",
        );
        lines_table(&mut body, inventory, articles);
    }
    layout(&format!("Delete inventory: {}", inventory.owner), &body)
}

fn lines_table(body: &mut String, inventory: &Inventory, articles: &ArticleIndex<'_>) {
    if inventory.is_empty() {
        body.push_str("<p>This inventory is empty.</p>\n");
        return;
    }
    body.push_str(
        "<table>\n<tr><th>Article</th><th>Unit price</th><th>Quantity</th><th>Value</th></tr>\n",
    );
    for line in &inventory.articles {
        match articles.get(&line.article) {
            Some(a) => {
                let _ = writeln!(
                    body,
                    "<tr><td><a href=\"{}\">{}</a></td><td>{}</td><td>{}</td><td>{}</td></tr>",
                    a.url(),
                    escape(&a.name),
                    a.price,
                    line.quantity,
                    a.price.times(line.quantity)
                );
            }
            None => {
                let _ = writeln!(
                    body,
                    "<tr><td>(missing article)</td><td></td><td>{}</td><td></td></tr>",
                    line.quantity
                );
            }
        }
    }
    let _ = write!(
        body,
        "</table>\n<p>Number of articles: {}</p>\n<p>Total amount: {}</p>\n",
        inventory.number_of_articles(),
        total(inventory, articles)
    );
}
