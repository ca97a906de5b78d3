use axum::response::Html;

use super::layout;

/// Record counts shown on the landing page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogCounts {
    pub categories: usize,
    pub articles: usize,
    pub inventories: usize,
}

pub fn page(counts: CatalogCounts) -> Html<String> {
    layout(
        "Catalog",
        &format!(
            "<ul>\n\
             <li><a href=\"/catalog/category\">Categories</a>: {}</li>\n\
             <li>Articles: {}</li>\n\
             <li><a href=\"/catalog/inventory\">Inventories</a>: {}</li>\n\
             </ul>\n",
            counts.categories, counts.articles, counts.inventories
        ),
    )
}
