use std::sync::Arc;

use axum::{extract::Extension, response::IntoResponse};

use crate::app::routes::HandlerResult;
use crate::app::services::AppServices;
use crate::app::views::home::{self as view, CatalogCounts};

pub async fn home(Extension(services): Extension<Arc<AppServices>>) -> HandlerResult {
    let store = services.store();
    let (categories, articles, inventories) = tokio::join!(
        store.list_categories(),
        store.list_articles(),
        store.list_inventories()
    );

    let counts = CatalogCounts {
        categories: categories?.len(),
        articles: articles?.len(),
        inventories: inventories?.len(),
    };
    Ok(view::page(counts).into_response())
}
