use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use chrono::Utc;

use stockroom_catalog::validation::InventoryInput;
use stockroom_catalog::{Inventory, ValidationErrors};
use stockroom_core::InventoryId;
use stockroom_infra::store::DeleteOutcome;

use crate::app::dto::InventoryForm;
use crate::app::errors::AppError;
use crate::app::routes::{parse_id, HandlerResult};
use crate::app::services::AppServices;
use crate::app::views::inventories;

pub const LIST_URL: &str = "/catalog/inventory";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list))
        .route("/create", get(create_form).post(create_submit))
        .route("/:id", get(detail))
        .route("/:id/delete", get(delete_confirm).post(delete_submit))
}

pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> HandlerResult {
    let store = services.store();
    let (records, articles) = tokio::join!(store.list_inventories(), store.list_articles());

    let articles = articles?;
    Ok(inventories::list(&records?, &inventories::index(&articles)).into_response())
}

pub async fn detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let id: InventoryId = parse_id(&id, "Inventory")?;
    let store = services.store();
    let (inventory, articles) = tokio::join!(store.get_inventory(id), store.list_articles());

    let inventory = inventory?.ok_or(AppError::NotFound("Inventory"))?;
    let articles = articles?;
    Ok(inventories::detail(&inventory, &inventories::index(&articles)).into_response())
}

pub async fn create_form() -> HandlerResult {
    Ok(inventories::form(&InventoryInput::default(), &ValidationErrors::new()).into_response())
}

pub async fn create_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<InventoryForm>,
) -> HandlerResult {
    let values = form.input();
    let owner = match values.validate() {
        Ok(owner) => owner,
        Err(errors) => return Ok(inventories::form(&values, &errors).into_response()),
    };

    let saved = services
        .store()
        .insert_inventory(Inventory::create(owner, Utc::now()))
        .await?;
    tracing::info!(inventory_id = %saved.id, owner = %saved.owner, "inventory created");
    Ok(Redirect::to(&saved.url()).into_response())
}

pub async fn delete_confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let Ok(id) = parse_id::<InventoryId>(&id, "Inventory") else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    let store = services.store();
    let (inventory, articles) = tokio::join!(store.get_inventory(id), store.list_articles());

    match inventory? {
        Some(inventory) => {
            let articles = articles?;
            Ok(inventories::delete_confirm(&inventory, &inventories::index(&articles))
                .into_response())
        }
        None => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

pub async fn delete_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let Ok(id) = parse_id::<InventoryId>(&id, "Inventory") else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    let store = services.store();

    match store.delete_inventory(id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(inventory_id = %id, "inventory deleted");
            Ok(Redirect::to(LIST_URL).into_response())
        }
        DeleteOutcome::Blocked(lines) => {
            tracing::info!(inventory_id = %id, lines = lines.len(), "inventory delete refused");
            let (inventory, articles) =
                tokio::join!(store.get_inventory(id), store.list_articles());
            match inventory? {
                Some(inventory) => {
                    let articles = articles?;
                    Ok(inventories::delete_confirm(&inventory, &inventories::index(&articles))
                        .into_response())
                }
                None => Ok(Redirect::to(LIST_URL).into_response()),
            }
        }
        DeleteOutcome::NotFound => Ok(Redirect::to(LIST_URL).into_response()),
    }
}
