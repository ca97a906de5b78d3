use std::sync::Arc;

use axum::{
    extract::{Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Redirect},
    routing::get,
    Form, Router,
};
use chrono::Utc;

use stockroom_catalog::validation::CategoryInput;
use stockroom_catalog::{Category, ValidationErrors};
use stockroom_core::CategoryId;
use stockroom_infra::store::DeleteOutcome;

use crate::app::dto::{self, CategoryForm};
use crate::app::errors::AppError;
use crate::app::routes::{is_conflict, is_not_found, parse_id, HandlerResult};
use crate::app::services::AppServices;
use crate::app::views::{self, categories};

pub const LIST_URL: &str = "/catalog/category";

pub fn router() -> Router {
    Router::new()
        .route("/", get(list))
        .route("/create", get(create_form).post(create_submit))
        .route("/:id", get(detail))
        .route("/:id/update", get(update_form).post(update_submit))
        .route("/:id/delete", get(delete_confirm).post(delete_submit))
}

pub async fn list(Extension(services): Extension<Arc<AppServices>>) -> HandlerResult {
    let categories = services.store().list_categories().await?;
    Ok(categories::list(&categories).into_response())
}

pub async fn detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let id: CategoryId = parse_id(&id, "Category")?;
    let store = services.store();
    let (category, articles) = tokio::join!(store.get_category(id), store.articles_in_category(id));

    let category = category?.ok_or(AppError::NotFound("Category"))?;
    Ok(categories::detail(&category, &articles?).into_response())
}

pub async fn create_form() -> HandlerResult {
    Ok(categories::form(
        "Create category",
        &CategoryInput::default(),
        None,
        &ValidationErrors::new(),
        None,
    )
    .into_response())
}

pub async fn create_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<CategoryForm>,
) -> HandlerResult {
    let values = form.input();
    let draft = match values.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(
                categories::form("Create category", &values, None, &errors, None).into_response(),
            );
        }
    };

    let saved = services
        .store()
        .insert_category(Category::create(draft, Utc::now()))
        .await?;
    tracing::info!(category_id = %saved.id, name = %saved.name, "category created");
    Ok(Redirect::to(&saved.url()).into_response())
}

pub async fn update_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let id: CategoryId = parse_id(&id, "Category")?;
    let category = services
        .store()
        .get_category(id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    Ok(categories::form(
        "Update category",
        &dto::category_input(&category),
        Some(category.version),
        &ValidationErrors::new(),
        None,
    )
    .into_response())
}

pub async fn update_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Form(form): Form<CategoryForm>,
) -> HandlerResult {
    let id: CategoryId = parse_id(&id, "Category")?;
    let store = services.store();
    let existing = store
        .get_category(id)
        .await?
        .ok_or(AppError::NotFound("Category"))?;

    let values = form.input();
    let draft = match values.validate() {
        Ok(draft) => draft,
        Err(errors) => {
            return Ok(
                categories::form("Update category", &values, form.version(), &errors, None)
                    .into_response(),
            );
        }
    };

    match store
        .update_category(existing.replaced_with(draft, Utc::now()), form.expected_version())
        .await
    {
        Ok(saved) => {
            tracing::info!(category_id = %saved.id, version = saved.version, "category updated");
            Ok(Redirect::to(&saved.url()).into_response())
        }
        Err(e) if is_conflict(&e) => {
            tracing::warn!(category_id = %id, "category update lost a version race");
            let current = store
                .get_category(id)
                .await?
                .ok_or(AppError::NotFound("Category"))?;
            Ok((
                StatusCode::CONFLICT,
                categories::form(
                    "Update category",
                    &values,
                    Some(current.version),
                    &ValidationErrors::new(),
                    Some(views::CONFLICT_MESSAGE),
                ),
            )
                .into_response())
        }
        Err(e) if is_not_found(&e) => Err(AppError::NotFound("Category")),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let Ok(id) = parse_id::<CategoryId>(&id, "Category") else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    let store = services.store();
    let (category, articles) = tokio::join!(store.get_category(id), store.articles_in_category(id));

    match category? {
        Some(category) => Ok(categories::delete_confirm(&category, &articles?).into_response()),
        None => Ok(Redirect::to(LIST_URL).into_response()),
    }
}

pub async fn delete_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let Ok(id) = parse_id::<CategoryId>(&id, "Category") else {
        return Ok(Redirect::to(LIST_URL).into_response());
    };
    let store = services.store();

    match store.delete_category(id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(category_id = %id, "category deleted");
            Ok(Redirect::to(LIST_URL).into_response())
        }
        DeleteOutcome::Blocked(articles) => {
            tracing::info!(
                category_id = %id,
                dependents = articles.len(),
                "category delete refused"
            );
            match store.get_category(id).await? {
                Some(category) => {
                    Ok(categories::delete_confirm(&category, &articles).into_response())
                }
                None => Ok(Redirect::to(LIST_URL).into_response()),
            }
        }
        DeleteOutcome::NotFound => Ok(Redirect::to(LIST_URL).into_response()),
    }
}
