use std::sync::Arc;

use axum::{
    extract::{rejection::FormRejection, Extension, Path},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
    routing::{get, post},
    Form, Router,
};
use chrono::Utc;

use stockroom_catalog::validation::ArticleInput;
use stockroom_catalog::{Article, ArticleDraft, TransferRequest, ValidationErrors};
use stockroom_core::{ArticleId, CategoryId};
use stockroom_infra::store::{CatalogStore, DeleteOutcome, StoreResult};

use crate::app::dto::{self, ArticleForm, TransferForm};
use crate::app::errors::{self, AppError};
use crate::app::routes::categories::LIST_URL as CATEGORY_LIST_URL;
use crate::app::routes::{is_conflict, is_not_found, parse_id, HandlerResult};
use crate::app::services::AppServices;
use crate::app::views::{self, articles};

pub fn router() -> Router {
    Router::new()
        .route("/create", get(create_form).post(create_submit))
        .route("/:id", get(detail))
        .route("/:id/update", get(update_form).post(update_submit))
        .route("/:id/delete", get(delete_confirm).post(delete_submit))
        .route("/:id/add_inventory", post(add_inventory))
}

/// Field validation plus the check that the chosen category exists.
async fn validate(
    store: &dyn CatalogStore,
    values: &ArticleInput,
) -> StoreResult<Result<ArticleDraft, ValidationErrors>> {
    let mut missing = None;
    if let Ok(id) = values.category.trim().parse::<CategoryId>() {
        if store.get_category(id).await?.is_none() {
            missing = Some(id);
        }
    }
    Ok(values.validate_with(|id| Some(id) != missing))
}

pub async fn detail(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let id: ArticleId = parse_id(&id, "Article")?;
    let store = services.store();
    let (article, inventories) = tokio::join!(store.get_article(id), store.list_inventories());

    let article = article?.ok_or(AppError::NotFound("Article"))?;
    let category = store.get_category(article.category).await?;

    let mut owners: Vec<String> = inventories?.into_iter().map(|i| i.owner).collect();
    owners.dedup();

    Ok(articles::detail(&article, category.as_ref(), &owners).into_response())
}

pub async fn create_form(Extension(services): Extension<Arc<AppServices>>) -> HandlerResult {
    let categories = services.store().list_categories().await?;
    Ok(articles::form(
        "Create article",
        &ArticleInput::default(),
        &categories,
        None,
        &ValidationErrors::new(),
        None,
    )
    .into_response())
}

pub async fn create_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Form(form): Form<ArticleForm>,
) -> HandlerResult {
    let store = services.store();
    let values = form.input();

    let draft = match validate(store, &values).await? {
        Ok(draft) => draft,
        Err(errors) => {
            let categories = store.list_categories().await?;
            return Ok(articles::form(
                "Create article",
                &values,
                &categories,
                None,
                &errors,
                None,
            )
            .into_response());
        }
    };

    let saved = store.insert_article(Article::create(draft, Utc::now())).await?;
    tracing::info!(
        article_id = %saved.id,
        category_id = %saved.category,
        stock = saved.stock_number,
        "article created"
    );
    Ok(Redirect::to(&saved.url()).into_response())
}

pub async fn update_form(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let id: ArticleId = parse_id(&id, "Article")?;
    let store = services.store();
    let (article, categories) = tokio::join!(store.get_article(id), store.list_categories());

    let article = article?.ok_or(AppError::NotFound("Article"))?;
    Ok(articles::form(
        "Update article",
        &dto::article_input(&article),
        &categories?,
        Some(article.version),
        &ValidationErrors::new(),
        None,
    )
    .into_response())
}

pub async fn update_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    Form(form): Form<ArticleForm>,
) -> HandlerResult {
    let id: ArticleId = parse_id(&id, "Article")?;
    let store = services.store();
    let existing = store
        .get_article(id)
        .await?
        .ok_or(AppError::NotFound("Article"))?;

    let values = form.input();
    let draft = match validate(store, &values).await? {
        Ok(draft) => draft,
        Err(errors) => {
            let categories = store.list_categories().await?;
            return Ok(articles::form(
                "Update article",
                &values,
                &categories,
                form.version(),
                &errors,
                None,
            )
            .into_response());
        }
    };

    match store
        .update_article(existing.replaced_with(draft, Utc::now()), form.expected_version())
        .await
    {
        Ok(saved) => {
            tracing::info!(article_id = %saved.id, version = saved.version, "article updated");
            Ok(Redirect::to(&saved.url()).into_response())
        }
        Err(e) if is_conflict(&e) => {
            tracing::warn!(article_id = %id, "article update lost a version race");
            let (current, categories) =
                tokio::join!(store.get_article(id), store.list_categories());
            let current = current?.ok_or(AppError::NotFound("Article"))?;
            Ok((
                StatusCode::CONFLICT,
                articles::form(
                    "Update article",
                    &values,
                    &categories?,
                    Some(current.version),
                    &ValidationErrors::new(),
                    Some(views::CONFLICT_MESSAGE),
                ),
            )
                .into_response())
        }
        Err(e) if is_not_found(&e) => Err(AppError::NotFound("Article")),
        Err(e) => Err(e.into()),
    }
}

pub async fn delete_confirm(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let Ok(id) = parse_id::<ArticleId>(&id, "Article") else {
        return Ok(Redirect::to(CATEGORY_LIST_URL).into_response());
    };
    let store = services.store();
    let (article, holders) = tokio::join!(store.get_article(id), store.inventories_holding(id));

    match article? {
        Some(article) => Ok(articles::delete_confirm(&article, &holders?).into_response()),
        None => Ok(Redirect::to(CATEGORY_LIST_URL).into_response()),
    }
}

pub async fn delete_submit(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
) -> HandlerResult {
    let Ok(id) = parse_id::<ArticleId>(&id, "Article") else {
        return Ok(Redirect::to(CATEGORY_LIST_URL).into_response());
    };
    let store = services.store();
    let Some(article) = store.get_article(id).await? else {
        return Ok(Redirect::to(CATEGORY_LIST_URL).into_response());
    };

    match store.delete_article(id).await? {
        DeleteOutcome::Deleted => {
            tracing::info!(article_id = %id, "article deleted");
            // Back to the owning category while it still exists.
            let target = match store.get_category(article.category).await? {
                Some(category) => category.url(),
                None => CATEGORY_LIST_URL.to_string(),
            };
            Ok(Redirect::to(&target).into_response())
        }
        DeleteOutcome::Blocked(holders) => {
            tracing::info!(
                article_id = %id,
                dependents = holders.len(),
                "article delete refused"
            );
            Ok(articles::delete_confirm(&article, &holders).into_response())
        }
        DeleteOutcome::NotFound => Ok(Redirect::to(CATEGORY_LIST_URL).into_response()),
    }
}

/// Stock transfer. Errors are reported as JSON rather than HTML.
pub async fn add_inventory(
    Extension(services): Extension<Arc<AppServices>>,
    Path(id): Path<String>,
    form: Result<Form<TransferForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(rejection) => {
            return errors::json_error(rejection.status(), "invalid_body", rejection.body_text());
        }
    };
    let (owner, quantity) = match form.input().validate() {
        Ok(valid) => valid,
        Err(errs) => return errors::json_validation_error(errs),
    };
    let Ok(article) = id.trim().parse::<ArticleId>() else {
        return errors::json_error(StatusCode::NOT_FOUND, "not_found", "Article not found");
    };

    let request = TransferRequest {
        article,
        owner,
        quantity,
    };
    match services.store().transfer_stock(request).await {
        Ok(outcome) => {
            tracing::info!(
                article_id = %outcome.article.id,
                inventory_id = %outcome.inventory.id,
                owner = %outcome.inventory.owner,
                quantity,
                remaining = outcome.article.stock_number,
                created_inventory = outcome.created_inventory,
                "stock transferred"
            );
            Redirect::to(&outcome.article.url()).into_response()
        }
        Err(e) => errors::store_error_to_json(e),
    }
}
