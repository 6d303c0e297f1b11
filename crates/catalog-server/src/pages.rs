//! HTML route handlers for the catalog.
//!
//! Every handler checks a connection out of the pool inside
//! `spawn_blocking`, runs one store call (or a short sequence of reads) and
//! renders the result. Mutations redirect to `/` and queue a flash notice.

use crate::flash::{clear_cookie, Notices};
use crate::views::{self, ProductFormView};
use crate::AppState;
use axum::{
    extract::{Extension, Form, Path},
    http::{header, HeaderMap, StatusCode},
    response::{Html, IntoResponse, Redirect, Response},
};
use catalog_store::StoreError;
use catalog_types::{Category, FieldErrors, Product, ProductFormInput};
use rusqlite::Connection;
use std::sync::Arc;
use thiserror::Error;

/// Page error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum PageError {
    #[error("not found")]
    NotFound,
    #[error("internal server error: {0}")]
    Internal(String),
}

impl From<StoreError> for PageError {
    fn from(err: StoreError) -> Self {
        if err.is_not_found() {
            tracing::debug!(error = %err, "lookup failed");
            return PageError::NotFound;
        }
        tracing::error!(error = %err, "catalog operation failed");
        PageError::Internal(err.to_string())
    }
}

impl IntoResponse for PageError {
    fn into_response(self) -> Response {
        match self {
            PageError::NotFound => {
                (StatusCode::NOT_FOUND, Html(views::not_found_page())).into_response()
            }
            PageError::Internal(_) => {
                (StatusCode::INTERNAL_SERVER_ERROR, Html(views::error_page())).into_response()
            }
        }
    }
}

/// Runs `f` against a pooled connection on the blocking thread pool.
async fn with_conn<T, F>(state: &AppState, f: F) -> Result<T, PageError>
where
    F: FnOnce(&Connection) -> Result<T, PageError> + Send + 'static,
    T: Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool.get().map_err(|e| {
            tracing::error!(error = %e, "failed to get db connection");
            PageError::Internal(format!("db connection failed: {}", e))
        })?;
        f(&conn)
    })
    .await
    .map_err(|e| {
        tracing::error!(error = %e, "blocking task join error");
        PageError::Internal(e.to_string())
    })?
}

/// Path ids must be unsigned decimal digits; anything else (including a
/// leading `+` or `-`) never matches a product.
fn parse_id(raw: &str) -> Result<i64, PageError> {
    if raw.is_empty() || !raw.bytes().all(|b| b.is_ascii_digit()) {
        return Err(PageError::NotFound);
    }
    raw.parse().map_err(|_| PageError::NotFound)
}

/// Renders a page, clearing the flash cookie if the request carried one.
fn render(html: String, notices: &Notices) -> Response {
    let mut response = Html(html).into_response();
    if notices.had_cookie() {
        response
            .headers_mut()
            .insert(header::SET_COOKIE, clear_cookie());
    }
    response
}

/// Redirects to the product list with `message` queued behind any notices
/// that have not been shown yet.
fn redirect_with_notice(state: &AppState, mut notices: Notices, message: String) -> Response {
    notices.push(message);
    let cookie = state.flash.set_cookie(&notices.into_messages());
    let mut response = Redirect::to("/").into_response();
    response.headers_mut().insert(header::SET_COOKIE, cookie);
    response
}

/// Outcome of a form submission that did not fail outright.
enum Submission {
    Saved(Product),
    Rejected {
        categories: Vec<Category>,
        errors: FieldErrors,
        notice: Option<String>,
    },
}

/// Splits a store result into saved, re-render, or terminal error.
fn into_submission(
    conn: &Connection,
    result: Result<Product, StoreError>,
) -> Result<Submission, PageError> {
    let (errors, notice) = match result {
        Ok(product) => return Ok(Submission::Saved(product)),
        Err(StoreError::Validation(errors)) => (errors, None),
        Err(conflict @ StoreError::Conflict { .. }) => {
            (FieldErrors::new(), Some(conflict.to_string()))
        }
        Err(other) => return Err(other.into()),
    };
    let categories = catalog_store::list_categories(conn)?;
    Ok(Submission::Rejected {
        categories,
        errors,
        notice,
    })
}

/// GET /
pub async fn index_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let notices = state.flash.take(&headers);
    let (products, categories) = with_conn(&state, |conn| {
        let products = catalog_store::list_products(conn)?;
        let categories = catalog_store::list_categories(conn)?;
        Ok((products, categories))
    })
    .await?;

    Ok(render(
        views::index_page(&products, &categories, notices.messages()),
        &notices,
    ))
}

/// GET /new
pub async fn new_product_form_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
) -> Result<Response, PageError> {
    let notices = state.flash.take(&headers);
    let categories = with_conn(&state, |conn| Ok(catalog_store::list_categories(conn)?)).await?;

    let errors = FieldErrors::new();
    let view = ProductFormView {
        title: "New product",
        action: "/new".to_string(),
        name: "",
        selected_category: String::new(),
        categories: &categories,
        errors: &errors,
    };
    Ok(render(views::form_page(&view, notices.messages()), &notices))
}

/// POST /new
pub async fn create_product_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Form(input): Form<ProductFormInput>,
) -> Result<Response, PageError> {
    let mut notices = state.flash.take(&headers);
    let submitted = input.clone();
    let submission = with_conn(&state, move |conn| {
        let result = catalog_store::create_product(conn, &input);
        into_submission(conn, result)
    })
    .await?;

    match submission {
        Submission::Saved(product) => Ok(redirect_with_notice(
            &state,
            notices,
            format!("Product# {} has been created.", product.id),
        )),
        Submission::Rejected {
            categories,
            errors,
            notice,
        } => {
            if let Some(notice) = notice {
                notices.push(notice);
            }
            let view = ProductFormView {
                title: "New product",
                action: "/new".to_string(),
                name: &submitted.name,
                selected_category: submitted.category.trim().to_string(),
                categories: &categories,
                errors: &errors,
            };
            Ok(render(views::form_page(&view, notices.messages()), &notices))
        }
    }
}

/// GET /{id}/
pub async fn view_product_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&raw_id)?;
    let notices = state.flash.take(&headers);
    let (product, category, siblings) = with_conn(&state, move |conn| {
        let product = catalog_store::get_product(conn, id)?;
        let category = catalog_store::get_category(conn, product.category_id)?;
        let siblings: Vec<Product> =
            catalog_store::find_products_by_category(conn, category.id)?
                .into_iter()
                .filter(|other| other.id != product.id)
                .collect();
        Ok((product, category, siblings))
    })
    .await?;

    Ok(render(
        views::product_page(&product, &category, &siblings, notices.messages()),
        &notices,
    ))
}

/// GET /{id}/edit
pub async fn edit_product_form_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&raw_id)?;
    let notices = state.flash.take(&headers);
    let (product, categories) = with_conn(&state, move |conn| {
        let product = catalog_store::get_product(conn, id)?;
        let categories = catalog_store::list_categories(conn)?;
        Ok((product, categories))
    })
    .await?;

    let errors = FieldErrors::new();
    let view = ProductFormView {
        title: "Edit product",
        action: format!("/{}/edit", product.id),
        name: &product.name,
        selected_category: product.category_id.to_string(),
        categories: &categories,
        errors: &errors,
    };
    Ok(render(views::form_page(&view, notices.messages()), &notices))
}

/// POST /{id}/edit
pub async fn update_product_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
    Form(input): Form<ProductFormInput>,
) -> Result<Response, PageError> {
    let id = parse_id(&raw_id)?;
    let mut notices = state.flash.take(&headers);
    let submitted = input.clone();
    let submission = with_conn(&state, move |conn| {
        let result = catalog_store::edit_product(conn, id, &input);
        into_submission(conn, result)
    })
    .await?;

    match submission {
        Submission::Saved(product) => Ok(redirect_with_notice(
            &state,
            notices,
            format!("Product# {} has been updated.", product.id),
        )),
        Submission::Rejected {
            categories,
            errors,
            notice,
        } => {
            if let Some(notice) = notice {
                notices.push(notice);
            }
            let view = ProductFormView {
                title: "Edit product",
                action: format!("/{}/edit", id),
                name: &submitted.name,
                selected_category: submitted.category.trim().to_string(),
                categories: &categories,
                errors: &errors,
            };
            Ok(render(views::form_page(&view, notices.messages()), &notices))
        }
    }
}

/// GET /{id}/delete
///
/// Deletes on a plain GET with no confirmation step.
pub async fn delete_product_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    Path(raw_id): Path<String>,
) -> Result<Response, PageError> {
    let id = parse_id(&raw_id)?;
    let notices = state.flash.take(&headers);
    with_conn(&state, move |conn| Ok(catalog_store::delete_product(conn, id)?)).await?;

    Ok(redirect_with_notice(
        &state,
        notices,
        format!("Product# {} has been deleted.", id),
    ))
}

/// Fallback for unknown routes.
pub async fn not_found_handler() -> PageError {
    PageError::NotFound
}
