use super::auth::Authenticated;
use super::{input_of, success, success_message, AppState, Fields};
use crate::catalog;
use crate::error::ServiceError;
use crate::storage::PendingUpload;
use crate::validation::Input;

use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse};
use serde::Deserialize;
use uuid::Uuid;

#[derive(Deserialize)]
pub struct ProductQuery {
    user_id: Option<Uuid>,
}

/// Anything beyond these fields, an owner id included, is dropped.
#[derive(MultipartForm)]
pub struct ProductForm {
    name: Option<Text<String>>,
    description: Option<Text<String>>,
    price: Option<Text<String>>,
    stock: Option<Text<String>>,
    is_available: Option<Text<String>>,
    is_favorite: Option<Text<String>>,
    image: Option<TempFile>,
}

/// Malformed ids cannot name a product, so they are reported like unknown ones.
fn product_id(raw: &str) -> Result<Uuid, ServiceError> {
    Uuid::parse_str(raw).map_err(|_| ServiceError::NotFound("Product not found"))
}

// GET /products[?user_id=]
pub async fn index(
    state: web::Data<AppState>,
    auth: Authenticated,
    query: web::Query<ProductQuery>,
) -> Result<HttpResponse, ServiceError> {
    match query.user_id {
        Some(owner) => {
            let products = state
                .run(move |store, _| catalog::list_by_owner(store, &owner))
                .await?;
            Ok(success("List data products by user_id", products))
        }
        None => {
            let products = state
                .run(move |store, _| catalog::list_own(store, &auth.account))
                .await?;
            Ok(success("List data products", products))
        }
    }
}

// GET /products/{id}
pub async fn show(
    state: web::Data<AppState>,
    _auth: Authenticated,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let id = product_id(&path)?;
    let product = state.run(move |store, _| catalog::show(store, &id)).await?;

    Ok(success("Product detail", product))
}

// POST /products
pub async fn store(
    state: web::Data<AppState>,
    auth: Authenticated,
    MultipartForm(form): MultipartForm<ProductForm>,
) -> Result<HttpResponse, ServiceError> {
    catalog::ensure_restaurant(&auth.account)?;

    let mut input = Input::new();
    input.insert_text("name", form.name.map(Text::into_inner));
    input.insert_text("description", form.description.map(Text::into_inner));
    input.insert_text("price", form.price.map(Text::into_inner));
    input.insert_text("stock", form.stock.map(Text::into_inner));
    input.insert_text("is_available", form.is_available.map(Text::into_inner));
    input.insert_text("is_favorite", form.is_favorite.map(Text::into_inner));
    let image = form.image.map(PendingUpload::from);

    let fields = catalog::new_product_fields(&input, image.as_ref())?;
    let product = state
        .run(move |store, uploads| catalog::create(store, uploads, &auth.account, fields, image))
        .await?;

    Ok(success("Product added successfully", product))
}

// PUT /products/{id}
pub async fn update(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
    body: Fields,
) -> Result<HttpResponse, ServiceError> {
    let id = product_id(&path)?;
    let input = input_of(body);
    let product = state
        .run(move |store, _| catalog::update(store, &auth.account, &id, &input))
        .await?;

    Ok(success("Product updated successfully", product))
}

// DELETE /products/{id}
pub async fn destroy(
    state: web::Data<AppState>,
    auth: Authenticated,
    path: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    let id = product_id(&path)?;
    state
        .run(move |store, _| catalog::delete(store, &auth.account, &id))
        .await?;

    Ok(success_message("Product deleted successfully"))
}
