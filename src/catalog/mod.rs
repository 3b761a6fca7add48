//! Products owned by restaurant accounts.
//!
//! Only restaurants may add products, and only the owning restaurant may
//! change or remove one.

use crate::database::{Account, NewProduct, Product, ProductFields, ProductWithOwner, Store};
use crate::error::ServiceError;
use crate::storage::{PendingUpload, UploadKind, Uploads};
use crate::validation::{Input, Validator};

use log::info;
use uuid::Uuid;

const PRODUCT_NOT_FOUND: &str = "Product not found";

fn product_rules(v: &mut Validator) -> Option<ProductFields> {
    let name = v.required_string("name");
    let description = v.required_string("description");
    let price = v.required_integer("price", 0);
    let stock = v.required_integer("stock", 0);
    let is_available = v.required_boolean("is_available");
    let is_favorite = v.required_boolean("is_favorite");

    Some(ProductFields {
        name: name?,
        description: description?,
        price: price?,
        stock: stock?,
        is_available: is_available?,
        is_favorite: is_favorite?,
    })
}

/// Fields for a new product; the image is mandatory.
pub fn new_product_fields(
    input: &Input,
    image: Option<&PendingUpload>,
) -> Result<ProductFields, ServiceError> {
    let mut v = Validator::new(input);
    let fields = product_rules(&mut v);
    v.required_image("image", image);
    v.finish(fields)
}

pub fn product_fields(input: &Input) -> Result<ProductFields, ServiceError> {
    let mut v = Validator::new(input);
    let fields = product_rules(&mut v);
    v.finish(fields)
}

pub fn ensure_restaurant(caller: &Account) -> Result<(), ServiceError> {
    if !caller.is_restaurant() {
        return Err(ServiceError::Forbidden(
            "Only restaurant accounts can manage products",
        ));
    }
    Ok(())
}

fn owned_product(store: &dyn Store, caller: &Account, id: &Uuid) -> Result<Product, ServiceError> {
    let product = store
        .query_product(id)?
        .ok_or(ServiceError::NotFound(PRODUCT_NOT_FOUND))?;

    if product.user_id != caller.id {
        return Err(ServiceError::Forbidden(
            "This product belongs to another restaurant",
        ));
    }
    Ok(product)
}

fn with_owner(store: &dyn Store, products: Vec<Product>) -> Result<Vec<ProductWithOwner>, ServiceError> {
    let owner = match products.first() {
        Some(product) => store.query_user(&product.user_id)?,
        None => None,
    };

    Ok(products
        .into_iter()
        .map(|product| ProductWithOwner {
            product,
            user: owner.clone(),
        })
        .collect())
}

pub fn list_own(store: &dyn Store, caller: &Account) -> Result<Vec<ProductWithOwner>, ServiceError> {
    list_by_owner(store, &caller.id)
}

pub fn list_by_owner(store: &dyn Store, owner: &Uuid) -> Result<Vec<ProductWithOwner>, ServiceError> {
    let products = store.list_products(owner)?;
    with_owner(store, products)
}

pub fn show(store: &dyn Store, id: &Uuid) -> Result<ProductWithOwner, ServiceError> {
    let product = store
        .query_product(id)?
        .ok_or(ServiceError::NotFound(PRODUCT_NOT_FOUND))?;
    let user = store.query_user(&product.user_id)?;
    Ok(ProductWithOwner { product, user })
}

/// The owner is always the caller, whatever the request claimed.
pub fn create(
    store: &dyn Store,
    uploads: &Uploads,
    caller: &Account,
    fields: ProductFields,
    image: Option<PendingUpload>,
) -> Result<Product, ServiceError> {
    ensure_restaurant(caller)?;

    let image = match image {
        Some(upload) => Some(uploads.save(UploadKind::ProductImage, &upload)?),
        None => None,
    };

    let product = store.create_product(NewProduct {
        fields,
        image,
        user_id: caller.id,
    })?;

    info!("[catalog] restaurant {} added product {}", caller.id, product.id);
    Ok(product)
}

/// Existence and ownership are checked before the payload is validated, so an
/// unknown id is always reported as not found.
pub fn update(
    store: &dyn Store,
    caller: &Account,
    id: &Uuid,
    input: &Input,
) -> Result<Product, ServiceError> {
    owned_product(store, caller, id)?;
    let fields = product_fields(input)?;

    let product = store
        .update_product(id, &fields)?
        .ok_or(ServiceError::NotFound(PRODUCT_NOT_FOUND))?;

    info!("[catalog] product {} updated", product.id);
    Ok(product)
}

pub fn delete(store: &dyn Store, caller: &Account, id: &Uuid) -> Result<(), ServiceError> {
    owned_product(store, caller, id)?;

    if !store.delete_product(id)? {
        return Err(ServiceError::NotFound(PRODUCT_NOT_FOUND));
    }

    info!("[catalog] product {} deleted", id);
    Ok(())
}
