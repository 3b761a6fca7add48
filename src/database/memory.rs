use super::models::{Account, NewAccount, NewProduct, Product, ProductFields, Role};
use super::{Store, StoreError};

use chrono::Utc;
use log::warn;
use uuid::Uuid;

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
struct Tables {
    users: Vec<Account>,
    tokens: HashMap<String, Uuid>,
    products: Vec<Product>,
}

/// Process-local backend for `--offline` runs and tests. Data is lost on exit.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> MemoryStore {
        MemoryStore::default()
    }

    // a panicking writer cannot leave a table half-updated, so poisoning is ignored
    fn read(&self) -> RwLockReadGuard<'_, Tables> {
        self.tables.read().unwrap_or_else(|poisoned| {
            warn!("[database] memory store lock was poisoned");
            poisoned.into_inner()
        })
    }

    fn write(&self) -> RwLockWriteGuard<'_, Tables> {
        self.tables.write().unwrap_or_else(|poisoned| {
            warn!("[database] memory store lock was poisoned");
            poisoned.into_inner()
        })
    }
}

impl Store for MemoryStore {
    fn create_user(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut tables = self.write();
        if tables.users.iter().any(|user| user.email == account.email) {
            return Err(StoreError::Duplicate("email"));
        }

        let now = Utc::now().naive_utc();
        let created = Account {
            id: Uuid::new_v4(),
            name: account.name,
            email: account.email,
            password: account.password,
            phone: account.phone,
            address: account.address,
            role: account.role,
            restaurant_name: account.restaurant_name,
            restaurant_address: account.restaurant_address,
            license_plate: account.license_plate,
            photo: account.photo,
            latlong: account.latlong,
            created_at: now,
            updated_at: now,
        };
        tables.users.push(created.clone());
        Ok(created)
    }

    fn query_user(&self, id: &Uuid) -> Result<Option<Account>, StoreError> {
        Ok(self.read().users.iter().find(|user| &user.id == id).cloned())
    }

    fn query_user_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        Ok(self
            .read()
            .users
            .iter()
            .find(|user| user.email == email)
            .cloned())
    }

    fn list_users(&self, role: Role) -> Result<Vec<Account>, StoreError> {
        Ok(self
            .read()
            .users
            .iter()
            .filter(|user| user.role == role)
            .cloned()
            .collect())
    }

    fn set_latlong(&self, id: &Uuid, latlong: &str) -> Result<Option<Account>, StoreError> {
        let mut tables = self.write();
        Ok(tables
            .users
            .iter_mut()
            .find(|user| &user.id == id)
            .map(|user| {
                user.latlong = Some(latlong.to_owned());
                user.updated_at = Utc::now().naive_utc();
                user.clone()
            }))
    }

    fn create_token(&self, user_id: &Uuid, token: &str) -> Result<(), StoreError> {
        let mut tables = self.write();
        if tables.tokens.contains_key(token) {
            return Err(StoreError::Duplicate("token"));
        }
        tables.tokens.insert(token.to_owned(), *user_id);
        Ok(())
    }

    fn query_user_by_token(&self, token: &str) -> Result<Option<Account>, StoreError> {
        let tables = self.read();
        Ok(tables
            .tokens
            .get(token)
            .and_then(|id| tables.users.iter().find(|user| &user.id == id))
            .cloned())
    }

    fn delete_token(&self, token: &str) -> Result<bool, StoreError> {
        Ok(self.write().tokens.remove(token).is_some())
    }

    fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let now = Utc::now().naive_utc();
        let created = Product {
            id: Uuid::new_v4(),
            name: product.fields.name,
            description: product.fields.description,
            price: product.fields.price,
            stock: product.fields.stock,
            is_available: product.fields.is_available,
            is_favorite: product.fields.is_favorite,
            image: product.image,
            user_id: product.user_id,
            created_at: now,
            updated_at: now,
        };
        self.write().products.push(created.clone());
        Ok(created)
    }

    fn query_product(&self, id: &Uuid) -> Result<Option<Product>, StoreError> {
        Ok(self
            .read()
            .products
            .iter()
            .find(|product| &product.id == id)
            .cloned())
    }

    fn list_products(&self, owner: &Uuid) -> Result<Vec<Product>, StoreError> {
        Ok(self
            .read()
            .products
            .iter()
            .filter(|product| &product.user_id == owner)
            .cloned()
            .collect())
    }

    fn update_product(
        &self,
        id: &Uuid,
        fields: &ProductFields,
    ) -> Result<Option<Product>, StoreError> {
        let mut tables = self.write();
        Ok(tables
            .products
            .iter_mut()
            .find(|product| &product.id == id)
            .map(|product| {
                product.name = fields.name.clone();
                product.description = fields.description.clone();
                product.price = fields.price;
                product.stock = fields.stock;
                product.is_available = fields.is_available;
                product.is_favorite = fields.is_favorite;
                product.updated_at = Utc::now().naive_utc();
                product.clone()
            }))
    }

    fn delete_product(&self, id: &Uuid) -> Result<bool, StoreError> {
        let mut tables = self.write();
        let before = tables.products.len();
        tables.products.retain(|product| &product.id != id);
        Ok(tables.products.len() < before)
    }
}
