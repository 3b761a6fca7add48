use chrono::NaiveDateTime;
use diesel::Queryable;
use serde::Serialize;
use uuid::Uuid;

/// Fixed at registration, never changed afterwards.
#[derive(Serialize, Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    #[serde(rename = "user")]
    Customer,
    #[serde(rename = "restaurant")]
    Restaurant,
    #[serde(rename = "driver")]
    Driver,
}

impl Role {
    pub fn from_name(name: &str) -> Option<Role> {
        match name {
            "user" => Some(Role::Customer),
            "restaurant" => Some(Role::Restaurant),
            "driver" => Some(Role::Driver),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Customer => "user",
            Role::Restaurant => "restaurant",
            Role::Driver => "driver",
        }
    }
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password: String,
    pub phone: String,
    pub address: Option<String>,
    pub role: Role,
    pub restaurant_name: Option<String>,
    pub restaurant_address: Option<String>,
    pub license_plate: Option<String>,
    pub photo: Option<String>,
    pub latlong: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Account {
    pub fn is_restaurant(&self) -> bool {
        self.role == Role::Restaurant
    }
}

/// Everything needed to persist an account; `password` is already hashed.
#[derive(Debug, Clone)]
pub struct NewAccount {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: Option<String>,
    pub role: Role,
    pub restaurant_name: Option<String>,
    pub restaurant_address: Option<String>,
    pub license_plate: Option<String>,
    pub photo: Option<String>,
    pub latlong: Option<String>,
}

#[derive(Serialize, Queryable, Debug, Clone, PartialEq)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i64,
    pub is_available: bool,
    pub is_favorite: bool,
    pub image: Option<String>,
    pub user_id: Uuid,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// Editable product fields, shared by create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductFields {
    pub name: String,
    pub description: String,
    pub price: i64,
    pub stock: i64,
    pub is_available: bool,
    pub is_favorite: bool,
}

#[derive(Debug, Clone)]
pub struct NewProduct {
    pub fields: ProductFields,
    pub image: Option<String>,
    pub user_id: Uuid,
}

/// Product as listed to clients, with its owning restaurant attached.
#[derive(Serialize, Debug, Clone)]
pub struct ProductWithOwner {
    #[serde(flatten)]
    pub product: Product,
    pub user: Option<Account>,
}
