pub mod memory;
pub mod models;

pub use memory::MemoryStore;
pub use models::{Account, NewAccount, NewProduct, Product, ProductFields, ProductWithOwner, Role};

use crate::schema::{access_tokens, products, users};
use crate::structs::PostgresConfig;

use chrono::{NaiveDateTime, Utc};
use diesel::connection::SimpleConnection;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool, PooledConnection};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use log::{debug, info};
use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate value for {0}")]
    Duplicate(&'static str),

    #[error("query failed: {0}")]
    Query(#[from] DieselError),

    #[error("connection pool: {0}")]
    Pool(#[from] r2d2::Error),

    #[error("corrupt row: {0}")]
    Corrupt(String),
}

/// Persistence seam used by the account and catalog services.
///
/// Calls are blocking; handlers run them on the actix blocking pool.
pub trait Store: Send + Sync {
    fn create_user(&self, account: NewAccount) -> Result<Account, StoreError>;
    fn query_user(&self, id: &Uuid) -> Result<Option<Account>, StoreError>;
    fn query_user_by_email(&self, email: &str) -> Result<Option<Account>, StoreError>;
    fn list_users(&self, role: Role) -> Result<Vec<Account>, StoreError>;
    fn set_latlong(&self, id: &Uuid, latlong: &str) -> Result<Option<Account>, StoreError>;

    fn create_token(&self, user_id: &Uuid, token: &str) -> Result<(), StoreError>;
    fn query_user_by_token(&self, token: &str) -> Result<Option<Account>, StoreError>;
    /// Returns false if the token was not known.
    fn delete_token(&self, token: &str) -> Result<bool, StoreError>;

    fn create_product(&self, product: NewProduct) -> Result<Product, StoreError>;
    fn query_product(&self, id: &Uuid) -> Result<Option<Product>, StoreError>;
    fn list_products(&self, owner: &Uuid) -> Result<Vec<Product>, StoreError>;
    fn update_product(
        &self,
        id: &Uuid,
        fields: &ProductFields,
    ) -> Result<Option<Product>, StoreError>;
    fn delete_product(&self, id: &Uuid) -> Result<bool, StoreError>;
}

const CREATE_TABLES: &str = "
    CREATE TABLE IF NOT EXISTS users (
        id                  UUID PRIMARY KEY,
        name                TEXT NOT NULL,
        email               TEXT NOT NULL UNIQUE,
        password            TEXT NOT NULL,
        phone               TEXT NOT NULL,
        address             TEXT,
        role                TEXT NOT NULL,
        restaurant_name     TEXT,
        restaurant_address  TEXT,
        license_plate       TEXT,
        photo               TEXT,
        latlong             TEXT,
        created_at          TIMESTAMP NOT NULL,
        updated_at          TIMESTAMP NOT NULL
    );

    CREATE TABLE IF NOT EXISTS access_tokens (
        token               TEXT PRIMARY KEY,
        user_id             UUID REFERENCES users (id) ON DELETE CASCADE NOT NULL,
        created_at          TIMESTAMP NOT NULL
    );

    CREATE TABLE IF NOT EXISTS products (
        id                  UUID PRIMARY KEY,
        name                TEXT NOT NULL,
        description         TEXT NOT NULL,
        price               BIGINT NOT NULL CHECK (price >= 0),
        stock               BIGINT NOT NULL CHECK (stock >= 0),
        is_available        BOOLEAN NOT NULL,
        is_favorite         BOOLEAN NOT NULL,
        image               TEXT,
        user_id             UUID REFERENCES users (id) NOT NULL,
        created_at          TIMESTAMP NOT NULL,
        updated_at          TIMESTAMP NOT NULL
    );

    CREATE INDEX IF NOT EXISTS products_user_id ON products (user_id);
";

type PgPool = Pool<ConnectionManager<PgConnection>>;

pub struct PostgresStore {
    pool: PgPool,
}

#[derive(Queryable)]
struct UserRow {
    id: Uuid,
    name: String,
    email: String,
    password: String,
    phone: String,
    address: Option<String>,
    role: String,
    restaurant_name: Option<String>,
    restaurant_address: Option<String>,
    license_plate: Option<String>,
    photo: Option<String>,
    latlong: Option<String>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

impl TryFrom<UserRow> for Account {
    type Error = StoreError;

    fn try_from(row: UserRow) -> Result<Account, StoreError> {
        let role = Role::from_name(&row.role)
            .ok_or_else(|| StoreError::Corrupt(format!("unknown role {:?}", row.role)))?;

        Ok(Account {
            id: row.id,
            name: row.name,
            email: row.email,
            password: row.password,
            phone: row.phone,
            address: row.address,
            role,
            restaurant_name: row.restaurant_name,
            restaurant_address: row.restaurant_address,
            license_plate: row.license_plate,
            photo: row.photo,
            latlong: row.latlong,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Insertable)]
#[diesel(table_name = users)]
struct NewUserRow<'a> {
    id: Uuid,
    name: &'a str,
    email: &'a str,
    password: &'a str,
    phone: &'a str,
    address: Option<&'a str>,
    role: &'a str,
    restaurant_name: Option<&'a str>,
    restaurant_address: Option<&'a str>,
    license_plate: Option<&'a str>,
    photo: Option<&'a str>,
    latlong: Option<&'a str>,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

#[derive(Insertable)]
#[diesel(table_name = products)]
struct NewProductRow<'a> {
    id: Uuid,
    name: &'a str,
    description: &'a str,
    price: i64,
    stock: i64,
    is_available: bool,
    is_favorite: bool,
    image: Option<&'a str>,
    user_id: Uuid,
    created_at: NaiveDateTime,
    updated_at: NaiveDateTime,
}

fn unique_violation(err: DieselError, field: &'static str) -> StoreError {
    match err {
        DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
            StoreError::Duplicate(field)
        }
        other => StoreError::Query(other),
    }
}

fn into_accounts(rows: Vec<UserRow>) -> Result<Vec<Account>, StoreError> {
    rows.into_iter().map(Account::try_from).collect()
}

impl PostgresStore {
    pub fn connect(config: &PostgresConfig) -> Result<PostgresStore, StoreError> {
        info!(
            "[database] connecting to {} with pool size {}",
            config.redacted_url(),
            config.pool_size
        );
        let manager = ConnectionManager::<PgConnection>::new(config.url());
        let pool = Pool::builder().max_size(config.pool_size).build(manager)?;

        let store = PostgresStore { pool };
        store.create_tables()?;
        Ok(store)
    }

    fn connection(&self) -> Result<PooledConnection<ConnectionManager<PgConnection>>, StoreError> {
        Ok(self.pool.get()?)
    }

    pub fn create_tables(&self) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        conn.batch_execute(CREATE_TABLES)?;
        debug!("[database] tables ready");
        Ok(())
    }
}

impl Store for PostgresStore {
    fn create_user(&self, account: NewAccount) -> Result<Account, StoreError> {
        let mut conn = self.connection()?;
        let now = Utc::now().naive_utc();

        let row = NewUserRow {
            id: Uuid::new_v4(),
            name: &account.name,
            email: &account.email,
            password: &account.password,
            phone: &account.phone,
            address: account.address.as_deref(),
            role: account.role.as_str(),
            restaurant_name: account.restaurant_name.as_deref(),
            restaurant_address: account.restaurant_address.as_deref(),
            license_plate: account.license_plate.as_deref(),
            photo: account.photo.as_deref(),
            latlong: account.latlong.as_deref(),
            created_at: now,
            updated_at: now,
        };

        diesel::insert_into(users::table)
            .values(&row)
            .get_result::<UserRow>(&mut conn)
            .map_err(|e| unique_violation(e, "email"))?
            .try_into()
    }

    fn query_user(&self, id: &Uuid) -> Result<Option<Account>, StoreError> {
        let mut conn = self.connection()?;
        users::table
            .find(id)
            .first::<UserRow>(&mut conn)
            .optional()?
            .map(Account::try_from)
            .transpose()
    }

    fn query_user_by_email(&self, email: &str) -> Result<Option<Account>, StoreError> {
        let mut conn = self.connection()?;
        users::table
            .filter(users::email.eq(email))
            .first::<UserRow>(&mut conn)
            .optional()?
            .map(Account::try_from)
            .transpose()
    }

    fn list_users(&self, role: Role) -> Result<Vec<Account>, StoreError> {
        let mut conn = self.connection()?;
        let rows = users::table
            .filter(users::role.eq(role.as_str()))
            .order(users::created_at.asc())
            .load::<UserRow>(&mut conn)?;
        into_accounts(rows)
    }

    fn set_latlong(&self, id: &Uuid, latlong: &str) -> Result<Option<Account>, StoreError> {
        let mut conn = self.connection()?;
        diesel::update(users::table.find(id))
            .set((
                users::latlong.eq(latlong),
                users::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<UserRow>(&mut conn)
            .optional()?
            .map(Account::try_from)
            .transpose()
    }

    fn create_token(&self, user_id: &Uuid, token: &str) -> Result<(), StoreError> {
        let mut conn = self.connection()?;
        diesel::insert_into(access_tokens::table)
            .values((
                access_tokens::token.eq(token),
                access_tokens::user_id.eq(user_id),
                access_tokens::created_at.eq(Utc::now().naive_utc()),
            ))
            .execute(&mut conn)
            .map_err(|e| unique_violation(e, "token"))?;
        Ok(())
    }

    fn query_user_by_token(&self, token: &str) -> Result<Option<Account>, StoreError> {
        let mut conn = self.connection()?;
        access_tokens::table
            .inner_join(users::table)
            .filter(access_tokens::token.eq(token))
            .select(users::all_columns)
            .first::<UserRow>(&mut conn)
            .optional()?
            .map(Account::try_from)
            .transpose()
    }

    fn delete_token(&self, token: &str) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let deleted = diesel::delete(access_tokens::table.find(token)).execute(&mut conn)?;
        Ok(deleted > 0)
    }

    fn create_product(&self, product: NewProduct) -> Result<Product, StoreError> {
        let mut conn = self.connection()?;
        let now = Utc::now().naive_utc();

        let row = NewProductRow {
            id: Uuid::new_v4(),
            name: &product.fields.name,
            description: &product.fields.description,
            price: product.fields.price,
            stock: product.fields.stock,
            is_available: product.fields.is_available,
            is_favorite: product.fields.is_favorite,
            image: product.image.as_deref(),
            user_id: product.user_id,
            created_at: now,
            updated_at: now,
        };

        Ok(diesel::insert_into(products::table)
            .values(&row)
            .get_result::<Product>(&mut conn)?)
    }

    fn query_product(&self, id: &Uuid) -> Result<Option<Product>, StoreError> {
        let mut conn = self.connection()?;
        Ok(products::table
            .find(id)
            .first::<Product>(&mut conn)
            .optional()?)
    }

    fn list_products(&self, owner: &Uuid) -> Result<Vec<Product>, StoreError> {
        let mut conn = self.connection()?;
        Ok(products::table
            .filter(products::user_id.eq(owner))
            .order(products::created_at.asc())
            .load::<Product>(&mut conn)?)
    }

    fn update_product(
        &self,
        id: &Uuid,
        fields: &ProductFields,
    ) -> Result<Option<Product>, StoreError> {
        let mut conn = self.connection()?;
        Ok(diesel::update(products::table.find(id))
            .set((
                products::name.eq(&fields.name),
                products::description.eq(&fields.description),
                products::price.eq(fields.price),
                products::stock.eq(fields.stock),
                products::is_available.eq(fields.is_available),
                products::is_favorite.eq(fields.is_favorite),
                products::updated_at.eq(Utc::now().naive_utc()),
            ))
            .get_result::<Product>(&mut conn)
            .optional()?)
    }

    fn delete_product(&self, id: &Uuid) -> Result<bool, StoreError> {
        let mut conn = self.connection()?;
        let deleted = diesel::delete(products::table.find(id)).execute(&mut conn)?;
        Ok(deleted > 0)
    }
}
