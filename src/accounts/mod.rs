//! Registration, login and profile operations for customer, restaurant and
//! driver accounts.

use crate::database::{Account, NewAccount, Role, Store, StoreError};
use crate::error::{FieldErrors, ServiceError};
use crate::storage::{PendingUpload, UploadKind, Uploads};
use crate::validation::{Input, Validator};

use argon2::password_hash::rand_core::OsRng;
use argon2::password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;
use log::{debug, info, warn};
use serde::Serialize;
use uuid::Uuid;

/// Validated registration request. Role specific fields are `None` for the
/// roles that do not use them.
#[derive(Debug, Clone)]
pub struct Registration {
    pub role: Role,
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    pub address: Option<String>,
    pub restaurant_name: Option<String>,
    pub restaurant_address: Option<String>,
    pub license_plate: Option<String>,
    pub latlong: Option<String>,
}

const EMAIL_TAKEN: &str = "The email has already been taken.";

/// Valid email that no account uses yet.
fn unused_email(v: &mut Validator, store: &dyn Store) -> Result<Option<String>, ServiceError> {
    let email = match v.required_email("email") {
        Some(email) => email,
        None => return Ok(None),
    };
    if store.query_user_by_email(&email)?.is_some() {
        v.reject("email", EMAIL_TAKEN);
        return Ok(None);
    }
    Ok(Some(email))
}

/// The builders look up the email in `store` so that a taken address is
/// reported together with every other field error.
impl Registration {
    pub fn customer(input: &Input, store: &dyn Store) -> Result<Registration, ServiceError> {
        let mut v = Validator::new(input);
        let name = v.required_string("name");
        let email = unused_email(&mut v, store)?;
        let password = v.required_string("password");
        let phone = v.required_string("phone");
        let address = v.required_string("address");

        let registration = || {
            Some(Registration {
                role: Role::Customer,
                name: name?,
                email: email?,
                password: password?,
                phone: phone?,
                address: Some(address?),
                restaurant_name: None,
                restaurant_address: None,
                license_plate: None,
                latlong: None,
            })
        };
        v.finish(registration())
    }

    pub fn restaurant(
        input: &Input,
        photo: Option<&PendingUpload>,
        store: &dyn Store,
    ) -> Result<Registration, ServiceError> {
        let mut v = Validator::new(input);
        let name = v.required_string("name");
        let email = unused_email(&mut v, store)?;
        let password = v.required_string("password");
        let phone = v.required_string("phone");
        let address = v.optional_string("address");
        let restaurant_name = v.required_string("restaurant_name");
        let restaurant_address = v.required_string("restaurant_address");
        v.required_image("photo", photo);
        let latlong = v.required_string("latlong");

        let registration = || {
            Some(Registration {
                role: Role::Restaurant,
                name: name?,
                email: email?,
                password: password?,
                phone: phone?,
                address,
                restaurant_name: Some(restaurant_name?),
                restaurant_address: Some(restaurant_address?),
                license_plate: None,
                latlong: Some(latlong?),
            })
        };
        v.finish(registration())
    }

    pub fn driver(
        input: &Input,
        photo: Option<&PendingUpload>,
        store: &dyn Store,
    ) -> Result<Registration, ServiceError> {
        let mut v = Validator::new(input);
        let name = v.required_string("name");
        let email = unused_email(&mut v, store)?;
        let password = v.required_string("password");
        let phone = v.required_string("phone");
        let address = v.optional_string("address");
        let license_plate = v.required_string("license_plate");
        v.required_image("photo", photo);

        let registration = || {
            Some(Registration {
                role: Role::Driver,
                name: name?,
                email: email?,
                password: password?,
                phone: phone?,
                address,
                restaurant_name: None,
                restaurant_address: None,
                license_plate: Some(license_plate?),
                latlong: None,
            })
        };
        v.finish(registration())
    }
}

#[derive(Debug)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    pub fn from_input(input: &Input) -> Result<Credentials, ServiceError> {
        let mut v = Validator::new(input);
        let email = v.required_email("email");
        let password = v.required_string("password");
        v.finish(email.zip(password))
            .map(|(email, password)| Credentials { email, password })
    }
}

pub fn latlong_from_input(input: &Input) -> Result<String, ServiceError> {
    let mut v = Validator::new(input);
    let latlong = v.required_string("latlong");
    v.finish(latlong)
}

/// Returned by a successful login.
#[derive(Serialize, Debug)]
pub struct Session {
    pub user: Account,
    pub token: String,
}

fn email_taken() -> ServiceError {
    ServiceError::Validation(FieldErrors::single("email", EMAIL_TAKEN))
}

fn hash_password(password: &str) -> Result<String, ServiceError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| ServiceError::Hashing(e.to_string()))
}

fn verify_password(password: &str, hash: &str) -> bool {
    match PasswordHash::new(hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            warn!("[accounts] stored password hash is unreadable: {}", e);
            false
        }
    }
}

fn new_token() -> String {
    format!("{}{}", Uuid::new_v4().simple(), Uuid::new_v4().simple())
}

/// Persists a new account. The photo is written to disk first and removed
/// again if the account cannot be stored.
pub fn register(
    store: &dyn Store,
    uploads: &Uploads,
    registration: Registration,
    photo: Option<PendingUpload>,
) -> Result<Account, ServiceError> {
    let password = hash_password(&registration.password)?;
    let photo = match photo {
        Some(upload) => Some(uploads.save(UploadKind::Photo, &upload)?),
        None => None,
    };

    let account = NewAccount {
        name: registration.name,
        email: registration.email,
        password,
        phone: registration.phone,
        address: registration.address,
        role: registration.role,
        restaurant_name: registration.restaurant_name,
        restaurant_address: registration.restaurant_address,
        license_plate: registration.license_plate,
        photo: photo.clone(),
        latlong: registration.latlong,
    };

    let account = match store.create_user(account) {
        Ok(account) => account,
        Err(e) => {
            if let Some(name) = &photo {
                uploads.remove(UploadKind::Photo, name);
            }
            // a concurrent registration can still win the race for the address
            return Err(match e {
                StoreError::Duplicate("email") => email_taken(),
                other => ServiceError::Store(other),
            });
        }
    };

    info!(
        "[accounts] registered {} account {}",
        account.role.as_str(),
        account.id
    );
    Ok(account)
}

/// Every successful login mints a fresh token; earlier tokens stay valid.
pub fn login(store: &dyn Store, credentials: &Credentials) -> Result<Session, ServiceError> {
    let user = match store.query_user_by_email(&credentials.email)? {
        Some(user) if verify_password(&credentials.password, &user.password) => user,
        _ => {
            debug!("[accounts] rejected login for {}", credentials.email);
            return Err(ServiceError::InvalidCredentials);
        }
    };

    let token = new_token();
    store.create_token(&user.id, &token)?;
    info!("[accounts] account {} logged in", user.id);

    Ok(Session { user, token })
}

pub fn authenticate(store: &dyn Store, token: &str) -> Result<Account, ServiceError> {
    store
        .query_user_by_token(token)?
        .ok_or(ServiceError::Unauthenticated)
}

/// Revokes exactly the presented token.
pub fn logout(store: &dyn Store, token: &str) -> Result<(), ServiceError> {
    if !store.delete_token(token)? {
        return Err(ServiceError::Unauthenticated);
    }
    debug!("[accounts] token revoked");
    Ok(())
}

pub fn update_location(
    store: &dyn Store,
    account: &Account,
    latlong: &str,
) -> Result<Account, ServiceError> {
    store
        .set_latlong(&account.id, latlong)?
        .ok_or(ServiceError::Unauthenticated)
}

pub fn list_restaurants(store: &dyn Store) -> Result<Vec<Account>, ServiceError> {
    Ok(store.list_users(Role::Restaurant)?)
}
