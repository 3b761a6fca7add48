pub mod accounts;
pub mod auth;
pub mod orders;
pub mod products;

use crate::database::Store;
use crate::error::ServiceError;
use crate::storage::Uploads;
use crate::validation::Input;

use actix_multipart::form::MultipartFormConfig;
use actix_web::error::InternalError;
use actix_web::{web, Either, HttpResponse};
use serde::Serialize;
use serde_json::{Map, Value};

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared by every worker.
pub struct AppState {
    pub store: Arc<dyn Store>,
    pub uploads: Uploads,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, uploads: Uploads) -> AppState {
        AppState { store, uploads }
    }

    /// Runs a store operation on the blocking thread pool.
    pub async fn run<F, T>(&self, operation: F) -> Result<T, ServiceError>
    where
        F: FnOnce(&dyn Store, &Uploads) -> Result<T, ServiceError> + Send + 'static,
        T: Send + 'static,
    {
        let store = self.store.clone();
        let uploads = self.uploads.clone();
        web::block(move || operation(&*store, &uploads)).await?
    }
}

#[derive(Serialize)]
pub struct Response<T: Serialize> {
    status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    message: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
}

pub fn success<T: Serialize>(message: &'static str, data: T) -> HttpResponse {
    HttpResponse::Ok().json(Response {
        status: "success",
        message: Some(message),
        data: Some(data),
    })
}

pub fn success_data<T: Serialize>(data: T) -> HttpResponse {
    HttpResponse::Ok().json(Response {
        status: "success",
        message: None,
        data: Some(data),
    })
}

pub fn success_message(message: &'static str) -> HttpResponse {
    HttpResponse::Ok().json(Response::<()> {
        status: "success",
        message: Some(message),
        data: None,
    })
}

/// Request fields sent either as a JSON object or url-encoded.
pub type Fields = Either<web::Json<Map<String, Value>>, web::Form<HashMap<String, String>>>;

pub fn input_of(fields: Fields) -> Input {
    match fields {
        Either::Left(json) => Input::from_json(json.into_inner()),
        Either::Right(form) => Input::from_form(form.into_inner()),
    }
}

fn malformed<E>(err: E, message: &'static str) -> actix_web::Error
where
    E: fmt::Debug + fmt::Display + 'static,
{
    let response = HttpResponse::BadRequest().json(Response::<()> {
        status: "error",
        message: Some(message),
        data: None,
    });
    InternalError::from_response(err, response).into()
}

fn json_config() -> web::JsonConfig {
    web::JsonConfig::default().error_handler(|err, _req| malformed(err, "Malformed JSON payload"))
}

fn query_config() -> web::QueryConfig {
    web::QueryConfig::default().error_handler(|err, _req| malformed(err, "Malformed query string"))
}

fn multipart_config() -> MultipartFormConfig {
    MultipartFormConfig::default()
        .error_handler(|err, _req| malformed(err, "Malformed multipart payload"))
}

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.app_data(json_config())
        .app_data(query_config())
        .app_data(multipart_config())
        .route("/user", web::get().to(accounts::current_user))
        .route("/user/register", web::post().to(accounts::register_user))
        .route(
            "/restaurant/register",
            web::post().to(accounts::register_restaurant),
        )
        .route("/driver/register", web::post().to(accounts::register_driver))
        .route("/login", web::post().to(accounts::login))
        .route("/logout", web::post().to(accounts::logout))
        .route("/update-latlong", web::put().to(accounts::update_latlong))
        .route("/restaurant", web::get().to(accounts::restaurants))
        .service(
            web::resource("/products")
                .route(web::get().to(products::index))
                .route(web::post().to(products::store)),
        )
        .service(
            web::resource("/products/{id}")
                .route(web::get().to(products::show))
                .route(web::put().to(products::update))
                .route(web::delete().to(products::destroy)),
        )
        .route("/order", web::post().to(orders::create_order))
        .route("/order/user", web::get().to(orders::order_history))
        .route("/order/restaurant", web::get().to(orders::restaurant_orders))
        .route("/order/driver", web::get().to(orders::driver_orders))
        .route(
            "/order/restaurant/update-status/{id}",
            web::put().to(orders::update_restaurant_status),
        )
        .route(
            "/order/driver/update-status/{id}",
            web::put().to(orders::update_driver_status),
        )
        .route(
            "/order/user/update-status/{id}",
            web::put().to(orders::update_purchase_status),
        );
}
