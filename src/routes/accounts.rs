use super::auth::Authenticated;
use super::{input_of, success, success_data, success_message, AppState, Fields};
use crate::accounts::{self, Credentials, Registration};
use crate::error::ServiceError;
use crate::storage::PendingUpload;
use crate::validation::Input;

use actix_multipart::form::tempfile::TempFile;
use actix_multipart::form::text::Text;
use actix_multipart::form::MultipartForm;
use actix_web::{web, HttpResponse};

fn text(field: Option<Text<String>>) -> Option<String> {
    field.map(Text::into_inner)
}

#[derive(MultipartForm)]
pub struct RestaurantForm {
    name: Option<Text<String>>,
    email: Option<Text<String>>,
    password: Option<Text<String>>,
    phone: Option<Text<String>>,
    address: Option<Text<String>>,
    restaurant_name: Option<Text<String>>,
    restaurant_address: Option<Text<String>>,
    latlong: Option<Text<String>>,
    photo: Option<TempFile>,
}

#[derive(MultipartForm)]
pub struct DriverForm {
    name: Option<Text<String>>,
    email: Option<Text<String>>,
    password: Option<Text<String>>,
    phone: Option<Text<String>>,
    address: Option<Text<String>>,
    license_plate: Option<Text<String>>,
    photo: Option<TempFile>,
}

// POST /user/register
pub async fn register_user(
    state: web::Data<AppState>,
    body: Fields,
) -> Result<HttpResponse, ServiceError> {
    let input = input_of(body);
    let account = state
        .run(move |store, uploads| {
            let registration = Registration::customer(&input, store)?;
            accounts::register(store, uploads, registration, None)
        })
        .await?;

    Ok(success("User registered successfully", account))
}

// POST /restaurant/register
pub async fn register_restaurant(
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<RestaurantForm>,
) -> Result<HttpResponse, ServiceError> {
    let mut input = Input::new();
    input.insert_text("name", text(form.name));
    input.insert_text("email", text(form.email));
    input.insert_text("password", text(form.password));
    input.insert_text("phone", text(form.phone));
    input.insert_text("address", text(form.address));
    input.insert_text("restaurant_name", text(form.restaurant_name));
    input.insert_text("restaurant_address", text(form.restaurant_address));
    input.insert_text("latlong", text(form.latlong));
    let photo = form.photo.map(PendingUpload::from);

    let account = state
        .run(move |store, uploads| {
            let registration = Registration::restaurant(&input, photo.as_ref(), store)?;
            accounts::register(store, uploads, registration, photo)
        })
        .await?;

    Ok(success("Restaurant registered successfully", account))
}

// POST /driver/register
pub async fn register_driver(
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<DriverForm>,
) -> Result<HttpResponse, ServiceError> {
    let mut input = Input::new();
    input.insert_text("name", text(form.name));
    input.insert_text("email", text(form.email));
    input.insert_text("password", text(form.password));
    input.insert_text("phone", text(form.phone));
    input.insert_text("address", text(form.address));
    input.insert_text("license_plate", text(form.license_plate));
    let photo = form.photo.map(PendingUpload::from);

    let account = state
        .run(move |store, uploads| {
            let registration = Registration::driver(&input, photo.as_ref(), store)?;
            accounts::register(store, uploads, registration, photo)
        })
        .await?;

    Ok(success("Driver registered successfully", account))
}

// POST /login
pub async fn login(
    state: web::Data<AppState>,
    body: Fields,
) -> Result<HttpResponse, ServiceError> {
    let credentials = Credentials::from_input(&input_of(body))?;
    let session = state
        .run(move |store, _| accounts::login(store, &credentials))
        .await?;

    Ok(success("User logged in successfully", session))
}

// POST /logout
pub async fn logout(
    state: web::Data<AppState>,
    auth: Authenticated,
) -> Result<HttpResponse, ServiceError> {
    state
        .run(move |store, _| accounts::logout(store, &auth.token))
        .await?;

    Ok(success_message("User logged out successfully"))
}

// GET /user
pub async fn current_user(auth: Authenticated) -> Result<HttpResponse, ServiceError> {
    Ok(success_data(auth.account))
}

// PUT /update-latlong
pub async fn update_latlong(
    state: web::Data<AppState>,
    auth: Authenticated,
    body: Fields,
) -> Result<HttpResponse, ServiceError> {
    let latlong = accounts::latlong_from_input(&input_of(body))?;
    let account = state
        .run(move |store, _| accounts::update_location(store, &auth.account, &latlong))
        .await?;

    Ok(success("Latlong updated successfully", account))
}

// GET /restaurant
pub async fn restaurants(
    state: web::Data<AppState>,
    _auth: Authenticated,
) -> Result<HttpResponse, ServiceError> {
    let restaurants = state
        .run(|store, _| accounts::list_restaurants(store))
        .await?;

    Ok(success("Get all restaurant", restaurants))
}

#[cfg(test)]
mod tests {
    use super::super::testing::{bearer, call, customer_payload, multipart, state};
    use super::super::configure;

    use actix_web::http::header;
    use actix_web::{test, App};
    use serde_json::json;

    #[actix_web::test]
    async fn register_then_duplicate_email() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(customer_payload("a@x.com"))
        );
        assert_eq!(status, 200);
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["role"], "user");
        assert!(body["data"].get("password").is_none());

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(customer_payload("a@x.com"))
        );
        assert_eq!(status, 422);
        assert_eq!(body["status"], "error");
        assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
    }

    #[actix_web::test]
    async fn email_case_does_not_make_a_new_account() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(customer_payload("a@x.com"))
        );
        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(customer_payload("A@X.com"))
        );
        assert_eq!(status, 422);
        assert_eq!(body["errors"]["email"][0], "The email has already been taken.");

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "email": "A@x.COM", "password": "pw" }))
        );
        assert_eq!(status, 200);
        assert_eq!(body["data"]["user"]["email"], "a@x.com");
    }

    #[actix_web::test]
    async fn taken_email_reported_with_missing_fields() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(customer_payload("a@x.com"))
        );
        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(json!({ "name": "B", "email": "a@x.com", "password": "pw" }))
        );
        assert_eq!(status, 422);
        assert_eq!(body["errors"]["email"][0], "The email has already been taken.");
        assert_eq!(body["errors"]["phone"][0], "The phone field is required.");
        assert_eq!(body["errors"]["address"][0], "The address field is required.");
    }

    #[actix_web::test]
    async fn non_multipart_registration_is_json_error() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/restaurant/register")
                .set_json(customer_payload("r@x.com"))
        );
        assert_eq!(status, 400);
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Malformed multipart payload");
    }

    #[actix_web::test]
    async fn form_encoded_login_and_latlong() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (status, _) = call!(
            app,
            test::TestRequest::post().uri("/user/register").set_form(vec![
                ("name", "A"),
                ("email", "a@x.com"),
                ("password", "pw"),
                ("phone", "1"),
                ("address", "addr"),
            ])
        );
        assert_eq!(status, 200);

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/login")
                .set_form(vec![("email", "a@x.com"), ("password", "pw")])
        );
        assert_eq!(status, 200);
        let token = body["data"]["token"].as_str().unwrap().to_owned();

        let (status, body) = call!(
            app,
            test::TestRequest::put()
                .uri("/update-latlong")
                .insert_header(bearer(&token))
                .set_form(vec![("latlong", "1,2")])
        );
        assert_eq!(status, 200);
        assert_eq!(body["data"]["latlong"], "1,2");
    }

    #[actix_web::test]
    async fn malformed_json_is_json_error() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/login")
                .insert_header((header::CONTENT_TYPE, "application/json"))
                .set_payload("{\"email\": ")
        );
        assert_eq!(status, 400);
        assert_eq!(body["message"], "Malformed JSON payload");
    }

    #[actix_web::test]
    async fn login_token_authenticates_until_logout() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(customer_payload("a@x.com"))
        );
        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "email": "a@x.com", "password": "pw" }))
        );
        assert_eq!(status, 200);
        let token = body["data"]["token"].as_str().unwrap().to_owned();
        assert_eq!(body["data"]["user"]["email"], "a@x.com");

        let (status, body) = call!(
            app,
            test::TestRequest::get().uri("/user").insert_header(bearer(&token))
        );
        assert_eq!(status, 200);
        assert_eq!(body["data"]["email"], "a@x.com");

        let (status, _) = call!(
            app,
            test::TestRequest::post().uri("/logout").insert_header(bearer(&token))
        );
        assert_eq!(status, 200);

        for request in [
            test::TestRequest::get().uri("/user"),
            test::TestRequest::get().uri("/restaurant"),
            test::TestRequest::get().uri("/products"),
            test::TestRequest::post().uri("/logout"),
        ] {
            let (status, body) = call!(app, request.insert_header(bearer(&token)));
            assert_eq!(status, 401);
            assert_eq!(body["status"], "error");
        }
    }

    #[actix_web::test]
    async fn authentication_failures_are_401() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (status, body) = call!(app, test::TestRequest::get().uri("/user"));
        assert_eq!(status, 401);
        assert_eq!(body["message"], "Unauthenticated.");

        let (status, _) = call!(
            app,
            test::TestRequest::get().uri("/user").insert_header(bearer("made-up"))
        );
        assert_eq!(status, 401);

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "email": "nobody@x.com", "password": "pw" }))
        );
        assert_eq!(status, 401);
        assert_eq!(body["message"], "Invalid credentials");
    }

    #[actix_web::test]
    async fn login_validates_fields() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "email": "not-an-email" }))
        );
        assert_eq!(status, 422);
        assert_eq!(body["errors"]["email"][0], "Please enter a valid email address.");
        assert_eq!(body["errors"]["password"][0], "The password field is required.");
    }

    #[actix_web::test]
    async fn restaurant_registration_with_photo() {
        let state = state();
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        let (content_type, payload) = multipart(&[
            ("name", "Budi"),
            ("email", "warung@x.com"),
            ("password", "pw"),
            ("phone", "0812"),
            ("restaurant_name", "Warung Budi"),
            ("restaurant_address", "Jl. Sudirman 5"),
            ("latlong", "-6.2,106.8"),
            ("photo", "front.png"),
        ]);
        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/restaurant/register")
                .insert_header((header::CONTENT_TYPE, content_type))
                .set_payload(payload)
        );
        assert_eq!(status, 200, "{}", body);
        assert_eq!(body["data"]["role"], "restaurant");
        assert_eq!(body["data"]["restaurant_name"], "Warung Budi");

        let photo = body["data"]["photo"].as_str().unwrap();
        assert!(photo.ends_with(".png"));
        assert_ne!(photo, "front.png");
        assert!(state
            .uploads
            .path_of(crate::storage::UploadKind::Photo, photo)
            .exists());
    }

    #[actix_web::test]
    async fn driver_registration_reports_missing_fields() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (content_type, payload) = multipart(&[
            ("name", "Joko"),
            ("email", "joko@x.com"),
            ("password", "pw"),
        ]);
        let (status, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/driver/register")
                .insert_header((header::CONTENT_TYPE, content_type))
                .set_payload(payload)
        );
        assert_eq!(status, 422);
        assert_eq!(body["errors"]["phone"][0], "The phone field is required.");
        assert_eq!(
            body["errors"]["license_plate"][0],
            "The license plate field is required."
        );
        assert_eq!(body["errors"]["photo"][0], "The photo field is required.");
    }

    #[actix_web::test]
    async fn update_latlong_and_list_restaurants() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        call!(
            app,
            test::TestRequest::post()
                .uri("/user/register")
                .set_json(customer_payload("a@x.com"))
        );
        let (_, body) = call!(
            app,
            test::TestRequest::post()
                .uri("/login")
                .set_json(json!({ "email": "a@x.com", "password": "pw" }))
        );
        let token = body["data"]["token"].as_str().unwrap().to_owned();

        let (status, body) = call!(
            app,
            test::TestRequest::put()
                .uri("/update-latlong")
                .insert_header(bearer(&token))
                .set_json(json!({}))
        );
        assert_eq!(status, 422);
        assert_eq!(body["errors"]["latlong"][0], "The latlong field is required.");

        let (status, body) = call!(
            app,
            test::TestRequest::put()
                .uri("/update-latlong")
                .insert_header(bearer(&token))
                .set_json(json!({ "latlong": "-7.25,112.75" }))
        );
        assert_eq!(status, 200);
        assert_eq!(body["data"]["latlong"], "-7.25,112.75");

        let (status, body) = call!(
            app,
            test::TestRequest::get().uri("/restaurant").insert_header(bearer(&token))
        );
        assert_eq!(status, 200);
        assert_eq!(body["data"], json!([]));
    }
}
