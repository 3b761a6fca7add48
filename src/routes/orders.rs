//! Order endpoints. Callers are checked against the role each endpoint serves;
//! the order workflow itself is not offered by this server, so every request
//! that passes the check is answered with 501.

use super::auth::Authenticated;
use crate::database::Role;
use crate::error::ServiceError;

use actix_web::{web, HttpResponse};
use log::debug;

fn require_role(auth: &Authenticated, role: Role) -> Result<(), ServiceError> {
    if auth.account.role != role {
        return Err(ServiceError::Forbidden(match role {
            Role::Customer => "Only customer accounts can use this endpoint",
            Role::Restaurant => "Only restaurant accounts can use this endpoint",
            Role::Driver => "Only driver accounts can use this endpoint",
        }));
    }
    Ok(())
}

fn unavailable(auth: &Authenticated, operation: &str) -> Result<HttpResponse, ServiceError> {
    debug!("[orders] {} requested by {}", operation, auth.account.id);
    Err(ServiceError::NotImplemented("Order service is not available"))
}

// POST /order
pub async fn create_order(auth: Authenticated) -> Result<HttpResponse, ServiceError> {
    require_role(&auth, Role::Customer)?;
    unavailable(&auth, "create order")
}

// GET /order/user
pub async fn order_history(auth: Authenticated) -> Result<HttpResponse, ServiceError> {
    require_role(&auth, Role::Customer)?;
    unavailable(&auth, "order history")
}

// GET /order/restaurant
pub async fn restaurant_orders(auth: Authenticated) -> Result<HttpResponse, ServiceError> {
    require_role(&auth, Role::Restaurant)?;
    unavailable(&auth, "restaurant orders")
}

// GET /order/driver
pub async fn driver_orders(auth: Authenticated) -> Result<HttpResponse, ServiceError> {
    require_role(&auth, Role::Driver)?;
    unavailable(&auth, "driver orders")
}

// PUT /order/restaurant/update-status/{id}
pub async fn update_restaurant_status(
    auth: Authenticated,
    _id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    require_role(&auth, Role::Restaurant)?;
    unavailable(&auth, "restaurant status update")
}

// PUT /order/driver/update-status/{id}
pub async fn update_driver_status(
    auth: Authenticated,
    _id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    require_role(&auth, Role::Driver)?;
    unavailable(&auth, "driver status update")
}

// PUT /order/user/update-status/{id}
pub async fn update_purchase_status(
    auth: Authenticated,
    _id: web::Path<String>,
) -> Result<HttpResponse, ServiceError> {
    require_role(&auth, Role::Customer)?;
    unavailable(&auth, "purchase status update")
}

#[cfg(test)]
mod tests {
    use super::super::testing::{bearer, call, state};
    use super::super::{configure, AppState};
    use crate::accounts::{self, Credentials, Registration};
    use crate::database::Role;

    use actix_web::{test, web, App};

    fn token_for(state: &web::Data<AppState>, email: &str, role: Role) -> String {
        let registration = Registration {
            role,
            name: String::from("N"),
            email: email.to_owned(),
            password: String::from("pw"),
            phone: String::from("1"),
            address: None,
            restaurant_name: None,
            restaurant_address: None,
            license_plate: None,
            latlong: None,
        };
        accounts::register(&*state.store, &state.uploads, registration, None).unwrap();
        accounts::login(
            &*state.store,
            &Credentials {
                email: email.to_owned(),
                password: String::from("pw"),
            },
        )
        .unwrap()
        .token
    }

    #[actix_web::test]
    async fn orders_require_authentication() {
        let app = test::init_service(App::new().app_data(state()).configure(configure)).await;

        let (status, body) = call!(app, test::TestRequest::post().uri("/order"));
        assert_eq!(status, 401);
        assert_eq!(body["message"], "Unauthenticated.");
    }

    #[actix_web::test]
    async fn wrong_role_is_forbidden() {
        let state = state();
        let customer = token_for(&state, "c@x.com", Role::Customer);
        let driver = token_for(&state, "d@x.com", Role::Driver);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        for (request, token) in [
            (test::TestRequest::get().uri("/order/restaurant"), &customer),
            (test::TestRequest::get().uri("/order/driver"), &customer),
            (test::TestRequest::post().uri("/order"), &driver),
            (
                test::TestRequest::put().uri("/order/restaurant/update-status/1"),
                &driver,
            ),
            (test::TestRequest::put().uri("/order/user/update-status/1"), &driver),
        ] {
            let (status, body) = call!(app, request.insert_header(bearer(token)));
            assert_eq!(status, 403);
            assert_eq!(body["status"], "error");
        }
    }

    #[actix_web::test]
    async fn permitted_roles_get_not_implemented() {
        let state = state();
        let customer = token_for(&state, "c@x.com", Role::Customer);
        let restaurant = token_for(&state, "r@x.com", Role::Restaurant);
        let driver = token_for(&state, "d@x.com", Role::Driver);
        let app = test::init_service(App::new().app_data(state.clone()).configure(configure)).await;

        for (request, token) in [
            (test::TestRequest::post().uri("/order"), &customer),
            (test::TestRequest::get().uri("/order/user"), &customer),
            (test::TestRequest::put().uri("/order/user/update-status/7"), &customer),
            (test::TestRequest::get().uri("/order/restaurant"), &restaurant),
            (
                test::TestRequest::put().uri("/order/restaurant/update-status/7"),
                &restaurant,
            ),
            (test::TestRequest::get().uri("/order/driver"), &driver),
            (test::TestRequest::put().uri("/order/driver/update-status/7"), &driver),
        ] {
            let (status, body) = call!(app, request.insert_header(bearer(token)));
            assert_eq!(status, 501);
            assert_eq!(body["message"], "Order service is not available");
        }
    }
}
