#[macro_use]
extern crate rocket;
#[macro_use]
extern crate log;

mod config;
mod db;
mod guards;
mod models;
mod routes;
mod services;
mod utils;

use dotenvy::dotenv;
use rocket::fairing::{Fairing, Info, Kind};
use rocket::http::Header;
use rocket::{Build, Request, Response, Rocket};
use rocket_okapi::openapi_get_routes;
use rocket_okapi::swagger_ui::{SwaggerUIConfig, make_swagger_ui};

/* ----------------------------- CORS ----------------------------- */

pub struct CORS;

#[rocket::async_trait]
impl Fairing for CORS {
    fn info(&self) -> Info {
        Info {
            name: "CORS",
            kind: Kind::Response,
        }
    }

    async fn on_response<'r>(&self, request: &'r Request<'_>, response: &mut Response<'r>) {
        if let Some(origin) = request.headers().get_one("Origin") {
            response.set_header(Header::new("Access-Control-Allow-Origin", origin));
        }

        response.set_header(Header::new(
            "Access-Control-Allow-Methods",
            "GET, POST, PUT, DELETE, OPTIONS",
        ));

        response.set_header(Header::new(
            "Access-Control-Allow-Headers",
            "Content-Type, Authorization",
        ));

        response.set_header(Header::new("Access-Control-Allow-Credentials", "true"));
    }
}

/* ----------------------------- OPTIONS ----------------------------- */

#[options("/<_..>")]
fn options_handler() {}

/* ----------------------------- ERRORS ----------------------------- */

#[catch(404)]
fn not_found() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Resource not found (check /api/v1 prefix)"
    })
}

#[catch(500)]
fn internal_error() -> rocket::serde::json::Value {
    rocket::serde::json::json!({
        "success": false,
        "message": "Internal server error"
    })
}

/* ----------------------------- SWAGGER ----------------------------- */

fn swagger_config() -> SwaggerUIConfig {
    SwaggerUIConfig {
        url: "/api/v1/openapi.json".to_string(),
        ..Default::default()
    }
}

/* ----------------------------- LAUNCH ----------------------------- */

#[launch]
fn rocket() -> Rocket<Build> {
    dotenv().ok();
    env_logger::init();

    if !config::Config::is_khalti_enabled() {
        warn!("Khalti secret key not configured; payment routes will fail");
    }

    println!("🏠 GharBhada API running");
    println!("📚 Swagger UI → http://localhost:8000/api/docs");

    rocket::build()
        .attach(db::init())
        .attach(CORS)
        .mount("/", routes![options_handler])
        .mount(
            "/api/v1",
            openapi_get_routes![
                // Auth
                routes::auth::register,
                routes::auth::login,
                routes::auth::refresh_token,
                // Listings
                routes::listing::create_listing,
                routes::listing::get_listing,
                routes::listing::search_listings,
                routes::listing::get_listings_by_owner,
                routes::listing::update_listing,
                routes::listing::delete_listing,
                // Bookings
                routes::booking::create_booking,
                routes::booking::get_bookings_by_user,
                routes::booking::get_bookings_by_landlord,
                routes::booking::update_booking_status,
                routes::booking::get_all_bookings,
                routes::booking::admin_update_booking,
                routes::booking::delete_booking,
                routes::booking::get_booking_stats,
                // Shifting requests
                routes::shifting::create_shifting_request,
                routes::shifting::get_all_shifting_requests,
                routes::shifting::get_shifting_requests_by_user,
                routes::shifting::update_shifting_status,
                // Payments
                routes::payment::initiate_payment,
                routes::payment::verify_payment,
                // Admin - Users
                routes::admin::get_all_users,
                routes::admin::update_user,
                routes::admin::delete_user,
                // Admin - Listings
                routes::admin::get_all_listings,
                routes::admin::admin_delete_listing,
            ],
        )
        .mount("/api/docs", make_swagger_ui(&swagger_config()))
        .register("/", catchers![not_found, internal_error])
}
