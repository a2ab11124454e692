//! Property listing marketplace backend.
//!
//! Listings, buyer/seller interaction records (contact requests, appointments,
//! offers), a wishlist and a purchase log, behind a JSON API guarded by
//! bearer tokens.

use axum::extract::DefaultBodyLimit;
use axum::routing::{delete, get, patch, post};
use axum::{middleware, Router};
use tower_http::cors::CorsLayer;
use tower_http::services::ServeDir;

pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod handlers;
pub mod interaction;
pub mod models;
pub mod property;
pub mod purchase;
pub mod schema;
pub mod state;
pub mod uploads;
pub mod wishlist;

pub use config::AppConfig;
pub use error::{ApiError, StartupError};
pub use state::AppState;

use handlers::{Appointments, ContactRequests, Offers};

/// Builds the full router: public routes, bearer-protected routes and `/uploads`.
pub fn app(state: AppState) -> Router {
    use handlers::*;

    let protected_routes = Router::new()
        .route("/profile", get(profile))
        .route("/api/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/api/wishlist/:id", delete(remove_from_wishlist))
        .route(
            "/api/contact-requests",
            post(create_interaction::<ContactRequests>).get(buyer_interactions::<ContactRequests>),
        )
        .route("/api/contact-requests/seller", get(seller_interactions::<ContactRequests>))
        .route("/api/contact-requests/:id", patch(update_interaction::<ContactRequests>))
        .route(
            "/api/appointments",
            post(create_interaction::<Appointments>).get(buyer_interactions::<Appointments>),
        )
        .route("/api/appointments/seller", get(seller_interactions::<Appointments>))
        .route("/api/appointments/:id", patch(update_interaction::<Appointments>))
        .route(
            "/api/offers",
            post(create_interaction::<Offers>).get(buyer_interactions::<Offers>),
        )
        .route("/api/offers/seller", get(seller_interactions::<Offers>))
        .route("/api/offers/:id", patch(update_interaction::<Offers>))
        .route("/api/purchase-history", get(purchase_history))
        .route("/api/purchase", post(record_purchase))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth::authenticate));

    let upload_limit = state.config.max_upload_bytes;
    Router::new()
        .route("/", get(health))
        .route("/signup", post(signup))
        .route("/login", post(login))
        .route(
            "/api/properties",
            get(list_properties)
                .post(create_property)
                .layer(DefaultBodyLimit::max(upload_limit)),
        )
        .merge(protected_routes)
        .nest_service(uploads::PUBLIC_PREFIX, ServeDir::new(&state.config.upload_dir))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
