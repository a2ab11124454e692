//! HTTP adapters: extract, call one service, wrap the result in the JSON envelope clients expect.

use axum::extract::{Multipart, Path, State};
use axum::http::HeaderMap;
use axum::{Extension, Json};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::{bearer_token, LoginForm, SignupForm};
use crate::error::ApiError;
use crate::interaction::{AppointmentForm, ContactRequestForm, InteractionDraft, OfferForm};
use crate::models::{InteractionKind, Property, StatusUpdate, User};
use crate::property::{ListingFields, ListingSubmission};
use crate::state::AppState;
use crate::uploads::{UploadedImage, MAX_IMAGES};

pub async fn health() -> Json<Value> {
    Json(json!({
        "message": "Real Estate API is running",
        "status": "OK",
        "endpoints": {
            "properties": "/api/properties",
            "wishlist": "/api/wishlist",
            "contactRequests": "/api/contact-requests",
            "appointments": "/api/appointments",
            "offers": "/api/offers",
            "purchases": "/api/purchase-history",
            "auth": {
                "signup": "/signup",
                "login": "/login",
                "profile": "/profile"
            }
        }
    }))
}

/// Registers a user; the response carries no token.
pub async fn signup(
    State(state): State<AppState>,
    Json(form): Json<SignupForm>,
) -> Result<Json<Value>, ApiError> {
    state.auth.signup(form).await?;
    Ok(Json(json!({"message": "User registered successfully"})))
}

pub async fn login(
    State(state): State<AppState>,
    Json(form): Json<LoginForm>,
) -> Result<Json<Value>, ApiError> {
    let session = state.auth.login(form).await?;
    Ok(Json(json!({
        "message": "Access granted",
        "token": session.token,
        "user": session.user,
    })))
}

pub async fn profile(Extension(user): Extension<User>) -> Json<Value> {
    Json(json!({"message": "access granted", "user": user}))
}

/// Every listing, unauthenticated.
pub async fn list_properties(State(state): State<AppState>) -> Result<Json<Vec<Property>>, ApiError> {
    Ok(Json(state.listings.list().await?))
}

/// Multipart listing submission. The token is checked before the body is read.
/// Any token failure here is 401, and a token for a deleted user yields 404.
pub async fn create_property(
    State(state): State<AppState>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Result<Json<Property>, ApiError> {
    let claims = state
        .auth
        .decode_token(bearer_token(&headers)?)
        .map_err(|_| ApiError::Unauthorized("Invalid token".into()))?;
    let submission = read_listing_form(multipart).await?;
    Ok(Json(state.listings.create(claims.sub, submission).await?))
}

fn multipart_error(err: axum::extract::multipart::MultipartError) -> ApiError {
    ApiError::Validation(format!("invalid multipart body: {}", err))
}

async fn read_listing_form(mut multipart: Multipart) -> Result<ListingSubmission, ApiError> {
    let mut fields = HashMap::new();
    let mut images = Vec::new();
    while let Some(field) = multipart.next_field().await.map_err(multipart_error)? {
        let name = field.name().unwrap_or_default().to_string();
        if name == "images" || name == "images[]" {
            let file_name = field.file_name().unwrap_or("image").to_string();
            let bytes = field.bytes().await.map_err(multipart_error)?;
            if bytes.is_empty() {
                continue;
            }
            if images.len() == MAX_IMAGES {
                return Err(ApiError::Validation(format!(
                    "at most {} images are allowed",
                    MAX_IMAGES
                )));
            }
            images.push(UploadedImage { file_name, bytes: bytes.to_vec() });
        } else {
            let value = field.text().await.map_err(multipart_error)?;
            fields.insert(name, value);
        }
    }
    Ok(ListingSubmission { fields: ListingFields::from_form(fields)?, images })
}

/// Body of wishlist-add and purchase requests.
#[derive(Debug, Deserialize)]
pub struct PropertyRef {
    pub id: String,
}

pub async fn get_wishlist(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, ApiError> {
    let wishlist = state.wishlist.list(user.id).await?;
    Ok(Json(json!({ "wishlist": wishlist })))
}

pub async fn add_to_wishlist(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<PropertyRef>,
) -> Result<Json<Value>, ApiError> {
    let wishlist = state.wishlist.add(user.id, body.id).await?;
    Ok(Json(json!({ "wishlist": wishlist })))
}

pub async fn remove_from_wishlist(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(property_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let wishlist = state.wishlist.remove(user.id, property_id).await?;
    Ok(Json(json!({ "wishlist": wishlist })))
}

pub async fn purchase_history(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, ApiError> {
    let purchases = state.purchases.history(user.id).await?;
    Ok(Json(json!({ "purchases": purchases })))
}

pub async fn record_purchase(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<PropertyRef>,
) -> Result<Json<Value>, ApiError> {
    state.purchases.record(user.id, body.id).await?;
    Ok(Json(json!({"message": "Purchase recorded"})))
}

/// Binds one interaction kind to its request body and response field names.
pub trait InteractionRoute: Send + Sync + 'static {
    const KIND: InteractionKind;
    /// Response key for a single record, e.g. `offer`.
    const ONE: &'static str;
    /// Response key for a list, e.g. `offers`.
    const MANY: &'static str;
    const CREATED: &'static str;

    type Form: DeserializeOwned + Into<InteractionDraft> + Send + 'static;
}

pub struct ContactRequests;
pub struct Appointments;
pub struct Offers;

impl InteractionRoute for ContactRequests {
    const KIND: InteractionKind = InteractionKind::ContactRequest;
    const ONE: &'static str = "contactRequest";
    const MANY: &'static str = "contactRequests";
    const CREATED: &'static str = "Contact request submitted successfully";
    type Form = ContactRequestForm;
}

impl InteractionRoute for Appointments {
    const KIND: InteractionKind = InteractionKind::Appointment;
    const ONE: &'static str = "appointment";
    const MANY: &'static str = "appointments";
    const CREATED: &'static str = "Appointment scheduled successfully";
    type Form = AppointmentForm;
}

impl InteractionRoute for Offers {
    const KIND: InteractionKind = InteractionKind::Offer;
    const ONE: &'static str = "offer";
    const MANY: &'static str = "offers";
    const CREATED: &'static str = "Offer submitted successfully";
    type Form = OfferForm;
}

pub async fn create_interaction<R: InteractionRoute>(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(form): Json<R::Form>,
) -> Result<Json<Value>, ApiError> {
    let view = state.interactions.create(&user, form.into()).await?;
    Ok(Json(json!({ "message": R::CREATED, (R::ONE): view })))
}

pub async fn buyer_interactions<R: InteractionRoute>(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, ApiError> {
    let views = state.interactions.buyer_view(&user, R::KIND).await?;
    Ok(Json(json!({ (R::MANY): views })))
}

pub async fn seller_interactions<R: InteractionRoute>(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> Result<Json<Value>, ApiError> {
    let views = state.interactions.seller_view(&user, R::KIND).await?;
    Ok(Json(json!({ (R::MANY): views })))
}

pub async fn update_interaction<R: InteractionRoute>(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(id): Path<String>,
    Json(update): Json<StatusUpdate>,
) -> Result<Json<Value>, ApiError> {
    let view = state.interactions.update_status(&user, R::KIND, id, update).await?;
    Ok(Json(json!({
        "message": format!("{} updated successfully", R::KIND.label()),
        (R::ONE): view,
    })))
}
