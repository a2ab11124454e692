use chrono::Utc;
use diesel::prelude::*;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::{Property, WishlistEntry};
use crate::property::load_properties;
use crate::schema::wishlist;

/// Saved properties per user. A (user, property) pair is stored at most once.
#[derive(Clone)]
pub struct WishlistService {
    pool: DbPool,
}

impl WishlistService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Idempotent add; returns the updated wishlist.
    pub async fn add(&self, user_id: String, property_id: String) -> Result<Vec<Property>, ApiError> {
        db::run(&self.pool, move |conn| {
            let entry = WishlistEntry {
                id: Uuid::new_v4().to_string(),
                user_id: user_id.clone(),
                property_id,
                created_at: Utc::now().naive_utc(),
            };
            // The unique (user_id, property_id) index turns a duplicate into a no-op,
            // including when two adds race.
            let inserted = diesel::insert_or_ignore_into(wishlist::table)
                .values(&entry)
                .execute(conn)?;
            if inserted == 0 {
                log::debug!("Property {} already in wishlist of {}", entry.property_id, user_id);
            }
            resolved(conn, &user_id)
        })
        .await
    }

    /// Removes the entry if present; returns the updated wishlist.
    pub async fn remove(&self, user_id: String, property_id: String) -> Result<Vec<Property>, ApiError> {
        db::run(&self.pool, move |conn| {
            diesel::delete(
                wishlist::table
                    .filter(wishlist::user_id.eq(&user_id))
                    .filter(wishlist::property_id.eq(&property_id)),
            )
            .execute(conn)?;
            resolved(conn, &user_id)
        })
        .await
    }

    pub async fn list(&self, user_id: String) -> Result<Vec<Property>, ApiError> {
        db::run(&self.pool, move |conn| resolved(conn, &user_id)).await
    }
}

/// Wishlist properties in the order they were added. Entries whose property is gone are skipped.
fn resolved(conn: &mut SqliteConnection, user_id: &str) -> Result<Vec<Property>, ApiError> {
    let ids: Vec<String> = wishlist::table
        .filter(wishlist::user_id.eq(user_id))
        .order_by(wishlist::created_at.asc())
        .select(wishlist::property_id)
        .load(conn)?;
    let mut properties = load_properties(conn, &ids)?;
    Ok(ids.iter().filter_map(|id| properties.remove(id)).collect())
}
