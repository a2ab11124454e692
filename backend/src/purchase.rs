use chrono::{NaiveDateTime, Utc};
use diesel::prelude::*;
use serde::Serialize;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::{Property, PurchaseRecord};
use crate::property::load_properties;
use crate::schema::purchases;

#[derive(Debug, Clone, Serialize)]
pub struct PurchaseView {
    pub property: Property,
    pub date: NaiveDateTime,
}

/// Append-only log of "purchase" clicks. Nothing here moves money or marks a
/// property as sold; the same property may be recorded any number of times.
#[derive(Clone)]
pub struct PurchaseLedger {
    pool: DbPool,
}

impl PurchaseLedger {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn record(&self, user_id: String, property_id: String) -> Result<PurchaseRecord, ApiError> {
        let record = PurchaseRecord {
            id: Uuid::new_v4().to_string(),
            user_id,
            property_id,
            purchased_at: Utc::now().naive_utc(),
        };
        db::run(&self.pool, move |conn| {
            diesel::insert_into(purchases::table).values(&record).execute(conn)?;
            Ok(record)
        })
        .await
        .map(|record| {
            log::info!("Recorded purchase of {} by {}", record.property_id, record.user_id);
            record
        })
    }

    /// Newest first; records whose property no longer exists are omitted.
    pub async fn history(&self, user_id: String) -> Result<Vec<PurchaseView>, ApiError> {
        db::run(&self.pool, move |conn| {
            let records = purchases::table
                .filter(purchases::user_id.eq(&user_id))
                .order_by(purchases::purchased_at.desc())
                .select(PurchaseRecord::as_select())
                .load(conn)?;
            let ids: Vec<String> = records.iter().map(|r| r.property_id.clone()).collect();
            let properties = load_properties(conn, &ids)?;
            Ok(records
                .into_iter()
                .filter_map(|r| {
                    properties
                        .get(&r.property_id)
                        .map(|p| PurchaseView { property: p.clone(), date: r.purchased_at })
                })
                .collect())
        })
        .await
    }
}
