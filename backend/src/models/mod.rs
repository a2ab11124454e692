use chrono::NaiveDateTime;
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::error::ApiError;

mod interaction;

pub use interaction::{
    AppointmentType, CounterOffer, FinancingType, Interaction, InteractionDetails, InteractionKind,
    InteractionRow, InteractionStatus, StatusUpdate, TransitionError,
};

/// A stored string that does not name any known variant.
#[derive(Debug, Error)]
#[error("unknown {kind} `{value}`")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
}

impl From<ParseEnumError> for ApiError {
    fn from(err: ParseEnumError) -> Self {
        ApiError::Validation(err.to_string())
    }
}

#[derive(Debug, Clone, Serialize, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::users)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: String,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub email: String,
    pub name: String,
    pub phone: String,
    #[serde(rename = "joined")]
    pub joined_at: NaiveDateTime,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PropertyType {
    Flat,
    #[serde(rename = "Individual House")]
    IndividualHouse,
    Shop,
}

impl PropertyType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Flat => "Flat",
            Self::IndividualHouse => "Individual House",
            Self::Shop => "Shop",
        }
    }
}

impl fmt::Display for PropertyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PropertyType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flat" => Ok(Self::Flat),
            "individual house" => Ok(Self::IndividualHouse),
            "shop" => Ok(Self::Shop),
            _ => Err(ParseEnumError { kind: "property type", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::properties)]
pub struct PropertyRow {
    pub id: String,
    pub title: String,
    pub property_type: String,
    pub price: i64,
    pub location: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i64,
    pub status: String,
    pub images: String, // JSON array of paths
    pub owner_name: String,
    pub owner_contact: String,
    pub is_rent: bool,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Property {
    pub id: String,
    pub title: String,
    #[serde(rename = "type")]
    pub property_type: PropertyType,
    pub price: i64,
    pub location: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i64,
    pub status: String,
    pub images: Vec<String>,
    pub owner_name: String,
    pub owner_contact: String,
    pub is_rent: bool,
    pub created_at: NaiveDateTime,
}

impl Property {
    /// Sellers are identified by phone string, not by user id.
    pub fn is_owned_by(&self, user: &User) -> bool {
        !user.phone.is_empty() && self.owner_contact == user.phone
    }
}

impl TryFrom<PropertyRow> for Property {
    type Error = ApiError;

    fn try_from(row: PropertyRow) -> Result<Self, Self::Error> {
        let property_type = row
            .property_type
            .parse()
            .map_err(|e: ParseEnumError| ApiError::Internal(format!("property {}: {}", row.id, e)))?;
        let images = serde_json::from_str(&row.images)?;
        Ok(Self {
            id: row.id,
            title: row.title,
            property_type,
            price: row.price,
            location: row.location,
            bedrooms: row.bedrooms,
            bathrooms: row.bathrooms,
            area: row.area,
            status: row.status,
            images,
            owner_name: row.owner_name,
            owner_contact: row.owner_contact,
            is_rent: row.is_rent,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<&Property> for PropertyRow {
    type Error = ApiError;

    fn try_from(property: &Property) -> Result<Self, Self::Error> {
        Ok(Self {
            id: property.id.clone(),
            title: property.title.clone(),
            property_type: property.property_type.as_str().to_string(),
            price: property.price,
            location: property.location.clone(),
            bedrooms: property.bedrooms,
            bathrooms: property.bathrooms,
            area: property.area,
            status: property.status.clone(),
            images: serde_json::to_string(&property.images)?,
            owner_name: property.owner_name.clone(),
            owner_contact: property.owner_contact.clone(),
            is_rent: property.is_rent,
            created_at: property.created_at,
        })
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::wishlist)]
pub struct WishlistEntry {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::purchases)]
pub struct PurchaseRecord {
    pub id: String,
    pub user_id: String,
    pub property_id: String,
    pub purchased_at: NaiveDateTime,
}
