use chrono::Utc;
use diesel::prelude::*;
use std::collections::HashMap;
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::{Property, PropertyRow, PropertyType, User};
use crate::schema::{properties, users};
use crate::uploads::{UploadStore, UploadedImage, MAX_IMAGES};

/// Client form names that differ from the stored field names.
const CLIENT_FIELD_NAMES: &[(&str, &str)] = &[
    ("category", "type"),
    ("rooms", "bedrooms"),
    ("sqft", "area"),
];

/// Maps a client-facing field name to its storage name. Unknown names pass through.
pub fn storage_field_name(client_name: &str) -> &str {
    CLIENT_FIELD_NAMES
        .iter()
        .find(|(client, _)| *client == client_name)
        .map(|(_, stored)| *stored)
        .unwrap_or(client_name)
}

/// Listing attributes after field-name translation, before an owner is attached.
#[derive(Debug, Clone, PartialEq)]
pub struct ListingFields {
    pub title: String,
    pub property_type: PropertyType,
    pub price: i64,
    pub location: String,
    pub bedrooms: i32,
    pub bathrooms: i32,
    pub area: i64,
    pub is_rent: bool,
}

impl ListingFields {
    /// Builds listing fields from raw form values keyed by either client or storage names.
    pub fn from_form(raw: HashMap<String, String>) -> Result<Self, ApiError> {
        let fields: HashMap<&str, &str> = raw
            .iter()
            .map(|(name, value)| (storage_field_name(name), value.trim()))
            .collect();
        let get = |name: &str| fields.get(name).copied().filter(|v| !v.is_empty());
        let required = |name: &str| {
            get(name).ok_or_else(|| ApiError::Validation(format!("{} is required", name)))
        };

        Ok(Self {
            title: required("title")?.to_string(),
            property_type: required("type")?.parse()?,
            price: parse_number(required("price")?, "price")?,
            location: required("location")?.to_string(),
            bedrooms: get("bedrooms").map(|v| parse_number(v, "bedrooms")).transpose()?.unwrap_or(0),
            bathrooms: get("bathrooms").map(|v| parse_number(v, "bathrooms")).transpose()?.unwrap_or(1),
            area: get("area").map(|v| parse_number(v, "area")).transpose()?.unwrap_or(0),
            is_rent: get("isRent").map(|v| v.eq_ignore_ascii_case("true")).unwrap_or(false),
        })
    }

    fn into_property(self, owner: &User, images: Vec<String>) -> Property {
        Property {
            id: Uuid::new_v4().to_string(),
            title: self.title,
            property_type: self.property_type,
            price: self.price,
            location: self.location,
            bedrooms: self.bedrooms,
            bathrooms: self.bathrooms,
            area: self.area,
            status: "available".to_string(),
            images,
            owner_name: owner.name.clone(),
            owner_contact: owner.phone.clone(),
            is_rent: self.is_rent,
            created_at: Utc::now().naive_utc(),
        }
    }
}

fn parse_number<T: std::str::FromStr>(raw: &str, field: &str) -> Result<T, ApiError> {
    // Form clients sometimes send "1200.0" for integral values.
    let trimmed = raw.strip_suffix(".0").unwrap_or(raw);
    trimmed
        .parse()
        .map_err(|_| ApiError::Validation(format!("{} must be a whole number", field)))
}

#[derive(Debug, Clone)]
pub struct ListingSubmission {
    pub fields: ListingFields,
    pub images: Vec<UploadedImage>,
}

#[derive(Clone)]
pub struct ListingService {
    pool: DbPool,
    uploads: UploadStore,
}

impl ListingService {
    pub fn new(pool: DbPool, uploads: UploadStore) -> Self {
        Self { pool, uploads }
    }

    /// Every listing, unfiltered; clients filter locally.
    pub async fn list(&self) -> Result<Vec<Property>, ApiError> {
        db::run(&self.pool, |conn| {
            let rows = properties::table
                .order_by(properties::created_at.asc())
                .select(PropertyRow::as_select())
                .load(conn)?;
            rows.into_iter().map(Property::try_from).collect()
        })
        .await
    }

    /// Stores the images, then the listing, with the owner's name and phone copied in.
    pub async fn create(&self, owner_id: String, submission: ListingSubmission) -> Result<Property, ApiError> {
        if submission.images.len() > MAX_IMAGES {
            return Err(ApiError::Validation(format!("at most {} images are allowed", MAX_IMAGES)));
        }
        let owner = db::run(&self.pool, move |conn| {
            users::table
                .find(&owner_id)
                .select(User::as_select())
                .first(conn)
                .optional()?
                .ok_or_else(|| ApiError::not_found("User"))
        })
        .await?;

        let images = self.uploads.save_all(&submission.images).await?;
        let property = submission.fields.into_property(&owner, images);
        let row = PropertyRow::try_from(&property)?;
        db::run(&self.pool, move |conn| {
            diesel::insert_into(properties::table).values(&row).execute(conn)?;
            Ok(())
        })
        .await?;
        log::info!("Listed property {} for owner {}", property.id, owner.username);
        Ok(property)
    }

    pub async fn count(&self) -> Result<i64, ApiError> {
        db::run(&self.pool, |conn| Ok(properties::table.count().get_result(conn)?)).await
    }

    /// Inserts ready-made listings, e.g. sample data.
    pub async fn insert_all(&self, listings: Vec<Property>) -> Result<usize, ApiError> {
        let rows = listings
            .iter()
            .map(PropertyRow::try_from)
            .collect::<Result<Vec<_>, _>>()?;
        db::run(&self.pool, move |conn| {
            Ok(diesel::insert_into(properties::table).values(&rows).execute(conn)?)
        })
        .await
    }
}

pub(crate) fn find_property(conn: &mut SqliteConnection, id: &str) -> Result<Option<Property>, ApiError> {
    properties::table
        .find(id)
        .select(PropertyRow::as_select())
        .first(conn)
        .optional()?
        .map(Property::try_from)
        .transpose()
}

/// Loads properties by id, silently skipping ids that no longer resolve.
pub(crate) fn load_properties(
    conn: &mut SqliteConnection,
    ids: &[String],
) -> Result<HashMap<String, Property>, ApiError> {
    if ids.is_empty() {
        return Ok(HashMap::new());
    }
    properties::table
        .filter(properties::id.eq_any(ids))
        .select(PropertyRow::as_select())
        .load(conn)?
        .into_iter()
        .map(|row| Property::try_from(row).map(|p| (p.id.clone(), p)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn client_names_translate_once() {
        assert_eq!(storage_field_name("category"), "type");
        assert_eq!(storage_field_name("rooms"), "bedrooms");
        assert_eq!(storage_field_name("sqft"), "area");
        assert_eq!(storage_field_name("price"), "price");
    }

    #[test]
    fn client_form_maps_to_storage_fields() {
        let fields = ListingFields::from_form(form(&[
            ("title", "Sunshine Apartments"),
            ("category", "Flat"),
            ("price", "4500000"),
            ("location", "Hyderabad"),
            ("rooms", "3"),
            ("sqft", "1200"),
            ("isRent", "true"),
        ]))
        .unwrap();
        assert_eq!(fields.property_type, PropertyType::Flat);
        assert_eq!(fields.bedrooms, 3);
        assert_eq!(fields.area, 1200);
        assert_eq!(fields.bathrooms, 1);
        assert!(fields.is_rent);
    }

    #[test]
    fn storage_names_are_accepted_too() {
        let fields = ListingFields::from_form(form(&[
            ("title", "Corner Shop"),
            ("type", "Shop"),
            ("price", "900000.0"),
            ("location", "Pune"),
            ("area", "300"),
        ]))
        .unwrap();
        assert_eq!(fields.property_type, PropertyType::Shop);
        assert_eq!(fields.price, 900_000);
        assert!(!fields.is_rent);
    }

    #[test]
    fn missing_or_bad_fields_are_validation_errors() {
        let missing_price = ListingFields::from_form(form(&[
            ("title", "x"),
            ("category", "Flat"),
            ("location", "y"),
        ]));
        assert!(matches!(missing_price, Err(ApiError::Validation(_))));

        let bad_rooms = ListingFields::from_form(form(&[
            ("title", "x"),
            ("category", "Flat"),
            ("price", "10"),
            ("location", "y"),
            ("rooms", "three"),
        ]));
        assert!(matches!(bad_rooms, Err(ApiError::Validation(_))));

        let bad_type = ListingFields::from_form(form(&[
            ("title", "x"),
            ("category", "Castle"),
            ("price", "10"),
            ("location", "y"),
        ]));
        assert!(matches!(bad_type, Err(ApiError::Validation(_))));
    }
}
