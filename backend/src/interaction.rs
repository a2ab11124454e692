//! Contact requests, appointments and offers.
//!
//! One service handles all three kinds. Records are created by an
//! authenticated buyer against an existing property, then moved through their
//! status machine by the buyer or the property's seller.

use chrono::{DateTime, NaiveDate, Utc};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::db::{self, DbPool};
use crate::error::ApiError;
use crate::models::{
    AppointmentType, FinancingType, Interaction, InteractionDetails, InteractionKind,
    InteractionRow, InteractionStatus, Property, StatusUpdate, User,
};
use crate::property::{find_property, load_properties};
use crate::schema::{interactions, properties};

/// A record together with the property it points at (`None` once the property is gone).
#[derive(Debug, Clone, Serialize)]
pub struct InteractionView {
    #[serde(flatten)]
    pub record: Interaction,
    pub property: Option<Property>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ContactRequestForm {
    pub property_id: String,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct AppointmentForm {
    pub property_id: String,
    pub appointment_date: Option<String>,
    pub appointment_time: Option<String>,
    pub appointment_type: Option<AppointmentType>,
    pub message: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OfferForm {
    pub property_id: String,
    pub offer_amount: Option<i64>,
    pub financing_type: Option<FinancingType>,
    pub message: Option<String>,
}

/// Buyer input for a new record, not yet validated.
#[derive(Debug, Clone)]
pub enum InteractionDraft {
    ContactRequest(ContactRequestForm),
    Appointment(AppointmentForm),
    Offer(OfferForm),
}

impl From<ContactRequestForm> for InteractionDraft {
    fn from(form: ContactRequestForm) -> Self {
        Self::ContactRequest(form)
    }
}

impl From<AppointmentForm> for InteractionDraft {
    fn from(form: AppointmentForm) -> Self {
        Self::Appointment(form)
    }
}

impl From<OfferForm> for InteractionDraft {
    fn from(form: OfferForm) -> Self {
        Self::Offer(form)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_appointment_date(raw: &str) -> Result<NaiveDate, ApiError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.with_timezone(&Utc).date_naive()))
        .map_err(|_| ApiError::Validation(format!("appointmentDate `{}` is not a valid date", raw)))
}

impl InteractionDraft {
    pub fn kind(&self) -> InteractionKind {
        match self {
            Self::ContactRequest(_) => InteractionKind::ContactRequest,
            Self::Appointment(_) => InteractionKind::Appointment,
            Self::Offer(_) => InteractionKind::Offer,
        }
    }

    pub fn property_id(&self) -> &str {
        match self {
            Self::ContactRequest(form) => &form.property_id,
            Self::Appointment(form) => &form.property_id,
            Self::Offer(form) => &form.property_id,
        }
    }

    /// Checks required fields and splits into the optional message and the kind payload.
    fn validate(self) -> Result<(Option<String>, InteractionDetails), ApiError> {
        match self {
            Self::ContactRequest(form) => {
                let message = non_empty(form.message)
                    .ok_or_else(|| ApiError::Validation("message is required".into()))?;
                Ok((Some(message), InteractionDetails::ContactRequest))
            }
            Self::Appointment(form) => {
                let date = non_empty(form.appointment_date)
                    .ok_or_else(|| ApiError::Validation("appointmentDate is required".into()))?;
                let time = non_empty(form.appointment_time)
                    .ok_or_else(|| ApiError::Validation("appointmentTime is required".into()))?;
                Ok((
                    non_empty(form.message),
                    InteractionDetails::Appointment {
                        appointment_date: parse_appointment_date(&date)?,
                        appointment_time: time,
                        appointment_type: form.appointment_type.unwrap_or_default(),
                    },
                ))
            }
            Self::Offer(form) => {
                let amount = form
                    .offer_amount
                    .ok_or_else(|| ApiError::Validation("offerAmount is required".into()))?;
                if amount <= 0 {
                    return Err(ApiError::Validation("offerAmount must be positive".into()));
                }
                Ok((
                    non_empty(form.message),
                    InteractionDetails::Offer {
                        offer_amount: amount,
                        financing_type: form.financing_type.unwrap_or_default(),
                        counter_offer: None,
                    },
                ))
            }
        }
    }
}

#[derive(Clone)]
pub struct InteractionService {
    pool: DbPool,
}

impl InteractionService {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn create(&self, buyer: &User, draft: InteractionDraft) -> Result<InteractionView, ApiError> {
        let kind = draft.kind();
        let property_id = draft.property_id().to_string();
        let (message, details) = draft.validate()?;
        let now = Utc::now().naive_utc();
        let record = Interaction {
            id: Uuid::new_v4().to_string(),
            buyer_id: buyer.id.clone(),
            property_id,
            buyer_name: buyer.name.clone(),
            buyer_email: buyer.email.clone(),
            buyer_phone: buyer.phone.clone(),
            message,
            status: InteractionStatus::Pending,
            details,
            created_at: now,
            updated_at: now,
        };

        let view = db::run(&self.pool, move |conn| {
            let property = find_property(conn, &record.property_id)?
                .ok_or_else(|| ApiError::not_found("Property"))?;
            diesel::insert_into(interactions::table)
                .values(&InteractionRow::from(&record))
                .execute(conn)?;
            Ok(InteractionView { record, property: Some(property) })
        })
        .await?;
        log::info!(
            "{} {} created by {} for property {}",
            kind.label(),
            view.record.id,
            buyer.username,
            view.record.property_id
        );
        Ok(view)
    }

    /// Records the caller created, newest first.
    pub async fn buyer_view(&self, buyer: &User, kind: InteractionKind) -> Result<Vec<InteractionView>, ApiError> {
        let buyer_id = buyer.id.clone();
        db::run(&self.pool, move |conn| {
            let rows = interactions::table
                .filter(interactions::kind.eq(kind.as_str()))
                .filter(interactions::buyer_id.eq(&buyer_id))
                .order_by(interactions::created_at.desc())
                .select(InteractionRow::as_select())
                .load(conn)?;
            populate(conn, rows)
        })
        .await
    }

    /// Records on properties whose `owner_contact` equals the caller's phone, newest first.
    ///
    /// Resolves the seller's properties first and then filters records by those ids,
    /// so a listing with a stale phone number simply drops out. Linear in the
    /// number of properties sharing that phone.
    pub async fn seller_view(&self, seller: &User, kind: InteractionKind) -> Result<Vec<InteractionView>, ApiError> {
        if seller.phone.is_empty() {
            return Ok(Vec::new());
        }
        let phone = seller.phone.clone();
        db::run(&self.pool, move |conn| {
            let property_ids: Vec<String> = properties::table
                .filter(properties::owner_contact.eq(&phone))
                .select(properties::id)
                .load(conn)?;
            if property_ids.is_empty() {
                return Ok(Vec::new());
            }
            let rows = interactions::table
                .filter(interactions::kind.eq(kind.as_str()))
                .filter(interactions::property_id.eq_any(&property_ids))
                .order_by(interactions::created_at.desc())
                .select(InteractionRow::as_select())
                .load(conn)?;
            populate(conn, rows)
        })
        .await
    }

    pub async fn update_status(
        &self,
        caller: &User,
        kind: InteractionKind,
        id: String,
        update: StatusUpdate,
    ) -> Result<InteractionView, ApiError> {
        let caller = caller.clone();
        let view = db::run(&self.pool, move |conn| {
            // Read, check and write under one write lock so overlapping updates serialize.
            conn.immediate_transaction(|conn| {
                let row = interactions::table
                    .find(&id)
                    .filter(interactions::kind.eq(kind.as_str()))
                    .select(InteractionRow::as_select())
                    .first(conn)
                    .optional()?
                    .ok_or_else(|| ApiError::not_found(kind.label()))?;
                let mut record = Interaction::try_from(row)?;
                let property = find_property(conn, &record.property_id)?;

                let is_buyer = record.buyer_id == caller.id;
                let is_seller = property.as_ref().map_or(false, |p| p.is_owned_by(&caller));
                if !is_buyer && !is_seller {
                    log::warn!("User {} may not update {} {}", caller.username, kind, record.id);
                    return Err(ApiError::Forbidden(format!(
                        "Not permitted to update this {}",
                        kind.label().to_lowercase()
                    )));
                }

                let carries_counter = update.counter_offer.is_some();
                record.apply(update, Utc::now().naive_utc())?;
                let row = InteractionRow::from(&record);
                let target = interactions::table.find(&record.id);
                // Counter columns are only written when this update brings a counter.
                if carries_counter {
                    diesel::update(target)
                        .set((
                            interactions::status.eq(row.status),
                            interactions::counter_amount.eq(row.counter_amount),
                            interactions::counter_message.eq(row.counter_message),
                            interactions::counter_date.eq(row.counter_date),
                            interactions::updated_at.eq(row.updated_at),
                        ))
                        .execute(conn)?;
                } else {
                    diesel::update(target)
                        .set((
                            interactions::status.eq(row.status),
                            interactions::updated_at.eq(row.updated_at),
                        ))
                        .execute(conn)?;
                }
                Ok(InteractionView { record, property })
            })
        })
        .await?;
        log::info!("{} {} moved to {}", kind.label(), view.record.id, view.record.status);
        Ok(view)
    }
}

/// Attaches each record's property, keeping records whose property has been deleted.
fn populate(conn: &mut SqliteConnection, rows: Vec<InteractionRow>) -> Result<Vec<InteractionView>, ApiError> {
    let ids: Vec<String> = rows.iter().map(|row| row.property_id.clone()).collect();
    let properties = load_properties(conn, &ids)?;
    rows.into_iter()
        .map(|row| {
            let record = Interaction::try_from(row)?;
            // Several records may reference one property.
            let property = properties.get(&record.property_id).cloned();
            Ok(InteractionView { record, property })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn contact_request_requires_message() {
        let draft = InteractionDraft::from(ContactRequestForm {
            property_id: "p1".into(),
            message: Some("   ".into()),
        });
        assert!(matches!(draft.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn appointment_defaults_to_in_person() {
        let draft = InteractionDraft::from(AppointmentForm {
            property_id: "p1".into(),
            appointment_date: Some("2025-03-14T00:00:00.000Z".into()),
            appointment_time: Some("10:30".into()),
            ..Default::default()
        });
        let (message, details) = draft.validate().unwrap();
        assert_eq!(message, None);
        assert_eq!(
            details,
            InteractionDetails::Appointment {
                appointment_date: NaiveDate::from_ymd_opt(2025, 3, 14).unwrap(),
                appointment_time: "10:30".into(),
                appointment_type: AppointmentType::InPerson,
            }
        );
    }

    #[test]
    fn appointment_rejects_bad_date() {
        let draft = InteractionDraft::from(AppointmentForm {
            property_id: "p1".into(),
            appointment_date: Some("next tuesday".into()),
            appointment_time: Some("10:30".into()),
            ..Default::default()
        });
        assert!(matches!(draft.validate(), Err(ApiError::Validation(_))));
    }

    #[test]
    fn offer_defaults_to_mortgage_and_needs_amount() {
        let draft = InteractionDraft::from(OfferForm {
            property_id: "p1".into(),
            offer_amount: Some(4_200_000),
            ..Default::default()
        });
        let (_, details) = draft.validate().unwrap();
        assert!(matches!(
            details,
            InteractionDetails::Offer { financing_type: FinancingType::Mortgage, offer_amount: 4_200_000, .. }
        ));

        let missing = InteractionDraft::from(OfferForm { property_id: "p1".into(), ..Default::default() });
        assert!(matches!(missing.validate(), Err(ApiError::Validation(_))));

        let negative = InteractionDraft::from(OfferForm {
            property_id: "p1".into(),
            offer_amount: Some(-5),
            ..Default::default()
        });
        assert!(matches!(negative.validate(), Err(ApiError::Validation(_))));
    }
}
