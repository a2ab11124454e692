//! Buyer/seller interaction records.
//!
//! Contact requests, appointments and offers are one entity with a `kind`
//! discriminator and a per-kind payload. They share a single status machine:
//! every record starts `pending` and moves only on an explicit status update,
//! restricted to the statuses its kind permits.

use chrono::{NaiveDate, NaiveDateTime};
use diesel::prelude::*;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::ParseEnumError;
use crate::error::ApiError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum InteractionKind {
    ContactRequest,
    Appointment,
    Offer,
}

impl InteractionKind {
    /// Code stored in the `kind` column and used in log lines. JSON uses the
    /// camelCase serde name instead.
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ContactRequest => "contact_request",
            Self::Appointment => "appointment",
            Self::Offer => "offer",
        }
    }

    /// Human-readable name used in response messages.
    pub const fn label(self) -> &'static str {
        match self {
            Self::ContactRequest => "Contact request",
            Self::Appointment => "Appointment",
            Self::Offer => "Offer",
        }
    }

    pub const fn statuses(self) -> &'static [InteractionStatus] {
        use InteractionStatus::*;
        match self {
            Self::ContactRequest => &[Pending, Contacted, Closed],
            Self::Appointment => &[Pending, Confirmed, Cancelled, Completed],
            Self::Offer => &[Pending, Accepted, Rejected, Countered, Withdrawn],
        }
    }

    pub fn permits(self, status: InteractionStatus) -> bool {
        self.statuses().contains(&status)
    }
}

impl fmt::Display for InteractionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "contact_request" => Ok(Self::ContactRequest),
            "appointment" => Ok(Self::Appointment),
            "offer" => Ok(Self::Offer),
            _ => Err(ParseEnumError { kind: "interaction kind", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionStatus {
    Pending,
    Contacted,
    Closed,
    Confirmed,
    Cancelled,
    Completed,
    Accepted,
    Rejected,
    Countered,
    Withdrawn,
}

impl InteractionStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Contacted => "contacted",
            Self::Closed => "closed",
            Self::Confirmed => "confirmed",
            Self::Cancelled => "cancelled",
            Self::Completed => "completed",
            Self::Accepted => "accepted",
            Self::Rejected => "rejected",
            Self::Countered => "countered",
            Self::Withdrawn => "withdrawn",
        }
    }
}

impl fmt::Display for InteractionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for InteractionStatus {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let status = match s {
            "pending" => Self::Pending,
            "contacted" => Self::Contacted,
            "closed" => Self::Closed,
            "confirmed" => Self::Confirmed,
            "cancelled" => Self::Cancelled,
            "completed" => Self::Completed,
            "accepted" => Self::Accepted,
            "rejected" => Self::Rejected,
            "countered" => Self::Countered,
            "withdrawn" => Self::Withdrawn,
            _ => return Err(ParseEnumError { kind: "status", value: s.to_string() }),
        };
        Ok(status)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AppointmentType {
    #[default]
    InPerson,
    Virtual,
    Phone,
}

impl AppointmentType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::InPerson => "in-person",
            Self::Virtual => "virtual",
            Self::Phone => "phone",
        }
    }
}

impl FromStr for AppointmentType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "in-person" => Ok(Self::InPerson),
            "virtual" => Ok(Self::Virtual),
            "phone" => Ok(Self::Phone),
            _ => Err(ParseEnumError { kind: "appointment type", value: s.to_string() }),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinancingType {
    Cash,
    #[default]
    Mortgage,
    Loan,
    Other,
}

impl FinancingType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Cash => "cash",
            Self::Mortgage => "mortgage",
            Self::Loan => "loan",
            Self::Other => "other",
        }
    }
}

impl FromStr for FinancingType {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cash" => Ok(Self::Cash),
            "mortgage" => Ok(Self::Mortgage),
            "loan" => Ok(Self::Loan),
            "other" => Ok(Self::Other),
            _ => Err(ParseEnumError { kind: "financing type", value: s.to_string() }),
        }
    }
}

/// Seller's alternative amount, stored alongside the original bid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterOffer {
    pub amount: i64,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default, skip_deserializing)]
    pub date: Option<NaiveDateTime>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InteractionDetails {
    ContactRequest,
    #[serde(rename_all = "camelCase")]
    Appointment {
        appointment_date: NaiveDate,
        appointment_time: String,
        appointment_type: AppointmentType,
    },
    #[serde(rename_all = "camelCase")]
    Offer {
        offer_amount: i64,
        financing_type: FinancingType,
        counter_offer: Option<CounterOffer>,
    },
}

impl InteractionDetails {
    pub const fn kind(&self) -> InteractionKind {
        match self {
            Self::ContactRequest => InteractionKind::ContactRequest,
            Self::Appointment { .. } => InteractionKind::Appointment,
            Self::Offer { .. } => InteractionKind::Offer,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Interaction {
    pub id: String,
    pub buyer_id: String,
    pub property_id: String,
    // Snapshot of the buyer's profile taken at creation.
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub message: Option<String>,
    pub status: InteractionStatus,
    #[serde(flatten)]
    pub details: InteractionDetails,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

/// A requested status change, optionally carrying a counter-offer.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusUpdate {
    pub status: InteractionStatus,
    #[serde(default)]
    pub counter_offer: Option<CounterOffer>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TransitionError {
    #[error("status `{status}` is not valid for {kind}")]
    StatusNotAllowed { kind: InteractionKind, status: InteractionStatus },
    #[error("counter offers can only be attached to offers")]
    CounterOnNonOffer,
    #[error("counter offer amount must be positive")]
    InvalidCounterAmount,
}

impl Interaction {
    pub fn kind(&self) -> InteractionKind {
        self.details.kind()
    }

    /// Applies a status update in place. Nothing changes unless the whole update is valid.
    ///
    /// A counter-offer fills the single counter slot and leaves `offer_amount` untouched.
    pub fn apply(&mut self, update: StatusUpdate, now: NaiveDateTime) -> Result<(), TransitionError> {
        let kind = self.kind();
        if !kind.permits(update.status) {
            return Err(TransitionError::StatusNotAllowed { kind, status: update.status });
        }
        let counter = match update.counter_offer {
            Some(_) if kind != InteractionKind::Offer => {
                return Err(TransitionError::CounterOnNonOffer)
            }
            Some(counter) if counter.amount <= 0 => return Err(TransitionError::InvalidCounterAmount),
            Some(counter) => Some(CounterOffer { date: Some(now), ..counter }),
            None => None,
        };

        if let (Some(new_counter), InteractionDetails::Offer { counter_offer, .. }) =
            (counter, &mut self.details)
        {
            *counter_offer = Some(new_counter);
        }
        self.status = update.status;
        self.updated_at = now;
        Ok(())
    }
}

#[derive(Debug, Clone, Queryable, Selectable, Insertable)]
#[diesel(table_name = crate::schema::interactions)]
pub struct InteractionRow {
    pub id: String,
    pub kind: String,
    pub buyer_id: String,
    pub property_id: String,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub message: Option<String>,
    pub status: String,
    pub appointment_date: Option<NaiveDate>,
    pub appointment_time: Option<String>,
    pub appointment_type: Option<String>,
    pub offer_amount: Option<i64>,
    pub financing_type: Option<String>,
    pub counter_amount: Option<i64>,
    pub counter_message: Option<String>,
    pub counter_date: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

fn corrupt(id: &str, what: &str) -> ApiError {
    ApiError::Internal(format!("interaction {} is missing {}", id, what))
}

fn decode<T: FromStr<Err = ParseEnumError>>(id: &str, raw: &str) -> Result<T, ApiError> {
    raw.parse()
        .map_err(|e: ParseEnumError| ApiError::Internal(format!("interaction {}: {}", id, e)))
}

impl TryFrom<InteractionRow> for Interaction {
    type Error = ApiError;

    fn try_from(row: InteractionRow) -> Result<Self, Self::Error> {
        let kind: InteractionKind = decode(&row.id, &row.kind)?;
        let details = match kind {
            InteractionKind::ContactRequest => InteractionDetails::ContactRequest,
            InteractionKind::Appointment => InteractionDetails::Appointment {
                appointment_date: row.appointment_date.ok_or_else(|| corrupt(&row.id, "date"))?,
                appointment_time: row
                    .appointment_time
                    .clone()
                    .ok_or_else(|| corrupt(&row.id, "time"))?,
                appointment_type: match row.appointment_type.as_deref() {
                    Some(raw) => decode(&row.id, raw)?,
                    None => AppointmentType::default(),
                },
            },
            InteractionKind::Offer => InteractionDetails::Offer {
                offer_amount: row.offer_amount.ok_or_else(|| corrupt(&row.id, "offer amount"))?,
                financing_type: match row.financing_type.as_deref() {
                    Some(raw) => decode(&row.id, raw)?,
                    None => FinancingType::default(),
                },
                counter_offer: row.counter_amount.map(|amount| CounterOffer {
                    amount,
                    message: row.counter_message.clone(),
                    date: row.counter_date,
                }),
            },
        };
        Ok(Self {
            status: decode(&row.id, &row.status)?,
            id: row.id,
            buyer_id: row.buyer_id,
            property_id: row.property_id,
            buyer_name: row.buyer_name,
            buyer_email: row.buyer_email,
            buyer_phone: row.buyer_phone,
            message: row.message,
            details,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

impl From<&Interaction> for InteractionRow {
    fn from(record: &Interaction) -> Self {
        let mut row = Self {
            id: record.id.clone(),
            kind: record.kind().as_str().to_string(),
            buyer_id: record.buyer_id.clone(),
            property_id: record.property_id.clone(),
            buyer_name: record.buyer_name.clone(),
            buyer_email: record.buyer_email.clone(),
            buyer_phone: record.buyer_phone.clone(),
            message: record.message.clone(),
            status: record.status.as_str().to_string(),
            appointment_date: None,
            appointment_time: None,
            appointment_type: None,
            offer_amount: None,
            financing_type: None,
            counter_amount: None,
            counter_message: None,
            counter_date: None,
            created_at: record.created_at,
            updated_at: record.updated_at,
        };
        match &record.details {
            InteractionDetails::ContactRequest => {}
            InteractionDetails::Appointment { appointment_date, appointment_time, appointment_type } => {
                row.appointment_date = Some(*appointment_date);
                row.appointment_time = Some(appointment_time.clone());
                row.appointment_type = Some(appointment_type.as_str().to_string());
            }
            InteractionDetails::Offer { offer_amount, financing_type, counter_offer } => {
                row.offer_amount = Some(*offer_amount);
                row.financing_type = Some(financing_type.as_str().to_string());
                if let Some(counter) = counter_offer {
                    row.counter_amount = Some(counter.amount);
                    row.counter_message = counter.message.clone();
                    row.counter_date = counter.date;
                }
            }
        }
        row
    }
}
