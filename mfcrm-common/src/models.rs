//! Domain models
//!
//! Enumerations are stored as TEXT using their wire value (`LOI_Sent`,
//! `Closed_Won`, ...). Money and ownership percentages are REAL.

use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;
use std::str::FromStr;

use crate::Error;

/// Declares a TEXT-backed enum with its wire values.
macro_rules! wire_enum {
    (
        $(#[$meta:meta])*
        $name:ident, $what:literal {
            $($variant:ident => $wire:literal),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
        pub enum $name {
            $(
                #[sqlx(rename = $wire)]
                #[serde(rename = $wire)]
                $variant,
            )+
        }

        impl $name {
            /// Every value in display order
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            /// Stored value
            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $wire,)+
                }
            }

            /// Human-readable label (underscores become spaces)
            pub fn label(&self) -> String {
                self.as_str().replace('_', " ")
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($wire => Ok($name::$variant),)+
                    other => Err(Error::InvalidInput(format!("Unknown {}: {}", $what, other))),
                }
            }
        }
    };
}

wire_enum! {
    /// Deal pipeline stages, in pipeline order
    DealStage, "deal stage" {
        Lead => "Lead",
        Contacted => "Contacted",
        Underwriting => "Underwriting",
        LoiSent => "LOI_Sent",
        LoiAccepted => "LOI_Accepted",
        Psa => "PSA",
        ClosedWon => "Closed_Won",
        ClosedLost => "Closed_Lost",
    }
}

wire_enum! {
    TaskStatus, "task status" {
        Open => "Open",
        Done => "Done",
        Snoozed => "Snoozed",
    }
}

wire_enum! {
    TaskPriority, "task priority" {
        Low => "Low",
        Medium => "Medium",
        High => "High",
    }
}

wire_enum! {
    /// Kinds of logged interaction
    TouchpointType, "touchpoint type" {
        Call => "Call",
        Email => "Email",
        Text => "Text",
        Meeting => "Meeting",
        Note => "Note",
    }
}

wire_enum! {
    /// Role a contact plays on a deal
    ContactRole, "contact role" {
        ListingBroker => "Listing_Broker",
        Owner => "Owner",
        PropertyManager => "Property_Manager",
        Lender => "Lender",
        Vendor => "Vendor",
        Other => "Other",
    }
}

impl Default for DealStage {
    fn default() -> Self {
        DealStage::Lead
    }
}

impl Default for TaskStatus {
    fn default() -> Self {
        TaskStatus::Open
    }
}

impl Default for TaskPriority {
    fn default() -> Self {
        TaskPriority::Medium
    }
}

impl TaskPriority {
    /// Sort rank, higher is more urgent
    pub fn rank(&self) -> u8 {
        match self {
            TaskPriority::Low => 0,
            TaskPriority::Medium => 1,
            TaskPriority::High => 2,
        }
    }
}

/// Broker, owner, vendor, lender...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Contact {
    pub id: i64,
    pub name: String,
    pub company: Option<String>,
    pub role_type: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
    pub notes: Option<String>,
    /// Comma-separated
    pub tags: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Contact {
    pub fn tag_list(&self) -> Vec<&str> {
        self.tags
            .as_deref()
            .unwrap_or("")
            .split(',')
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .collect()
    }
}

/// Multifamily property
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Property {
    pub id: i64,
    pub name: Option<String>,
    pub address: String,
    pub city: Option<String>,
    pub state: Option<String>,
    pub zip_code: Option<String>,
    pub units: Option<i64>,
    pub year_built: Option<i64>,
    /// A, B, C...
    pub property_class: Option<String>,
    pub estimated_value_min: Option<f64>,
    pub estimated_value_max: Option<f64>,
    /// 1-10
    pub buyer_interest: Option<i64>,
    /// 1-10
    pub seller_motivation: Option<i64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Property {
    /// Name, falling back to the street address
    pub fn display_name(&self) -> &str {
        match self.name.as_deref() {
            Some(name) if !name.trim().is_empty() => name,
            _ => &self.address,
        }
    }
}

/// Ownership link between a property and a contact
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct PropertyOwner {
    pub id: i64,
    pub property_id: i64,
    pub contact_id: i64,
    pub ownership_percentage: Option<f64>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Owner row joined with the names needed for display
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct OwnerListing {
    #[sqlx(flatten)]
    pub owner: PropertyOwner,
    pub contact_name: String,
    pub property_label: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Deal {
    pub id: i64,
    pub deal_name: String,
    pub property_id: i64,
    pub stage: DealStage,
    pub target_close_date: Option<NaiveDate>,
    pub asking_price: Option<f64>,
    /// Free-form URLs, one per line or comma-separated
    pub links: Option<String>,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Deal {
    pub fn link_list(&self) -> Vec<&str> {
        self.links
            .as_deref()
            .unwrap_or("")
            .split(|c| c == ',' || c == '\n')
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect()
    }
}

/// Deal joined with its property's display label
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct DealListing {
    #[sqlx(flatten)]
    pub deal: Deal,
    pub property_label: String,
}

/// Role a contact plays on a deal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct DealContactRole {
    pub id: i64,
    pub deal_id: i64,
    pub contact_id: i64,
    pub role: ContactRole,
    pub notes: Option<String>,
    pub created_at: NaiveDateTime,
}

/// Role joined with contact and deal names
#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct RoleListing {
    #[sqlx(flatten)]
    pub role: DealContactRole,
    pub contact_name: String,
    pub deal_name: String,
}

/// Logged call, email, meeting...
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Touchpoint {
    pub id: i64,
    pub deal_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub touchpoint_type: TouchpointType,
    pub occurred_at: NaiveDateTime,
    pub summary: String,
    pub next_step: Option<String>,
    pub created_at: NaiveDateTime,
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TouchpointListing {
    #[sqlx(flatten)]
    pub touchpoint: Touchpoint,
    pub contact_name: Option<String>,
    pub deal_name: Option<String>,
}

/// Follow-up reminder
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, FromRow)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub due_date: NaiveDate,
    pub status: TaskStatus,
    pub priority: TaskPriority,
    pub deal_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub property_id: Option<i64>,
    pub completed_at: Option<NaiveDateTime>,
    pub created_at: NaiveDateTime,
    pub updated_at: NaiveDateTime,
}

impl Task {
    /// Past due and not done
    pub fn is_overdue(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date < today
    }

    /// Due today and not done
    pub fn is_due_today(&self, today: NaiveDate) -> bool {
        self.status != TaskStatus::Done && self.due_date == today
    }
}

#[derive(Debug, Clone, PartialEq, FromRow)]
pub struct TaskListing {
    #[sqlx(flatten)]
    pub task: Task,
    pub contact_name: Option<String>,
    pub deal_name: Option<String>,
    pub property_label: Option<String>,
}

/// Current UTC date, the reference for overdue / due-today checks
pub fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}
