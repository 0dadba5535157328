//! Back-office types outside the settlement core
//!
//! Users, vendor category requests, bookings and dashboard figures. These are
//! plain records; none of them takes part in settlement.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// User identifier as carried on the wire
pub type UserId = String;

/// Marketplace role of a user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    Vendor,
    Client,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::Admin => f.write_str("admin"),
            Role::Vendor => f.write_str("vendor"),
            Role::Client => f.write_str("client"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct User {
    pub user_id: UserId,
    pub email: String,
    pub role: Role,
    pub is_blocked: bool,
    pub is_email_verified: bool,
}

/// A vendor asking to be listed under a category
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct CategoryRequest {
    pub vendor_id: Uuid,
    pub category_id: Uuid,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Category {
    pub category_id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Booking {
    pub booking_id: Uuid,
    pub client_id: Uuid,
    pub vendor_id: Uuid,
    pub price: Decimal,
}

/// Aggregate figures shown on the admin dashboard
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct DashboardStats {
    pub total_vendors: u32,
    pub total_clients: u32,
    pub total_bookings: u32,
    pub total_revenue: Decimal,
}
