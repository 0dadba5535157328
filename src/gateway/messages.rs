//! Request and response messages of the admin service
//!
//! Identifiers and statuses arrive as strings and are validated by the
//! gateway, so request messages stay close to what a client sends.

use crate::types::{CategoryRequest, DashboardStats, FundReleaseRequest, RequestStatus, Role, User};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveFundReleaseRequest {
    pub request_id: String,
    pub status: String,
}

/// Response carrying only a confirmation message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    pub fn new(message: impl Into<String>) -> Self {
        MessageResponse {
            message: message.into(),
        }
    }
}

/// One row of `get_fund_release`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FundReleaseView {
    pub request_id: Uuid,
    pub event_id: Uuid,
    pub event_name: String,
    pub amount: Decimal,
    pub tickets: u32,
    pub status: RequestStatus,
}

impl From<FundReleaseRequest> for FundReleaseView {
    fn from(request: FundReleaseRequest) -> Self {
        FundReleaseView {
            request_id: request.request_id,
            event_id: request.event_id,
            event_name: request.event_name,
            amount: request.amount,
            tickets: request.tickets,
            status: request.status,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApproveRejectCategoryRequest {
    pub vendor_id: String,
    pub category_id: String,
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRequestView {
    pub vendor_id: Uuid,
    pub category_id: Uuid,
}

impl From<CategoryRequest> for CategoryRequestView {
    fn from(request: CategoryRequest) -> Self {
        CategoryRequestView {
            vendor_id: request.vendor_id,
            category_id: request.category_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreateCategoryRequest {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BlockUnblockUserRequest {
    pub user_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UserView {
    pub user_id: String,
    pub email: String,
    pub role: Role,
    pub is_blocked: bool,
    pub is_email_verified: bool,
}

impl UserView {
    /// Merge the directory record with blocked-set membership
    pub fn new(user: User, in_blocked_set: bool) -> Self {
        UserView {
            is_blocked: user.is_blocked || in_blocked_set,
            user_id: user.user_id,
            email: user.email,
            role: user.role,
            is_email_verified: user.is_email_verified,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AdminDashboardResponse {
    pub total_vendors: u32,
    pub total_clients: u32,
    pub total_bookings: u32,
    pub total_revenue: Decimal,
}

impl From<DashboardStats> for AdminDashboardResponse {
    fn from(stats: DashboardStats) -> Self {
        AdminDashboardResponse {
            total_vendors: stats.total_vendors,
            total_clients: stats.total_clients,
            total_bookings: stats.total_bookings,
            total_revenue: stats.total_revenue,
        }
    }
}
