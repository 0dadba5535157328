//! Admin service gateway
//!
//! `AdminService` is the RPC-shaped surface of the service. It validates raw
//! inputs, applies the configured settlement deadline, delegates to the
//! orchestrator or to the back-office collaborators, and turns every failure
//! into a [`Status`] whose code is the underlying error's [`ErrorKind`].
//!
//! Validation happens before any store is touched.
//!
//! [`ErrorKind`]: crate::types::ErrorKind

pub mod messages;
pub mod status;

pub use messages::{
    AdminDashboardResponse, ApproveFundReleaseRequest, ApproveRejectCategoryRequest,
    BlockUnblockUserRequest, CategoryRequestView, CreateCategoryRequest, FundReleaseView,
    MessageResponse, UserView,
};
pub use status::Status;

use crate::config::ServiceConfig;
use crate::core::{
    BlockedUserSet, CategoryRequestStore, Collaborators, DashboardSource, FundReleaseRequestStore,
    SettlementOrchestrator, UserDirectory,
};
use crate::types::{Decision, RequestId};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tracing::{info, warn};
use uuid::Uuid;

/// Admin operations exposed to back-office clients
pub struct AdminService {
    orchestrator: SettlementOrchestrator,
    requests: Arc<dyn FundReleaseRequestStore>,
    blocked_users: Arc<dyn BlockedUserSet>,
    users: Arc<dyn UserDirectory>,
    categories: Arc<dyn CategoryRequestStore>,
    dashboard: Arc<dyn DashboardSource>,
    settlement_deadline: Option<Duration>,
}

impl AdminService {
    pub fn new(collaborators: Collaborators, config: &ServiceConfig) -> Self {
        let orchestrator = SettlementOrchestrator::new(&collaborators)
            .with_admin_account(config.admin_account.clone())
            .with_overdraft_policy(config.overdraft);

        AdminService {
            orchestrator,
            requests: collaborators.requests,
            blocked_users: collaborators.blocked_users,
            users: collaborators.users,
            categories: collaborators.categories,
            dashboard: collaborators.dashboard,
            settlement_deadline: config.settlement_deadline,
        }
    }

    /// List every fund-release request, oldest first
    pub fn get_fund_release(&self) -> Result<Vec<FundReleaseView>, Status> {
        let requests = self.requests.list()?;
        Ok(requests.into_iter().map(FundReleaseView::from).collect())
    }

    /// Approve or reject a fund-release request
    ///
    /// The configured settlement deadline, if any, starts counting now.
    pub async fn approve_fund_release(
        &self,
        request: ApproveFundReleaseRequest,
    ) -> Result<MessageResponse, Status> {
        let deadline = self.settlement_deadline.map(|d| Instant::now() + d);
        self.approve_fund_release_with_deadline(request, deadline)
            .await
    }

    /// Approve or reject a fund-release request under a caller-supplied deadline
    ///
    /// # Errors
    ///
    /// - `InvalidArgument` if the request ID is empty or not a UUID, or the
    ///   status is not `approved` or `rejected`
    /// - any error kind produced by the settlement, unchanged
    pub async fn approve_fund_release_with_deadline(
        &self,
        request: ApproveFundReleaseRequest,
        deadline: Option<Instant>,
    ) -> Result<MessageResponse, Status> {
        let request_id = parse_request_id(&request.request_id)?;
        let decision = parse_decision(&request.status)?;

        self.orchestrator
            .settle(request_id, decision, deadline)
            .await?;

        Ok(MessageResponse::new(format!(
            "Fund release request has been {}",
            decision
        )))
    }

    /// Approve or reject a vendor's category request
    pub fn approve_reject_category(
        &self,
        request: ApproveRejectCategoryRequest,
    ) -> Result<MessageResponse, Status> {
        if request.vendor_id.trim().is_empty()
            || request.category_id.trim().is_empty()
            || request.status.trim().is_empty()
        {
            warn!("Category decision missing required fields");
            return Err(Status::invalid_argument(
                "VendorID, CategoryID, and Status are required",
            ));
        }

        let vendor_id = parse_uuid("vendor ID", &request.vendor_id)?;
        let category_id = parse_uuid("category ID", &request.category_id)?;
        let decision = parse_decision(&request.status)?;

        self.categories
            .resolve_request(vendor_id, category_id, decision)?;

        info!(
            vendor_id = %vendor_id,
            category_id = %category_id,
            decision = %decision,
            "Category request resolved"
        );
        Ok(MessageResponse::new(format!(
            "Category request has been {}",
            decision
        )))
    }

    /// List pending vendor category requests
    ///
    /// An empty queue is reported as `NotFound`.
    pub fn get_requests(&self) -> Result<Vec<CategoryRequestView>, Status> {
        let requests = self.categories.list_requests()?;
        if requests.is_empty() {
            return Err(Status::not_found("no requests in the queue"));
        }
        Ok(requests.into_iter().map(CategoryRequestView::from).collect())
    }

    pub fn create_category(
        &self,
        request: CreateCategoryRequest,
    ) -> Result<MessageResponse, Status> {
        let name = request.name.trim();
        if name.is_empty() {
            warn!("Category name is empty");
            return Err(Status::invalid_argument("Category name cannot be empty"));
        }

        let category = self.categories.create_category(name)?;
        info!(category_id = %category.category_id, name = %category.name, "Category created");
        Ok(MessageResponse::new(format!(
            "Category '{}' has been created",
            category.name
        )))
    }

    pub fn block_user(&self, request: BlockUnblockUserRequest) -> Result<MessageResponse, Status> {
        let user_id = parse_user_id(&request.user_id)?;
        self.blocked_users.add(user_id)?;
        info!(user_id, "User blocked");
        Ok(MessageResponse::new(format!("User {} has been blocked", user_id)))
    }

    pub fn unblock_user(
        &self,
        request: BlockUnblockUserRequest,
    ) -> Result<MessageResponse, Status> {
        let user_id = parse_user_id(&request.user_id)?;
        self.blocked_users.remove(user_id)?;
        info!(user_id, "User unblocked");
        Ok(MessageResponse::new(format!(
            "User {} has been unblocked",
            user_id
        )))
    }

    /// List every user; a user counts as blocked if either the directory
    /// flag is set or the user is in the blocked set
    pub fn list_users(&self) -> Result<Vec<UserView>, Status> {
        let users = self.users.list_users()?;
        users
            .into_iter()
            .map(|user| -> Result<UserView, Status> {
                let in_blocked_set = self.blocked_users.is_member(&user.user_id)?;
                Ok(UserView::new(user, in_blocked_set))
            })
            .collect()
    }

    pub fn get_admin_dashboard(&self) -> Result<AdminDashboardResponse, Status> {
        Ok(self.dashboard.dashboard_stats()?.into())
    }
}

fn parse_request_id(raw: &str) -> Result<RequestId, Status> {
    if raw.trim().is_empty() {
        warn!("Fund release decision without request ID");
        return Err(Status::invalid_argument("Request ID is required"));
    }
    parse_uuid("request ID", raw)
}

fn parse_uuid(field: &str, raw: &str) -> Result<Uuid, Status> {
    Uuid::parse_str(raw.trim()).map_err(|_| {
        warn!(field, value = raw, "Malformed identifier");
        Status::invalid_argument(format!("Invalid {} format: '{}'", field, raw))
    })
}

fn parse_decision(raw: &str) -> Result<Decision, Status> {
    raw.parse::<Decision>().map_err(|message| {
        warn!(status = raw, "Invalid decision status");
        Status::invalid_argument(message)
    })
}

fn parse_user_id(raw: &str) -> Result<&str, Status> {
    let user_id = raw.trim();
    if user_id.is_empty() {
        warn!("User ID is empty");
        return Err(Status::invalid_argument("User ID cannot be empty"));
    }
    Ok(user_id)
}
