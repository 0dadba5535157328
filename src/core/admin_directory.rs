//! In-memory back-office directory
//!
//! Holds users, vendor category requests, the category catalogue and bookings.
//! Implements the three pass-through collaborator traits used by the
//! non-settlement gateway operations.

use super::traits::{CategoryRequestStore, DashboardSource, UserDirectory};
use crate::types::{
    Booking, Category, CategoryRequest, DashboardStats, Decision, Role, StoreError, User, UserId,
};
use dashmap::{DashMap, DashSet};
use uuid::Uuid;

#[derive(Debug, Default)]
pub struct InMemoryAdminDirectory {
    users: DashMap<UserId, User>,
    category_requests: DashMap<(Uuid, Uuid), CategoryRequest>,
    vendor_categories: DashSet<(Uuid, Uuid)>,
    /// Keyed by lowercased name so names are unique regardless of case
    categories: DashMap<String, Category>,
    bookings: DashMap<Uuid, Booking>,
}

impl InMemoryAdminDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_user(&self, user: User) {
        self.users.insert(user.user_id.clone(), user);
    }

    pub fn add_category_request(&self, request: CategoryRequest) {
        self.category_requests
            .insert((request.vendor_id, request.category_id), request);
    }

    pub fn add_booking(&self, booking: Booking) {
        self.bookings.insert(booking.booking_id, booking);
    }

    /// Whether the vendor has been approved for the category
    pub fn has_vendor_category(&self, vendor_id: Uuid, category_id: Uuid) -> bool {
        self.vendor_categories.contains(&(vendor_id, category_id))
    }
}

impl UserDirectory for InMemoryAdminDirectory {
    fn list_users(&self) -> Result<Vec<User>, StoreError> {
        let mut users: Vec<User> = self.users.iter().map(|e| e.value().clone()).collect();
        users.sort_by(|a, b| a.user_id.cmp(&b.user_id));
        Ok(users)
    }
}

impl CategoryRequestStore for InMemoryAdminDirectory {
    fn list_requests(&self) -> Result<Vec<CategoryRequest>, StoreError> {
        let mut requests: Vec<CategoryRequest> = self
            .category_requests
            .iter()
            .map(|e| *e.value())
            .collect();
        requests.sort_by_key(|r| (r.vendor_id, r.category_id));
        Ok(requests)
    }

    fn resolve_request(
        &self,
        vendor_id: Uuid,
        category_id: Uuid,
        decision: Decision,
    ) -> Result<(), StoreError> {
        let (_, request) = self
            .category_requests
            .remove(&(vendor_id, category_id))
            .ok_or_else(|| {
                StoreError::not_found("category request", format!("{}/{}", vendor_id, category_id))
            })?;

        if decision == Decision::Approved {
            self.vendor_categories
                .insert((request.vendor_id, request.category_id));
        }
        Ok(())
    }

    fn create_category(&self, name: &str) -> Result<Category, StoreError> {
        let key = name.trim().to_lowercase();
        let mut created = None;
        self.categories.entry(key).or_insert_with(|| {
            let category = Category {
                category_id: Uuid::new_v4(),
                name: name.trim().to_string(),
            };
            created = Some(category.clone());
            category
        });
        created.ok_or_else(|| StoreError::duplicate("category", name.trim()))
    }
}

impl DashboardSource for InMemoryAdminDirectory {
    fn dashboard_stats(&self) -> Result<DashboardStats, StoreError> {
        let mut stats = DashboardStats::default();
        for user in self.users.iter() {
            match user.role {
                Role::Vendor => stats.total_vendors += 1,
                Role::Client => stats.total_clients += 1,
                Role::Admin => {}
            }
        }
        for booking in self.bookings.iter() {
            stats.total_bookings += 1;
            stats.total_revenue = stats
                .total_revenue
                .checked_add(booking.price)
                .ok_or_else(|| StoreError::arithmetic_overflow("revenue total", "dashboard"))?;
        }
        Ok(stats)
    }
}
