//! Blocked-user set
//!
//! A plain set of user identifiers with no ordering or eviction.

use super::traits::BlockedUserSet;
use crate::types::StoreError;
use dashmap::DashSet;

#[derive(Debug, Default)]
pub struct InMemoryBlockedUserSet {
    members: DashSet<String>,
}

impl InMemoryBlockedUserSet {
    pub fn new() -> Self {
        Self::default()
    }
}

impl BlockedUserSet for InMemoryBlockedUserSet {
    fn add(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.members.insert(user_id.to_string()))
    }

    fn remove(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.members.remove(user_id).is_some())
    }

    fn is_member(&self, user_id: &str) -> Result<bool, StoreError> {
        Ok(self.members.contains(user_id))
    }
}
