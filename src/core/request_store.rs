//! In-memory fund-release request store
//!
//! Requests are kept in a `DashMap` keyed by request ID. Every mutation runs
//! while holding the entry's write guard, which makes the claim a true
//! compare-and-set: the status and claim are checked and updated under one
//! lock, never read in one call and written in another.

use super::traits::FundReleaseRequestStore;
use crate::types::{
    ClaimToken, FundReleaseRequest, RequestId, RequestStatus, SettlementClaim, StoreError,
};
use chrono::Utc;
use dashmap::DashMap;

const ENTITY: &str = "fund release request";

#[derive(Debug, Clone)]
struct StoredRequest {
    request: FundReleaseRequest,
    claim: Option<ClaimToken>,
}

/// Thread-safe request store backed by `DashMap`
#[derive(Debug, Default)]
pub struct InMemoryRequestStore {
    requests: DashMap<RequestId, StoredRequest>,
}

impl InMemoryRequestStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether a settlement currently holds the claim on this request
    pub fn is_claimed(&self, request_id: RequestId) -> bool {
        self.requests
            .get(&request_id)
            .map(|entry| entry.claim.is_some())
            .unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }
}

impl FundReleaseRequestStore for InMemoryRequestStore {
    fn insert(&self, request: FundReleaseRequest) -> Result<(), StoreError> {
        let request_id = request.request_id;
        let mut inserted = false;
        self.requests.entry(request_id).or_insert_with(|| {
            inserted = true;
            StoredRequest {
                request,
                claim: None,
            }
        });

        if inserted {
            Ok(())
        } else {
            Err(StoreError::duplicate(ENTITY, request_id))
        }
    }

    fn get(&self, request_id: RequestId) -> Result<FundReleaseRequest, StoreError> {
        self.requests
            .get(&request_id)
            .map(|entry| entry.request.clone())
            .ok_or_else(|| StoreError::not_found(ENTITY, request_id))
    }

    fn list(&self) -> Result<Vec<FundReleaseRequest>, StoreError> {
        let mut requests: Vec<FundReleaseRequest> = self
            .requests
            .iter()
            .map(|entry| entry.value().request.clone())
            .collect();
        requests.sort_by(|a, b| {
            a.created_at
                .cmp(&b.created_at)
                .then_with(|| a.request_id.cmp(&b.request_id))
        });
        Ok(requests)
    }

    fn claim_for_settlement(&self, request_id: RequestId) -> Result<SettlementClaim, StoreError> {
        let mut entry = self
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| StoreError::not_found(ENTITY, request_id))?;
        let stored = entry.value_mut();

        if stored.request.status.is_terminal() {
            return Err(StoreError::already_terminal(
                request_id,
                stored.request.status,
            ));
        }
        if stored.claim.is_some() {
            return Err(StoreError::SettlementInProgress {
                request: request_id,
            });
        }

        let claim = SettlementClaim::new(stored.request.clone());
        stored.claim = Some(claim.token());
        Ok(claim)
    }

    fn release_claim(
        &self,
        request_id: RequestId,
        claim: &SettlementClaim,
    ) -> Result<(), StoreError> {
        let mut entry = self
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| StoreError::not_found(ENTITY, request_id))?;
        let stored = entry.value_mut();

        if stored.claim != Some(claim.token()) {
            return Err(StoreError::ClaimMismatch {
                request: request_id,
            });
        }
        stored.claim = None;
        Ok(())
    }

    fn set_status(
        &self,
        request_id: RequestId,
        claim: &SettlementClaim,
        status: RequestStatus,
    ) -> Result<FundReleaseRequest, StoreError> {
        let mut entry = self
            .requests
            .get_mut(&request_id)
            .ok_or_else(|| StoreError::not_found(ENTITY, request_id))?;
        let stored = entry.value_mut();

        if stored.claim != Some(claim.token()) {
            return Err(StoreError::ClaimMismatch {
                request: request_id,
            });
        }
        if stored.request.status.is_terminal() || !status.is_terminal() {
            return Err(StoreError::InvalidTransition {
                request: request_id,
                from: stored.request.status,
                to: status,
            });
        }

        stored.request.status = status;
        stored.request.updated_at = Utc::now();
        stored.claim = None;
        Ok(stored.request.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use rust_decimal::Decimal;
    use std::sync::Arc;
    use std::thread;
    use uuid::Uuid;

    fn pending_request() -> FundReleaseRequest {
        FundReleaseRequest::new(
            Uuid::new_v4(),
            Uuid::new_v4(),
            "Summer Fest",
            Decimal::new(50000, 2),
            120,
        )
        .unwrap()
    }

    fn store_with(request: &FundReleaseRequest) -> InMemoryRequestStore {
        let store = InMemoryRequestStore::new();
        store.insert(request.clone()).unwrap();
        store
    }

    #[test]
    fn test_insert_rejects_duplicate_id() {
        let request = pending_request();
        let store = store_with(&request);

        let result = store.insert(request.clone());
        assert!(matches!(result, Err(StoreError::Duplicate { .. })));
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn test_get_unknown_request_is_not_found() {
        let store = InMemoryRequestStore::new();
        let result = store.get(Uuid::new_v4());
        assert!(matches!(result, Err(StoreError::NotFound { .. })));
    }

    #[test]
    fn test_claim_marks_request_without_changing_status() {
        let request = pending_request();
        let store = store_with(&request);

        let claim = store.claim_for_settlement(request.request_id).unwrap();

        assert_eq!(claim.request(), &request);
        assert!(store.is_claimed(request.request_id));
        assert_eq!(
            store.get(request.request_id).unwrap().status,
            RequestStatus::Pending
        );
    }

    #[test]
    fn test_second_claim_is_in_progress_conflict() {
        let request = pending_request();
        let store = store_with(&request);

        let _claim = store.claim_for_settlement(request.request_id).unwrap();
        let result = store.claim_for_settlement(request.request_id);

        assert_eq!(
            result.unwrap_err(),
            StoreError::SettlementInProgress {
                request: request.request_id
            }
        );
    }

    #[rstest]
    #[case(RequestStatus::Approved)]
    #[case(RequestStatus::Rejected)]
    fn test_claim_on_terminal_request_is_conflict(#[case] status: RequestStatus) {
        let request = pending_request().with_status(status);
        let store = store_with(&request);

        let result = store.claim_for_settlement(request.request_id);
        assert_eq!(
            result.unwrap_err(),
            StoreError::already_terminal(request.request_id, status)
        );
    }

    #[test]
    fn test_release_claim_allows_new_claim() {
        let request = pending_request();
        let store = store_with(&request);

        let claim = store.claim_for_settlement(request.request_id).unwrap();
        store.release_claim(request.request_id, &claim).unwrap();

        assert!(!store.is_claimed(request.request_id));
        assert!(store.claim_for_settlement(request.request_id).is_ok());
    }

    #[test]
    fn test_release_with_foreign_claim_is_rejected() {
        let request = pending_request();
        let store = store_with(&request);

        let _held = store.claim_for_settlement(request.request_id).unwrap();
        let foreign = SettlementClaim::new(request.clone());

        let result = store.release_claim(request.request_id, &foreign);
        assert!(matches!(result, Err(StoreError::ClaimMismatch { .. })));
        assert!(store.is_claimed(request.request_id));
    }

    #[test]
    fn test_set_status_finalizes_and_consumes_claim() {
        let request = pending_request();
        let store = store_with(&request);

        let claim = store.claim_for_settlement(request.request_id).unwrap();
        let updated = store
            .set_status(request.request_id, &claim, RequestStatus::Approved)
            .unwrap();

        assert_eq!(updated.status, RequestStatus::Approved);
        assert!(updated.updated_at >= request.updated_at);
        assert!(!store.is_claimed(request.request_id));

        // Terminal status never changes again
        let result = store.set_status(request.request_id, &claim, RequestStatus::Rejected);
        assert!(result.is_err());
        assert_eq!(
            store.get(request.request_id).unwrap().status,
            RequestStatus::Approved
        );
    }

    #[test]
    fn test_set_status_requires_matching_claim() {
        let request = pending_request();
        let store = store_with(&request);

        let foreign = SettlementClaim::new(request.clone());
        let result = store.set_status(request.request_id, &foreign, RequestStatus::Approved);

        assert!(matches!(result, Err(StoreError::ClaimMismatch { .. })));
        assert_eq!(
            store.get(request.request_id).unwrap().status,
            RequestStatus::Pending
        );
    }

    #[test]
    fn test_set_status_refuses_pending_target() {
        let request = pending_request();
        let store = store_with(&request);

        let claim = store.claim_for_settlement(request.request_id).unwrap();
        let result = store.set_status(request.request_id, &claim, RequestStatus::Pending);

        assert!(matches!(result, Err(StoreError::InvalidTransition { .. })));
        assert!(store.is_claimed(request.request_id));
    }

    #[test]
    fn test_list_returns_every_request() {
        let store = InMemoryRequestStore::new();
        for _ in 0..5 {
            store.insert(pending_request()).unwrap();
        }
        assert_eq!(store.list().unwrap().len(), 5);
    }

    #[test]
    fn test_concurrent_claims_have_single_winner() {
        let request = pending_request();
        let store = Arc::new(store_with(&request));
        let mut handles = vec![];

        for _ in 0..32 {
            let store_clone = Arc::clone(&store);
            let id = request.request_id;
            handles.push(thread::spawn(move || {
                store_clone.claim_for_settlement(id).is_ok()
            }));
        }

        let winners = handles
            .into_iter()
            .map(|handle| handle.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
    }
}
