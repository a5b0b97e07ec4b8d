//! # Association Detail Cache
//!
//! In-memory cache of loaded association detail keyed by association id.
//! Each entry remembers the checksum it was loaded for; validation evicts
//! entries whose checksum no longer matches the directory listing so that a
//! later load never reads content already known to be stale.

use super::collaborators::CacheValidator;
use super::model::{AssociationDetail, AssociationSummary, InstanceAssociation};
use crate::error::AgentResult;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::future::Future;
use tracing::debug;

#[derive(Debug, Clone)]
pub struct CachedDetail {
    pub checksum: Option<String>,
    pub detail: AssociationDetail,
    pub cached_at: DateTime<Utc>,
}

#[derive(Debug, Default)]
pub struct AssociationCache {
    entries: DashMap<String, CachedDetail>,
}

impl AssociationCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, association_id: &str) -> Option<CachedDetail> {
        self.entries.get(association_id).map(|entry| entry.clone())
    }

    pub fn insert(
        &self,
        association_id: impl Into<String>,
        checksum: Option<String>,
        detail: AssociationDetail,
    ) {
        self.entries.insert(
            association_id.into(),
            CachedDetail {
                checksum,
                detail,
                cached_at: Utc::now(),
            },
        );
    }

    pub fn evict(&self, association_id: &str) -> bool {
        self.entries.remove(association_id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Cache-or-fetch: fill the association's detail from the cache, or call
    /// `fetch` and cache what it returns
    pub async fn get_or_load<F, Fut>(
        &self,
        association: &mut InstanceAssociation,
        fetch: F,
    ) -> AgentResult<()>
    where
        F: FnOnce(AssociationSummary) -> Fut,
        Fut: Future<Output = AgentResult<AssociationDetail>>,
    {
        let association_id = association.association_id()?.to_string();

        if let Some(cached) = self.get(&association_id) {
            debug!(association_id = %association_id, "Association detail served from cache");
            association.detail = Some(cached.detail);
            return Ok(());
        }

        let detail = fetch(association.association.clone()).await?;
        self.insert(
            association_id,
            association.association.checksum.clone(),
            detail.clone(),
        );
        association.detail = Some(detail);
        Ok(())
    }
}

impl CacheValidator for AssociationCache {
    fn validate(&self, association: &InstanceAssociation) {
        let Ok(association_id) = association.association_id() else {
            return;
        };
        let listed = association.association.checksum.as_deref();

        // Without a listed checksum there is nothing to prove the entry fresh
        let evicted = self
            .entries
            .remove_if(association_id, |_, cached| {
                listed.is_none() || cached.checksum.as_deref() != listed
            })
            .is_some();

        if evicted {
            debug!(association_id = %association_id, "Evicted stale association detail from cache");
        }
    }
}
