//! Publisher activity port.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::domain::errors::DomainResult;
use crate::domain::models::PublisherActivity;

/// Read-only aggregation of the sessions opened on a publisher's sites.
#[async_trait]
pub trait PublisherStatisticsRepository: Send + Sync {
    /// Session and task counts for `publisher_id`.
    ///
    /// Activity counters only include sessions whose `last_active` is at or
    /// after `active_since`. An unknown publisher yields all zeros.
    async fn activity(
        &self,
        publisher_id: &str,
        active_since: DateTime<Utc>,
    ) -> DomainResult<PublisherActivity>;
}
