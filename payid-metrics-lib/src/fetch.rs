//! Host-supplied count queries
//!
//! The metrics manager never talks to the PayID store itself. The host hands
//! it one fetcher for address counts and one for the PayID total; plain async
//! closures work through the blanket impls below.

use crate::error::Result;
use crate::types::AddressCount;
use async_trait::async_trait;
use std::future::Future;

/// Source of address counts grouped by (payment network, environment)
#[async_trait]
pub trait AddressCountFetcher: Send + Sync {
    async fn fetch_address_counts(&self) -> Result<Vec<AddressCount>>;
}

/// Source of the total number of PayIDs
#[async_trait]
pub trait PayIdCountFetcher: Send + Sync {
    async fn fetch_payid_count(&self) -> Result<u64>;
}

#[async_trait]
impl<F, Fut> AddressCountFetcher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<Vec<AddressCount>>> + Send,
{
    async fn fetch_address_counts(&self) -> Result<Vec<AddressCount>> {
        (self)().await
    }
}

#[async_trait]
impl<F, Fut> PayIdCountFetcher for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = Result<u64>> + Send,
{
    async fn fetch_payid_count(&self) -> Result<u64> {
        (self)().await
    }
}
