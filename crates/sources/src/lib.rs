//! Upstream data sources for stablemap
//!
//! Each upstream is reached through a trait so the service can be run
//! against live APIs or fixed data:
//!
//! - [`ExchangeSource`] - exchange listing and base asset price
//! - [`OnChainSource`] - stablecoin supply per chain
//! - [`VolumeSource`] - verified 24h stablecoin volume
//!
//! HTTP clients for CoinGecko and DefiLlama are behind the `client`
//! feature. Response parsing is always available and tested without
//! network access.

pub mod coingecko;
pub mod defillama;
pub mod error;
pub mod fixture;
pub mod traits;

pub use error::{SourceError, SourceResult};
pub use fixture::{FixtureData, StaticSources};
pub use traits::{ExchangeSource, OnChainSource, VolumeSource};

#[cfg(feature = "client")]
pub use coingecko::CoinGeckoClient;
#[cfg(feature = "client")]
pub use defillama::DefiLlamaClient;
