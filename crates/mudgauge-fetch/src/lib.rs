//! mudgauge-fetch — typed fetchers for the CoreMUD HTTP API.
//!
//! Each fetcher issues one GET against a templated upstream URL, decodes
//! the JSON body into a `mudgauge-core` record, and reports transport and
//! decode failures as [`FetchError`]. Fetchers are stateless and never
//! publish metrics themselves.
//!
//! # Endpoints
//!
//! | Fetcher | Path |
//! |---|---|
//! | `fetch_market` | `/stocks` |
//! | `fetch_shop_names` | `/shop/{type}` |
//! | `fetch_shop` | `/shop/{type}/{name}` |
//! | `fetch_armor_shops` | `/shop/armour` |
//! | `fetch_armor_shop` | `/shop/armour/{name}` |

pub mod armour;
pub mod client;
pub mod error;
pub mod market;
pub mod shops;

#[cfg(any(test, feature = "test-util"))]
pub mod fake;

pub use client::UpstreamClient;
pub use error::{FetchError, FetchResult};
