//! mudgauge-collector — turns upstream fetches into gauge values.
//!
//! Two ways of getting data out of the upstream API live here:
//!
//! ```text
//! Scheduler (push)
//!   ├── run() → one tick every poll interval until shutdown
//!   └── run_once() → market, armour-shops, armour-inventory steps
//!         ├── MarketJob  → commodity_price / commodity_change
//!         └── ArmourJob  → coremud_armour_shops / shop_inventory
//!
//! ShopCollector (pull)
//!   └── collect() → coremud_shops samples, at most once per min interval
//! ```
//!
//! Every step and every shop is its own unit of failure: errors are logged
//! and the unit is skipped. Nothing is written for a unit whose fetch
//! failed, so previously published values stay in place.

pub mod armour;
pub mod market;
pub mod scheduler;
pub mod shops;

pub use armour::ArmourJob;
pub use market::MarketJob;
pub use scheduler::{CycleReport, Scheduler};
pub use shops::{SHOP_DESC, ShopCollector, ShopSample};
