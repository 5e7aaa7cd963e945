//! Upstream data model.
//!
//! These types mirror the JSON bodies served by the CoreMUD API. Every
//! record is rebuilt on each poll; nothing here is merged with a previous
//! fetch.

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::str::FromStr;

/// Decode an explicit JSON `null` as the field's default value.
///
/// The API writes empty lists and unset fields as `null`; a missing field
/// is covered by `#[serde(default)]` on the struct.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Option::unwrap_or_default)
}

// ── Market ─────────────────────────────────────────────────────────

/// Price and last change of one commodity.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct Commodity {
    pub price: f64,
    pub change: f64,
}

/// Commodity name → quote.
pub type CommodityMap = HashMap<String, Commodity>;

/// Market snapshot from `/stocks`.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Market {
    #[serde(default)]
    pub stocks: CommodityMap,
    #[serde(default)]
    pub metals: CommodityMap,
}

/// Which market mapping a commodity came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CommodityKind {
    Stock,
    Metal,
}

impl CommodityKind {
    /// Value of the `type` label.
    pub fn as_str(self) -> &'static str {
        match self {
            CommodityKind::Stock => "stock",
            CommodityKind::Metal => "metal",
        }
    }
}

impl Market {
    /// Every quote in the snapshot tagged with its kind, stocks first.
    pub fn quotes(&self) -> impl Iterator<Item = (&str, CommodityKind, &Commodity)> {
        let stocks = self
            .stocks
            .iter()
            .map(|(name, c)| (name.as_str(), CommodityKind::Stock, c));
        let metals = self
            .metals
            .iter()
            .map(|(name, c)| (name.as_str(), CommodityKind::Metal, c));
        stocks.chain(metals)
    }

    /// Total number of quotes across both mappings.
    pub fn len(&self) -> usize {
        self.stocks.len() + self.metals.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ── Shops ──────────────────────────────────────────────────────────

/// The shop categories the API serves, in collection order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShopType {
    Armour,
    Lizon,
    Refinery,
    Pub,
    Clinic,
    Retail,
    Factory,
}

impl ShopType {
    /// Fixed order used by the shop collector.
    pub const ALL: [ShopType; 7] = [
        ShopType::Armour,
        ShopType::Lizon,
        ShopType::Refinery,
        ShopType::Pub,
        ShopType::Clinic,
        ShopType::Retail,
        ShopType::Factory,
    ];

    /// Upstream path segment and `shop_type` label value.
    pub fn as_str(self) -> &'static str {
        match self {
            ShopType::Armour => "armour",
            ShopType::Lizon => "lizon",
            ShopType::Refinery => "refinery",
            ShopType::Pub => "pub",
            ShopType::Clinic => "clinic",
            ShopType::Retail => "retail",
            ShopType::Factory => "factory",
        }
    }
}

impl fmt::Display for ShopType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ShopType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShopType::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| format!("unknown shop type {s:?}"))
    }
}

/// Shop names listed under one shop type.
///
/// The upstream list occasionally contains empty strings. They are kept
/// here as served; use [`ShopIndex::names`] to iterate the real entries.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct ShopIndex {
    #[serde(default, deserialize_with = "null_as_default")]
    pub shops: Vec<String>,
}

impl ShopIndex {
    /// Non-empty shop names in upstream order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.shops.iter().map(String::as_str).filter(|n| !n.is_empty())
    }
}

/// Profit figures of a shop.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Gain {
    #[serde(deserialize_with = "null_as_default")]
    pub pre_gain: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub net_gain: i64,
}

/// Economic report for one shop.
///
/// Fields that do not apply to a shop's type are absent upstream and
/// decode as zero.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Shop {
    /// Injected by the fetcher; the API does not echo it back.
    #[serde(deserialize_with = "null_as_default")]
    pub shop_name: String,
    /// Overwritten by the fetcher with the type that was queried.
    #[serde(deserialize_with = "null_as_default")]
    pub shop_type: String,
    #[serde(deserialize_with = "null_as_default")]
    pub report_cleared: String,
    #[serde(deserialize_with = "null_as_default")]
    pub gain: Gain,
    #[serde(deserialize_with = "null_as_default")]
    pub denylisted: Vec<String>,
    #[serde(deserialize_with = "null_as_default")]
    pub merchant_name: String,
    #[serde(deserialize_with = "null_as_default")]
    pub owner: String,
    #[serde(deserialize_with = "null_as_default")]
    pub repair_income: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub gerks: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_gerks: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub total_income: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub max_lizon: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub lizon_price: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub gerks_price: i64,

    // pubs
    #[serde(rename = "honey_cap", deserialize_with = "null_as_default")]
    pub honey_capacity: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub drinks_sold: i64,
    #[serde(rename = "honey_inv", deserialize_with = "null_as_default")]
    pub honey_inventory: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bottle_bounty: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub backroom_income: i64,
    /// Pubs and clinics.
    #[serde(rename = "food_inv", deserialize_with = "null_as_default")]
    pub food_inventory: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub recycle_paid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub food_paid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub honey_bounty: i64,
    #[serde(rename = "dirty_inv", deserialize_with = "null_as_default")]
    pub dirty_inventory: i64,
    #[serde(rename = "yeast_inv", deserialize_with = "null_as_default")]
    pub yeast_inventory: i64,
    #[serde(rename = "soap_inv", deserialize_with = "null_as_default")]
    pub soap_inventory: i64,
    #[serde(rename = "bottle_inv", deserialize_with = "null_as_default")]
    pub bottle_inventory: i64,

    // clinics
    #[serde(deserialize_with = "null_as_default")]
    pub corpses: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub regen_cost: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub limb_bounty: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub food_cost: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bleed_bounty: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub limbs: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bounty_paid: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub detox_cost: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub transfuse_cost: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub corpse_bounty: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub revive_cost: i64,
    #[serde(rename = "blood_inv", deserialize_with = "null_as_default")]
    pub blood_inventory: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub bleed_paid: i64,
    #[serde(rename = "limb_inv", deserialize_with = "null_as_default")]
    pub limb_inventory: i64,

    // retail
    #[serde(deserialize_with = "null_as_default")]
    pub in_business: bool,

    // factories
    #[serde(deserialize_with = "null_as_default")]
    pub forge_wear: i64,
    #[serde(deserialize_with = "null_as_default")]
    pub rep_wear: i64,
}

// ── Armour ─────────────────────────────────────────────────────────

/// One armour item offered by an armour shop.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Armour {
    pub price: i64,
    #[serde(rename = "type")]
    pub kind: String,
    pub armor_class: i64,
    pub material: String,
    pub quantity: i64,
    pub autoflag: bool,
}

/// Inventory listing of one armour shop.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ArmorShop {
    /// Injected by the fetcher.
    #[serde(skip)]
    pub name: String,
    /// Item name → item. Ordered by name.
    #[serde(deserialize_with = "null_as_default")]
    pub inventory: BTreeMap<String, Armour>,
}
