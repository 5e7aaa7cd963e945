//! Armour shop fetchers.
//!
//! Armour shops are listed under the regular shop index, but their detail
//! body also carries an item inventory.

use tracing::{debug, warn};

use mudgauge_core::{ArmorShop, ShopIndex, ShopType};

use crate::client::UpstreamClient;
use crate::error::FetchResult;

impl UpstreamClient {
    /// Fetch the armour shop index from `/shop/armour`.
    pub async fn fetch_armor_shops(&self) -> FetchResult<ShopIndex> {
        self.fetch_shop_names(ShopType::Armour).await
    }

    /// Fetch one armour shop's inventory from `/shop/armour/{name}`.
    pub async fn fetch_armor_shop(&self, name: &str) -> FetchResult<ArmorShop> {
        let url = self.endpoint(&["shop", ShopType::Armour.as_str(), name])?;
        let mut shop: ArmorShop = self.get_json(url).await?;
        shop.name = name.to_string();
        Ok(shop)
    }

    /// Fetch the inventory of every shop in `index`.
    ///
    /// Empty names are skipped. A shop that fails to fetch is logged and
    /// left out; the rest of the index is still fetched.
    pub async fn fetch_armor_shop_inventory(&self, index: &ShopIndex) -> Vec<ArmorShop> {
        let mut shops = Vec::with_capacity(index.shops.len());
        for name in index.names() {
            match self.fetch_armor_shop(name).await {
                Ok(shop) => {
                    debug!(shop = %name, items = shop.inventory.len(), "armour shop fetched");
                    shops.push(shop);
                }
                Err(e) => warn!(shop = %name, error = %e, "armour shop fetch failed, skipping"),
            }
        }
        shops
    }
}
