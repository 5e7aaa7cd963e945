//! Shop index and shop detail fetchers.

use mudgauge_core::{Shop, ShopIndex, ShopType};

use crate::client::UpstreamClient;
use crate::error::FetchResult;

impl UpstreamClient {
    /// Fetch the names of all shops of one type from `/shop/{type}`.
    ///
    /// The index is returned as served; empty names are left for the
    /// caller to skip.
    pub async fn fetch_shop_names(&self, shop_type: ShopType) -> FetchResult<ShopIndex> {
        let url = self.endpoint(&["shop", shop_type.as_str()])?;
        self.get_json(url).await
    }

    /// Fetch the report of one shop from `/shop/{type}/{name}`.
    ///
    /// The API does not echo the shop's name or type back, so both are
    /// filled in from the request.
    pub async fn fetch_shop(&self, shop_type: ShopType, shop_name: &str) -> FetchResult<Shop> {
        let url = self.endpoint(&["shop", shop_type.as_str(), shop_name])?;
        let mut shop: Shop = self.get_json(url).await?;
        shop.shop_name = shop_name.to_string();
        shop.shop_type = shop_type.as_str().to_string();
        Ok(shop)
    }
}
