//! Audible catalog `products` search responses.

use exn::{OptionExt, ResultExt};
use serde::Deserialize;
use time::Date;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::models::{Audiobook, Availability, Runtime, clean_list, clean_opt};

#[derive(Debug, Deserialize)]
struct Products {
    #[serde(default)]
    products: Vec<Product>,
}

#[derive(Debug, Deserialize)]
struct Product {
    asin: Option<String>,
    #[serde(default)]
    narrators: Vec<Contributor>,
    runtime_length_min: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct Contributor {
    name: Option<String>,
}

/// Decode a `1.0/catalog/products` response into an audiobook check result.
///
/// An empty product list is a successful check that found nothing, which is
/// recorded as [`Availability::Unavailable`]. Links point at `{site_base}/pd/{asin}`.
#[instrument(level = "debug", skip(json), fields(json_size = json.len()))]
pub fn parse_products(json: &str, site_base: &str, checked_on: Date) -> Result<Audiobook> {
    let products: Products = serde_json::from_str(json).or_raise(|| ErrorKind::InvalidPayload("audible products"))?;
    let Some(product) = products.products.into_iter().next() else {
        return Ok(Audiobook::unavailable(checked_on));
    };
    let asin = clean_opt(product.asin).ok_or_raise(|| ErrorKind::MissingField("products.asin"))?;
    Ok(Audiobook {
        status: Availability::Available,
        narrators: clean_list(product.narrators.into_iter().filter_map(|n| n.name)),
        runtime: product.runtime_length_min.filter(|m| *m > 0).map(Runtime::from_minutes),
        link: Some(format!("{}/pd/{}", site_base.trim_end_matches('/'), asin)),
        checked_on,
    })
}
