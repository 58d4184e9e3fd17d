//! Record lookup across cached collection pages.
//!
//! Answers "is this product already in some cached page?" without a
//! network call. The search runs over a snapshot of fresh entries, taken
//! store by store in the order given.

use tracing::debug;

use crate::cache::SharedStore;
use crate::models::{parse_product_id, Product, ProductPage};

/// First record with `id` among `pages`, in iteration order.
pub fn find_in_pages<'a, I>(id: u64, pages: I) -> Option<Product>
where
    I: IntoIterator<Item = &'a ProductPage>,
{
    pages
        .into_iter()
        .find_map(|page| page.find(id))
        .cloned()
}

/// Looks `id` up in every fresh page of `stores`.
///
/// Non-numeric ids are rejected before any store is read.
pub async fn find_cached(id: &str, stores: &[SharedStore<ProductPage>]) -> Option<Product> {
    let Some(id) = parse_product_id(id) else {
        debug!(id, "non-numeric id, skipping cache scan");
        return None;
    };
    find_cached_id(id, stores).await
}

pub(crate) async fn find_cached_id(id: u64, stores: &[SharedStore<ProductPage>]) -> Option<Product> {
    let mut snapshot = Vec::new();
    for store in stores {
        snapshot.extend(store.read().await.valid_entries().into_iter().map(|(_, page)| page));
    }

    let found = find_in_pages(id, &snapshot);
    debug!(id, pages = snapshot.len(), found = found.is_some(), "cross-index lookup");
    found
}
