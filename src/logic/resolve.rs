use anyhow::Result;

use crate::model::{parse_id, Id};
use crate::store::traits::DeviceStore;

/// Turn a caller-supplied device reference into a canonical id.
///
/// A canonical literal is returned as-is without an existence check; anything
/// else is looked up as an exact device name. Same-named devices resolve to the
/// earliest created one.
pub async fn resolve_device<S: DeviceStore + ?Sized>(store: &S, reference: &str) -> Result<Option<Id>> {
    if let Some(id) = parse_id(reference) {
        return Ok(Some(id));
    }

    let device = store.find_device_by_name(reference).await?;
    Ok(device.map(|device| device.id))
}

/// Like [`resolve_device`], but canonical literals must also name a stored device.
pub async fn resolve_existing_device<S: DeviceStore + ?Sized>(
    store: &S,
    reference: &str,
) -> Result<Option<Id>> {
    match parse_id(reference) {
        Some(id) => Ok(store.get_device(&id).await?.map(|device| device.id)),
        None => resolve_device(store, reference).await,
    }
}
