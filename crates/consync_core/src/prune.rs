//! Ingestion-time field pruning for long-lived list views.
//!
//! Large or rarely-detailed collections keep only what the list view needs:
//! identity (`uid`), display name, namespace, creation timestamp, labels,
//! plus whatever fields the view's filter predicate inspects. Omitting a
//! filtered-on field silently breaks filtering, so projections are built
//! from an explicit keep-list rather than a drop-list.

use crate::models::ResourceObject;
use crate::session::PruneFn;

/// Projection keeping object metadata and kind but none of the flattened
/// remainder (`spec`, `status`, ...).
pub fn metadata_only() -> PruneFn<ResourceObject> {
    keep_extra_fields(&[])
}

/// Projection keeping object metadata plus the named top-level fields of the
/// flattened remainder.
///
/// Any field the session's filter predicate inspects must be listed here.
pub fn keep_extra_fields(keep: &'static [&'static str]) -> PruneFn<ResourceObject> {
    Box::new(move |mut item: ResourceObject| {
        item.extra.retain(|key, _| keep.contains(&key.as_str()));
        item
    })
}
