use std::collections::BTreeMap;

use attrstate_types::{AttributeStore, CollectionPath, ElementFields, ElementKey};

use crate::error::{MigrateError, MigrateResult};

/// Elements of one collection, keyed by their current element key.
pub type ExtractedElements = BTreeMap<ElementKey, ElementFields>;

/// Group a collection's flat keys into per-element field maps.
///
/// The cardinality key is skipped. A collection with no element keys yields
/// an empty map. Read-only.
pub fn extract_elements(
    store: &AttributeStore,
    collection: &CollectionPath,
) -> MigrateResult<ExtractedElements> {
    let prefix = collection.prefix();
    let count_key = collection.count_key();
    let mut elements = ExtractedElements::new();

    for (key, value) in store.iter_prefix(&prefix) {
        if key == count_key {
            continue;
        }
        let malformed = || MigrateError::MalformedKey {
            collection: collection.name().to_string(),
            key: key.to_string(),
        };
        let (element, field) = collection.split_field_key(key).ok_or_else(malformed)?;
        let element = ElementKey::new(element).map_err(|_| malformed())?;
        elements
            .entry(element)
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    Ok(elements)
}
