use std::collections::BTreeSet;

use attrstate_types::{AttributeStore, CollectionPath, ElementFields, ElementKey};
use tracing::debug;

/// One element's move from its old key to its recomputed key.
///
/// `fields` holds raw string values exactly as they will be stored.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ElementRewrite {
    pub old_key: ElementKey,
    pub new_key: ElementKey,
    pub fields: ElementFields,
}

impl ElementRewrite {
    pub fn is_rekeyed(&self) -> bool {
        self.old_key != self.new_key
    }
}

/// Counts from rewriting a collection.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RewriteSummary {
    pub keys_removed: usize,
    pub keys_written: usize,
    /// Distinct element keys after the rewrite.
    pub elements: usize,
}

/// Move a single element from `old_key` to `new_key`.
///
/// Every key under `<collection>.<old_key>.` is removed, including fields
/// absent from `fields`, then each field is written under `new_key`. Safe
/// when both keys are equal.
pub fn rewrite_element(
    store: &mut AttributeStore,
    collection: &CollectionPath,
    old_key: &ElementKey,
    new_key: &ElementKey,
    fields: &ElementFields,
) -> RewriteSummary {
    let keys_removed = remove_element(store, collection, old_key);
    let keys_written = insert_element(store, collection, new_key, fields);
    RewriteSummary {
        keys_removed,
        keys_written,
        elements: 1,
    }
}

/// Apply a batch of element rewrites to one collection.
///
/// All old element keys are removed before any new key is written, so an
/// element whose new key equals another element's old key survives. When
/// the collection has a cardinality key it is set to the number of distinct
/// new element keys.
pub fn rewrite_collection(
    store: &mut AttributeStore,
    collection: &CollectionPath,
    rewrites: &[ElementRewrite],
) -> RewriteSummary {
    let mut summary = RewriteSummary::default();
    if rewrites.is_empty() {
        return summary;
    }

    for rewrite in rewrites {
        summary.keys_removed += remove_element(store, collection, &rewrite.old_key);
    }

    let mut distinct = BTreeSet::new();
    for rewrite in rewrites {
        summary.keys_written += insert_element(store, collection, &rewrite.new_key, &rewrite.fields);
        distinct.insert(&rewrite.new_key);
    }
    summary.elements = distinct.len();

    let count_key = collection.count_key();
    if store.contains_key(&count_key) {
        store.insert(count_key, summary.elements.to_string());
    }

    summary
}

fn remove_element(store: &mut AttributeStore, collection: &CollectionPath, key: &ElementKey) -> usize {
    let prefix = collection.element_prefix(key);
    let stale: Vec<String> = store
        .iter_prefix(&prefix)
        .map(|(k, _)| k.to_string())
        .collect();
    for k in &stale {
        store.remove(k);
    }
    stale.len()
}

fn insert_element(
    store: &mut AttributeStore,
    collection: &CollectionPath,
    key: &ElementKey,
    fields: &ElementFields,
) -> usize {
    for (field, value) in fields {
        let new_key = collection.field_key(key, field);
        debug!(key = %new_key, value = %value, "migration adding attribute");
        store.insert(new_key, value.clone());
    }
    fields.len()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(raw: &str) -> ElementKey {
        ElementKey::new(raw).unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> ElementFields {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    fn path() -> CollectionPath {
        CollectionPath::new("disk")
    }

    #[test]
    fn moves_fields_to_new_key() {
        let mut store: AttributeStore =
            [("disk.#", "1"), ("disk.1.size", "10"), ("other", "x")].into_iter().collect();
        let summary = rewrite_element(
            &mut store,
            &path(),
            &key("1"),
            &key("2"),
            &fields(&[("size", "10"), ("kind", "")]),
        );
        assert_eq!(store.get("disk.1.size"), None);
        assert_eq!(store.get("disk.2.size"), Some("10"));
        assert_eq!(store.get("disk.2.kind"), Some(""));
        assert_eq!(store.get("other"), Some("x"));
        assert_eq!(summary.keys_removed, 1);
        assert_eq!(summary.keys_written, 2);
    }

    #[test]
    fn dropped_fields_do_not_linger_under_old_key() {
        let mut store: AttributeStore =
            [("disk.1.size", "10"), ("disk.1.legacy", "y")].into_iter().collect();
        rewrite_element(&mut store, &path(), &key("1"), &key("2"), &fields(&[("size", "10")]));
        assert_eq!(store.iter_prefix("disk.1.").count(), 0);
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn identical_keys_are_a_no_op_overwrite() {
        let mut store: AttributeStore = [("disk.1.size", "10")].into_iter().collect();
        let before = store.clone();
        rewrite_element(&mut store, &path(), &key("1"), &key("1"), &fields(&[("size", "10")]));
        assert_eq!(store, before);
    }

    #[test]
    fn prefix_of_another_element_is_not_removed() {
        let mut store: AttributeStore =
            [("disk.1.size", "10"), ("disk.12.size", "20")].into_iter().collect();
        rewrite_element(&mut store, &path(), &key("1"), &key("3"), &fields(&[("size", "10")]));
        assert_eq!(store.get("disk.12.size"), Some("20"));
    }

    #[test]
    fn swapped_keys_survive_batch_rewrite() {
        let mut store: AttributeStore = [
            ("disk.#", "2"),
            ("disk.a.size", "1"),
            ("disk.b.size", "2"),
        ]
        .into_iter()
        .collect();
        let rewrites = vec![
            ElementRewrite {
                old_key: key("a"),
                new_key: key("b"),
                fields: fields(&[("size", "1")]),
            },
            ElementRewrite {
                old_key: key("b"),
                new_key: key("a"),
                fields: fields(&[("size", "2")]),
            },
        ];
        let summary = rewrite_collection(&mut store, &path(), &rewrites);
        assert_eq!(store.get("disk.b.size"), Some("1"));
        assert_eq!(store.get("disk.a.size"), Some("2"));
        assert_eq!(store.get("disk.#"), Some("2"));
        assert_eq!(summary.elements, 2);
    }

    #[test]
    fn colliding_elements_update_cardinality() {
        let mut store: AttributeStore = [
            ("disk.#", "2"),
            ("disk.a.size", "1"),
            ("disk.b.size", "01"),
        ]
        .into_iter()
        .collect();
        let rewrites = vec![
            ElementRewrite {
                old_key: key("a"),
                new_key: key("c"),
                fields: fields(&[("size", "1")]),
            },
            ElementRewrite {
                old_key: key("b"),
                new_key: key("c"),
                fields: fields(&[("size", "1")]),
            },
        ];
        let summary = rewrite_collection(&mut store, &path(), &rewrites);
        assert_eq!(summary.elements, 1);
        assert_eq!(store.get("disk.#"), Some("1"));
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn missing_cardinality_key_is_not_created() {
        let mut store: AttributeStore = [("disk.a.size", "1")].into_iter().collect();
        let rewrites = vec![ElementRewrite {
            old_key: key("a"),
            new_key: key("b"),
            fields: fields(&[("size", "1")]),
        }];
        rewrite_collection(&mut store, &path(), &rewrites);
        assert!(!store.contains_key("disk.#"));
    }

    #[test]
    fn empty_batch_leaves_store_untouched() {
        let mut store: AttributeStore = [("disk.#", "0")].into_iter().collect();
        let before = store.clone();
        assert_eq!(rewrite_collection(&mut store, &path(), &[]), RewriteSummary::default());
        assert_eq!(store, before);
    }
}
