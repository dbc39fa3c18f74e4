use std::collections::{BTreeMap, BTreeSet};

use attrstate_hash::{ElementHasher, SchemaHasher};
use attrstate_types::{CollectionPath, ElementFields, ElementKey, ElementSchema, InstanceState};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::coerce::{coerce_fields, CoerceError};
use crate::error::{MigrateError, MigrateResult};
use crate::extract::extract_elements;
use crate::rewrite::{rewrite_collection, ElementRewrite, RewriteSummary};

// ---------------------------------------------------------------------------
// MigrationStep trait
// ---------------------------------------------------------------------------

/// A single schema transition, from `from_version` to `from_version + 1`.
///
/// `M` is caller metadata passed through the dispatcher untouched; steps
/// that do not need it accept any `M`.
pub trait MigrationStep<M>: Send + Sync {
    /// The version this step migrates from.
    fn from_version(&self) -> u32;

    /// Human-readable name of this step.
    fn name(&self) -> &str;

    /// Migrate `state` in place.
    ///
    /// On error the state must be left exactly as it was.
    fn apply(&self, state: &mut InstanceState, meta: &M) -> MigrateResult<StepReport>;
}

/// What a step changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct StepReport {
    pub step: String,
    pub collection: String,
    /// `(old, new)` element keys, including unchanged ones.
    pub key_changes: Vec<(String, String)>,
    pub summary: RewriteSummary,
}

impl StepReport {
    /// Number of elements migrated.
    pub fn elements_migrated(&self) -> usize {
        self.key_changes.len()
    }

    /// Number of elements whose key actually changed.
    pub fn elements_rekeyed(&self) -> usize {
        self.key_changes.iter().filter(|(old, new)| old != new).count()
    }
}

// ---------------------------------------------------------------------------
// FieldPatch
// ---------------------------------------------------------------------------

/// Raw-value edits applied to every element before coercion.
///
/// Applied in order: `remove`, then `defaults` (only where absent), then
/// `set` (always). Values are raw strings exactly as they will be stored.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldPatch {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub set: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub defaults: BTreeMap<String, String>,
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub remove: BTreeSet<String>,
}

impl FieldPatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set(mut self, field: impl Into<String>, raw: impl Into<String>) -> Self {
        self.set.insert(field.into(), raw.into());
        self
    }

    pub fn default_value(mut self, field: impl Into<String>, raw: impl Into<String>) -> Self {
        self.defaults.insert(field.into(), raw.into());
        self
    }

    pub fn remove(mut self, field: impl Into<String>) -> Self {
        self.remove.insert(field.into());
        self
    }

    pub fn apply(&self, fields: &mut ElementFields) {
        fields.retain(|name, _| !self.remove.contains(name));
        for (name, raw) in &self.defaults {
            fields.entry(name.clone()).or_insert_with(|| raw.clone());
        }
        for (name, raw) in &self.set {
            fields.insert(name.clone(), raw.clone());
        }
    }
}

// ---------------------------------------------------------------------------
// SetRewriteStep
// ---------------------------------------------------------------------------

/// Re-keys every element of one content-addressed collection under a new
/// element schema.
///
/// The step is two-phase: every element is patched, coerced, and hashed
/// first, and the store is rewritten only once all of them succeed.
pub struct SetRewriteStep {
    from_version: u32,
    name: String,
    collection: CollectionPath,
    schema: ElementSchema,
    patch: FieldPatch,
    hasher: Box<dyn ElementHasher>,
}

impl SetRewriteStep {
    /// Create a step hashing with the provider-wide [`SchemaHasher`].
    pub fn new(from_version: u32, collection: impl Into<String>, schema: ElementSchema) -> Self {
        let collection = CollectionPath::new(collection);
        Self {
            from_version,
            name: format!("{collection} v{from_version}->v{}", from_version + 1),
            collection,
            schema,
            patch: FieldPatch::default(),
            hasher: Box::new(SchemaHasher),
        }
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_patch(mut self, patch: FieldPatch) -> Self {
        self.patch = patch;
        self
    }

    pub fn with_hasher(mut self, hasher: Box<dyn ElementHasher>) -> Self {
        self.hasher = hasher;
        self
    }

    pub fn collection(&self) -> &CollectionPath {
        &self.collection
    }

    pub fn hasher(&self) -> &dyn ElementHasher {
        self.hasher.as_ref()
    }

    /// Compute every element's rewrite without touching the state.
    pub fn plan(&self, state: &InstanceState) -> MigrateResult<Vec<ElementRewrite>> {
        let elements = extract_elements(&state.attributes, &self.collection)?;
        debug!(
            collection = %self.collection,
            elements = elements.len(),
            "extracted collection elements"
        );

        let mut rewrites = Vec::with_capacity(elements.len());
        for (old_key, mut fields) in elements {
            let new_key = self.rekey(old_key.as_str(), &mut fields)?;
            debug!(
                collection = %self.collection,
                old = %old_key,
                new = %new_key,
                scheme = self.hasher.scheme(),
                "element re-keyed"
            );
            rewrites.push(ElementRewrite {
                old_key,
                new_key,
                fields,
            });
        }
        Ok(rewrites)
    }

    /// Patch, coerce, and hash one element, returning the key it belongs
    /// under. `fields` is left patched; `element` only labels errors.
    pub fn rekey(&self, element: &str, fields: &mut ElementFields) -> MigrateResult<ElementKey> {
        self.patch.apply(fields);

        let coerced =
            coerce_fields(fields, &self.schema).map_err(|e| self.coerce_error(element, e))?;
        debug!(collection = %self.collection, element, ?coerced, "computing element hash");

        self.hasher
            .element_key(&self.schema, &coerced)
            .map_err(|source| MigrateError::Hash {
                collection: self.collection.name().to_string(),
                element: element.to_string(),
                source,
            })
    }

    fn coerce_error(&self, element: &str, err: CoerceError) -> MigrateError {
        let collection = self.collection.name().to_string();
        let element = element.to_string();
        match err {
            CoerceError::Parse {
                field,
                expected,
                value,
                reason,
            } => MigrateError::TypeCoercion {
                collection,
                element,
                field,
                expected,
                value,
                reason,
            },
            CoerceError::NonScalarType { field, field_type } => MigrateError::UnknownFieldType {
                collection,
                field,
                field_type,
            },
            CoerceError::Undeclared { field } => MigrateError::UndeclaredField {
                collection,
                element,
                field,
            },
        }
    }
}

impl<M> MigrationStep<M> for SetRewriteStep {
    fn from_version(&self) -> u32 {
        self.from_version
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn apply(&self, state: &mut InstanceState, _meta: &M) -> MigrateResult<StepReport> {
        let rewrites = self.plan(state)?;
        let summary = rewrite_collection(&mut state.attributes, &self.collection, &rewrites);
        Ok(StepReport {
            step: self.name.clone(),
            collection: self.collection.name().to_string(),
            key_changes: rewrites
                .into_iter()
                .map(|r| (r.old_key.to_string(), r.new_key.to_string()))
                .collect(),
            summary,
        })
    }
}

impl std::fmt::Debug for SetRewriteStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SetRewriteStep")
            .field("from_version", &self.from_version)
            .field("collection", &self.collection)
            .field("attributes", &self.schema.len())
            .field("scheme", &self.hasher.scheme())
            .finish()
    }
}
