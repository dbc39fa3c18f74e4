use std::path::Path;

use attrstate_types::ElementSchema;
use serde::{Deserialize, Serialize};

use crate::dispatch::Migrator;
use crate::error::{MigrateError, MigrateResult};
use crate::step::{FieldPatch, SetRewriteStep};

/// Declarative description of a resource's migration steps.
///
/// ```toml
/// current_version = 1
///
/// [[steps]]
/// from_version = 0
/// collection = "ebs_block_device"
/// set = { no_device = "" }
///
/// [steps.schema]
/// device_name = { type = "string", required = true }
/// no_device = { type = "bool", optional = true }
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationPlan {
    /// The version states are migrated towards.
    pub current_version: u32,
    #[serde(default)]
    pub steps: Vec<StepConfig>,
}

/// One collection re-keying step.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepConfig {
    pub from_version: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Collection attribute name.
    pub collection: String,
    /// Element schema the collection is migrated into.
    pub schema: ElementSchema,
    #[serde(flatten)]
    pub patch: FieldPatch,
}

impl MigrationPlan {
    pub fn from_toml_str(input: &str) -> MigrateResult<Self> {
        toml::from_str(input).map_err(|e| MigrateError::config(e.to_string()))
    }

    pub fn from_path(path: impl AsRef<Path>) -> MigrateResult<Self> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path)
            .map_err(|e| MigrateError::config(format!("reading {}: {e}", path.display())))?;
        Self::from_toml_str(&input)
    }

    pub fn to_toml_string(&self) -> MigrateResult<String> {
        toml::to_string_pretty(self).map_err(|e| MigrateError::config(e.to_string()))
    }

    /// Build the step for each entry; elements are hashed with the
    /// provider-wide scheme.
    pub fn build_steps(&self) -> Vec<SetRewriteStep> {
        self.steps.iter().map(StepConfig::build).collect()
    }

    /// Build a dispatcher holding every step of the plan.
    pub fn into_migrator<M>(self) -> MigrateResult<Migrator<M>> {
        let mut migrator = Migrator::new(self.current_version);
        for step in self.build_steps() {
            migrator.register(Box::new(step))?;
        }
        Ok(migrator)
    }

    /// The step config migrating out of `version`, if any.
    pub fn step_for(&self, version: u32) -> Option<&StepConfig> {
        self.steps.iter().find(|s| s.from_version == version)
    }
}

impl StepConfig {
    pub fn build(&self) -> SetRewriteStep {
        let step = SetRewriteStep::new(self.from_version, self.collection.clone(), self.schema.clone())
            .with_patch(self.patch.clone());
        match &self.name {
            Some(name) => step.with_name(name.clone()),
            None => step,
        }
    }
}
