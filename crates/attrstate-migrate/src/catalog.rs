//! Built-in migrations for resources whose state layout has changed.

/// Launch configuration: `ebs_block_device` gained `no_device` in v1.
pub mod launch_configuration {
    use attrstate_types::{AttributeSchema, ElementSchema, FieldType};

    use crate::dispatch::Migrator;
    use crate::error::MigrateResult;
    use crate::step::{FieldPatch, SetRewriteStep};

    pub const RESOURCE: &str = "launch_configuration";
    pub const EBS_BLOCK_DEVICE: &str = "ebs_block_device";
    pub const CURRENT_VERSION: u32 = 1;

    /// `ebs_block_device` element schema before `no_device` existed.
    pub fn ebs_block_device_v0() -> ElementSchema {
        ElementSchema::new()
            .with_attribute("delete_on_termination", AttributeSchema::optional(FieldType::Bool))
            .with_attribute("device_name", AttributeSchema::required(FieldType::String))
            .with_attribute("encrypted", AttributeSchema::optional_computed(FieldType::Bool))
            .with_attribute("iops", AttributeSchema::optional_computed(FieldType::Int))
            .with_attribute("snapshot_id", AttributeSchema::optional_computed(FieldType::String))
            .with_attribute("volume_size", AttributeSchema::optional_computed(FieldType::Int))
            .with_attribute("volume_type", AttributeSchema::optional_computed(FieldType::String))
    }

    /// Current `ebs_block_device` element schema.
    pub fn ebs_block_device_v1() -> ElementSchema {
        ebs_block_device_v0().with_attribute("no_device", AttributeSchema::optional(FieldType::Bool))
    }

    /// v0 -> v1: adds `no_device` and clears `delete_on_termination`, both as
    /// empty raw values, then re-keys every block device.
    pub fn v0_to_v1() -> SetRewriteStep {
        SetRewriteStep::new(0, EBS_BLOCK_DEVICE, ebs_block_device_v1())
            .with_name("launch_configuration ebs_block_device v0->v1")
            .with_patch(
                FieldPatch::new()
                    .set("no_device", "")
                    .set("delete_on_termination", ""),
            )
    }

    pub fn migrator<M>() -> MigrateResult<Migrator<M>> {
        Migrator::new(CURRENT_VERSION).with_step(Box::new(v0_to_v1()))
    }

}
