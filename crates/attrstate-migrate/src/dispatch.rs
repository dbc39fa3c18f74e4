use std::collections::BTreeMap;

use attrstate_types::InstanceState;
use tracing::{debug, info};

use crate::error::{MigrateError, MigrateResult};
use crate::step::{MigrationStep, StepReport};

/// Result of a single [`Migrator::migrate`] call.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MigrationOutcome {
    /// No state was supplied.
    Absent,
    /// The state was already current, or had no attributes.
    Unchanged,
    /// One step ran and the state is now at `to_version`.
    Migrated { to_version: u32, report: StepReport },
}

impl MigrationOutcome {
    pub fn is_migrated(&self) -> bool {
        matches!(self, Self::Migrated { .. })
    }
}

/// Version-indexed dispatch table of migration steps.
///
/// Versions are states; each registered step is the transition from its
/// `from_version` to the next. `current_version` is terminal.
pub struct Migrator<M = ()> {
    current_version: u32,
    steps: BTreeMap<u32, Box<dyn MigrationStep<M>>>,
}

impl<M> Migrator<M> {
    /// Create a dispatcher with no steps.
    pub fn new(current_version: u32) -> Self {
        Self {
            current_version,
            steps: BTreeMap::new(),
        }
    }

    /// Register the transition out of `step.from_version()`.
    ///
    /// Fails if a step for that version is already registered, or if it
    /// starts at or beyond the current version.
    pub fn register(&mut self, step: Box<dyn MigrationStep<M>>) -> MigrateResult<()> {
        let from = step.from_version();
        if from >= self.current_version {
            return Err(MigrateError::config(format!(
                "step '{}' migrates from v{from}, which is not below current v{}",
                step.name(),
                self.current_version
            )));
        }
        if let Some(existing) = self.steps.get(&from) {
            return Err(MigrateError::config(format!(
                "step '{}' duplicates '{}' for v{from}",
                step.name(),
                existing.name()
            )));
        }
        self.steps.insert(from, step);
        Ok(())
    }

    /// Builder-style [`Self::register`].
    pub fn with_step(mut self, step: Box<dyn MigrationStep<M>>) -> MigrateResult<Self> {
        self.register(step)?;
        Ok(self)
    }

    pub fn current_version(&self) -> u32 {
        self.current_version
    }

    /// Versions that have a registered transition, ascending.
    pub fn versions(&self) -> impl Iterator<Item = u32> + '_ {
        self.steps.keys().copied()
    }

    /// Whether `version` is current or has a registered transition.
    pub fn supports(&self, version: u32) -> bool {
        version == self.current_version || self.steps.contains_key(&version)
    }

    /// Run the one step that migrates `version` to `version + 1`.
    ///
    /// An absent state or a state without attributes is returned untouched,
    /// as is a state already at the current version. The state's
    /// `schema_version` is set to the new version after a successful step.
    /// On error the state is unchanged.
    pub fn migrate(
        &self,
        version: u32,
        state: Option<&mut InstanceState>,
        meta: &M,
    ) -> MigrateResult<MigrationOutcome> {
        debug!(version, current = self.current_version, "performing migration");

        let Some(state) = state else {
            return Ok(MigrationOutcome::Absent);
        };
        if state.attributes.is_empty() {
            debug!(id = %state.id, "state has no attributes; nothing to migrate");
            return Ok(MigrationOutcome::Unchanged);
        }
        if version == self.current_version {
            return Ok(MigrationOutcome::Unchanged);
        }

        let step = self
            .steps
            .get(&version)
            .ok_or(MigrateError::UnsupportedVersion {
                version,
                current: self.current_version,
            })?;

        let to_version = version + 1;
        info!(id = %state.id, step = step.name(), from = version, to = to_version, "migrating state");
        let report = step.apply(state, meta)?;
        state.schema_version = to_version;
        debug!(
            id = %state.id,
            elements = report.elements_migrated(),
            rekeyed = report.elements_rekeyed(),
            "migration step done"
        );

        Ok(MigrationOutcome::Migrated { to_version, report })
    }

    /// Chain [`Self::migrate`] from the state's own `schema_version` up to
    /// the current version, one step per call.
    ///
    /// Each step is atomic; if a later step fails, earlier ones stay applied
    /// and `schema_version` records how far the state got.
    pub fn upgrade(
        &self,
        mut state: Option<&mut InstanceState>,
        meta: &M,
    ) -> MigrateResult<Vec<StepReport>> {
        let mut reports = Vec::new();
        while let Some(current) = state.as_deref_mut() {
            let version = current.schema_version;
            if version > self.current_version {
                return Err(MigrateError::UnsupportedVersion {
                    version,
                    current: self.current_version,
                });
            }
            match self.migrate(version, Some(current), meta)? {
                MigrationOutcome::Migrated { report, .. } => reports.push(report),
                MigrationOutcome::Absent | MigrationOutcome::Unchanged => break,
            }
        }
        Ok(reports)
    }
}

impl<M> std::fmt::Debug for Migrator<M> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Migrator")
            .field("current_version", &self.current_version)
            .field("steps", &self.steps.keys().collect::<Vec<_>>())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use attrstate_types::AttributeStore;

    /// Appends a marker attribute so tests can observe which steps ran.
    struct MarkStep {
        from: u32,
        name: String,
    }

    impl MarkStep {
        fn boxed(from: u32) -> Box<dyn MigrationStep<Vec<u32>>> {
            Box::new(Self {
                from,
                name: format!("mark-{from}"),
            })
        }
    }

    impl MigrationStep<Vec<u32>> for MarkStep {
        fn from_version(&self) -> u32 {
            self.from
        }

        fn name(&self) -> &str {
            &self.name
        }

        fn apply(&self, state: &mut InstanceState, meta: &Vec<u32>) -> MigrateResult<StepReport> {
            if meta.contains(&self.from) {
                return Err(MigrateError::config(format!("refusing v{}", self.from)));
            }
            state.attributes.insert(format!("ran.{}", self.from), "1");
            Ok(StepReport {
                step: self.name.clone(),
                ..StepReport::default()
            })
        }
    }

    fn migrator() -> Migrator<Vec<u32>> {
        Migrator::new(3)
            .with_step(MarkStep::boxed(0))
            .and_then(|m| m.with_step(MarkStep::boxed(1)))
            .and_then(|m| m.with_step(MarkStep::boxed(2)))
            .unwrap()
    }

    fn state(version: u32) -> InstanceState {
        let attributes: AttributeStore = [("name", "x")].into_iter().collect();
        InstanceState::new("r-1", attributes, version)
    }

    #[test]
    fn absent_state_is_absent() {
        for version in [0, 3, 99] {
            assert_eq!(
                migrator().migrate(version, None, &vec![]).unwrap(),
                MigrationOutcome::Absent
            );
        }
    }

    #[test]
    fn empty_attributes_are_unchanged() {
        let mut state = InstanceState::default();
        let outcome = migrator().migrate(0, Some(&mut state), &vec![]).unwrap();
        assert_eq!(outcome, MigrationOutcome::Unchanged);
        assert_eq!(state, InstanceState::default());
    }

    #[test]
    fn single_step_per_call() {
        let mut state = state(0);
        let outcome = migrator().migrate(0, Some(&mut state), &vec![]).unwrap();
        assert!(matches!(outcome, MigrationOutcome::Migrated { to_version: 1, .. }));
        assert_eq!(state.schema_version, 1);
        assert!(state.attributes.contains_key("ran.0"));
        assert!(!state.attributes.contains_key("ran.1"));
    }

    #[test]
    fn current_version_is_terminal() {
        let mut state = state(3);
        let before = state.clone();
        let outcome = migrator().migrate(3, Some(&mut state), &vec![]).unwrap();
        assert_eq!(outcome, MigrationOutcome::Unchanged);
        assert_eq!(state, before);
    }

    #[test]
    fn unknown_version_is_unsupported() {
        let mut state = state(7);
        let err = migrator().migrate(7, Some(&mut state), &vec![]).unwrap_err();
        assert!(matches!(err, MigrateError::UnsupportedVersion { version: 7, current: 3 }));
    }

    #[test]
    fn gap_in_table_is_unsupported() {
        let migrator: Migrator<Vec<u32>> = Migrator::new(3).with_step(MarkStep::boxed(0)).unwrap();
        let mut state = state(1);
        assert!(matches!(
            migrator.migrate(1, Some(&mut state), &vec![]),
            Err(MigrateError::UnsupportedVersion { version: 1, .. })
        ));
    }

    #[test]
    fn failed_step_keeps_version() {
        let mut state = state(1);
        assert!(migrator().migrate(1, Some(&mut state), &vec![1]).is_err());
        assert_eq!(state.schema_version, 1);
    }

    #[test]
    fn upgrade_chains_to_current() {
        let mut state = state(0);
        let reports = migrator().upgrade(Some(&mut state), &vec![]).unwrap();
        let names: Vec<&str> = reports.iter().map(|r| r.step.as_str()).collect();
        assert_eq!(names, vec!["mark-0", "mark-1", "mark-2"]);
        assert_eq!(state.schema_version, 3);
    }

    #[test]
    fn upgrade_stops_at_failing_step() {
        let mut state = state(0);
        assert!(migrator().upgrade(Some(&mut state), &vec![2]).is_err());
        assert_eq!(state.schema_version, 2);
        assert!(state.attributes.contains_key("ran.1"));
    }

    #[test]
    fn upgrade_rejects_future_versions() {
        let mut state = state(4);
        assert!(matches!(
            migrator().upgrade(Some(&mut state), &vec![]),
            Err(MigrateError::UnsupportedVersion { version: 4, .. })
        ));
    }

    #[test]
    fn upgrade_of_absent_state_is_empty() {
        assert!(migrator().upgrade(None, &vec![]).unwrap().is_empty());
    }

    #[test]
    fn register_rejects_duplicates_and_terminal_steps() {
        let mut migrator: Migrator<Vec<u32>> = Migrator::new(2);
        migrator.register(MarkStep::boxed(0)).unwrap();
        assert!(matches!(migrator.register(MarkStep::boxed(0)), Err(MigrateError::Config(_))));
        assert!(matches!(migrator.register(MarkStep::boxed(2)), Err(MigrateError::Config(_))));
        assert_eq!(migrator.versions().collect::<Vec<_>>(), vec![0]);
        assert!(migrator.supports(2));
        assert!(!migrator.supports(1));
    }
}
