//! Execution planner - turns a resolved run into fragment resources

use anyhow::{Result, bail};
use icinga_user::ConvergenceRun;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::resource::{Resource, UserFragment};

/// Resources to converge, in declaration order
pub struct ExecutionPlan {
    pub resources: Vec<Box<dyn Resource>>,
    pub conf_dir: PathBuf,
}

impl ExecutionPlan {
    /// Build a plan with one fragment per declared user.
    ///
    /// Fails when two identifiers sanitize to the same file name, since
    /// they would overwrite each other.
    pub fn from_run(run: &ConvergenceRun, conf_dir: &Path) -> Result<Self> {
        let mut seen: HashMap<String, String> = HashMap::new();
        let mut resources: Vec<Box<dyn Resource>> = Vec::with_capacity(run.len());

        for decl in run.declarations() {
            let file_name = decl.file_name();
            if let Some(other) = seen.insert(file_name.clone(), decl.identifier.clone()) {
                bail!(
                    "Users '{}' and '{}' both map to fragment {}",
                    other,
                    decl.identifier,
                    file_name
                );
            }
            resources.push(Box::new(UserFragment::new(decl, conf_dir)));
        }

        log::debug!(
            "Planned {} fragments under {}",
            resources.len(),
            conf_dir.display()
        );

        Ok(Self {
            resources,
            conf_dir: conf_dir.to_path_buf(),
        })
    }

    /// Keep only resources whose id contains `target`
    pub fn filter_by_target(self, target: Option<&str>) -> Self {
        match target {
            None => self,
            Some(t) => Self {
                resources: self
                    .resources
                    .into_iter()
                    .filter(|r| matches_filter(r.as_ref(), t))
                    .collect(),
                conf_dir: self.conf_dir,
            },
        }
    }

    pub fn total_resources(&self) -> usize {
        self.resources.len()
    }

    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

/// Check if a resource id contains the target filter
pub fn matches_filter(resource: &dyn Resource, target: &str) -> bool {
    resource.id().contains(target)
}

#[cfg(test)]
mod tests {
    use super::*;
    use icinga_user::UserParams;

    #[test]
    fn test_plan_keeps_declaration_order() {
        let mut run = ConvergenceRun::new();
        run.resolve("zeta", &UserParams::present()).unwrap();
        run.resolve("alpha", &UserParams::absent()).unwrap();

        let plan = ExecutionPlan::from_run(&run, Path::new("/tmp/conf")).unwrap();
        let ids: Vec<_> = plan.resources.iter().map(|r| r.id()).collect();
        assert_eq!(ids, ["zeta", "alpha"]);
    }

    #[test]
    fn test_plan_rejects_file_name_collisions() {
        let mut run = ConvergenceRun::new();
        run.resolve("john doe", &UserParams::present()).unwrap();
        run.resolve("john_doe", &UserParams::present()).unwrap();

        let err = ExecutionPlan::from_run(&run, Path::new("/tmp/conf"))
            .err()
            .unwrap();
        assert!(err.to_string().contains("user_john_doe.conf"));
    }

    #[test]
    fn test_filter_by_target() {
        let mut run = ConvergenceRun::new();
        for id in ["dummyuser1", "dummyuser2", "admin"] {
            run.resolve(id, &UserParams::present()).unwrap();
        }

        let plan = ExecutionPlan::from_run(&run, Path::new("/tmp/conf"))
            .unwrap()
            .filter_by_target(Some("dummy"));
        assert_eq!(plan.total_resources(), 2);

        let plan = ExecutionPlan::from_run(&run, Path::new("/tmp/conf"))
            .unwrap()
            .filter_by_target(None);
        assert_eq!(plan.total_resources(), 3);
    }
}
