//! Execution engine - applies a plan with UI integration

use anyhow::{Context as AnyhowContext, Result};
use colored::Colorize;
use rayon::prelude::*;
use std::sync::{Arc, Mutex};

use crate::progress;
use crate::resource::{ApplyContext, ApplyResult, Resource};

use super::ExecutionPlan;
use super::differ::{compute_diffs, display_content_diffs, display_diff};

/// Options for execution
#[derive(Debug, Clone)]
pub struct ExecuteOptions {
    /// Don't make changes, just show what would happen
    pub dry_run: bool,
    /// Number of parallel jobs
    pub jobs: usize,
    /// Skip confirmation prompts
    pub yes: bool,
    /// Verbose output
    pub verbose: bool,
}

impl Default for ExecuteOptions {
    fn default() -> Self {
        Self {
            dry_run: false,
            jobs: 4,
            yes: false,
            verbose: false,
        }
    }
}

/// Summary of execution results
#[derive(Debug, Default, PartialEq, Eq)]
pub struct ExecuteSummary {
    pub created: usize,
    pub modified: usize,
    pub removed: usize,
    pub skipped: usize,
    pub failed: usize,
    pub no_change: usize,
}

impl ExecuteSummary {
    pub fn total_changes(&self) -> usize {
        self.created + self.modified + self.removed
    }

    pub fn is_success(&self) -> bool {
        self.failed == 0
    }

    fn add_result(&mut self, result: &ApplyResult) {
        match result {
            ApplyResult::NoChange => self.no_change += 1,
            ApplyResult::Created => self.created += 1,
            ApplyResult::Modified => self.modified += 1,
            ApplyResult::Removed => self.removed += 1,
            ApplyResult::Failed { .. } => self.failed += 1,
            ApplyResult::Skipped { .. } => self.skipped += 1,
        }
    }
}

/// Execute the plan: show the diff, confirm, then converge every resource
pub fn execute(plan: &ExecutionPlan, opts: &ExecuteOptions) -> Result<ExecuteSummary> {
    // 1. Compute and display what will change
    let diffs = compute_diffs(&plan.resources);
    display_diff(&diffs);

    if diffs.is_empty() {
        return Ok(ExecuteSummary {
            no_change: plan.total_resources(),
            ..Default::default()
        });
    }

    if opts.verbose {
        display_content_diffs(&plan.resources);
    }

    if opts.dry_run {
        println!();
        println!("  {} Dry run - no changes made", "ℹ".blue());
        return Ok(ExecuteSummary {
            skipped: diffs.len(),
            ..Default::default()
        });
    }

    // 2. Confirm (unless --yes)
    if !opts.yes && !confirm_proceed()? {
        println!();
        println!("  {} Aborted", "✗".red());
        return Ok(ExecuteSummary {
            skipped: diffs.len(),
            ..Default::default()
        });
    }

    // 3. Apply in parallel; each resource owns a distinct file
    println!();
    println!(
        "  {} Applying {} user fragments to {}...",
        "→".cyan(),
        plan.total_resources(),
        plan.conf_dir.display()
    );

    let results = execute_parallel(&plan.resources, opts.jobs, opts.verbose)?;
    let summary = summarize(&results);

    print_summary(&summary);
    Ok(summary)
}

/// Execute resources in parallel
fn execute_parallel(
    resources: &[Box<dyn Resource>],
    jobs: usize,
    verbose: bool,
) -> Result<Vec<ApplyResult>> {
    let pb = progress::bar(resources.len() as u64, "Applying");
    let results: Arc<Mutex<Vec<ApplyResult>>> = Arc::new(Mutex::new(Vec::new()));

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(jobs.max(1))
        .build()
        .context("Failed to create apply thread pool")?;

    pool.install(|| {
        resources.par_iter().for_each(|resource| {
            let mut ctx = ApplyContext {
                dry_run: false,
                verbose,
            };
            let result = apply_one(resource.as_ref(), &mut ctx);

            let symbol = match &result {
                ApplyResult::NoChange => "○",
                ApplyResult::Created | ApplyResult::Modified | ApplyResult::Removed => "✓",
                ApplyResult::Failed { .. } => "✗",
                ApplyResult::Skipped { .. } => "⊘",
            };

            pb.set_message(format!("{} {}", symbol, resource.id()));
            pb.inc(1);

            push_apply_result(&results, result);
        });
    });

    pb.finish_and_clear();

    into_apply_results(results)
}

/// Apply one resource, turning errors into a failed result
fn apply_one(resource: &dyn Resource, ctx: &mut ApplyContext) -> ApplyResult {
    log::debug!("Applying {}", resource.description());
    match resource.apply(ctx) {
        Ok(result) => {
            if let ApplyResult::Skipped { reason } = &result {
                log::warn!("Skipped {}: {}", resource.id(), reason);
            }
            result
        }
        Err(e) => {
            log::error!("Failed to apply {}: {e:#}", resource.id());
            ApplyResult::Failed {
                error: format!("{e:#}"),
            }
        }
    }
}

fn push_apply_result(results: &Arc<Mutex<Vec<ApplyResult>>>, result: ApplyResult) {
    match results.lock() {
        Ok(mut locked) => locked.push(result),
        Err(poisoned) => poisoned.into_inner().push(result),
    }
}

fn into_apply_results(results: Arc<Mutex<Vec<ApplyResult>>>) -> Result<Vec<ApplyResult>> {
    let mutex = Arc::try_unwrap(results)
        .map_err(|_| anyhow::anyhow!("Failed to collect apply results: shared result state"))?;

    match mutex.into_inner() {
        Ok(collected) => Ok(collected),
        Err(poisoned) => Ok(poisoned.into_inner()),
    }
}

/// Fold results into a summary
fn summarize(results: &[ApplyResult]) -> ExecuteSummary {
    let mut summary = ExecuteSummary::default();
    for result in results {
        summary.add_result(result);
    }
    summary
}

/// Confirm with user
fn confirm_proceed() -> Result<bool> {
    use dialoguer::Confirm;

    let confirmed = Confirm::new()
        .with_prompt("Continue?")
        .default(true)
        .interact()?;

    Ok(confirmed)
}

/// Print final summary
fn print_summary(summary: &ExecuteSummary) {
    println!();
    if summary.is_success() {
        println!("  {} Users converged successfully!", "✓".green().bold());
    } else {
        println!("  {} Users converged with errors", "⚠".yellow().bold());
    }

    if summary.created > 0 {
        println!("    • {} fragments created", summary.created);
    }
    if summary.modified > 0 {
        println!("    • {} fragments modified", summary.modified);
    }
    if summary.removed > 0 {
        println!("    • {} fragments removed", summary.removed);
    }
    if summary.skipped > 0 {
        println!("    • {} fragments skipped", summary.skipped);
    }
    if summary.failed > 0 {
        println!("    • {} {} failed", summary.failed, "fragments".red());
    }
    if summary.total_changes() > 0 {
        println!(
            "    {}",
            "Reload Icinga 2 (e.g. `systemctl reload icinga2`) to pick up the changes".dimmed()
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use icinga_user::{ConvergenceRun, UserParams};
    use std::fs;

    #[test]
    fn push_apply_result_handles_poisoned_mutex() {
        let results: Arc<Mutex<Vec<ApplyResult>>> = Arc::new(Mutex::new(Vec::new()));
        let poisoned = Arc::clone(&results);

        let _ = std::thread::spawn(move || {
            let _guard = poisoned
                .lock()
                .expect("lock should succeed before poisoning");
            panic!("intentional poison");
        })
        .join();

        push_apply_result(&results, ApplyResult::NoChange);

        let len = match results.lock() {
            Ok(locked) => locked.len(),
            Err(poisoned) => poisoned.into_inner().len(),
        };
        assert_eq!(len, 1);
    }

    #[test]
    fn test_summarize_counts_each_kind() {
        let summary = summarize(&[
            ApplyResult::Created,
            ApplyResult::Created,
            ApplyResult::Removed,
            ApplyResult::NoChange,
            ApplyResult::Failed {
                error: "boom".to_string(),
            },
        ]);
        assert_eq!(summary.created, 2);
        assert_eq!(summary.removed, 1);
        assert_eq!(summary.total_changes(), 3);
        assert!(!summary.is_success());
    }

    fn plan_in(dir: &std::path::Path) -> ExecutionPlan {
        let mut run = ConvergenceRun::new();
        run.resolve("dummyuser1", &UserParams::present()).unwrap();
        run.resolve("dummyuser2", &UserParams::present().with_password("default"))
            .unwrap();
        run.resolve("olduser", &UserParams::absent()).unwrap();
        ExecutionPlan::from_run(&run, dir).unwrap()
    }

    #[test]
    fn test_execute_converges_and_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("user_olduser.conf"), "stale\n").unwrap();

        let plan = plan_in(dir.path());
        let opts = ExecuteOptions {
            yes: true,
            jobs: 2,
            ..Default::default()
        };

        let summary = execute(&plan, &opts).unwrap();
        assert_eq!(summary.created, 2);
        assert_eq!(summary.removed, 1);
        assert!(summary.is_success());
        assert!(!dir.path().join("user_olduser.conf").exists());

        let again = execute(&plan, &opts).unwrap();
        assert_eq!(again.total_changes(), 0);
        assert_eq!(again.no_change, 3);
    }

    #[test]
    fn test_execute_dry_run_writes_nothing() {
        let dir = tempfile::tempdir().unwrap();
        let plan = plan_in(dir.path());
        let opts = ExecuteOptions {
            dry_run: true,
            ..Default::default()
        };

        let summary = execute(&plan, &opts).unwrap();
        assert_eq!(summary.total_changes(), 0);
        assert_eq!(summary.skipped, 2);
        assert!(!dir.path().join("user_dummyuser1.conf").exists());
    }
}
