//! Diff computation and display

use crate::resource::{Resource, ResourceDiff, ResourceState};
use colored::Colorize;
use similar::{ChangeTag, TextDiff};

/// Compute diffs for all resources
pub fn compute_diffs(resources: &[Box<dyn Resource>]) -> Vec<ResourceDiff> {
    resources
        .iter()
        .filter_map(|r| match ResourceDiff::from_resource(r.as_ref()) {
            Ok(diff) => diff,
            Err(e) => {
                log::warn!("Could not determine state of {}: {e:#}", r.id());
                None
            }
        })
        .collect()
}

/// Display a list of diffs in a user-friendly format
pub fn display_diff(diffs: &[ResourceDiff]) {
    if diffs.is_empty() {
        println!();
        println!("  {} No changes needed", "✓".green());
        return;
    }

    println!();
    println!(
        "┌─ {} ─────────────────────────────────────────┐",
        "Icinga Users Diff".bold()
    );
    println!("│");

    for diff in diffs {
        let symbol = if diff.is_addition() {
            "+".green()
        } else if diff.is_removal() {
            "-".red()
        } else {
            "~".yellow()
        };

        let state_desc = match (&diff.current, &diff.desired) {
            (ResourceState::Absent, ResourceState::Present { .. }) => "(new user)".to_string(),
            (_, ResourceState::Absent) => "(will remove)".to_string(),
            (ResourceState::Modified { from, to }, _) => format!("{from} → {to}"),
            (ResourceState::Unknown, _) => "(state unknown)".to_string(),
            _ => String::new(),
        };

        println!(
            "│   {} {:<30} {}",
            symbol,
            diff.resource_id,
            state_desc.dimmed()
        );
    }
    println!("│");

    let additions = diffs.iter().filter(|d| d.is_addition()).count();
    let removals = diffs.iter().filter(|d| d.is_removal()).count();
    let modifications = diffs.len() - additions - removals;

    println!("├─────────────────────────────────────────────────────┤");
    println!(
        "│ Summary: {} changes ({} new, {} modified, {} removed)",
        diffs.len().to_string().bold(),
        additions.to_string().green(),
        modifications.to_string().yellow(),
        removals.to_string().red()
    );
    println!("└─────────────────────────────────────────────────────┘");
}

/// Print a unified diff of fragment content for each changed resource
pub fn display_content_diffs(resources: &[Box<dyn Resource>]) {
    for resource in resources {
        let current = resource.current_content().unwrap_or_default();
        let desired = resource.desired_content().unwrap_or_default();
        if current == desired {
            continue;
        }

        println!();
        println!("  {}", resource.id().bold());
        for line in content_diff_lines(&current, &desired) {
            match line.chars().next() {
                Some('+') => println!("    {}", line.green()),
                Some('-') => println!("    {}", line.red()),
                _ => println!("    {}", line.dimmed()),
            }
        }
    }
}

/// Line-level diff of two fragments with credentials masked
pub fn content_diff_lines(current: &str, desired: &str) -> Vec<String> {
    let current = mask_credentials(current);
    let desired = mask_credentials(desired);
    let diff = TextDiff::from_lines(&current, &desired);

    diff.iter_all_changes()
        .map(|change| {
            let sign = match change.tag() {
                ChangeTag::Delete => '-',
                ChangeTag::Insert => '+',
                ChangeTag::Equal => ' ',
            };
            format!("{sign}{}", change.value().trim_end_matches('\n'))
        })
        .collect()
}

/// Replace password values so they never reach the terminal
pub fn mask_credentials(content: &str) -> String {
    content
        .lines()
        .map(|line| {
            if line.trim_start().starts_with("vars.password") {
                let indent = &line[..line.len() - line.trim_start().len()];
                format!("{indent}vars.password = \"********\"")
            } else {
                line.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mask_credentials() {
        let content = "object User \"u\" {\n  vars.password = \"s3cr3t\"\n}\n";
        let masked = mask_credentials(content);
        assert!(!masked.contains("s3cr3t"));
        assert!(masked.contains("  vars.password = \"********\""));
    }

    #[test]
    fn test_content_diff_lines() {
        let current = "object User \"u\" {\n}\n";
        let desired = "object User \"u\" {\n  display_name = \"u\"\n}\n";
        let lines = content_diff_lines(current, desired);
        assert!(lines.contains(&"+  display_name = \"u\"".to_string()));
        assert!(lines.contains(&" object User \"u\" {".to_string()));
    }

    #[test]
    fn test_content_diff_hides_password_changes() {
        let current = "  vars.password = \"old\"\n";
        let desired = "  vars.password = \"new\"\n";
        let lines = content_diff_lines(current, desired);
        assert!(lines.iter().all(|l| !l.contains("old") && !l.contains("new")));
    }
}
