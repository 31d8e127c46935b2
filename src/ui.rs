use colored::Colorize;
use declarative::{DiffEntry, NodeError, NodeResult, Plan, RunSummary};

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

// ============================================================================
// Apply Results
// ============================================================================

/// Render one apply result, decorated when `color` is set
pub fn result(result: &NodeResult, color: bool) -> String {
    if !color {
        return result.to_string();
    }

    let description = result.description();
    let status = match &result.error {
        None if result.changed => description.green(),
        None => description.normal(),
        Some(NodeError::Cancelled) => description.yellow(),
        Some(NodeError::UpstreamFailed { .. }) => description.dimmed(),
        Some(_) => description.red(),
    };
    let success = if result.success {
        "true".green()
    } else {
        "false".red()
    };

    let mut out = format!(
        "{}:\n\tStatus: {}\n\tSuccess: {}",
        result.id.bold(),
        status,
        success
    );
    if let Some(err) = &result.error {
        let err = err.to_string();
        let err = if result.is_cancelled() {
            err.yellow()
        } else {
            err.red()
        };
        out.push_str(&format!("\n\tError: {}", err));
    }
    out
}

/// The closing line of an apply run
pub fn apply_summary(summary: &RunSummary, color: bool) -> String {
    let line = format!(
        "Apply complete. {} changes, {} successful, {} failed",
        summary.total, summary.success, summary.failures
    );
    decorate_outcome(line, summary.failures == 0, color)
}

// ============================================================================
// Plans
// ============================================================================

/// Render one plan entry
pub fn plan_entry(entry: &DiffEntry, color: bool) -> String {
    let state = match &entry.error {
        Some(err) => format!("check failed: {}", err),
        None if entry.will_change => format!("{:?} => will change", entry.current),
        None => format!("{:?} (no change)", entry.current),
    };

    if !color {
        return format!(
            "{}:\n\tStatus: {}\n\tWill change: {}",
            entry.id, state, entry.will_change
        );
    }

    let state = match &entry.error {
        Some(_) => state.red(),
        None if entry.will_change => state.yellow(),
        None => state.normal(),
    };
    format!(
        "{}:\n\tStatus: {}\n\tWill change: {}",
        entry.id.bold(),
        state,
        entry.will_change
    )
}

/// The closing line of a plan run
pub fn plan_summary(plan: &Plan, color: bool) -> String {
    let line = format!(
        "Plan complete. {} checks, {} will change, {} errors",
        plan.len(),
        plan.changes(),
        plan.errors()
    );
    decorate_outcome(line, plan.errors() == 0, color)
}

fn decorate_outcome(line: String, ok: bool, color: bool) -> String {
    match (color, ok) {
        (false, _) => line,
        (true, true) => line.green().to_string(),
        (true, false) => line.red().to_string(),
    }
}

// ============================================================================
// Tests
// ============================================================================
