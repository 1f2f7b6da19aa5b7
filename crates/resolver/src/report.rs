use serde::Serialize;

/// One assignment that could not be classified.
#[derive(Debug, Clone, Serialize)]
pub struct SkippedAssignment {
    pub scope: String,
    pub assignment_name: String,
    pub reason: String,
}

/// End-of-run accounting. Partial, flagged output beats no output, so the
/// report is how degraded facts reach the analyst.
#[derive(Debug, Clone, Default, Serialize)]
pub struct RunReport {
    /// Scopes discovered
    pub archetypes: usize,

    /// Raw assignments seen across all scopes
    pub assignments_seen: usize,

    /// Assignments skipped as unclassifiable
    pub skipped: Vec<SkippedAssignment>,

    /// Transient fetch failures degraded to not-found
    pub fetch_failures: usize,

    /// Initiatives whose declared member count disagreed with the parsed list
    pub count_mismatches: usize,

    /// Rows (initiatives + policies) flagged unresolved
    pub unresolved_rows: usize,
}

impl RunReport {
    /// Log the run summary at the appropriate levels.
    pub fn log_summary(&self) {
        log::info!(
            "Run complete: {} archetypes, {} assignments, {} skipped, {} fetch failures, {} unresolved rows",
            self.archetypes,
            self.assignments_seen,
            self.skipped.len(),
            self.fetch_failures,
            self.unresolved_rows
        );
        for skipped in &self.skipped {
            log::warn!(
                "Skipped assignment '{}' at scope '{}': {}",
                skipped.assignment_name,
                skipped.scope,
                skipped.reason
            );
        }
        if self.count_mismatches > 0 {
            log::warn!(
                "{} initiative(s) declared a member count that disagreed with their member list",
                self.count_mismatches
            );
        }
    }
}
