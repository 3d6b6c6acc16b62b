use std::collections::{BTreeSet, HashSet};
use std::fmt;

use crate::models::FieldKind;

#[derive(Debug, Default)]
pub struct RunState {
    /// Job ids with an application record, rebuilt from the store at start.
    pub applied: HashSet<String>,
    pub rejected: HashSet<String>,
    pub blacklisted_companies: HashSet<String>,

    pub easy_applied_count: u32,
    pub external_jobs_count: u32,
    pub failed_count: u32,
    pub skip_count: u32,
    pub total_runs: u32,

    /// `(label, kind)` of fields answered by fallback rather than by rule or AI.
    pub randomly_answered: BTreeSet<(String, FieldKind)>,

    pub daily_limit_reached: bool,
    /// Cleared after the first successful resume upload.
    pub use_new_resume: bool,

    // Operator can turn these off mid-run.
    pub pause_before_submit: bool,
    pub pause_after_filters: bool,
}

impl RunState {
    pub fn new(applied: HashSet<String>) -> Self {
        Self {
            applied,
            use_new_resume: true,
            ..Default::default()
        }
    }

    pub fn record_random(&mut self, label: &str, kind: FieldKind) {
        self.randomly_answered.insert((label.to_string(), kind));
    }

    pub fn summary(&self) -> RunSummary {
        RunSummary {
            total_runs: self.total_runs,
            easy_applied: self.easy_applied_count,
            external: self.external_jobs_count,
            failed: self.failed_count,
            skipped: self.skip_count,
            randomly_answered: self.randomly_answered.iter().cloned().collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSummary {
    pub total_runs: u32,
    pub easy_applied: u32,
    pub external: u32,
    pub failed: u32,
    pub skipped: u32,
    pub randomly_answered: Vec<(String, FieldKind)>,
}

impl RunSummary {
    /// Rough estimate of manual effort avoided.
    pub fn time_saved_secs(&self) -> u64 {
        let secs = self.easy_applied as u64 * 80 + self.external as u64 * 20 + self.skipped as u64 * 10;
        if secs > 0 { secs + 60 } else { 0 }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Total runs:                     {}", self.total_runs)?;
        writeln!(f, "Jobs Easy Applied:              {}", self.easy_applied)?;
        writeln!(f, "External job links collected:   {}", self.external)?;
        writeln!(f, "                              ----------")?;
        writeln!(f, "Total applied or collected:     {}", self.easy_applied + self.external)?;
        writeln!(f, "Failed jobs:                    {}", self.failed)?;
        writeln!(f, "Irrelevant jobs skipped:        {}", self.skipped)?;
        if !self.randomly_answered.is_empty() {
            writeln!(f)?;
            writeln!(f, "Questions answered randomly (review these in your config):")?;
            for (label, kind) in &self.randomly_answered {
                writeln!(f, "  [{}] {}", kind, label)?;
            }
        }
        let secs = self.time_saved_secs();
        write!(f, "\nTime saved: about {} min {} s", secs / 60, secs % 60)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_uses_new_resume() {
        let state = RunState::new(HashSet::from(["1".to_string()]));
        assert!(state.use_new_resume);
        assert!(state.applied.contains("1"));
        assert_eq!(state.failed_count, 0);
    }

    #[test]
    fn test_time_saved() {
        let mut state = RunState::new(HashSet::new());
        assert_eq!(state.summary().time_saved_secs(), 0);

        state.easy_applied_count = 2;
        state.external_jobs_count = 1;
        state.skip_count = 3;
        // 160 + 20 + 30 + 60
        assert_eq!(state.summary().time_saved_secs(), 270);
    }

    #[test]
    fn test_summary_lists_random_answers_once() {
        let mut state = RunState::new(HashSet::new());
        state.record_random("Favourite colour", FieldKind::Text);
        state.record_random("Favourite colour", FieldKind::Text);
        state.record_random("Favourite colour", FieldKind::Textarea);

        let summary = state.summary();
        assert_eq!(summary.randomly_answered.len(), 2);
        let text = summary.to_string();
        assert!(text.contains("[text] Favourite colour"));
        assert!(text.contains("Time saved"));
    }
}
