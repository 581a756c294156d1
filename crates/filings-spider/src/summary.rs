use colored::Colorize;
use std::fmt;
use std::ops::AddAssign;
use tracing::info;

/// Outcome counts of a stage, for one entity or for a whole run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Summary {
    pub succeeded: usize,
    pub skipped: usize,
    pub failed: usize,
}

impl Summary {
    #[cfg(test)]
    pub fn total(&self) -> usize {
        self.succeeded + self.skipped + self.failed
    }

    /// Log the counts; in tui mode they are also printed.
    pub fn report(&self, stage: &str, entity: &str, tui: bool) {
        info!("{stage} summary for {entity}: {self}");
        if tui {
            println!(
                "{stage} summary for {entity}:\n  {} {}\n  {} {}\n  {} {}",
                "[OK]".green(),
                self.succeeded,
                "[SKIP]".yellow(),
                self.skipped,
                "[FAIL]".red(),
                self.failed,
            );
        }
    }
}

impl AddAssign for Summary {
    fn add_assign(&mut self, other: Self) {
        self.succeeded += other.succeeded;
        self.skipped += other.skipped;
        self.failed += other.failed;
    }
}

impl fmt::Display for Summary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "succeeded({}), skipped({}), failed({})",
            self.succeeded, self.skipped, self.failed
        )
    }
}
