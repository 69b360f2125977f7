//! Per-run tally of processed items and its human-readable report.

use std::io::{self, Write};

use chrono::{DateTime, Utc};

/// What happened to one repository or package.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ItemStatus {
    /// Source and destination already match.
    UpToDate,
    /// Differences were replicated successfully.
    Synced,
    /// Differences found, nothing changed because of `--dry-run`.
    WouldSync,
    /// Deliberately left alone (e.g. a linked package).
    Skipped { reason: String },
    Failed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemOutcome {
    pub name: String,
    /// Source and destination were found to differ.
    pub needs_sync: bool,
    pub status: ItemStatus,
}

/// Accumulates outcomes for one run. Discarded once printed.
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Noun used in the report, e.g. "packages".
    pub noun: String,
    pub started_at: DateTime<Utc>,
    outcomes: Vec<ItemOutcome>,
}

impl RunSummary {
    pub fn new(noun: impl Into<String>) -> Self {
        Self {
            noun: noun.into(),
            started_at: Utc::now(),
            outcomes: Vec::new(),
        }
    }

    pub fn record(&mut self, name: impl Into<String>, needs_sync: bool, status: ItemStatus) {
        self.outcomes.push(ItemOutcome {
            name: name.into(),
            needs_sync,
            status,
        });
    }

    /// Fold another run's outcomes into this one.
    pub fn absorb(&mut self, other: RunSummary) {
        self.outcomes.extend(other.outcomes);
    }

    pub fn outcomes(&self) -> &[ItemOutcome] {
        &self.outcomes
    }

    pub fn processed(&self) -> usize {
        self.outcomes.len()
    }

    pub fn needing_sync(&self) -> Vec<&str> {
        self.names(|o| o.needs_sync)
    }

    pub fn synced(&self) -> Vec<&str> {
        self.names(|o| o.status == ItemStatus::Synced)
    }

    pub fn errored(&self) -> Vec<&str> {
        self.names(|o| matches!(o.status, ItemStatus::Failed { .. }))
    }

    pub fn has_errors(&self) -> bool {
        self.outcomes
            .iter()
            .any(|o| matches!(o.status, ItemStatus::Failed { .. }))
    }

    /// 0 when nothing failed, 1 otherwise.
    pub fn exit_code(&self) -> i32 {
        i32::from(self.has_errors())
    }

    fn names(&self, keep: impl Fn(&ItemOutcome) -> bool) -> Vec<&str> {
        self.outcomes
            .iter()
            .filter(|o| keep(o))
            .map(|o| o.name.as_str())
            .collect()
    }

    /// Write the final summary block.
    pub fn render(&self, out: &mut dyn Write) -> io::Result<()> {
        let rule = "-".repeat(64);
        let noun = &self.noun;
        writeln!(out, "{rule}")?;
        writeln!(out, " Total {noun} processed: {}", self.processed())?;

        let needing = self.needing_sync();
        if needing.is_empty() {
            writeln!(out, " {} that required sync: (none)", capitalize(noun))?;
        } else {
            writeln!(out, " {} that required sync: {}", capitalize(noun), needing.len())?;
        }

        let synced = self.synced();
        if synced.is_empty() {
            writeln!(out, " {} successfully synced: (none)", capitalize(noun))?;
        } else {
            writeln!(out, " {} successfully synced:", capitalize(noun))?;
            for name in synced {
                writeln!(out, " * {name}")?;
            }
        }

        let errored = self.errored();
        if !errored.is_empty() {
            writeln!(out, " {} with errors:", capitalize(noun))?;
            for name in errored {
                writeln!(out, " * ERROR {name}")?;
            }
        }

        let elapsed = Utc::now().signed_duration_since(self.started_at);
        writeln!(out, " Elapsed: {}s", elapsed.num_seconds().max(0))?;
        writeln!(out, "{rule}")?;
        Ok(())
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
