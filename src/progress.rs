//! Terminal progress for the provisioning transaction.
//!
//! [`Spinners`] drives one indicatif spinner per step and per rollback
//! delete, finishing each with a check mark or a cross.

use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use provision::{
    Handle, ProgressCallback, ProviderError, ResourceKind, RollbackEntry, RollbackStatus,
};
use std::time::Duration;

/// Spinner-per-operation progress reporter
pub struct Spinners {
    current: Option<ProgressBar>,
    hidden: bool,
}

impl Spinners {
    /// `hidden` suppresses all drawing (quiet mode, JSON output)
    pub fn new(hidden: bool) -> Self {
        Self {
            current: None,
            hidden,
        }
    }

    fn start(&mut self, message: String) {
        let pb = if self.hidden {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        pb.set_style(
            ProgressStyle::default_spinner()
                .template("{spinner:.green} {msg} {elapsed:.dim}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        pb.enable_steady_tick(Duration::from_millis(120));
        pb.set_message(message);
        self.current = Some(pb);
    }

    fn finish(&mut self, line: String) {
        if let Some(pb) = self.current.take() {
            pb.finish_and_clear();
        }
        if !self.hidden {
            println!("{line}");
        }
    }
}

fn describe(kind: ResourceKind, name: &str) -> String {
    format!("{} {}", kind.display_name(), name.bold())
}

impl ProgressCallback for Spinners {
    fn on_step_start(&mut self, index: usize, total: usize, kind: ResourceKind, name: &str) {
        let counter = format!("[{index}/{total}]").blue().bold();
        self.start(format!("{counter} Creating {}", describe(kind, name)));
    }

    fn on_step_complete(
        &mut self,
        kind: ResourceKind,
        name: &str,
        result: Result<&Handle, &ProviderError>,
    ) {
        let line = match result {
            Ok(_) => format!("  {} {}", "✓".green(), describe(kind, name)),
            Err(e) => format!("  {} {} ({})", "✗".red(), describe(kind, name), e.code.red()),
        };
        self.finish(line);
    }

    fn on_rollback_start(&mut self, count: usize) {
        if !self.hidden {
            println!();
            println!(
                "{} Rolling back {count} created resource(s)",
                "↺".yellow().bold()
            );
        }
    }

    fn on_delete_start(&mut self, kind: ResourceKind, name: &str) {
        self.start(format!("Deleting {}", describe(kind, name)));
    }

    fn on_rollback_entry(&mut self, entry: &RollbackEntry) {
        let what = describe(entry.kind, &entry.name);
        let line = match &entry.status {
            RollbackStatus::Deleted => format!("  {} deleted {what}", "✓".green()),
            RollbackStatus::AlreadyAbsent => format!("  {} {what} already gone", "✓".green()),
            RollbackStatus::Skipped { reason } => {
                format!("  {} {what} skipped ({reason})", "-".dimmed())
            }
            RollbackStatus::Failed { error } => {
                format!("  {} could not delete {what}: {error}", "✗".red())
            }
        };
        self.finish(line);
    }
}
