//! Package Diff/Copy Executor and build-service project promotion.
//!
//! Packages of a source project are diffed against the destination project
//! and copied over when they differ. Subprojects (`<project>:<name>`) that
//! exist on both sides get the same treatment, and their project
//! configuration is replicated when it differs. Linked packages are never
//! copied: they mirror another package and copying them would break the
//! link graph.

use std::io::Write;

use promote_core::{config::ObsSettings, ItemStatus, RunSummary};
use promote_obs::{BuildService, ObsError};
use similar::TextDiff;

use crate::error::{output_err, SyncError};

const FRAME: &str = "###################################################################";

/// Which parts of the project tree to promote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObsAction {
    /// Packages of the top-level project.
    Packages,
    /// Packages inside each subproject.
    Subprojects,
    /// Project configuration of each subproject.
    ProjectConfigs,
    All,
}

impl ObsAction {
    fn packages(self) -> bool {
        matches!(self, ObsAction::Packages | ObsAction::All)
    }

    fn subproject_packages(self) -> bool {
        matches!(self, ObsAction::Subprojects | ObsAction::All)
    }

    fn subproject_configs(self) -> bool {
        matches!(self, ObsAction::ProjectConfigs | ObsAction::All)
    }
}

/// Drives package promotion between two build-service projects.
pub struct PackagePromotion<'a> {
    pub settings: &'a ObsSettings,
    pub service: &'a dyn BuildService,
    /// Show diffs only; copy and write nothing.
    pub dry_run: bool,
}

impl PackagePromotion<'_> {
    /// Run `action`. Failing to list the top-level project's packages or
    /// subprojects aborts the run; per-package and per-subproject failures
    /// are recorded in the summary.
    pub fn run(&self, action: ObsAction, out: &mut dyn Write) -> Result<RunSummary, SyncError> {
        let settings = self.settings;
        let mut summary = RunSummary::new("packages");

        if action.packages() {
            let packages = self.service.list_packages(&settings.source)?;
            self.promote_packages(&settings.source, &settings.target, &packages, &mut summary, out)?;
        }

        if action.subproject_packages() || action.subproject_configs() {
            let source_subs = self.service.subprojects(&settings.source)?;
            let target_subs = self.service.subprojects(&settings.target)?;
            let prefix = format!("{}:", settings.source);

            for source_sub in &source_subs {
                let Some(suffix) = source_sub.strip_prefix(&prefix) else {
                    continue;
                };
                if self.subproject_excluded(source_sub, suffix) {
                    tracing::info!("excluded subproject {source_sub}");
                    continue;
                }
                let target_sub = format!("{}:{suffix}", settings.target);
                if !target_subs.contains(&target_sub) {
                    writeln!(out, "The project '{target_sub}' does not exist.\n").map_err(output_err)?;
                    continue;
                }

                if action.subproject_packages() {
                    match self.service.list_packages(source_sub) {
                        Ok(packages) => self.promote_packages(
                            source_sub,
                            &target_sub,
                            &packages,
                            &mut summary,
                            out,
                        )?,
                        Err(err) => {
                            self.report_failure(&format!("listing packages of '{source_sub}'"), &err, out)?;
                            summary.record(
                                source_sub.clone(),
                                false,
                                ItemStatus::Failed { reason: err.to_string() },
                            );
                        }
                    }
                }

                if action.subproject_configs() {
                    let label = format!("{target_sub} (prjconf)");
                    let (needs_sync, status) = match self.promote_config(source_sub, &target_sub, out) {
                        Ok(outcome) => outcome,
                        Err(StepError::Output(err)) => return Err(SyncError::Output(err)),
                        Err(StepError::Obs(err)) => {
                            self.report_failure(&format!("promoting config of '{target_sub}'"), &err, out)?;
                            (false, ItemStatus::Failed { reason: err.to_string() })
                        }
                    };
                    summary.record(label, needs_sync, status);
                }
            }
        }

        Ok(summary)
    }

    fn subproject_excluded(&self, full: &str, suffix: &str) -> bool {
        self.settings
            .exclude_subprojects
            .iter()
            .any(|e| e == full || e == suffix)
    }

    fn promote_packages(
        &self,
        source: &str,
        target: &str,
        packages: &[String],
        summary: &mut RunSummary,
        out: &mut dyn Write,
    ) -> Result<(), SyncError> {
        for package in packages {
            // Exclusions are decided before any build-service call.
            if self.settings.exclude_packages.contains(package) {
                tracing::debug!("excluded package {package}");
                continue;
            }
            let label = format!("{target}/{package}");
            let (needs_sync, status) = match self.promote_package(source, target, package, out) {
                Ok(outcome) => outcome,
                Err(StepError::Output(err)) => return Err(SyncError::Output(err)),
                Err(StepError::Obs(err)) => {
                    self.report_failure(&format!("Could not promote '{package}'"), &err, out)?;
                    (false, ItemStatus::Failed { reason: err.to_string() })
                }
            };
            summary.record(label, needs_sync, status);
        }
        Ok(())
    }

    fn promote_package(
        &self,
        source: &str,
        target: &str,
        package: &str,
        out: &mut dyn Write,
    ) -> Result<(bool, ItemStatus), StepError> {
        if self.service.is_linked(source, package)? {
            writeln!(out, "Skipping linked package '{package}' in '{source}'\n")?;
            return Ok((
                false,
                ItemStatus::Skipped {
                    reason: "linked package".to_string(),
                },
            ));
        }

        let diff = self.service.diff_package(source, target, package)?;
        writeln!(out, "{FRAME}")?;
        writeln!(out, "Diff for '{package}' package from '{source}' to '{target}':\n {diff}")?;
        writeln!(out, "{FRAME}")?;
        if diff.trim().is_empty() {
            return Ok((false, ItemStatus::UpToDate));
        }

        if self.dry_run {
            writeln!(out, "[dry-run] would copy '{package}' from '{source}' to '{target}'\n")?;
            return Ok((true, ItemStatus::WouldSync));
        }
        writeln!(out, "Copying '{package}' from '{source}' to '{target}'\n")?;
        self.service.copy_package(source, package, target)?;
        Ok((true, ItemStatus::Synced))
    }

    fn promote_config(
        &self,
        source: &str,
        target: &str,
        out: &mut dyn Write,
    ) -> Result<(bool, ItemStatus), StepError> {
        let source_cfg = self.service.project_config(source)?;
        let target_cfg = self.service.project_config(target)?;

        writeln!(out, "{FRAME}")?;
        writeln!(out, "Configuration diff for '{source}' and '{target}':\n")?;
        let diff = config_diff(&target_cfg, &source_cfg, target, source);
        write!(out, "{diff}")?;
        writeln!(out, "{FRAME}")?;

        if source_cfg == target_cfg {
            return Ok((false, ItemStatus::UpToDate));
        }
        if self.dry_run {
            writeln!(out, "[dry-run] would overwrite the configuration of '{target}'\n")?;
            return Ok((true, ItemStatus::WouldSync));
        }
        self.service.set_project_config(target, &source_cfg)?;
        writeln!(out, "Configuration of '{target}' updated.\n")?;
        Ok((true, ItemStatus::Synced))
    }

    fn report_failure(&self, what: &str, err: &ObsError, out: &mut dyn Write) -> Result<(), SyncError> {
        tracing::warn!("{what}: {err}");
        writeln!(out, "{what}: {err}\n").map_err(output_err)?;
        if let ObsError::Command(cmd) = err {
            if let Some((stdout, stderr)) = cmd.output() {
                writeln!(out, "   STDOUT: {}", stdout.trim_end()).map_err(output_err)?;
                writeln!(out, "   STDERR: {}", stderr.trim_end()).map_err(output_err)?;
            }
        }
        Ok(())
    }
}

/// Unified line diff turning `old` into `new`.
pub fn config_diff(old: &str, new: &str, old_name: &str, new_name: &str) -> String {
    TextDiff::from_lines(old, new)
        .unified_diff()
        .header(old_name, new_name)
        .context_radius(3)
        .to_string()
}

/// Failure of one package or config step.
#[derive(Debug, thiserror::Error)]
enum StepError {
    #[error(transparent)]
    Obs(#[from] ObsError),
    #[error(transparent)]
    Output(#[from] std::io::Error),
}
