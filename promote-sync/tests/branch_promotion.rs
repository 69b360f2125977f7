mod common;

use std::cell::RefCell;
use std::path::PathBuf;

use common::{
    failure, mirror_settings, same_org_settings, success, token, RecordingRunner, StubForge, TOKEN,
};
use promote_core::{ItemStatus, PushMode};
use promote_sync::{BranchPromotion, RunOptions, SyncError};

fn run(
    settings: &promote_core::config::BranchSettings,
    forge: &StubForge,
    runner: &RecordingRunner,
    options: RunOptions,
) -> (Result<promote_core::RunSummary, SyncError>, String) {
    let token = token();
    let promotion = BranchPromotion {
        settings,
        token: &token,
        forge,
        runner,
        options,
    };
    let mut out = Vec::new();
    let result = promotion.run(&mut out);
    (result, String::from_utf8(out).expect("utf8 log"))
}

fn scenario_forge() -> StubForge {
    StubForge::new(&["a", "b", "_ObsPrj"])
        .head("saltbundle", "a", "bundle_testing", "1111")
        .head("saltbundle", "a", "bundle", "1111")
        .head("saltbundle", "b", "bundle_testing", "2222")
        .head("saltbundle", "b", "bundle", "0000")
}

#[test]
fn only_differing_repository_is_synced() {
    let forge = scenario_forge();
    let runner = RecordingRunner::ok();
    let (result, log) = run(&same_org_settings(), &forge, &runner, RunOptions::default());
    let summary = result.expect("run");

    assert_eq!(summary.processed(), 2);
    assert_eq!(summary.needing_sync(), vec!["b"]);
    assert_eq!(summary.synced(), vec!["b"]);
    assert_eq!(summary.exit_code(), 0);

    let remotes = runner.lines_starting("git remote add");
    assert_eq!(remotes.len(), 2);
    assert!(remotes.iter().all(|l| l.ends_with("/saltbundle/b")));
    assert_eq!(
        runner.lines_starting("git push"),
        vec!["git push target refs/heads/bundle_testing:refs/heads/bundle"]
    );
    assert!(log.contains("Nothing to sync here."));
    assert!(log.contains("Successfully synced!"));
}

#[test]
fn excluded_repository_is_never_looked_up() {
    let forge = scenario_forge();
    let runner = RecordingRunner::ok();
    let (result, _) = run(&same_org_settings(), &forge, &runner, RunOptions::default());
    result.expect("run");

    assert!(forge.lookups.borrow().iter().all(|k| !k.contains("_ObsPrj")));
    assert!(runner.lines().iter().all(|l| !l.contains("_ObsPrj")));
}

#[test]
fn failed_push_is_recorded_and_exit_code_is_one() {
    let forge = scenario_forge();
    let runner = RecordingRunner::with(|spec| {
        if spec.args.first().map(String::as_str) == Some("push") {
            failure(1, "! [rejected] non-fast-forward")
        } else {
            success("")
        }
    });
    let (result, log) = run(&same_org_settings(), &forge, &runner, RunOptions::default());
    let summary = result.expect("run");

    assert_eq!(summary.errored(), vec!["b"]);
    assert!(summary.synced().is_empty());
    assert_eq!(summary.exit_code(), 1);
    assert!(log.contains("non-fast-forward"));
}

#[test]
fn unchanged_state_runs_no_git_at_all() {
    let forge = StubForge::new(&["a", "b"])
        .head("saltbundle", "a", "bundle_testing", "1")
        .head("saltbundle", "a", "bundle", "1")
        .head("saltbundle", "b", "bundle_testing", "2")
        .head("saltbundle", "b", "bundle", "2");
    let runner = RecordingRunner::ok();
    let (result, _) = run(&same_org_settings(), &forge, &runner, RunOptions::default());
    let summary = result.expect("run");

    assert!(runner.lines().is_empty());
    assert!(summary.needing_sync().is_empty());
    assert_eq!(summary.exit_code(), 0);
}

#[test]
fn failure_in_one_repository_does_not_stop_the_others() {
    let forge = StubForge::new(&["a", "b", "c"])
        .head("saltbundle", "a", "bundle_testing", "1")
        .head("saltbundle", "a", "bundle", "0")
        .head("saltbundle", "b", "bundle_testing", "2")
        .head("saltbundle", "b", "bundle", "0")
        .head("saltbundle", "c", "bundle_testing", "3")
        .head("saltbundle", "c", "bundle", "0");
    // Fail the fetch in whichever scratch directory registered repository "a".
    let failing = RecordingRunner::with({
        let a_dir = RefCell::new(None::<PathBuf>);
        move |spec| {
            let args: Vec<&str> = spec.args.iter().map(String::as_str).collect();
            if args.starts_with(&["remote", "add", "source"])
                && args.last().is_some_and(|u| u.ends_with("/a"))
            {
                *a_dir.borrow_mut() = spec.cwd.clone();
            }
            if args.first() == Some(&"fetch") && *a_dir.borrow() == spec.cwd {
                return failure(128, "fatal: couldn't find remote ref bundle_testing");
            }
            success("")
        }
    });

    let (result, _) = run(&same_org_settings(), &forge, &failing, RunOptions::default());
    let summary = result.expect("run");

    assert_eq!(summary.errored(), vec!["a"]);
    assert_eq!(summary.synced(), vec!["b", "c"]);
    assert_eq!(failing.lines_starting("git push").len(), 2);
}

#[test]
fn missing_branch_is_an_isolated_error() {
    // "a" has no target branch yet: the lookup 404s.
    let forge = StubForge::new(&["a", "b"])
        .head("saltbundle", "a", "bundle_testing", "1")
        .head("saltbundle", "b", "bundle_testing", "2")
        .head("saltbundle", "b", "bundle", "0");
    let runner = RecordingRunner::ok();
    let (result, log) = run(&same_org_settings(), &forge, &runner, RunOptions::default());
    let summary = result.expect("run");

    assert_eq!(summary.errored(), vec!["a"]);
    assert_eq!(summary.synced(), vec!["b"]);
    assert!(log.contains("cannot get commit hash"));
}

#[test]
fn listing_failure_aborts_the_run() {
    let forge = StubForge {
        fail_listing: true,
        ..Default::default()
    };
    let runner = RecordingRunner::ok();
    let (result, _) = run(&same_org_settings(), &forge, &runner, RunOptions::default());
    assert!(matches!(result, Err(SyncError::Forge(_))));
}

#[test]
fn scratch_directories_are_fresh_and_removed() {
    let forge = StubForge::new(&["a", "b"])
        .head("saltbundle", "a", "bundle_testing", "1")
        .head("saltbundle", "a", "bundle", "0")
        .head("saltbundle", "b", "bundle_testing", "2")
        .head("saltbundle", "b", "bundle", "0");
    let runner = RecordingRunner::with(|spec| {
        if spec.args.first().map(String::as_str) == Some("push") {
            failure(1, "rejected")
        } else {
            success("")
        }
    });
    let (result, _) = run(&same_org_settings(), &forge, &runner, RunOptions::default());
    result.expect("run");

    let dirs = runner.dirs.borrow();
    assert!(dirs.iter().all(|(_, existed)| *existed), "dir must exist while used");
    let mut distinct: Vec<_> = dirs.iter().map(|(d, _)| d.clone()).collect();
    distinct.dedup();
    assert_eq!(distinct.len(), 2, "one directory per repository");
    for dir in distinct {
        assert!(!dir.exists(), "{} should be removed", dir.display());
    }
}

#[test]
fn mirror_pushes_every_target_branch_with_token_url() {
    let forge = StubForge::new(&["salt"])
        .head("saltbundle", "salt", "bundle", "9")
        .head("Galaxy", "salt", "mlmtools-main", "9")
        .head("Galaxy", "salt", "mlmtools-stable", "8");
    let runner = RecordingRunner::ok();
    let mut settings = mirror_settings();
    settings.push_mode = PushMode::Force;
    let (result, _) = run(&settings, &forge, &runner, RunOptions::default());
    let summary = result.expect("run");

    assert_eq!(summary.synced(), vec!["salt"]);
    assert_eq!(
        runner.lines(),
        vec![
            "git init --bare --object-format=sha256".to_string(),
            "git remote add source https://src.opensuse.org/saltbundle/salt".to_string(),
            format!("git remote add target https://{TOKEN}@src.suse.de/Galaxy/salt"),
            "git fetch source refs/heads/bundle:refs/heads/bundle".to_string(),
            "git push --force target refs/heads/bundle:refs/heads/mlmtools-main".to_string(),
            "git push --force target refs/heads/bundle:refs/heads/mlmtools-stable".to_string(),
        ]
    );
    // Only target lookups carry the token.
    assert_eq!(
        *forge.authed_lookups.borrow(),
        vec!["Galaxy/salt@mlmtools-main", "Galaxy/salt@mlmtools-stable"]
    );
}

#[test]
fn token_never_reaches_the_log() {
    let forge = StubForge::new(&["salt"])
        .head("saltbundle", "salt", "bundle", "9")
        .head("Galaxy", "salt", "mlmtools-main", "8")
        .head("Galaxy", "salt", "mlmtools-stable", "8");
    let runner = RecordingRunner::with(|spec| {
        if spec.args.first().map(String::as_str) == Some("push") {
            failure(128, &format!("fatal: unable to access 'https://{TOKEN}@src.suse.de/'"))
        } else {
            success("")
        }
    });
    let (result, log) = run(&mirror_settings(), &forge, &runner, RunOptions::default());
    assert_eq!(result.expect("run").exit_code(), 1);
    assert!(!log.contains(TOKEN), "token leaked into log:\n{log}");
    assert!(log.contains("https://***@src.suse.de/"));
}

#[test]
fn dry_run_starts_no_process() {
    let forge = scenario_forge();
    let runner = RecordingRunner::ok();
    let options = RunOptions {
        dry_run: true,
        show_diff: false,
    };
    let (result, log) = run(&same_org_settings(), &forge, &runner, options);
    let summary = result.expect("run");

    assert!(runner.lines().is_empty());
    assert_eq!(summary.needing_sync(), vec!["b"]);
    assert!(summary.synced().is_empty());
    assert!(matches!(
        summary.outcomes()[1].status,
        ItemStatus::WouldSync
    ));
    assert!(log.contains("[dry-run]"));
}

#[test]
fn show_diff_fetches_targets_before_pushing() {
    let forge = scenario_forge();
    let runner = RecordingRunner::with(|spec| {
        if spec.args.first().map(String::as_str) == Some("diff") {
            success(" _service | 2 +-\n")
        } else {
            success("")
        }
    });
    let options = RunOptions {
        dry_run: false,
        show_diff: true,
    };
    let (result, log) = run(&same_org_settings(), &forge, &runner, options);
    result.expect("run");

    let lines = runner.lines();
    let fetch_target = lines
        .iter()
        .position(|l| l == "git fetch target refs/heads/bundle:refs/remotes/target/bundle")
        .expect("target fetched");
    let push = lines
        .iter()
        .position(|l| l.starts_with("git push"))
        .expect("pushed");
    assert!(fetch_target < push);
    assert!(log.contains("_service | 2 +-"));
}

#[test]
fn every_ref_handed_to_git_is_fully_qualified() {
    let forge = scenario_forge();
    let runner = RecordingRunner::ok();
    let options = RunOptions {
        dry_run: false,
        show_diff: true,
    };
    let (result, _) = run(&same_org_settings(), &forge, &runner, options);
    result.expect("run");

    let lines = runner.lines();
    let diff = "git diff --stat refs/remotes/target/bundle refs/heads/bundle_testing";
    assert!(lines.iter().any(|l| l == diff), "{lines:#?}");
    for line in lines.iter().filter(|l| {
        l.starts_with("git fetch") || l.starts_with("git push") || l.starts_with("git diff")
    }) {
        let refs = line
            .split(' ')
            .skip(2)
            .filter(|w| !w.starts_with('-') && *w != "source" && *w != "target");
        for spec in refs {
            for side in spec.split(':') {
                assert!(side.starts_with("refs/"), "short ref '{side}' in: {line}");
            }
        }
    }
}
