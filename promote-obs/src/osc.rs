//! `osc`-backed build-service operations.
//!
//! | operation            | command                                               |
//! |----------------------|-------------------------------------------------------|
//! | list packages        | `osc -A <api> ls <project>`                           |
//! | package file listing | `osc -A <api> api /source/<project>/<package>`        |
//! | subproject search    | `osc -A <api> api /search/project/id?match=...`       |
//! | get project config   | `osc -A <api> meta prjconf <project>`                 |
//! | set project config   | `osc -A <api> meta prjconf <project> -F <file>`       |
//! | diff                 | `osc -A <api> rdiff <target> <package> <source>`      |
//! | copy                 | `osc -A <api> copypac <source> <package> <target>`    |

use std::io::Write;
use std::time::Duration;

use promote_core::{CommandRunner, CommandSpec};

use crate::error::{io_err, ObsError};
use crate::xml;

/// Build-service operations used by package promotion.
pub trait BuildService {
    fn list_packages(&self, project: &str) -> Result<Vec<String>, ObsError>;

    /// True when the package is a link to another package's sources.
    fn is_linked(&self, project: &str, package: &str) -> Result<bool, ObsError>;

    /// Full names of projects nested under `project` (`<project>:*`).
    fn subprojects(&self, project: &str) -> Result<Vec<String>, ObsError>;

    fn project_config(&self, project: &str) -> Result<String, ObsError>;

    fn set_project_config(&self, project: &str, config: &str) -> Result<(), ObsError>;

    /// Textual diff of `package` going from `target` to `source`; empty when equal.
    fn diff_package(&self, source: &str, target: &str, package: &str) -> Result<String, ObsError>;

    fn copy_package(&self, source: &str, package: &str, target: &str) -> Result<(), ObsError>;
}

/// Drives the `osc` command-line client.
pub struct Osc<'a> {
    runner: &'a dyn CommandRunner,
    api_url: String,
    timeout: Duration,
}

impl<'a> Osc<'a> {
    pub fn new(runner: &'a dyn CommandRunner, api_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            runner,
            api_url: api_url.into(),
            timeout,
        }
    }

    fn command<I, S>(&self, args: I) -> CommandSpec
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        CommandSpec::new("osc")
            .args(["-A", self.api_url.as_str()])
            .args(args)
            .timeout(self.timeout)
    }

    fn stdout<I, S>(&self, args: I) -> Result<String, ObsError>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Ok(self.runner.run_checked(&self.command(args))?.stdout)
    }
}

impl BuildService for Osc<'_> {
    fn list_packages(&self, project: &str) -> Result<Vec<String>, ObsError> {
        let out = self.stdout(["ls", project])?;
        Ok(out
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .map(str::to_string)
            .collect())
    }

    fn is_linked(&self, project: &str, package: &str) -> Result<bool, ObsError> {
        let listing = self.stdout(["api".to_string(), format!("/source/{project}/{package}")])?;
        Ok(xml::has_linkinfo(&listing))
    }

    fn subprojects(&self, project: &str) -> Result<Vec<String>, ObsError> {
        let query = format!("starts-with(@name,'{project}:')");
        let path = format!("/search/project/id?match={}", encode_query(&query));
        let result = self.stdout(["api".to_string(), path])?;
        Ok(xml::project_names(&result))
    }

    fn project_config(&self, project: &str) -> Result<String, ObsError> {
        self.stdout(["meta", "prjconf", project])
    }

    fn set_project_config(&self, project: &str, config: &str) -> Result<(), ObsError> {
        let mut file = tempfile::Builder::new()
            .prefix("prjconf-")
            .tempfile()
            .map_err(|e| io_err(std::env::temp_dir(), e))?;
        if let Err(e) = file.write_all(config.as_bytes()).and_then(|()| file.flush()) {
            return Err(io_err(file.path(), e));
        }

        let path = file.path().display().to_string();
        self.stdout(["meta", "prjconf", project, "-F", path.as_str()])?;
        Ok(())
    }

    fn diff_package(&self, source: &str, target: &str, package: &str) -> Result<String, ObsError> {
        self.stdout(["rdiff", target, package, source])
    }

    fn copy_package(&self, source: &str, package: &str, target: &str) -> Result<(), ObsError> {
        self.stdout(["copypac", source, package, target])?;
        Ok(())
    }
}

/// Percent-encode a query value, keeping the characters OBS match
/// expressions use verbatim.
fn encode_query(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' => out.push(byte as char),
            b'-' | b'.' | b'_' | b'~' | b':' | b'@' | b'(' | b')' | b',' => out.push(byte as char),
            _ => out.push_str(&format!("%{byte:02X}")),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use promote_core::{CommandError, CommandOutput};

    use super::*;

    /// Replies with canned stdout and records every command line.
    struct Canned {
        stdout: &'static str,
        seen: RefCell<Vec<Vec<String>>>,
    }

    impl Canned {
        fn new(stdout: &'static str) -> Self {
            Self {
                stdout,
                seen: RefCell::new(Vec::new()),
            }
        }
    }

    impl CommandRunner for Canned {
        fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
            let mut line = vec![spec.program.clone()];
            line.extend(spec.args.iter().cloned());
            self.seen.borrow_mut().push(line);
            Ok(CommandOutput {
                code: Some(0),
                stdout: self.stdout.to_string(),
                stderr: String::new(),
            })
        }
    }

    const API: &str = "https://api.opensuse.org";

    fn osc(runner: &Canned) -> Osc<'_> {
        Osc::new(runner, API, Duration::from_secs(5))
    }

    #[test]
    fn list_packages_splits_lines() {
        let runner = Canned::new("salt\nvenv-salt-minion\n\n");
        let pkgs = osc(&runner).list_packages("prj").unwrap();
        assert_eq!(pkgs, vec!["salt", "venv-salt-minion"]);
        assert_eq!(runner.seen.borrow()[0], vec!["osc", "-A", API, "ls", "prj"]);
    }

    #[test]
    fn rdiff_argument_order_is_target_package_source() {
        let runner = Canned::new("");
        osc(&runner).diff_package("src:prj", "dst:prj", "salt").unwrap();
        assert_eq!(
            runner.seen.borrow()[0],
            vec!["osc", "-A", API, "rdiff", "dst:prj", "salt", "src:prj"]
        );
    }

    #[test]
    fn copypac_argument_order() {
        let runner = Canned::new("");
        osc(&runner).copy_package("src:prj", "salt", "dst:prj").unwrap();
        assert_eq!(
            runner.seen.borrow()[0],
            vec!["osc", "-A", API, "copypac", "src:prj", "salt", "dst:prj"]
        );
    }

    #[test]
    fn subproject_search_query_is_encoded() {
        let runner = Canned::new(r#"<collection><project name="a:b"/></collection>"#);
        let found = osc(&runner).subprojects("a").unwrap();
        assert_eq!(found, vec!["a:b"]);
        assert_eq!(
            runner.seen.borrow()[0][4],
            "/search/project/id?match=starts-with(@name,%27a:%27)"
        );
    }

    #[test]
    fn linked_package_detected_from_listing() {
        let runner = Canned::new(r#"<directory><linkinfo project="x" package="y"/></directory>"#);
        assert!(osc(&runner).is_linked("prj", "salt").unwrap());
        assert_eq!(runner.seen.borrow()[0][4], "/source/prj/salt");
    }

    #[test]
    fn set_config_passes_a_file_with_the_content() {
        struct ReadsFile(RefCell<Option<String>>);

        impl CommandRunner for ReadsFile {
            fn run(&self, spec: &CommandSpec) -> Result<CommandOutput, CommandError> {
                let path = spec.args.last().expect("file arg");
                *self.0.borrow_mut() = std::fs::read_to_string(path).ok();
                Ok(CommandOutput {
                    code: Some(0),
                    ..Default::default()
                })
            }
        }

        let runner = ReadsFile(RefCell::new(None));
        Osc::new(&runner, API, Duration::from_secs(5))
            .set_project_config("prj", "Prefer: python3\n")
            .unwrap();
        assert_eq!(runner.0.borrow().as_deref(), Some("Prefer: python3\n"));
    }

    #[test]
    fn encode_query_escapes_quotes_and_spaces() {
        assert_eq!(encode_query("a b'c"), "a%20b%27c");
    }
}
