//! Integration tests for stancache

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    const MODEL: &str = "data { int N; }\nparameters { real mu; }\nmodel { mu ~ normal(0, 1); }\n";

    fn stancache() -> Command {
        cargo_bin_cmd!("stancache")
    }

    /// Workspace with a model file, a cache dir and a config whose compiler
    /// echoes the staged source back
    struct Workspace {
        dir: TempDir,
    }

    impl Workspace {
        fn new() -> Self {
            Self::with_compiler(r#"program = "sh"
args = ["-c", "cat \"$2\"", "sh"]"#)
        }

        fn with_compiler(compiler: &str) -> Self {
            let dir = TempDir::new().unwrap();
            fs::write(dir.path().join("model.stan"), MODEL).unwrap();
            fs::write(
                dir.path().join("config.toml"),
                format!("[compiler]\n{}\n", compiler),
            )
            .unwrap();
            Self { dir }
        }

        fn path(&self, name: &str) -> PathBuf {
            self.dir.path().join(name)
        }

        fn cache_dir(&self) -> PathBuf {
            self.path("cache")
        }

        fn cmd(&self) -> Command {
            let mut cmd = stancache();
            cmd.arg("--config")
                .arg(self.path("config.toml"))
                .arg("--cache-dir")
                .arg(self.cache_dir())
                .env_remove("STANCACHE_DIR")
                .env_remove("STANCACHE_CONFIG");
            cmd
        }

        fn entries(&self) -> Vec<PathBuf> {
            list_files(&self.cache_dir())
        }
    }

    fn list_files(dir: &Path) -> Vec<PathBuf> {
        match fs::read_dir(dir) {
            Ok(rd) => rd.map(|e| e.unwrap().path()).collect(),
            Err(_) => Vec::new(),
        }
    }

    #[test]
    fn help_displays() {
        stancache()
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("compiled Stan model cache"));
    }

    #[test]
    fn version_displays() {
        stancache()
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("stancache"));
    }

    #[test]
    fn path_prints_cache_dir() {
        let ws = Workspace::new();
        ws.cmd()
            .arg("path")
            .assert()
            .success()
            .stdout(predicate::str::contains(ws.cache_dir().display().to_string()));
    }

    #[test]
    fn path_from_env() {
        let ws = Workspace::new();
        stancache()
            .arg("--config")
            .arg(ws.path("config.toml"))
            .env("STANCACHE_DIR", ws.path("from-env"))
            .arg("path")
            .assert()
            .success()
            .stdout(predicate::str::contains("from-env"));
    }

    #[test]
    fn fingerprint_ignores_formatting() {
        let ws = Workspace::new();
        fs::write(
            ws.path("reformatted.stan"),
            "data {   int N; }   parameters { real mu; } model {\n\tmu ~ normal(0, 1);\n}",
        )
        .unwrap();

        let first = ws.cmd().args(["fingerprint"]).arg(ws.path("model.stan")).output().unwrap();
        let second = ws
            .cmd()
            .args(["fingerprint"])
            .arg(ws.path("reformatted.stan"))
            .output()
            .unwrap();

        assert!(first.status.success());
        let digest = String::from_utf8(first.stdout).unwrap();
        assert_eq!(digest.trim().len(), 64);
        assert_eq!(digest, String::from_utf8(second.stdout).unwrap());
    }

    #[test]
    fn fingerprint_depends_on_options() {
        let ws = Workspace::new();
        let plain = ws.cmd().arg("fingerprint").arg(ws.path("model.stan")).output().unwrap();
        let with_include = ws
            .cmd()
            .arg("fingerprint")
            .arg(ws.path("model.stan"))
            .args(["--include-path", "inc"])
            .output()
            .unwrap();
        assert_ne!(plain.stdout, with_include.stdout);
    }

    #[test]
    fn build_then_cache_hit() {
        let ws = Workspace::new();

        ws.cmd()
            .args(["build", "--model-name", "normal_mu"])
            .arg(ws.path("model.stan"))
            .assert()
            .success()
            .stdout(predicate::str::contains("Model 'normal_mu' available"))
            .stdout(predicate::str::contains("compilation time"));

        ws.cmd()
            .args(["build", "--model-name", "normal_mu", "--emit"])
            .arg(ws.path("model.stan"))
            .assert()
            .success()
            .stdout(predicate::str::contains("got from cache"))
            .stdout(predicate::str::contains("mu ~ normal(0, 1);"));

        assert_eq!(ws.entries().len(), 1);
    }

    #[test]
    fn build_places_entry_by_template() {
        let ws = Workspace::new();
        let digest = ws.cmd().arg("fingerprint").arg(ws.path("model.stan")).output().unwrap();
        let digest = String::from_utf8(digest.stdout).unwrap().trim().to_string();

        ws.cmd()
            .args(["build", "--cache-file-name", "m-{digest}.bin"])
            .arg(ws.path("model.stan"))
            .assert()
            .success();

        assert!(ws.cache_dir().join(format!("m-{}.bin", digest)).is_file());
    }

    #[test]
    fn build_recovers_from_corrupt_entry() {
        let ws = Workspace::new();
        ws.cmd().arg("build").arg(ws.path("model.stan")).assert().success();

        let entries = ws.entries();
        assert_eq!(entries.len(), 1);
        fs::write(&entries[0], b"definitely not a cache entry").unwrap();

        ws.cmd()
            .arg("build")
            .arg(ws.path("model.stan"))
            .assert()
            .success()
            .stdout(predicate::str::contains("compilation time"))
            .stderr(predicate::str::contains("Problems loading cached model"));

        ws.cmd()
            .arg("build")
            .arg(ws.path("model.stan"))
            .assert()
            .success()
            .stdout(predicate::str::contains("got from cache"));
    }

    #[test]
    fn build_recompile_forces_compile() {
        let ws = Workspace::new();
        ws.cmd().arg("build").arg(ws.path("model.stan")).assert().success();

        ws.cmd()
            .args(["build", "--recompile"])
            .arg(ws.path("model.stan"))
            .assert()
            .success()
            .stdout(predicate::str::contains("compilation time"));
    }

    #[test]
    fn build_reads_stdin() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["build", "-", "--emit"])
            .write_stdin("model { }")
            .assert()
            .success()
            .stdout(predicate::str::contains("model { }"));
    }

    #[test]
    fn compile_failure_is_reported_and_not_cached() {
        let ws = Workspace::with_compiler(
            r#"program = "sh"
args = ["-c", "echo 'Syntax error in model' >&2; exit 1", "sh"]"#,
        );

        ws.cmd()
            .arg("build")
            .arg(ws.path("model.stan"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Model compilation failed"))
            .stderr(predicate::str::contains("Syntax error in model"));

        assert!(ws.entries().is_empty());
    }

    #[test]
    fn invalid_template_rejected() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["build", "--cache-file-name", "m-{hash}.bin"])
            .arg(ws.path("model.stan"))
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid cache file name template"));
    }

    #[test]
    fn list_and_clean() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["build", "--model-name", "listed"])
            .arg(ws.path("model.stan"))
            .assert()
            .success();

        ws.cmd()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"model_name\": \"listed\""));

        ws.cmd()
            .args(["clean", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("Cleared 1 cached model(s)"));

        assert!(ws.cache_dir().is_dir());
        assert!(ws.entries().is_empty());

        ws.cmd()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::diff("[]\n"));
    }

    #[test]
    fn clean_removes_leftover_files() {
        let ws = Workspace::new();
        fs::create_dir_all(ws.cache_dir().join("empty_model")).unwrap();
        fs::write(ws.cache_dir().join(".stancache-x.tmp"), b"half written").unwrap();

        ws.cmd()
            .args(["clean", "--yes"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No cached models to clear."));

        assert!(ws.cache_dir().is_dir());
        assert!(ws.entries().is_empty());
    }

    #[test]
    fn clean_without_yes_keeps_entries() {
        let ws = Workspace::new();
        ws.cmd().arg("build").arg(ws.path("model.stan")).assert().success();

        ws.cmd()
            .arg("clean")
            .assert()
            .success()
            .stdout(predicate::str::contains("Aborted"));

        assert_eq!(ws.entries().len(), 1);
    }

    #[test]
    fn config_show() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[general]"))
            .stdout(predicate::str::contains("program = \"sh\""));
    }

    #[test]
    fn config_path() {
        let ws = Workspace::new();
        ws.cmd()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }
}
