use assert_cmd::Command;
use serde_json::Value;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

pub struct TestEnv {
    _tmp: TempDir,
    pub home: PathBuf,
    pub work: PathBuf,
}

impl TestEnv {
    pub fn new() -> Self {
        let tmp = TempDir::new().expect("create temp dir");
        let home = tmp.path().join("home");
        let work = tmp.path().join("work");
        fs::create_dir_all(&home).expect("create isolated home");
        fs::create_dir_all(&work).expect("create work dir");
        Self {
            _tmp: tmp,
            home,
            work,
        }
    }

    pub fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("ecogov").expect("ecogov binary");
        cmd.env("HOME", &self.home);
        cmd
    }

    pub fn write_descriptor(&self, file: &str, body: &Value) -> PathBuf {
        let path = self.work.join(file);
        fs::write(
            &path,
            serde_json::to_string_pretty(body).expect("serialize descriptor"),
        )
        .expect("write descriptor");
        path
    }

    /// Run `gen` for a descriptor and return the generated document path.
    pub fn generate(&self, name: &str, body: &Value, ext: &str) -> PathBuf {
        let descriptor = self.write_descriptor(&format!("{}.json", name), body);
        let out_dir = self.work.join("out");
        self.cmd()
            .args([
                "gen",
                "--input",
                descriptor.to_str().expect("descriptor path utf8"),
                "--output",
                out_dir.to_str().expect("out dir utf8"),
            ])
            .assert()
            .success();
        out_dir.join(format!("{}.{}", name, ext))
    }

    pub fn run_json(&self, args: &[&str]) -> Value {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .assert()
            .success()
            .get_output()
            .stdout
            .clone();
        serde_json::from_slice(&out).expect("valid json output")
    }

    /// Like `run_json` but tolerates a non-zero exit; returns (json, code).
    pub fn run_json_any(&self, args: &[&str]) -> (Value, i32) {
        let out = self
            .cmd()
            .arg("--json")
            .args(args)
            .output()
            .expect("run ecogov");
        let value = serde_json::from_slice(&out.stdout).expect("valid json output");
        (value, out.status.code().unwrap_or(-1))
    }
}
