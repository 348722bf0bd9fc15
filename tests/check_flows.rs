use predicates::str::contains;
use serde_json::json;
use std::fs;

mod common;
use common::TestEnv;

fn governed_descriptor() -> serde_json::Value {
    json!({
        "name": "user-service",
        "ports": [8080],
        "depends_on": ["auth-service"],
        "image": "registry.example.com/users:1.4.2"
    })
}

#[test]
fn generated_document_validates_clean() {
    let env = TestEnv::new();
    let doc = env.generate("user-service", &governed_descriptor(), "k8s.yaml");
    env.cmd()
        .args(["validate", doc.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("valid"));
}

#[test]
fn tampered_schema_version_always_errors() {
    let env = TestEnv::new();
    let doc = env.generate("user-service", &governed_descriptor(), "k8s.yaml");
    let text = fs::read_to_string(&doc).expect("read document");
    fs::write(&doc, text.replace("gov-doc/v1", "v7")).expect("tamper document");
    env.cmd()
        .args(["validate", doc.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(contains("M003"));
}

#[test]
fn missing_vector_block_invalidates_the_document() {
    let env = TestEnv::new();
    let doc = env.generate("user-service", &governed_descriptor(), "k8s.yaml");
    let text = fs::read_to_string(&doc).expect("read document");
    let idx = text
        .rfind("vector_alignment_map:")
        .expect("governance document carries a vector block");
    fs::write(&doc, &text[..idx]).expect("truncate document");

    let (value, code) = env.run_json_any(&["validate", doc.to_str().unwrap()]);
    assert_eq!(code, 1);
    assert_eq!(value["data"]["valid"], false);
    let codes: Vec<&str> = value["data"]["findings"]
        .as_array()
        .expect("findings array")
        .iter()
        .filter(|f| f["level"] == "ERROR")
        .filter_map(|f| f["code"].as_str())
        .collect();
    assert!(codes.contains(&"V001"), "{:?}", codes);
}

#[test]
fn extra_field_in_closed_block_warns_without_failing() {
    let env = TestEnv::new();
    let doc = env.generate("user-service", &governed_descriptor(), "k8s.yaml");
    let text = fs::read_to_string(&doc).expect("read document");
    fs::write(
        &doc,
        text.replace(
            "registry_binding:\n",
            "registry_binding:\n  surprise_field: 1\n",
        ),
    )
    .expect("tamper document");

    // lenient: warning only, still valid
    env.cmd()
        .args(["validate", doc.to_str().unwrap()])
        .assert()
        .success()
        .stdout(contains("M006"));
    // strict: the same warning fails the document
    env.cmd()
        .args(["validate", doc.to_str().unwrap(), "--strict"])
        .assert()
        .code(1);
}

#[test]
fn lint_walks_directories_deterministically() {
    let env = TestEnv::new();
    env.generate("user-service", &governed_descriptor(), "k8s.yaml");
    let out_dir = env.work.join("out");
    fs::write(out_dir.join("broken.yaml"), "key: value\n").expect("write broken file");

    let run = env
        .cmd()
        .args(["lint", out_dir.to_str().unwrap()])
        .assert()
        .code(1);
    let first = String::from_utf8(run.get_output().stdout.clone()).expect("utf8 stdout");
    assert!(first.contains("checked 2 file(s): 1 failed"));

    let again = env
        .cmd()
        .args(["lint", out_dir.to_str().unwrap()])
        .assert()
        .code(1);
    let second = String::from_utf8(again.get_output().stdout.clone()).expect("utf8 stdout");
    assert_eq!(first, second);
}

#[test]
fn lint_counts_a_parse_error_per_file_and_continues() {
    let env = TestEnv::new();
    env.generate("user-service", &governed_descriptor(), "k8s.yaml");
    let out_dir = env.work.join("out");
    fs::write(out_dir.join("mangled.yaml"), "---\nkey: [unterminated\n")
        .expect("write mangled file");

    let (value, code) = env.run_json_any(&["lint", out_dir.to_str().unwrap()]);
    assert_eq!(code, 1);
    let reports = value["data"]["reports"].as_array().expect("reports array");
    assert_eq!(reports.len(), 2);
    let mangled = reports
        .iter()
        .find(|r| r["file"].as_str().unwrap_or_default().ends_with("mangled.yaml"))
        .expect("mangled file report");
    assert_eq!(mangled["findings"][0]["code"], "P001");
    let healthy = reports
        .iter()
        .find(|r| r["file"].as_str().unwrap_or_default().ends_with("user-service.k8s.yaml"))
        .expect("healthy file report");
    assert_eq!(healthy["valid"], true);
}

#[test]
fn lint_missing_directory_is_a_usage_error() {
    let env = TestEnv::new();
    env.cmd()
        .args(["lint", "/definitely/not/here"])
        .assert()
        .code(2);
}

#[test]
fn convert_strips_the_companion() {
    let env = TestEnv::new();
    let doc = env.generate("user-service", &governed_descriptor(), "k8s.yaml");
    let out_dir = env.work.join("plain");
    let (value, code) = env.run_json_any(&[
        "convert",
        doc.to_str().unwrap(),
        "--output",
        out_dir.to_str().unwrap(),
    ]);
    assert_eq!(code, 0);
    assert_eq!(value["data"]["stripped"], true);

    let plain_path = out_dir.join("user-service.k8s.plain.yaml");
    let plain = fs::read_to_string(&plain_path).expect("read converted document");
    assert!(plain.contains("kind: Deployment"));
    assert!(!plain.contains("vector_alignment_map:"));

    // without its companion the plain manifest no longer validates
    env.cmd()
        .args(["validate", plain_path.to_str().unwrap()])
        .assert()
        .code(1)
        .stdout(contains("Y007"));
}

#[test]
fn validate_missing_file_is_a_usage_error() {
    let env = TestEnv::new();
    env.cmd()
        .args(["validate", "/definitely/not/here.yaml"])
        .assert()
        .code(2);
}
