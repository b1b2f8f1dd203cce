// End-to-end tests of the slice-scheduler binary.

use std::io::Write;
use std::process::{Command, Stdio};

fn binary() -> Command {
    Command::new(env!("CARGO_BIN_EXE_slice-scheduler"))
}

#[test]
fn schedules_scenario_from_stdin() {
    let mut child = binary()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("failed to start binary");
    child
        .stdin
        .take()
        .unwrap()
        .write_all(b"1 10\n2 1 1000\n0 1000 0 1000\n")
        .unwrap();
    let output = child.wait_with_output().unwrap();

    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "2\n100 0 0 200 0 1\n");
}

#[test]
fn json_report_for_file_input() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("scenario.txt");
    std::fs::write(&path, "2 10\n1 1 5000\n0 1000\n1 1 1000\n0 1000\n").unwrap();

    let output = binary().arg("--json").arg(&path).output().unwrap();
    assert!(output.status.success());

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["scheduled"], 2);
    assert_eq!(report["schedule"][0]["slice_id"], 1);
    assert_eq!(report["verification"]["violations"].as_array().unwrap().len(), 0);
    assert!(report["score"]["value"].as_f64().unwrap() > 1.0);
}

#[test]
fn config_file_changes_weights() {
    let dir = tempfile::tempdir().unwrap();
    let scenario = dir.path().join("scenario.txt");
    // Slice 1 has the tighter bound; with urgency weighted at zero the slice id decides.
    std::fs::write(&scenario, "2 10\n1 1 5000\n0 1000\n1 1 1000\n0 1000\n").unwrap();
    let config = dir.path().join("config.json");
    std::fs::write(&config, r#"{ "weights": { "urgency": 0.0 } }"#).unwrap();

    let output = binary()
        .arg("--config")
        .arg(&config)
        .arg(&scenario)
        .output()
        .unwrap();
    assert!(output.status.success());
    assert_eq!(String::from_utf8(output.stdout).unwrap(), "2\n100 0 0 200 1 0\n");
}

#[test]
fn malformed_input_fails() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.txt");
    std::fs::write(&path, "1 10\n2 1 1000\n0 1000\n").unwrap();

    let output = binary().arg(&path).output().unwrap();
    assert!(!output.status.success());
    assert!(output.stdout.is_empty());
}

#[test]
fn multiple_inputs_are_labelled() {
    let dir = tempfile::tempdir().unwrap();
    let first = dir.path().join("a.txt");
    let second = dir.path().join("b.txt");
    std::fs::write(&first, "1 10\n1 1 1000\n0 1000\n").unwrap();
    std::fs::write(&second, "1 10\n1 1 1000\n50 1000\n").unwrap();

    let output = binary().args(["--workers", "2"]).arg(&first).arg(&second).output().unwrap();
    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    let expected = format!(
        "# {}\n1\n100 0 0\n# {}\n1\n150 0 0\n",
        first.display(),
        second.display()
    );
    assert_eq!(stdout, expected);
}

#[test]
fn unreadable_input_does_not_stop_the_others() {
    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.txt");
    let good = dir.path().join("good.txt");
    let missing = dir.path().join("missing.txt");
    std::fs::write(&broken, "1 10\n2 1 1000\n0 1000\n").unwrap();
    std::fs::write(&good, "1 10\n1 1 1000\n0 1000\n").unwrap();

    let output = binary().arg(&broken).arg(&good).arg(&missing).output().unwrap();
    assert!(!output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    assert_eq!(stdout, format!("# {}\n1\n100 0 0\n", good.display()));
}
