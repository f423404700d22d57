use assert_cmd::Command;
use predicates::prelude::*;

fn talents() -> Command {
    Command::cargo_bin("talents").unwrap()
}

#[test]
fn run_evaluates_script_lines() {
    talents()
        .args(["run", "GETSCORE 2 lock", "GETBEST perc", "# comment", "FLY"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GETSCORE 2 lock => 3"))
        .stdout(predicate::str::contains("GETBEST perc => 2"))
        .stdout(predicate::str::contains("FLY => error: unknown command: FLY"))
        .stdout(predicate::str::contains("comment").not());
}

#[test]
fn run_reads_stdin_when_no_lines_given() {
    talents()
        .arg("run")
        .write_stdin("GETPOINTS 1\nENEMYSCORE 2 athl\n")
        .assert()
        .success()
        .stdout(predicate::str::contains("GETPOINTS 1 => 6"))
        .stdout(predicate::str::contains("ENEMYSCORE 2 athl => 15"));
}

#[test]
fn check_prints_outcome_and_envelope() {
    talents()
        .args(["check", "--abbr", "lock", "--actor", "2", "--kind", "max", "--target", "2"])
        .assert()
        .success()
        .stdout(predicate::str::contains("score=3 raw=3 vs target=2 => SUCCESS (+1)"))
        .stdout(predicate::str::contains("envelope min=1 max=3"));
}

#[test]
fn check_can_be_declined() {
    talents()
        .args(["check", "--abbr", "lock", "--decline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("declined => 9999"));
}

#[test]
fn unresolvable_check_reports_sentinel() {
    talents()
        .args(["check", "--abbr", "fly", "--actor", "1"])
        .assert()
        .success()
        .stdout(predicate::str::contains("=> -999"));
}

#[test]
fn enemy_target_number() {
    talents()
        .args(["enemy-tn", "--enemy", "1", "--abbr", "perc", "--kind", "max"])
        .assert()
        .success()
        .stdout(predicate::str::diff("12\n"));
}

#[test]
fn sheet_lists_talents() {
    talents()
        .args(["sheet", "--actor", "3"])
        .assert()
        .success()
        .stdout(predicate::str::contains("actor 3 points=4"))
        .stdout(predicate::str::contains("score=7 PS"))
        .stdout(predicate::str::contains("hidden"));

    talents()
        .args(["sheet", "--actor", "3", "--json"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"max_gauge\": 7"));

    talents()
        .args(["sheet", "--actor", "99"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("actor 99 not found"));
}

#[test]
fn dump_and_snapshot_round_trip() {
    talents()
        .args(["dump", "--pretty", "false"])
        .assert()
        .success()
        .stdout(predicate::str::contains("\"party\""));

    let path = std::env::temp_dir().join(format!("talents_cli_{}.json", std::process::id()));
    let path_arg = path.to_str().unwrap();
    talents()
        .args(["run", "--save", path_arg, "SETRANKS 1 acro 2"])
        .assert()
        .success();
    talents()
        .args(["run", "--snapshot", path_arg, "GETRANKS 1 acro"])
        .assert()
        .success()
        .stdout(predicate::str::contains("GETRANKS 1 acro => 2"));
    std::fs::remove_file(&path).ok();
}

#[test]
fn missing_rules_file_fails() {
    talents()
        .args(["run", "--rules", "/definitely/not/here.yaml", "GETPOINTS 1"])
        .assert()
        .failure();
}
