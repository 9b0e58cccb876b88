mod common;

use assert_cmd::cargo_bin;
use assert_cmd::prelude::*;
use common::write_commands_csv;
use predicates::prelude::*;
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_malformed_csv_handling() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("robustness_test.csv");
    write_commands_csv(
        &input,
        &[
            // Valid transfer
            ["transfer", "1", "2", "10", "EUR", "Ana Lima"],
            // Invalid type
            ["refund", "1", "2", "10", "EUR", "Ana Lima"],
            // Missing owner for a transfer
            ["transfer", "1", "2", "10", "EUR", ""],
            // Text in amount field
            ["transfer", "1", "2", "ten", "EUR", "Ana Lima"],
            // Unknown currency code
            ["deposit", "", "2", "10", "EURO", ""],
            // Valid deposit again
            ["deposit", "", "2", "5", "EUR", ""],
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("txledger"));
    cmd.arg(&input)
        .arg("--accounts")
        .arg("tests/fixtures/accounts.json");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("skipping unreadable row").count(4))
        .stdout(predicate::str::contains("1,1,sender,LOCAL,-10.00,EUR,ACCEPTED,"))
        .stdout(predicate::str::contains("2,2,target,DEPOSIT,5.00,EUR,ACCEPTED,"));
}

#[test]
fn test_unknown_accounts_do_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("unknown.csv");
    write_commands_csv(
        &input,
        &[
            ["transfer", "1", "99", "10", "EUR", "Ana Lima"],
            ["penalty_fee", "", "99", "", "", ""],
            ["transfer", "1", "1", "10", "EUR", "Ana Lima"],
            ["maintenance_fee", "", "3", "", "", ""],
            ["transfer", "1", "2", "10", "EUR", "Ana Lima"],
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("txledger"));
    cmd.arg(&input)
        .arg("--accounts")
        .arg("tests/fixtures/accounts.json");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("command failed").count(4))
        .stdout(predicate::str::contains("1,2,receiver,LOCAL,10.00,EUR,ACCEPTED,"));
}

#[test]
fn test_empty_input_produces_no_receipts() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("empty.csv");
    write_commands_csv(&input, &[]).unwrap();

    let mut cmd = Command::new(cargo_bin!("txledger"));
    cmd.arg(&input);

    cmd.assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn test_overflowing_amounts_do_not_stop_the_batch() {
    let dir = tempdir().unwrap();
    let input = dir.path().join("overflow.csv");
    write_commands_csv(
        &input,
        &[
            ["deposit", "", "1", "50000000000000000000000000000.0", "EUR", ""],
            ["deposit", "", "1", "50000000000000000000000000000.0", "EUR", ""],
            ["transfer", "1", "4", "75000000000000000000000000000.0", "EUR", "Ana Lima"],
            ["transfer", "1", "2", "10", "EUR", "Ana Lima"],
        ],
    )
    .unwrap();

    let mut cmd = Command::new(cargo_bin!("txledger"));
    cmd.arg(&input)
        .arg("--accounts")
        .arg("tests/fixtures/accounts.json")
        .arg("--config")
        .arg("tests/fixtures/config.json");

    cmd.assert()
        .success()
        .stdout(predicate::str::contains("1,1,target,DEPOSIT,"))
        .stdout(predicate::str::contains(
            "2,1,target,DEPOSIT,0.00,EUR,REFUSED,Invalid amount to deposit.",
        ))
        .stdout(predicate::str::contains("3,2,receiver,LOCAL,10.00,EUR,ACCEPTED,"))
        .stderr(predicate::str::contains("command failed").count(1));
}
