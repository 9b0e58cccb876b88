#![cfg(feature = "storage-rocksdb")]

mod common;

use assert_cmd::cargo_bin;
use common::{write_accounts_json, write_commands_csv};
use std::process::Command;
use tempfile::tempdir;

#[test]
fn test_rocksdb_persistence_recovery() {
    let dir = tempdir().unwrap();
    let db_path = dir.path().join("test_db");
    let accounts = dir.path().join("accounts.json");
    write_accounts_json(
        &accounts,
        &[
            (1, "student_checking", "100", "EUR", "Ana"),
            (2, "student_checking", "0", "EUR", "Rui"),
        ],
    )
    .unwrap();

    // 1. First run: seed both accounts and move 60
    let csv1 = dir.path().join("first.csv");
    write_commands_csv(&csv1, &[["transfer", "1", "2", "60", "EUR", "Ana"]]).unwrap();

    let output1 = Command::new(cargo_bin!("txledger"))
        .arg(&csv1)
        .arg("--accounts")
        .arg(&accounts)
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output1.status.success());
    let stdout1 = String::from_utf8_lossy(&output1.stdout);
    assert!(stdout1.contains("1,1,sender,LOCAL,-60.00,EUR,ACCEPTED,"));

    // 2. Second run with the same seed file: the stored balance (40) wins over
    // the seeded one, so 60 more cannot be sent.
    let csv2 = dir.path().join("second.csv");
    write_commands_csv(
        &csv2,
        &[
            ["transfer", "1", "2", "60", "EUR", "Ana"],
            ["transfer", "1", "2", "40", "EUR", "Ana"],
        ],
    )
    .unwrap();

    let output2 = Command::new(cargo_bin!("txledger"))
        .arg(&csv2)
        .arg("--accounts")
        .arg(&accounts)
        .arg("--db-path")
        .arg(&db_path)
        .output()
        .expect("Failed to execute command");
    assert!(output2.status.success());
    let stdout2 = String::from_utf8_lossy(&output2.stdout);

    // Transaction ids continue from the first run.
    assert!(stdout2.contains("2,1,sender,LOCAL,0.00,EUR,REFUSED,Invalid amount to transfer."));
    assert!(stdout2.contains("3,2,receiver,LOCAL,40.00,EUR,ACCEPTED,"));
}
