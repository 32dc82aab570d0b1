use std::fs;

use anyhow::Result;
use predicates::prelude::*;
use tempfile::tempdir;

mod common;
use common::anchor;

#[test]
fn init_add_commit_log_roundtrip() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();

    anchor(root)?.args(["init", "."]).assert().success();

    fs::write(root.join("hello.txt"), "hello world\n")?;

    anchor(root)?.args(["add", "hello.txt"]).assert().success();

    anchor(root)?
        .args(["commit", "-m", "first commit"])
        .assert()
        .success();

    anchor(root)?
        .args(["log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("first commit"));

    Ok(())
}

#[test]
fn status_reports_clean_tree_after_commit() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();

    anchor(root)?.arg("init").arg(".").assert().success();
    fs::write(root.join("a.txt"), "a\n")?;
    anchor(root)?.args(["add", "a.txt"]).assert().success();
    anchor(root)?.args(["commit", "-m", "add a"]).assert().success();

    anchor(root)?
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("clean"));

    fs::write(root.join("a.txt"), "a changed\n")?;
    anchor(root)?
        .arg("status")
        .assert()
        .success()
        .stdout(predicate::str::contains("a.txt"));

    Ok(())
}

#[test]
fn diff_shows_modified_content() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();

    anchor(root)?.arg("init").arg(".").assert().success();
    fs::write(root.join("a.txt"), "one\ntwo\nthree\n")?;
    anchor(root)?.args(["add", "a.txt"]).assert().success();
    anchor(root)?.args(["commit", "-m", "initial"]).assert().success();

    fs::write(root.join("a.txt"), "one\nTWO\nthree\n")?;
    anchor(root)?
        .arg("diff")
        .assert()
        .success()
        .stdout(predicate::str::contains("-two"))
        .stdout(predicate::str::contains("+TWO"));

    Ok(())
}

#[test]
fn second_identical_commit_is_idempotent() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();

    anchor(root)?.arg("init").arg(".").assert().success();
    fs::write(root.join("a.txt"), "content\n")?;
    anchor(root)?.args(["add", "a.txt"]).assert().success();
    anchor(root)?.args(["commit", "-m", "first"]).assert().success();

    anchor(root)?
        .args(["commit", "-m", "again", "--all"])
        .assert()
        .success();

    anchor(root)?
        .args(["log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("again").not());

    Ok(())
}

#[test]
fn branch_and_checkout() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();

    anchor(root)?.arg("init").arg(".").assert().success();
    fs::write(root.join("a.txt"), "content\n")?;
    anchor(root)?.args(["add", "a.txt"]).assert().success();
    anchor(root)?.args(["commit", "-m", "first"]).assert().success();

    anchor(root)?.args(["branch", "feature"]).assert().success();

    anchor(root)?
        .arg("branch")
        .assert()
        .success()
        .stdout(predicate::str::contains("feature"))
        .stdout(predicate::str::contains("* main"));

    anchor(root)?.args(["checkout", "feature"]).assert().success();

    anchor(root)?
        .arg("branch")
        .assert()
        .success()
        .stdout(predicate::str::contains("* feature"));

    Ok(())
}

#[test]
fn merge_fast_forwards_branch() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();

    anchor(root)?.arg("init").arg(".").assert().success();
    fs::write(root.join("a.txt"), "v1\n")?;
    anchor(root)?.args(["add", "a.txt"]).assert().success();
    anchor(root)?.args(["commit", "-m", "v1"]).assert().success();

    anchor(root)?.args(["branch", "feature"]).assert().success();
    anchor(root)?.args(["checkout", "feature"]).assert().success();

    fs::write(root.join("b.txt"), "v2\n")?;
    anchor(root)?.args(["add", "b.txt"]).assert().success();
    anchor(root)?.args(["commit", "-m", "v2"]).assert().success();

    anchor(root)?.args(["checkout", "main"]).assert().success();
    anchor(root)?.args(["merge", "feature"]).assert().success();

    anchor(root)?
        .args(["log", "--oneline"])
        .assert()
        .success()
        .stdout(predicate::str::contains("v2"));

    Ok(())
}

#[test]
fn checkout_unknown_ref_fails() -> Result<()> {
    let dir = tempdir()?;
    let root = dir.path();

    anchor(root)?.arg("init").arg(".").assert().success();

    anchor(root)?
        .args(["checkout", "does-not-exist"])
        .assert()
        .failure();

    Ok(())
}
