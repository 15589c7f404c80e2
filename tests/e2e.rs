use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::tempdir;

const SALT_HEX: &str = "434f52502e4c4f43414c626f62";

fn timestamp() -> String {
    format!("{}{}", "A".repeat(88), "B".repeat(88))
}

fn packet(showname: &str, fields: &str) -> String {
    format!(
        "<packet>\n<proto name=\"kerberos\" showname=\"{}\" size=\"180\" pos=\"42\">\n{}\n</proto>\n</packet>\n",
        showname, fields
    )
}

fn as_req(ts: Option<&str>) -> String {
    let fields = match ts {
        Some(ts) => format!(
            "<field name=\"kerberos.padata\" showname=\"padata: 1 item\">\n\
             <field name=\"kerberos.PA_ENC_TIMESTAMP.encrypted\" showname=\"enc PA_ENC_TIMESTAMP\" show=\"{ts}\" value=\"{ts}\"/>\n\
             </field>"
        ),
        None => String::new(),
    };
    packet("Kerberos AS-REQ", &fields)
}

fn krb_error_salt() -> String {
    packet(
        "Kerberos KRB-ERROR",
        &format!(
            "<field name=\"kerberos.etype_info2.salt\" showname=\"Salt: {SALT_HEX}\" show=\"{SALT_HEX}\" value=\"{SALT_HEX}\"/>"
        ),
    )
}

fn krb_error_realm() -> String {
    packet(
        "Kerberos KRB-ERROR",
        "<field name=\"kerberos.cname\" showname=\"Client Name (Principal): bob\" show=\"\"/>\n\
         <field name=\"kerberos.realm\" showname=\"Realm: CORP.LOCAL\" show=\"CORP.LOCAL\" value=\"434f52502e4c4f43414c\"/>",
    )
}

fn as_rep() -> String {
    packet("Kerberos AS-REP", "")
}

fn write_dump(dir: &Path, name: &str, packets: &[String]) -> PathBuf {
    let path = dir.join(name);
    let body = format!(
        "<?xml version=\"1.0\"?>\n<pdml version=\"0\" creator=\"wireshark/1.10.0\">\n{}</pdml>\n",
        packets.concat()
    );
    fs::write(&path, body).unwrap();
    path
}

fn ad_dump(dir: &Path, name: &str) -> PathBuf {
    let ts = timestamp();
    write_dump(
        dir,
        name,
        &[as_req(None), krb_error_salt(), as_req(Some(&ts)), as_rep()],
    )
}

fn plain_dump(dir: &Path, name: &str) -> PathBuf {
    let ts = timestamp();
    write_dump(
        dir,
        name,
        &[as_req(None), krb_error_realm(), as_req(Some(&ts)), as_rep()],
    )
}

#[test]
fn no_arguments_prints_usage_and_fails() {
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.assert()
        .code(1)
        .stdout(predicate::str::is_empty())
        .stderr(predicate::str::contains("Usage"));
}

#[test]
fn ad_dump_emits_salted_line() {
    let tmp = tempdir().unwrap();
    let dump = ad_dump(tmp.path(), "ad.pdml");
    let expected = format!(
        "CORP.LOCALbob:$krb5ng$1$CORP.LOCALbob${}${} \n",
        "A".repeat(88),
        "B".repeat(88)
    );
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(&dump);
    cmd.assert().success().stdout(expected);
}

#[test]
fn plain_dump_emits_user_line() {
    let tmp = tempdir().unwrap();
    let dump = plain_dump(tmp.path(), "plain.pdml");
    let expected = format!(
        "bob:$krb5ng$0$bob$CORP.LOCAL${}${} \n",
        "A".repeat(88),
        "B".repeat(88)
    );
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(&dump);
    cmd.assert().success().stdout(expected);
}

#[test]
fn same_file_twice_is_identical() {
    let tmp = tempdir().unwrap();
    let dump = ad_dump(tmp.path(), "ad.pdml");
    let run = || {
        Command::cargo_bin("krbng2john")
            .unwrap()
            .arg(&dump)
            .output()
            .unwrap()
            .stdout
    };
    let first = run();
    assert!(!first.is_empty());
    assert_eq!(first, run());
}

#[test]
fn multiple_files_do_not_share_state() {
    let tmp = tempdir().unwrap();
    let ts = timestamp();
    // Complete on its own only if state leaked from the first file.
    let head = write_dump(
        tmp.path(),
        "head.pdml",
        &[as_req(None), krb_error_salt(), as_req(Some(&ts))],
    );
    let tail = write_dump(tmp.path(), "tail.pdml", &[as_rep()]);
    let plain = plain_dump(tmp.path(), "plain.pdml");
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(&head).arg(&tail).arg(&plain);
    cmd.assert()
        .success()
        .stdout(predicate::str::starts_with("bob:$krb5ng$0$").and(predicate::str::contains("$krb5ng$1$").not()));
}

#[test]
fn malformed_file_fails_alone() {
    let tmp = tempdir().unwrap();
    let bad = tmp.path().join("bad.pdml");
    fs::write(&bad, "<pdml><packet>").unwrap();
    let good = plain_dump(tmp.path(), "good.pdml");
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(&bad).arg(&good);
    cmd.assert()
        .code(3)
        .stdout(predicate::str::contains("bob:$krb5ng$0$bob$CORP.LOCAL$"))
        .stderr(predicate::str::contains("bad.pdml"));
}

#[test]
fn missing_file_causes_non_zero_exit() {
    let tmp = tempdir().unwrap();
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(tmp.path().join("missing.pdml"));
    cmd.assert().failure();
}

#[test]
fn no_as_rep_emits_nothing() {
    let tmp = tempdir().unwrap();
    let dump = write_dump(tmp.path(), "partial.pdml", &[as_req(None), krb_error_salt()]);
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(&dump);
    cmd.assert().success().stdout(predicate::str::is_empty());
}

#[test]
fn mmap_path_matches_buffered_path() {
    let tmp = tempdir().unwrap();
    let dump = ad_dump(tmp.path(), "ad.pdml");
    let buffered = Command::cargo_bin("krbng2john")
        .unwrap()
        .arg("--mmap-threshold")
        .arg("0")
        .arg(&dump)
        .output()
        .unwrap();
    let mapped = Command::cargo_bin("krbng2john")
        .unwrap()
        .arg("--mmap-threshold")
        .arg("1")
        .arg(&dump)
        .output()
        .unwrap();
    assert!(buffered.status.success());
    assert_eq!(buffered.stdout, mapped.stdout);
}

#[test]
fn output_dir_receives_exports_and_summary_goes_to_stderr() {
    let tmp = tempdir().unwrap();
    let ad = ad_dump(tmp.path(), "ad.pdml");
    let plain = plain_dump(tmp.path(), "plain.pdml");
    let outdir = tmp.path().join("out");
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(&ad)
        .arg(&plain)
        .arg("--summary")
        .arg("--color")
        .arg("never")
        .arg("-o")
        .arg(&outdir);
    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Emitted: 2"));

    let files: Vec<_> = fs::read_dir(&outdir).unwrap().collect();
    assert_eq!(files.len(), 2);
}

#[test]
fn export_failure_causes_non_zero_exit() {
    let tmp = tempdir().unwrap();
    let dump = plain_dump(tmp.path(), "plain.pdml");
    let outdir = tmp.path().join("out");
    fs::write(&outdir, b"not a dir").unwrap();
    let mut cmd = Command::cargo_bin("krbng2john").unwrap();
    cmd.arg(&dump).arg("-o").arg(&outdir);
    cmd.assert().code(4);
}
