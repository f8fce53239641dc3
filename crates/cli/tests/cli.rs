use assert_cmd::Command;

#[test]
fn help_lists_subcommands() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .arg("--help")
        .output()
        .unwrap();

    assert!(output.status.success());
    let stdout = String::from_utf8(output.stdout).unwrap();
    for command in ["serve", "migrate", "token"] {
        assert!(stdout.contains(command), "missing {command} in help");
    }
}

#[test]
fn token_prints_a_jwt() {
    let output = Command::cargo_bin("shelf")
        .unwrap()
        .env("SHELF_ENV", "local")
        .env("SHELF_CONFIG_DIR", env!("CARGO_MANIFEST_DIR"))
        .args(["token", "--user-id", "7", "--username", "ada"])
        .output()
        .unwrap();

    assert!(output.status.success());
    // Log lines share stdout; the token is printed last.
    let stdout = String::from_utf8(output.stdout).unwrap();
    let token = stdout.lines().last().unwrap();
    assert_eq!(token.trim().split('.').count(), 3);
}

#[test]
fn unknown_subcommand_fails() {
    Command::cargo_bin("shelf")
        .unwrap()
        .arg("shelve")
        .assert()
        .failure();
}
