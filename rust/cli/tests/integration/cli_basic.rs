use crate::helpers::cli_runner::CliRunner;

#[test]
fn help_lists_commands() {
    let res = CliRunner::new().run(&["--help"]);
    assert_eq!(res.exit_code, 0);
    for cmd in ["preview", "payload", "patterns", "cfg"] {
        assert!(res.stdout.contains(cmd), "missing {} in help: {}", cmd, res.stdout);
    }
}

#[test]
fn unknown_command_is_usage_error() {
    let res = CliRunner::new().run(&["explode"]);
    assert_eq!(res.exit_code, 2);
    assert!(!res.stderr.is_empty());
}

#[test]
fn patterns_lists_every_tag() {
    let res = CliRunner::new().run(&["patterns"]);
    assert_eq!(res.exit_code, 0);
    assert_eq!(res.stdout.lines().count(), 7);
    assert!(res.stdout.contains("full_card"));
    assert!(res.stdout.contains("Small cross"));
}

#[test]
fn cfg_prints_json() {
    let res = CliRunner::new().run(&["cfg"]);
    assert_eq!(res.exit_code, 0);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).expect("cfg json");
    assert!(v.get("commission_percent").is_some());
    assert!(v.get("block_unbalanced").is_some());
}
