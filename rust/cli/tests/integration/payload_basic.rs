use crate::helpers::cli_runner::CliRunner;
use crate::helpers::temp_files::TempFileManager;

fn room_toml(horizontal: u32) -> String {
    format!(
        r#"
name = "  Lunch Bingo  "
currency_id = "665f1c0e9b1d8a0012ab34cd"
min_players = 10
commission_percent = 10.0
scheduled_at = "2026-11-01T20:30"
description = "Daily lunch room"

[pricing]
mode = "manual"
ticket_price = 10.0

[[rounds]]
pattern = "horizontal"
percent = {}.0

[[rounds]]
pattern = "vertical"
percent = 30.0

[[rounds]]
pattern = "full_card"
percent = 30.0
"#,
        horizontal
    )
}

#[test]
fn payload_carries_round_prizes() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file("room.toml", &room_toml(40));
    let res = CliRunner::new().run(&["payload", "--input", room.to_string_lossy().as_ref()]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);

    let v: serde_json::Value = serde_json::from_str(&res.stdout).expect("payload json");
    assert_eq!(v["name"], "Lunch Bingo");
    assert_eq!(v["price_per_card"], 10.0);
    assert_eq!(v["max_rounds"], 3);
    assert_eq!(v["currency_id"], "665f1c0e9b1d8a0012ab34cd");
    assert_eq!(v["scheduled_at"], "2026-11-01T20:30:00");
    assert_eq!(v["rounds"][0]["round"], 1);
    assert_eq!(v["rounds"][0]["prize_amount"], 36.0);
    assert_eq!(v["rounds"][2]["pattern"], "full_card");
}

#[test]
fn unbalanced_room_blocked_unless_allowed() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file("room.toml", &room_toml(30));
    let path = room.to_string_lossy().to_string();
    let cli = CliRunner::new();

    let blocked = cli.run(&["payload", "--input", &path]);
    assert_eq!(blocked.exit_code, 1);
    assert!(blocked.stderr.contains("Round percentages sum to 90%, expected 100%"));

    let allowed = cli.run(&["payload", "--input", &path, "--allow-unbalanced"]);
    assert_eq!(allowed.exit_code, 0);
    assert!(allowed.stderr.contains("Warning:"));
}

#[test]
fn json_room_file_is_accepted() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file(
        "room.json",
        r#"{"name":"Night","min_players":4,"pricing":{"mode":"manual","ticket_price":2.5},
            "rounds":[{"pattern":"random","percent":100}]}"#,
    );
    let res = CliRunner::new().run(&["payload", "--input", room.to_string_lossy().as_ref()]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).unwrap();
    assert_eq!(v["rounds"][0]["prize_amount"], 9.0);
}

#[test]
fn missing_file_is_usage_error() {
    let res = CliRunner::new().run(&["payload", "--input", "target/does_not_exist.toml"]);
    assert_eq!(res.exit_code, 2);
    assert!(res.stderr.contains("cannot read"));
}

#[test]
fn raw_pot_basis_changes_target() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file("room.toml", &room_toml(30));
    let res = CliRunner::new().run(&[
        "payload",
        "--input",
        room.to_string_lossy().as_ref(),
        "--basis",
        "raw_pot",
    ]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).unwrap();
    assert_eq!(v["rounds"][0]["prize_amount"], 30.0);
}

#[test]
fn configured_commission_applies_when_file_omits_it() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file(
        "room.toml",
        r#"
name = "Config Room"
min_players = 10

[pricing]
mode = "manual"
ticket_price = 10.0

[[rounds]]
pattern = "horizontal"
percent = 15.0

[[rounds]]
pattern = "full_card"
percent = 85.0
"#,
    );
    let path = room.to_string_lossy().to_string();
    let cli = CliRunner::new();

    let res = cli.run_with_env(&["payload", "--input", &path], &[("BGO_COMMISSION", "0")]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).unwrap();
    assert_eq!(v["commission_percent"], 0.0);
    assert_eq!(v["currency"], "Bs");
    assert_eq!(v["rounds"][0]["prize_amount"], 15.0);

    let from_file = tmp.create_file(
        "explicit.toml",
        &std::fs::read_to_string(&room).unwrap().replace(
            "min_players = 10",
            "min_players = 10\ncommission_percent = 20.0",
        ),
    );
    let res = cli.run_with_env(
        &["payload", "--input", from_file.to_string_lossy().as_ref()],
        &[("BGO_COMMISSION", "0")],
    );
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).unwrap();
    assert_eq!(v["commission_percent"], 20.0);
    assert_eq!(v["rounds"][0]["prize_amount"], 12.0);
}

#[test]
fn fixed_prize_room_is_not_blocked_by_round_sum() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file(
        "room.toml",
        &room_toml(30).replace(
            "mode = \"manual\"\nticket_price = 10.0",
            "mode = \"from_prize\"\nprize_total = 1000.0",
        ),
    );
    let res = CliRunner::new().run(&["payload", "--input", room.to_string_lossy().as_ref()]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).unwrap();
    assert_eq!(v["prize_model"], "fixed");
    assert_eq!(v["prize_total"], 1000.0);
    assert_eq!(v["price_per_card"], 10.0);
    assert_eq!(v["rounds"][0]["prize_amount"], 300.0);
    assert!(res.stderr.contains("Warning: round percentages sum to 90%"));
}
