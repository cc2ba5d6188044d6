use crate::helpers::cli_runner::CliRunner;
use crate::helpers::temp_files::TempFileManager;
use std::fs;

const ROOM_TOML: &str = r#"
name = "Weekend Special"
currency = "USD"
min_players = 120
commission_percent = 10.0

[pricing]
mode = "from_prize"
prize_total = 500.0
tickets_base = 100

[[rounds]]
pattern = "horizontal"
percent = 40.0

[[rounds]]
pattern = "vertical"
percent = 30.0

[[rounds]]
pattern = "full"
percent = 30.0
"#;

fn scenario_args() -> Vec<&'static str> {
    vec![
        "preview",
        "--price", "10",
        "--min-players", "10",
        "--commission", "10",
        "--round", "horizontal:40",
        "--round", "vertical:30",
        "--round", "full:30",
    ]
}

#[test]
fn json_preview_matches_pot_arithmetic() {
    let mut args = scenario_args();
    args.push("--json");
    let res = CliRunner::new().run(&args);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).expect("json");
    assert_eq!(v["base_pot"], 100.0);
    assert_eq!(v["house_cut"], 10.0);
    assert_eq!(v["prize_pool"], 90.0);
    let amounts: Vec<f64> = v["per_round_prize"]
        .as_array()
        .unwrap()
        .iter()
        .map(|r| r["amount"].as_f64().unwrap())
        .collect();
    assert_eq!(amounts, vec![36.0, 27.0, 27.0]);
    assert!(res.stderr.is_empty());
}

#[test]
fn text_preview_from_room_file() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file("room.toml", ROOM_TOML);
    let res = CliRunner::new().run(&["preview", "--input", room.to_string_lossy().as_ref()]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    assert!(res.stdout.contains("Room: Weekend Special"));
    assert!(res.stdout.contains("Ticket price: $5.00 x 120 players"));
    assert!(res.stdout.contains("Base pot:   $600.00"));
    assert!(res.stdout.contains("House cut:  $100.00"));
    assert!(res.stdout.contains("Prize pool: $500.00 (fixed)"));
    assert!(res.stdout.contains("$200.00"));
    assert!(res.stderr.is_empty(), "stderr: {}", res.stderr);
}

#[test]
fn prize_total_flag_previews_fixed_prize() {
    let res = CliRunner::new().run(&[
        "preview",
        "--prize-total", "300",
        "--tickets-base", "60",
        "--min-players", "50",
        "--round", "horizontal:50",
        "--round", "full:50",
        "--json",
    ]);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).expect("json");
    assert_eq!(v["prize_model"], "fixed");
    assert_eq!(v["base_pot"], 250.0);
    assert_eq!(v["prize_pool"], 300.0);
    assert_eq!(v["per_round_prize"][0]["amount"], 150.0);
    assert!(res.stderr.contains("Warning: fixed prize 300 is more than the minimum pot 250"));
}

#[test]
fn configured_commission_and_currency_seed_room_files() {
    let tmp = TempFileManager::new();
    let room = tmp.create_file(
        "room.toml",
        "name = \"Plain\"\nmin_players = 10\n\n[pricing]\nmode = \"manual\"\nticket_price = 10.0\n",
    );
    let path = room.to_string_lossy().to_string();
    let env = [("BGO_COMMISSION", "0"), ("BGO_CURRENCY", "USD")];

    let res = CliRunner::new().run_with_env(&["preview", "--input", &path, "--json"], &env);
    assert_eq!(res.exit_code, 0, "stderr: {}", res.stderr);
    let v: serde_json::Value = serde_json::from_str(&res.stdout).unwrap();
    assert_eq!(v["house_cut"], 0.0);
    assert_eq!(v["prize_pool"], 100.0);

    let text = CliRunner::new().run_with_env(&["preview", "--input", &path], &env);
    assert!(text.stdout.contains("Prize pool: $100.00"), "stdout: {}", text.stdout);
}

#[test]
fn unbalanced_rounds_warn_but_succeed() {
    let res = CliRunner::new().run(&[
        "preview",
        "--price", "5",
        "--min-players", "20",
        "--round", "horizontal:40",
        "--round", "full:50",
        "--json",
    ]);
    assert_eq!(res.exit_code, 0);
    assert!(res.stderr.contains("Warning: round percentages sum to 90%, expected 100%"));
}

#[test]
fn zero_price_is_rejected() {
    let res = CliRunner::new().run(&["preview", "--price", "0", "--min-players", "10"]);
    assert_eq!(res.exit_code, 1);
    assert!(res.stderr.contains("Invalid ticket price"));
    assert!(res.stdout.is_empty());
}

#[test]
fn commission_out_of_range_is_rejected() {
    let res = CliRunner::new().run(&[
        "preview", "--price", "1", "--min-players", "10", "--commission", "120",
    ]);
    assert_eq!(res.exit_code, 1);
    assert!(res.stderr.contains("Invalid commission"));
}

#[test]
fn bad_round_spec_is_rejected() {
    let res = CliRunner::new().run(&[
        "preview", "--price", "1", "--min-players", "10", "--round", "horizontal=40",
    ]);
    assert_eq!(res.exit_code, 1);
    assert!(res.stderr.contains("pattern:percent"));
}

#[test]
fn preview_log_appends_jsonl() {
    let tmp = TempFileManager::new();
    let log = tmp.path("logs/previews.jsonl");
    let log_arg = log.to_string_lossy().to_string();
    let mut args = scenario_args();
    args.extend(["--log", log_arg.as_str(), "--json"]);

    let cli = CliRunner::new();
    assert_eq!(cli.run(&args).exit_code, 0);
    assert_eq!(cli.run(&args).exit_code, 0);

    let text = fs::read_to_string(&log).expect("log written");
    let lines: Vec<&str> = text.lines().collect();
    assert_eq!(lines.len(), 2);
    let rec: serde_json::Value = serde_json::from_str(lines[0]).unwrap();
    assert_eq!(rec["input"]["min_players"], 10);
    assert!(rec["ts"].is_string());
}
