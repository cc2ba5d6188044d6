use std::path::PathBuf;
use std::process::{Command, Stdio};

const BGO_VARS: [&str; 5] = [
    "BGO_CONFIG",
    "BGO_CURRENCY",
    "BGO_COMMISSION",
    "BGO_PERCENT_BASIS",
    "BGO_BLOCK_UNBALANCED",
];

#[derive(Debug, Clone)]
pub struct CliRunner {
    mode: RunMode,
}

#[derive(Debug, Clone)]
enum RunMode {
    Binary(PathBuf),
    Library,
}

#[derive(Debug, Clone)]
pub struct CliResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl CliRunner {
    pub fn new() -> Self {
        // Cargo sets this at compile time for integration tests of a package with a `bgo` bin
        if let Some(p) = option_env!("CARGO_BIN_EXE_bgo") {
            let pb = PathBuf::from(p);
            if pb.exists() {
                return Self {
                    mode: RunMode::Binary(pb),
                };
            }
        }
        Self {
            mode: RunMode::Library,
        }
    }

    pub fn run(&self, args: &[&str]) -> CliResult {
        self.run_with_env(args, &[])
    }

    /// Runs with exactly the given `BGO_*` settings; any set in the test
    /// process are hidden.
    pub fn run_with_env(&self, args: &[&str], env: &[(&str, &str)]) -> CliResult {
        match &self.mode {
            RunMode::Binary(bin) => {
                let mut cmd = Command::new(bin);
                for key in BGO_VARS {
                    cmd.env_remove(key);
                }
                let output = cmd
                    .args(args)
                    .envs(env.iter().copied())
                    .stdin(Stdio::null())
                    .stdout(Stdio::piped())
                    .stderr(Stdio::piped())
                    .output()
                    .expect("failed to run CLI binary");
                CliResult {
                    exit_code: output.status.code().unwrap_or(1),
                    stdout: String::from_utf8_lossy(&output.stdout).to_string(),
                    stderr: String::from_utf8_lossy(&output.stderr).to_string(),
                }
            }
            RunMode::Library => {
                let mut out: Vec<u8> = Vec::new();
                let mut err: Vec<u8> = Vec::new();
                let argv: Vec<String> = std::iter::once("bgo".to_string())
                    .chain(args.iter().map(|s| s.to_string()))
                    .collect();
                let lookup = |key: &str| {
                    env.iter()
                        .find(|(k, _)| *k == key)
                        .map(|(_, v)| v.to_string())
                };
                let code = bgo_cli::run_with_env(argv, lookup, &mut out, &mut err);
                CliResult {
                    exit_code: code,
                    stdout: String::from_utf8_lossy(&out).to_string(),
                    stderr: String::from_utf8_lossy(&err).to_string(),
                }
            }
        }
    }
}
