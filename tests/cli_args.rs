//! Integration tests for CLI argument handling
//!
//! Runs the `wsapi` binary for argument errors and exercises parsing through
//! the library for everything else.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_wsapi"))
        .args(args)
        .env_remove("WORKSPACE_BACKEND_URL")
        .output()
        .expect("Failed to execute wsapi")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("wsapi"), "Help should mention wsapi");
    assert!(stdout.contains("get"), "Help should list the get command");
    assert!(stdout.contains("backend-url"), "Help should mention --backend-url");
}

#[test]
fn test_missing_subcommand_fails() {
    let output = run_cli(&[]);
    assert!(!output.status.success());
}

#[test]
fn test_relative_path_prints_error_and_exits() {
    let output = run_cli(&["get", "api/tools"]);
    assert!(!output.status.success(), "Expected relative path to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid path"),
        "Should print error message about the path: {}",
        stderr
    );
}

#[test]
fn test_invalid_body_prints_error_and_exits() {
    let output = run_cli(&["post", "/api/tools", "--body", "{not json"]);
    assert!(!output.status.success(), "Expected invalid body to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid JSON body"),
        "Should print error message about the body: {}",
        stderr
    );
}

#[test]
fn test_zero_watch_interval_is_rejected() {
    let output = run_cli(&["watch", "/api/tools", "--interval", "0"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("Invalid interval"), "{}", stderr);
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use workspace_api::cli::{Cli, Command};
    use workspace_api::client::MutationMethod;

    #[test]
    fn test_get_with_ttl_and_repeat() {
        let cli = Cli::parse_from(["wsapi", "get", "/api/tools", "--ttl", "1000", "--repeat", "3"]);
        assert_eq!(
            cli.command,
            Command::Get {
                path: "/api/tools".to_string(),
                ttl: 1000,
                repeat: 3
            }
        );
    }

    #[test]
    fn test_watch_defaults() {
        let cli = Cli::parse_from(["wsapi", "watch", "/api/announcements"]);
        assert_eq!(
            cli.command,
            Command::Watch {
                path: "/api/announcements".to_string(),
                interval: 30,
                count: None
            }
        );
    }

    #[test]
    fn test_login_takes_token() {
        let cli = Cli::parse_from(["wsapi", "login", "abc"]);
        assert_eq!(
            cli.command,
            Command::Login {
                token: "abc".to_string()
            }
        );
    }

    #[test]
    fn test_put_is_a_mutation() {
        let cli = Cli::parse_from(["wsapi", "put", "/api/profile", "--body", "{}"]);
        let request = cli.command.mutation().unwrap().unwrap();
        assert_eq!(request.method, MutationMethod::Put);
        assert_eq!(request.path, "/api/profile");
    }

    #[test]
    fn test_get_is_not_a_mutation() {
        let cli = Cli::parse_from(["wsapi", "get", "/api/profile"]);
        assert!(cli.command.mutation().unwrap().is_none());
    }

    #[test]
    fn test_unknown_subcommand_is_rejected() {
        assert!(Cli::try_parse_from(["wsapi", "fetch", "/api/tools"]).is_err());
    }
}
