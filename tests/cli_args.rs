//! Integration tests for the metarsearch binary
//!
//! Runs the binary against config files in a temp directory and a local HTTP
//! server standing in for the METAR form.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::Path;
use std::process::Command;
use std::thread;

use tempfile::TempDir;

const PAGE: &str = "<HTML><TR VALIGN=\"top\">hdr<TR VALIGN=\"top\"><TD>METAR LEMD 191830Z CAVOK</TD></TR></TABLE>Output produced by METARs form</HTML>";

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_metarsearch"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("Failed to execute metarsearch")
}

/// Serves `body` with `status` to every connection until the test process exits
fn serve_forever(status: u16, body: &'static str) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let Ok(mut stream) = stream else { continue };
            let mut buf = [0u8; 4096];
            let _ = stream.read(&mut buf);
            let response = format!(
                "HTTP/1.1 {} X\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                status,
                body.len(),
                body
            );
            let _ = stream.write_all(response.as_bytes());
        }
    });

    format!("http://{}/adds/metars", addr)
}

fn write_config(dir: &Path, base_url: &str) -> String {
    let path = dir.join("metarsearch.toml");
    let contents = format!(
        "[MetarReport]\nbase_url = \"{}\"\ncache_dir = \"{}\"\nmax_attempts = 2\nbackoff_min = 0\nbackoff_max = 0\n\n[MetarReport.lemd]\n",
        base_url,
        dir.display()
    );
    std::fs::write(&path, contents).unwrap();
    path.to_string_lossy().to_string()
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(output.status.success(), "Expected --help to exit successfully");
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("metarsearch"), "Help should mention metarsearch");
    assert!(stdout.contains("--station"), "Help should mention --station flag");
}

#[test]
fn test_invalid_station_prints_error_and_exits() {
    let output = run_cli(&["--station", "le/md"]);
    assert!(!output.status.success(), "Expected invalid station to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid station"),
        "Should print error message about invalid station: {}",
        stderr
    );
}

#[test]
fn test_config_without_stations_is_rejected() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("empty.toml");
    std::fs::write(&path, "[MetarReport]\nrefresh_interval = 5\n").unwrap();

    let output = run_cli(&["--config", path.to_str().unwrap()]);

    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("at least one station"), "stderr: {}", stderr);
}

#[test]
fn test_renders_table_from_server_and_caches_it() {
    let temp_dir = TempDir::new().unwrap();
    let base_url = serve_forever(200, PAGE);
    let config = write_config(temp_dir.path(), &base_url);

    let output = run_cli(&["--config", &config, "--format", "json"]);

    assert!(output.status.success());
    let tags: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    let table = tags["lemd_metar"].as_str().unwrap();
    assert!(table.contains("METAR LEMD 191830Z CAVOK"));
    assert_eq!(
        std::fs::read_to_string(temp_dir.path().join("lemd.metar")).unwrap(),
        table
    );
}

#[test]
fn test_server_failure_falls_back_to_cached_file() {
    let temp_dir = TempDir::new().unwrap();
    let base_url = serve_forever(500, "down");
    let config = write_config(temp_dir.path(), &base_url);
    std::fs::write(temp_dir.path().join("lemd.metar"), "<TABLE>cached</TABLE>").unwrap();

    let output = run_cli(&["--config", &config]);

    assert!(output.status.success());
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("<!-- lemd_metar -->"));
    assert!(stdout.contains("<TABLE>cached</TABLE>"));
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use clap::Parser;
    use metarsearch::cli::{Cli, OutputFormat};

    #[test]
    fn test_cli_no_args_has_no_stations() {
        let cli = Cli::parse_from(["metarsearch"]);
        assert!(cli.stations.is_empty());
        assert!(cli.config.is_none());
        assert_eq!(cli.format, OutputFormat::Html);
    }

    #[test]
    fn test_cli_refresh_interval_flag() {
        let cli = Cli::parse_from(["metarsearch", "--refresh-interval", "10"]);
        assert_eq!(cli.refresh_interval, Some(10));
    }

    #[test]
    fn test_cli_rejects_unknown_format() {
        assert!(Cli::try_parse_from(["metarsearch", "--format", "xml"]).is_err());
    }
}
