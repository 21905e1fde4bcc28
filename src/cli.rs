//! Command-line interface definition

use crate::config::SpeedtestConfig;
use clap::Parser;

/// Network Speed Tester - measures latency, jitter and sustained throughput
/// against an HTTP speed test server
#[derive(Parser, Debug, Clone)]
#[command(name = "network-speed-tester")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// URL of the speed test server (the conventional `…/upload.php` endpoint)
    #[arg(long = "custom-url", value_name = "URL")]
    pub custom_url: String,

    /// Number of concurrent connections (0 selects the number of CPU cores)
    #[arg(short = 't', long, default_value_t = 0)]
    pub thread: usize,

    /// Duration of each throughput phase in seconds
    #[arg(long, default_value_t = crate::defaults::DEFAULT_DURATION_SECS)]
    pub duration: u64,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = crate::defaults::DEFAULT_TIMEOUT_SECS)]
    pub timeout: u64,

    /// Disable the download test
    #[arg(long)]
    pub no_download: bool,

    /// Disable the upload test
    #[arg(long)]
    pub no_upload: bool,

    /// Proxy URL (http, https or socks) for the speed test transport
    #[arg(long)]
    pub proxy: Option<String>,

    /// Source interface IP address to bind outgoing connections to
    #[arg(long)]
    pub source: Option<String>,

    /// Output results in JSON format
    #[arg(long)]
    pub json: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Enable debug output
    #[arg(long)]
    pub debug: bool,

    /// Disable colored output
    #[arg(long)]
    pub no_color: bool,
}

impl Cli {
    /// Validate CLI arguments for conflicts and requirements
    pub fn validate(&self) -> Result<(), String> {
        if self.timeout == 0 {
            return Err("Timeout must be at least 1 second".to_string());
        }
        Ok(())
    }

    /// Lower the CLI flags into a core configuration
    pub fn to_config(&self) -> SpeedtestConfig {
        SpeedtestConfig {
            concurrency: if self.thread == 0 {
                num_cpus::get()
            } else {
                self.thread
            },
            duration_seconds: self.duration,
            timeout_seconds: self.timeout,
            proxy: self.proxy.clone(),
            source: self.source.clone(),
            no_download: self.no_download,
            no_upload: self.no_upload,
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(
            std::iter::once("network-speed-tester").chain(args.iter().copied()),
        )
        .unwrap()
    }

    #[test]
    fn test_minimal_invocation() {
        let cli = parse(&["--custom-url", "http://host.example/upload.php"]);
        assert_eq!(cli.custom_url, "http://host.example/upload.php");
        assert_eq!(cli.thread, 0);
        assert_eq!(cli.duration, 10);
        assert!(!cli.json);
        assert!(cli.validate().is_ok());
    }

    #[test]
    fn test_custom_url_is_required() {
        assert!(Cli::try_parse_from(["network-speed-tester"]).is_err());
    }

    #[test]
    fn test_zero_timeout_rejected() {
        let cli = parse(&[
            "--custom-url",
            "http://host.example/upload.php",
            "--timeout",
            "0",
        ]);
        assert!(cli.validate().is_err());
    }

    #[test]
    fn test_to_config_resolves_auto_threads() {
        let cli = parse(&["--custom-url", "http://host.example/upload.php"]);
        let config = cli.to_config();
        assert_eq!(config.concurrency, num_cpus::get());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_to_config_carries_flags() {
        let cli = parse(&[
            "--custom-url",
            "http://host.example/upload.php",
            "-t",
            "8",
            "--duration",
            "5",
            "--no-upload",
            "--proxy",
            "socks5://127.0.0.1:1080",
            "--source",
            "192.168.1.10",
        ]);
        let config = cli.to_config();
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.duration_seconds, 5);
        assert!(config.no_upload);
        assert!(!config.no_download);
        assert_eq!(config.proxy.as_deref(), Some("socks5://127.0.0.1:1080"));
        assert_eq!(config.source.as_deref(), Some("192.168.1.10"));
    }
}
