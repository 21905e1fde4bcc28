//! Network Speed Tester - CLI entry point

use clap::Parser;
use colored::Colorize;
use network_speed_tester::{
    cli::Cli,
    logging::{self, LogLevel},
    meter::RateCallback,
    Result, Server, SpeedtestError, TestContext,
};
use std::io::Write;
use std::process;
use std::sync::Arc;

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Err(message) = cli.validate() {
        eprintln!("Error: {}", message);
        process::exit(1);
    }

    if cli.no_color {
        colored::control::set_override(false);
    }
    if cli.debug {
        logging::set_min_level(LogLevel::Debug);
    } else if cli.verbose {
        logging::set_min_level(LogLevel::Info);
    } else {
        logging::set_min_level(LogLevel::Warn);
    }

    if let Err(e) = run(cli).await {
        eprintln!("{} {}", "Error:".red().bold(), e);
        process::exit(e.exit_code());
    }
}

/// Main application logic: ping, download and upload phases in sequence
async fn run(cli: Cli) -> Result<()> {
    let config = cli.to_config();
    let ctx = TestContext::new(config)?;
    let mut server = Server::new(cli.custom_url.clone())?;

    server.ping_test(&ctx).await?;
    if !cli.json {
        println!(
            "{} {:.1} ms (jitter {:.1} ms, min {:.1} ms, max {:.1} ms)",
            "Latency:".bold(),
            server.latency.as_secs_f64() * 1000.0,
            server.jitter.as_secs_f64() * 1000.0,
            server.min_latency.as_secs_f64() * 1000.0,
            server.max_latency.as_secs_f64() * 1000.0,
        );
    }

    if !ctx.config.no_download {
        server
            .download_test(&ctx, progress_callback(cli.json, "Download"))
            .await?;
        if !cli.json {
            println!(
                "\r{} {:.2} Mbps        ",
                "Download:".bold(),
                server.download_speed
            );
        }
    }

    if !ctx.config.no_upload {
        server
            .upload_test(&ctx, progress_callback(cli.json, "Upload"))
            .await?;
        if !cli.json {
            println!(
                "\r{} {:.2} Mbps        ",
                "Upload:".bold(),
                server.upload_speed
            );
        }
    }

    if cli.json {
        let summary = serde_json::to_string_pretty(&server.summary())
            .map_err(|e| SpeedtestError::parse(format!("Failed to encode results: {}", e)))?;
        println!("{}", summary);
    }

    Ok(())
}

/// In-place progress line fed by the periodic rate samples; suppressed in
/// JSON mode so stdout stays machine-readable
fn progress_callback(json: bool, label: &'static str) -> Option<RateCallback> {
    if json {
        return None;
    }
    Some(Arc::new(move |rate_mbps: f64| {
        print!("\r{} {:>8.2} Mbps", format!("{}:", label).bold(), rate_mbps);
        let _ = std::io::stdout().flush();
    }))
}
