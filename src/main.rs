use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

use webscript::config::Config;
use webscript::runner::runner::{FakeSessionFactory, Runner};
use webscript::runner::types::TestStatus;

#[derive(Parser)]
#[command(name = "webscript")]
#[command(about = "A browser-test scenario language and parallel runner")]
#[command(version)]
struct Cli {
    /// Execute the script from a command line argument
    #[arg(short = 'c')]
    script: Option<String>,

    /// Maximum tests running at once
    #[arg(long = "workers")]
    workers: Option<usize>,

    /// Retries per test after a failed attempt
    #[arg(long = "retries")]
    retries: Option<u32>,

    /// Config file (defaults to webscript.toml when present)
    #[arg(long = "config")]
    config: Option<PathBuf>,

    /// Output the run summary as JSON
    #[arg(long = "json")]
    json: bool,

    /// Scenario files to run
    #[arg()]
    files: Vec<PathBuf>,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let mut config = match Config::load(cli.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };
    if let Some(workers) = cli.workers {
        config.workers = workers;
    }
    if let Some(retries) = cli.retries {
        config.retries = retries;
    }

    if cli.script.is_none() && cli.files.is_empty() {
        eprintln!("Error: No scripts provided. Use -c 'script' or pass scenario files.");
        std::process::exit(2);
    }

    let runner = Runner::new(Arc::new(FakeSessionFactory::new()), config.runner_options());

    let summary = if let Some(script) = cli.script {
        runner.run_source("<inline>", &script).await
    } else {
        runner.run_files(&cli.files).await
    };

    let summary = match summary {
        Ok(summary) => summary,
        Err(e) => {
            eprintln!("Error: {}", e);
            std::process::exit(2);
        }
    };

    if cli.json {
        match serde_json::to_string_pretty(&summary) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error: cannot serialize summary: {}", e);
                std::process::exit(2);
            }
        }
    } else {
        for result in &summary.results {
            let marker = match result.status {
                TestStatus::Passed => "ok",
                TestStatus::Failed => "FAILED",
                TestStatus::Error => "ERROR",
            };
            let retries = if result.retries > 0 {
                format!(" (retries: {})", result.retries)
            } else {
                String::new()
            };
            println!(
                "{:>6}  {} :: {} [{}ms]{}",
                marker, result.file, result.name, result.duration_ms, retries
            );
            if let Some(message) = &result.message {
                println!("        {}", message);
            }
        }
        println!(
            "\n{} total, {} passed, {} failed, {} errors in {}ms",
            summary.total, summary.passed, summary.failed, summary.errors, summary.duration_ms
        );
    }

    std::process::exit(if summary.all_passed() { 0 } else { 1 });
}
