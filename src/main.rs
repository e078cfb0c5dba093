use clap::{Parser, Subcommand};
use colored::Colorize;
use std::path::PathBuf;
use std::process::ExitCode;

use qa_harness::runner::{api, checkout, mobile};
use qa_harness::utils::config::{env_snapshot, ApiConfig, EnvMap, MobileConfig, WebConfig};
use qa_harness::{driver, report};

#[derive(Parser)]
#[command(name = "qa-harness")]
#[command(version = "0.1.0")]
#[command(about = "QA automation entrypoints: API, web and mobile", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the API smoke tests and write a JSON report
    Api {
        /// Base URL of the REST service (overrides API_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Root directory for artifacts
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Run the web checkout flow
    Web {
        /// Base URL of the shop (overrides WEB_BASE_URL)
        #[arg(long)]
        base_url: Option<String>,

        /// Show the browser window (sets WEB_HEADLESS=false)
        #[arg(long, default_value = "false")]
        headed: bool,

        /// Root directory for artifacts
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// Run the mobile UI suite through Appium
    Mobile {
        /// Device serial (overrides ANDROID_UDID)
        #[arg(short, long)]
        device: Option<String>,

        /// Root directory for artifacts
        #[arg(short, long, default_value = ".")]
        output: PathBuf,
    },

    /// List connected devices
    Devices {
        /// Target platform
        #[arg(short, long, default_value = "android")]
        platform: String,
    },

    /// Print the summary of a saved JSON report
    Report {
        /// Path to the report file
        path: PathBuf,
    },
}

impl Commands {
    /// Console prefix used when the command fails unexpectedly
    fn label(&self) -> &'static str {
        match self {
            Commands::Api { .. } => "api-testing",
            Commands::Web { .. } => "web-testing",
            Commands::Mobile { .. } => "mobile",
            Commands::Devices { .. } => "devices",
            Commands::Report { .. } => "report",
        }
    }
}

fn override_env(env: &mut EnvMap, key: &str, value: Option<String>) {
    if let Some(v) = value {
        env.insert(key.to_string(), v);
    }
}

async fn run(command: Commands) -> anyhow::Result<i32> {
    let mut env = env_snapshot();

    match command {
        Commands::Api { base_url, output } => {
            override_env(&mut env, "API_BASE_URL", base_url);
            let config = ApiConfig::from_env_map(&env, &output);
            let (report, _) = api::run(&config).await?;
            Ok(report.exit_code())
        }

        Commands::Web {
            base_url,
            headed,
            output,
        } => {
            override_env(&mut env, "WEB_BASE_URL", base_url);
            if headed {
                env.insert("WEB_HEADLESS".into(), "false".into());
            }
            let config = WebConfig::from_env_map(&env, &output)?;
            checkout::run(&config).await?;
            Ok(0)
        }

        Commands::Mobile { device, output } => {
            override_env(&mut env, "ANDROID_UDID", device);
            let config = MobileConfig::from_env_map(&env, &output)?;
            let (report, _) = mobile::run(&config).await?;
            Ok(report.exit_code())
        }

        Commands::Devices { platform } => {
            println!(
                "{} Listing {} devices...",
                "🔍".to_string().blue(),
                platform.cyan()
            );
            driver::list_devices(&platform).await?;
            Ok(0)
        }

        Commands::Report { path } => report::show_report(&path),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    let label = cli.command.label();

    match run(cli.command).await {
        Ok(0) => ExitCode::SUCCESS,
        Ok(_) => ExitCode::FAILURE,
        Err(e) => {
            eprintln!("[{}] {} (unexpected error)", label, "FAIL".red().bold());
            eprintln!("{:#}", e);
            ExitCode::FAILURE
        }
    }
}
