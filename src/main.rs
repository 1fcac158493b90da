use chrono::{NaiveDate, Utc};
use clap::Parser;
use okanjo_commissions::client::BASE_URL;
use okanjo_commissions::config::{DEFAULT_CSV_OUTPUT, DEFAULT_JSON_OUTPUT};
use okanjo_commissions::{Config, ReportError, ReportFilters, ReportWindow};
use std::error::Error;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "okanjo-commissions",
    version,
    about = "Export the Okanjo commission report to JSON and CSV"
)]
struct Cli {
    /// Account email; falls back to EMAIL env var
    #[arg(long, env = "EMAIL")]
    email: Option<String>,

    /// Account password; falls back to PASSWORD env var
    #[arg(long, env = "PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// API key; falls back to API_KEY env var
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    #[arg(long, env = "OKANJO_API_URL", default_value = BASE_URL)]
    base_url: String,

    /// Number of full days before today to report on
    #[arg(long, default_value_t = ReportWindow::DEFAULT_DAYS)]
    days: u32,

    /// Start date YYYY-MM-DD (inclusive), overrides --days
    #[arg(long, value_parser = parse_date, requires = "end")]
    start: Option<NaiveDate>,

    /// End date YYYY-MM-DD (exclusive)
    #[arg(long, value_parser = parse_date, requires = "start")]
    end: Option<NaiveDate>,

    /// Restrict the report to a farm instance; repeatable
    #[arg(long = "instance-id", value_name = "ID")]
    instance_ids: Vec<String>,

    #[arg(long, default_value = DEFAULT_JSON_OUTPUT)]
    json_output: PathBuf,

    #[arg(long, default_value = DEFAULT_CSV_OUTPUT)]
    csv_output: PathBuf,

    /// Per-request timeout in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw, "%Y-%m-%d").map_err(|e| e.to_string())
}

impl Cli {
    fn into_config(self) -> Result<Config, ReportError> {
        let window = match (self.start, self.end) {
            (Some(start), Some(end)) => ReportWindow::from_dates(start, end)?,
            _ => ReportWindow::trailing_days(Utc::now(), self.days)?,
        };

        let mut config = Config::new(
            self.email.unwrap_or_default(),
            self.password.unwrap_or_default(),
            self.api_key.unwrap_or_default(),
            window,
        );
        config.base_url = self.base_url;
        config.timeout = Duration::from_secs(self.timeout_secs);
        config.filters = ReportFilters {
            instance_ids: self.instance_ids,
        };
        config.json_output = self.json_output;
        config.csv_output = self.csv_output;
        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    dotenvy::dotenv().ok();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // --help and --version land here too and must still succeed.
            let code = if err.use_stderr() { 1 } else { 0 };
            err.print()?;
            std::process::exit(code);
        }
    };
    let config = cli.into_config()?;
    let summary = okanjo_commissions::run(&config).await?;

    println!(
        "Exported {} commissions ({} total) for {} to {} and {}",
        summary.records,
        summary.total_commission,
        summary.window,
        summary.json_output.display(),
        summary.csv_output.display()
    );
    Ok(())
}
