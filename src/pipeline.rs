use crate::client::Client;
use crate::config::Config;
use crate::error::ReportError;
use crate::export::{write_flat_csv, write_raw_json};
use crate::models::{CommissionRecord, ReportWindow};
use crate::session::ActiveSession;
use log::{info, warn};
use rust_decimal::Decimal;
use std::path::PathBuf;

/// Outcome of a completed export run.
#[derive(Debug, Clone, PartialEq)]
pub struct RunSummary {
    pub records: usize,
    pub total_commission: Decimal,
    pub window: ReportWindow,
    pub json_output: PathBuf,
    pub csv_output: PathBuf,
}

/// Log in, export the commission report, log out.
///
/// Once the login succeeds the session is always ended, even if fetching or
/// writing fails. A failed logout is only logged; the run's own result wins.
pub async fn run(config: &Config) -> Result<RunSummary, ReportError> {
    config.validate()?;
    let client = Client::with_timeout(config.api_key.as_str(), config.timeout)?
        .with_base_url(config.base_url.as_str());

    let session = ActiveSession::open(&client, &config.email, &config.password).await?;
    let outcome = export_report(&session, config).await;

    let session_id = session.session_id().to_string();
    if let Err(err) = session.close().await {
        warn!("Failed to end session {}: {}", session_id, err);
    }
    outcome
}

async fn export_report(
    session: &ActiveSession<'_>,
    config: &Config,
) -> Result<RunSummary, ReportError> {
    let records = session
        .fetch_commissions(&config.window, &config.filters)
        .await?;

    write_raw_json(&records, &config.json_output)?;
    write_flat_csv(&records, &config.csv_output)?;

    let total_commission: Decimal = records
        .iter()
        .filter_map(CommissionRecord::commission_amount)
        .sum();
    info!(
        "Exported {} commissions worth {} for account {}",
        records.len(),
        total_commission,
        session.account().id
    );

    Ok(RunSummary {
        records: records.len(),
        total_commission,
        window: config.window,
        json_output: config.json_output.clone(),
        csv_output: config.csv_output.clone(),
    })
}
