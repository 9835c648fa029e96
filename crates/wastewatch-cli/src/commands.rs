//! Subcommand implementations

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use clap::Args;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use wastewatch_core::{
    format_location, prefill_location, Assessment, Dashboard, DashboardError, DashboardSnapshot,
    FixedPosition, GeoPoint, ImageUpload, ImageVerifier, Report, ReportForm, ReportId,
    SubmissionError, SubmissionWorkflow, VerificationError,
};
use wastewatch_ledger::WalletConnector;
use wastewatch_storage::CloudinaryStore;
use wastewatch_verify::GeminiVerifier;

use crate::config::WastewatchConfig;

/// Arguments of `submit`
#[derive(Debug, Args)]
pub(crate) struct SubmitArgs {
    /// Photo of the dumping site
    #[arg(long)]
    image: Option<PathBuf>,

    /// What was dumped and where
    #[arg(long)]
    description: Option<String>,

    /// Free-text location
    #[arg(long, conflicts_with_all = ["lat", "lng"])]
    location: Option<String>,

    /// Latitude of the site
    #[arg(long, requires = "lng", allow_hyphen_values = true)]
    lat: Option<f64>,

    /// Longitude of the site
    #[arg(long, requires = "lat", allow_hyphen_values = true)]
    lng: Option<f64>,
}

async fn read_image(path: &Path) -> Result<ImageUpload> {
    let bytes = tokio::fs::read(path)
        .await
        .with_context(|| format!("cannot read image {}", path.display()))?;
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "upload".to_string());
    let content_type = ImageUpload::content_type_for(&file_name);
    Ok(ImageUpload::new(file_name, content_type, bytes))
}

/// Stand-in verifier for bypass builds
///
/// The workflow never consults it while bypassing; any call is refused.
#[derive(Debug)]
struct DisabledVerifier;

#[async_trait]
impl ImageVerifier for DisabledVerifier {
    async fn assess(&self, _image_url: &str) -> Result<Assessment, VerificationError> {
        Err(VerificationError::Service(
            "verification is disabled in this build".to_string(),
        ))
    }
}

fn verifier(config: &WastewatchConfig) -> Result<Arc<dyn ImageVerifier>> {
    if config.workflow.bypass_verification {
        return Ok(Arc::new(DisabledVerifier));
    }
    Ok(Arc::new(GeminiVerifier::from_config(&config.verification)?))
}

fn dashboard(config: &WastewatchConfig) -> Dashboard {
    Dashboard::new(
        config.dashboard,
        Arc::new(WalletConnector::new(config.ledger.clone())),
    )
}

fn dashboard_error(err: DashboardError) -> anyhow::Error {
    match err {
        DashboardError::WalletUnavailable => anyhow!("No wallet connected!"),
        other => anyhow!(other),
    }
}

/// `submit`
pub(crate) async fn submit(config: &WastewatchConfig, args: SubmitArgs) -> Result<()> {
    let mut form = ReportForm::new().with_description(args.description.unwrap_or_default());
    if let Some(path) = &args.image {
        form = form.with_image(read_image(path).await?);
    }
    let location = match (args.location, args.lat.zip(args.lng)) {
        (Some(location), _) => location,
        (None, Some((lat, lng))) => {
            prefill_location(&FixedPosition(Some(GeoPoint::new(lat, lng)))).await?
        }
        (None, None) => String::new(),
    };
    form = form.with_location(location);

    let workflow = SubmissionWorkflow::new(
        config.workflow,
        Arc::new(CloudinaryStore::new(config.storage.clone())),
        verifier(config)?,
        Arc::new(WalletConnector::new(config.ledger.clone())),
    );

    match workflow.submit(&form).await {
        Ok(receipt) => {
            println!("Report submitted successfully!");
            println!("  Image:        {}", receipt.image_url);
            if receipt.bypassed {
                println!("  Verification: bypassed");
            } else {
                println!(
                    "  Verification: {}% - {}",
                    receipt.verification.confidence, receipt.verification.explanation
                );
            }
            println!("  Transaction:  {}", receipt.receipt.tx_hash);
            Ok(())
        }
        Err(err) => {
            if let Some(result) = err.verification() {
                eprintln!("{}", result.explanation);
            }
            if let SubmissionError::LedgerTransaction { image_url, source } = &err {
                eprintln!("{source}");
                eprintln!("Image was uploaded to {image_url}");
            }
            bail!(err.user_message())
        }
    }
}

/// `verify`
pub(crate) async fn verify(config: &WastewatchConfig, url: &str) -> Result<()> {
    let verifier = GeminiVerifier::from_config(&config.verification)?;
    let result = verifier.verify_image(url).await;
    println!("{}", serde_json::to_string_pretty(&result)?);
    Ok(())
}

fn status_label(report: &Report) -> &'static str {
    if report.completed {
        "completed"
    } else {
        "pending"
    }
}

fn summary_line(report: &Report) -> String {
    let headline = report.description.lines().next().unwrap_or_default();
    format!(
        "#{:<4} {:<9} {:<20} {}",
        report.id.0,
        status_label(report),
        report.location,
        headline
    )
}

fn print_stats(snapshot: &DashboardSnapshot) {
    println!(
        "Total: {}  Completed: {}  Pending: {}",
        snapshot.stats.total, snapshot.stats.completed, snapshot.stats.pending
    );
}

/// `list`
pub(crate) async fn list(config: &WastewatchConfig, json: bool) -> Result<()> {
    let snapshot = dashboard(config).load().await.map_err(dashboard_error)?;
    if json {
        println!("{}", serde_json::to_string_pretty(&snapshot)?);
        return Ok(());
    }

    print_stats(&snapshot);
    if snapshot.reports.is_empty() {
        println!("No reports submitted yet.");
    }
    for report in &snapshot.reports {
        println!("{}", summary_line(report));
    }
    Ok(())
}

/// `show`
pub(crate) async fn show(config: &WastewatchConfig, id: u64) -> Result<()> {
    let snapshot = dashboard(config)
        .load()
        .await
        .map_err(dashboard_error)?
        .select(ReportId(id));
    let Some(report) = snapshot.selected_report() else {
        bail!("Report #{id} not found");
    };

    println!("Report #{}", report.id);
    println!("  Status:      {}", status_label(report));
    if let Some(created) = report.created_at() {
        println!("  Submitted:   {created}");
    }
    println!("  Location:    {}", report.location);
    println!("  Image:       {}", report.image_url);
    match snapshot.map_center {
        Some(center) => println!("  Map center:  {}", format_location(center)),
        None => println!("  Map center:  (no coordinates)"),
    }
    println!();
    println!("{}", report.description);
    Ok(())
}

/// `complete`
pub(crate) async fn complete(config: &WastewatchConfig, id: u64) -> Result<()> {
    let snapshot = dashboard(config)
        .mark_completed(ReportId(id))
        .await
        .map_err(dashboard_error)?;
    println!("Report #{id} marked as completed.");
    print_stats(&snapshot);
    Ok(())
}
