use models::Result;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod extract;
mod fetch;
mod ingest;
mod models;
mod queue;
mod report;
mod scan;

use config::{load_config, Config};
use dialoguer::{theme::ColorfulTheme, Confirm};
use fetch::{ChromiumRenderer, NoopRenderer, PageRenderer};
use report::ReportWriter;
use scan::{ProgressCallback, ScanJob, ScanPipeline};
use std::sync::Arc;
use tokio::signal;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    let config = match load_config("config.yml").await {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Failed to load config.yml: {}. Using defaults.", e);
            Config::default()
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(
                format!("email_harvester={}", config.logging.level)
                    .parse()
                    .unwrap_or_else(|_| "email_harvester=info".parse().unwrap()),
            ),
        )
        .init();

    let url_file = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "urls.txt".to_string());

    info!("📥 Reading URL list from {}", url_file);
    let content = tokio::fs::read_to_string(&url_file).await?;

    let job = ScanJob::from_url_list(&content).await;
    if job.total_targets == 0 {
        warn!("No valid URLs in {} ({} lines skipped)", url_file, job.skipped.len());
        return Ok(());
    }
    info!(
        "✅ {} targets queued, {} entries skipped",
        job.total_targets,
        job.skipped.len()
    );

    if job.total_targets > config.logging.confirm_above {
        let proceed = Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(format!("Scan {} sites?", job.total_targets))
            .default(true)
            .interact()?;
        if !proceed {
            info!("Aborted before scanning");
            return Ok(());
        }
    }

    tokio::fs::create_dir_all(&config.report.directory).await?;

    let renderer: Arc<dyn PageRenderer> =
        match ChromiumRenderer::launch(config.scan.render_settle_ms).await {
            Ok(renderer) => Arc::new(renderer),
            Err(e) => {
                warn!("Chromium unavailable ({}), falling back to HTTP-only mode", e);
                Arc::new(NoopRenderer)
            }
        };

    let pipeline = Arc::new(ScanPipeline::new(config.scan.clone(), renderer)?);

    let interval = config.logging.progress_interval.max(1);
    let progress: ProgressCallback = Box::new(move |completed, total, url| {
        if completed % interval == 0 || completed == total {
            info!("📊 {}/{} sites processed (last: {})", completed, total, url);
        }
    });

    // Ctrl+C cancels the job through its queue; in-flight fetches drain
    // and whatever finished still lands in the report.
    let queue = job.queue.clone();
    let runner = pipeline.clone();
    let mut scan_task = tokio::spawn(async move { runner.run(job, Some(progress)).await });

    let job_report = tokio::select! {
        result = &mut scan_task => result?,
        _ = signal::ctrl_c() => {
            info!("Received Ctrl+C, cancelling job and draining in-flight fetches...");
            queue.cancel();
            (&mut scan_task).await?
        }
    };

    let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
    let csv_path = format!(
        "{}/email_results_{}.csv",
        config.report.directory, timestamp
    );

    let json_path = format!(
        "{}/email_results_{}.json",
        config.report.directory, timestamp
    );

    let writer = ReportWriter::new(config.report.include_failed, config.report.pretty_json);
    writer.write_csv(&job_report, &csv_path).await?;
    writer.write_json(&job_report, &json_path).await?;
    println!("{}", writer.summary(&job_report, &csv_path));

    Ok(())
}
