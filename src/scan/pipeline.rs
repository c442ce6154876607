// src/scan/pipeline.rs - Worker pool driving targets through both tiers
use crate::config::ScanConfig;
use crate::fetch::fast::FastOutcome;
use crate::fetch::{DeepFetcher, FastFetcher, PageRenderer};
use crate::models::{EmailHit, JobReport, Result, Target, TargetReport, TargetStatus};
use crate::scan::aggregator::{self, Aggregator};
use crate::scan::ScanJob;
use std::sync::Arc;
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, info, warn};

/// (completed, total, last finished URL)
pub type ProgressCallback = Box<dyn Fn(usize, usize, &str) + Send + Sync>;

/// Two-tier scan engine. Fast-tier workers dequeue targets concurrently;
/// deep fetches are additionally throttled by a smaller permit pool since
/// each one holds a browser page.
pub struct ScanPipeline {
    config: ScanConfig,
    fast: Arc<FastFetcher>,
    deep: Arc<DeepFetcher>,
    deep_permits: Arc<Semaphore>,
}

impl ScanPipeline {
    pub fn new(config: ScanConfig, renderer: Arc<dyn PageRenderer>) -> Result<Self> {
        let fast = Arc::new(FastFetcher::new(
            config.request_timeout_secs,
            config.max_pages_per_domain,
        )?);
        let deep = Arc::new(DeepFetcher::new(
            renderer,
            config.render_timeout_secs,
            config.max_deep_retries,
            config.retry_base_delay_ms,
            config.retry_jitter_ms,
            config.max_pages_per_domain,
        ));
        let deep_permits = Arc::new(Semaphore::new(config.deep_workers.max(1)));

        Ok(Self {
            config,
            fast,
            deep,
            deep_permits,
        })
    }

    /// Run one job to completion (or until cancelled) and aggregate the
    /// per-target outcomes. Errors on individual targets never abort the
    /// job; they surface as failed targets in the report.
    pub async fn run(&self, job: ScanJob, progress: Option<ProgressCallback>) -> JobReport {
        info!(
            "🕷️  Starting job {} with {} targets",
            job.id, job.total_targets
        );

        let (tx, mut rx) = mpsc::unbounded_channel::<TargetReport>();
        let workers = self.config.fast_workers.clamp(1, job.total_targets.max(1));

        let mut handles = Vec::new();
        for worker_id in 0..workers {
            let queue = job.queue.clone();
            let fast = self.fast.clone();
            let deep = self.deep.clone();
            let deep_permits = self.deep_permits.clone();
            let cap = self.config.max_emails_per_domain;
            let tx = tx.clone();

            handles.push(tokio::spawn(async move {
                while let Some(target) = queue.pop().await {
                    let report = process_target(target, &fast, &deep, &deep_permits, cap).await;
                    if tx.send(report).is_err() {
                        break;
                    }
                }
                debug!("Worker {} drained", worker_id);
            }));
        }
        drop(tx);

        let total = job.total_targets;
        let mut completed = 0;
        let mut agg = Aggregator::new();
        while let Some(report) = rx.recv().await {
            completed += 1;
            if let Some(ref callback) = progress {
                callback(completed, total, &report.url);
            }
            agg.record(report);
        }

        for handle in handles {
            if let Err(e) = handle.await {
                warn!("Scan worker panicked: {}", e);
            }
        }

        let report = agg.into_report(job.id, job.skipped, job.total_targets, job.started_at);
        info!(
            "🏁 Job {} finished: {:?}, {}/{} targets reported, {} emails",
            report.job_id,
            report.status,
            report.targets.len(),
            total,
            report.total_emails()
        );
        report
    }
}

/// Drive one target through the fast tier and, on a miss, the deep tier.
async fn process_target(
    mut target: Target,
    fast: &FastFetcher,
    deep: &DeepFetcher,
    deep_permits: &Semaphore,
    cap: usize,
) -> TargetReport {
    let scan = fast.check(&target.url).await;
    target.status = TargetStatus::FastChecked;

    if scan.outcome == FastOutcome::Resolved {
        let merged = aggregator::merge_hits(scan.emails, Vec::new(), cap);
        target.status = TargetStatus::Done;
        let note = if merged.capped {
            format!("resolved via fast tier (limited to {} emails)", cap)
        } else {
            "resolved via fast tier".to_string()
        };
        return finish(target, merged.hits, scan.contact_page, note);
    }

    let was_blocked = matches!(scan.outcome, FastOutcome::Blocked(_));

    let Ok(_permit) = deep_permits.acquire().await else {
        // Permit pool only closes on shutdown; treat like a render failure.
        target.status = TargetStatus::Failed;
        return finish(target, Vec::new(), scan.contact_page, "scan aborted".to_string());
    };

    let deep_scan = deep.scan(&target.url, &scan.priority_pages).await;
    target.status = TargetStatus::DeepChecked;
    target.retries = deep_scan.attempts.saturating_sub(1);

    let contact_page = deep_scan.contact_page.clone().or(scan.contact_page);
    let merged = aggregator::merge_hits(scan.emails, deep_scan.emails, cap);

    if let Some(render_error) = deep_scan.error {
        if was_blocked {
            // Both tiers failed to reach the site.
            target.status = TargetStatus::Failed;
            let note = format!(
                "unreachable after {} render attempts: {}",
                deep_scan.attempts, render_error
            );
            return finish(target, merged.hits, contact_page, note);
        }
        // Reachable over HTTP, just nothing found and no render to add.
        target.status = TargetStatus::Done;
        let note = format!("no email found (render failed: {})", render_error);
        return finish(target, merged.hits, contact_page, note);
    }

    target.status = TargetStatus::Done;
    let note = if merged.hits.is_empty() {
        "no email found".to_string()
    } else if merged.capped {
        format!("resolved via deep tier (limited to {} emails)", cap)
    } else {
        "resolved via deep tier".to_string()
    };
    finish(target, merged.hits, contact_page, note)
}

fn finish(
    target: Target,
    emails: Vec<EmailHit>,
    contact_page: Option<String>,
    status_note: String,
) -> TargetReport {
    debug!("{} -> {:?} ({})", target.url, target.status, status_note);
    TargetReport {
        target_id: target.id,
        url: target.url,
        status: target.status,
        emails,
        contact_page,
        status_note,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::testing::ScriptedRenderer;
    use crate::models::Tier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config() -> ScanConfig {
        ScanConfig {
            fast_workers: 4,
            deep_workers: 2,
            request_timeout_secs: 5,
            render_timeout_secs: 5,
            render_settle_ms: 0,
            max_pages_per_domain: 5,
            max_emails_per_domain: 5,
            max_deep_retries: 1,
            retry_base_delay_ms: 0,
            retry_jitter_ms: 0,
        }
    }

    async fn html_page(server: &MockServer, route: &str, body: &str) {
        Mock::given(method("GET"))
            .and(path(route))
            .respond_with(
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string(body),
            )
            .mount(server)
            .await;
    }

    fn report_for<'a>(job: &'a JobReport, url_suffix: &str) -> &'a TargetReport {
        job.targets
            .iter()
            .find(|t| t.url.ends_with(url_suffix))
            .unwrap_or_else(|| panic!("no report for {}", url_suffix))
    }

    /// Plain-HTML email resolves fast, JS-only email resolves deep,
    /// unreachable site fails after the retry bound.
    #[tokio::test]
    async fn three_site_scenario() {
        let server = MockServer::start().await;
        html_page(&server, "/a", "<p>write to anna@plain.example</p>").await;
        html_page(&server, "/b", "<div id=app>loading...</div>").await;

        let renderer = Arc::new(ScriptedRenderer::new().with_page(
            &format!("{}/b", server.uri()),
            "<div id=app>bert@rendered.example</div>",
        ));
        let pipeline = ScanPipeline::new(test_config(), renderer.clone()).unwrap();

        let job = ScanJob::from_url_list(&format!(
            "{}/a\n{}/b\nhttp://127.0.0.1:1/\n",
            server.uri(),
            server.uri()
        ))
        .await;
        assert_eq!(job.total_targets, 3);

        let report = pipeline.run(job, None).await;
        assert_eq!(report.targets.len(), 3);

        let a = report_for(&report, "/a");
        assert_eq!(a.status, TargetStatus::Done);
        assert_eq!(a.emails.len(), 1);
        assert_eq!(a.emails[0].tier, Tier::Fast);

        let b = report_for(&report, "/b");
        assert_eq!(b.status, TargetStatus::Done);
        assert_eq!(b.emails.len(), 1);
        assert_eq!(b.emails[0].email, "bert@rendered.example");
        assert_eq!(b.emails[0].tier, Tier::Deep);

        let c = report_for(&report, ":1/");
        assert_eq!(c.status, TargetStatus::Failed);
        assert!(c.emails.is_empty());
        // One render for /b, two (try + one retry) for the dead site.
        assert_eq!(renderer.render_calls(), 3);

        assert_eq!(report.status, crate::models::JobStatus::PartialFailure);
        assert_eq!(report.failed_targets(), 1);
    }

    #[tokio::test]
    async fn duplicate_submission_scans_once() {
        let server = MockServer::start().await;
        let hits = Arc::new(AtomicUsize::new(0));
        let counter = hits.clone();
        Mock::given(method("GET"))
            .and(path("/"))
            .respond_with(move |_req: &wiremock::Request| {
                counter.fetch_add(1, Ordering::Relaxed);
                ResponseTemplate::new(200)
                    .insert_header("content-type", "text/html")
                    .set_body_string("<p>only@once.example</p>")
            })
            .mount(&server)
            .await;

        let renderer = Arc::new(ScriptedRenderer::new());
        let pipeline = ScanPipeline::new(test_config(), renderer).unwrap();

        let job = ScanJob::from_url_list(&format!("{}\n{}\n", server.uri(), server.uri())).await;
        assert_eq!(job.total_targets, 1);

        let report = pipeline.run(job, None).await;
        assert_eq!(report.targets.len(), 1);
        assert_eq!(hits.load(Ordering::Relaxed), 1);
    }

    #[tokio::test]
    async fn reachable_but_empty_site_is_done_not_failed() {
        let server = MockServer::start().await;
        html_page(&server, "/", "<h1>nothing here</h1>").await;

        // No scripted pages: every deep render fails.
        let renderer = Arc::new(ScriptedRenderer::new());
        let pipeline = ScanPipeline::new(test_config(), renderer).unwrap();

        let job = ScanJob::from_url_list(&server.uri()).await;
        let report = pipeline.run(job, None).await;

        let target = &report.targets[0];
        assert_eq!(target.status, TargetStatus::Done);
        assert!(target.emails.is_empty());
        assert!(target.status_note.contains("no email found"));
    }

    #[tokio::test]
    async fn cancelled_job_drains_without_touching_a_concurrent_one() {
        let server = MockServer::start().await;
        html_page(&server, "/", "<p>live@job.example</p>").await;

        let renderer = Arc::new(ScriptedRenderer::new());
        let pipeline = Arc::new(ScanPipeline::new(test_config(), renderer).unwrap());

        let doomed = ScanJob::from_url_list(&format!("{0}/x\n{0}/y\n{0}/z\n", server.uri())).await;
        doomed.cancel();

        let healthy = ScanJob::from_url_list(&server.uri()).await;

        let (doomed_report, healthy_report) =
            tokio::join!(pipeline.run(doomed, None), pipeline.run(healthy, None));

        // Cancelled before any dequeue: nothing processed, no error.
        assert_eq!(doomed_report.targets.len(), 0);
        assert_eq!(doomed_report.status, crate::models::JobStatus::PartialFailure);

        assert_eq!(healthy_report.targets.len(), 1);
        assert_eq!(healthy_report.status, crate::models::JobStatus::Completed);
        assert_eq!(healthy_report.total_emails(), 1);
    }

    #[tokio::test]
    async fn progress_callback_sees_every_target() {
        let server = MockServer::start().await;
        html_page(&server, "/p1", "<p>a@one.example</p>").await;
        html_page(&server, "/p2", "<p>b@two.example</p>").await;

        let renderer = Arc::new(ScriptedRenderer::new());
        let pipeline = ScanPipeline::new(test_config(), renderer).unwrap();

        let job =
            ScanJob::from_url_list(&format!("{0}/p1\n{0}/p2\n", server.uri())).await;

        let calls = Arc::new(AtomicUsize::new(0));
        let calls_in_cb = calls.clone();
        let progress: ProgressCallback = Box::new(move |done, total, _url| {
            assert!(done <= total);
            calls_in_cb.fetch_add(1, Ordering::Relaxed);
        });

        let report = pipeline.run(job, Some(progress)).await;
        assert_eq!(report.targets.len(), 2);
        assert_eq!(calls.load(Ordering::Relaxed), 2);
    }
}
