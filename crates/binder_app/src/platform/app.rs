use std::collections::BTreeMap;

use anyhow::Context;
use binder_engine::{ensure_output_dir, BindSummary, EngineEvent, EngineHandle, JobFailure, JobId};
use binder_logging::{binder_debug, binder_info, binder_warn};

use super::config::AppConfig;
use super::logging::{self, LogOptions};
use crate::cli::Cli;

/// Outcome of one run over all requested series.
#[derive(Debug, Default)]
pub struct RunReport {
    pub succeeded: Vec<BindSummary>,
    pub failed: Vec<(String, JobFailure)>,
}

impl RunReport {
    pub fn all_succeeded(&self) -> bool {
        self.failed.is_empty()
    }
}

pub fn run(cli: Cli) -> anyhow::Result<RunReport> {
    logging::initialize(LogOptions::from_cli(&cli));

    let app_config = match &cli.config {
        Some(path) => AppConfig::load(path)?,
        None => AppConfig::default(),
    };
    let config = app_config.into_engine_config(cli.output.clone());
    ensure_output_dir(&config.output_dir)
        .with_context(|| format!("output directory {}", config.output_dir.display()))?;

    let urls = cli.unique_urls();
    let engine = EngineHandle::new(config);
    let mut pending: BTreeMap<JobId, String> = BTreeMap::new();
    for (index, url) in urls.into_iter().enumerate() {
        let job_id = index as JobId + 1;
        binder_info!("queueing job {}: {}", job_id, url);
        engine.enqueue(job_id, url.clone());
        pending.insert(job_id, url);
    }

    let mut report = RunReport::default();
    while !pending.is_empty() {
        let Some(event) = engine.recv() else {
            anyhow::bail!("engine stopped with {} series unfinished", pending.len());
        };
        match event {
            EngineEvent::Progress(progress) => {
                binder_debug!(
                    "job {}: {} {:?}/{:?}",
                    progress.job_id,
                    progress.stage,
                    progress.chapters_done,
                    progress.chapters_total
                );
            }
            EngineEvent::ChapterSkipped {
                job_id,
                sequence,
                title,
                reason,
            } => {
                binder_debug!("job {}: chapter {} {:?} skipped: {:?}", job_id, sequence, title, reason);
            }
            EngineEvent::ImageFailed {
                job_id,
                sequence,
                reference,
                message,
            } => {
                binder_debug!(
                    "job {}: chapter {} image {} failed: {}",
                    job_id,
                    sequence,
                    reference,
                    message
                );
            }
            EngineEvent::JobCompleted { job_id, result } => {
                let url = pending.remove(&job_id).unwrap_or_default();
                match result {
                    Ok(summary) => {
                        println!(
                            "{} -> {} ({} chapters, {} skipped, {} images failed)",
                            url,
                            summary.output_path.display(),
                            summary.accepted,
                            summary.skipped.len(),
                            summary.failed_images
                        );
                        report.succeeded.push(summary);
                    }
                    Err(failure) => {
                        binder_warn!("{} failed: {}", url, failure);
                        eprintln!("{url}: {failure}");
                        report.failed.push((url, failure));
                    }
                }
            }
        }
    }

    binder_info!(
        "done: {} bound, {} failed",
        report.succeeded.len(),
        report.failed.len()
    );
    Ok(report)
}
