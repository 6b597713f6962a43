//! In-process job queue: an unbounded channel drained by a small pool of
//! named worker threads. Stands in for an external task queue at the
//! same contract (submit an id, poll the job row for the outcome).

use std::sync::Arc;
use std::thread;

use anyhow::Context as _;
use crossbeam::channel::{self, Receiver, Sender};

use crate::foundation::error::AdreelResult;
use crate::jobs::orchestrator::{PipelineContext, execute_job};

pub struct JobQueue {
    queue: Sender<String>,
    workers: Vec<thread::JoinHandle<()>>,
}

impl JobQueue {
    /// Spawn `workers` threads draining submitted job ids.
    pub fn start(ctx: Arc<PipelineContext>, workers: usize) -> AdreelResult<Self> {
        let (tx, rx) = channel::unbounded::<String>();
        let mut handles = Vec::new();
        for n in 0..workers.max(1) {
            let rx = rx.clone();
            let ctx = Arc::clone(&ctx);
            let handle = thread::Builder::new()
                .name(format!("adreel-worker-{n}"))
                .spawn(move || worker_loop(&ctx, &rx))
                .context("failed to spawn pipeline worker thread")?;
            handles.push(handle);
        }
        Ok(Self {
            queue: tx,
            workers: handles,
        })
    }

    /// Hand a job id to the pool. Returns as soon as it is queued.
    pub fn submit(&self, job_id: &str) -> AdreelResult<()> {
        self.queue
            .send(job_id.to_string())
            .map_err(|err| anyhow::anyhow!("failed to enqueue job: {err}"))?;
        Ok(())
    }

    /// Close the queue and wait for in-flight jobs to finish.
    pub fn shutdown(self) {
        drop(self.queue);
        for handle in self.workers {
            let _ = handle.join();
        }
    }
}

fn worker_loop(ctx: &PipelineContext, rx: &Receiver<String>) {
    while let Ok(job_id) = rx.recv() {
        tracing::debug!(%job_id, "worker picked up job");
        if let Err(err) = execute_job(ctx, &job_id) {
            // Already recorded on the job row; log for the operator.
            tracing::error!(%job_id, error = %err, "job finished with error");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;
    use std::time::{Duration, Instant};

    use crate::foundation::config::PipelineConfig;
    use crate::foundation::error::AdreelError;
    use crate::render::engine::{MediaEngine, MediaInfo};
    use crate::render::graph::RenderProgram;
    use crate::store::json::ProjectStore;
    use crate::store::model::JobStatus;

    struct NullEngine;

    impl MediaEngine for NullEngine {
        fn probe(&self, _path: &Path) -> AdreelResult<MediaInfo> {
            Err(AdreelError::probe("no media in tests"))
        }

        fn normalize(
            &self,
            _src: &Path,
            _dst: &Path,
            _config: &PipelineConfig,
        ) -> AdreelResult<()> {
            Err(AdreelError::render("no media in tests"))
        }

        fn render(&self, _program: &RenderProgram) -> AdreelResult<()> {
            Err(AdreelError::render("no media in tests"))
        }
    }

    fn context(dir: &tempfile::TempDir) -> Arc<PipelineContext> {
        let config = PipelineConfig::default().with_media_root(dir.path());
        let store = ProjectStore::open(&config.store_path()).unwrap();
        Arc::new(PipelineContext {
            config,
            store: Arc::new(store),
            engine: Arc::new(NullEngine),
        })
    }

    #[test]
    fn unknown_job_ids_do_not_kill_workers() {
        let dir = tempfile::tempdir().unwrap();
        let queue = JobQueue::start(context(&dir), 2).unwrap();
        queue.submit("no-such-job").unwrap();
        queue.shutdown();
    }

    #[test]
    fn submitted_jobs_reach_a_terminal_state() {
        let dir = tempfile::tempdir().unwrap();
        let ctx = context(&dir);
        let project = ctx
            .store
            .create_project("Demo", "", "hook_benefit_cta_v1", "#00A86B")
            .unwrap();
        // No source video uploaded, so the job fails fast.
        let job = crate::jobs::orchestrator::submit_generate(&ctx, &project.id).unwrap();

        let queue = JobQueue::start(Arc::clone(&ctx), 1).unwrap();
        queue.submit(&job.id).unwrap();

        let deadline = Instant::now() + Duration::from_secs(5);
        loop {
            let current = ctx.store.job(&job.id).unwrap();
            if current.is_terminal() {
                assert_eq!(current.status, JobStatus::Failed);
                assert!(current.error.contains("no source video"));
                break;
            }
            assert!(Instant::now() < deadline, "job never reached terminal state");
            thread::sleep(Duration::from_millis(20));
        }
        queue.shutdown();
    }
}
