//! Single-file JSON persistence for projects and everything hanging off
//! them. One mutex guards the whole state; every mutation is
//! load-mutate-save under that lock, so version counters stay dense and
//! writers never interleave.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use anyhow::Context as _;
use serde::{Deserialize, Serialize};

use crate::foundation::config::ensure_parent_dir;
use crate::foundation::error::{AdreelError, AdreelResult};
use crate::plan::context::VideoContextData;
use crate::plan::planner::EditPlan;
use crate::store::model::{
    ArtifactStatus, Asset, AssetKind, Draft, DraftVersion, EditPlanArtifact, ExportArtifact, Job,
    JobKind, JobStatus, Project, ProjectStatus, VideoContext,
};
use crate::timeline::diff::diff_overlays;
use crate::timeline::model::Timeline;
use crate::timeline::quality::QualityReport;

#[derive(Debug, Default, Serialize, Deserialize)]
struct StoreState {
    #[serde(default)]
    projects: Vec<Project>,
    #[serde(default)]
    assets: Vec<Asset>,
    #[serde(default)]
    drafts: Vec<Draft>,
    #[serde(default)]
    versions: Vec<DraftVersion>,
    #[serde(default)]
    contexts: Vec<VideoContext>,
    #[serde(default)]
    plans: Vec<EditPlanArtifact>,
    #[serde(default)]
    exports: Vec<ExportArtifact>,
    #[serde(default)]
    jobs: Vec<Job>,
}

/// Store handle. Cheap to share behind an `Arc`; all methods take
/// `&self`.
pub struct ProjectStore {
    path: PathBuf,
    state: Mutex<StoreState>,
}

impl ProjectStore {
    /// Open (or create) the store file at `path`.
    pub fn open(path: &Path) -> AdreelResult<Self> {
        let state = if path.exists() {
            let raw = std::fs::read(path)
                .with_context(|| format!("failed to read store file '{}'", path.display()))?;
            serde_json::from_slice(&raw).map_err(|e| {
                AdreelError::serde(format!("store file '{}' is corrupt: {e}", path.display()))
            })?
        } else {
            StoreState::default()
        };
        Ok(Self {
            path: path.to_path_buf(),
            state: Mutex::new(state),
        })
    }

    fn lock(&self) -> MutexGuard<'_, StoreState> {
        // A panicked writer leaves the state as its last completed
        // mutation; recover rather than wedging every caller.
        self.state.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn save(&self, state: &StoreState) -> AdreelResult<()> {
        ensure_parent_dir(&self.path)?;
        let json = serde_json::to_vec_pretty(state)
            .map_err(|e| AdreelError::serde(format!("store serialization failed: {e}")))?;
        std::fs::write(&self.path, json)
            .with_context(|| format!("failed to write store file '{}'", self.path.display()))?;
        Ok(())
    }

    fn mutate<T>(&self, f: impl FnOnce(&mut StoreState) -> AdreelResult<T>) -> AdreelResult<T> {
        let mut state = self.lock();
        let out = f(&mut state)?;
        self.save(&state)?;
        Ok(out)
    }

    fn read<T>(&self, f: impl FnOnce(&StoreState) -> T) -> T {
        f(&self.lock())
    }

    // ---- projects ----

    pub fn create_project(
        &self,
        name: &str,
        prompt: &str,
        template_id: &str,
        primary_color: &str,
    ) -> AdreelResult<Project> {
        let project = Project::new(name, prompt, template_id, primary_color);
        self.mutate(|state| {
            state.projects.push(project.clone());
            Ok(project.clone())
        })
    }

    pub fn project(&self, id: &str) -> AdreelResult<Project> {
        self.read(|state| state.projects.iter().find(|p| p.id == id).cloned())
            .ok_or_else(|| AdreelError::not_found(format!("project {id}")))
    }

    pub fn projects(&self) -> Vec<Project> {
        self.read(|state| state.projects.clone())
    }

    pub fn set_project_status(&self, id: &str, status: ProjectStatus) -> AdreelResult<()> {
        self.mutate(|state| {
            let project = state
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| AdreelError::not_found(format!("project {id}")))?;
            project.status = status;
            project.updated_at = chrono::Utc::now();
            Ok(())
        })
    }

    pub fn set_project_prompt(&self, id: &str, prompt: &str) -> AdreelResult<()> {
        self.mutate(|state| {
            let project = state
                .projects
                .iter_mut()
                .find(|p| p.id == id)
                .ok_or_else(|| AdreelError::not_found(format!("project {id}")))?;
            project.prompt = prompt.to_string();
            project.updated_at = chrono::Utc::now();
            Ok(())
        })
    }

    // ---- assets ----

    pub fn add_asset(&self, asset: Asset) -> AdreelResult<Asset> {
        self.mutate(|state| {
            if !state.projects.iter().any(|p| p.id == asset.project_id) {
                return Err(AdreelError::not_found(format!(
                    "project {}",
                    asset.project_id
                )));
            }
            state.assets.push(asset.clone());
            Ok(asset)
        })
    }

    pub fn asset(&self, id: &str) -> AdreelResult<Asset> {
        self.read(|state| state.assets.iter().find(|a| a.id == id).cloned())
            .ok_or_else(|| AdreelError::not_found(format!("asset {id}")))
    }

    /// Most recently added asset of a kind, if any.
    pub fn latest_asset(&self, project_id: &str, kind: AssetKind) -> Option<Asset> {
        self.read(|state| {
            state
                .assets
                .iter()
                .rev()
                .find(|a| a.project_id == project_id && a.kind == kind)
                .cloned()
        })
    }

    pub fn assets_for(&self, project_id: &str) -> Vec<Asset> {
        self.read(|state| {
            state
                .assets
                .iter()
                .filter(|a| a.project_id == project_id)
                .cloned()
                .collect()
        })
    }

    // ---- drafts ----

    /// The project's draft, creating a pending one on first use.
    pub fn ensure_draft(&self, project_id: &str) -> AdreelResult<Draft> {
        self.mutate(|state| {
            if !state.projects.iter().any(|p| p.id == project_id) {
                return Err(AdreelError::not_found(format!("project {project_id}")));
            }
            if let Some(existing) = state.drafts.iter().find(|d| d.project_id == project_id) {
                return Ok(existing.clone());
            }
            let draft = Draft::new(project_id);
            state.drafts.push(draft.clone());
            Ok(draft)
        })
    }

    pub fn draft(&self, id: &str) -> AdreelResult<Draft> {
        self.read(|state| state.drafts.iter().find(|d| d.id == id).cloned())
            .ok_or_else(|| AdreelError::not_found(format!("draft {id}")))
    }

    pub fn draft_for_project(&self, project_id: &str) -> Option<Draft> {
        self.read(|state| {
            state
                .drafts
                .iter()
                .find(|d| d.project_id == project_id)
                .cloned()
        })
    }

    /// Replace the stored draft with `draft`. Last writer wins.
    pub fn put_draft(&self, draft: &Draft) -> AdreelResult<Draft> {
        let mut draft = draft.clone();
        draft.updated_at = chrono::Utc::now();
        self.mutate(|state| {
            let slot = state
                .drafts
                .iter_mut()
                .find(|d| d.id == draft.id)
                .ok_or_else(|| AdreelError::not_found(format!("draft {}", draft.id)))?;
            *slot = draft.clone();
            Ok(draft)
        })
    }

    // ---- draft versions ----

    /// Append the next version for a draft: diffs against the latest
    /// stored timeline and allocates the counter in the same critical
    /// section.
    pub fn append_version(
        &self,
        draft_id: &str,
        source: &str,
        timeline: &Timeline,
        video: Option<&Path>,
    ) -> AdreelResult<DraftVersion> {
        self.mutate(|state| {
            let latest = state
                .versions
                .iter()
                .filter(|v| v.draft_id == draft_id)
                .max_by_key(|v| v.version);
            let previous_overlays = latest.map(|v| v.timeline.overlays.as_slice()).unwrap_or(&[]);
            let record = DraftVersion {
                id: uuid::Uuid::new_v4().to_string(),
                draft_id: draft_id.to_string(),
                version: latest.map(|v| v.version + 1).unwrap_or(1),
                source: source.to_string(),
                timeline: timeline.clone(),
                diff: diff_overlays(previous_overlays, &timeline.overlays),
                video: video.map(Path::to_path_buf),
                created_at: chrono::Utc::now(),
            };
            state.versions.push(record.clone());
            Ok(record)
        })
    }

    pub fn latest_version(&self, draft_id: &str) -> Option<DraftVersion> {
        self.read(|state| {
            state
                .versions
                .iter()
                .filter(|v| v.draft_id == draft_id)
                .max_by_key(|v| v.version)
                .cloned()
        })
    }

    /// All versions for a draft, newest first.
    pub fn versions(&self, draft_id: &str) -> Vec<DraftVersion> {
        self.read(|state| {
            let mut out: Vec<DraftVersion> = state
                .versions
                .iter()
                .filter(|v| v.draft_id == draft_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.version.cmp(&a.version));
            out
        })
    }

    // ---- video context ----

    /// Create or replace the project's context snapshot.
    pub fn upsert_context(
        &self,
        project_id: &str,
        context: VideoContextData,
    ) -> AdreelResult<VideoContext> {
        self.mutate(|state| {
            if let Some(row) = state
                .contexts
                .iter_mut()
                .find(|c| c.project_id == project_id)
            {
                row.status = ArtifactStatus::Ready;
                row.context = context;
                row.error = String::new();
                row.updated_at = chrono::Utc::now();
                return Ok(row.clone());
            }
            let row = VideoContext {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: project_id.to_string(),
                status: ArtifactStatus::Ready,
                context,
                error: String::new(),
                updated_at: chrono::Utc::now(),
            };
            state.contexts.push(row.clone());
            Ok(row)
        })
    }

    pub fn context_for(&self, project_id: &str) -> Option<VideoContext> {
        self.read(|state| {
            state
                .contexts
                .iter()
                .find(|c| c.project_id == project_id)
                .cloned()
        })
    }

    // ---- edit plans ----

    pub fn append_plan(
        &self,
        project_id: &str,
        source: &str,
        plan: EditPlan,
        quality_report: QualityReport,
    ) -> AdreelResult<EditPlanArtifact> {
        self.mutate(|state| {
            let next_version = state
                .plans
                .iter()
                .filter(|p| p.project_id == project_id)
                .map(|p| p.version)
                .max()
                .map(|v| v + 1)
                .unwrap_or(1);
            let row = EditPlanArtifact {
                id: uuid::Uuid::new_v4().to_string(),
                project_id: project_id.to_string(),
                version: next_version,
                source: source.to_string(),
                status: ArtifactStatus::Ready,
                plan,
                quality_report,
                error: String::new(),
                created_at: chrono::Utc::now(),
            };
            state.plans.push(row.clone());
            Ok(row)
        })
    }

    /// All plans for a project, newest first.
    pub fn plans(&self, project_id: &str) -> Vec<EditPlanArtifact> {
        self.read(|state| {
            let mut out: Vec<EditPlanArtifact> = state
                .plans
                .iter()
                .filter(|p| p.project_id == project_id)
                .cloned()
                .collect();
            out.sort_by(|a, b| b.version.cmp(&a.version));
            out
        })
    }

    // ---- exports ----

    pub fn add_export(&self, export: ExportArtifact) -> AdreelResult<ExportArtifact> {
        self.mutate(|state| {
            state.exports.push(export.clone());
            Ok(export)
        })
    }

    pub fn exports(&self, project_id: &str) -> Vec<ExportArtifact> {
        self.read(|state| {
            state
                .exports
                .iter()
                .filter(|e| e.project_id == project_id)
                .cloned()
                .collect()
        })
    }

    // ---- jobs ----

    pub fn create_job(
        &self,
        project_id: &str,
        kind: JobKind,
        payload: serde_json::Value,
    ) -> AdreelResult<Job> {
        let job = Job::new(project_id, kind, payload);
        self.mutate(|state| {
            state.jobs.push(job.clone());
            Ok(job.clone())
        })
    }

    pub fn job(&self, id: &str) -> AdreelResult<Job> {
        self.read(|state| state.jobs.iter().find(|j| j.id == id).cloned())
            .ok_or_else(|| AdreelError::not_found(format!("job {id}")))
    }

    pub fn mark_job_running(&self, id: &str) -> AdreelResult<()> {
        self.update_job(id, |job| {
            job.status = JobStatus::Running;
            job.started_at = Some(chrono::Utc::now());
        })
    }

    pub fn mark_job_success(&self, id: &str, result: serde_json::Value) -> AdreelResult<()> {
        self.update_job(id, |job| {
            job.status = JobStatus::Success;
            job.result = Some(result);
            job.error = String::new();
            job.finished_at = Some(chrono::Utc::now());
        })
    }

    pub fn mark_job_failed(&self, id: &str, error: &str) -> AdreelResult<()> {
        let error = error.to_string();
        self.update_job(id, move |job| {
            job.status = JobStatus::Failed;
            job.error = error;
            job.finished_at = Some(chrono::Utc::now());
        })
    }

    fn update_job(&self, id: &str, f: impl FnOnce(&mut Job)) -> AdreelResult<()> {
        self.mutate(|state| {
            let job = state
                .jobs
                .iter_mut()
                .find(|j| j.id == id)
                .ok_or_else(|| AdreelError::not_found(format!("job {id}")))?;
            f(job);
            Ok(())
        })
    }
}
