use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::plan::context::VideoContextData;
use crate::plan::planner::EditPlan;
use crate::timeline::diff::OverlayDiff;
use crate::timeline::model::Timeline;
use crate::timeline::quality::QualityReport;

fn new_id() -> String {
    uuid::Uuid::new_v4().to_string()
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProjectStatus {
    Created,
    DraftReady,
    Exported,
    Failed,
}

/// One ad project: a source video, a prompt, and the draft/export trail
/// hanging off them.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Project {
    pub id: String,
    pub name: String,
    pub prompt: String,
    pub template_id: String,
    pub primary_color: String,
    pub status: ProjectStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    pub fn new(name: &str, prompt: &str, template_id: &str, primary_color: &str) -> Self {
        let now = Utc::now();
        Self {
            id: new_id(),
            name: name.to_string(),
            prompt: prompt.to_string(),
            template_id: template_id.to_string(),
            primary_color: primary_color.to_string(),
            status: ProjectStatus::Created,
            created_at: now,
            updated_at: now,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetKind {
    SourceVideo,
    Logo,
    Font,
}

/// An uploaded file belonging to a project.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Asset {
    pub id: String,
    pub project_id: String,
    pub kind: AssetKind,
    pub file: PathBuf,
    /// Probe metadata captured at upload time, if any.
    #[serde(default)]
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl Asset {
    pub fn new(project_id: &str, kind: AssetKind, file: PathBuf) -> Self {
        Self {
            id: new_id(),
            project_id: project_id.to_string(),
            kind,
            file,
            metadata: serde_json::Value::Null,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DraftStatus {
    Pending,
    Ready,
    Failed,
}

/// One-per-project working render. Replaced wholesale by every
/// successful render; history lives in [`DraftVersion`] rows.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Draft {
    pub id: String,
    pub project_id: String,
    pub status: DraftStatus,
    #[serde(default)]
    pub timeline: Option<Timeline>,
    /// Gates export; toggled independently of renders.
    pub approved: bool,
    #[serde(default)]
    pub video: Option<PathBuf>,
    #[serde(default)]
    pub error: String,
    pub updated_at: DateTime<Utc>,
}

impl Draft {
    pub fn new(project_id: &str) -> Self {
        Self {
            id: new_id(),
            project_id: project_id.to_string(),
            status: DraftStatus::Pending,
            timeline: None,
            approved: false,
            video: None,
            error: String::new(),
            updated_at: Utc::now(),
        }
    }
}

/// Append-only snapshot of a draft render, carrying the timeline as it
/// was at that point plus its diff against the predecessor version.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DraftVersion {
    pub id: String,
    pub draft_id: String,
    /// Dense counter per draft, allocated under the store lock.
    pub version: u32,
    /// What produced this version (initial_generate, prompt_edit, manual_patch).
    pub source: String,
    pub timeline: Timeline,
    pub diff: OverlayDiff,
    #[serde(default)]
    pub video: Option<PathBuf>,
    pub created_at: DateTime<Utc>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ArtifactStatus {
    Ready,
    Failed,
}

/// One-per-project video analysis snapshot feeding the edit planner.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct VideoContext {
    pub id: String,
    pub project_id: String,
    pub status: ArtifactStatus,
    pub context: VideoContextData,
    #[serde(default)]
    pub error: String,
    pub updated_at: DateTime<Utc>,
}

/// Append-only audit record of an automated layout decision.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EditPlanArtifact {
    pub id: String,
    pub project_id: String,
    /// Dense counter per project, allocated under the store lock.
    pub version: u32,
    pub source: String,
    pub status: ArtifactStatus,
    pub plan: EditPlan,
    pub quality_report: QualityReport,
    #[serde(default)]
    pub error: String,
    pub created_at: DateTime<Utc>,
}

/// An exported, approved render plus its timeline snapshot.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ExportArtifact {
    pub id: String,
    pub project_id: String,
    pub draft_id: String,
    pub file: PathBuf,
    pub metadata: serde_json::Value,
    pub created_at: DateTime<Utc>,
}

impl ExportArtifact {
    pub fn new(
        project_id: &str,
        draft_id: &str,
        file: PathBuf,
        metadata: serde_json::Value,
    ) -> Self {
        Self {
            id: new_id(),
            project_id: project_id.to_string(),
            draft_id: draft_id.to_string(),
            file,
            metadata,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobKind {
    GenerateDraft,
    ExportFinal,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Success,
    Failed,
}

/// One asynchronous unit of work. Mutated only by the worker executing
/// it; terminal once success or failed.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Job {
    pub id: String,
    pub project_id: String,
    pub kind: JobKind,
    pub status: JobStatus,
    #[serde(default)]
    pub payload: serde_json::Value,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
    #[serde(default)]
    pub error: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub started_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub finished_at: Option<DateTime<Utc>>,
}

impl Job {
    pub fn new(project_id: &str, kind: JobKind, payload: serde_json::Value) -> Self {
        Self {
            id: new_id(),
            project_id: project_id.to_string(),
            kind,
            status: JobStatus::Pending,
            payload,
            result: None,
            error: String::new(),
            created_at: Utc::now(),
            started_at: None,
            finished_at: None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self.status, JobStatus::Success | JobStatus::Failed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_serialize_snake_case() {
        assert_eq!(
            serde_json::to_value(ProjectStatus::DraftReady).unwrap(),
            serde_json::json!("draft_ready")
        );
        assert_eq!(
            serde_json::to_value(AssetKind::SourceVideo).unwrap(),
            serde_json::json!("source_video")
        );
        assert_eq!(
            serde_json::to_value(JobKind::GenerateDraft).unwrap(),
            serde_json::json!("generate_draft")
        );
    }

    #[test]
    fn new_project_starts_created() {
        let project = Project::new("Demo", "promote it", "hook_benefit_cta_v1", "#00A86B");
        assert_eq!(project.status, ProjectStatus::Created);
        assert!(!project.id.is_empty());
    }

    #[test]
    fn job_terminal_states() {
        let mut job = Job::new("p1", JobKind::ExportFinal, serde_json::Value::Null);
        assert!(!job.is_terminal());
        job.status = JobStatus::Running;
        assert!(!job.is_terminal());
        job.status = JobStatus::Failed;
        assert!(job.is_terminal());
    }
}
