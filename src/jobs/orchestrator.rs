//! End-to-end pipeline flows. Draft generation and export run as queued
//! jobs with status bookkeeping on the job, draft, and project rows; the
//! edit, patch, and approve paths run synchronously in the caller.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;

use crate::creative::editor::apply_instruction;
use crate::creative::provider::select_provider;
use crate::foundation::config::{
    PipelineConfig, ensure_parent_dir, short_stem, versioned_media_name,
};
use crate::foundation::error::{AdreelError, AdreelResult};
use crate::plan::context::build_video_context;
use crate::plan::planner::build_edit_plan;
use crate::render::engine::MediaEngine;
use crate::render::graph::compile_render_program;
use crate::store::json::ProjectStore;
use crate::store::model::{
    Asset, AssetKind, Draft, DraftStatus, ExportArtifact, Job, JobKind, Project, ProjectStatus,
};
use crate::timeline::builder::build_timeline;
use crate::timeline::model::{Overlay, Timeline, VideoMeta};
use crate::timeline::quality::{QualityReport, validate_overlays};

/// Everything a worker needs to run a job.
pub struct PipelineContext {
    pub config: PipelineConfig,
    pub store: Arc<ProjectStore>,
    pub engine: Arc<dyn MediaEngine>,
}

const RETRY_BACKOFF: Duration = Duration::from_millis(500);

/// Look up a job and run it to a terminal state.
///
/// Draft generation is retried once, after a short backoff, when the
/// failure is a subprocess-class error; export is never retried.
pub fn execute_job(ctx: &PipelineContext, job_id: &str) -> AdreelResult<()> {
    let job = ctx.store.job(job_id)?;
    let first = run_job(ctx, &job);
    match first {
        Err(err) if job.kind == JobKind::GenerateDraft && err.is_retryable() => {
            tracing::warn!(%job_id, error = %err, "retrying generate after subprocess failure");
            std::thread::sleep(RETRY_BACKOFF);
            run_job(ctx, &job)
        }
        other => other,
    }
}

fn run_job(ctx: &PipelineContext, job: &Job) -> AdreelResult<()> {
    match job.kind {
        JobKind::GenerateDraft => run_generate_draft(ctx, job),
        JobKind::ExportFinal => run_export_final(ctx, job),
    }
}

fn run_generate_draft(ctx: &PipelineContext, job: &Job) -> AdreelResult<()> {
    ctx.store.mark_job_running(&job.id)?;
    match generate_draft(ctx, &job.project_id) {
        Ok(draft) => {
            let video = draft
                .video
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_default();
            ctx.store.mark_job_success(
                &job.id,
                serde_json::json!({"draft_id": draft.id, "draft_video": video}),
            )?;
            Ok(())
        }
        Err(err) => {
            record_generate_failure(ctx, &job.project_id, &err);
            ctx.store.mark_job_failed(&job.id, &err.to_string())?;
            Err(err)
        }
    }
}

/// A failed generate poisons the draft and the project, not just the job.
fn record_generate_failure(ctx: &PipelineContext, project_id: &str, err: &AdreelError) {
    let message = err.to_string();
    let marked = ctx.store.ensure_draft(project_id).and_then(|mut draft| {
        draft.status = DraftStatus::Failed;
        draft.error = message;
        ctx.store.put_draft(&draft)
    });
    if let Err(store_err) = marked {
        tracing::error!(project_id, error = %store_err, "could not record draft failure");
    }
    if let Err(store_err) = ctx.store.set_project_status(project_id, ProjectStatus::Failed) {
        tracing::error!(project_id, error = %store_err, "could not record project failure");
    }
}

#[tracing::instrument(skip(ctx))]
fn generate_draft(ctx: &PipelineContext, project_id: &str) -> AdreelResult<Draft> {
    let project = ctx.store.project(project_id)?;
    let source = ctx
        .store
        .latest_asset(project_id, AssetKind::SourceVideo)
        .ok_or_else(|| AdreelError::not_found("Project has no source video uploaded"))?;

    let normalized = ctx.config.normalized_path(project_id);
    if !normalized.exists() {
        ctx.engine.normalize(&source.file, &normalized, &ctx.config)?;
    }
    let info = ctx.engine.probe(&normalized)?;
    if info.duration_sec > ctx.config.max_duration_secs {
        return Err(AdreelError::validation(format!(
            "Input too long: {:.2}s",
            info.duration_sec
        )));
    }

    let provider = select_provider(&ctx.config.provider);
    let brief = provider.creative_brief(&project.prompt);
    let copy = provider.generate_copy(&brief)?;

    let logo = ctx.store.latest_asset(project_id, AssetKind::Logo);
    let meta = VideoMeta {
        duration_sec: info.duration_sec,
        width: ctx.config.target_width,
        height: ctx.config.target_height,
        fps: ctx.config.target_fps,
    };
    let timeline = build_timeline(&project, logo.as_ref(), meta, &copy, provider.name());
    let report = quality_gate(&timeline)?;

    let mut draft = ctx.store.ensure_draft(project_id)?;
    draft.timeline = Some(timeline.clone());
    draft.status = DraftStatus::Pending;
    draft.error = String::new();
    let draft = ctx.store.put_draft(&draft)?;

    let context = build_video_context(&project, &info);
    ctx.store.upsert_context(project_id, context.clone())?;
    let plan = build_edit_plan(&project, &context, &timeline, "initial_generate");
    ctx.store
        .append_plan(project_id, "initial_generate", plan, report)?;

    let video = render_timeline(ctx, &project, &normalized, &timeline)?;

    let mut draft = ctx.store.draft(&draft.id)?;
    draft.status = DraftStatus::Ready;
    draft.video = Some(video.clone());
    draft.error = String::new();
    let draft = ctx.store.put_draft(&draft)?;

    ctx.store
        .append_version(&draft.id, "initial_generate", &timeline, Some(&video))?;
    ctx.store
        .set_project_status(project_id, ProjectStatus::DraftReady)?;
    tracing::info!(project_id, draft_id = %draft.id, "draft generated");
    Ok(draft)
}

fn run_export_final(ctx: &PipelineContext, job: &Job) -> AdreelResult<()> {
    ctx.store.mark_job_running(&job.id)?;
    match export_final(ctx, &job.project_id) {
        Ok(artifact) => {
            ctx.store.mark_job_success(
                &job.id,
                serde_json::json!({
                    "export_id": artifact.id,
                    "file": artifact.file.display().to_string(),
                }),
            )?;
            Ok(())
        }
        // Export failures touch only the job row.
        Err(err) => {
            ctx.store.mark_job_failed(&job.id, &err.to_string())?;
            Err(err)
        }
    }
}

#[tracing::instrument(skip(ctx))]
fn export_final(ctx: &PipelineContext, project_id: &str) -> AdreelResult<ExportArtifact> {
    ctx.store.project(project_id)?;
    let draft = ctx
        .store
        .draft_for_project(project_id)
        .ok_or_else(|| AdreelError::not_found(format!("draft for project {project_id}")))?;
    if !draft.approved {
        return Err(AdreelError::validation("Draft must be approved before export"));
    }
    let Some(video) = draft.video.as_ref() else {
        return Err(AdreelError::validation("Draft video missing"));
    };

    let dest = ctx
        .config
        .exports_dir()
        .join(versioned_media_name(project_id, &short_stem()));
    ensure_parent_dir(&dest)?;
    // Export mirrors the draft byte-for-byte; hook for future final
    // rendering differences.
    std::fs::copy(video, &dest)
        .with_context(|| format!("failed to copy draft video to '{}'", dest.display()))?;

    let timeline_value = match &draft.timeline {
        Some(timeline) => serde_json::to_value(timeline)
            .map_err(|e| AdreelError::serde(format!("timeline snapshot failed: {e}")))?,
        None => serde_json::Value::Null,
    };
    let artifact = ctx.store.add_export(ExportArtifact::new(
        project_id,
        &draft.id,
        dest,
        serde_json::json!({"timeline": timeline_value}),
    ))?;
    ctx.store
        .set_project_status(project_id, ProjectStatus::Exported)?;
    tracing::info!(project_id, export_id = %artifact.id, "draft exported");
    Ok(artifact)
}

// ---- synchronous edit paths ----

/// Apply a natural-language instruction to the draft's overlays, then
/// re-validate, re-render, and record the new version.
#[tracing::instrument(skip(ctx))]
pub fn edit_draft_with_prompt(
    ctx: &PipelineContext,
    project_id: &str,
    instruction: &str,
) -> AdreelResult<Draft> {
    let project = ctx.store.project(project_id)?;
    let draft = ctx
        .store
        .draft_for_project(project_id)
        .ok_or_else(|| AdreelError::not_found(format!("draft for project {project_id}")))?;
    let mut timeline = draft
        .timeline
        .ok_or_else(|| AdreelError::validation("Draft has no timeline to edit"))?;

    let edited = apply_instruction(&timeline.overlays, instruction, &ctx.config.provider)?;
    timeline.overlays = edited;
    let report = quality_gate(&timeline)?;

    if let Some(context) = ctx.store.context_for(project_id) {
        let plan = build_edit_plan(&project, &context.context, &timeline, "prompt_edit");
        ctx.store
            .append_plan(project_id, "prompt_edit", plan, report)?;
    }
    rerender_draft(ctx, project_id, &timeline, "prompt_edit")
}

/// Replace the draft's overlay list wholesale from caller-supplied JSON.
///
/// Unlike model-driven edits, rows are never repaired or dropped: the
/// first malformed row rejects the whole patch and the draft keeps its
/// current timeline. Absent `text` and `style` default; `position` must
/// be a complete object.
#[tracing::instrument(skip(ctx, overlays))]
pub fn patch_draft_overlays(
    ctx: &PipelineContext,
    project_id: &str,
    overlays: Vec<serde_json::Value>,
) -> AdreelResult<Draft> {
    let draft = ctx
        .store
        .draft_for_project(project_id)
        .ok_or_else(|| AdreelError::not_found(format!("draft for project {project_id}")))?;
    let mut timeline = draft
        .timeline
        .ok_or_else(|| AdreelError::validation("Draft has no timeline to patch"))?;

    timeline.overlays = parse_patch_rows(overlays)?;
    quality_gate(&timeline)?;
    rerender_draft(ctx, project_id, &timeline, "manual_patch")
}

/// Deserialize manually supplied overlay rows, failing the whole list on
/// the first row that does not parse.
fn parse_patch_rows(rows: Vec<serde_json::Value>) -> AdreelResult<Vec<Overlay>> {
    rows.into_iter()
        .enumerate()
        .map(|(idx, row)| {
            serde_json::from_value(row)
                .map_err(|err| AdreelError::validation(format!("overlay[{idx}]: {err}")))
        })
        .collect()
}

/// Toggle the export gate on the project's draft.
pub fn approve_draft(ctx: &PipelineContext, project_id: &str, approved: bool) -> AdreelResult<Draft> {
    let mut draft = ctx
        .store
        .draft_for_project(project_id)
        .ok_or_else(|| AdreelError::not_found(format!("draft for project {project_id}")))?;
    draft.approved = approved;
    ctx.store.put_draft(&draft)
}

/// Re-render a draft from an updated timeline and append its version row.
/// Reuses the normalized cache file when present.
#[tracing::instrument(skip(ctx, timeline))]
pub fn rerender_draft(
    ctx: &PipelineContext,
    project_id: &str,
    timeline: &Timeline,
    source: &str,
) -> AdreelResult<Draft> {
    let project = ctx.store.project(project_id)?;
    let source_asset = ctx
        .store
        .latest_asset(project_id, AssetKind::SourceVideo)
        .ok_or_else(|| AdreelError::not_found("Project has no source video uploaded"))?;

    let normalized = ctx.config.normalized_path(project_id);
    if !normalized.exists() {
        ctx.engine
            .normalize(&source_asset.file, &normalized, &ctx.config)?;
    }
    let video = render_timeline(ctx, &project, &normalized, timeline)?;

    let mut draft = ctx.store.ensure_draft(project_id)?;
    draft.timeline = Some(timeline.clone());
    draft.video = Some(video.clone());
    draft.status = DraftStatus::Ready;
    draft.error = String::new();
    let draft = ctx.store.put_draft(&draft)?;
    ctx.store
        .append_version(&draft.id, source, timeline, Some(&video))?;
    Ok(draft)
}

fn render_timeline(
    ctx: &PipelineContext,
    project: &Project,
    normalized: &Path,
    timeline: &Timeline,
) -> AdreelResult<PathBuf> {
    let dest = ctx
        .config
        .drafts_dir()
        .join(versioned_media_name(&project.id, &short_stem()));
    let logo_files = resolve_logo_files(ctx, timeline);
    let program = compile_render_program(normalized, &dest, timeline, project, &logo_files);
    ctx.engine.render(&program)?;
    Ok(dest)
}

/// Map each logo asset_ref to its file. Refs that do not resolve to a
/// logo asset of this project are skipped, not fatal.
fn resolve_logo_files(ctx: &PipelineContext, timeline: &Timeline) -> HashMap<String, PathBuf> {
    let mut files = HashMap::new();
    for overlay in &timeline.overlays {
        if overlay.kind != "logo" {
            continue;
        }
        let Some(asset_ref) = overlay.asset_ref.as_deref().map(str::trim) else {
            continue;
        };
        if asset_ref.is_empty() || files.contains_key(asset_ref) {
            continue;
        }
        match ctx.store.asset(asset_ref) {
            Ok(asset)
                if asset.kind == AssetKind::Logo && asset.project_id == timeline.project_id =>
            {
                files.insert(asset_ref.to_string(), asset.file);
            }
            _ => tracing::debug!(asset_ref, "skipping unresolvable logo asset_ref"),
        }
    }
    files
}

fn quality_gate(timeline: &Timeline) -> AdreelResult<QualityReport> {
    let report = validate_overlays(&timeline.overlays, timeline.video.duration_sec);
    if !report.is_render_ready() {
        return Err(AdreelError::validation(format!(
            "Timeline failed quality gate: {}",
            report.critical.join("; ")
        )));
    }
    Ok(report)
}

// ---- ingestion and submission ----

/// Copy a source video into the media tree, probe it, and snapshot the
/// project's video context. Rejects videos over the duration limit.
#[tracing::instrument(skip(ctx, path))]
pub fn ingest_source_video(
    ctx: &PipelineContext,
    project_id: &str,
    path: &Path,
) -> AdreelResult<Asset> {
    let project = ctx.store.project(project_id)?;
    let dest = copy_into_assets(ctx, project_id, path)?;
    let info = ctx.engine.probe(&dest)?;
    if info.duration_sec > ctx.config.max_duration_secs {
        let _ = std::fs::remove_file(&dest);
        return Err(AdreelError::validation(format!(
            "Video duration exceeds {}s",
            ctx.config.max_duration_secs
        )));
    }

    let mut asset = Asset::new(project_id, AssetKind::SourceVideo, dest);
    asset.metadata = serde_json::to_value(&info)
        .map_err(|e| AdreelError::serde(format!("probe metadata failed: {e}")))?;
    let asset = ctx.store.add_asset(asset)?;
    ctx.store
        .upsert_context(project_id, build_video_context(&project, &info))?;
    Ok(asset)
}

/// Copy a logo image into the media tree and register it.
pub fn ingest_logo(ctx: &PipelineContext, project_id: &str, path: &Path) -> AdreelResult<Asset> {
    ctx.store.project(project_id)?;
    let dest = copy_into_assets(ctx, project_id, path)?;
    ctx.store
        .add_asset(Asset::new(project_id, AssetKind::Logo, dest))
}

fn copy_into_assets(ctx: &PipelineContext, project_id: &str, path: &Path) -> AdreelResult<PathBuf> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("bin");
    let dest = ctx
        .config
        .assets_dir()
        .join(format!("{project_id}-{}.{ext}", short_stem()));
    ensure_parent_dir(&dest)?;
    std::fs::copy(path, &dest)
        .with_context(|| format!("failed to copy '{}' into the media root", path.display()))?;
    Ok(dest)
}

/// Create a pending generate job row. The caller hands its id to the
/// queue.
pub fn submit_generate(ctx: &PipelineContext, project_id: &str) -> AdreelResult<Job> {
    ctx.store.project(project_id)?;
    ctx.store
        .create_job(project_id, JobKind::GenerateDraft, serde_json::Value::Null)
}

/// Create a pending export job row. Requires a draft to exist.
pub fn submit_export(ctx: &PipelineContext, project_id: &str) -> AdreelResult<Job> {
    ctx.store.project(project_id)?;
    if ctx.store.draft_for_project(project_id).is_none() {
        return Err(AdreelError::validation("No draft available."));
    }
    ctx.store
        .create_job(project_id, JobKind::ExportFinal, serde_json::Value::Null)
}
