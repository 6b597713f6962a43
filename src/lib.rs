//! Adreel turns a short gameplay clip plus a text prompt into a vertical
//! ad with timed text and logo overlays, tracked as versioned drafts up
//! to an approved export.
//!
//! # Pipeline overview
//!
//! 1. **Copy**: prompt -> `AdCopy` via a pluggable provider (local rules or a
//!    remote text-generation call)
//! 2. **Build**: copy + probed geometry -> `Timeline` (template-driven overlay
//!    layout)
//! 3. **Validate**: `Timeline` -> `QualityReport` (blocking vs advisory findings)
//! 4. **Compile**: `Timeline` -> `RenderProgram` (one ffmpeg filter chain of
//!    enable-windowed drawing stages)
//! 5. **Render**: the system `ffmpeg` binary executes the program over the
//!    normalized source
//! 6. **Version**: each successful render appends a `DraftVersion` carrying the
//!    timeline and its diff against the predecessor
//!
//! The key design constraints:
//!
//! - **No unsafe**: `unsafe` is forbidden in this crate.
//! - **Deterministic compile**: identical timeline, project, and config produce
//!   an identical filter graph.
//! - **Validated at every boundary**: timelines pass the quality gate after
//!   build, after edit, and before render.
//! - **Append-only history**: draft versions and plan artifacts are never
//!   rewritten, only appended.
#![forbid(unsafe_code)]

mod creative;
mod foundation;
mod jobs;
mod plan;
mod render;
mod store;
mod timeline;

pub use creative::editor::apply_instruction;
pub use creative::gemini::GeminiCopyProvider;
pub use creative::local::LocalCopyProvider;
pub use creative::provider::{AdCopy, CopyProvider, CreativeBrief, select_provider};
pub use foundation::config::{PipelineConfig, ProviderConfig, ensure_parent_dir};
pub use foundation::error::{AdreelError, AdreelResult};
pub use jobs::orchestrator::{
    PipelineContext, approve_draft, edit_draft_with_prompt, execute_job, ingest_logo,
    ingest_source_video, patch_draft_overlays, rerender_draft, submit_export, submit_generate,
};
pub use jobs::queue::JobQueue;
pub use plan::context::{
    RecommendedWindows, SceneSegment, TimeWindow, VideoContextData, VideoSummary,
    build_video_context,
};
pub use plan::planner::{EditPlan, PlanConstraints, build_edit_plan};
pub use render::engine::{FfmpegEngine, MediaEngine, MediaInfo, is_ffmpeg_on_path};
pub use render::graph::{RenderProgram, compile_render_program};
pub use store::json::ProjectStore;
pub use store::model::{
    ArtifactStatus, Asset, AssetKind, Draft, DraftStatus, DraftVersion, EditPlanArtifact,
    ExportArtifact, Job, JobKind, JobStatus, Project, ProjectStatus, VideoContext,
};
pub use timeline::builder::{
    TEMPLATE_HOOK_BENEFIT_CTA, TEMPLATE_PROBLEM_SOLUTION_CTA, build_timeline,
};
pub use timeline::diff::{DiffChange, DiffEntry, OverlayDiff, diff_overlays};
pub use timeline::model::{
    Anchor, CopyVariants, Overlay, Position, Provenance, StyleMap, Timeline, VideoMeta,
    new_overlay_id,
};
pub use timeline::quality::{QualityReport, validate_overlays};
