use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};

use adreel::{
    FfmpegEngine, Job, JobQueue, JobStatus, PipelineConfig, PipelineContext, ProjectStore,
    TEMPLATE_HOOK_BENEFIT_CTA,
};

#[derive(Parser, Debug)]
#[command(name = "adreel", version)]
struct Cli {
    #[command(subcommand)]
    cmd: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a project and print its id.
    Init(InitArgs),
    /// Register a source gameplay video (probes and caches its context).
    AddVideo(AssetArgs),
    /// Register a logo image.
    AddLogo(AssetArgs),
    /// Generate a draft render (requires `ffmpeg` on PATH).
    Generate(ProjectArgs),
    /// Edit the draft overlays with a natural-language instruction.
    Edit(EditArgs),
    /// Replace the draft overlays from a JSON file.
    Patch(PatchArgs),
    /// Approve (or revoke approval of) the draft for export.
    Approve(ApproveArgs),
    /// Export the approved draft.
    Export(ProjectArgs),
    /// Show the project, draft, and artifact state.
    Status(ProjectArgs),
    /// List draft versions with their diffs.
    Versions(ProjectArgs),
    /// List edit plan artifacts.
    Plans(ProjectArgs),
}

#[derive(Parser, Debug)]
struct InitArgs {
    /// Project name.
    #[arg(long)]
    name: String,

    /// Ad prompt fed to the copy generator.
    #[arg(long, default_value = "")]
    prompt: String,

    /// Overlay template id.
    #[arg(long, default_value = TEMPLATE_HOOK_BENEFIT_CTA)]
    template: String,

    /// Brand color as #RRGGBB.
    #[arg(long, default_value = "#00A86B")]
    color: String,
}

#[derive(Parser, Debug)]
struct ProjectArgs {
    project_id: String,
}

#[derive(Parser, Debug)]
struct AssetArgs {
    project_id: String,

    /// File to copy into the media root.
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct EditArgs {
    project_id: String,

    /// Instruction, e.g. "make it bigger" or "change cta to \"Install Now\"".
    instruction: String,
}

#[derive(Parser, Debug)]
struct PatchArgs {
    project_id: String,

    /// JSON file holding the replacement overlay array.
    #[arg(long)]
    file: PathBuf,
}

#[derive(Parser, Debug)]
struct ApproveArgs {
    project_id: String,

    /// Revoke a previous approval instead.
    #[arg(long, default_value_t = false)]
    revoke: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    let cli = Cli::parse();

    let config = PipelineConfig::from_env();
    config.validate()?;
    let store = ProjectStore::open(&config.store_path())?;
    let ctx = Arc::new(PipelineContext {
        config,
        store: Arc::new(store),
        engine: Arc::new(FfmpegEngine),
    });

    match cli.cmd {
        Command::Init(args) => cmd_init(&ctx, args),
        Command::AddVideo(args) => cmd_add_video(&ctx, args),
        Command::AddLogo(args) => cmd_add_logo(&ctx, args),
        Command::Generate(args) => cmd_generate(ctx, args),
        Command::Edit(args) => cmd_edit(&ctx, args),
        Command::Patch(args) => cmd_patch(&ctx, args),
        Command::Approve(args) => cmd_approve(&ctx, args),
        Command::Export(args) => cmd_export(ctx, args),
        Command::Status(args) => cmd_status(&ctx, args),
        Command::Versions(args) => cmd_versions(&ctx, args),
        Command::Plans(args) => cmd_plans(&ctx, args),
    }
}

fn cmd_init(ctx: &PipelineContext, args: InitArgs) -> anyhow::Result<()> {
    let project = ctx
        .store
        .create_project(&args.name, &args.prompt, &args.template, &args.color)?;
    println!("{}", project.id);
    Ok(())
}

fn cmd_add_video(ctx: &PipelineContext, args: AssetArgs) -> anyhow::Result<()> {
    let asset = adreel::ingest_source_video(ctx, &args.project_id, &args.file)?;
    println!("added source video {} -> {}", asset.id, asset.file.display());
    Ok(())
}

fn cmd_add_logo(ctx: &PipelineContext, args: AssetArgs) -> anyhow::Result<()> {
    let asset = adreel::ingest_logo(ctx, &args.project_id, &args.file)?;
    println!("added logo {} -> {}", asset.id, asset.file.display());
    Ok(())
}

fn cmd_generate(ctx: Arc<PipelineContext>, args: ProjectArgs) -> anyhow::Result<()> {
    let job = adreel::submit_generate(&ctx, &args.project_id)?;
    let job = run_job_to_completion(ctx, job)?;
    let video = job
        .result
        .as_ref()
        .and_then(|r| r["draft_video"].as_str().map(str::to_string))
        .unwrap_or_default();
    println!("draft ready: {video}");
    Ok(())
}

fn cmd_export(ctx: Arc<PipelineContext>, args: ProjectArgs) -> anyhow::Result<()> {
    let job = adreel::submit_export(&ctx, &args.project_id)?;
    let job = run_job_to_completion(ctx, job)?;
    let file = job
        .result
        .as_ref()
        .and_then(|r| r["file"].as_str().map(str::to_string))
        .unwrap_or_default();
    println!("exported: {file}");
    Ok(())
}

/// Push one job through the worker pool and poll its row until terminal.
fn run_job_to_completion(ctx: Arc<PipelineContext>, job: Job) -> anyhow::Result<Job> {
    let store = Arc::clone(&ctx.store);
    let queue = JobQueue::start(ctx, 2)?;
    queue.submit(&job.id)?;

    let finished = loop {
        let current = store.job(&job.id)?;
        if current.is_terminal() {
            break current;
        }
        std::thread::sleep(Duration::from_millis(100));
    };
    queue.shutdown();

    if finished.status == JobStatus::Failed {
        anyhow::bail!("job {} failed: {}", finished.id, finished.error);
    }
    Ok(finished)
}

fn cmd_edit(ctx: &PipelineContext, args: EditArgs) -> anyhow::Result<()> {
    let draft = adreel::edit_draft_with_prompt(ctx, &args.project_id, &args.instruction)?;
    let video = draft.video.unwrap_or_default();
    println!("draft re-rendered: {}", video.display());
    Ok(())
}

fn cmd_patch(ctx: &PipelineContext, args: PatchArgs) -> anyhow::Result<()> {
    let raw = std::fs::read_to_string(&args.file)
        .with_context(|| format!("read overlay file '{}'", args.file.display()))?;
    let overlays: Vec<serde_json::Value> = serde_json::from_str(&raw)
        .with_context(|| format!("'{}' is not a JSON overlay array", args.file.display()))?;

    let draft = adreel::patch_draft_overlays(ctx, &args.project_id, overlays)?;
    let video = draft.video.unwrap_or_default();
    println!("draft re-rendered: {}", video.display());
    Ok(())
}

fn cmd_approve(ctx: &PipelineContext, args: ApproveArgs) -> anyhow::Result<()> {
    let draft = adreel::approve_draft(ctx, &args.project_id, !args.revoke)?;
    println!(
        "draft {} {}",
        draft.id,
        if draft.approved { "approved" } else { "unapproved" }
    );
    Ok(())
}

fn cmd_status(ctx: &PipelineContext, args: ProjectArgs) -> anyhow::Result<()> {
    let project = ctx.store.project(&args.project_id)?;
    println!(
        "project {} \"{}\" status={:?} template={}",
        project.id, project.name, project.status, project.template_id
    );

    for asset in ctx.store.assets_for(&project.id) {
        println!("  asset {:?} {}", asset.kind, asset.file.display());
    }

    match ctx.store.draft_for_project(&project.id) {
        Some(draft) => {
            let video = draft
                .video
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "-".to_string());
            println!(
                "  draft {} status={:?} approved={} video={}",
                draft.id, draft.status, draft.approved, video
            );
            if !draft.error.is_empty() {
                println!("  draft error: {}", draft.error);
            }
            let versions = ctx.store.versions(&draft.id);
            println!("  versions: {}", versions.len());
        }
        None => println!("  draft: none"),
    }

    for export in ctx.store.exports(&project.id) {
        println!("  export {} {}", export.id, export.file.display());
    }
    Ok(())
}

fn cmd_versions(ctx: &PipelineContext, args: ProjectArgs) -> anyhow::Result<()> {
    let draft = ctx
        .store
        .draft_for_project(&args.project_id)
        .with_context(|| format!("project {} has no draft", args.project_id))?;

    for version in ctx.store.versions(&draft.id) {
        let video = version
            .video
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "v{} source={} added={} removed={} updated={} at={} video={}",
            version.version,
            version.source,
            version.diff.added.len(),
            version.diff.removed.len(),
            version.diff.updated.len(),
            version.created_at.to_rfc3339(),
            video
        );
    }
    Ok(())
}

fn cmd_plans(ctx: &PipelineContext, args: ProjectArgs) -> anyhow::Result<()> {
    for plan in ctx.store.plans(&args.project_id) {
        println!(
            "v{} {} source={} status={:?} critical={} warnings={} at={}",
            plan.version,
            plan.plan.plan_id,
            plan.source,
            plan.status,
            plan.quality_report.critical.len(),
            plan.quality_report.warnings.len(),
            plan.created_at.to_rfc3339()
        );
    }
    Ok(())
}
