use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use adreel::{
    DraftStatus, FfmpegEngine, JobStatus, MediaEngine, PipelineConfig, PipelineContext,
    ProjectStatus, ProjectStore,
};

/// The full stack needs ffmpeg, ffprobe, and a drawtext filter with a
/// usable font. The font check matters on minimal containers where
/// fontconfig finds nothing.
fn overlay_tools_available() -> bool {
    if !adreel::is_ffmpeg_on_path() {
        return false;
    }
    let ffprobe = Command::new("ffprobe")
        .arg("-version")
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false);
    if !ffprobe {
        return false;
    }
    Command::new("ffmpeg")
        .args([
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            "color=c=black:s=64x64:d=0.1",
            "-vf",
            "drawtext=text='x'",
            "-frames:v",
            "1",
            "-f",
            "null",
            "-",
        ])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

fn unique_root(tag: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    std::env::temp_dir().join(format!("adreel_{}_{}_{}", tag, std::process::id(), nanos))
}

fn synth_clip(dest: &Path, seconds: u32) {
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            &format!("testsrc=size=320x480:rate=30:duration={seconds}"),
            "-f",
            "lavfi",
            "-i",
            &format!("sine=frequency=440:duration={seconds}"),
            "-c:v",
            "libx264",
            "-pix_fmt",
            "yuv420p",
            "-c:a",
            "aac",
            "-shortest",
        ])
        .arg(dest)
        .status()
        .expect("ffmpeg should be runnable");
    assert!(status.success(), "fixture clip synthesis failed");
}

fn synth_logo(dest: &Path) {
    let status = Command::new("ffmpeg")
        .args([
            "-y",
            "-v",
            "error",
            "-f",
            "lavfi",
            "-i",
            "color=c=red:s=64x64",
            "-frames:v",
            "1",
        ])
        .arg(dest)
        .status()
        .expect("ffmpeg should be runnable");
    assert!(status.success(), "fixture logo synthesis failed");
}

#[test]
fn real_engine_generates_a_playable_draft() {
    if !overlay_tools_available() {
        return;
    }

    let root = unique_root("pipeline");
    std::fs::create_dir_all(&root).unwrap();
    let clip = root.join("gameplay.mp4");
    synth_clip(&clip, 2);
    let logo = root.join("logo.png");
    synth_logo(&logo);

    // Small target keeps the normalize/render passes fast.
    let mut config = PipelineConfig::default().with_media_root(root.join("media"));
    config.target_width = 270;
    config.target_height = 480;
    let store = ProjectStore::open(&config.store_path()).unwrap();
    let ctx = Arc::new(PipelineContext {
        config,
        store: Arc::new(store),
        engine: Arc::new(FfmpegEngine),
    });

    let project = ctx
        .store
        .create_project("Smoke", "Ship it", "hook_benefit_cta_v1", "#00A86B")
        .unwrap();
    adreel::ingest_source_video(&ctx, &project.id, &clip).unwrap();
    adreel::ingest_logo(&ctx, &project.id, &logo).unwrap();

    let job = adreel::submit_generate(&ctx, &project.id).unwrap();
    adreel::execute_job(&ctx, &job.id).unwrap();
    assert_eq!(ctx.store.job(&job.id).unwrap().status, JobStatus::Success);

    let draft = ctx.store.draft_for_project(&project.id).unwrap();
    assert_eq!(draft.status, DraftStatus::Ready);
    let video = draft.video.unwrap();
    assert!(video.exists());

    let info = FfmpegEngine.probe(&video).unwrap();
    assert_eq!(info.width, 270);
    assert_eq!(info.height, 480);
    assert!(
        (info.duration_sec - 2.0).abs() < 0.5,
        "unexpected draft duration {}",
        info.duration_sec
    );

    // Approved draft exports as a byte-identical clip.
    adreel::approve_draft(&ctx, &project.id, true).unwrap();
    let job = adreel::submit_export(&ctx, &project.id).unwrap();
    adreel::execute_job(&ctx, &job.id).unwrap();
    let exports = ctx.store.exports(&project.id);
    assert_eq!(exports.len(), 1);
    assert_eq!(
        std::fs::read(&exports[0].file).unwrap(),
        std::fs::read(&video).unwrap()
    );
    assert_eq!(
        ctx.store.project(&project.id).unwrap().status,
        ProjectStatus::Exported
    );

    let _ = std::fs::remove_dir_all(&root);
}

#[test]
fn overlong_upload_is_rejected_at_ingest() {
    if !overlay_tools_available() {
        return;
    }

    let root = unique_root("too_long");
    std::fs::create_dir_all(&root).unwrap();
    let clip = root.join("long.mp4");
    synth_clip(&clip, 3);

    let mut config = PipelineConfig::default().with_media_root(root.join("media"));
    config.max_duration_secs = 2.0;
    let store = ProjectStore::open(&config.store_path()).unwrap();
    let ctx = Arc::new(PipelineContext {
        config,
        store: Arc::new(store),
        engine: Arc::new(FfmpegEngine),
    });
    let project = ctx
        .store
        .create_project("Smoke", "", "hook_benefit_cta_v1", "#00A86B")
        .unwrap();

    let err = adreel::ingest_source_video(&ctx, &project.id, &clip).unwrap_err();
    assert!(err.to_string().contains("Video duration exceeds 2s"));
    // The rejected copy must not linger in the media tree.
    let leftovers: Vec<_> = std::fs::read_dir(ctx.config.assets_dir())
        .map(|entries| entries.filter_map(Result::ok).collect())
        .unwrap_or_default();
    assert!(leftovers.is_empty());

    let _ = std::fs::remove_dir_all(&root);
}
