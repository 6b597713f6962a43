use std::path::Path;
use std::process::Command;

use serde::{Deserialize, Serialize};

use crate::foundation::config::{ensure_parent_dir, PipelineConfig};
use crate::foundation::error::{AdreelError, AdreelResult};
use crate::render::graph::RenderProgram;

/// Stream and container facts for a video file, as reported by ffprobe.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MediaInfo {
    pub duration_sec: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec_name: Option<String>,
    pub format_name: Option<String>,
}

/// The media operations the pipeline performs. The real implementation
/// shells out to ffmpeg/ffprobe; tests substitute an in-memory engine.
pub trait MediaEngine: Send + Sync {
    /// Inspect a video file.
    fn probe(&self, path: &Path) -> AdreelResult<MediaInfo>;

    /// Transcode `src` to the target geometry: scaled to fit, padded to
    /// exact size, constant frame rate, yuv420p.
    fn normalize(&self, src: &Path, dst: &Path, config: &PipelineConfig) -> AdreelResult<()>;

    /// Execute a compiled overlay render.
    fn render(&self, program: &RenderProgram) -> AdreelResult<()>;
}

/// System ffmpeg/ffprobe, invoked per call. No persistent state.
pub struct FfmpegEngine;

impl MediaEngine for FfmpegEngine {
    fn probe(&self, path: &Path) -> AdreelResult<MediaInfo> {
        let out = Command::new("ffprobe")
            .args([
                "-v",
                "error",
                "-print_format",
                "json",
                "-show_streams",
                "-show_format",
            ])
            .arg(path)
            .output()
            .map_err(|e| AdreelError::probe(format!("failed to run ffprobe: {e}")))?;
        if !out.status.success() {
            return Err(AdreelError::probe(format!(
                "ffprobe failed for '{}': {}",
                path.display(),
                String::from_utf8_lossy(&out.stderr).trim()
            )));
        }
        parse_probe_output(&out.stdout)
    }

    fn normalize(&self, src: &Path, dst: &Path, config: &PipelineConfig) -> AdreelResult<()> {
        ensure_parent_dir(dst)?;
        let vf = format!(
            "scale={w}:{h}:force_original_aspect_ratio=decrease,\
             pad={w}:{h}:(ow-iw)/2:(oh-ih)/2,format=yuv420p",
            w = config.target_width,
            h = config.target_height,
        );
        let out = Command::new("ffmpeg")
            .args(["-y", "-v", "error", "-i"])
            .arg(src)
            .args([
                "-vf",
                &vf,
                "-r",
                &config.target_fps.to_string(),
                "-c:v",
                "libx264",
                "-preset",
                "veryfast",
                "-c:a",
                "aac",
            ])
            .arg(dst)
            .output()
            .map_err(|e| AdreelError::render(format!("failed to run ffmpeg for normalize: {e}")))?;
        finished("normalize", dst, &out)
    }

    fn render(&self, program: &RenderProgram) -> AdreelResult<()> {
        ensure_parent_dir(program.dest())?;
        let out = Command::new("ffmpeg")
            .args(program.args())
            .output()
            .map_err(|e| {
                AdreelError::render(format!("failed to run ffmpeg for overlay render: {e}"))
            })?;
        finished("overlay render", program.dest(), &out)
    }
}

fn finished(action: &str, dst: &Path, out: &std::process::Output) -> AdreelResult<()> {
    if !out.status.success() {
        return Err(AdreelError::render(format!(
            "ffmpeg {action} failed for '{}': {}",
            dst.display(),
            String::from_utf8_lossy(&out.stderr).trim()
        )));
    }
    Ok(())
}

pub fn is_ffmpeg_on_path() -> bool {
    Command::new("ffmpeg")
        .arg("-version")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null())
        .status()
        .map(|s| s.success())
        .unwrap_or(false)
}

pub(crate) fn parse_probe_output(stdout: &[u8]) -> AdreelResult<MediaInfo> {
    #[derive(Deserialize)]
    struct ProbeStream {
        codec_type: Option<String>,
        codec_name: Option<String>,
        width: Option<u32>,
        height: Option<u32>,
        r_frame_rate: Option<String>,
    }
    #[derive(Deserialize)]
    struct ProbeFormat {
        duration: Option<String>,
        format_name: Option<String>,
    }
    #[derive(Deserialize)]
    struct ProbeOut {
        #[serde(default)]
        streams: Vec<ProbeStream>,
        format: Option<ProbeFormat>,
    }

    let parsed: ProbeOut = serde_json::from_slice(stdout)
        .map_err(|e| AdreelError::probe(format!("ffprobe json parse failed: {e}")))?;
    let video = parsed
        .streams
        .iter()
        .find(|s| s.codec_type.as_deref() == Some("video"))
        .ok_or_else(|| AdreelError::probe("No video stream found"))?;
    let duration_sec = parsed
        .format
        .as_ref()
        .and_then(|f| f.duration.as_ref())
        .and_then(|s| s.parse::<f64>().ok())
        .unwrap_or(0.0);

    Ok(MediaInfo {
        duration_sec,
        width: video.width.unwrap_or(0),
        height: video.height.unwrap_or(0),
        fps: parse_fps(video.r_frame_rate.as_deref().unwrap_or("0/1")),
        codec_name: video.codec_name.clone(),
        format_name: parsed.format.as_ref().and_then(|f| f.format_name.clone()),
    })
}

/// ffprobe reports frame rates as a "num/den" ratio. Unparsable or
/// zero-denominator input maps to 0.0 rather than an error, since the
/// rate is informational here.
fn parse_fps(raw: &str) -> f64 {
    let mut parts = raw.split('/');
    let Some(num) = parts.next().and_then(|p| p.parse::<f64>().ok()) else {
        return 0.0;
    };
    match parts.next() {
        None => num,
        Some(den) => match den.parse::<f64>() {
            Ok(den) if den != 0.0 => num / den,
            _ => 0.0,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "streams": [
            {"codec_type": "audio", "codec_name": "aac"},
            {
                "codec_type": "video",
                "codec_name": "h264",
                "width": 1080,
                "height": 1920,
                "r_frame_rate": "30000/1001"
            }
        ],
        "format": {"duration": "12.500000", "format_name": "mov,mp4,m4a,3gp,3g2,mj2"}
    }"#;

    #[test]
    fn probe_output_extracts_video_stream_facts() {
        let info = parse_probe_output(SAMPLE.as_bytes()).unwrap();
        assert_eq!(info.duration_sec, 12.5);
        assert_eq!(info.width, 1080);
        assert_eq!(info.height, 1920);
        assert!((info.fps - 29.97).abs() < 0.01);
        assert_eq!(info.codec_name.as_deref(), Some("h264"));
        assert_eq!(info.format_name.as_deref(), Some("mov,mp4,m4a,3gp,3g2,mj2"));
    }

    #[test]
    fn probe_output_without_video_stream_is_an_error() {
        let json = r#"{"streams": [{"codec_type": "audio"}], "format": {"duration": "3.0"}}"#;
        let err = parse_probe_output(json.as_bytes()).unwrap_err();
        assert!(err.to_string().contains("No video stream"));
    }

    #[test]
    fn probe_output_tolerates_missing_fields() {
        let json = r#"{"streams": [{"codec_type": "video"}]}"#;
        let info = parse_probe_output(json.as_bytes()).unwrap();
        assert_eq!(info.duration_sec, 0.0);
        assert_eq!(info.width, 0);
        assert_eq!(info.fps, 0.0);
        assert_eq!(info.codec_name, None);
    }

    #[test]
    fn malformed_probe_json_is_an_error() {
        assert!(parse_probe_output(b"not json").is_err());
    }

    #[test]
    fn frame_rate_ratios_parse_gracefully() {
        assert_eq!(parse_fps("30/1"), 30.0);
        assert_eq!(parse_fps("30"), 30.0);
        assert_eq!(parse_fps("0/1"), 0.0);
        assert_eq!(parse_fps("30/0"), 0.0);
        assert_eq!(parse_fps("abc"), 0.0);
        assert_eq!(parse_fps(""), 0.0);
    }
}
