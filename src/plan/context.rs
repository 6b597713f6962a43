//! Lightweight source-video analysis. Scene segmentation is heuristic
//! (even time slices with alternating scores), enough to drive template
//! window selection without a vision model.

use serde::{Deserialize, Serialize};

use crate::render::engine::MediaInfo;
use crate::store::model::Project;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start_sec: f64,
    pub end_sec: f64,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SceneSegment {
    pub scene_id: String,
    pub start_sec: f64,
    pub end_sec: f64,
    pub summary: String,
    pub ad_score: f64,
}

/// Probe facts embedded into the context, with unknowns made explicit.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoSummary {
    pub duration_sec: f64,
    pub width: u32,
    pub height: u32,
    pub fps: f64,
    pub codec_name: String,
    pub format_name: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecommendedWindows {
    pub hook: TimeWindow,
    pub cta: TimeWindow,
}

/// Everything the planner knows about a source video.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct VideoContextData {
    pub project_id: String,
    pub template_id: String,
    pub summary: String,
    pub video: VideoSummary,
    pub recommended_windows: RecommendedWindows,
    pub scenes: Vec<SceneSegment>,
}

const MAX_SCENES: i64 = 4;

fn scene_segments(duration_sec: f64) -> Vec<SceneSegment> {
    if duration_sec <= 0.0 {
        return Vec::new();
    }
    let count = ((duration_sec / 3.0).floor() as i64 + 1).clamp(1, MAX_SCENES);
    let chunk = duration_sec / count as f64;
    (0..count)
        .map(|i| {
            let end = if i == count - 1 {
                duration_sec
            } else {
                (i + 1) as f64 * chunk
            };
            SceneSegment {
                scene_id: format!("scene_{}", i + 1),
                start_sec: round2(i as f64 * chunk),
                end_sec: round2(end),
                summary: "High motion gameplay segment".to_string(),
                ad_score: round2(0.7 + 0.2 * (i % 2) as f64),
            }
        })
        .collect()
}

/// Derive the per-project video context from probe output. The hook
/// window always covers at least the first two seconds, capped at the
/// video's end.
pub fn build_video_context(project: &Project, info: &MediaInfo) -> VideoContextData {
    let duration = info.duration_sec;
    let hook_end = if duration > 0.0 {
        round2(duration * 0.2).max(2.0).min(round2(duration))
    } else {
        2.0
    };
    VideoContextData {
        project_id: project.id.clone(),
        template_id: project.template_id.clone(),
        summary: "Gameplay-focused source suitable for ad overlays".to_string(),
        video: VideoSummary {
            duration_sec: duration,
            width: info.width,
            height: info.height,
            fps: info.fps,
            codec_name: info.codec_name.clone().unwrap_or_else(|| "unknown".to_string()),
            format_name: info.format_name.clone().unwrap_or_else(|| "unknown".to_string()),
        },
        recommended_windows: RecommendedWindows {
            hook: TimeWindow {
                start_sec: 0.0,
                end_sec: hook_end,
            },
            cta: TimeWindow {
                start_sec: round2(duration * 0.74),
                end_sec: round2(duration),
            },
        },
        scenes: scene_segments(duration),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(duration_sec: f64) -> MediaInfo {
        MediaInfo {
            duration_sec,
            width: 1080,
            height: 1920,
            fps: 30.0,
            codec_name: Some("h264".to_string()),
            format_name: Some("mov,mp4".to_string()),
        }
    }

    fn project() -> Project {
        Project::new("Demo", "", "hook_benefit_cta_v1", "#00A86B")
    }

    #[test]
    fn ten_seconds_splits_into_four_scenes() {
        let scenes = scene_segments(10.0);
        assert_eq!(scenes.len(), 4);
        assert_eq!(scenes[0].scene_id, "scene_1");
        assert_eq!(scenes[3].scene_id, "scene_4");
        assert_eq!(scenes[0].start_sec, 0.0);
        assert_eq!(scenes[0].end_sec, 2.5);
        assert_eq!(scenes[3].start_sec, 7.5);
        assert_eq!(scenes[3].end_sec, 10.0);
    }

    #[test]
    fn scene_scores_alternate() {
        let scores: Vec<f64> = scene_segments(30.0).iter().map(|s| s.ad_score).collect();
        assert_eq!(scores, vec![0.7, 0.9, 0.7, 0.9]);
    }

    #[test]
    fn short_clip_gets_a_single_scene() {
        let scenes = scene_segments(2.0);
        assert_eq!(scenes.len(), 1);
        assert_eq!(scenes[0].start_sec, 0.0);
        assert_eq!(scenes[0].end_sec, 2.0);
    }

    #[test]
    fn zero_duration_has_no_scenes_but_keeps_hook_floor() {
        let context = build_video_context(&project(), &info(0.0));
        assert!(context.scenes.is_empty());
        assert_eq!(context.recommended_windows.hook.end_sec, 2.0);
        assert_eq!(context.recommended_windows.cta.start_sec, 0.0);
        assert_eq!(context.recommended_windows.cta.end_sec, 0.0);
    }

    #[test]
    fn hook_window_scales_with_duration_but_never_under_two() {
        let long = build_video_context(&project(), &info(30.0));
        assert_eq!(long.recommended_windows.hook.end_sec, 6.0);
        assert_eq!(long.recommended_windows.cta.start_sec, 22.2);

        let short = build_video_context(&project(), &info(5.0));
        assert_eq!(short.recommended_windows.hook.end_sec, 2.0);
    }

    #[test]
    fn probe_gaps_become_unknowns() {
        let mut bare = info(8.0);
        bare.codec_name = None;
        bare.format_name = None;
        let context = build_video_context(&project(), &bare);
        assert_eq!(context.video.codec_name, "unknown");
        assert_eq!(context.video.format_name, "unknown");
        assert_eq!(context.summary, "Gameplay-focused source suitable for ad overlays");
    }
}
