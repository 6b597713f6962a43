//! Edit-plan assembly. A plan snapshots why the pipeline laid out a
//! timeline the way it did, alongside the context it consulted.

use serde::{Deserialize, Serialize};

use crate::plan::context::VideoContextData;
use crate::store::model::Project;
use crate::timeline::model::{Overlay, Timeline};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlanConstraints {
    pub max_duration_seconds: u32,
    pub platform: String,
    pub safe_zone: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EditPlan {
    pub plan_id: String,
    pub objective: String,
    pub template_id: String,
    /// What triggered the plan (initial_generate, prompt_edit).
    pub source: String,
    pub video_context: VideoContextData,
    pub overlays: Vec<Overlay>,
    pub constraints: PlanConstraints,
    pub reasoning_summary: String,
}

pub fn build_edit_plan(
    project: &Project,
    video_context: &VideoContextData,
    timeline: &Timeline,
    source: &str,
) -> EditPlan {
    let hex = uuid::Uuid::new_v4().simple().to_string();
    EditPlan {
        plan_id: format!("plan_{}", &hex[..10]),
        objective: format!(
            "Generate high-converting playable-style ad for {}",
            project.name
        ),
        template_id: project.template_id.clone(),
        source: source.to_string(),
        video_context: video_context.clone(),
        overlays: timeline.overlays.clone(),
        constraints: PlanConstraints {
            max_duration_seconds: 60,
            platform: "tiktok_reels_vertical".to_string(),
            safe_zone: "top-bottom padding retained".to_string(),
        },
        reasoning_summary:
            "Auto-selected highest confidence template layout using context windows for hook and CTA."
                .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::creative::provider::AdCopy;
    use crate::plan::context::build_video_context;
    use crate::render::engine::MediaInfo;
    use crate::timeline::builder::build_timeline;
    use crate::timeline::model::VideoMeta;

    #[test]
    fn plan_snapshots_timeline_and_context() {
        let project = Project::new("Demo Game", "Promote", "hook_benefit_cta_v1", "#00A86B");
        let info = MediaInfo {
            duration_sec: 20.0,
            width: 1080,
            height: 1920,
            fps: 30.0,
            codec_name: Some("h264".to_string()),
            format_name: Some("mp4".to_string()),
        };
        let context = build_video_context(&project, &info);
        let copy = AdCopy {
            headline: "Go".to_string(),
            benefit: "Win".to_string(),
            cta: "Play".to_string(),
        };
        let meta = VideoMeta {
            duration_sec: 20.0,
            width: 1080,
            height: 1920,
            fps: 30,
        };
        let timeline = build_timeline(&project, None, meta, &copy, "local");

        let plan = build_edit_plan(&project, &context, &timeline, "initial_generate");

        assert!(plan.plan_id.starts_with("plan_"));
        assert_eq!(plan.plan_id.len(), 15);
        assert_eq!(plan.objective, "Generate high-converting playable-style ad for Demo Game");
        assert_eq!(plan.template_id, "hook_benefit_cta_v1");
        assert_eq!(plan.source, "initial_generate");
        assert_eq!(plan.overlays, timeline.overlays);
        assert_eq!(plan.video_context, context);
        assert_eq!(plan.constraints.max_duration_seconds, 60);
        assert_eq!(plan.constraints.platform, "tiktok_reels_vertical");
        assert_eq!(plan.constraints.safe_zone, "top-bottom padding retained");
        assert!(plan.reasoning_summary.contains("context windows"));
    }

    #[test]
    fn plan_ids_are_unique() {
        let project = Project::new("P", "", "hook_benefit_cta_v1", "#00A86B");
        let info = MediaInfo {
            duration_sec: 5.0,
            width: 0,
            height: 0,
            fps: 0.0,
            codec_name: None,
            format_name: None,
        };
        let context = build_video_context(&project, &info);
        let copy = AdCopy {
            headline: "H".to_string(),
            benefit: "B".to_string(),
            cta: "C".to_string(),
        };
        let meta = VideoMeta {
            duration_sec: 5.0,
            width: 1080,
            height: 1920,
            fps: 30,
        };
        let timeline = build_timeline(&project, None, meta, &copy, "local");
        let a = build_edit_plan(&project, &context, &timeline, "auto");
        let b = build_edit_plan(&project, &context, &timeline, "auto");
        assert_ne!(a.plan_id, b.plan_id);
    }
}
