//! Compiles an overlay timeline into a single-pass ffmpeg filter graph.
//!
//! The graph threads one video chain through the overlays in timeline
//! order: text overlays become `drawtext` stages (ctas get a `drawbox`
//! banner first), logo overlays become scaled `overlay` stages reading
//! from extra inputs. Audio is passed through untouched.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use crate::store::model::Project;
use crate::timeline::model::{Anchor, Overlay, Position, Timeline};

const DEFAULT_CTA_COLOR: &str = "0x00A86B";

/// A fully-resolved ffmpeg invocation, ready to run.
#[derive(Clone, Debug)]
pub struct RenderProgram {
    input: PathBuf,
    dest: PathBuf,
    logo_inputs: Vec<PathBuf>,
    filter_complex: String,
    output_tag: String,
}

impl RenderProgram {
    /// Argument vector for `ffmpeg`, excluding the program name.
    pub fn args(&self) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec![
            "-y".into(),
            "-v".into(),
            "error".into(),
            "-i".into(),
            self.input.clone().into(),
        ];
        for logo in &self.logo_inputs {
            args.push("-i".into());
            args.push(logo.clone().into());
        }
        args.extend([
            "-filter_complex".into(),
            self.filter_complex.clone().into(),
            "-map".into(),
            format!("[{}]", self.output_tag).into(),
            "-map".into(),
            "0:a?".into(),
            "-c:v".into(),
            "libx264".into(),
            "-preset".into(),
            "veryfast".into(),
            "-c:a".into(),
            "aac".into(),
            self.dest.clone().into(),
        ]);
        args
    }

    pub fn filter_complex(&self) -> &str {
        &self.filter_complex
    }

    pub fn input(&self) -> &Path {
        &self.input
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn logo_inputs(&self) -> &[PathBuf] {
        &self.logo_inputs
    }
}

/// Build the render program for a timeline.
///
/// `logo_files` maps logo asset ids to their on-disk files; a logo
/// overlay whose asset cannot be resolved is skipped rather than
/// failing the render.
pub fn compile_render_program(
    src: &Path,
    dst: &Path,
    timeline: &Timeline,
    project: &Project,
    logo_files: &HashMap<String, PathBuf>,
) -> RenderProgram {
    // Extra inputs first: one per distinct resolvable logo asset, in
    // first-use order. Stream index n+1 maps back to entry n.
    let mut logo_inputs: Vec<(String, PathBuf)> = Vec::new();
    for overlay in &timeline.overlays {
        if overlay.kind != "logo" {
            continue;
        }
        let Some(asset_ref) = trimmed_asset_ref(overlay) else {
            continue;
        };
        if logo_inputs.iter().any(|(id, _)| *id == asset_ref) {
            continue;
        }
        if let Some(file) = logo_files.get(&asset_ref) {
            logo_inputs.push((asset_ref, file.clone()));
        }
    }

    let mut filters = vec!["[0:v]format=yuv420p[v0]".to_string()];
    let mut current = "v0".to_string();
    let mut tag_idx = 1usize;

    for overlay in &timeline.overlays {
        let start = format_secs(overlay.start_sec);
        let end = format_secs(overlay.end_sec);

        if overlay.kind == "logo" {
            let Some(asset_ref) = trimmed_asset_ref(overlay) else {
                continue;
            };
            let Some(position) = logo_inputs.iter().position(|(id, _)| *id == asset_ref) else {
                continue;
            };
            let stream_index = position + 1;
            let logo_tag = format!("lg{tag_idx}");
            let out_tag = format!("v{tag_idx}");
            tag_idx += 1;
            let scale_width = overlay
                .style_f64("scale_width")
                .map(|v| v as i64)
                .unwrap_or(220);
            filters.push(format!(
                "[{stream_index}:v]scale={scale_width}:-1[{logo_tag}]"
            ));
            filters.push(format!(
                "[{current}][{logo_tag}]overlay=x=(W-w)*{x}:y=(H-h)*{y}:\
                 enable='between(t,{start},{end})'[{out_tag}]",
                x = overlay.position.x,
                y = overlay.position.y,
            ));
            current = out_tag;
            continue;
        }

        let text = escape_drawtext(&overlay.text);
        let font_size = overlay
            .style_f64("font_size")
            .map(|v| v as i64)
            .unwrap_or(64);
        let color = overlay.style_str("color").unwrap_or("white").to_string();
        let x_expr = text_x_expr(&overlay.position);
        let y_expr = format!("h*{}-text_h/2", overlay.position.y);

        if overlay.kind == "cta" {
            let bg = overlay
                .style_str("bg")
                .unwrap_or(&project.primary_color)
                .to_string();
            let cta_bg = hex_to_ffmpeg_color(&bg);
            let box_tag = format!("v{tag_idx}");
            tag_idx += 1;
            filters.push(format!(
                "[{current}]drawbox=x=iw*0.16:y=ih*{y}-ih*0.055:\
                 w=iw*0.68:h=ih*0.11:color={cta_bg}@0.92:t=fill:\
                 enable='between(t,{start},{end})'[{box_tag}]",
                y = overlay.position.y,
            ));
            current = box_tag;
        }

        let out_tag = format!("v{tag_idx}");
        tag_idx += 1;
        let box_color = overlay.style_str("box").unwrap_or("black@0.4").to_string();
        let box_border = overlay
            .style_f64("box_border")
            .map(|v| v as i64)
            .unwrap_or(18);
        filters.push(format!(
            "[{current}]drawtext=text='{text}':x={x_expr}:y={y_expr}:\
             fontsize={font_size}:fontcolor={color}:box=1:boxcolor={box_color}:\
             boxborderw={box_border}:enable='between(t,{start},{end})'[{out_tag}]"
        ));
        current = out_tag;
    }

    RenderProgram {
        input: src.to_path_buf(),
        dest: dst.to_path_buf(),
        logo_inputs: logo_inputs.into_iter().map(|(_, file)| file).collect(),
        filter_complex: filters.join(";"),
        output_tag: current,
    }
}

fn trimmed_asset_ref(overlay: &Overlay) -> Option<String> {
    let asset_ref = overlay.asset_ref.as_deref()?.trim();
    if asset_ref.is_empty() {
        None
    } else {
        Some(asset_ref.to_string())
    }
}

/// Escape text for a single-quoted drawtext argument. Backslash must go
/// first so the later escapes are not doubled.
pub(crate) fn escape_drawtext(text: &str) -> String {
    text.replace('\\', "\\\\")
        .replace(':', "\\:")
        .replace('\'', "\\'")
}

/// Map "#RRGGBB" onto ffmpeg's 0x color syntax. Anything else falls
/// back to the stock accent color.
pub(crate) fn hex_to_ffmpeg_color(value: &str) -> String {
    let raw = value.trim();
    if let Some(rest) = raw.strip_prefix('#') {
        if rest.len() == 6 {
            return format!("0x{rest}");
        }
    }
    DEFAULT_CTA_COLOR.to_string()
}

fn text_x_expr(position: &Position) -> String {
    match position.anchor {
        Anchor::Left => format!("w*{}", position.x),
        Anchor::Right => format!("w*{}-text_w", position.x),
        Anchor::Center => format!("(w-text_w)*{}", position.x),
    }
}

/// Times in enable expressions get a fixed precision so graphs are
/// byte-stable across regenerations of the same timeline.
fn format_secs(value: f64) -> String {
    format!("{value:.3}")
}
