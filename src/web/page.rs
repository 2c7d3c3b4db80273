//! HTML rendering for the generator page.

use std::fmt::Write;

use crate::generation::{
    FormInput, GenerationMode, GUIDANCE_SCALE_STEP, MAX_DURATION_SECS, MAX_GUIDANCE_SCALE,
    MAX_INFERENCE_STEPS, MIN_DURATION_SECS, MIN_GUIDANCE_SCALE, MIN_INFERENCE_STEPS,
    SUPPORTED_IMAGE_EXTENSIONS,
};

/// Message shown above the form after a submission.
#[derive(Debug, Clone, PartialEq)]
pub enum Notice {
    /// Input was rejected before any API call.
    Warning(String),
    /// Configuration or vendor failure.
    Error(String),
    /// Generation succeeded.
    Success { video_url: String },
}

/// Everything needed to render the page.
#[derive(Debug)]
pub struct PageView<'a> {
    pub input: &'a FormInput,
    pub notice: Option<Notice>,
    pub api_key_configured: bool,
}

/// Escape text for use in HTML bodies and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Whether a URL can be embedded as a video source.
pub fn is_renderable_url(url: &str) -> bool {
    let lower = url.trim().to_ascii_lowercase();
    lower.starts_with("https://") || lower.starts_with("http://")
}

const STYLE: &str = r#"
body { font-family: system-ui, sans-serif; max-width: 960px; margin: 2rem auto; padding: 0 1rem; color: #1f2328; }
label { display: block; font-weight: 600; margin-top: 1rem; }
textarea, input[type=text], select { width: 100%; box-sizing: border-box; padding: .5rem; font: inherit; }
input[type=range] { width: 100%; }
.hint { color: #656d76; font-size: .85rem; font-weight: normal; }
.notice { padding: .75rem 1rem; border-radius: 6px; margin: 1rem 0; }
.warning { background: #fff8c5; }
.error { background: #ffebe9; }
.success { background: #dafbe1; }
video { width: 100%; margin-top: 1rem; }
button { margin-top: 1.5rem; padding: .6rem 1.4rem; font: inherit; }
#spinner { display: none; margin-top: 1rem; }
form.busy #spinner { display: block; }
"#;

const SCRIPT: &str = r#"
const form = document.getElementById('generate-form');
const mode = document.getElementById('mode');
const imageRow = document.getElementById('image-row');
function syncMode() { imageRow.hidden = mode.value !== 'image-to-video'; }
mode.addEventListener('change', syncMode);
syncMode();
for (const slider of document.querySelectorAll('input[type=range]')) {
  const out = document.getElementById(slider.id + '-value');
  slider.addEventListener('input', () => { out.textContent = slider.value; });
}
form.addEventListener('submit', () => {
  form.classList.add('busy');
  form.querySelector('button').disabled = true;
});
"#;

/// Render the full page.
pub fn render(view: &PageView<'_>) -> String {
    let input = view.input;
    let selected_mode = input.mode.parse::<GenerationMode>().unwrap_or_default();

    let mut html = String::new();
    html.push_str("<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n");
    html.push_str("<title>LongCat Video Generator</title>\n");
    let _ = write!(html, "<style>{}</style>\n</head>\n<body>\n", STYLE);
    html.push_str("<h1>Personal LongCat Video Generator</h1>\n");
    html.push_str(
        "<p>Generate videos with the open-source LongCat-Video model via the \
         <a href=\"https://fal.ai/models/fal-ai/longcat-video\">fal.ai</a> API. \
         Select a generation mode, describe your scene, adjust the parameters and click \
         <strong>Generate Video</strong>.</p>\n",
    );

    if !view.api_key_configured {
        html.push_str(
            "<div class=\"notice error\">Fal API key not found. Set the <code>FAL_KEY</code> \
             environment variable and restart the server. You can obtain a key by signing up \
             at fal.ai.</div>\n",
        );
    }

    if let Some(notice) = &view.notice {
        render_notice(&mut html, notice);
    }

    html.push_str(
        "<form id=\"generate-form\" method=\"post\" action=\"/generate\" \
         enctype=\"multipart/form-data\">\n",
    );

    html.push_str("<label for=\"mode\">Generation mode</label>\n<select id=\"mode\" name=\"mode\">\n");
    for mode in [GenerationMode::TextToVideo, GenerationMode::ImageToVideo] {
        let _ = writeln!(
            html,
            "<option value=\"{}\"{}>{}</option>",
            mode.as_str(),
            if mode == selected_mode { " selected" } else { "" },
            mode.label()
        );
    }
    html.push_str("</select>\n");

    let _ = writeln!(
        html,
        "<label for=\"prompt\">Prompt</label>\n<textarea id=\"prompt\" name=\"prompt\" rows=\"6\" \
         placeholder=\"Describe your video: scene, motion, camera angles, style...\">{}</textarea>",
        escape_html(&input.prompt)
    );
    let _ = writeln!(
        html,
        "<label for=\"negative_prompt\">Negative prompt <span class=\"hint\">(optional)</span></label>\n\
         <input type=\"text\" id=\"negative_prompt\" name=\"negative_prompt\" \
         placeholder=\"Elements to avoid, e.g. blurry, static, poor quality...\" value=\"{}\">",
        escape_html(&input.negative_prompt)
    );

    html.push_str("<h2>Generation parameters</h2>\n");
    slider(
        &mut html,
        "duration_secs",
        "Video length (seconds)",
        "Longer videos cost more credits and may be less consistent.",
        &MIN_DURATION_SECS.to_string(),
        &MAX_DURATION_SECS.to_string(),
        "1",
        &input.duration_secs,
    );
    slider(
        &mut html,
        "guidance_scale",
        "Guidance scale",
        "Higher values follow the prompt more closely but may reduce diversity.",
        &format!("{:.1}", MIN_GUIDANCE_SCALE),
        &format!("{:.1}", MAX_GUIDANCE_SCALE),
        &GUIDANCE_SCALE_STEP.to_string(),
        &input.guidance_scale,
    );
    slider(
        &mut html,
        "num_inference_steps",
        "Number of inference steps",
        "Higher steps improve quality but increase generation time.",
        &MIN_INFERENCE_STEPS.to_string(),
        &MAX_INFERENCE_STEPS.to_string(),
        "1",
        &input.num_inference_steps,
    );

    let accept = SUPPORTED_IMAGE_EXTENSIONS
        .iter()
        .map(|ext| format!(".{}", ext))
        .collect::<Vec<_>>()
        .join(",");
    let _ = writeln!(
        html,
        "<div id=\"image-row\">\n<label for=\"image\">Upload an image \
         <span class=\"hint\">(jpg/png/webp/gif/avif)</span></label>\n\
         <input type=\"file\" id=\"image\" name=\"image\" accept=\"{}\">\n</div>",
        accept
    );

    let _ = writeln!(
        html,
        "<button type=\"submit\"{}>Generate Video</button>",
        if view.api_key_configured { "" } else { " disabled" }
    );
    html.push_str(
        "<div id=\"spinner\">Generating video... this may take a few minutes.</div>\n</form>\n",
    );

    let _ = write!(html, "<script>{}</script>\n</body>\n</html>\n", SCRIPT);
    html
}

fn render_notice(html: &mut String, notice: &Notice) {
    match notice {
        Notice::Warning(message) => {
            let _ = writeln!(
                html,
                "<div class=\"notice warning\">{}</div>",
                escape_html(message)
            );
        }
        Notice::Error(message) => {
            let _ = writeln!(
                html,
                "<div class=\"notice error\">Generation failed: {}</div>",
                escape_html(message)
            );
        }
        Notice::Success { video_url } => {
            let url = escape_html(video_url);
            let _ = writeln!(
                html,
                "<div class=\"notice success\">Video generated successfully!</div>\n\
                 <video controls src=\"{url}\"></video>\n\
                 <p><a href=\"{url}\" download>Download video</a></p>"
            );
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn slider(
    html: &mut String,
    name: &str,
    label: &str,
    hint: &str,
    min: &str,
    max: &str,
    step: &str,
    value: &str,
) {
    let value = escape_html(value);
    let _ = writeln!(
        html,
        "<label for=\"{name}\">{label}: <output id=\"{name}-value\">{value}</output> \
         <span class=\"hint\">{hint}</span></label>\n\
         <input type=\"range\" id=\"{name}\" name=\"{name}\" min=\"{min}\" max=\"{max}\" \
         step=\"{step}\" value=\"{value}\">"
    );
}
