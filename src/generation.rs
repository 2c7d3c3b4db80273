//! Generation request model and form validation.
//!
//! A [`GenerationRequest`] is built from the raw values of a submitted form,
//! checked against the bounds the UI sliders advertise, and then turned into
//! the argument object the video endpoint expects.

use std::fmt;
use std::str::FromStr;

use serde::Serialize;

/// Output frame rate of the LongCat-Video endpoints.
pub const FPS: u32 = 30;

/// Minimum video length in seconds.
pub const MIN_DURATION_SECS: u32 = 3;
/// Maximum video length in seconds.
pub const MAX_DURATION_SECS: u32 = 20;
/// Default video length in seconds.
pub const DEFAULT_DURATION_SECS: u32 = 6;

pub const MIN_GUIDANCE_SCALE: f32 = 1.0;
pub const MAX_GUIDANCE_SCALE: f32 = 10.0;
pub const DEFAULT_GUIDANCE_SCALE: f32 = 4.0;
/// Guidance scale slider increment.
pub const GUIDANCE_SCALE_STEP: f32 = 0.5;

pub const MIN_INFERENCE_STEPS: u32 = 8;
pub const MAX_INFERENCE_STEPS: u32 = 50;
pub const DEFAULT_INFERENCE_STEPS: u32 = 40;

/// File extensions accepted for the source image.
pub const SUPPORTED_IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "gif", "avif"];

/// Which endpoint a request targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum GenerationMode {
    #[default]
    TextToVideo,
    ImageToVideo,
}

impl GenerationMode {
    /// Form value used by the mode selector.
    pub fn as_str(&self) -> &'static str {
        match self {
            GenerationMode::TextToVideo => "text-to-video",
            GenerationMode::ImageToVideo => "image-to-video",
        }
    }

    /// Human-readable label.
    pub fn label(&self) -> &'static str {
        match self {
            GenerationMode::TextToVideo => "Text-to-Video",
            GenerationMode::ImageToVideo => "Image-to-Video",
        }
    }
}

impl fmt::Display for GenerationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GenerationMode {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "text-to-video" | "text" | "t2v" => Ok(GenerationMode::TextToVideo),
            "image-to-video" | "image" | "i2v" => Ok(GenerationMode::ImageToVideo),
            other => Err(ValidationError::UnknownMode(other.to_string())),
        }
    }
}

/// An uploaded source image for image-to-video generation.
#[derive(Clone, PartialEq)]
pub struct SourceImage {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

// Keep the raw bytes out of log output.
impl fmt::Debug for SourceImage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SourceImage")
            .field("file_name", &self.file_name)
            .field("content_type", &self.content_type)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl SourceImage {
    /// Build a source image from an upload, deriving the MIME type from the
    /// file extension.
    pub fn from_upload(file_name: &str, bytes: Vec<u8>) -> Result<Self, ValidationError> {
        let content_type = mime_for_file_name(file_name)
            .ok_or_else(|| ValidationError::UnsupportedImage(file_name.to_string()))?;
        if bytes.is_empty() {
            return Err(ValidationError::EmptyImage);
        }
        Ok(Self {
            file_name: file_name.to_string(),
            content_type: content_type.to_string(),
            bytes,
        })
    }
}

/// Map a file name to an image MIME type by extension.
pub fn mime_for_file_name(file_name: &str) -> Option<&'static str> {
    let ext = file_name.rsplit_once('.')?.1.to_lowercase();
    match ext.as_str() {
        "jpg" | "jpeg" => Some("image/jpeg"),
        "png" => Some("image/png"),
        "webp" => Some("image/webp"),
        "gif" => Some("image/gif"),
        "avif" => Some("image/avif"),
        _ => None,
    }
}

/// A file part as received, before any checks.
#[derive(Clone, PartialEq)]
pub struct Upload {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

impl fmt::Debug for Upload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Upload")
            .field("file_name", &self.file_name)
            .field("len", &self.bytes.len())
            .finish()
    }
}

impl Upload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            bytes,
        }
    }
}

/// Raw form values, kept as submitted so the form can be re-rendered.
#[derive(Debug, Clone, PartialEq)]
pub struct FormInput {
    pub mode: String,
    pub prompt: String,
    pub negative_prompt: String,
    pub duration_secs: String,
    pub guidance_scale: String,
    pub num_inference_steps: String,
    pub image: Option<Upload>,
}

impl Default for FormInput {
    fn default() -> Self {
        Self {
            mode: GenerationMode::default().as_str().to_string(),
            prompt: String::new(),
            negative_prompt: String::new(),
            duration_secs: DEFAULT_DURATION_SECS.to_string(),
            guidance_scale: format!("{:.1}", DEFAULT_GUIDANCE_SCALE),
            num_inference_steps: DEFAULT_INFERENCE_STEPS.to_string(),
            image: None,
        }
    }
}

/// A validated generation request.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub mode: GenerationMode,
    pub prompt: String,
    pub negative_prompt: Option<String>,
    pub image: Option<SourceImage>,
    pub duration_secs: u32,
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
}

/// Arguments sent to the LongCat-Video endpoint.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VideoArguments {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub prompt: String,
    pub num_frames: u32,
    pub guidance_scale: f32,
    pub num_inference_steps: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub negative_prompt: Option<String>,
    pub fps: u32,
}

impl GenerationRequest {
    /// Validate raw form values.
    ///
    /// Nothing is sent to the vendor unless this returns `Ok`.
    pub fn validate(input: &FormInput) -> Result<Self, ValidationError> {
        let mode: GenerationMode = input.mode.parse()?;

        if input.prompt.trim().is_empty() {
            return Err(ValidationError::EmptyPrompt);
        }

        let duration_secs = parse_field::<u32>("duration", &input.duration_secs)?;
        if !(MIN_DURATION_SECS..=MAX_DURATION_SECS).contains(&duration_secs) {
            return Err(ValidationError::OutOfRange {
                field: "duration",
                min: MIN_DURATION_SECS.to_string(),
                max: MAX_DURATION_SECS.to_string(),
            });
        }

        let guidance_scale = parse_field::<f32>("guidance scale", &input.guidance_scale)?;
        if !(MIN_GUIDANCE_SCALE..=MAX_GUIDANCE_SCALE).contains(&guidance_scale) {
            return Err(ValidationError::OutOfRange {
                field: "guidance scale",
                min: format!("{:.1}", MIN_GUIDANCE_SCALE),
                max: format!("{:.1}", MAX_GUIDANCE_SCALE),
            });
        }
        if (guidance_scale / GUIDANCE_SCALE_STEP).fract() != 0.0 {
            return Err(ValidationError::OffStep {
                field: "guidance scale",
                step: format!("{}", GUIDANCE_SCALE_STEP),
            });
        }

        let num_inference_steps =
            parse_field::<u32>("inference steps", &input.num_inference_steps)?;
        if !(MIN_INFERENCE_STEPS..=MAX_INFERENCE_STEPS).contains(&num_inference_steps) {
            return Err(ValidationError::OutOfRange {
                field: "inference steps",
                min: MIN_INFERENCE_STEPS.to_string(),
                max: MAX_INFERENCE_STEPS.to_string(),
            });
        }

        // Images submitted in text mode are ignored.
        let image = match mode {
            GenerationMode::TextToVideo => None,
            GenerationMode::ImageToVideo => {
                let upload = input.image.as_ref().ok_or(ValidationError::MissingImage)?;
                Some(SourceImage::from_upload(
                    &upload.file_name,
                    upload.bytes.clone(),
                )?)
            }
        };

        // Blank means unset; anything else is sent as typed.
        let negative_prompt = Some(&input.negative_prompt)
            .filter(|s| !s.trim().is_empty())
            .cloned();

        Ok(Self {
            mode,
            prompt: input.prompt.clone(),
            negative_prompt,
            image,
            duration_secs,
            guidance_scale,
            num_inference_steps,
        })
    }

    /// Total frames to generate at [`FPS`].
    pub fn num_frames(&self) -> u32 {
        self.duration_secs * FPS
    }

    /// Build the endpoint arguments. `image_url` is only included in
    /// image-to-video mode.
    pub fn to_payload(&self, image_url: Option<String>) -> VideoArguments {
        VideoArguments {
            image_url: match self.mode {
                GenerationMode::ImageToVideo => image_url,
                GenerationMode::TextToVideo => None,
            },
            prompt: self.prompt.clone(),
            num_frames: self.num_frames(),
            guidance_scale: self.guidance_scale,
            num_inference_steps: self.num_inference_steps,
            negative_prompt: self.negative_prompt.clone(),
            fps: FPS,
        }
    }
}

fn parse_field<T: FromStr>(field: &'static str, raw: &str) -> Result<T, ValidationError> {
    raw.trim()
        .parse::<T>()
        .map_err(|_| ValidationError::InvalidNumber {
            field,
            value: raw.to_string(),
        })
}

/// Reasons a submission is rejected before any API call.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ValidationError {
    #[error("Please enter a prompt to guide the video generation.")]
    EmptyPrompt,

    #[error("Please upload an image to animate.")]
    MissingImage,

    #[error("The uploaded image is empty.")]
    EmptyImage,

    #[error("Unsupported image '{0}'. Upload a jpg, png, webp, gif or avif file.")]
    UnsupportedImage(String),

    #[error("Unknown generation mode '{0}'.")]
    UnknownMode(String),

    #[error("'{value}' is not a valid {field}.")]
    InvalidNumber { field: &'static str, value: String },

    #[error("The {field} must be between {min} and {max}.")]
    OutOfRange {
        field: &'static str,
        min: String,
        max: String,
    },

    #[error("The {field} must be a multiple of {step}.")]
    OffStep { field: &'static str, step: String },
}
