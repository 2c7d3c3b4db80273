//! fal.ai integration.
//!
//! Submits LongCat-Video generation requests to fal.ai's queue API and waits
//! for the resulting video URL.

mod client;

pub use client::{
    app_id, extract_video_url, image_data_uri, FalClient, FalError, FalSettings,
    GenerationStatus, QueueResponse, DEFAULT_GENERATION_TIMEOUT, DEFAULT_POLL_INTERVAL,
    DEFAULT_REQUEST_TIMEOUT, FAL_API_BASE_URL, FAL_API_KEY_ENV, IMAGE_TO_VIDEO_ENDPOINT,
    TEXT_TO_VIDEO_ENDPOINT,
};
