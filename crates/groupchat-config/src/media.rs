// ============================================================================
// Media (attachment) Configuration
// ============================================================================

use crate::constants::*;
use anyhow::Result;
use std::path::PathBuf;

/// What happens to a create request when one of its attachments fails to upload
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AttachmentFailurePolicy {
    /// Drop the failed attachment, persist the message with the rest
    BestEffort,
    /// Reject the whole create request
    AllOrNothing,
}

impl std::str::FromStr for AttachmentFailurePolicy {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "best_effort" => Ok(Self::BestEffort),
            "all_or_nothing" => Ok(Self::AllOrNothing),
            _ => anyhow::bail!(
                "Invalid attachment failure policy: {}. Must be 'best_effort' or 'all_or_nothing'",
                s
            ),
        }
    }
}

/// Attachment storage and presentation URL configuration
#[derive(Clone, Debug)]
pub struct MediaConfig {
    /// Directory where attachment objects are stored
    pub data_dir: PathBuf,
    /// Public base URL used to build presentation URLs (no trailing slash)
    pub public_base_url: String,
    /// Secret for signing presentation URLs
    pub url_signing_secret: String,
    /// Validity window of a presentation URL (seconds)
    pub url_ttl_secs: u64,
    /// Attachment upload failure policy
    pub failure_policy: AttachmentFailurePolicy,
}

impl MediaConfig {
    pub(crate) fn from_env() -> Result<Self> {
        let url_signing_secret = std::env::var("MEDIA_URL_SIGNING_SECRET")
            .map_err(|_| anyhow::anyhow!("MEDIA_URL_SIGNING_SECRET is required"))?;
        if url_signing_secret.len() < MIN_SIGNING_SECRET_LEN {
            anyhow::bail!(
                "MEDIA_URL_SIGNING_SECRET must be at least {} characters",
                MIN_SIGNING_SECRET_LEN
            );
        }

        let failure_policy = match std::env::var("ATTACHMENT_FAILURE_POLICY") {
            Ok(v) => v.parse()?,
            Err(_) => AttachmentFailurePolicy::BestEffort,
        };

        Ok(Self {
            data_dir: PathBuf::from(
                std::env::var("MEDIA_DATA_DIR")
                    .unwrap_or_else(|_| DEFAULT_MEDIA_DATA_DIR.to_string()),
            ),
            public_base_url: std::env::var("MEDIA_PUBLIC_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_MEDIA_PUBLIC_BASE_URL.to_string())
                .trim_end_matches('/')
                .to_string(),
            url_signing_secret,
            url_ttl_secs: std::env::var("MEDIA_URL_TTL_SECS")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MEDIA_URL_TTL_SECS),
            failure_policy,
        })
    }
}
