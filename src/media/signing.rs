use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum MediaError {
    #[error("invalid object name")]
    InvalidObjectName,

    #[error("link expired")]
    Expired,

    #[error("invalid signature")]
    InvalidSignature,

    #[error("object not found")]
    NotFound,
}

/// Signs and verifies attachment presentation URLs
///
/// URL format: `{base}/media/{object}?expires={unix}&signature={hex}`, the
/// signature being HMAC-SHA256 over `"{object}:{expires}"`.
#[derive(Clone)]
pub struct UrlSigner {
    secret: Vec<u8>,
    public_base_url: String,
}

impl UrlSigner {
    pub fn new(secret: &str, public_base_url: &str) -> Self {
        Self {
            secret: secret.as_bytes().to_vec(),
            public_base_url: public_base_url.trim_end_matches('/').to_string(),
        }
    }

    fn mac(&self, object_name: &str, expires: i64) -> HmacSha256 {
        let mut mac =
            HmacSha256::new_from_slice(&self.secret).expect("HMAC can take key of any size");
        mac.update(object_name.as_bytes());
        mac.update(b":");
        mac.update(expires.to_string().as_bytes());
        mac
    }

    pub fn sign(&self, object_name: &str, expires: i64) -> String {
        hex::encode(self.mac(object_name, expires).finalize().into_bytes())
    }

    pub fn url_for(&self, object_name: &str, expires_at: DateTime<Utc>) -> String {
        let expires = expires_at.timestamp();
        format!(
            "{}/media/{}?expires={}&signature={}",
            self.public_base_url,
            object_name,
            expires,
            self.sign(object_name, expires)
        )
    }

    /// Check a presented `(object, expires, signature)` triple at time `now`
    pub fn verify(
        &self,
        object_name: &str,
        expires: i64,
        signature: &str,
        now: DateTime<Utc>,
    ) -> Result<(), MediaError> {
        if !crate::utils::is_valid_object_name(object_name) {
            return Err(MediaError::InvalidObjectName);
        }

        let provided = hex::decode(signature).map_err(|_| MediaError::InvalidSignature)?;
        // Constant-time comparison
        self.mac(object_name, expires)
            .verify_slice(&provided)
            .map_err(|_| MediaError::InvalidSignature)?;

        if now.timestamp() > expires {
            return Err(MediaError::Expired);
        }
        Ok(())
    }
}
