//! Object storage for portfolio assets.
//!
//! Assets are pushed over plain HTTP with AWS Signature Version 4, which
//! keeps the store compatible with S3 itself as well as MinIO and Garage.

use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use async_trait::async_trait;
use chrono::Utc;
use hmac::{Hmac, Mac};
use sha2::{Digest, Sha256};

use crate::config::S3 as S3Config;

const ACCESS_KEY_VAR: &str = "S3_ACCESS_KEY_ID";
const SECRET_KEY_VAR: &str = "S3_SECRET_ACCESS_KEY";

type HmacSha256 = Hmac<Sha256>;

#[derive(thiserror::Error, Debug)]
pub enum StorageError {
    #[error("missing {0} environment variable")]
    MissingCredentials(&'static str),

    #[error("request signing failed")]
    Signing,

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("store rejected object with status {0}")]
    Rejected(u16),
}

/// Write access to an object store.
///
/// Implementations return the public URL of the stored object.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError>;
}

/// Build an object key under `folder` from the uploaded file name.
///
/// Only the extension of the original name is kept; the rest is replaced
/// with the upload timestamp so client-chosen names never reach the store.
pub fn object_key(folder: &str, filename: &str) -> String {
    let millis = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis();

    match Path::new(filename).extension().and_then(|ext| ext.to_str()) {
        Some(ext) => format!("{folder}/{millis}.{ext}"),
        None => format!("{folder}/{millis}"),
    }
}

/// S3-compatible store speaking SigV4 over HTTPS.
pub struct S3Store {
    region: String,
    bucket: String,
    endpoint: Option<String>,
    access_key: String,
    secret_key: String,
    client: reqwest::Client,
}

impl S3Store {
    /// Create a store from configuration; credentials come from the
    /// environment.
    pub fn new(config: &S3Config) -> Result<Self, StorageError> {
        let access_key = std::env::var(ACCESS_KEY_VAR)
            .map_err(|_| StorageError::MissingCredentials(ACCESS_KEY_VAR))?;
        let secret_key = std::env::var(SECRET_KEY_VAR)
            .map_err(|_| StorageError::MissingCredentials(SECRET_KEY_VAR))?;

        Ok(Self {
            region: config.region.clone(),
            bucket: config.bucket.clone(),
            endpoint: config.endpoint.clone(),
            access_key,
            secret_key,
            client: reqwest::Client::new(),
        })
    }

    /// Host, canonical URI and full URL for `key`.
    ///
    /// AWS uses virtual-hosted addressing; custom endpoints (MinIO, Garage)
    /// get path-style addressing instead.
    fn locate(&self, key: &str) -> (String, String, String) {
        match &self.endpoint {
            Some(endpoint) => {
                let host = endpoint
                    .trim_start_matches("https://")
                    .trim_start_matches("http://")
                    .trim_end_matches('/')
                    .to_owned();
                let uri = format!("/{}/{}", self.bucket, key);
                let url = format!(
                    "{}{}",
                    endpoint.trim_end_matches('/'),
                    uri
                );
                (host, uri, url)
            },
            None => {
                let host = format!(
                    "{}.s3.{}.amazonaws.com",
                    self.bucket, self.region
                );
                let uri = format!("/{key}");
                let url = format!("https://{host}{uri}");
                (host, uri, url)
            },
        }
    }
}

fn hmac_sha256(key: &[u8], data: &[u8]) -> Result<Vec<u8>, StorageError> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| StorageError::Signing)?;
    mac.update(data);
    Ok(mac.finalize().into_bytes().to_vec())
}

fn sha256_hex(data: &[u8]) -> String {
    hex::encode(Sha256::digest(data))
}

/// Derive the SigV4 signing key for a given day, region and service.
fn signing_key(
    secret: &str,
    date: &str,
    region: &str,
    service: &str,
) -> Result<Vec<u8>, StorageError> {
    let key = hmac_sha256(format!("AWS4{secret}").as_bytes(), date.as_bytes())?;
    let key = hmac_sha256(&key, region.as_bytes())?;
    let key = hmac_sha256(&key, service.as_bytes())?;
    hmac_sha256(&key, b"aws4_request")
}

#[async_trait]
impl ObjectStore for S3Store {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        let (host, uri, url) = self.locate(key);

        let now = Utc::now();
        let amz_date = now.format("%Y%m%dT%H%M%SZ").to_string();
        let date = now.format("%Y%m%d").to_string();
        let payload_hash = sha256_hex(&bytes);

        // Keys only contain unreserved characters, so the canonical URI
        // needs no extra percent-encoding.
        let canonical_request = format!(
            "PUT\n{uri}\n\nhost:{host}\nx-amz-content-sha256:{payload_hash}\nx-amz-date:{amz_date}\n\nhost;x-amz-content-sha256;x-amz-date\n{payload_hash}"
        );
        let scope = format!("{date}/{}/s3/aws4_request", self.region);
        let string_to_sign = format!(
            "AWS4-HMAC-SHA256\n{amz_date}\n{scope}\n{}",
            sha256_hex(canonical_request.as_bytes())
        );

        let key_bytes =
            signing_key(&self.secret_key, &date, &self.region, "s3")?;
        let signature =
            hex::encode(hmac_sha256(&key_bytes, string_to_sign.as_bytes())?);
        let authorization = format!(
            "AWS4-HMAC-SHA256 Credential={}/{scope}, SignedHeaders=host;x-amz-content-sha256;x-amz-date, Signature={signature}",
            self.access_key
        );

        let response = self
            .client
            .put(&url)
            .header("Host", &host)
            .header("Authorization", authorization)
            .header("Content-Type", content_type)
            .header("x-amz-content-sha256", payload_hash)
            .header("x-amz-date", amz_date)
            .body(bytes)
            .send()
            .await?;

        if !response.status().is_success() {
            tracing::warn!(
                status = response.status().as_u16(),
                %url,
                "object store rejected upload"
            );
            return Err(StorageError::Rejected(response.status().as_u16()));
        }

        Ok(url)
    }
}

/// In-memory store used by handler tests.
#[cfg(test)]
#[derive(Default)]
pub struct MemoryStore {
    pub objects: std::sync::Mutex<
        std::collections::HashMap<String, (String, Vec<u8>)>,
    >,
}

#[cfg(test)]
#[async_trait]
impl ObjectStore for MemoryStore {
    async fn put(
        &self,
        key: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<String, StorageError> {
        self.objects
            .lock()
            .unwrap()
            .insert(key.to_owned(), (content_type.to_owned(), bytes));
        Ok(format!("memory://{key}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Signing-key example from the AWS SigV4 documentation.
    #[test]
    fn test_signing_key_known_vector() {
        let key = signing_key(
            "wJalrXUtnFEMI/K7MDENG+bPxRfiCYEXAMPLEKEY",
            "20150830",
            "us-east-1",
            "iam",
        )
        .unwrap();

        assert_eq!(
            hex::encode(key),
            "c4afb1cc5771d871763a393e44b703571b55cc28424d1a5e86da6ed3c154a4b9"
        );
    }

    #[test]
    fn test_object_key_keeps_extension_only() {
        let key = object_key("profile-images", "me; rm -rf.PNG");
        let (folder, file) = key.split_once('/').unwrap();
        assert_eq!(folder, "profile-images");
        assert!(file.ends_with(".PNG"));
        assert!(file.trim_end_matches(".PNG").parse::<u128>().is_ok());

        let bare = object_key("resumes", "no-extension");
        assert!(bare.split_once('/').unwrap().1.parse::<u128>().is_ok());
    }

    #[tokio::test]
    async fn test_memory_store_put() {
        let store = MemoryStore::default();
        let url = store
            .put("resumes/1.pdf", "application/pdf", b"%PDF-1.4".to_vec())
            .await
            .unwrap();

        assert_eq!(url, "memory://resumes/1.pdf");
        let objects = store.objects.lock().unwrap();
        let (content_type, bytes) = objects.get("resumes/1.pdf").unwrap();
        assert_eq!(content_type, "application/pdf");
        assert_eq!(bytes, b"%PDF-1.4");
    }
}
