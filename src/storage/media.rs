//! Media storage for blog images
//!
//! Objects go to Cloudflare R2 in production and are served via the bucket's
//! Custom Domain. The local backend writes the same keys under a directory.

use aws_sdk_s3::Client as S3Client;
use std::path::{Component, Path, PathBuf};

use crate::config::{CloudflareConfig, MediaBackend, MediaStorageConfig};
use crate::error::AppError;

/// Largest accepted upload (10 MiB)
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Prefix for blog post images
pub const BLOG_IMAGE_PREFIX: &str = "blog-images";

enum Backend {
    R2 { client: S3Client, bucket: String },
    Local { root: PathBuf },
}

/// Media storage service
///
/// Uploads media and returns public URLs.
pub struct MediaStorage {
    backend: Backend,
    /// Public URL base (Custom Domain)
    /// e.g., "https://media.example.com"
    public_url: String,
}

/// Result of a stored upload
#[derive(Debug, Clone, serde::Serialize)]
pub struct StoredObject {
    pub key: String,
    pub url: String,
    pub size: usize,
    pub content_type: String,
}

impl MediaStorage {
    /// Create the storage backend selected in configuration
    ///
    /// # Errors
    /// Returns error if the backend is missing its settings
    pub async fn new(
        config: &MediaStorageConfig,
        cloudflare: Option<&CloudflareConfig>,
    ) -> Result<Self, AppError> {
        let backend = match config.backend {
            MediaBackend::R2 => {
                let cloudflare = cloudflare.ok_or_else(|| {
                    AppError::Config("cloudflare credentials are required for R2".to_string())
                })?;
                Backend::R2 {
                    client: r2_client(cloudflare),
                    bucket: config.bucket.clone(),
                }
            }
            MediaBackend::Local => {
                let root = config.local_dir.clone().ok_or_else(|| {
                    AppError::Config("storage.media.local_dir is not set".to_string())
                })?;
                tokio::fs::create_dir_all(&root)
                    .await
                    .map_err(|e| AppError::Storage(format!("cannot create media dir: {}", e)))?;
                Backend::Local { root }
            }
        };

        Ok(Self {
            backend,
            public_url: config.public_url.trim_end_matches('/').to_string(),
        })
    }

    /// Local storage rooted at `root`
    pub fn local(root: PathBuf, public_url: &str) -> Self {
        Self {
            backend: Backend::Local { root },
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Upload a media file
    ///
    /// # Returns
    /// Public URL for the uploaded file
    pub async fn upload(
        &self,
        key: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<String, AppError> {
        match &self.backend {
            Backend::R2 { client, bucket } => {
                use aws_sdk_s3::primitives::ByteStream;

                client
                    .put_object()
                    .bucket(bucket)
                    .key(key)
                    .body(ByteStream::from(data))
                    .content_type(content_type)
                    .cache_control("public, max-age=31536000") // 1 year
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("R2 upload failed: {}", e)))?;
            }
            Backend::Local { root } => {
                let path = local_path(root, key)?;
                if let Some(parent) = path.parent() {
                    tokio::fs::create_dir_all(parent)
                        .await
                        .map_err(|e| AppError::Storage(format!("local upload failed: {}", e)))?;
                }
                tokio::fs::write(&path, data)
                    .await
                    .map_err(|e| AppError::Storage(format!("local upload failed: {}", e)))?;
            }
        }

        Ok(self.get_public_url(key))
    }

    /// Store a blog image under `blog-images/{unix_millis}-{filename}`
    ///
    /// Only `image/*` content types up to [`MAX_IMAGE_BYTES`] are accepted.
    pub async fn upload_blog_image(
        &self,
        filename: &str,
        data: Vec<u8>,
        content_type: &str,
    ) -> Result<StoredObject, AppError> {
        use crate::metrics::{MEDIA_BYTES_UPLOADED, MEDIA_UPLOADS_TOTAL};

        if !content_type.starts_with("image/") {
            return Err(AppError::Validation(format!(
                "only image uploads are allowed, got {content_type}"
            )));
        }
        if data.is_empty() {
            return Err(AppError::Validation("uploaded file is empty".to_string()));
        }
        if data.len() > MAX_IMAGE_BYTES {
            return Err(AppError::Validation(format!(
                "file exceeds maximum size of {} bytes",
                MAX_IMAGE_BYTES
            )));
        }

        let key = blog_image_key(chrono::Utc::now().timestamp_millis(), filename);
        let size = data.len();
        let url = self.upload(&key, data, content_type).await?;

        MEDIA_UPLOADS_TOTAL.inc();
        MEDIA_BYTES_UPLOADED.inc_by(size as f64);
        tracing::info!(key = %key, size, "Stored blog image");

        Ok(StoredObject {
            key,
            url,
            size,
            content_type: content_type.to_string(),
        })
    }

    /// Delete a media file
    pub async fn delete(&self, key: &str) -> Result<(), AppError> {
        match &self.backend {
            Backend::R2 { client, bucket } => {
                client
                    .delete_object()
                    .bucket(bucket)
                    .key(key)
                    .send()
                    .await
                    .map_err(|e| AppError::Storage(format!("R2 delete failed: {}", e)))?;
            }
            Backend::Local { root } => {
                let path = local_path(root, key)?;
                match tokio::fs::remove_file(&path).await {
                    Ok(()) => {}
                    Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                    Err(e) => {
                        return Err(AppError::Storage(format!("local delete failed: {}", e)));
                    }
                }
            }
        }

        Ok(())
    }

    /// Get public URL for a key
    pub fn get_public_url(&self, key: &str) -> String {
        format!("{}/{}", self.public_url, key)
    }
}

fn r2_client(cloudflare: &CloudflareConfig) -> S3Client {
    use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};

    // R2 endpoint: https://{account_id}.r2.cloudflarestorage.com
    let endpoint = format!("https://{}.r2.cloudflarestorage.com", cloudflare.account_id);

    let credentials = Credentials::new(
        &cloudflare.r2_access_key_id,
        &cloudflare.r2_secret_access_key,
        None,
        None,
        "toolhub-r2",
    );

    let s3_config = aws_sdk_s3::Config::builder()
        .behavior_version(BehaviorVersion::latest())
        .region(Region::new("auto"))
        .endpoint_url(&endpoint)
        .credentials_provider(credentials)
        .http_client(super::build_r2_http_client())
        .build();

    S3Client::from_conf(s3_config)
}

/// Resolve a key below the local root, refusing anything that escapes it
fn local_path(root: &Path, key: &str) -> Result<PathBuf, AppError> {
    let relative = Path::new(key);
    let safe = relative
        .components()
        .all(|component| matches!(component, Component::Normal(_)));
    if !safe || key.is_empty() {
        return Err(AppError::Validation(format!("invalid object key: {key}")));
    }
    Ok(root.join(relative))
}

/// Reduce a client-supplied filename to `[A-Za-z0-9._-]`
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(filename);
    let cleaned: String = base
        .chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || matches!(ch, '.' | '_' | '-') {
                ch
            } else {
                '_'
            }
        })
        .collect();
    let cleaned = cleaned.trim_start_matches('.');

    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

pub fn blog_image_key(unix_millis: i64, filename: &str) -> String {
    format!(
        "{}/{}-{}",
        BLOG_IMAGE_PREFIX,
        unix_millis,
        sanitize_filename(filename)
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_filename_keeps_safe_characters() {
        assert_eq!(sanitize_filename("hero shot (1).PNG"), "hero_shot__1_.PNG");
        assert_eq!(sanitize_filename("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_filename("C:\\pics\\cat.jpg"), "cat.jpg");
        assert_eq!(sanitize_filename("..."), "image");
    }

    #[test]
    fn blog_image_key_uses_prefix_and_timestamp() {
        assert_eq!(
            blog_image_key(1_700_000_000_123, "my photo.jpg"),
            "blog-images/1700000000123-my_photo.jpg"
        );
    }

    #[test]
    fn local_path_rejects_traversal() {
        let root = Path::new("/srv/media");
        assert!(local_path(root, "blog-images/a.png").is_ok());
        assert!(local_path(root, "../secret").is_err());
        assert!(local_path(root, "/abs/path").is_err());
    }

    #[tokio::test]
    async fn local_backend_stores_and_deletes_images() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::local(dir.path().to_path_buf(), "http://localhost/media/");

        let stored = storage
            .upload_blog_image("cover.png", vec![1, 2, 3], "image/png")
            .await
            .unwrap();

        assert!(stored.key.starts_with("blog-images/"));
        assert!(stored.key.ends_with("-cover.png"));
        assert_eq!(stored.url, format!("http://localhost/media/{}", stored.key));
        assert_eq!(std::fs::read(dir.path().join(&stored.key)).unwrap(), vec![1, 2, 3]);

        storage.delete(&stored.key).await.unwrap();
        assert!(!dir.path().join(&stored.key).exists());
    }

    #[tokio::test]
    async fn rejects_non_image_uploads() {
        let dir = tempfile::tempdir().unwrap();
        let storage = MediaStorage::local(dir.path().to_path_buf(), "http://localhost/media");

        let result = storage
            .upload_blog_image("notes.txt", b"hello".to_vec(), "text/plain")
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }
}
