//! Product image storage.
//!
//! Images are uploaded to Firebase Storage under
//! `products/{product_id}/{unix_millis}.{ext}` and their download URLs are
//! appended to the product document's `images` field.

use async_trait::async_trait;
use chrono::Utc;
use serde::Deserialize;
use serde_json::{Value, json};
use thiserror::Error;

use kinniku_core::ProductId;

use crate::config::FirebaseConfig;
use crate::db::{DocumentStore, RepositoryError, collections, to_fields};

/// Largest accepted image, in bytes.
pub const MAX_IMAGE_BYTES: usize = 10 * 1024 * 1024;

/// Most images a product may have.
pub const MAX_IMAGES: usize = 5;

/// Errors that can occur while storing images.
#[derive(Debug, Error)]
pub enum StorageError {
    /// No storage bucket is configured.
    #[error("blob storage is not configured")]
    NotConfigured,

    /// The file exceeds [`MAX_IMAGE_BYTES`].
    #[error("file is {size} bytes; the limit is {max} bytes")]
    TooLarge { size: usize, max: usize },

    /// The file is not a JPEG, PNG, GIF or WebP image.
    #[error("unsupported content type: {0}")]
    UnsupportedType(String),

    /// The upload would exceed [`MAX_IMAGES`].
    #[error("a product can have at most {max} images")]
    TooManyImages { max: usize },

    /// The product does not exist.
    #[error("product not found")]
    ProductNotFound,

    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Storage API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// The product document could not be read or written.
    #[error("product store error: {0}")]
    Repository(#[from] RepositoryError),
}

/// Accepted image formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageKind {
    Jpeg,
    Png,
    Gif,
    Webp,
}

impl ImageKind {
    /// Match a MIME type.
    #[must_use]
    pub fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "image/jpeg" | "image/jpg" => Some(Self::Jpeg),
            "image/png" => Some(Self::Png),
            "image/gif" => Some(Self::Gif),
            "image/webp" => Some(Self::Webp),
            _ => None,
        }
    }

    #[must_use]
    pub const fn content_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Gif => "image/gif",
            Self::Webp => "image/webp",
        }
    }

    #[must_use]
    pub const fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Gif => "gif",
            Self::Webp => "webp",
        }
    }
}

/// Check one upload against the size and format limits.
///
/// # Errors
///
/// Returns `StorageError::TooLarge` or `StorageError::UnsupportedType`.
pub fn validate_image(content_type: &str, size: usize) -> Result<ImageKind, StorageError> {
    if size > MAX_IMAGE_BYTES {
        return Err(StorageError::TooLarge {
            size,
            max: MAX_IMAGE_BYTES,
        });
    }
    ImageKind::from_content_type(content_type)
        .ok_or_else(|| StorageError::UnsupportedType(content_type.to_string()))
}

/// Object path for a product image.
#[must_use]
pub fn product_image_path(product_id: &ProductId, kind: ImageKind, unix_millis: i64) -> String {
    format!("products/{product_id}/{unix_millis}.{}", kind.extension())
}

/// Blob storage boundary.
#[async_trait]
pub trait BlobStorage: Send + Sync {
    /// Store `bytes` at `path` and return a public download URL.
    ///
    /// `id_token` is the signed-in operator's provider token.
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        id_token: &str,
    ) -> Result<String, StorageError>;
}

// =============================================================================
// Firebase Storage
// =============================================================================

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct UploadResponse {
    download_tokens: Option<String>,
}

/// Firebase Storage REST client.
#[derive(Clone)]
pub struct FirebaseStorageClient {
    client: reqwest::Client,
    endpoint: String,
    bucket: String,
}

impl FirebaseStorageClient {
    /// Create a client, or `None` when no bucket is configured.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &FirebaseConfig) -> Result<Option<Self>, StorageError> {
        let Some(bucket) = config.storage_bucket.clone() else {
            return Ok(None);
        };
        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()?;

        Ok(Some(Self {
            client,
            endpoint: config.storage_endpoint.clone(),
            bucket,
        }))
    }

    fn object_url(&self, path: &str) -> String {
        format!(
            "{}/v0/b/{}/o/{}",
            self.endpoint,
            self.bucket,
            urlencoding::encode(path)
        )
    }
}

#[async_trait]
impl BlobStorage for FirebaseStorageClient {
    async fn upload(
        &self,
        path: &str,
        bytes: Vec<u8>,
        content_type: &str,
        id_token: &str,
    ) -> Result<String, StorageError> {
        let url = format!(
            "{}/v0/b/{}/o?name={}",
            self.endpoint,
            self.bucket,
            urlencoding::encode(path)
        );
        let response = self
            .client
            .post(&url)
            .header("Authorization", format!("Firebase {id_token}"))
            .header("Content-Type", content_type)
            .body(bytes)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            tracing::error!(status = %status, path = %path, "Storage upload failed");
            return Err(StorageError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: UploadResponse = response.json().await?;
        let mut download_url = format!("{}?alt=media", self.object_url(path));
        if let Some(token) = body
            .download_tokens
            .as_deref()
            .and_then(|t| t.split(',').next())
            .filter(|t| !t.is_empty())
        {
            download_url.push_str("&token=");
            download_url.push_str(token);
        }

        tracing::info!(path = %path, "Uploaded object");
        Ok(download_url)
    }
}

// =============================================================================
// Product images
// =============================================================================

/// An image received from the operator.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub content_type: String,
    pub bytes: Vec<u8>,
}

/// Attaches uploaded images to product documents.
pub struct ProductImages<'a> {
    store: &'a dyn DocumentStore,
    storage: &'a dyn BlobStorage,
}

impl<'a> ProductImages<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, storage: &'a dyn BlobStorage) -> Self {
        Self { store, storage }
    }

    /// Validate, upload and append images to a product.
    ///
    /// Every file is validated before anything is uploaded. Returns the
    /// product's full image list.
    ///
    /// # Errors
    ///
    /// - `StorageError::ProductNotFound` if the product does not exist
    /// - `StorageError::TooManyImages` if the product would exceed [`MAX_IMAGES`]
    /// - `StorageError::TooLarge` / `StorageError::UnsupportedType` for a bad file
    /// - `StorageError::Api` / `StorageError::Http` if an upload fails
    pub async fn attach(
        &self,
        product_id: &ProductId,
        uploads: Vec<ImageUpload>,
        id_token: &str,
    ) -> Result<Vec<String>, StorageError> {
        let product = self
            .store
            .get_by_id(collections::PRODUCTS, product_id.as_str())
            .await?
            .ok_or(StorageError::ProductNotFound)?;

        let mut images: Vec<String> = product
            .fields
            .get("images")
            .and_then(Value::as_array)
            .map(|urls| {
                urls.iter()
                    .filter_map(Value::as_str)
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if images.len() + uploads.len() > MAX_IMAGES {
            return Err(StorageError::TooManyImages { max: MAX_IMAGES });
        }

        let kinds = uploads
            .iter()
            .map(|u| validate_image(&u.content_type, u.bytes.len()))
            .collect::<Result<Vec<_>, _>>()?;

        let mut last_millis = 0;
        for (upload, kind) in uploads.into_iter().zip(kinds) {
            // Keep names unique when several files land in the same millisecond
            let millis = Utc::now().timestamp_millis().max(last_millis + 1);
            last_millis = millis;
            let path = product_image_path(product_id, kind, millis);

            let url = self
                .storage
                .upload(&path, upload.bytes, kind.content_type(), id_token)
                .await?;
            images.push(url);
        }

        let fields = to_fields(&json!({
            "images": images,
            "updatedAt": Utc::now(),
        }))?;
        self.store
            .upsert(collections::PRODUCTS, product_id.as_str(), fields)
            .await?;

        tracing::info!(product_id = %product_id, count = images.len(), "Product images updated");
        Ok(images)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use std::sync::Mutex;

    use super::*;
    use crate::db::MemoryDocumentStore;

    #[derive(Default)]
    struct FakeStorage {
        paths: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl BlobStorage for FakeStorage {
        async fn upload(
            &self,
            path: &str,
            _bytes: Vec<u8>,
            _content_type: &str,
            _id_token: &str,
        ) -> Result<String, StorageError> {
            self.paths.lock().unwrap().push(path.to_string());
            Ok(format!(
                "https://storage.test/o/{}?alt=media",
                urlencoding::encode(path)
            ))
        }
    }

    fn png(size: usize) -> ImageUpload {
        ImageUpload {
            content_type: "image/png".to_string(),
            bytes: vec![0; size],
        }
    }

    async fn store_with_product(images: usize) -> MemoryDocumentStore {
        let store = MemoryDocumentStore::new();
        let urls: Vec<String> = (0..images).map(|i| format!("https://img/{i}")).collect();
        store
            .upsert(
                collections::PRODUCTS,
                "p1",
                to_fields(&json!({"name": "Whey", "images": urls})).unwrap(),
            )
            .await
            .unwrap();
        store
    }

    #[test]
    fn test_validate_image_limits() {
        assert_eq!(validate_image("image/jpeg", 10).unwrap(), ImageKind::Jpeg);
        assert_eq!(validate_image("image/webp", MAX_IMAGE_BYTES).unwrap(), ImageKind::Webp);
        assert!(matches!(
            validate_image("image/png", MAX_IMAGE_BYTES + 1),
            Err(StorageError::TooLarge { .. })
        ));
        assert!(matches!(
            validate_image("image/svg+xml", 10),
            Err(StorageError::UnsupportedType(_))
        ));
    }

    #[test]
    fn test_product_image_path() {
        let path = product_image_path(&ProductId::new("p1"), ImageKind::Png, 1_700_000_000_000);
        assert_eq!(path, "products/p1/1700000000000.png");
    }

    #[tokio::test]
    async fn test_attach_appends_images() {
        let store = store_with_product(1).await;
        let storage = FakeStorage::default();

        let images = ProductImages::new(&store, &storage)
            .attach(&ProductId::new("p1"), vec![png(10), png(10)], "token")
            .await
            .unwrap();

        assert_eq!(images.len(), 3);
        let paths = storage.paths.lock().unwrap();
        assert_eq!(paths.len(), 2);
        assert_ne!(paths.first(), paths.get(1));
        assert!(paths.iter().all(|p| p.starts_with("products/p1/")));
    }

    #[tokio::test]
    async fn test_attach_enforces_image_count() {
        let store = store_with_product(4).await;
        let storage = FakeStorage::default();

        let result = ProductImages::new(&store, &storage)
            .attach(&ProductId::new("p1"), vec![png(10), png(10)], "token")
            .await;

        assert!(matches!(result, Err(StorageError::TooManyImages { max: 5 })));
        assert!(storage.paths.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attach_validates_before_uploading() {
        let store = store_with_product(0).await;
        let storage = FakeStorage::default();
        let bad = ImageUpload {
            content_type: "application/pdf".to_string(),
            bytes: vec![0; 10],
        };

        let result = ProductImages::new(&store, &storage)
            .attach(&ProductId::new("p1"), vec![png(10), bad], "token")
            .await;

        assert!(matches!(result, Err(StorageError::UnsupportedType(_))));
        assert!(storage.paths.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_attach_missing_product() {
        let store = MemoryDocumentStore::new();
        let storage = FakeStorage::default();

        let result = ProductImages::new(&store, &storage)
            .attach(&ProductId::new("nope"), vec![png(10)], "token")
            .await;
        assert!(matches!(result, Err(StorageError::ProductNotFound)));
    }
}
