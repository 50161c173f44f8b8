pub mod local;
pub mod s3;

pub use local::LocalBlobStore;
pub use s3::S3BlobStore;

use async_trait::async_trait;

use crate::errors::Result;

/// Raw file storage addressed by slash-separated keys
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Short backend label for logs
    fn name(&self) -> &str;

    async fn put_object(&self, key: &str, bytes: Vec<u8>, content_type: &str) -> Result<()>;

    /// Fetch an object; `AppError::NotFound` when the key does not exist
    async fn download_object(&self, key: &str) -> Result<Vec<u8>>;

    async fn object_exists(&self, key: &str) -> Result<bool>;

    /// Remove an object; deleting a missing key is not an error
    async fn delete_object(&self, key: &str) -> Result<()>;
}
