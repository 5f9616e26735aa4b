//! Port interface for the remote directory API.

use async_trait::async_trait;
use dirsync_domain::{PopulationMap, Record, Result};

/// The remote directory operations the engine drives.
///
/// Implementations handle authentication (bearer token per call) and wrap
/// every HTTP request in the shared retry policy; callers see only the
/// terminal error taxonomy. Mocked in scheduler tests.
#[async_trait]
pub trait DirectoryOps: Send + Sync {
    /// Create a new user; returns the created record (with remote id).
    async fn create_user(&self, record: &Record) -> Result<Record>;

    /// Apply a delta patch to a user; returns the updated record.
    async fn update_user(&self, id: &str, patch: &Record) -> Result<Record>;

    /// Delete a user by id.
    async fn delete_user(&self, id: &str) -> Result<()>;

    /// Fetch one user by id.
    async fn get_user(&self, id: &str) -> Result<Record>;

    /// Server-side dry-run validation of a user payload (nothing is created).
    async fn validate_user(&self, record: &Record) -> Result<()>;

    /// Enumerate every user by walking the paginated listing.
    async fn fetch_all_users(&self) -> Result<Vec<Record>>;

    /// Resolve the population id → name map for the environment.
    async fn fetch_populations(&self) -> Result<PopulationMap>;

    /// Probe connectivity and credentials by obtaining a token.
    async fn test_connection(&self) -> Result<()>;
}
