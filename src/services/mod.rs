// Service exports
pub mod appwrite;
pub mod cache;
pub mod directory;
pub mod memory;
pub mod postgres;
pub mod store;

pub use appwrite::{AppwriteClient, AppwriteCollections, AppwriteError};
pub use cache::{CacheError, CacheKey, CacheManager};
pub use directory::{CachedDirectory, Directory, DirectoryError};
pub use memory::{MemoryDirectory, MemoryStore};
pub use postgres::{DirectionColumn, PostgresClient};
pub use store::{StoreError, SwipeStore};
