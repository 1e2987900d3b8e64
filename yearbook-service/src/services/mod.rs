//! Services layer: authentication, storage, token signing, and the
//! blob-storage client.

mod auth;
mod database;
mod drive;
mod jwt;
mod store;

pub use auth::{AuthService, IssuedTokens, RefreshedTokens};
pub use database::Database;
pub use drive::{DriveService, MediaStorage, MockMediaStorage};
pub use jwt::{AccessTokenClaims, JwtService};
pub use store::{MemoryStore, ProfileFilter, ProfileRecord, ProfileSort, YearbookStore};
