pub mod links;
pub mod password;
pub mod validation;

pub use links::{drive_file_id, proxied_image_url};
pub use password::{hash_password, verify_password};
pub use validation::ValidatedJson;
