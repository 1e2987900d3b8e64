pub mod approval;
pub mod department;
pub mod notification;
pub mod photo;
pub mod profile;
pub mod session;
pub mod user;

pub use approval::ApprovalEvent;
pub use department::Department;
pub use notification::Notification;
pub use photo::Photo;
pub use profile::{ApprovalStatus, UserProfile};
pub use session::Session;
pub use user::{PublicUser, Role, User};
