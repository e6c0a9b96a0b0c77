/// Admin subsystem: users, credentials, sessions, permissions
pub mod credentials;
pub mod permissions;
pub mod sessions;
pub mod users;

pub use credentials::{CredentialVerifier, PasswordVerifier};
pub use permissions::{PermissionSet, Role};
pub use sessions::{SessionManager, ValidatedAdminSession};
pub use users::{AdminUser, AdminUserManager};
