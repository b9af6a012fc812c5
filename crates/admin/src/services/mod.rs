//! Business logic services for admin.
//!
//! # Services
//!
//! - `auth` - Session Gate (role-gated sign-in against the identity provider)
//! - `email` - Email delivery via SMTP
//! - `notifications` - Template-driven transactional email
//! - `orders` - Payment confirmation and shipping actions
//! - `storage` - Product image uploads

pub mod auth;
pub mod email;
pub mod notifications;
pub mod orders;
pub mod storage;

pub use auth::{
    AccessDecision, AuthError, FirebaseAuthClient, IdentityProvider, ProviderError, RejectReason,
    SessionGate, check_admin_access,
};
pub use email::{EmailService, MailTransport, OutboundMail, TransportError};
pub use notifications::{NotificationDispatcher, NotificationError, Variables};
pub use orders::{OrderActionError, OrderActions};
pub use storage::{BlobStorage, FirebaseStorageClient, ProductImages, StorageError};
