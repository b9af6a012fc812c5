//! Domain models for admin.
//!
//! Typed views over documents read from the store, plus the types kept in
//! the browser session.

pub mod email_template;
pub mod identity;
pub mod order;
pub mod session;

pub use email_template::{EmailTemplate, RenderedMessage};
pub use identity::IdentityRecord;
pub use order::{Customer, Order, OrderItem, OrderStats, ShippingAddress};
pub use session::{AdminSession, ProviderSession, SessionStatus, keys as session_keys};
