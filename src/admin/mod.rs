//! Web administration UI module.
//!
//! Provides:
//! - The admin login/logout pages backed by the session gate
//! - Post authoring (list, create, edit, delete)
//! - About page editing, comment moderation, user listing

pub mod middleware;
pub mod routes;
pub mod templates;

pub use routes::admin_router;
