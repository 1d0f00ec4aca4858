//! Gmail tools
//!
//! Email read/send over the Gmail REST API. Authentication is an OAuth
//! token file (the JSON produced by Google's consent flow); the initial
//! consent happens out-of-band, the tools only load, refresh, and persist
//! the token.

mod auth;
mod read_email;
mod send_email;

pub use auth::GmailAuth;
pub use read_email::ReadEmailTool;
pub use send_email::SendEmailTool;
