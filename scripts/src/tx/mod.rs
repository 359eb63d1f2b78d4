//! Chain access: accounts and signing clients.

pub mod accounts;
pub mod client;
