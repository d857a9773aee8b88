//! Session-domain token models and claim helpers.

pub mod claims;
pub mod token;

pub use token::*;
