//! Signing credential management
//!
//! The private key never leaves this module and is never logged.

mod signer;

pub use signer::SecureWallet;
