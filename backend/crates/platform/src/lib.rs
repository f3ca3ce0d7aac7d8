//! Platform Crate - Technical Infrastructure
//!
//! This crate provides shared technical foundations:
//! - Cryptographic utilities (SHA-256, HMAC, Base64, Base36)
//! - Password hashing (Argon2id, NIST SP 800-63B compliant)
//! - Outbound mail delivery

pub mod crypto;
pub mod mail;
pub mod password;
