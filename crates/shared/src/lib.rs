//! Shared utilities for the private registration backend.
//!
//! This crate provides common functionality used across all other crates:
//! - Token generation and hashing
//! - Password hashing with Argon2id
//! - Signed session tokens
//! - Team name, email and password validation

pub mod crypto;
pub mod password;
pub mod session;
pub mod validation;
