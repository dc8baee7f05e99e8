//! Content fingerprinting for grove.
//!
//! Provides domain-separated BLAKE3 hashing for file contents and commit
//! identities. Wraps an established library; no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
