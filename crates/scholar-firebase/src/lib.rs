//! # scholar-firebase
//!
//! Firebase ID token verification for scholarstream.
//!
//! `FirebaseTokenVerifier` implements `IdentityVerifier`: it checks the
//! token's RS256 signature against Google's key set and returns the email
//! the token asserts.
//!
//! ```rust,ignore
//! use scholar_firebase::FirebaseTokenVerifier;
//! use scholar_core::IdentityVerifier;
//!
//! // Reads SS_SERVICE_KEY (base64 service-account JSON)
//! let verifier = FirebaseTokenVerifier::from_env()?;
//! let identity = verifier.verify(token).await?;
//! println!("{}", identity.email);
//! ```

pub mod config;
pub mod verifier;

pub use config::{FirebaseConfig, ServiceAccount, DEFAULT_JWKS_URL};
pub use verifier::FirebaseTokenVerifier;
