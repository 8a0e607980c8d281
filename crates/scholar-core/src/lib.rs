//! # scholar-core
//!
//! Core types and traits for the scholarstream backend.
//!
//! This crate provides:
//! - `Scholarship`, `Application`, `User` and `Review` document types
//! - Repository traits (`ScholarshipRepository`, ..., combined as `Store`)
//!   and an in-process `MemoryStore`
//! - `PaymentGateway` and `IdentityVerifier` traits for external providers
//! - `authorize`, the single role policy used by guarded routes
//! - `CheckoutOrchestrator` for checkout creation and reconciliation
//!
//! ## Example
//!
//! ```rust,ignore
//! use scholar_core::{CheckoutOrchestrator, CheckoutUrls, MemoryStore};
//!
//! let orchestrator = CheckoutOrchestrator::new(store, gateway, CheckoutUrls::new(client_domain));
//!
//! // After the provider redirects back with ?session_id=...
//! let result = orchestrator.reconcile(&session_id).await?;
//! render(result.scholarship);
//! ```

pub mod application;
pub mod checkout;
pub mod error;
pub mod gateway;
pub mod id;
pub mod identity;
pub mod memory;
pub mod money;
pub mod orchestrator;
pub mod policy;
pub mod review;
pub mod scholarship;
pub mod store;
pub mod user;

// Re-exports for convenience
pub use application::{Application, ApplicationStatus, PaidCheckout, StatusUpdate, UniversityCount};
pub use checkout::{CheckoutRequest, CheckoutSession, CheckoutStatus};
pub use error::{AuthError, PaymentError, PaymentResult, ServiceError, StoreError, StoreResult};
pub use gateway::{CheckoutUrls, PaymentGateway, SharedPaymentGateway};
pub use id::DocumentId;
pub use identity::{bearer_token, IdentityVerifier, SharedIdentityVerifier, VerifiedIdentity};
pub use memory::MemoryStore;
pub use money::Currency;
pub use orchestrator::{ApplicationOutcome, CheckoutOrchestrator, Reconciliation};
pub use policy::{authorize, AccessDenied};
pub use review::{NewReview, Review, ReviewEdit};
pub use scholarship::{FeeSort, Scholarship, ScholarshipDetails, ScholarshipPage, ScholarshipQuery};
pub use store::{
    ApplicationRepository, ReviewRepository, ScholarshipRepository, SharedStore, Store,
    UserRepository,
};
pub use user::{LoginOutcome, LoginProfile, Role, User};
