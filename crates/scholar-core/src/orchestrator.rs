//! # Checkout Orchestrator
//!
//! Opens hosted checkout sessions for application fees and turns completed
//! sessions into application records.
//!
//! Reconciliation may run several times for one session (client retries on
//! the success redirect, double-clicks, two tabs). The store's uniqueness
//! constraint on the transaction id is what guarantees a single application;
//! the lookup beforehand only saves a write on the common repeat path.

use crate::application::{Application, PaidCheckout};
use crate::checkout::{
    CheckoutRequest, CheckoutSession, META_SCHOLARSHIP_ID, META_STUDENT_EMAIL, META_STUDENT_NAME,
};
use crate::error::{PaymentError, ServiceError};
use crate::gateway::{CheckoutUrls, SharedPaymentGateway};
use crate::id::DocumentId;
use crate::scholarship::Scholarship;
use crate::store::SharedStore;
use tracing::{debug, info, instrument, warn};

/// What reconciliation did about the application record
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplicationOutcome {
    /// A new pending application was stored
    Created(DocumentId),
    /// An application already exists for this transaction
    AlreadyRecorded,
    /// The session has not completed yet
    NotComplete,
    /// The session's scholarship no longer exists (or never did)
    ScholarshipMissing,
}

/// Result of reconciling a session
#[derive(Debug, Clone)]
pub struct Reconciliation {
    /// Returned to the client whatever the outcome
    pub scholarship: Option<Scholarship>,
    pub outcome: ApplicationOutcome,
}

#[derive(Clone)]
pub struct CheckoutOrchestrator {
    store: SharedStore,
    gateway: SharedPaymentGateway,
    urls: CheckoutUrls,
}

impl CheckoutOrchestrator {
    pub fn new(store: SharedStore, gateway: SharedPaymentGateway, urls: CheckoutUrls) -> Self {
        Self {
            store,
            gateway,
            urls,
        }
    }

    pub fn provider_name(&self) -> &'static str {
        self.gateway.provider_name()
    }

    /// Open a hosted checkout session and return its redirect URL
    #[instrument(skip(self, request), fields(scholarship_id = %request.scholarship_id))]
    pub async fn create_session(&self, request: &CheckoutRequest) -> Result<String, ServiceError> {
        request.validate().map_err(ServiceError::Validation)?;

        let session = self
            .gateway
            .create_checkout(request, &self.urls.success_url(), &self.urls.cancel_url())
            .await?;

        info!(
            "Created checkout session: id={}, amount={} {}",
            session.session_id,
            request.unit_amount(),
            request.currency
        );

        session.checkout_url.ok_or_else(|| {
            ServiceError::Payment(PaymentError::ProviderError {
                provider: self.gateway.provider_name().to_string(),
                message: format!("session {} has no checkout url", session.session_id),
            })
        })
    }

    /// Turn a completed session into exactly one application
    #[instrument(skip(self))]
    pub async fn reconcile(&self, session_id: &str) -> Result<Reconciliation, ServiceError> {
        if session_id.trim().is_empty() {
            return Err(ServiceError::Validation("sessionId is required".to_string()));
        }

        let session = self.gateway.retrieve_session(session_id).await?;
        debug!(
            "Retrieved session: status={:?}, payment_status={}",
            session.status, session.payment_status
        );

        let scholarship = self.session_scholarship(&session).await?;
        let Some(scholarship_ref) = scholarship.as_ref() else {
            warn!("Session {} references no existing scholarship", session.session_id);
            return Ok(Reconciliation {
                scholarship: None,
                outcome: ApplicationOutcome::ScholarshipMissing,
            });
        };

        if !session.is_complete() {
            info!("Session {} not complete yet, nothing to record", session.session_id);
            return Ok(Reconciliation {
                scholarship,
                outcome: ApplicationOutcome::NotComplete,
            });
        }

        let transaction_id = session.transaction_id().to_string();
        if self
            .store
            .find_application_by_transaction(&transaction_id)
            .await?
            .is_some()
        {
            debug!("Transaction {} already recorded", transaction_id);
            return Ok(Reconciliation {
                scholarship,
                outcome: ApplicationOutcome::AlreadyRecorded,
            });
        }

        let application = Application::from_payment(scholarship_ref, paid_checkout(&session));
        let outcome = match self.store.insert_application(application).await {
            Ok(id) => {
                info!("Recorded application {} for transaction {}", id, transaction_id);
                ApplicationOutcome::Created(id)
            }
            // lost a race with a concurrent reconciliation of the same session
            Err(e) if e.is_conflict() => {
                debug!("Transaction {} recorded concurrently", transaction_id);
                ApplicationOutcome::AlreadyRecorded
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Reconciliation {
            scholarship,
            outcome,
        })
    }

    async fn session_scholarship(
        &self,
        session: &CheckoutSession,
    ) -> Result<Option<Scholarship>, ServiceError> {
        let Some(raw) = session.metadata_value(META_SCHOLARSHIP_ID) else {
            return Ok(None);
        };
        match DocumentId::parse(raw) {
            Ok(id) => Ok(self.store.find_scholarship(id).await?),
            Err(_) => Ok(None),
        }
    }
}

fn paid_checkout(session: &CheckoutSession) -> PaidCheckout {
    let metadata_email = session.metadata_value(META_STUDENT_EMAIL);
    PaidCheckout {
        transaction_id: session.transaction_id().to_string(),
        student_name: session
            .metadata_value(META_STUDENT_NAME)
            .unwrap_or_default()
            .to_string(),
        student_email: session
            .customer_email
            .as_deref()
            .or(metadata_email)
            .unwrap_or_default()
            .to_string(),
        payment_status: session.payment_status.clone(),
        amount: session.amount_major(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkout::CheckoutStatus;
    use crate::error::PaymentResult;
    use crate::gateway::PaymentGateway;
    use crate::memory::MemoryStore;
    use crate::money::Currency;
    use crate::scholarship::tests::details;
    use crate::store::{ApplicationRepository, ScholarshipRepository};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};

    /// Gateway double holding sessions by id
    #[derive(Default)]
    struct FakeGateway {
        sessions: Mutex<HashMap<String, CheckoutSession>>,
    }

    impl FakeGateway {
        fn put(&self, session: CheckoutSession) {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.session_id.clone(), session);
        }
    }

    #[async_trait]
    impl PaymentGateway for FakeGateway {
        async fn create_checkout(
            &self,
            request: &CheckoutRequest,
            success_url: &str,
            _cancel_url: &str,
        ) -> PaymentResult<CheckoutSession> {
            let mut session = CheckoutSession::new("cs_new", "fake");
            session.metadata = request.metadata();
            session.checkout_url = Some(format!("https://pay.example/{}", success_url.len()));
            Ok(session)
        }

        async fn retrieve_session(&self, session_id: &str) -> PaymentResult<CheckoutSession> {
            self.sessions
                .lock()
                .unwrap()
                .get(session_id)
                .cloned()
                .ok_or_else(|| PaymentError::SessionNotFound {
                    session_id: session_id.to_string(),
                })
        }

        fn provider_name(&self) -> &'static str {
            "fake"
        }
    }

    fn completed_session(id: &str, scholarship_id: &str) -> CheckoutSession {
        let mut session = CheckoutSession::new(id, "fake");
        session.status = CheckoutStatus::Complete;
        session.payment_status = "paid".into();
        session.payment_intent_id = Some(format!("pi_{}", id));
        session.customer_email = Some("ada@x.io".into());
        session.amount_total = Some(2500);
        session.currency = Currency::USD;
        session.metadata = HashMap::from([
            (META_SCHOLARSHIP_ID.to_string(), scholarship_id.to_string()),
            (META_STUDENT_NAME.to_string(), "Ada".to_string()),
        ]);
        session
    }

    fn setup() -> (MemoryStore, Arc<FakeGateway>, CheckoutOrchestrator) {
        let store = MemoryStore::new();
        let gateway = Arc::new(FakeGateway::default());
        let orchestrator = CheckoutOrchestrator::new(
            Arc::new(store.clone()),
            gateway.clone(),
            CheckoutUrls::default(),
        );
        (store, gateway, orchestrator)
    }

    #[tokio::test]
    async fn test_reconcile_twice_creates_one_application() {
        let (store, gateway, orchestrator) = setup();
        let scholarship = Scholarship::new(details("Rhodes", "UK", 25.0), "a@x.io");
        let id = store.insert_scholarship(scholarship.clone()).await.unwrap();
        gateway.put(completed_session("cs_1", &id.to_string()));

        let first = orchestrator.reconcile("cs_1").await.unwrap();
        let second = orchestrator.reconcile("cs_1").await.unwrap();

        assert!(matches!(first.outcome, ApplicationOutcome::Created(_)));
        assert_eq!(second.outcome, ApplicationOutcome::AlreadyRecorded);
        assert_eq!(second.scholarship.map(|s| s.id), Some(id));

        let apps = store.all_applications().await.unwrap();
        assert_eq!(apps.len(), 1);
        assert_eq!(apps[0].transaction_id, "pi_cs_1");
        assert_eq!(apps[0].student_name, "Ada");
        assert_eq!(apps[0].student_email, "ada@x.io");
        assert_eq!(apps[0].amount, 25.0);
    }

    #[tokio::test]
    async fn test_concurrent_reconcile_creates_one_application() {
        let (store, gateway, orchestrator) = setup();
        let id = store
            .insert_scholarship(Scholarship::new(details("Rhodes", "UK", 25.0), "a@x.io"))
            .await
            .unwrap();
        gateway.put(completed_session("cs_race", &id.to_string()));

        let (a, b) = tokio::join!(
            orchestrator.reconcile("cs_race"),
            orchestrator.reconcile("cs_race")
        );
        assert!(a.is_ok() && b.is_ok());
        assert_eq!(store.all_applications().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_missing_scholarship_creates_nothing() {
        let (store, gateway, orchestrator) = setup();
        gateway.put(completed_session("cs_gone", &DocumentId::new().to_string()));
        gateway.put(completed_session("cs_bad", "not-an-id"));

        let gone = orchestrator.reconcile("cs_gone").await.unwrap();
        let bad = orchestrator.reconcile("cs_bad").await.unwrap();

        assert!(gone.scholarship.is_none());
        assert_eq!(gone.outcome, ApplicationOutcome::ScholarshipMissing);
        assert_eq!(bad.outcome, ApplicationOutcome::ScholarshipMissing);
        assert!(store.all_applications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_open_session_returns_scholarship_only() {
        let (store, gateway, orchestrator) = setup();
        let id = store
            .insert_scholarship(Scholarship::new(details("Rhodes", "UK", 25.0), "a@x.io"))
            .await
            .unwrap();
        let mut session = completed_session("cs_open", &id.to_string());
        session.status = CheckoutStatus::Open;
        gateway.put(session);

        let result = orchestrator.reconcile("cs_open").await.unwrap();
        assert_eq!(result.outcome, ApplicationOutcome::NotComplete);
        assert!(result.scholarship.is_some());
        assert!(store.all_applications().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_session_is_not_found() {
        let (_store, _gateway, orchestrator) = setup();
        let err = orchestrator.reconcile("cs_nope").await.unwrap_err();
        assert_eq!(err.status_code(), 404);

        let err = orchestrator.reconcile("  ").await.unwrap_err();
        assert_eq!(err.status_code(), 400);
    }

    #[tokio::test]
    async fn test_create_session_validates_amount() {
        let (_store, _gateway, orchestrator) = setup();
        let mut request = CheckoutRequest {
            scholarship_id: DocumentId::new().to_string(),
            display_name: "Rhodes".into(),
            image_url: None,
            amount: 0.0,
            currency: Currency::USD,
            student_name: "Ada".into(),
            student_email: "ada@x.io".into(),
        };
        let err = orchestrator.create_session(&request).await.unwrap_err();
        assert!(matches!(err, ServiceError::Validation(_)));

        request.amount = 25.0;
        let url = orchestrator.create_session(&request).await.unwrap();
        assert!(url.starts_with("https://pay.example/"));
    }
}
