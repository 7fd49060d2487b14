//! The patient registry facade.
//!
//! [`PatientRegistry`] is the single entry point used by request handlers. Every operation is a
//! sequence of awaited backend calls with no retries. All operations return a typed result:
//! lookups yield `Ok(None)` for a missing record and `Err` for any failure, and every failure is
//! reported to the observer before it is returned.

use crate::birth_date::normalise_birth_date;
use crate::constants::USER_ID_ATTRIBUTE;
use crate::error::{RegistryError, RegistryResult, ServiceError};
use crate::observer::{Operation, RegistryEvent, RegistryObserver, TracingObserver};
use crate::patient::{DocumentLink, Patient, PatientRecord, RegisterPatientParams};
use crate::services::{
    DocumentStore, IdentityService, Query, RecordStore, StoredDocument, StoredFile,
};
use crate::user::{NewUser, UserAccount};
use crate::RegistryConfig;
use registry_id::UniqueId;
use std::sync::Arc;

#[derive(Clone)]
pub struct PatientRegistry {
    cfg: Arc<RegistryConfig>,
    identity: Arc<dyn IdentityService>,
    documents: Arc<dyn DocumentStore>,
    records: Arc<dyn RecordStore>,
    observer: Arc<dyn RegistryObserver>,
}

impl PatientRegistry {
    /// Creates a registry reporting to [`TracingObserver`].
    pub fn new(
        cfg: Arc<RegistryConfig>,
        identity: Arc<dyn IdentityService>,
        documents: Arc<dyn DocumentStore>,
        records: Arc<dyn RecordStore>,
    ) -> Self {
        Self {
            cfg,
            identity,
            documents,
            records,
            observer: Arc::new(TracingObserver),
        }
    }

    /// Replaces the observer that receives registry diagnostics.
    pub fn with_observer(mut self, observer: Arc<dyn RegistryObserver>) -> Self {
        self.observer = observer;
        self
    }

    /// Returns the configuration this registry was built with.
    ///
    /// # Returns
    /// The backend identifiers and endpoint used to address records and files.
    pub fn config(&self) -> &RegistryConfig {
        &self.cfg
    }

    /// Creates an account, or returns the existing one when the email is already registered.
    ///
    /// # Returns
    /// The new account, or the account already registered under the same email.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::UnresolvedUserConflict`] if the identity service reports the email as
    ///   taken but an exact email lookup finds no account
    /// - [`RegistryError::Identity`] for any other identity service failure
    pub async fn create_user(&self, user: NewUser) -> RegistryResult<UserAccount> {
        let user_id = UniqueId::generate();

        match self.identity.create(&user_id, &user).await {
            Ok(account) => Ok(account),
            Err(err) if err.is_conflict() => {
                let existing = self
                    .identity
                    .list_by_email(&user.email)
                    .await
                    .map_err(|e| RegistryError::Identity(self.report(Operation::CreateUser, e)))?;

                match existing.into_iter().next() {
                    Some(account) => {
                        self.observer.record(&RegistryEvent::UserConflictResolved {
                            email: user.email.as_str(),
                            user_id: &account.id,
                        });
                        Ok(account)
                    }
                    None => {
                        self.observer.record(&RegistryEvent::UserConflictUnresolved {
                            email: user.email.as_str(),
                        });
                        Err(RegistryError::UnresolvedUserConflict {
                            email: user.email.to_string(),
                        })
                    }
                }
            }
            Err(err) => Err(RegistryError::Identity(
                self.report(Operation::CreateUser, err),
            )),
        }
    }

    /// Fetches an account by id.
    ///
    /// # Returns
    /// `Ok(None)` when the identity service has no account with this id.
    pub async fn get_user(&self, user_id: &UniqueId) -> RegistryResult<Option<UserAccount>> {
        match self.identity.get(user_id).await {
            Ok(account) => Ok(Some(account)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(RegistryError::Identity(self.report(Operation::GetUser, err))),
        }
    }

    /// Registers a patient for an existing user account.
    ///
    /// The document upload and record creation run strictly in sequence: the upload must
    /// finish before the record that references it is built. If the record store refuses the
    /// record after an upload, the uploaded file is deleted. Once the record is written the
    /// file is never removed.
    ///
    /// # Returns
    /// The stored patient, including its record id.
    ///
    /// # Errors
    ///
    /// - [`RegistryError::InvalidBirthDate`] before anything is uploaded
    /// - [`RegistryError::PatientAlreadyRegistered`] if the user already has a patient record
    /// - [`RegistryError::DocumentStore`] if the upload fails
    /// - [`RegistryError::RecordStore`] if record creation fails (the upload is rolled back)
    /// - [`RegistryError::CleanupAfterRecordFailed`] if the rollback also fails
    /// - [`RegistryError::UnreadableCreatedRecord`] if the record was written but the stored
    ///   document could not be read back
    pub async fn register_patient(&self, params: RegisterPatientParams) -> RegistryResult<Patient> {
        let birth_date = normalise_birth_date(params.birth_date.as_ref())
            .map_err(|e| self.reject_input(Operation::RegisterPatient, e))?;

        self.observer.record(&RegistryEvent::RegistrationReceived {
            user_id: &params.user_id,
            birth_date_kind: params.birth_date.as_ref().map(|b| b.kind()),
            document_present: params.identification_document.is_some(),
            optional_fields: count_supplied(&params),
        });

        if !self
            .patient_documents(&params.user_id, Operation::RegisterPatient)
            .await?
            .is_empty()
        {
            return Err(self.duplicate_patient(&params.user_id));
        }

        let uploaded = match &params.identification_document {
            Some(document) => {
                let file_id = UniqueId::generate();
                let stored = self
                    .documents
                    .upload(self.cfg.bucket_id(), &file_id, document)
                    .await
                    .map_err(|e| {
                        RegistryError::DocumentStore(self.report(Operation::RegisterPatient, e))
                    })?;
                self.observer.record(&RegistryEvent::DocumentUploaded {
                    file_id: &stored.id,
                    size_bytes: stored.size_bytes,
                });
                Some(stored)
            }
            None => None,
        };

        let link = uploaded.as_ref().map(|file| DocumentLink {
            file_id: file.id.clone(),
            url: self.cfg.file_view_url(&file.id),
        });
        let record = PatientRecord::assemble(params, birth_date, link.as_ref());

        let created = match (self.create_patient_record(&record).await, uploaded) {
            (Ok(document), _) => document,
            (Err(err), Some(file)) => return Err(self.remove_upload(file, err).await),
            (Err(err), None) => return Err(err),
        };

        let document_id = created.id.clone();
        self.read_patient(created, Operation::RegisterPatient)
            .map_err(|err| match err {
                RegistryError::Deserialization(source) => RegistryError::UnreadableCreatedRecord {
                    document_id,
                    source,
                },
                other => other,
            })
    }

    /// Fetches the patient registered for a user account.
    ///
    /// # Returns
    /// `Ok(None)` when no patient record references this user id.
    pub async fn get_patient(&self, user_id: &UniqueId) -> RegistryResult<Option<Patient>> {
        self.patient_documents(user_id, Operation::GetPatient)
            .await?
            .into_iter()
            .next()
            .map(|document| self.read_patient(document, Operation::GetPatient))
            .transpose()
    }

    async fn patient_documents(
        &self,
        user_id: &UniqueId,
        operation: Operation,
    ) -> RegistryResult<Vec<StoredDocument>> {
        let queries = [
            Query::equal(USER_ID_ATTRIBUTE, user_id.as_str()),
            Query::limit(1),
        ];

        self.records
            .list_documents(
                self.cfg.database_id(),
                self.cfg.patient_collection_id(),
                &queries,
            )
            .await
            .map_err(|e| RegistryError::RecordStore(self.report(operation, e)))
    }

    fn read_patient(&self, document: StoredDocument, operation: Operation) -> RegistryResult<Patient> {
        let document_id = document.id.clone();
        Patient::from_document(document).map_err(|error| {
            self.observer.record(&RegistryEvent::UnreadableRecord {
                operation,
                document_id: &document_id,
                error: &error,
            });
            error
        })
    }

    async fn create_patient_record(&self, record: &PatientRecord) -> RegistryResult<StoredDocument> {
        let payload = record
            .to_payload()
            .map_err(|e| self.reject_input(Operation::RegisterPatient, e))?;
        self.observer.record(&RegistryEvent::PayloadPrepared {
            user_id: &record.user_id,
            keys: payload.keys().map(String::as_str).collect(),
        });

        let document_id = UniqueId::generate();
        let created = self
            .records
            .create_document(
                self.cfg.database_id(),
                self.cfg.patient_collection_id(),
                &document_id,
                &payload,
            )
            .await;

        match created {
            Ok(document) => Ok(document),
            Err(err) if err.is_conflict() => Err(self.duplicate_patient(&record.user_id)),
            Err(err) => {
                let err = self.report(Operation::RegisterPatient, err);
                if err.is_schema_mismatch() {
                    self.observer
                        .record(&RegistryEvent::SchemaMismatch { error: &err });
                }
                Err(RegistryError::RecordStore(err))
            }
        }
    }

    async fn remove_upload(&self, file: StoredFile, record_error: RegistryError) -> RegistryError {
        match self.documents.delete(self.cfg.bucket_id(), &file.id).await {
            Ok(()) => {
                self.observer
                    .record(&RegistryEvent::UploadCompensated { file_id: &file.id });
                record_error
            }
            Err(cleanup_error) => {
                self.observer.record(&RegistryEvent::CompensationFailed {
                    file_id: &file.id,
                    error: &cleanup_error,
                });
                RegistryError::CleanupAfterRecordFailed {
                    file_id: file.id,
                    record_error: Box::new(record_error),
                    cleanup_error,
                }
            }
        }
    }

    fn duplicate_patient(&self, user_id: &UniqueId) -> RegistryError {
        self.observer
            .record(&RegistryEvent::DuplicatePatientRejected { user_id });
        RegistryError::PatientAlreadyRegistered {
            user_id: user_id.clone(),
        }
    }

    fn reject_input(&self, operation: Operation, error: RegistryError) -> RegistryError {
        self.observer.record(&RegistryEvent::InputRejected {
            operation,
            error: &error,
        });
        error
    }

    fn report(&self, operation: Operation, error: ServiceError) -> ServiceError {
        self.observer.record(&RegistryEvent::ServiceFailed {
            operation,
            error: &error,
        });
        error
    }
}

fn count_supplied(params: &RegisterPatientParams) -> usize {
    [
        &params.allergies,
        &params.current_medication,
        &params.family_medical_history,
        &params.past_medical_history,
        &params.identification_type,
        &params.identification_number,
    ]
    .iter()
    .filter(|v| v.as_deref().is_some_and(|s| !s.is_empty()))
    .count()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::SCHEMA_MISMATCH_KIND;
    use crate::error::{ServiceFailure, ServiceResult};
    use crate::memory::{MemoryDocumentStore, MemoryIdentityService, MemoryRecordStore};
    use crate::patient::tests::sample_params;
    use crate::patient::IdentificationDocument;
    use crate::services::StoredDocument;
    use crate::BirthDateInput;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};
    use registry_types::EmailAddress;
    use serde_json::{json, Map, Value};
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingObserver {
        events: Mutex<Vec<&'static str>>,
    }

    impl RecordingObserver {
        fn names(&self) -> Vec<&'static str> {
            self.events.lock().unwrap().clone()
        }
    }

    impl RegistryObserver for RecordingObserver {
        fn record(&self, event: &RegistryEvent<'_>) {
            self.events.lock().unwrap().push(event.name());
        }
    }

    /// Identity service that fails every call with a fixed error.
    struct FailingIdentity {
        error: ServiceError,
        matches: Vec<UserAccount>,
    }

    #[async_trait]
    impl IdentityService for FailingIdentity {
        async fn create(&self, _: &UniqueId, _: &NewUser) -> ServiceResult<UserAccount> {
            Err(self.error.clone())
        }

        async fn get(&self, _: &UniqueId) -> ServiceResult<UserAccount> {
            Err(self.error.clone())
        }

        async fn list_by_email(&self, _: &EmailAddress) -> ServiceResult<Vec<UserAccount>> {
            Ok(self.matches.clone())
        }
    }

    /// Record store whose lookups find nothing and whose writes fail.
    struct RejectingRecordStore {
        error: ServiceError,
    }

    #[async_trait]
    impl RecordStore for RejectingRecordStore {
        async fn create_document(
            &self,
            _: &UniqueId,
            _: &UniqueId,
            _: &UniqueId,
            _: &Map<String, Value>,
        ) -> ServiceResult<StoredDocument> {
            Err(self.error.clone())
        }

        async fn list_documents(
            &self,
            _: &UniqueId,
            _: &UniqueId,
            _: &[Query],
        ) -> ServiceResult<Vec<StoredDocument>> {
            Ok(vec![])
        }
    }

    /// Document store that accepts uploads but can be told to fail them or the deletes.
    #[derive(Default)]
    struct FlakyDocumentStore {
        inner: MemoryDocumentStore,
        fail_upload: bool,
        fail_delete: bool,
    }

    #[async_trait]
    impl DocumentStore for FlakyDocumentStore {
        async fn upload(
            &self,
            bucket_id: &UniqueId,
            file_id: &UniqueId,
            document: &IdentificationDocument,
        ) -> ServiceResult<StoredFile> {
            if self.fail_upload {
                return Err(ServiceError::Upload(
                    ServiceFailure::new("storage unavailable").with_code(503),
                ));
            }
            self.inner.upload(bucket_id, file_id, document).await
        }

        async fn delete(&self, bucket_id: &UniqueId, file_id: &UniqueId) -> ServiceResult<()> {
            if self.fail_delete {
                return Err(ServiceError::Transient(ServiceFailure::new("timeout")));
            }
            self.inner.delete(bucket_id, file_id).await
        }
    }

    /// Record store that persists the payload but hands back a document missing `name`.
    #[derive(Default)]
    struct LossyRecordStore {
        inner: MemoryRecordStore,
    }

    #[async_trait]
    impl RecordStore for LossyRecordStore {
        async fn create_document(
            &self,
            database_id: &UniqueId,
            collection_id: &UniqueId,
            document_id: &UniqueId,
            payload: &Map<String, Value>,
        ) -> ServiceResult<StoredDocument> {
            let mut stored = self
                .inner
                .create_document(database_id, collection_id, document_id, payload)
                .await?;
            stored.fields.remove("name");
            Ok(stored)
        }

        async fn list_documents(
            &self,
            database_id: &UniqueId,
            collection_id: &UniqueId,
            queries: &[Query],
        ) -> ServiceResult<Vec<StoredDocument>> {
            self.inner
                .list_documents(database_id, collection_id, queries)
                .await
        }
    }

    fn test_cfg() -> Arc<RegistryConfig> {
        Arc::new(
            RegistryConfig::new(
                "https://cloud.example.com/v1",
                "proj1",
                "db1",
                "patients",
                "bucket1",
            )
            .expect("RegistryConfig::new should succeed"),
        )
    }

    struct Harness {
        registry: PatientRegistry,
        documents: Arc<MemoryDocumentStore>,
        records: Arc<MemoryRecordStore>,
        observer: Arc<RecordingObserver>,
    }

    fn harness() -> Harness {
        let documents = Arc::new(MemoryDocumentStore::new());
        let records = Arc::new(MemoryRecordStore::new().with_unique_attribute("patients", "userId"));
        let observer = Arc::new(RecordingObserver::default());
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(MemoryIdentityService::new()),
            documents.clone(),
            records.clone(),
        )
        .with_observer(observer.clone());

        Harness {
            registry,
            documents,
            records,
            observer,
        }
    }

    fn new_user(email: &str) -> NewUser {
        NewUser::parse(email, "+15555550100", "Jane Doe").unwrap()
    }

    fn document() -> IdentificationDocument {
        IdentificationDocument::new("passport.png", vec![0x89, 0x50, 0x4e, 0x47]).unwrap()
    }

    fn transient() -> ServiceError {
        ServiceError::Transient(ServiceFailure::new("connection reset"))
    }

    #[tokio::test]
    async fn test_create_user_assigns_id() {
        let h = harness();
        let account = h
            .registry
            .create_user(new_user("jane@example.com"))
            .await
            .expect("create_user should succeed");

        assert!(!account.id.as_str().is_empty());
        assert_eq!(account.email, "jane@example.com");
        assert_eq!(account.name, "Jane Doe");
    }

    #[tokio::test]
    async fn test_create_user_with_existing_email_returns_existing_account() {
        let h = harness();
        let first = h
            .registry
            .create_user(new_user("jane@example.com"))
            .await
            .expect("first create_user should succeed");
        let second = h
            .registry
            .create_user(new_user("jane@example.com"))
            .await
            .expect("second create_user should succeed");

        assert_eq!(first, second);
        assert!(h.observer.names().contains(&"user_conflict_resolved"));
    }

    #[tokio::test]
    async fn test_create_user_conflict_without_match_is_an_error() {
        let identity = FailingIdentity {
            error: ServiceError::Conflict(ServiceFailure::new("exists").with_code(409)),
            matches: vec![],
        };
        let observer = Arc::new(RecordingObserver::default());
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(identity),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryRecordStore::new()),
        )
        .with_observer(observer.clone());

        let err = registry
            .create_user(new_user("jane@example.com"))
            .await
            .expect_err("conflict without match should fail");

        assert!(matches!(
            err,
            RegistryError::UnresolvedUserConflict { ref email } if email == "jane@example.com"
        ));
        assert_eq!(observer.names(), vec!["user_conflict_unresolved"]);
    }

    #[tokio::test]
    async fn test_create_user_propagates_other_failures() {
        let observer = Arc::new(RecordingObserver::default());
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(FailingIdentity {
                error: transient(),
                matches: vec![],
            }),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryRecordStore::new()),
        )
        .with_observer(observer.clone());

        let err = registry
            .create_user(new_user("jane@example.com"))
            .await
            .expect_err("transient failure should propagate");

        assert!(matches!(err, RegistryError::Identity(ServiceError::Transient(_))));
        assert_eq!(observer.names(), vec!["service_failed"]);
    }

    #[tokio::test]
    async fn test_get_user_distinguishes_missing_from_failure() {
        let h = harness();
        let account = h
            .registry
            .create_user(new_user("jane@example.com"))
            .await
            .unwrap();

        let found = h.registry.get_user(&account.id).await.unwrap();
        assert_eq!(found, Some(account));

        let missing = h
            .registry
            .get_user(&UniqueId::parse("nobody").unwrap())
            .await
            .unwrap();
        assert_eq!(missing, None);

        let failing = PatientRegistry::new(
            test_cfg(),
            Arc::new(FailingIdentity {
                error: transient(),
                matches: vec![],
            }),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(MemoryRecordStore::new()),
        );
        assert!(failing
            .get_user(&UniqueId::parse("u1").unwrap())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_register_without_document_stores_normalised_record() {
        let h = harness();
        let patient = h
            .registry
            .register_patient(sample_params("user1"))
            .await
            .expect("register_patient should succeed");

        assert_eq!(patient.record.gender, "female");
        assert_eq!(
            patient.record.birth_date.as_deref(),
            Some("1990-05-01T00:00:00.000Z")
        );
        assert!(patient.record.privacy_consent);
        assert_eq!(patient.record.identification_document(), None);
        assert!(h.documents.is_empty());

        let stored = h
            .records
            .list_documents(
                h.registry.config().database_id(),
                h.registry.config().patient_collection_id(),
                &[],
            )
            .await
            .unwrap();
        assert_eq!(stored.len(), 1);
        let fields = &stored[0].fields;
        assert_eq!(fields.get("identificationDocumentId"), Some(&Value::Null));
        assert_eq!(fields.get("identificationDocumentUrl"), Some(&Value::Null));
        assert!(!fields.contains_key("allergies"));
    }

    #[tokio::test]
    async fn test_register_with_document_links_uploaded_file() {
        let h = harness();
        let mut params = sample_params("user1");
        params.identification_document = Some(document());

        let patient = h
            .registry
            .register_patient(params)
            .await
            .expect("register_patient should succeed");

        let (file_id, url) = patient
            .record
            .identification_document()
            .expect("document link should be set");
        assert_eq!(url.matches(file_id).count(), 1);
        assert_eq!(
            url,
            format!(
                "https://cloud.example.com/v1/storage/buckets/bucket1/files/{}/view?project=proj1",
                file_id
            )
        );
        assert!(h.documents.contains(
            h.registry.config().bucket_id(),
            &UniqueId::parse(file_id).unwrap()
        ));
        assert_eq!(
            h.observer.names(),
            vec![
                "registration_received",
                "document_uploaded",
                "payload_prepared"
            ]
        );
    }

    #[tokio::test]
    async fn test_birth_date_forms_store_the_same_value() {
        let h = harness();

        let mut from_text = sample_params("user1");
        from_text.birth_date = Some(BirthDateInput::from("1990-05-01T00:00:00Z"));
        let mut from_instant = sample_params("user2");
        from_instant.birth_date = Some(BirthDateInput::from(
            Utc.with_ymd_and_hms(1990, 5, 1, 0, 0, 0).unwrap(),
        ));

        let a = h.registry.register_patient(from_text).await.unwrap();
        let b = h.registry.register_patient(from_instant).await.unwrap();

        assert_eq!(a.record.birth_date, b.record.birth_date);
    }

    #[tokio::test]
    async fn test_second_registration_is_rejected_before_upload() {
        let h = harness();
        h.registry
            .register_patient(sample_params("user1"))
            .await
            .expect("first registration should succeed");

        let mut again = sample_params("user1");
        again.identification_document = Some(document());
        let err = h
            .registry
            .register_patient(again)
            .await
            .expect_err("second registration should fail");

        assert!(matches!(
            err,
            RegistryError::PatientAlreadyRegistered { ref user_id } if user_id.as_str() == "user1"
        ));
        assert!(h.documents.is_empty(), "nothing should be uploaded");
        assert_eq!(h.records.len(), 1);
    }

    #[tokio::test]
    async fn test_invalid_birth_date_fails_before_upload() {
        let h = harness();
        let mut params = sample_params("user1");
        params.birth_date = Some(BirthDateInput::from("not a date"));
        params.identification_document = Some(document());

        let err = h.registry.register_patient(params).await.unwrap_err();

        assert!(matches!(err, RegistryError::InvalidBirthDate(_)));
        assert!(h.documents.is_empty());
        assert!(h.records.is_empty());
        assert_eq!(h.observer.names(), vec!["input_rejected"]);
    }

    #[tokio::test]
    async fn test_record_failure_removes_uploaded_document() {
        let documents = Arc::new(FlakyDocumentStore::default());
        let observer = Arc::new(RecordingObserver::default());
        let schema_error = ServiceError::Validation(
            ServiceFailure::new("Invalid document structure: unknown attribute")
                .with_code(400)
                .with_kind(SCHEMA_MISMATCH_KIND),
        );
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(MemoryIdentityService::new()),
            documents.clone(),
            Arc::new(RejectingRecordStore {
                error: schema_error.clone(),
            }),
        )
        .with_observer(observer.clone());

        let mut params = sample_params("user1");
        params.identification_document = Some(document());
        let err = registry.register_patient(params).await.unwrap_err();

        match err {
            RegistryError::RecordStore(e) => assert_eq!(e, schema_error),
            other => panic!("expected RecordStore error, got {other:?}"),
        }
        assert!(documents.inner.is_empty(), "upload should be rolled back");

        let names = observer.names();
        assert!(names.contains(&"schema_mismatch"));
        assert!(names.contains(&"upload_compensated"));
    }

    #[tokio::test]
    async fn test_failed_rollback_reports_both_errors() {
        let documents = Arc::new(FlakyDocumentStore {
            fail_delete: true,
            ..Default::default()
        });
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(MemoryIdentityService::new()),
            documents.clone(),
            Arc::new(RejectingRecordStore { error: transient() }),
        );

        let mut params = sample_params("user1");
        params.identification_document = Some(document());
        let err = registry.register_patient(params).await.unwrap_err();

        match err {
            RegistryError::CleanupAfterRecordFailed {
                record_error,
                cleanup_error,
                ..
            } => {
                assert!(matches!(*record_error, RegistryError::RecordStore(_)));
                assert!(matches!(cleanup_error, ServiceError::Transient(_)));
            }
            other => panic!("expected CleanupAfterRecordFailed, got {other:?}"),
        }
        assert_eq!(documents.inner.len(), 1, "file remains orphaned");
    }

    #[tokio::test]
    async fn test_upload_failure_creates_no_record() {
        let records = Arc::new(MemoryRecordStore::new());
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(MemoryIdentityService::new()),
            Arc::new(FlakyDocumentStore {
                fail_upload: true,
                ..Default::default()
            }),
            records.clone(),
        );

        let mut params = sample_params("user1");
        params.identification_document = Some(document());
        let err = registry.register_patient(params).await.unwrap_err();

        assert!(matches!(err, RegistryError::DocumentStore(ServiceError::Upload(_))));
        assert!(records.is_empty());
    }

    #[tokio::test]
    async fn test_record_store_conflict_maps_to_duplicate_patient() {
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(MemoryIdentityService::new()),
            Arc::new(MemoryDocumentStore::new()),
            Arc::new(RejectingRecordStore {
                error: ServiceError::Conflict(ServiceFailure::new("exists").with_code(409)),
            }),
        );

        let err = registry
            .register_patient(sample_params("user1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::PatientAlreadyRegistered { .. }));
    }

    #[tokio::test]
    async fn test_get_patient_round_trip() {
        let h = harness();
        let user_id = UniqueId::parse("user1").unwrap();

        assert_eq!(h.registry.get_patient(&user_id).await.unwrap(), None);

        let registered = h
            .registry
            .register_patient(sample_params("user1"))
            .await
            .unwrap();
        let fetched = h
            .registry
            .get_patient(&user_id)
            .await
            .unwrap()
            .expect("patient should be found");

        assert_eq!(fetched, registered);
        assert_eq!(fetched.record.name, "Jane Doe");
        assert_eq!(fetched.record.insurance_policy_number, "POL-123");
        assert_eq!(fetched.record.emergency_contact_number, "+15555550101");
    }

    #[tokio::test]
    async fn test_unreadable_created_record_keeps_uploaded_document() {
        let documents = Arc::new(MemoryDocumentStore::new());
        let records = Arc::new(LossyRecordStore::default());
        let observer = Arc::new(RecordingObserver::default());
        let registry = PatientRegistry::new(
            test_cfg(),
            Arc::new(MemoryIdentityService::new()),
            documents.clone(),
            records.clone(),
        )
        .with_observer(observer.clone());

        let mut params = sample_params("user1");
        params.identification_document = Some(document());
        let err = registry.register_patient(params).await.unwrap_err();

        assert!(matches!(err, RegistryError::UnreadableCreatedRecord { .. }));
        assert_eq!(records.inner.len(), 1, "record was written");
        assert_eq!(documents.len(), 1, "referenced file must survive");

        let names = observer.names();
        assert!(names.contains(&"unreadable_record"));
        assert!(!names.contains(&"upload_compensated"));
    }

    #[tokio::test]
    async fn test_malformed_existing_record_still_blocks_registration() {
        let h = harness();
        let malformed = json!({ "userId": "user1" });
        h.records
            .create_document(
                h.registry.config().database_id(),
                h.registry.config().patient_collection_id(),
                &UniqueId::parse("d1").unwrap(),
                malformed.as_object().unwrap(),
            )
            .await
            .unwrap();

        let err = h
            .registry
            .register_patient(sample_params("user1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::PatientAlreadyRegistered { .. }));

        let err = h
            .registry
            .get_patient(&UniqueId::parse("user1").unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, RegistryError::Deserialization(_)));
        assert!(h.observer.names().contains(&"unreadable_record"));
    }
}
