//! Patient registration types and payload assembly.
//!
//! The stored patient record is a flat document in the patient collection. Required fields are
//! copied verbatim from the registration request, `gender` is lowercased and optional fields are
//! only written when the caller supplied a non-empty value. The identification document fields
//! are always written: both null, or both populated from the uploaded file.

use crate::birth_date::BirthDateInput;
use crate::services::StoredDocument;
use crate::{RegistryError, RegistryResult};
use registry_id::UniqueId;
use registry_types::NonEmptyText;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// An identification document awaiting upload.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IdentificationDocument {
    file_name: NonEmptyText,
    bytes: Vec<u8>,
}

impl IdentificationDocument {
    /// # Errors
    ///
    /// Returns [`RegistryError::Text`] for a blank filename and
    /// [`RegistryError::InvalidInput`] for an empty blob.
    pub fn new(file_name: impl AsRef<str>, bytes: Vec<u8>) -> RegistryResult<Self> {
        let file_name = NonEmptyText::new(file_name)?;
        if bytes.is_empty() {
            return Err(RegistryError::InvalidInput(
                "identification document is empty".into(),
            ));
        }
        Ok(Self { file_name, bytes })
    }

    /// Build a document from the optional `blobFile` and `fileName` form entries.
    ///
    /// Returns `Ok(None)` when neither entry is present. Supplying only one of them is an error.
    pub fn from_form_parts(
        blob: Option<Vec<u8>>,
        file_name: Option<String>,
    ) -> RegistryResult<Option<Self>> {
        match (blob, file_name) {
            (None, None) => Ok(None),
            (Some(bytes), Some(name)) => Self::new(name, bytes).map(Some),
            (Some(_), None) => Err(RegistryError::InvalidInput(format!(
                "'{}' supplied without '{}'",
                crate::constants::BLOB_FILE_FIELD,
                crate::constants::FILE_NAME_FIELD
            ))),
            (None, Some(_)) => Err(RegistryError::InvalidInput(format!(
                "'{}' supplied without '{}'",
                crate::constants::FILE_NAME_FIELD,
                crate::constants::BLOB_FILE_FIELD
            ))),
        }
    }

    pub fn file_name(&self) -> &str {
        self.file_name.as_str()
    }

    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }
}

/// Everything a caller supplies to register a patient.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RegisterPatientParams {
    pub user_id: UniqueId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    pub allergies: Option<String>,
    pub current_medication: Option<String>,
    pub family_medical_history: Option<String>,
    pub past_medical_history: Option<String>,
    pub identification_type: Option<String>,
    pub identification_number: Option<String>,
    pub birth_date: Option<BirthDateInput>,
    pub privacy_consent: bool,
    pub identification_document: Option<IdentificationDocument>,
}

/// Where an uploaded identification document can be found.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DocumentLink {
    pub file_id: UniqueId,
    pub url: String,
}

/// The document written to the patient collection.
///
/// Optional fields are skipped when `None`, so an omitted value is absent from the stored
/// record rather than present as null.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PatientRecord {
    pub user_id: UniqueId,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub gender: String,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allergies: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub current_medication: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub family_medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub past_medical_history: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification_number: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,

    #[serde(default)]
    identification_document_id: Option<String>,
    #[serde(default)]
    identification_document_url: Option<String>,

    pub privacy_consent: bool,
}

impl PatientRecord {
    /// Assemble the stored record from a registration request.
    ///
    /// `birth_date` must already be normalised. `document` is the uploaded file, if any.
    pub fn assemble(
        params: RegisterPatientParams,
        birth_date: Option<String>,
        document: Option<&DocumentLink>,
    ) -> Self {
        Self {
            user_id: params.user_id,
            name: params.name,
            email: params.email,
            phone: params.phone,
            gender: params.gender.to_lowercase(),
            address: params.address,
            occupation: params.occupation,
            emergency_contact_name: params.emergency_contact_name,
            emergency_contact_number: params.emergency_contact_number,
            primary_physician: params.primary_physician,
            insurance_provider: params.insurance_provider,
            insurance_policy_number: params.insurance_policy_number,
            allergies: supplied(params.allergies),
            current_medication: supplied(params.current_medication),
            family_medical_history: supplied(params.family_medical_history),
            past_medical_history: supplied(params.past_medical_history),
            identification_type: supplied(params.identification_type),
            identification_number: supplied(params.identification_number),
            birth_date,
            identification_document_id: document.map(|d| d.file_id.to_string()),
            identification_document_url: document.map(|d| d.url.clone()),
            privacy_consent: params.privacy_consent,
        }
    }

    /// The uploaded document's id and URL, present together or not at all.
    pub fn identification_document(&self) -> Option<(&str, &str)> {
        match (
            self.identification_document_id.as_deref(),
            self.identification_document_url.as_deref(),
        ) {
            (Some(id), Some(url)) => Some((id, url)),
            _ => None,
        }
    }

    /// Serialise into the field map sent to the record store.
    pub fn to_payload(&self) -> RegistryResult<Map<String, Value>> {
        match serde_json::to_value(self).map_err(RegistryError::Serialization)? {
            Value::Object(map) => Ok(map),
            other => Err(RegistryError::InvalidInput(format!(
                "patient record serialised to a non-object value: {}",
                other
            ))),
        }
    }
}

/// A patient record as held by the record store.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Patient {
    pub id: UniqueId,
    pub record: PatientRecord,
}

impl Patient {
    /// Read a patient from a stored document's fields.
    pub fn from_document(document: StoredDocument) -> RegistryResult<Self> {
        let record: PatientRecord = serde_json::from_value(Value::Object(document.fields))
            .map_err(RegistryError::Deserialization)?;
        Ok(Self {
            id: document.id,
            record,
        })
    }
}

// An empty value counts as not supplied.
fn supplied(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}
