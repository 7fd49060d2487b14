//! Request and response bodies for the registry API.
//!
//! Field names are camelCase on the wire to match the stored patient record.

use registry_core::{
    BirthDateInput, IdentificationDocument, NewUser, Patient, RegisterPatientParams,
    RegistryResult, UniqueId, UserAccount,
};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

/// Error body returned with every non-success status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ErrorRes {
    /// Stable machine-readable error code, e.g. `patient_already_registered`.
    pub code: String,
    pub message: String,
}

impl ErrorRes {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            code: code.into(),
            message: message.into(),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct CreateUserReq {
    pub email: String,
    pub phone: String,
    pub name: String,
}

impl CreateUserReq {
    pub fn into_new_user(self) -> RegistryResult<NewUser> {
        NewUser::parse(self.email, self.phone, self.name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct UserRes {
    pub id: String,
    pub email: String,
    pub phone: String,
    pub name: String,
}

impl From<UserAccount> for UserRes {
    fn from(account: UserAccount) -> Self {
        Self {
            id: account.id.to_string(),
            email: account.email,
            phone: account.phone,
            name: account.name,
        }
    }
}

/// A birth date as sent by clients: date-like text or epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BirthDateValue {
    EpochMillis(i64),
    Text(String),
}

impl From<BirthDateValue> for BirthDateInput {
    fn from(value: BirthDateValue) -> Self {
        match value {
            BirthDateValue::EpochMillis(ms) => BirthDateInput::EpochMillis(ms),
            BirthDateValue::Text(text) => BirthDateInput::Text(text),
        }
    }
}

/// Patient details sent in the `patient` part of a registration form.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPatientReq {
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    /// ISO 8601 date or date-time, or milliseconds since the Unix epoch. Values without an
    /// offset are read as UTC.
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "1990-05-01")]
    pub birth_date: Option<BirthDateValue>,
    pub gender: String,
    pub address: String,
    pub occupation: String,
    pub emergency_contact_name: String,
    pub emergency_contact_number: String,
    pub primary_physician: String,
    pub insurance_provider: String,
    pub insurance_policy_number: String,
    #[serde(default)]
    pub allergies: Option<String>,
    #[serde(default)]
    pub current_medication: Option<String>,
    #[serde(default)]
    pub family_medical_history: Option<String>,
    #[serde(default)]
    pub past_medical_history: Option<String>,
    #[serde(default)]
    pub identification_type: Option<String>,
    #[serde(default)]
    pub identification_number: Option<String>,
    pub privacy_consent: bool,
}

impl RegisterPatientReq {
    pub fn into_params(
        self,
        identification_document: Option<IdentificationDocument>,
    ) -> RegistryResult<RegisterPatientParams> {
        Ok(RegisterPatientParams {
            user_id: UniqueId::parse(&self.user_id)?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            gender: self.gender,
            address: self.address,
            occupation: self.occupation,
            emergency_contact_name: self.emergency_contact_name,
            emergency_contact_number: self.emergency_contact_number,
            primary_physician: self.primary_physician,
            insurance_provider: self.insurance_provider,
            insurance_policy_number: self.insurance_policy_number,
            allergies: self.allergies,
            current_medication: self.current_medication,
            family_medical_history: self.family_medical_history,
            past_medical_history: self.past_medical_history,
            identification_type: self.identification_type,
            identification_number: self.identification_number,
            birth_date: self.birth_date.map(BirthDateInput::from),
            privacy_consent: self.privacy_consent,
            identification_document,
        })
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PatientRes {
    /// Record store document id.
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birth_date: Option<String>,
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
    pub identification_document_id: Option<String>,
    pub identification_document_url: Option<String>,
    pub privacy_consent: bool,
}

impl From<Patient> for PatientRes {
    fn from(patient: Patient) -> Self {
        let (document_id, document_url) = match patient.record.identification_document() {
            Some((id, url)) => (Some(id.to_string()), Some(url.to_string())),
            None => (None, None),
        };
        let record = patient.record;

        Self {
            id: patient.id.to_string(),
            user_id: record.user_id.to_string(),
            name: record.name,
            email: record.email,
            phone: record.phone,
            birth_date: record.birth_date,
            gender: record.gender,
            address: record.address,
            occupation: record.occupation,
            emergency_contact_name: record.emergency_contact_name,
            emergency_contact_number: record.emergency_contact_number,
            primary_physician: record.primary_physician,
            insurance_provider: record.insurance_provider,
            insurance_policy_number: record.insurance_policy_number,
            allergies: record.allergies,
            current_medication: record.current_medication,
            family_medical_history: record.family_medical_history,
            past_medical_history: record.past_medical_history,
            identification_type: record.identification_type,
            identification_number: record.identification_number,
            identification_document_id: document_id,
            identification_document_url: document_url,
            privacy_consent: record.privacy_consent,
        }
    }
}
