use crate::{ApiError, AppState};
use api_shared::{
    CreateUserReq, ErrorRes, HealthRes, HealthService, PatientRes, RegisterPatientReq, UserRes,
};
use axum::extract::{Multipart, Path, State};
use axum::http::StatusCode;
use axum::Json;
use registry_core::constants::{BLOB_FILE_FIELD, FILE_NAME_FIELD};
use registry_core::{IdentificationDocument, RegistryError, UniqueId};
use serde::Deserialize;
use utoipa::ToSchema;

/// Form part carrying the JSON-encoded [`RegisterPatientReq`].
pub(crate) const PATIENT_FIELD: &str = "patient";

/// Multipart form accepted by `POST /patients`.
#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[allow(dead_code)]
pub(crate) struct RegisterPatientForm {
    /// JSON-encoded patient details.
    patient: RegisterPatientReq,
    /// Identification document contents.
    #[schema(value_type = Option<String>, format = Binary)]
    blob_file: Option<Vec<u8>>,
    /// Name of the identification document. Falls back to the `blobFile` part's filename.
    file_name: Option<String>,
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for the REST API
///
/// Used for monitoring and load balancer health checks. Does not require an API key.
///
/// # Returns
/// * `Json<HealthRes>` - Health status response
pub(crate) async fn health() -> Json<HealthRes> {
    Json(HealthService::check_health())
}

#[utoipa::path(
    post,
    path = "/users",
    request_body = CreateUserReq,
    responses(
        (status = 200, description = "Created account, or the existing account for this email", body = UserRes),
        (status = 400, description = "Invalid email, phone or name", body = ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 502, description = "Identity service failure", body = ErrorRes)
    )
)]
/// Create a user account
///
/// Creating an account for an email that is already registered returns the existing account.
///
/// # Returns
/// * `Ok(Json<UserRes>)` - The created or existing account
/// * `Err(ApiError)` - Invalid input, missing key or identity service failure
pub(crate) async fn create_user(
    State(state): State<AppState>,
    Json(req): Json<CreateUserReq>,
) -> Result<Json<UserRes>, ApiError> {
    let user = req.into_new_user()?;
    let account = state.registry.create_user(user).await?;
    Ok(Json(account.into()))
}

#[utoipa::path(
    get,
    path = "/users/{id}",
    params(("id" = String, Path, description = "User account id")),
    responses(
        (status = 200, description = "User account", body = UserRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 404, description = "No account with this id", body = ErrorRes)
    )
)]
/// Fetch a user account by id
///
/// # Returns
/// * `Ok(Json<UserRes>)` - The account
/// * `Err(ApiError)` - 400 for a malformed id, 404 when no account has this id
pub(crate) async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<UserRes>, ApiError> {
    let user_id = UniqueId::parse(&id).map_err(RegistryError::from)?;

    match state.registry.get_user(&user_id).await? {
        Some(account) => Ok(Json(account.into())),
        None => Err(ApiError::not_found(format!("user {} not found", user_id))),
    }
}

#[utoipa::path(
    post,
    path = "/patients",
    request_body(content = RegisterPatientForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Patient registered", body = PatientRes),
        (status = 400, description = "Malformed form, patient details or birth date", body = ErrorRes),
        (status = 401, description = "Missing or invalid API key", body = ErrorRes),
        (status = 409, description = "A patient is already registered for this user", body = ErrorRes),
        (status = 422, description = "The record store rejected the patient record", body = ErrorRes),
        (status = 502, description = "Backend failure", body = ErrorRes)
    )
)]
/// Register a patient
///
/// The `patient` part holds the JSON patient details. An identification document may be sent
/// as a `blobFile` part, named by a `fileName` part or by the part's own filename. An empty
/// `blobFile` part counts as no document.
///
/// # Returns
/// * `Ok((StatusCode::CREATED, Json<PatientRes>))` - The stored patient record
/// * `Err(ApiError)` - Bad form, duplicate patient, rejected record or backend failure
pub(crate) async fn register_patient(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<PatientRes>), ApiError> {
    let mut patient: Option<RegisterPatientReq> = None;
    let mut blob: Option<Vec<u8>> = None;
    let mut blob_part_seen = false;
    let mut part_file_name: Option<String> = None;
    let mut file_name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::bad_request(e.body_text()))?
    {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some(PATIENT_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                let req = serde_json::from_str::<RegisterPatientReq>(&text).map_err(|e| {
                    ApiError::bad_request(format!("invalid '{}' part: {}", PATIENT_FIELD, e))
                })?;
                patient = Some(req);
            }
            Some(BLOB_FILE_FIELD) => {
                part_file_name = field
                    .file_name()
                    .filter(|n| !n.is_empty())
                    .map(str::to_string);
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                blob_part_seen = true;
                blob = Some(bytes.to_vec()).filter(|b| !b.is_empty());
            }
            Some(FILE_NAME_FIELD) => {
                let text = field
                    .text()
                    .await
                    .map_err(|e| ApiError::bad_request(e.body_text()))?;
                file_name = Some(text);
            }
            other => {
                tracing::debug!("ignoring form part {:?}", other);
            }
        }
    }

    let patient = patient.ok_or_else(|| {
        ApiError::bad_request(format!("missing '{}' part", PATIENT_FIELD))
    })?;
    // An empty `blobFile` part means no file was chosen; its name goes with it.
    let file_name = match &blob {
        Some(_) => file_name.or(part_file_name),
        None if blob_part_seen => None,
        None => file_name.filter(|n| !n.is_empty()),
    };

    let document = IdentificationDocument::from_form_parts(blob, file_name)?;
    let params = patient.into_params(document)?;
    let registered = state.registry.register_patient(params).await?;

    Ok((StatusCode::CREATED, Json(registered.into())))
}

#[utoipa::path(
    get,
    path = "/patients/{user_id}",
    params(("user_id" = String, Path, description = "User account id the patient is registered for")),
    responses(
        (status = 200, description = "Patient record", body = PatientRes),
        (status = 400, description = "Malformed id", body = ErrorRes),
        (status = 404, description = "No patient registered for this user", body = ErrorRes)
    )
)]
/// Fetch the patient registered for a user account
///
/// # Returns
/// * `Ok(Json<PatientRes>)` - The stored patient record
/// * `Err(ApiError)` - 400 for a malformed id, 404 when the user has no patient record
pub(crate) async fn get_patient(
    State(state): State<AppState>,
    Path(user_id): Path<String>,
) -> Result<Json<PatientRes>, ApiError> {
    let user_id = UniqueId::parse(&user_id).map_err(RegistryError::from)?;

    match state.registry.get_patient(&user_id).await? {
        Some(patient) => Ok(Json(patient.into())),
        None => Err(ApiError::not_found(format!(
            "no patient registered for user {}",
            user_id
        ))),
    }
}
