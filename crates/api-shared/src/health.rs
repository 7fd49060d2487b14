use crate::wire::HealthRes;

/// Health service for the registry API.
///
/// Reports liveness only; it does not contact the backend.
#[derive(Clone, Default)]
pub struct HealthService;

impl HealthService {
    pub fn new() -> Self {
        Self
    }

    /// Static method to check health without creating an instance
    pub fn check_health() -> HealthRes {
        HealthRes {
            ok: true,
            message: "Patient registry is alive".into(),
        }
    }
}
