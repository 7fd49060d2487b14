//! User account types.

use registry_id::UniqueId;
use registry_types::{EmailAddress, NonEmptyText};
use serde::{Deserialize, Serialize};

/// An account held by the identity service.
///
/// The email is the account's identity; the id is assigned when the account is created.
/// `email` and `phone` are kept as plain strings because the identity service allows
/// accounts that were created through other channels to leave either empty.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserAccount {
    pub id: UniqueId,
    pub email: String,
    pub phone: String,
    pub name: String,
}

/// Details supplied when creating an account.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct NewUser {
    pub email: EmailAddress,
    pub phone: NonEmptyText,
    pub name: NonEmptyText,
}

impl NewUser {
    /// Validates raw request values into a `NewUser`.
    pub fn parse(
        email: impl AsRef<str>,
        phone: impl AsRef<str>,
        name: impl AsRef<str>,
    ) -> crate::RegistryResult<Self> {
        Ok(Self {
            email: EmailAddress::parse(email)?,
            phone: NonEmptyText::new(phone)?,
            name: NonEmptyText::new(name)?,
        })
    }
}
