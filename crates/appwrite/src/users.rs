//! Users API.

use crate::client::AppwriteClient;
use crate::query;
use async_trait::async_trait;
use registry_core::constants::EMAIL_ATTRIBUTE;
use registry_core::{
    EmailAddress, IdentityService, NewUser, Query, ServiceResult, UniqueId, UserAccount,
};
use reqwest::Method;
use serde::Deserialize;
use serde_json::json;

#[derive(Debug, Deserialize)]
struct UserBody {
    #[serde(rename = "$id")]
    id: UniqueId,
    #[serde(default)]
    email: String,
    #[serde(default)]
    phone: String,
    #[serde(default)]
    name: String,
}

impl From<UserBody> for UserAccount {
    fn from(body: UserBody) -> Self {
        UserAccount {
            id: body.id,
            email: body.email,
            phone: body.phone,
            name: body.name,
        }
    }
}

#[derive(Debug, Deserialize)]
struct UserList {
    #[serde(default)]
    users: Vec<UserBody>,
}

#[async_trait]
impl IdentityService for AppwriteClient {
    async fn create(&self, user_id: &UniqueId, user: &NewUser) -> ServiceResult<UserAccount> {
        let body = json!({
            "userId": user_id.as_str(),
            "email": user.email.as_str(),
            "phone": user.phone.as_str(),
            "name": user.name.as_str(),
        });

        let created: UserBody = self
            .send_json(self.request(Method::POST, "/users").json(&body))
            .await?;
        Ok(created.into())
    }

    async fn get(&self, user_id: &UniqueId) -> ServiceResult<UserAccount> {
        let path = format!("/users/{}", user_id);
        let user: UserBody = self.send_json(self.request(Method::GET, &path)).await?;
        Ok(user.into())
    }

    async fn list_by_email(&self, email: &EmailAddress) -> ServiceResult<Vec<UserAccount>> {
        let queries = [Query::equal(EMAIL_ATTRIBUTE, email.as_str())];
        let list: UserList = self
            .send_json(
                self.request(Method::GET, "/users")
                    .query(&query::params(&queries)),
            )
            .await?;

        Ok(list.users.into_iter().map(UserAccount::from).collect())
    }
}
