//! Catalog API account session: login, logout, registration, current user.

use reqwest::Method;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::error::CatalogError;
use crate::types::{RemoteSession, RemoteUser};

use super::{decode_record, send, CatalogClient};

#[derive(Debug, Deserialize)]
struct LoginBody {
    #[serde(alias = "access_token")]
    token: String,
    #[serde(default)]
    user: Option<RemoteUser>,
}

impl CatalogClient {
    /// Exchanges credentials for a bearer token and stores it in this
    /// client's token slot.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Status`] (typically 401) for bad credentials,
    /// [`CatalogError::Validation`] for rejected fields, or
    /// [`CatalogError::Deserialize`] if the response carries no token.
    pub async fn login(&self, email: &str, password: &str) -> Result<RemoteSession, CatalogError> {
        let request = self
            .request(Method::POST, "login")?
            .json(&json!({ "email": email, "password": password }));
        let body = self.execute(request, "login").await?;

        // The token sits either at the top level or inside `data`.
        let record = match body.get("data") {
            Some(data) if data.get("token").is_some() || data.get("access_token").is_some() => {
                data.clone()
            }
            _ => body,
        };
        let login: LoginBody =
            serde_json::from_value(record).map_err(|source| CatalogError::Deserialize {
                context: "login".to_string(),
                source,
            })?;

        self.set_token(Some(login.token.clone())).await;
        tracing::info!("catalog session opened");
        Ok(RemoteSession {
            token: login.token,
            user: login.user,
        })
    }

    /// Clears the stored token, then revokes it remotely.
    ///
    /// The local token is gone even when the remote call fails. Without a
    /// token this is a no-op.
    ///
    /// # Errors
    ///
    /// Any error from the revoke request.
    pub async fn logout(&self) -> Result<(), CatalogError> {
        let Some(token) = self.token.write().await.take() else {
            return Ok(());
        };
        let request = self.request(Method::POST, "logout")?.bearer_auth(token);
        send(request, "logout").await?;
        tracing::info!("catalog session closed");
        Ok(())
    }

    /// Creates an account. `redirect_url` is where the confirmation email
    /// sends the user back to.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Validation`] for rejected fields (e.g. a taken email),
    /// otherwise transport or status errors.
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
        redirect_url: &str,
    ) -> Result<RemoteUser, CatalogError> {
        let request = self.request(Method::POST, "register")?.json(&json!({
            "name": name,
            "email": email,
            "password": password,
            "password_confirmation": password,
            "redirect_url": redirect_url,
        }));
        let body = self.execute(request, "register").await?;
        decode_record(body, "user", "registered user")
    }

    /// The account behind the current token.
    ///
    /// # Errors
    ///
    /// [`CatalogError::Status`] with 401 when the token is missing or
    /// expired.
    pub async fn current_user(&self) -> Result<RemoteUser, CatalogError> {
        let request = self.request(Method::GET, "user")?;
        let body: Value = self.execute(request, "current user").await?;
        decode_record(body, "user", "current user")
    }
}
