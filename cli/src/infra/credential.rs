//! Infrastructure implementation of the `CredentialProvider` port.
//!
//! Tokens come from the Azure CLI's cached login, so the tool never handles
//! user secrets itself. `TokenCache` keeps the current token and replaces it
//! before it expires or once the provider rejects it.

use std::time::Duration;

use anyhow::Result;
use chrono::{DateTime, Local, NaiveDateTime, TimeZone, Utc};
use serde::Deserialize;
use tokio::sync::Mutex;

use crate::application::ports::{AccessToken, CommandRunner, CredentialProvider};
use crate::domain::CredentialError;

const AZ: &str = "az";

/// A cached token is replaced once it is this close to expiry.
pub const REFRESH_MARGIN: Duration = Duration::from_secs(300);

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AzToken {
    access_token: String,
    /// Local wall-clock time, e.g. `2026-10-18 12:00:00.000000`.
    #[serde(default)]
    expires_on: Option<String>,
    /// POSIX timestamp, only printed by newer CLI releases.
    #[serde(default, rename = "expires_on")]
    expires_at: Option<i64>,
}

impl AzToken {
    fn expiry(&self) -> Option<DateTime<Utc>> {
        if let Some(ts) = self.expires_at {
            return DateTime::from_timestamp(ts, 0);
        }
        let naive =
            NaiveDateTime::parse_from_str(self.expires_on.as_deref()?, "%Y-%m-%d %H:%M:%S%.f")
                .ok()?;
        Local
            .from_local_datetime(&naive)
            .earliest()
            .map(|t| t.with_timezone(&Utc))
    }
}

/// Acquires management-plane tokens with `az account get-access-token`.
pub struct AzCliCredential<R> {
    runner: R,
    resource: String,
}

impl<R: CommandRunner> AzCliCredential<R> {
    /// `endpoint` is the Resource Manager base URL the token is scoped to.
    pub fn new(runner: R, endpoint: &str) -> Self {
        Self {
            runner,
            resource: format!("{}/", endpoint.trim_end_matches('/')),
        }
    }
}

impl<R: CommandRunner> CredentialProvider for AzCliCredential<R> {
    async fn access_token(&self, subscription_id: &str) -> Result<AccessToken> {
        let args = [
            "account",
            "get-access-token",
            "--resource",
            self.resource.as_str(),
            "--subscription",
            subscription_id,
            "--output",
            "json",
        ];
        let output = match self.runner.run(AZ, &args).await {
            Ok(o) => o,
            Err(e) if spawn_not_found(&e) => return Err(CredentialError::CliMissing.into()),
            Err(e) => return Err(e),
        };
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(CredentialError::NotLoggedIn(stderr).into());
        }
        let token: AzToken = serde_json::from_slice(&output.stdout)
            .map_err(|e| CredentialError::Malformed(e.to_string()))?;
        if token.access_token.is_empty() {
            return Err(CredentialError::Malformed("empty accessToken".into()).into());
        }
        let expires_on = token.expiry();
        tracing::debug!(expires_on = ?expires_on, "acquired access token");
        Ok(AccessToken {
            token: token.access_token,
            expires_on,
        })
    }
}

fn spawn_not_found(err: &anyhow::Error) -> bool {
    err.chain()
        .filter_map(|e| e.downcast_ref::<std::io::Error>())
        .any(|e| e.kind() == std::io::ErrorKind::NotFound)
}

/// The current token of one subscription, reacquired from `C` when needed.
pub struct TokenCache<C> {
    credential: C,
    subscription_id: String,
    current: Mutex<AccessToken>,
}

impl<C: CredentialProvider> TokenCache<C> {
    /// Start from `token`, already acquired from `credential`.
    pub fn new(credential: C, subscription_id: &str, token: AccessToken) -> Self {
        Self {
            credential,
            subscription_id: subscription_id.to_string(),
            current: Mutex::new(token),
        }
    }

    /// The bearer token to send now. Reacquired first when it expires within
    /// `REFRESH_MARGIN`.
    ///
    /// # Errors
    ///
    /// Returns the credential failure if a new token cannot be acquired.
    pub async fn bearer(&self) -> Result<String> {
        let mut current = self.current.lock().await;
        if current.expires_within(REFRESH_MARGIN, Utc::now()) {
            tracing::info!("Access token is about to expire, acquiring a new one");
            *current = self.credential.access_token(&self.subscription_id).await?;
        }
        Ok(current.token.clone())
    }

    /// Replace `rejected` after the provider refused it. A caller holding a
    /// token that was already replaced gets the newer one.
    ///
    /// # Errors
    ///
    /// Returns the credential failure if a new token cannot be acquired.
    pub async fn refresh(&self, rejected: &str) -> Result<String> {
        let mut current = self.current.lock().await;
        if current.token == rejected {
            tracing::info!("Access token was rejected, acquiring a new one");
            *current = self.credential.access_token(&self.subscription_id).await?;
        }
        Ok(current.token.clone())
    }
}
