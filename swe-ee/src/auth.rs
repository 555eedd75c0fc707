/// Obtaining access tokens, with an interactive fallback
use crate::{
    credentials::{AccessToken, Credentials, CREDENTIALS_ENV, SCOPES},
    error::{EeError, Result},
};
use log::{debug, info, warn};
use reqwest::Client;
use std::ffi::OsString;
use std::path::PathBuf;
use tokio::process::Command;

/// Source of bearer tokens for a [`crate::session::Session`].
#[allow(async_fn_in_trait)]
pub trait Authenticator {
    /// Obtain an access token from stored credentials.
    async fn access_token(&self, client: &Client) -> Result<AccessToken>;

    /// Run the interactive consent flow that refreshes stored credentials.
    /// May open a browser.
    async fn reauthenticate(&self) -> Result<()>;
}

/// Application Default Credentials, refreshed through the gcloud CLI.
#[derive(Debug, Clone)]
pub struct ApplicationDefault {
    credentials_path: Option<PathBuf>,
    token_endpoint: Option<String>,
    login_program: String,
}

impl Default for ApplicationDefault {
    fn default() -> Self {
        ApplicationDefault {
            credentials_path: None,
            token_endpoint: None,
            login_program: "gcloud".to_string(),
        }
    }
}

impl ApplicationDefault {
    pub fn new() -> ApplicationDefault {
        ApplicationDefault::default()
    }

    /// Read credentials from `path` instead of the default location.
    pub fn with_credentials_path(mut self, path: PathBuf) -> ApplicationDefault {
        self.credentials_path = Some(path);
        self
    }

    pub fn with_token_endpoint(mut self, endpoint: &str) -> ApplicationDefault {
        self.token_endpoint = Some(endpoint.to_string());
        self
    }

    pub fn with_login_program(mut self, program: &str) -> ApplicationDefault {
        self.login_program = program.to_string();
        self
    }

    fn credentials_path(&self) -> Result<PathBuf> {
        self.credentials_path
            .clone()
            .or_else(Credentials::default_path)
            .ok_or_else(|| {
                EeError::Credentials(
                    "no Application Default Credentials location could be determined".to_string(),
                )
            })
    }

    /// The file named by the credentials environment variable, unless an
    /// explicit path was configured.
    fn env_override(&self, env: Option<OsString>) -> Option<PathBuf> {
        match self.credentials_path {
            Some(_) => None,
            None => env.filter(|v| !v.is_empty()).map(PathBuf::from),
        }
    }
}

impl Authenticator for ApplicationDefault {
    async fn access_token(&self, client: &Client) -> Result<AccessToken> {
        let path = self.credentials_path()?;
        let credentials = Credentials::load(&path)?;
        info!(
            "Using {} from {}",
            credentials.describe(),
            path.display()
        );
        if let Some(project) = credentials.project_hint() {
            debug!("Credentials are associated with project {}", project);
        }
        credentials
            .exchange(client, self.token_endpoint.as_deref())
            .await
    }

    async fn reauthenticate(&self) -> Result<()> {
        if let Some(path) = self.env_override(std::env::var_os(CREDENTIALS_ENV)) {
            warn!(
                "{} points to {}; `{} auth application-default login` refreshes the default credentials file instead",
                CREDENTIALS_ENV,
                path.display(),
                self.login_program
            );
        }
        info!(
            "Starting interactive authentication with `{} auth application-default login`",
            self.login_program
        );
        let status = Command::new(&self.login_program)
            .args(["auth", "application-default", "login"])
            .arg(format!("--scopes={}", SCOPES.join(",")))
            .status()
            .await
            .map_err(|e| {
                EeError::InteractiveLogin(format!("failed to launch {}: {}", self.login_program, e))
            })?;
        if !status.success() {
            return Err(EeError::InteractiveLogin(format!(
                "{} exited with {}",
                self.login_program, status
            )));
        }
        Ok(())
    }
}
