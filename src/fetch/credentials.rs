//! Credential lookup for HTTPS remotes
//!
//! Credentials come from the user's configured git credential helpers through
//! `git credential fill`. Interactive prompting is disabled, so a missing
//! helper simply yields no credentials.

use crate::fetch::error::CredentialError;
use async_trait::async_trait;
use std::process::Stdio;
use std::time::Duration;
use tokio::io::AsyncWriteExt;

/// Time budget for one `git credential fill` invocation
pub const CREDENTIAL_TIMEOUT: Duration = Duration::from_secs(10);

/// What a credential helper is asked for
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequest {
    pub protocol: String,
    pub host: String,
    pub path: Option<String>,
}

impl CredentialRequest {
    /// Build a request from a remote URL.
    ///
    /// The path loses its leading `/` and trailing `.git`; an empty path is
    /// omitted. A non-default port stays part of the host.
    pub fn from_url(url: &str) -> Result<Self, CredentialError> {
        let parsed = gix_url::parse(gix::bstr::BStr::new(url)).map_err(|e| {
            CredentialError::InvalidUrl {
                url: url.to_string(),
                message: e.to_string(),
            }
        })?;

        let host = match (parsed.host(), parsed.port) {
            (Some(host), Some(port)) => format!("{}:{}", host, port),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(CredentialError::InvalidUrl {
                    url: url.to_string(),
                    message: "missing host".to_string(),
                })
            }
        };

        let raw_path = parsed.path.to_string();
        let path = raw_path.trim_start_matches('/');
        let path = path.strip_suffix(".git").unwrap_or(path);

        Ok(Self {
            protocol: parsed.scheme.as_str().to_string(),
            host,
            path: (!path.is_empty()).then(|| path.to_string()),
        })
    }

    /// Input for `git credential fill`, terminated by a blank line
    pub fn to_helper_input(&self) -> String {
        let mut input = format!("protocol={}\nhost={}\n", self.protocol, self.host);
        if let Some(path) = &self.path {
            input.push_str(&format!("path={}\n", path));
        }
        input.push('\n');
        input
    }
}

/// Username/password pair for HTTP basic authentication
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn password(&self) -> &str {
        &self.password
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Source of credentials for a remote
#[async_trait]
pub trait CredentialResolver: Send + Sync {
    async fn resolve(&self, request: &CredentialRequest) -> Result<Credentials, CredentialError>;
}

/// Resolver that asks `git credential fill`
#[derive(Debug, Clone)]
pub struct GitCredentialHelper {
    timeout: Duration,
}

impl Default for GitCredentialHelper {
    fn default() -> Self {
        Self {
            timeout: CREDENTIAL_TIMEOUT,
        }
    }
}

impl GitCredentialHelper {
    pub fn with_timeout(timeout: Duration) -> Self {
        Self { timeout }
    }
}

#[async_trait]
impl CredentialResolver for GitCredentialHelper {
    async fn resolve(&self, request: &CredentialRequest) -> Result<Credentials, CredentialError> {
        log::debug!(
            "Running git credential fill for protocol={} host={}",
            request.protocol,
            request.host
        );

        let mut child = tokio::process::Command::new("git")
            .args(["credential", "fill"])
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| CredentialError::Helper {
                message: e.to_string(),
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(request.to_helper_input().as_bytes())
                .await
                .map_err(|e| CredentialError::Helper {
                    message: e.to_string(),
                })?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| CredentialError::Timeout(self.timeout))?
            .map_err(|e| CredentialError::Helper {
                message: e.to_string(),
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            log::debug!("git credential fill failed: {}", stderr.trim());
            return Err(CredentialError::Helper {
                message: output.status.to_string(),
            });
        }

        parse_helper_output(&String::from_utf8_lossy(&output.stdout))
    }
}

/// Resolver that never has credentials
#[derive(Debug, Clone, Copy, Default)]
pub struct NoCredentials;

#[async_trait]
impl CredentialResolver for NoCredentials {
    async fn resolve(&self, _request: &CredentialRequest) -> Result<Credentials, CredentialError> {
        Err(CredentialError::NotFound)
    }
}

/// Parse `key=value` lines from a credential helper.
///
/// Both username and password must be present and non-empty.
pub fn parse_helper_output(output: &str) -> Result<Credentials, CredentialError> {
    let mut username = None;
    let mut password = None;

    for line in output.lines() {
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        match key {
            "username" => username = Some(value),
            "password" => password = Some(value),
            _ => {}
        }
    }

    match (username, password) {
        (Some(user), Some(pass)) if !user.is_empty() && !pass.is_empty() => {
            Ok(Credentials::new(user, pass))
        }
        _ => {
            log::debug!(
                "Credentials incomplete: username={} password={}",
                username.is_some_and(|u| !u.is_empty()),
                password.is_some_and(|p| !p.is_empty())
            );
            Err(CredentialError::NotFound)
        }
    }
}

/// Whether `url` uses the https scheme (case-insensitive)
pub fn is_https_url(url: &str) -> bool {
    url.split_once("://")
        .is_some_and(|(scheme, _)| scheme.eq_ignore_ascii_case("https"))
}

/// Credentials for `url`, if it is HTTPS and a resolver has some.
///
/// Lookup failures are logged and treated as "no credentials".
pub async fn credentials_for_url(
    resolver: &dyn CredentialResolver,
    url: &str,
) -> Option<Credentials> {
    if !is_https_url(url) {
        log::debug!("URL {} is not HTTPS, skipping credential lookup", url);
        return None;
    }

    let request = match CredentialRequest::from_url(url) {
        Ok(request) => request,
        Err(e) => {
            log::debug!("{}", e);
            return None;
        }
    };

    match resolver.resolve(&request).await {
        Ok(credentials) => {
            log::debug!(
                "Using credentials for {} (username: {})",
                url,
                credentials.username
            );
            Some(credentials)
        }
        Err(CredentialError::NotFound) => {
            log::debug!("No credentials found for {}", url);
            None
        }
        Err(e) => {
            log::debug!("Failed to get credentials for {}: {}", url, e);
            None
        }
    }
}
