//! Authentication commands: signup, login, logout, whoami.
//!
//! Login and signup exchange form-encoded credentials for a bearer token;
//! the token and username are persisted via [`crate::session`] so later
//! invocations stay signed in.

use anyhow::Result;

use crate::client::{ApiClient, ApiError};
use crate::config::Config;
use crate::session::{self, Session};

/// Build a client carrying the stored bearer token. Fails with a login
/// hint when no session exists.
pub fn client_for(config: &Config) -> Result<ApiClient> {
    let session = session::load(&config.session.path)?
        .ok_or_else(|| anyhow::anyhow!("Not logged in. Run `dc login <username>` first."))?;
    Ok(ApiClient::new(config, Some(session.token))?)
}

/// Translate API errors into actionable CLI errors. An expired token gets
/// the forced-logout treatment: the stale session file is removed and the
/// user is told to log in again.
pub fn advise(config: &Config, error: ApiError) -> anyhow::Error {
    match error {
        ApiError::Unauthorized => {
            let _ = session::clear(&config.session.path);
            anyhow::anyhow!("Session expired. Run `dc login <username>` to sign in again.")
        }
        other => anyhow::Error::from(other),
    }
}

pub async fn run_signup(config: &Config, username: &str, password: &str) -> Result<()> {
    let client = ApiClient::new(config, None)?;
    client.signup(username, password).await?;
    println!("User created successfully.");

    // Sign in right away so the first upload works without a second step.
    let login = client.login(username, password).await?;
    session::save(
        &config.session.path,
        &Session::new(login.access_token, username),
    )?;
    println!("Logged in as {}.", username);
    Ok(())
}

pub async fn run_login(config: &Config, username: &str, password: &str) -> Result<()> {
    let client = ApiClient::new(config, None)?;
    let login = client.login(username, password).await?;
    session::save(
        &config.session.path,
        &Session::new(login.access_token, username),
    )?;
    println!("Logged in as {}.", username);
    Ok(())
}

pub fn run_logout(config: &Config) -> Result<()> {
    session::clear(&config.session.path)?;
    println!("Logged out.");
    Ok(())
}

pub fn run_whoami(config: &Config) -> Result<()> {
    match session::load(&config.session.path)? {
        Some(session) => println!("{}", session.username),
        None => println!("Not logged in."),
    }
    Ok(())
}
