//! Admin commands over the elevated-role endpoints.
//!
//! These require a bearer token for a user whose role is `admin`; the
//! backend answers 403 otherwise.

use anyhow::Result;

use crate::auth::{advise, client_for};
use crate::config::Config;

pub async fn run_users(config: &Config) -> Result<()> {
    let client = client_for(config)?;
    let users = client.admin_users().await.map_err(|e| advise(config, e))?;

    println!("{:<6} {:<20} {:<8} ASSISTANTS", "ID", "USERNAME", "ROLE");
    for user in &users {
        println!(
            "{:<6} {:<20} {:<8} {}",
            user.id,
            user.username,
            user.role,
            user.assistants.len()
        );
        for a in &user.assistants {
            println!(
                "       - [{}] {} ({}, temp {:.1}, top_k {}, chunks {}/{})",
                a.id, a.name, a.file_name, a.temperature, a.top_k, a.chunk_size, a.chunk_overlap
            );
        }
    }
    Ok(())
}

pub async fn run_delete_user(config: &Config, id: i64) -> Result<()> {
    let client = client_for(config)?;
    client
        .admin_delete_user(id)
        .await
        .map_err(|e| advise(config, e))?;
    println!("deleted user: {}", id);
    Ok(())
}

pub async fn run_delete_assistant(config: &Config, id: i64) -> Result<()> {
    let client = client_for(config)?;
    client
        .admin_delete_assistant(id)
        .await
        .map_err(|e| advise(config, e))?;
    println!("deleted assistant: {}", id);
    Ok(())
}

pub async fn run_grant_admin(config: &Config, id: i64) -> Result<()> {
    let client = client_for(config)?;
    let message = client
        .admin_grant_admin(id)
        .await
        .map_err(|e| advise(config, e))?;
    println!("{}", message);
    Ok(())
}
