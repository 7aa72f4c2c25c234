//! Login, logout, and identity.

use std::io::Write;

use secrecy::SecretString;
use tokio::io::{AsyncBufReadExt, BufReader};

use super::{CliError, Context, stdout};

/// Log in and persist the session.
pub async fn login(ctx: &Context, username: &str, password: Option<String>) -> Result<(), CliError> {
    let password = match password {
        Some(p) => SecretString::from(p),
        None => read_password().await?,
    };

    // A rejection is reported once, by `main`
    ctx.client.login(username, &password).await?;
    let role = ctx
        .client
        .session()
        .identity()
        .await
        .map(|staff| staff.role.to_string())
        .unwrap_or_default();
    writeln!(stdout(), "Logged in as {username} ({role})")?;
    Ok(())
}

async fn read_password() -> Result<SecretString, CliError> {
    let mut line = String::new();
    BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    let password = line.trim_end_matches(['\r', '\n']);
    if password.is_empty() {
        return Err(CliError::MissingPassword);
    }
    Ok(SecretString::from(password.to_owned()))
}

pub async fn logout(ctx: &Context) -> Result<(), CliError> {
    ctx.client.logout().await;
    writeln!(stdout(), "Logged out")?;
    Ok(())
}

/// Show who is logged in, from the stored token or from the backend.
pub async fn whoami(ctx: &Context, remote: bool) -> Result<(), CliError> {
    if remote {
        ctx.watch_session();
        let me = ctx.client.me().await?;
        writeln!(
            stdout(),
            "{} ({}) since {}",
            me.username,
            me.role,
            me.created_at.format("%Y-%m-%d")
        )?;
        return Ok(());
    }

    let session = ctx.client.session();
    let identity = session.identity().await;
    let expires_at = session.expires_at().await;

    let mut out = stdout();
    match identity {
        Some(staff) => {
            write!(out, "{} ({})", staff.username, staff.role)?;
            if let Some(expires_at) = expires_at {
                write!(out, ", token expires {}", expires_at.format("%Y-%m-%d %H:%M UTC"))?;
            }
            writeln!(out)?;
        }
        None => writeln!(out, "Not logged in")?,
    }
    Ok(())
}

pub async fn health(ctx: &Context) -> Result<(), CliError> {
    let health = ctx.client.health().await?;
    writeln!(stdout(), "{} {}", ctx.config.api_url, health.status)?;
    Ok(())
}
