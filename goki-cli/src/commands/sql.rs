//! `goki sql` command

use anyhow::Result;
use goki_core::{AdminClient, ClusterConfig, NodeId, SandboxClient, ShellAuth};

/// Pick the shell credentials. An explicit user wins over `--non-root`.
fn shell_auth(
    config: &ClusterConfig,
    non_root: bool,
    user: Option<String>,
    password: Option<String>,
) -> ShellAuth {
    match user {
        Some(user) => ShellAuth::Password { user, password: password.unwrap_or_default() },
        None if non_root => ShellAuth::Password {
            user: config.non_root_user.clone(),
            password: config.non_root_password.clone(),
        },
        None => ShellAuth::RootCertificate,
    }
}

pub async fn sql(
    config: &ClusterConfig,
    client: &dyn SandboxClient,
    id: i64,
    non_root: bool,
    user: Option<String>,
    password: Option<String>,
) -> Result<()> {
    let node = NodeId::new(id)?;
    let auth = shell_auth(config, non_root, user, password);
    AdminClient::new(client, config).shell(node, &auth).await?;
    Ok(())
}
