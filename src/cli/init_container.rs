use std::fs;
use std::path::Path;

use anyhow::bail;

use super::http_client::ApiClient;

/// Writes the server's certificate bundle to `path` so a registry container
/// can start with it as its token root.
pub fn run_init_container(server: &str, path: &Path) -> anyhow::Result<()> {
    let client = ApiClient::anonymous(server)?;
    let bundle = client.get_text("/certs/pem")?;

    if bundle.trim().is_empty() {
        bail!("{} has no active certificates", client.base_url());
    }

    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    fs::write(path, bundle)?;

    tracing::info!("wrote certificate bundle to {}", path.display());
    Ok(())
}
