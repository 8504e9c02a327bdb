//! Receive flow: resolve a code and download its files.

use std::path::Path;

use dropcode_codes::parse_transfer_code;
use dropcode_protocol::format::format_bytes;
use dropcode_registry::{DbConfig, RestStore, TransferRegistry};
use tracing::warn;

use crate::error::AppError;

pub async fn run(input: &str, out: &Path) -> Result<(), AppError> {
    // Sanitize before any network call; a malformed code fails here.
    let code = parse_transfer_code(input)?;

    let store = RestStore::new(DbConfig::from_env()?)?;
    let transfers = TransferRegistry::new(store);
    let files = transfers.resolve(&code).await?;

    println!("{} file(s) behind code {code}:", files.len());
    for file in &files {
        println!("  {} ({})", file.name, format_bytes(file.size));
    }

    tokio::fs::create_dir_all(out).await?;
    let http = reqwest::Client::new();
    let mut fetched = 0usize;
    for file in &files {
        match fetch(&http, &file.url).await {
            Ok(bytes) => {
                // Stored names are untrusted; keep only the final
                // path component.
                let name = Path::new(&file.name)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_else(|| "download".to_string());
                let dest = out.join(name);
                tokio::fs::write(&dest, bytes).await?;
                println!("Saved {}", dest.display());
                fetched += 1;
            }
            Err(e) => warn!(name = %file.name, error = %e, "download failed"),
        }
    }
    println!("{fetched}/{} downloaded", files.len());
    Ok(())
}

async fn fetch(http: &reqwest::Client, url: &str) -> Result<Vec<u8>, AppError> {
    let resp = http.get(url).send().await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}
