//! Send flow: bundle the files, upload, record the transfer, print
//! the code.

use std::io::Write;
use std::path::PathBuf;

use chrono::Utc;
use dropcode_bundle::InputFile;
use dropcode_object_store::Client;
use dropcode_protocol::StoredFile;
use dropcode_protocol::format::{format_bytes, format_speed};
use dropcode_registry::{
    DEFAULT_TTL_MINUTES, DiskCache, RestStore, TransferRegistry, UserRegistry,
};
use qrcode::QrCode;
use qrcode::render::unicode;
use tracing::info;

use crate::config::AppConfig;
use crate::error::AppError;

pub async fn run(paths: Vec<PathBuf>) -> Result<(), AppError> {
    let config = AppConfig::load()?;

    let mut inputs = Vec::with_capacity(paths.len());
    for path in &paths {
        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .ok_or_else(|| AppError::BadPath(path.clone()))?
            .to_string();
        let bytes = tokio::fs::read(path).await?;
        let content_type = dropcode_bundle::content_type_for(&name).to_string();
        inputs.push(InputFile {
            name,
            bytes,
            content_type,
        });
    }

    let users = UserRegistry::new(RestStore::new(config.db.clone())?, DiskCache::new()?);
    let user_code = users.ensure_user().await?;
    let user_id = users.user_id_for(&user_code).await;

    let transfers = TransferRegistry::new(RestStore::new(config.db)?);
    let code = transfers.reserve_code().await?;

    let InputFile {
        name,
        bytes,
        content_type,
    } = dropcode_bundle::bundle(inputs)?;
    let size = bytes.len() as u64;
    println!("Uploading {name} ({})", format_bytes(size));

    // Millisecond prefix keeps keys unique if the same name is sent
    // twice under one code's lifetime.
    let key = format!("uploads/{code}/{}_{name}", Utc::now().timestamp_millis());
    let store = Client::new(config.storage);
    let url = store
        .upload(
            bytes,
            &key,
            &content_type,
            Some(Box::new(|p| {
                print!("\r{:3}% - {}", p.percentage, format_speed(p.speed));
                let _ = std::io::stdout().flush();
            })),
        )
        .await?;
    println!();

    let stored = StoredFile {
        name,
        url,
        size,
        path: key,
    };
    let code = transfers
        .create(user_id, code, vec![stored], DEFAULT_TTL_MINUTES)
        .await?;
    info!(code = %code, "transfer ready");

    println!("Transfer code: {code}");
    println!("Expires in {DEFAULT_TTL_MINUTES} minutes");
    if let Some(base) = &config.link_base {
        let link = format!("{base}?code={code}");
        println!("Link: {link}");
        let qr = QrCode::new(link.as_bytes())?;
        println!(
            "{}",
            qr.render::<unicode::Dense1x2>().quiet_zone(true).build()
        );
    }
    Ok(())
}
