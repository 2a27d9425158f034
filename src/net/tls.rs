//! TLS configuration and certificate loading.

use std::io;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;
use thiserror::Error;

use crate::config::TlsConfig;

#[derive(Debug, Error)]
pub enum TlsError {
    #[error("Certificate file not found: {0}")]
    MissingCertificate(PathBuf),

    #[error("Private key file not found: {0}")]
    MissingKey(PathBuf),

    #[error("Failed to load TLS material: {0}")]
    Load(#[from] io::Error),
}

/// Whether both files of the pair exist on disk.
pub fn tls_files_present(tls: &TlsConfig) -> bool {
    Path::new(&tls.cert_path).is_file() && Path::new(&tls.key_path).is_file()
}

/// Load a rustls server config from a PEM certificate chain and key.
pub async fn load_tls_config(tls: &TlsConfig) -> Result<RustlsConfig, TlsError> {
    let cert_path = Path::new(&tls.cert_path);
    let key_path = Path::new(&tls.key_path);
    if !cert_path.is_file() {
        return Err(TlsError::MissingCertificate(cert_path.to_path_buf()));
    }
    if !key_path.is_file() {
        return Err(TlsError::MissingKey(key_path.to_path_buf()));
    }
    Ok(RustlsConfig::from_pem_file(cert_path, key_path).await?)
}
