//! TLS configuration and certificate loading.

use std::fmt;
use std::path::{Path, PathBuf};

use axum_server::tls_rustls::RustlsConfig;

use crate::error::{FrontendError, Result};

/// PEM-encoded certificate chain and private key.
#[derive(Clone)]
pub struct TlsMaterial {
    pub certificate_chain: Vec<u8>,
    pub private_key: Vec<u8>,
}

impl TlsMaterial {
    pub fn from_pem(certificate_chain: impl Into<Vec<u8>>, private_key: impl Into<Vec<u8>>) -> Self {
        Self {
            certificate_chain: certificate_chain.into(),
            private_key: private_key.into(),
        }
    }

    /// Check the PEM blocks are present before handing them to rustls.
    pub fn check(&self) -> Result<()> {
        let certs = rustls_pemfile::certs(&mut self.certificate_chain.as_slice())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| FrontendError::Tls(format!("unreadable certificate chain: {e}")))?;
        if certs.is_empty() {
            return Err(FrontendError::Tls("no certificate found in chain".into()));
        }
        match rustls_pemfile::private_key(&mut self.private_key.as_slice()) {
            Ok(Some(_)) => Ok(()),
            Ok(None) => Err(FrontendError::Tls("no private key found".into())),
            Err(e) => Err(FrontendError::Tls(format!("unreadable private key: {e}"))),
        }
    }
}

impl fmt::Debug for TlsMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TlsMaterial")
            .field("certificate_chain", &format_args!("{} bytes", self.certificate_chain.len()))
            .field("private_key", &"<redacted>")
            .finish()
    }
}

/// Supplies certificate material when a TLS listener starts.
pub trait CertificateProvider: Send + Sync {
    fn certificates(&self) -> Result<TlsMaterial>;
}

impl CertificateProvider for TlsMaterial {
    fn certificates(&self) -> Result<TlsMaterial> {
        Ok(self.clone())
    }
}

/// Reads the certificate chain and key from PEM files at start.
#[derive(Debug, Clone)]
pub struct PemFileProvider {
    cert_path: PathBuf,
    key_path: PathBuf,
}

impl PemFileProvider {
    pub fn new(cert_path: impl Into<PathBuf>, key_path: impl Into<PathBuf>) -> Self {
        Self {
            cert_path: cert_path.into(),
            key_path: key_path.into(),
        }
    }
}

fn read_pem(path: &Path, what: &str) -> Result<Vec<u8>> {
    if !path.exists() {
        return Err(FrontendError::Tls(format!("{what} file not found: {path:?}")));
    }
    std::fs::read(path).map_err(|e| FrontendError::Tls(format!("failed to read {path:?}: {e}")))
}

impl CertificateProvider for PemFileProvider {
    fn certificates(&self) -> Result<TlsMaterial> {
        Ok(TlsMaterial {
            certificate_chain: read_pem(&self.cert_path, "Certificate")?,
            private_key: read_pem(&self.key_path, "Private key")?,
        })
    }
}

/// Build the rustls acceptor configuration from PEM material.
pub async fn load_tls_config(material: &TlsMaterial) -> Result<RustlsConfig> {
    material.check()?;
    RustlsConfig::from_pem(material.certificate_chain.clone(), material.private_key.clone())
        .await
        .map_err(|e| FrontendError::Tls(e.to_string()))
}
