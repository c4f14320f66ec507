//! Self-signed certificate provisioning.
//!
//! Makes sure a certificate/key pair exists before the TLS listener starts.
//! An existing pair is reused as-is unless its certificate has expired; a
//! missing pair is generated in-process (RSA-2048, CN=localhost, 365 days)
//! and written unencrypted next to the served directory.

use std::fs;
use std::path::{Path, PathBuf};

use rcgen::{CertificateParams, DistinguishedName, DnType, KeyPair};
use time::{Duration, OffsetDateTime};
use tracing::{debug, info, warn};
use x509_parser::pem::parse_x509_pem;

use crate::config::TlsConfig;

/// Locations of a provisioned certificate and its private key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificatePaths {
    pub cert: PathBuf,
    pub key: PathBuf,
}

impl CertificatePaths {
    fn from_config(tls: &TlsConfig) -> Self {
        Self {
            cert: tls.cert_path.clone(),
            key: tls.key_path.clone(),
        }
    }

    fn both_exist(&self) -> bool {
        self.cert.is_file() && self.key.is_file()
    }
}

/// A freshly generated certificate and key, PEM-encoded.
#[derive(Debug, Clone)]
pub struct GeneratedCert {
    pub cert_pem: String,
    pub key_pem: String,
}

impl GeneratedCert {
    /// Write both PEM files, restricting the key to its owner on Unix.
    pub fn save(&self, paths: &CertificatePaths) -> Result<(), CertError> {
        for path in [&paths.cert, &paths.key] {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent).map_err(|e| CertError::write(parent, e))?;
            }
        }

        fs::write(&paths.cert, &self.cert_pem).map_err(|e| CertError::write(&paths.cert, e))?;
        write_private(&paths.key, self.key_pem.as_bytes())
            .map_err(|e| CertError::write(&paths.key, e))?;

        Ok(())
    }
}

/// Write `contents` to a file that is owner-only on Unix before any byte lands.
///
/// `mode` only applies when the file is created, so a replaced key file is
/// also narrowed through the open handle before it is written.
fn write_private(path: &Path, contents: &[u8]) -> std::io::Result<()> {
    use std::io::Write;

    let mut options = fs::OpenOptions::new();
    options.write(true).create(true).truncate(true);
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        options.mode(0o600);
    }

    let mut file = options.open(path)?;
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        file.set_permissions(fs::Permissions::from_mode(0o600))?;
    }

    file.write_all(contents)?;
    file.sync_all()
}

#[derive(Debug, thiserror::Error)]
pub enum CertError {
    #[error("Failed to generate certificate: {0}")]
    Generate(#[from] rcgen::Error),

    #[error("Failed to write {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse certificate {path}: {reason}")]
    Parse { path: PathBuf, reason: String },
}

impl CertError {
    fn write(path: &Path, source: std::io::Error) -> Self {
        CertError::Write {
            path: path.to_path_buf(),
            source,
        }
    }

    fn parse(path: &Path, reason: impl ToString) -> Self {
        CertError::Parse {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

/// Return the certificate and key paths, generating the pair if needed.
///
/// Both files present: returned untouched, except that an expired certificate
/// is replaced when `regenerate_expired` is set. Either file missing: a new
/// pair is generated and written. Any generation or write failure is returned
/// to the caller; the server cannot start without a certificate.
pub fn ensure_certificate(tls: &TlsConfig) -> Result<CertificatePaths, CertError> {
    let paths = CertificatePaths::from_config(tls);

    if paths.both_exist() {
        if !tls.regenerate_expired || !is_expired(&paths.cert, OffsetDateTime::now_utc()) {
            debug!(cert = %paths.cert.display(), key = %paths.key.display(), "Reusing existing certificate");
            return Ok(paths);
        }
        warn!(cert = %paths.cert.display(), "Existing certificate has expired, regenerating");
    }

    println!("Generating self-signed SSL certificate...");
    let generated = generate_self_signed(&tls.common_name, tls.validity_days)?;
    generated.save(&paths)?;
    println!("SSL certificate generated!");

    info!(
        cert = %paths.cert.display(),
        key = %paths.key.display(),
        common_name = %tls.common_name,
        validity_days = tls.validity_days,
        "Generated self-signed certificate"
    );

    Ok(paths)
}

/// Generate a self-signed certificate valid from now for `validity_days`.
pub fn generate_self_signed(
    common_name: &str,
    validity_days: u32,
) -> Result<GeneratedCert, CertError> {
    let not_before = OffsetDateTime::now_utc();
    let not_after = not_before + Duration::days(i64::from(validity_days));
    generate_with_validity(common_name, not_before, not_after)
}

fn generate_with_validity(
    common_name: &str,
    not_before: OffsetDateTime,
    not_after: OffsetDateTime,
) -> Result<GeneratedCert, CertError> {
    let mut params = CertificateParams::new(vec![common_name.to_string()])?;

    let mut distinguished_name = DistinguishedName::new();
    distinguished_name.push(DnType::CommonName, common_name);
    params.distinguished_name = distinguished_name;

    params.not_before = not_before;
    params.not_after = not_after;

    let key_pair = generate_key_pair()?;
    let cert = params.self_signed(&key_pair)?;

    Ok(GeneratedCert {
        cert_pem: cert.pem(),
        key_pem: key_pair.serialize_pem(),
    })
}

/// RSA-2048 when the crypto backend supports RSA key generation, ECDSA P-256 otherwise.
fn generate_key_pair() -> Result<KeyPair, CertError> {
    match KeyPair::generate_for(&rcgen::PKCS_RSA_SHA256) {
        Ok(key_pair) => Ok(key_pair),
        Err(e) => {
            warn!(error = %e, "RSA key generation unavailable, falling back to ECDSA P-256");
            Ok(KeyPair::generate_for(&rcgen::PKCS_ECDSA_P256_SHA256)?)
        }
    }
}

/// Read the notAfter time of a PEM certificate.
pub fn certificate_expiry(path: &Path) -> Result<OffsetDateTime, CertError> {
    let bytes = fs::read(path).map_err(|source| CertError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let (_, pem) = parse_x509_pem(&bytes).map_err(|e| CertError::parse(path, e))?;
    let x509 = pem.parse_x509().map_err(|e| CertError::parse(path, e))?;
    let timestamp = x509.validity().not_after.timestamp();
    OffsetDateTime::from_unix_timestamp(timestamp).map_err(|e| CertError::parse(path, e))
}

/// An unreadable certificate counts as not expired; it is reused and any
/// problem surfaces as a TLS error instead.
fn is_expired(cert_path: &Path, now: OffsetDateTime) -> bool {
    match certificate_expiry(cert_path) {
        Ok(not_after) => not_after <= now,
        Err(e) => {
            warn!(error = %e, "Could not read certificate expiry, reusing it as-is");
            false
        }
    }
}
