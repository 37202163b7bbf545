use std::{path::Path, sync::Arc};

use ::tracing::warn;
use anyhow::{anyhow, Result};
use axum_server::tls_rustls::RustlsConfig;
use rustls::ServerConfig;
use rustls_pki_types::{pem::SliceIter, CertificateDer, PrivateKeyDer};

use crate::config::TlsConfig;

/// Build the rustls configuration for the HTTPS listener from the PEM
/// files named in the TLS configuration. No client authentication: the
/// API server authenticates itself at the cluster level, not via mTLS.
pub(crate) async fn build_tls_config(tls_config: &TlsConfig) -> Result<RustlsConfig> {
    let (certs, key) =
        load_server_cert_and_key(&tls_config.cert_file, &tls_config.key_file).await?;

    let server_config = ServerConfig::builder()
        .with_no_client_auth()
        .with_single_cert(certs, key)?;

    Ok(RustlsConfig::from_config(Arc::new(server_config)))
}

// Load the server certificate and key
async fn load_server_cert_and_key(
    cert_file: &Path,
    key_file: &Path,
) -> Result<(Vec<CertificateDer<'static>>, PrivateKeyDer<'static>)> {
    let cert_contents = tokio::fs::read(cert_file)
        .await
        .map_err(|e| anyhow!("cannot read certificate file {}: {e}", cert_file.display()))?;
    let key_contents = tokio::fs::read(key_file)
        .await
        .map_err(|e| anyhow!("cannot read key file {}: {e}", key_file.display()))?;

    let cert_iterator: SliceIter<CertificateDer> = SliceIter::new(&cert_contents[..]);
    let certs: Vec<_> = cert_iterator
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("cannot parse certificate: {e}");
            }
            it.ok()
        })
        .collect();

    if certs.len() != 1 {
        return Err(anyhow!(
            "expected exactly one certificate in certificate file, found {}",
            certs.len()
        ));
    }

    let key_iterator: SliceIter<PrivateKeyDer> = SliceIter::new(&key_contents[..]);
    let keys: Vec<PrivateKeyDer> = key_iterator
        .filter_map(|it| {
            if let Err(ref e) = it {
                warn!("cannot parse private key: {e}");
            }
            it.ok()
        })
        .collect();

    if keys.len() != 1 {
        return Err(anyhow!(
            "expected exactly one key in key file, found {}",
            keys.len()
        ));
    }

    Ok((certs, keys[0].clone_key()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn self_signed_pem_pair() -> (String, String) {
        let key_pair = rcgen::KeyPair::generate().expect("key generation should work");
        let cert = rcgen::CertificateParams::new(vec!["localhost".to_owned()])
            .expect("params should be valid")
            .self_signed(&key_pair)
            .expect("self signing should work");
        (cert.pem(), key_pair.serialize_pem())
    }

    fn write_temp(contents: &str) -> NamedTempFile {
        let mut file = NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[tokio::test]
    async fn load_a_valid_certificate_and_key() {
        let (cert_pem, key_pem) = self_signed_pem_pair();
        let cert_file = write_temp(&cert_pem);
        let key_file = write_temp(&key_pem);

        let tls_config = TlsConfig {
            cert_file: cert_file.path().to_path_buf(),
            key_file: key_file.path().to_path_buf(),
        };

        assert!(build_tls_config(&tls_config).await.is_ok());
    }

    #[tokio::test]
    async fn missing_certificate_file_is_an_error() {
        let (_, key_pem) = self_signed_pem_pair();
        let key_file = write_temp(&key_pem);

        let tls_config = TlsConfig {
            cert_file: "/nonexistent/cert.pem".into(),
            key_file: key_file.path().to_path_buf(),
        };

        let error = build_tls_config(&tls_config)
            .await
            .expect_err("load should fail");
        assert!(error.to_string().contains("cannot read certificate file"));
    }

    #[tokio::test]
    async fn garbage_pem_is_an_error() {
        let cert_file = write_temp("this is not a certificate");
        let key_file = write_temp("this is not a key");

        let tls_config = TlsConfig {
            cert_file: cert_file.path().to_path_buf(),
            key_file: key_file.path().to_path_buf(),
        };

        assert!(build_tls_config(&tls_config).await.is_err());
    }
}
