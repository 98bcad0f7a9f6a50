//! Remote checksum retrieval
//!
//! Mirrors publish a small text document next to each tarball in the usual
//! `<digest>  <filename>` layout. Only the first token is used.
//!
//! Some internal mirrors serve these documents over HTTPS with self-signed
//! certificates, so certificate verification can be switched off for this
//! fetch (and only this fetch) with `insecure_skip_verify`.

use std::sync::Arc;

use rustls::client::danger::{HandshakeSignatureValid, ServerCertVerified, ServerCertVerifier};
use rustls::crypto::CryptoProvider;
use rustls::pki_types::{CertificateDer, ServerName, UnixTime};
use rustls::{DigitallySignedStruct, SignatureScheme};

use crate::core::error::ProvisionError;

/// Fetches and parses checksum documents.
pub struct ChecksumFetcher {
    agent: ureq::Agent,
}

impl ChecksumFetcher {
    /// Build a fetcher. With `insecure_skip_verify`, HTTPS certificates are
    /// accepted without verification.
    pub fn new(insecure_skip_verify: bool) -> Result<Self, ProvisionError> {
        let agent = if insecure_skip_verify {
            ureq::AgentBuilder::new()
                .tls_config(Arc::new(insecure_tls_config()?))
                .build()
        } else {
            ureq::AgentBuilder::new().build()
        };
        Ok(Self { agent })
    }

    /// GET `uri` and return the checksum token from the body.
    ///
    /// Anything but HTTP 200, a network failure, or an empty document is a
    /// [`ProvisionError::ChecksumFetch`].
    pub fn fetch(&self, uri: &str) -> Result<String, ProvisionError> {
        let fetch_error = |status: Option<u16>, reason: String| ProvisionError::ChecksumFetch {
            uri: uri.to_string(),
            status,
            reason,
        };

        let response = match self.agent.get(uri).call() {
            Ok(response) => response,
            Err(ureq::Error::Status(code, _)) => {
                return Err(fetch_error(Some(code), "unexpected status".to_string()));
            }
            Err(e) => return Err(fetch_error(None, e.to_string())),
        };

        let status = response.status();
        if status != 200 {
            return Err(fetch_error(Some(status), "unexpected status".to_string()));
        }

        let body = response
            .into_string()
            .map_err(|e| fetch_error(Some(status), format!("failed to read body: {}", e)))?;

        parse_checksum(&body)
            .map(str::to_string)
            .ok_or_else(|| fetch_error(Some(status), "empty checksum document".to_string()))
    }
}

/// First whitespace-delimited token of a checksum document.
pub fn parse_checksum(body: &str) -> Option<&str> {
    body.split_whitespace().next()
}

fn insecure_tls_config() -> Result<rustls::ClientConfig, ProvisionError> {
    let provider = Arc::new(rustls::crypto::ring::default_provider());
    let config = rustls::ClientConfig::builder_with_provider(provider.clone())
        .with_safe_default_protocol_versions()
        .map_err(|e| ProvisionError::InvalidConfig(format!("TLS setup failed: {}", e)))?
        .dangerous()
        .with_custom_certificate_verifier(Arc::new(AcceptAnyCertificate(provider)))
        .with_no_client_auth();
    Ok(config)
}

/// Accepts any server certificate. Handshake signatures are still checked so
/// the connection itself is well-formed.
#[derive(Debug)]
struct AcceptAnyCertificate(Arc<CryptoProvider>);

impl ServerCertVerifier for AcceptAnyCertificate {
    fn verify_server_cert(
        &self,
        _end_entity: &CertificateDer<'_>,
        _intermediates: &[CertificateDer<'_>],
        _server_name: &ServerName<'_>,
        _ocsp_response: &[u8],
        _now: UnixTime,
    ) -> Result<ServerCertVerified, rustls::Error> {
        Ok(ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls12_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn verify_tls13_signature(
        &self,
        message: &[u8],
        cert: &CertificateDer<'_>,
        dss: &DigitallySignedStruct,
    ) -> Result<HandshakeSignatureValid, rustls::Error> {
        rustls::crypto::verify_tls13_signature(
            message,
            cert,
            dss,
            &self.0.signature_verification_algorithms,
        )
    }

    fn supported_verify_schemes(&self) -> Vec<SignatureScheme> {
        self.0.signature_verification_algorithms.supported_schemes()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_checksum_with_filename() {
        assert_eq!(
            parse_checksum("5eb63bbbe01eeed093cb22bb8f5acdc3  apache-tomcat-9.0.1.tar.gz\n"),
            Some("5eb63bbbe01eeed093cb22bb8f5acdc3")
        );
    }

    #[test]
    fn test_parse_checksum_bare_digest() {
        assert_eq!(parse_checksum("abc123\n"), Some("abc123"));
        assert_eq!(parse_checksum("  \tabc123 *file"), Some("abc123"));
    }

    #[test]
    fn test_parse_checksum_empty() {
        assert_eq!(parse_checksum(""), None);
        assert_eq!(parse_checksum(" \n\t "), None);
    }

    #[test]
    fn test_fetcher_builds_in_both_modes() {
        assert!(ChecksumFetcher::new(true).is_ok());
        assert!(ChecksumFetcher::new(false).is_ok());
    }

    #[test]
    fn test_fetch_connection_refused() {
        let fetcher = ChecksumFetcher::new(false).unwrap();
        let err = fetcher.fetch("http://127.0.0.1:1/x.md5").unwrap_err();
        match err {
            ProvisionError::ChecksumFetch { uri, status, .. } => {
                assert_eq!(uri, "http://127.0.0.1:1/x.md5");
                assert_eq!(status, None);
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_fetch_invalid_url() {
        let fetcher = ChecksumFetcher::new(true).unwrap();
        assert!(matches!(
            fetcher.fetch("not-a-valid-url"),
            Err(ProvisionError::ChecksumFetch { status: None, .. })
        ));
    }

    mod mock_tests {
        use super::*;
        use wiremock::matchers::{method, path};
        use wiremock::{Mock, MockServer, ResponseTemplate};

        #[tokio::test]
        async fn test_fetch_success() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/tomcat-9/v9.0.1/bin/apache-tomcat-9.0.1.tar.gz.md5"))
                .respond_with(ResponseTemplate::new(200).set_body_string(
                    "5eb63bbbe01eeed093cb22bb8f5acdc3 *apache-tomcat-9.0.1.tar.gz\n",
                ))
                .mount(&mock_server)
                .await;

            let fetcher = ChecksumFetcher::new(true).unwrap();
            let uri = format!(
                "{}/tomcat-9/v9.0.1/bin/apache-tomcat-9.0.1.tar.gz.md5",
                mock_server.uri()
            );

            assert_eq!(
                fetcher.fetch(&uri).unwrap(),
                "5eb63bbbe01eeed093cb22bb8f5acdc3"
            );
        }

        #[tokio::test]
        async fn test_fetch_404_carries_status() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/missing.md5"))
                .respond_with(ResponseTemplate::new(404))
                .mount(&mock_server)
                .await;

            let fetcher = ChecksumFetcher::new(true).unwrap();
            let uri = format!("{}/missing.md5", mock_server.uri());
            let err = fetcher.fetch(&uri).unwrap_err();

            match err {
                ProvisionError::ChecksumFetch {
                    uri: failed, status, ..
                } => {
                    assert_eq!(failed, uri);
                    assert_eq!(status, Some(404));
                }
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn test_fetch_rejects_non_200_success() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/accepted.md5"))
                .respond_with(ResponseTemplate::new(202).set_body_string("abc  file"))
                .mount(&mock_server)
                .await;

            let fetcher = ChecksumFetcher::new(true).unwrap();
            let uri = format!("{}/accepted.md5", mock_server.uri());

            assert!(matches!(
                fetcher.fetch(&uri),
                Err(ProvisionError::ChecksumFetch {
                    status: Some(202),
                    ..
                })
            ));
        }

        #[tokio::test]
        async fn test_fetch_500() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/error.md5"))
                .respond_with(ResponseTemplate::new(500))
                .mount(&mock_server)
                .await;

            let fetcher = ChecksumFetcher::new(false).unwrap();
            let uri = format!("{}/error.md5", mock_server.uri());
            let err = fetcher.fetch(&uri).unwrap_err();
            assert!(err.to_string().contains("HTTP 500"));
        }

        #[tokio::test]
        async fn test_fetch_empty_document() {
            let mock_server = MockServer::start().await;

            Mock::given(method("GET"))
                .and(path("/empty.md5"))
                .respond_with(ResponseTemplate::new(200).set_body_string("\n"))
                .mount(&mock_server)
                .await;

            let fetcher = ChecksumFetcher::new(true).unwrap();
            let uri = format!("{}/empty.md5", mock_server.uri());
            let err = fetcher.fetch(&uri).unwrap_err();
            assert!(err.to_string().contains("empty checksum document"));
        }
    }

    mod tls_tests {
        use super::*;
        use rustls::pki_types::{PrivateKeyDer, PrivatePkcs8KeyDer};
        use std::io::{Read, Write};
        use std::net::TcpListener;

        const DOCUMENT: &str = "5eb63bbbe01eeed093cb22bb8f5acdc3  apache-tomcat-9.0.1.tar.gz\n";

        /// HTTPS server with a freshly generated self-signed certificate that
        /// answers every request with `body`. Returns the checksum URI.
        fn spawn_self_signed_server(body: &'static str) -> String {
            let rcgen::CertifiedKey { cert, key_pair } =
                rcgen::generate_simple_self_signed(vec!["127.0.0.1".to_string()]).unwrap();
            let key = PrivateKeyDer::Pkcs8(PrivatePkcs8KeyDer::from(key_pair.serialize_der()));
            let provider = Arc::new(rustls::crypto::ring::default_provider());
            let config = Arc::new(
                rustls::ServerConfig::builder_with_provider(provider)
                    .with_safe_default_protocol_versions()
                    .unwrap()
                    .with_no_client_auth()
                    .with_single_cert(vec![cert.der().clone()], key)
                    .unwrap(),
            );

            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            let addr = listener.local_addr().unwrap();

            std::thread::spawn(move || {
                for stream in listener.incoming() {
                    let Ok(stream) = stream else { continue };
                    let Ok(conn) = rustls::ServerConnection::new(config.clone()) else {
                        continue;
                    };
                    let mut tls = rustls::StreamOwned::new(conn, stream);

                    // A client that rejects the certificate never sends a request
                    let mut request = Vec::new();
                    let mut buf = [0u8; 4096];
                    while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        match tls.read(&mut buf) {
                            Ok(0) | Err(_) => break,
                            Ok(n) => request.extend_from_slice(&buf[..n]),
                        }
                    }
                    if !request.windows(4).any(|w| w == b"\r\n\r\n") {
                        continue;
                    }

                    let response = format!(
                        "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                        body.len(),
                        body
                    );
                    let _ = tls.write_all(response.as_bytes());
                    tls.conn.send_close_notify();
                    let _ = tls.flush();
                }
            });

            format!("https://{}/tomcat-9/v9.0.1/bin/apache-tomcat-9.0.1.tar.gz.md5", addr)
        }

        #[test]
        fn test_self_signed_accepted_when_skipping_verification() {
            let uri = spawn_self_signed_server(DOCUMENT);
            let fetcher = ChecksumFetcher::new(true).unwrap();
            assert_eq!(fetcher.fetch(&uri).unwrap(), "5eb63bbbe01eeed093cb22bb8f5acdc3");
        }

        #[test]
        fn test_self_signed_rejected_when_strict() {
            let uri = spawn_self_signed_server(DOCUMENT);
            let fetcher = ChecksumFetcher::new(false).unwrap();
            match fetcher.fetch(&uri).unwrap_err() {
                ProvisionError::ChecksumFetch {
                    uri: reported,
                    status,
                    ..
                } => {
                    assert_eq!(reported, uri);
                    assert_eq!(status, None);
                }
                other => panic!("expected ChecksumFetch, got {other:?}"),
            }
        }
    }
}
