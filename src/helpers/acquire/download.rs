//! Tarball download
//!
//! Streams the response to `<dest>.part` with a progress bar and renames it
//! to `dest` only once the whole body has arrived, so an interrupted transfer
//! never leaves a truncated file at the cache path. Nothing here trusts the
//! result; callers verify the file afterwards.

use std::io::{Read, Write};
use std::path::Path;

use indicatif::ProgressBar;

use crate::core::error::ProvisionError;
use crate::helpers::internal::fs_utils;
use crate::helpers::internal::progress::{self, ProgressGuard, upgrade_to_bytes};

/// Suffix of the file a download is streamed into.
pub const PARTIAL_SUFFIX: &str = ".part";

/// Download `uri` to `dest`, returning the number of bytes written.
pub fn download(uri: &str, dest: &Path) -> Result<u64, ProvisionError> {
    fs_utils::ensure_parent_dir(dest)?;

    let filename = dest
        .file_name()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "download".to_string());

    let pb = progress::create_spinner(&format!("downloading {}", filename));
    let _guard = ProgressGuard::new(&pb);

    let staged = fs_utils::with_suffix(dest, PARTIAL_SUFFIX);
    match stream_to(uri, &staged, &pb) {
        Ok(total_bytes) => {
            fs_utils::move_file(&staged, dest)?;
            Ok(total_bytes)
        }
        Err(e) => {
            let _ = std::fs::remove_file(&staged);
            Err(e)
        }
    }
}

fn stream_to(uri: &str, staged: &Path, pb: &ProgressBar) -> Result<u64, ProvisionError> {
    let download_error = |reason: String| ProvisionError::Download {
        uri: uri.to_string(),
        reason,
    };

    let response = ureq::get(uri).call().map_err(|e| download_error(e.to_string()))?;

    let expected_len: Option<u64> = response
        .header("content-length")
        .and_then(|s| s.parse().ok());
    if let Some(len) = expected_len {
        upgrade_to_bytes(pb, len);
    }

    let mut file = std::fs::File::create(staged).map_err(|e| ProvisionError::io(staged, e))?;

    let mut reader = response.into_reader();
    let mut buffer = [0u8; 8192];
    let mut total_bytes = 0u64;

    loop {
        let bytes_read = reader
            .read(&mut buffer)
            .map_err(|e| download_error(format!("read error: {}", e)))?;

        if bytes_read == 0 {
            break;
        }

        file.write_all(&buffer[..bytes_read])
            .map_err(|e| ProvisionError::io(staged, e))?;

        total_bytes += bytes_read as u64;
        pb.set_position(total_bytes);
    }

    file.flush().map_err(|e| ProvisionError::io(staged, e))?;

    if let Some(len) = expected_len
        && total_bytes != len
    {
        return Err(download_error(format!(
            "received {} of {} bytes",
            total_bytes, len
        )));
    }

    Ok(total_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_download_writes_body() {
        let mock_server = MockServer::start().await;
        let body = vec![42u8; 20_000];

        Mock::given(method("GET"))
            .and(path("/apache-tomcat-9.0.1.tar.gz"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache/apache-tomcat-9.0.1.tar.gz");
        let uri = format!("{}/apache-tomcat-9.0.1.tar.gz", mock_server.uri());

        let written = download(&uri, &dest).unwrap();
        assert_eq!(written, body.len() as u64);
        assert_eq!(std::fs::read(&dest).unwrap(), body);
    }

    #[tokio::test]
    async fn test_download_404() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("t.tar.gz");
        let uri = format!("{}/gone.tar.gz", mock_server.uri());

        let err = download(&uri, &dest).unwrap_err();
        assert!(matches!(err, ProvisionError::Download { .. }));
        assert!(!dest.exists());
        assert!(!fs_utils::with_suffix(&dest, PARTIAL_SUFFIX).exists());
    }

    /// Serve one response that promises `declared` bytes but sends `sent`,
    /// then closes the connection.
    fn spawn_short_body_server(declared: usize, sent: usize) -> String {
        use std::io::BufRead;

        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        std::thread::spawn(move || {
            let (stream, _) = listener.accept().unwrap();
            let mut reader = std::io::BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 && line != "\r\n" {
                line.clear();
            }
            let mut stream = stream;
            let head = format!(
                "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
                declared
            );
            let _ = stream.write_all(head.as_bytes());
            let _ = stream.write_all(&vec![7u8; sent]);
        });
        format!("http://{}/apache-tomcat-9.0.1.tar.gz", addr)
    }

    #[test]
    fn test_interrupted_download_leaves_no_file() {
        let uri = spawn_short_body_server(100_000, 500);

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("cache/apache-tomcat-9.0.1.tar.gz");

        let err = download(&uri, &dest).unwrap_err();
        assert!(matches!(err, ProvisionError::Download { .. }));
        assert!(!dest.exists());
        assert!(!fs_utils::with_suffix(&dest, PARTIAL_SUFFIX).exists());
    }

    #[tokio::test]
    async fn test_download_replaces_stale_partial() {
        let mock_server = MockServer::start().await;
        let body = b"fresh".to_vec();

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.clone()))
            .mount(&mock_server)
            .await;

        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("apache-tomcat-9.0.1.tar.gz");
        std::fs::write(fs_utils::with_suffix(&dest, PARTIAL_SUFFIX), b"leftover bytes").unwrap();

        download(&format!("{}/a.tar.gz", mock_server.uri()), &dest).unwrap();
        assert_eq!(std::fs::read(&dest).unwrap(), body);
        assert!(!fs_utils::with_suffix(&dest, PARTIAL_SUFFIX).exists());
    }
}
