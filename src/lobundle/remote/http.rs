use super::Remote;
use crate::error::{BundleError, Result};
use reqwest::blocking::{Client, Response};
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::debug;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(30);

pub struct HttpRemote {
    client: Client,
}

impl HttpRemote {
    pub fn new() -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .connect_timeout(CONNECT_TIMEOUT)
            // Archives are hundreds of megabytes; only the connect phase is bounded.
            .timeout(None)
            .build()?;
        Ok(Self { client })
    }

    fn get(&self, url: &str) -> Result<Response> {
        let resp = self.client.get(url).send()?;
        let status = resp.status();
        if !status.is_success() {
            return Err(BundleError::Resolve(format!(
                "GET {} returned {}",
                url, status
            )));
        }
        Ok(resp)
    }
}

impl Remote for HttpRemote {
    fn fetch_text(&self, url: &str) -> Result<String> {
        debug!(url, "fetching listing");
        Ok(self.get(url)?.text()?)
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        debug!(url, dest = %dest.display(), "downloading");
        let mut resp = self.get(url)?;

        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        let partial = partial_path(dest);
        let written = match write_body(&mut resp, &partial) {
            Ok(written) => written,
            Err(e) => {
                let _ = fs::remove_file(&partial);
                return Err(e);
            }
        };

        fs::rename(&partial, dest)?;
        Ok(written)
    }
}

fn write_body(resp: &mut Response, path: &Path) -> Result<u64> {
    let mut out = BufWriter::new(File::create(path)?);
    let written = resp.copy_to(&mut out)?;
    out.flush()?;
    Ok(written)
}

fn partial_path(dest: &Path) -> PathBuf {
    let mut name = dest
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".part");
    dest.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader};
    use std::net::TcpListener;
    use std::thread;

    /// Serves one connection with `response` and returns the base URL.
    fn serve_once(response: &'static [u8]) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream.try_clone().unwrap());
            let mut line = String::new();
            while reader.read_line(&mut line).unwrap() > 0 {
                if line == "\r\n" {
                    break;
                }
                line.clear();
            }
            let _ = stream.write_all(response);
        });
        format!("http://{}", addr)
    }

    #[test]
    fn download_renames_partial_into_place() {
        let base = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 7\r\nConnection: close\r\n\r\narchive",
        );
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("downloads").join("f.tar.gz");

        let written = HttpRemote::new()
            .unwrap()
            .download(&format!("{}/f.tar.gz", base), &dest)
            .unwrap();
        assert_eq!(written, 7);
        assert_eq!(fs::read_to_string(&dest).unwrap(), "archive");
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn missing_file_names_url_and_status() {
        let base = serve_once(
            b"HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
        );
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f.tar.gz");
        let url = format!("{}/f.tar.gz", base);

        let err = HttpRemote::new().unwrap().download(&url, &dest).unwrap_err();
        assert!(matches!(err, BundleError::Resolve(_)));
        let message = err.to_string();
        assert!(message.contains(&url), "{}", message);
        assert!(message.contains("404"), "{}", message);
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn truncated_body_leaves_nothing_behind() {
        let base = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Length: 1000\r\nConnection: close\r\n\r\n0123456789",
        );
        let dir = tempfile::tempdir().unwrap();
        let dest = dir.path().join("f.tar.gz");

        let result = HttpRemote::new()
            .unwrap()
            .download(&format!("{}/f.tar.gz", base), &dest);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!partial_path(&dest).exists());
    }

    #[test]
    fn fetch_text_returns_body() {
        let base = serve_once(
            b"HTTP/1.1 200 OK\r\nContent-Type: text/html\r\nContent-Length: 11\r\nConnection: close\r\n\r\n<a>24.8</a>",
        );
        let text = HttpRemote::new()
            .unwrap()
            .fetch_text(&format!("{}/stable/", base))
            .unwrap();
        assert_eq!(text, "<a>24.8</a>");
    }

    #[test]
    fn partial_path_appends_suffix() {
        assert_eq!(
            partial_path(Path::new("/cache/LibreOffice.tar.gz")),
            PathBuf::from("/cache/LibreOffice.tar.gz.part")
        );
    }
}
