use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client as HttpClient;
use reqwest::header::CONTENT_TYPE;
use url::Url;

use crate::error::RegistryError;

/// Google Drive direct-download endpoint, `{id}` is replaced by the file id.
pub const GOOGLE_DRIVE_URL: &str = "https://drive.google.com/uc?export=download&id={id}";

/// Default timeout for a single artifact download.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(120);

/// Remote content store holding artifacts addressed by an opaque id.
pub trait RemoteStore: Send + Sync {
    /// Open a stream over the blob identified by `remote_id`.
    fn fetch(&self, remote_id: &str) -> Result<Box<dyn Read + Send>, RegistryError>;

    /// Human readable location of `remote_id`, for logs.
    fn describe(&self, remote_id: &str) -> String {
        remote_id.to_string()
    }
}

/// Plain HTTP store with a URL template.
#[derive(Debug, Clone)]
pub struct HttpStore {
    http: HttpClient,
    template: String,
}

impl HttpStore {
    /// Create a store whose URLs come from `template`, which must contain `{id}`.
    pub fn new(template: impl Into<String>, timeout: Duration) -> Result<Self, RegistryError> {
        let http = HttpClient::builder().timeout(timeout).build()?;
        Self::with_client(template, http)
    }

    /// Same as [HttpStore::new] with a preconfigured client.
    pub fn with_client(
        template: impl Into<String>,
        http: HttpClient,
    ) -> Result<Self, RegistryError> {
        let template = template.into();
        if !template.contains("{id}") {
            return Err(RegistryError::InvalidUrl(format!(
                "template has no {{id}} placeholder: {template}"
            )));
        }
        Url::parse(&template.replace("{id}", "id"))
            .map_err(|e| RegistryError::InvalidUrl(format!("{template}: {e}")))?;

        Ok(Self { http, template })
    }

    pub fn google_drive(timeout: Duration) -> Result<Self, RegistryError> {
        Self::new(GOOGLE_DRIVE_URL, timeout)
    }

    /// Resolve the download URL of `remote_id`.
    pub fn url_for(&self, remote_id: &str) -> Result<Url, RegistryError> {
        let encoded: String = url::form_urlencoded::byte_serialize(remote_id.as_bytes()).collect();
        let raw = self.template.replace("{id}", &encoded);
        Url::parse(&raw).map_err(|e| RegistryError::InvalidUrl(format!("{raw}: {e}")))
    }
}

impl RemoteStore for HttpStore {
    fn fetch(&self, remote_id: &str) -> Result<Box<dyn Read + Send>, RegistryError> {
        let url = self.url_for(remote_id)?;
        let resp = self
            .http
            .get(url)
            .send()
            .map_err(|e| RegistryError::DownloadFailed {
                id: remote_id.to_string(),
                details: e.to_string(),
            })?;

        if !resp.status().is_success() {
            return Err(RegistryError::DownloadFailed {
                id: remote_id.to_string(),
                details: format!("HTTP {}", resp.status()),
            });
        }

        let content_type = resp
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok());
        if is_html(content_type) {
            return Err(RegistryError::DownloadFailed {
                id: remote_id.to_string(),
                details: "remote returned an HTML page instead of the artifact".to_string(),
            });
        }

        Ok(Box::new(resp))
    }

    fn describe(&self, remote_id: &str) -> String {
        self.url_for(remote_id)
            .map(|u| u.to_string())
            .unwrap_or_else(|_| remote_id.to_string())
    }
}

/// Share links answer with an interstitial page (virus scan warning, login wall) when the file
/// cannot be served directly.
fn is_html(content_type: Option<&str>) -> bool {
    content_type
        .map(|v| v.trim_start().to_ascii_lowercase().starts_with("text/html"))
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use std::net::TcpListener;
    use std::thread;

    /// Answer a single request on a local port with `response`, returning the URL template.
    fn serve_once(response: &'static [u8]) -> (String, thread::JoinHandle<()>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let read = stream.read(&mut buf).unwrap();
                if read == 0 {
                    break;
                }
                request.extend_from_slice(&buf[..read]);
            }
            let _ = stream.write_all(response);
        });
        (format!("http://127.0.0.1:{port}/artifacts/{{id}}"), handle)
    }

    fn fetch_from(template: &str) -> Result<Box<dyn Read + Send>, RegistryError> {
        let http = HttpClient::builder()
            .timeout(Duration::from_secs(5))
            .no_proxy()
            .build()
            .unwrap();
        HttpStore::with_client(template, http).unwrap().fetch("model")
    }

    #[test]
    fn not_found_is_a_download_failure() {
        let (template, server) = serve_once(
            b"HTTP/1.1 404 Not Found\r\ncontent-length: 0\r\nconnection: close\r\n\r\n",
        );

        let err = fetch_from(&template).err().unwrap();
        server.join().unwrap();

        assert!(
            matches!(&err, RegistryError::DownloadFailed { details, .. } if details.contains("404")),
            "{err}"
        );
        assert!(err.is_network());
    }

    #[test]
    fn html_interstitial_is_a_download_failure() {
        let (template, server) = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-type: text/html; charset=utf-8\r\n\
              content-length: 28\r\nconnection: close\r\n\r\n<html>virus scan page</html>",
        );

        let err = fetch_from(&template).err().unwrap();
        server.join().unwrap();

        assert!(
            matches!(&err, RegistryError::DownloadFailed { details, .. } if details.contains("HTML")),
            "{err}"
        );
    }

    #[test]
    fn unreachable_host_is_a_network_error() {
        let port = {
            let listener = TcpListener::bind("127.0.0.1:0").unwrap();
            listener.local_addr().unwrap().port()
        };

        let err = fetch_from(&format!("http://127.0.0.1:{port}/{{id}}"))
            .err()
            .unwrap();

        assert!(matches!(err, RegistryError::DownloadFailed { .. }), "{err}");
        assert!(err.is_network());
    }

    #[test]
    fn binary_payload_is_streamed() {
        let (template, server) = serve_once(
            b"HTTP/1.1 200 OK\r\ncontent-type: application/octet-stream\r\n\
              content-length: 11\r\nconnection: close\r\n\r\nmodel bytes",
        );

        let mut body = Vec::new();
        fetch_from(&template)
            .unwrap()
            .read_to_end(&mut body)
            .unwrap();
        server.join().unwrap();

        assert_eq!(body, b"model bytes");
    }

    #[test]
    fn drive_url_embeds_the_id() {
        let store = HttpStore::google_drive(DEFAULT_TIMEOUT).unwrap();
        let url = store.url_for("1reTM7fTqgScx6X0ddwHOvwACAEy_3Asd").unwrap();
        assert_eq!(
            url.as_str(),
            "https://drive.google.com/uc?export=download&id=1reTM7fTqgScx6X0ddwHOvwACAEy_3Asd"
        );
    }

    #[test]
    fn ids_are_encoded() {
        let store = HttpStore::new("http://localhost:9000/artifacts?id={id}", DEFAULT_TIMEOUT).unwrap();
        let url = store.url_for("a&b c").unwrap();
        assert_eq!(url.query(), Some("id=a%26b+c"));
    }

    #[test]
    fn template_without_placeholder_is_rejected() {
        let err = HttpStore::new("http://localhost/model.json", DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl(_)));
    }

    #[test]
    fn template_must_be_a_url() {
        let err = HttpStore::new("not a url {id}", DEFAULT_TIMEOUT).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidUrl(_)));
    }

    #[test]
    fn html_is_detected() {
        assert!(is_html(Some("text/html; charset=utf-8")));
        assert!(is_html(Some("TEXT/HTML")));
        assert!(!is_html(Some("application/octet-stream")));
        assert!(!is_html(Some("application/json")));
        assert!(!is_html(None));
    }
}
