//! Client for the remote record store holding the loan application.
//!
//! The first step creates the record (`POST {base}/entities`), later steps
//! patch it (`PATCH {base}/entities/{id}`). Each call carries only the fields
//! of the step being completed. Failures are classified but never retried.

use std::time::Duration;

use reqwest::blocking::{Client, Response};
use serde_json::Value;
use thiserror::Error;

use crate::domain::{FormData, RecordId};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("record store unreachable: {0}")]
    Network(String),
    #[error("record store did not answer in time")]
    Timeout,
    #[error("record store rejected the request (HTTP {status})")]
    Rejected { status: u16 },
    #[error("malformed response from record store: {0}")]
    MalformedResponse(String),
}

pub trait RecordStore: Send + Sync {
    fn create(&self, payload: &FormData) -> Result<RecordId, SyncError>;
    fn update(&self, id: &RecordId, payload: &FormData) -> Result<(), SyncError>;
}

#[derive(Debug, Clone)]
pub struct HttpRecordStore {
    client: Client,
    base_url: String,
}

impl HttpRecordStore {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    fn entities_url(&self) -> String {
        format!("{}/entities", self.base_url)
    }

    fn entity_url(&self, id: &RecordId) -> String {
        format!("{}/entities/{}", self.base_url, id)
    }
}

impl RecordStore for HttpRecordStore {
    fn create(&self, payload: &FormData) -> Result<RecordId, SyncError> {
        let url = self.entities_url();
        tracing::debug!(%url, fields = payload.len(), "creating record");

        let response = self.client.post(&url).json(payload).send().map_err(classify)?;
        let response = check_status(response)?;
        let body = response.text().map_err(classify)?;
        let json: Value =
            serde_json::from_str(&body).map_err(|e| SyncError::MalformedResponse(e.to_string()))?;

        let id = extract_record_id(&json)
            .ok_or_else(|| SyncError::MalformedResponse("no record identifier in response".to_string()))?;
        tracing::info!(record_id = %id, "record created");
        Ok(id)
    }

    fn update(&self, id: &RecordId, payload: &FormData) -> Result<(), SyncError> {
        let url = self.entity_url(id);
        tracing::debug!(%url, fields = payload.len(), "updating record");

        let response = self.client.patch(&url).json(payload).send().map_err(classify)?;
        check_status(response)?;
        tracing::info!(record_id = %id, "record updated");
        Ok(())
    }
}

fn check_status(response: Response) -> Result<Response, SyncError> {
    let status = response.status();
    if status.is_success() {
        Ok(response)
    } else {
        tracing::warn!(status = status.as_u16(), "record store rejected request");
        Err(SyncError::Rejected {
            status: status.as_u16(),
        })
    }
}

fn classify(error: reqwest::Error) -> SyncError {
    if error.is_timeout() {
        SyncError::Timeout
    } else {
        SyncError::Network(error.to_string())
    }
}

/// Looks for the identifier at `entity.uuid`, then `entity.id`, `uuid`, `id`.
fn extract_record_id(body: &Value) -> Option<RecordId> {
    ["/entity/uuid", "/entity/id", "/uuid", "/id"]
        .iter()
        .filter_map(|pointer| body.pointer(pointer))
        .find_map(|value| match value {
            Value::String(s) if !s.is_empty() => Some(RecordId::new(s.clone())),
            Value::Number(n) => Some(RecordId::new(n.to_string())),
            _ => None,
        })
}


#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FieldValue;
    use std::io::{Read, Write};
    use std::net::{TcpListener, TcpStream};
    use std::thread::{self, JoinHandle};

    fn payload() -> FormData {
        let mut data = FormData::new();
        data.insert("email", FieldValue::Text("anna@example.de".to_string()));
        data.insert("phone", FieldValue::Text("+4917012345678".to_string()));
        data
    }

    fn read_request(stream: &mut TcpStream) -> String {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 1024];
        loop {
            let n = stream.read(&mut chunk).unwrap();
            if n == 0 {
                break;
            }
            buf.extend_from_slice(&chunk[..n]);
            let text = String::from_utf8_lossy(&buf).to_string();
            if let Some(end) = text.find("\r\n\r\n") {
                let content_length = text[..end]
                    .lines()
                    .filter_map(|line| line.split_once(':'))
                    .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
                    .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                    .unwrap_or(0);
                if buf.len() >= end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    /// Answers exactly one request with `status` and `body`, returning the raw
    /// request it received.
    fn serve_once(status: &'static str, body: &'static str) -> (String, JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).unwrap();
            request
        });
        (format!("http://{addr}"), handle)
    }

    fn store(base: &str) -> HttpRecordStore {
        HttpRecordStore::new(base, Duration::from_secs(5)).unwrap()
    }

    #[test]
    fn test_create_posts_payload_and_reads_uuid() {
        let (base, server) = serve_once("201 Created", r#"{"entity":{"uuid":"abc-123","email":"anna@example.de"}}"#);

        let id = store(&base).create(&payload()).unwrap();
        assert_eq!(id, RecordId::new("abc-123"));

        let request = server.join().unwrap();
        assert!(request.starts_with("POST /entities HTTP/1.1"));
        assert!(request.contains(r#""email":"anna@example.de""#));
        assert!(request.contains(r#""phone":"+4917012345678""#));
    }

    #[test]
    fn test_update_patches_record() {
        let (base, server) = serve_once("200 OK", "{}");

        store(&format!("{base}/")).update(&RecordId::new("abc-123"), &payload()).unwrap();

        let request = server.join().unwrap();
        assert!(request.starts_with("PATCH /entities/abc-123 HTTP/1.1"));
    }

    #[test]
    fn test_non_success_status_is_rejected() {
        let (base, server) = serve_once("422 Unprocessable Entity", r#"{"error":"bad"}"#);

        let err = store(&base).update(&RecordId::new("abc-123"), &payload()).unwrap_err();
        assert_eq!(err, SyncError::Rejected { status: 422 });
        server.join().unwrap();
    }

    #[test]
    fn test_missing_identifier_is_malformed() {
        let (base, server) = serve_once("201 Created", r#"{"entity":{"email":"anna@example.de"}}"#);

        let err = store(&base).create(&payload()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse(_)));
        server.join().unwrap();
    }

    #[test]
    fn test_unparseable_body_is_malformed() {
        let (base, server) = serve_once("201 Created", "<html>oops</html>");

        let err = store(&base).create(&payload()).unwrap_err();
        assert!(matches!(err, SyncError::MalformedResponse(_)));
        server.join().unwrap();
    }

    #[test]
    fn test_unreachable_store_is_network_error() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = store(&format!("http://{addr}")).create(&payload()).unwrap_err();
        assert!(matches!(err, SyncError::Network(_)));
    }

    #[test]
    fn test_slow_store_times_out() {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let _ = read_request(&mut stream);
            thread::sleep(Duration::from_secs(3));
        });

        let slow = HttpRecordStore::new(&format!("http://{addr}"), Duration::from_millis(200)).unwrap();
        assert_eq!(slow.create(&payload()).unwrap_err(), SyncError::Timeout);
    }

    #[test]
    fn test_extract_record_id_fallbacks() {
        let id = extract_record_id(&serde_json::json!({"entity": {"id": 42}}));
        assert_eq!(id, Some(RecordId::new("42")));

        let id = extract_record_id(&serde_json::json!({"uuid": "top-level"}));
        assert_eq!(id, Some(RecordId::new("top-level")));

        assert_eq!(extract_record_id(&serde_json::json!({"entity": {"uuid": ""}})), None);
    }
}
