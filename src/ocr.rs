use serde::{Deserialize, Serialize};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::time::Duration;
use thiserror::Error;

use crate::config::OcrConfig;

/// Shown when the request itself fails.
pub const OCR_FAILED_MESSAGE: &str = "Error extracting text from image.";
/// Shown when the service answers without a `text` field.
pub const NO_TEXT_MESSAGE: &str = "No text found in the response.";

#[derive(Debug, Error)]
pub enum OcrError {
    #[error("OCR request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("OCR service returned {0}")]
    Status(reqwest::StatusCode),

    #[error("OCR response has no `text` field")]
    MissingText,

    #[error("OCR worker stopped before answering")]
    Interrupted,
}

impl OcrError {
    pub fn user_message(&self) -> &'static str {
        match self {
            OcrError::MissingText => NO_TEXT_MESSAGE,
            _ => OCR_FAILED_MESSAGE,
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error("an OCR request is already in progress")]
    Busy,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrEndpoint {
    #[default]
    Ocr,
    SimpleOcr,
}

impl OcrEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            OcrEndpoint::Ocr => "/ocr",
            OcrEndpoint::SimpleOcr => "/simpleocr",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            OcrEndpoint::Ocr => "OCR",
            OcrEndpoint::SimpleOcr => "Simple OCR",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OcrScope {
    #[default]
    Composite,
    Selection,
}

// ── Wire format ─────────────────────────────────────────────────────────────

#[derive(Serialize)]
struct OcrRequest<'a> {
    image: &'a str,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OcrText {
    One(String),
    Many(Vec<String>),
}

#[derive(Deserialize)]
struct OcrResponse {
    text: Option<OcrText>,
}

impl OcrResponse {
    fn into_text(self) -> Result<String, OcrError> {
        match self.text {
            Some(OcrText::One(s)) => Ok(s),
            Some(OcrText::Many(blocks)) => Ok(blocks.join("\n")),
            None => Err(OcrError::MissingText),
        }
    }
}

// ── Client ──────────────────────────────────────────────────────────────────

#[derive(Clone, Debug)]
pub struct OcrClient {
    http: reqwest::blocking::Client,
    base_url: String,
}

impl OcrClient {
    pub fn new(config: &OcrConfig) -> Result<Self, OcrError> {
        let http = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn url(&self, endpoint: OcrEndpoint) -> String {
        format!("{}{}", self.base_url, endpoint.path())
    }

    pub fn extract(&self, endpoint: OcrEndpoint, data_url: &str) -> Result<String, OcrError> {
        let url = self.url(endpoint);
        log::debug!("POST {url} ({} bytes of image data)", data_url.len());
        let resp = self
            .http
            .post(&url)
            .json(&OcrRequest { image: data_url })
            .send()?;

        let status = resp.status();
        if !status.is_success() {
            return Err(OcrError::Status(status));
        }
        resp.json::<OcrResponse>()?.into_text()
    }
}

// ── Dispatcher ──────────────────────────────────────────────────────────────

pub struct OcrDispatcher {
    client: OcrClient,
    pending: Option<Receiver<Result<String, OcrError>>>,
}

impl OcrDispatcher {
    pub fn new(client: OcrClient) -> Self {
        Self {
            client,
            pending: None,
        }
    }

    pub fn is_busy(&self) -> bool {
        self.pending.is_some()
    }

    pub fn dispatch(
        &mut self,
        endpoint: OcrEndpoint,
        data_url: String,
        on_done: impl FnOnce() + Send + 'static,
    ) -> Result<(), DispatchError> {
        if self.is_busy() {
            log::warn!("OCR request rejected: one is already in flight");
            return Err(DispatchError::Busy);
        }
        let (tx, rx) = mpsc::channel();
        let client = self.client.clone();
        std::thread::spawn(move || {
            let result = client.extract(endpoint, &data_url);
            let _ = tx.send(result);
            on_done();
        });
        self.pending = Some(rx);
        Ok(())
    }

    pub fn poll(&mut self) -> Option<Result<String, OcrError>> {
        let rx = self.pending.as_ref()?;
        let result = match rx.try_recv() {
            Ok(result) => result,
            Err(TryRecvError::Empty) => return None,
            Err(TryRecvError::Disconnected) => Err(OcrError::Interrupted),
        };
        self.pending = None;
        Some(result)
    }

    #[cfg(test)]
    fn wait(&mut self) -> Option<Result<String, OcrError>> {
        let rx = self.pending.take()?;
        Some(rx.recv().unwrap_or(Err(OcrError::Interrupted)))
    }
}

pub fn output_text(result: Result<String, OcrError>) -> String {
    match result {
        Ok(text) => text,
        Err(e) => {
            log::error!("{e}");
            e.user_message().to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Read, Write};
    use std::net::TcpListener;

    struct Captured {
        request_line: String,
        body: String,
    }

    fn serve_once(
        status: &'static str,
        body: &'static str,
        gate: Receiver<()>,
    ) -> (String, Receiver<Captured>) {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        let (tx, rx) = mpsc::channel();
        std::thread::spawn(move || {
            let _ = gate.recv();
            let (stream, _) = listener.accept().unwrap();
            let mut reader = BufReader::new(stream);

            let mut request_line = String::new();
            reader.read_line(&mut request_line).unwrap();
            let mut content_length = 0;
            loop {
                let mut line = String::new();
                reader.read_line(&mut line).unwrap();
                let line = line.trim_end();
                if line.is_empty() {
                    break;
                }
                if let Some((name, value)) = line.split_once(':') {
                    if name.eq_ignore_ascii_case("content-length") {
                        content_length = value.trim().parse().unwrap();
                    }
                }
            }
            let mut buf = vec![0; content_length];
            reader.read_exact(&mut buf).unwrap();

            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            let mut stream = reader.into_inner();
            stream.write_all(response.as_bytes()).unwrap();
            let _ = tx.send(Captured {
                request_line: request_line.trim_end().to_string(),
                body: String::from_utf8(buf).unwrap(),
            });
        });
        (format!("http://{addr}"), rx)
    }

    fn open_gate() -> Receiver<()> {
        let (tx, rx) = mpsc::channel();
        tx.send(()).unwrap();
        rx
    }

    fn dispatcher(base_url: &str) -> OcrDispatcher {
        let config = OcrConfig {
            base_url: base_url.to_string(),
            timeout_secs: 10,
            ..OcrConfig::default()
        };
        OcrDispatcher::new(OcrClient::new(&config).unwrap())
    }

    #[test]
    fn text_string_is_displayed() {
        let (url, captured) = serve_once("200 OK", r#"{"text": "hello"}"#, open_gate());
        let mut ocr = dispatcher(&url);
        ocr.dispatch(OcrEndpoint::Ocr, "data:image/png;base64,AAAA".into(), || {})
            .unwrap();
        let result = ocr.wait().unwrap();
        assert_eq!(output_text(result), "hello");
        assert!(!ocr.is_busy());

        let captured = captured.recv().unwrap();
        assert!(captured.request_line.starts_with("POST /ocr "));
        let sent: serde_json::Value = serde_json::from_str(&captured.body).unwrap();
        assert_eq!(sent, serde_json::json!({ "image": "data:image/png;base64,AAAA" }));
    }

    #[test]
    fn missing_text_shows_fixed_message() {
        let (url, _captured) = serve_once("200 OK", "{}", open_gate());
        let mut ocr = dispatcher(&url);
        ocr.dispatch(OcrEndpoint::SimpleOcr, "data:".into(), || {})
            .unwrap();
        let result = ocr.wait().unwrap();
        assert!(matches!(result, Err(OcrError::MissingText)));
        assert_eq!(output_text(result), NO_TEXT_MESSAGE);
    }

    #[test]
    fn text_blocks_are_joined() {
        let (url, captured) = serve_once("200 OK", r#"{"text": ["one", "two"]}"#, open_gate());
        let client = dispatcher(&url).client;
        assert_eq!(client.extract(OcrEndpoint::SimpleOcr, "x").unwrap(), "one\ntwo");
        assert!(captured
            .recv()
            .unwrap()
            .request_line
            .starts_with("POST /simpleocr "));
    }

    #[test]
    fn server_error_shows_failure_message() {
        let (url, _captured) = serve_once(
            "500 Internal Server Error",
            r#"{"error": "boom"}"#,
            open_gate(),
        );
        let client = dispatcher(&url).client;
        let result = client.extract(OcrEndpoint::Ocr, "x");
        assert!(matches!(result, Err(OcrError::Status(s)) if s.as_u16() == 500));
        assert_eq!(output_text(result), OCR_FAILED_MESSAGE);
    }

    #[test]
    fn unreachable_service_shows_failure_message() {
        let addr = TcpListener::bind("127.0.0.1:0")
            .unwrap()
            .local_addr()
            .unwrap();
        let client = dispatcher(&format!("http://{addr}/")).client;
        let result = client.extract(OcrEndpoint::Ocr, "x");
        assert!(matches!(result, Err(OcrError::Http(_))));
        assert_eq!(output_text(result), OCR_FAILED_MESSAGE);
    }

    #[test]
    fn second_dispatch_while_busy_is_rejected() {
        let (gate_tx, gate_rx) = mpsc::channel();
        let (url, _captured) = serve_once("200 OK", r#"{"text": "first"}"#, gate_rx);
        let mut ocr = dispatcher(&url);
        ocr.dispatch(OcrEndpoint::Ocr, "a".into(), || {}).unwrap();
        assert!(ocr.is_busy());
        assert_eq!(
            ocr.dispatch(OcrEndpoint::Ocr, "b".into(), || {}),
            Err(DispatchError::Busy)
        );

        gate_tx.send(()).unwrap();
        assert_eq!(output_text(ocr.wait().unwrap()), "first");
        assert!(!ocr.is_busy());
    }

    #[test]
    fn base_url_trailing_slash_is_trimmed() {
        let client = dispatcher("http://example.test:5000/").client;
        assert_eq!(client.url(OcrEndpoint::SimpleOcr), "http://example.test:5000/simpleocr");
    }
}
