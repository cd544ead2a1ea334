use crate::config::Config;
use crate::error::{Error, Result};
use crate::storage::rekor::{LogResponse, RekorEntryRequest};
use crate::storage::traits::TransparencyLog;

use std::fs;
use std::io::{Read, Write};
use std::net::TcpListener;
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::thread::{self, JoinHandle};
use std::time::Duration;
use walkdir::WalkDir;

pub const VALID_ATTESTATION: &str =
    r#"{"m":"ed25519","u":"did:key:z6MkTest","r":"4f1c9a","s":"c2lnbmF0dXJl"}"#;

pub enum MockReply {
    Respond { status: u16, body: String },
    Timeout,
}

/// In-memory transparency log that records what it was sent.
pub struct MockTransparencyLog {
    reply: MockReply,
    requests: Mutex<Vec<RekorEntryRequest>>,
}

impl MockTransparencyLog {
    pub fn responding(status: u16, body: &str) -> Self {
        Self {
            reply: MockReply::Respond {
                status,
                body: body.to_string(),
            },
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn timing_out() -> Self {
        Self {
            reply: MockReply::Timeout,
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn requests(&self) -> Vec<RekorEntryRequest> {
        self.requests.lock().unwrap().clone()
    }
}

impl TransparencyLog for MockTransparencyLog {
    fn entries_url(&self) -> String {
        "mock://rekor/api/v2/log/entries".to_string()
    }

    fn submit_entry(&self, request: &RekorEntryRequest) -> Result<LogResponse> {
        self.requests.lock().unwrap().push(request.clone());
        match &self.reply {
            MockReply::Respond { status, body } => Ok(LogResponse::from_body(*status, body)),
            MockReply::Timeout => Err(Error::SubmissionTimeout {
                url: self.entries_url(),
                timeout_ms: 1,
            }),
        }
    }
}

/// A local HTTP endpoint that answers exactly one request.
pub struct OneShotServer {
    pub base_url: String,
    handle: JoinHandle<String>,
}

impl OneShotServer {
    /// Answer with `status` and `body` after waiting `delay`.
    pub fn start(status: u16, content_type: &str, body: &str, delay: Duration) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let response = format!(
            "HTTP/1.1 {status} Test\r\nContent-Type: {content_type}\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        let handle = thread::spawn(move || {
            let (mut stream, _) = listener.accept().unwrap();
            let request = read_request(&mut stream);
            thread::sleep(delay);
            // The client may already have given up
            let _ = stream.write_all(response.as_bytes());
            let _ = stream.flush();
            request
        });

        Self { base_url, handle }
    }

    /// Raw request (head and body) the server received.
    pub fn received(self) -> String {
        self.handle.join().unwrap()
    }
}

fn read_request(stream: &mut std::net::TcpStream) -> String {
    let mut data = Vec::new();
    let mut buf = [0u8; 4096];

    loop {
        let n = stream.read(&mut buf).unwrap_or(0);
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buf[..n]);

        let text = String::from_utf8_lossy(&data);
        if let Some(head_end) = text.find("\r\n\r\n") {
            let content_length = text[..head_end]
                .lines()
                .filter_map(|line| line.split_once(':'))
                .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
                .and_then(|(_, value)| value.trim().parse::<usize>().ok())
                .unwrap_or(0);
            if data.len() >= head_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&data).into_owned()
}

/// Split a raw HTTP request into its head and body.
pub fn split_request(raw: &str) -> (&str, &str) {
    raw.split_once("\r\n\r\n").unwrap_or((raw, ""))
}

/// A refused connection target: a port that was bound and released.
pub fn closed_port_url() -> String {
    let listener = TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{addr}")
}

pub fn write_artifact(root: &Path, relative: &str, content: &str) -> PathBuf {
    let path = root.join(relative);
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(&path, content).unwrap();
    path
}

pub fn test_config(root: &Path, rekor_base_url: &str) -> Config {
    Config {
        attestations_path: root.join("statement-attestations"),
        proofs_path: root.join("rekor-proofs"),
        rekor_base_url: rekor_base_url.to_string(),
        timeout: Duration::from_secs(5),
        show_progress: false,
        ..Config::default()
    }
}

pub fn files_under(root: &Path) -> Vec<PathBuf> {
    WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .collect()
}
