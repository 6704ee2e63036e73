//! Test doubles shared by the service tests.

use crate::error::{CaptureError, InitError, RecognitionError};
use crate::models::frame::Frame;
use crate::models::ocr_result::RawText;
use crate::services::ocr::OcrEngine;
use crate::services::overlay::OverlaySink;
use crate::services::screen_capture::FrameSource;
use image::GrayImage;
use parking_lot::{Condvar, Mutex};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

/// Engine that replays queued results; clones share the same script
#[derive(Clone, Default)]
pub struct ScriptedEngine {
    script: Arc<Mutex<VecDeque<Result<RawText, RecognitionError>>>>,
    initialized: Arc<AtomicBool>,
    fail_next_init: Arc<AtomicBool>,
    calls: Arc<AtomicUsize>,
    inits: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
    last_size: Arc<Mutex<Option<(u32, u32)>>>,
    /// While `true`, `recognize` blocks after counting the call
    gate: Arc<(Mutex<bool>, Condvar)>,
}

impl ScriptedEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, result: Result<RawText, RecognitionError>) {
        self.script.lock().push_back(result);
    }

    pub fn push_text(&self, text: &str, confidence: i32) {
        self.push(Ok(RawText::new(text, confidence)));
    }

    /// Make subsequent `recognize` calls block until `release`
    pub fn hold(&self) {
        *self.gate.0.lock() = true;
    }

    pub fn release(&self) {
        *self.gate.0.lock() = false;
        self.gate.1.notify_all();
    }

    pub fn fail_next_init(&self) {
        self.fail_next_init.store(true, Ordering::SeqCst);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn inits(&self) -> usize {
        self.inits.load(Ordering::SeqCst)
    }

    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }

    pub fn last_size(&self) -> Option<(u32, u32)> {
        *self.last_size.lock()
    }
}

impl OcrEngine for ScriptedEngine {
    fn init(&mut self, data_path: &str) -> Result<(), InitError> {
        self.inits.fetch_add(1, Ordering::SeqCst);
        if self.fail_next_init.swap(false, Ordering::SeqCst) {
            return Err(InitError::Recognizer(format!("no traineddata in {}", data_path)));
        }
        self.initialized.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn recognize(&mut self, image: &GrayImage) -> Result<RawText, RecognitionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        {
            let (held, released) = &*self.gate;
            let mut held = held.lock();
            while *held {
                released.wait(&mut held);
            }
        }
        *self.last_size.lock() = Some(image.dimensions());
        self.script
            .lock()
            .pop_front()
            .unwrap_or_else(|| Ok(RawText::new("", 0)))
    }

    fn shutdown(&mut self) {
        self.shutdowns.fetch_add(1, Ordering::SeqCst);
        self.initialized.store(false, Ordering::SeqCst);
    }

    fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::SeqCst)
    }
}

/// Overlay sink that records every label it receives
#[derive(Clone, Default)]
pub struct RecordingOverlay {
    labels: Arc<Mutex<Vec<String>>>,
}

impl RecordingOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn labels(&self) -> Vec<String> {
        self.labels.lock().clone()
    }

    pub fn last(&self) -> Option<String> {
        self.labels.lock().last().cloned()
    }
}

impl OverlaySink for RecordingOverlay {
    fn set_text(&self, text: &str) {
        self.labels.lock().push(text.to_string());
    }
}

/// Frame source returning a fixed frame, or unavailable when empty
#[derive(Clone, Default)]
pub struct StaticFrameSource {
    frame: Arc<Mutex<Option<Frame>>>,
    requests: Arc<AtomicUsize>,
}

impl StaticFrameSource {
    pub fn new(frame: Option<Frame>) -> Self {
        Self {
            frame: Arc::new(Mutex::new(frame)),
            requests: Arc::default(),
        }
    }

    pub fn set_frame(&self, frame: Option<Frame>) {
        *self.frame.lock() = frame;
    }

    pub fn requests(&self) -> usize {
        self.requests.load(Ordering::SeqCst)
    }
}

impl FrameSource for StaticFrameSource {
    fn capture(&self, target: &str) -> Result<Frame, CaptureError> {
        self.requests.fetch_add(1, Ordering::SeqCst);
        self.frame
            .lock()
            .clone()
            .ok_or_else(|| CaptureError::Unavailable(target.to_string()))
    }
}

/// Solid BGRA frame
pub fn solid_frame(width: u32, height: u32) -> Frame {
    Frame::new(vec![0x80; (width * height * 4) as usize], width as usize * 4, width, height)
        .expect("valid test frame")
}

/// Minimal HTTP endpoint answering every request with a fixed status
pub struct StubServer {
    pub url: String,
    requests: Arc<Mutex<Vec<String>>>,
    hits: Arc<AtomicUsize>,
}

impl StubServer {
    /// Answer each request with `status`
    pub async fn respond_with(status: u16) -> Self {
        Self::start(Some(status)).await
    }

    /// Accept connections but never answer
    pub async fn silent() -> Self {
        Self::start(None).await
    }

    async fn start(status: Option<u16>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind stub server");
        let addr = listener.local_addr().expect("stub server addr");
        let requests = Arc::new(Mutex::new(Vec::new()));
        let hits = Arc::new(AtomicUsize::new(0));

        let (req_log, hit_count) = (Arc::clone(&requests), Arc::clone(&hits));
        tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let (req_log, hit_count) = (Arc::clone(&req_log), Arc::clone(&hit_count));
                tokio::spawn(async move {
                    handle_connection(stream, status, req_log, hit_count).await;
                });
            }
        });

        Self {
            url: format!("http://{}/api/sr", addr),
            requests,
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().clone()
    }
}

async fn handle_connection(
    mut stream: TcpStream,
    status: Option<u16>,
    requests: Arc<Mutex<Vec<String>>>,
    hits: Arc<AtomicUsize>,
) {
    let request = read_request(&mut stream).await;
    requests.lock().push(request);
    hits.fetch_add(1, Ordering::SeqCst);

    match status {
        Some(status) => {
            let response = format!(
                "HTTP/1.1 {} Stub\r\nContent-Length: 0\r\nConnection: close\r\n\r\n",
                status
            );
            let _ = stream.write_all(response.as_bytes()).await;
            let _ = stream.shutdown().await;
        }
        None => {
            // Hold the connection open past any client timeout
            tokio::time::sleep(Duration::from_secs(30)).await;
        }
    }
}

/// Read headers plus a Content-Length body
async fn read_request(stream: &mut TcpStream) -> String {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];

    loop {
        let n = match stream.read(&mut chunk).await {
            Ok(0) | Err(_) => break,
            Ok(n) => n,
        };
        buf.extend_from_slice(&chunk[..n]);

        let text = String::from_utf8_lossy(&buf);
        if let Some(header_end) = text.find("\r\n\r\n") {
            let content_length = text[..header_end]
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())
                        .flatten()
                })
                .unwrap_or(0);
            if buf.len() >= header_end + 4 + content_length {
                break;
            }
        }
    }

    String::from_utf8_lossy(&buf).into_owned()
}
