//! Shared helpers for integration tests: an in-process stub of the inference
//! server and a few fixture builders.
#![allow(dead_code)]

use base64::{engine::general_purpose::STANDARD, Engine as _};
use serde_json::Value;
use std::io::Cursor;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::task::JoinHandle;

/// One request as seen by the stub.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: String,
}

impl RecordedRequest {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).expect("request body is JSON")
    }

    /// The single base64 image of an OCR request, decoded.
    pub fn image_bytes(&self) -> Option<Vec<u8>> {
        let v = self.json();
        let b64 = v.get("images")?.get(0)?.as_str()?.to_string();
        Some(STANDARD.decode(b64).expect("image is base64"))
    }
}

/// What the stub answers with.
#[derive(Debug, Clone)]
pub struct StubResponse {
    pub status: u16,
    pub body: String,
    pub delay: Duration,
}

impl StubResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self::raw(status, body.to_string())
    }

    pub fn raw(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
            delay: Duration::ZERO,
        }
    }

    /// A successful `/api/generate` answer.
    pub fn generated(text: &str) -> Self {
        Self::json(200, serde_json::json!({ "response": text, "done": true }))
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}

type Handler = dyn Fn(&RecordedRequest) -> StubResponse + Send + Sync;

/// A tiny HTTP/1.1 server speaking just enough of the Ollama API.
pub struct StubServer {
    addr: SocketAddr,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
    accept: JoinHandle<()>,
}

impl StubServer {
    pub async fn start<F>(handler: F) -> Self
    where
        F: Fn(&RecordedRequest) -> StubResponse + Send + Sync + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let requests = Arc::new(Mutex::new(Vec::new()));
        let handler: Arc<Handler> = Arc::new(handler);

        let recorded = Arc::clone(&requests);
        let accept = tokio::spawn(async move {
            while let Ok((stream, _)) = listener.accept().await {
                let recorded = Arc::clone(&recorded);
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    let _ = serve(stream, recorded, handler).await;
                });
            }
        });

        Self {
            addr,
            requests,
            accept,
        }
    }

    /// Healthy `/api/tags`; every `/api/generate` answers with `text`.
    pub async fn ollama(text: &'static str) -> Self {
        Self::start(move |req| match req.path.as_str() {
            "/api/tags" => StubResponse::json(200, serde_json::json!({ "models": [] })),
            "/api/generate" => StubResponse::generated(text),
            _ => StubResponse::raw(404, "not found"),
        })
        .await
    }

    pub fn base_url(&self) -> String {
        format!("http://{}", self.addr)
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn requests_to(&self, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.path == path)
            .collect()
    }

    /// Stop accepting connections; the port is closed.
    pub fn stop(&self) {
        self.accept.abort();
    }
}

impl Drop for StubServer {
    fn drop(&mut self) {
        self.accept.abort();
    }
}

async fn serve(
    mut stream: TcpStream,
    recorded: Arc<Mutex<Vec<RecordedRequest>>>,
    handler: Arc<Handler>,
) -> std::io::Result<()> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 8192];

    let header_end = loop {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            return Ok(());
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = head.lines();
    let mut request_line = lines.next().unwrap_or_default().split_whitespace();
    let method = request_line.next().unwrap_or_default().to_string();
    let path = request_line.next().unwrap_or_default().to_string();
    let content_length = lines
        .filter_map(|l| l.split_once(':'))
        .find(|(k, _)| k.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, v)| v.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while buf.len() < header_end + content_length {
        let n = stream.read(&mut chunk).await?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let body = String::from_utf8_lossy(&buf[header_end..]).to_string();

    let request = RecordedRequest { method, path, body };
    recorded.lock().unwrap().push(request.clone());
    let response = handler(&request);

    if !response.delay.is_zero() {
        tokio::time::sleep(response.delay).await;
    }

    let head = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n",
        response.status,
        if response.status < 400 { "OK" } else { "Error" },
        response.body.len()
    );
    stream.write_all(head.as_bytes()).await?;
    stream.write_all(response.body.as_bytes()).await?;
    stream.shutdown().await
}

// ── Fixtures ─────────────────────────────────────────────────────────────────

pub fn png(w: u32, h: u32) -> Vec<u8> {
    let img = image::DynamicImage::ImageRgb8(image::RgbImage::from_pixel(
        w,
        h,
        image::Rgb([240, 240, 240]),
    ));
    let mut buf = Vec::new();
    img.write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

/// Minimal well-formed PDF with `pages` blank pages. Page 1 is 200×100 pt,
/// later pages 300×500 pt, so a render of any other page is distinguishable.
pub fn blank_pdf(pages: usize) -> Vec<u8> {
    let kids: Vec<String> = (0..pages).map(|i| format!("{} 0 R", i + 3)).collect();
    let mut objects = vec![
        "<< /Type /Catalog /Pages 2 0 R >>".to_string(),
        format!("<< /Type /Pages /Kids [{}] /Count {} >>", kids.join(" "), pages),
    ];
    for i in 0..pages {
        let media_box = if i == 0 { "0 0 200 100" } else { "0 0 300 500" };
        objects.push(format!(
            "<< /Type /Page /Parent 2 0 R /MediaBox [{media_box}] >>"
        ));
    }

    let mut out = b"%PDF-1.4\n".to_vec();
    let mut offsets = Vec::new();
    for (i, body) in objects.iter().enumerate() {
        offsets.push(out.len());
        out.extend_from_slice(format!("{} 0 obj\n{}\nendobj\n", i + 1, body).as_bytes());
    }
    let xref = out.len();
    out.extend_from_slice(format!("xref\n0 {}\n0000000000 65535 f \n", objects.len() + 1).as_bytes());
    for off in offsets {
        out.extend_from_slice(format!("{:010} 00000 n \n", off).as_bytes());
    }
    out.extend_from_slice(
        format!(
            "trailer\n<< /Size {} /Root 1 0 R >>\nstartxref\n{}\n%%EOF\n",
            objects.len() + 1,
            xref
        )
        .as_bytes(),
    );
    out
}

pub async fn pdfium_available() -> bool {
    // Binding may download the library on first use.
    let bound = tokio::task::spawn_blocking(|| {
        edgequake_translate::pipeline::render::bind_pdfium(None).map(|_| ())
    })
    .await
    .expect("bind task");
    match bound {
        Ok(()) => true,
        Err(e) => {
            println!("SKIP: pdfium unavailable: {e}");
            false
        }
    }
}
