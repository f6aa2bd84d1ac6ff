use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::path::Path;
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::OnceLock;
use std::thread::JoinHandle;

use tempfile::TempDir;

/// Empty scratch directory to run commands from, so no ambient .env file
/// can feed credentials into the binary under test.
#[allow(dead_code)]
pub fn scratch_dir() -> &'static Path {
    static SCRATCH: OnceLock<TempDir> = OnceLock::new();
    SCRATCH
        .get_or_init(|| TempDir::new().expect("scratch dir"))
        .path()
}

/// Canned single-request HTTP server for exercising the binary without
/// touching the network.
#[allow(dead_code)]
pub struct StubServer {
    pub base_url: String,
    requests: Receiver<String>,
    handle: JoinHandle<()>,
}

#[allow(dead_code)]
impl StubServer {
    /// Serves exactly one request with the given status and body, capturing
    /// the raw request text.
    pub fn single(status: u16, body: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind stub server");
        let addr = listener.local_addr().expect("stub server addr");
        let (tx, rx) = mpsc::channel();
        let response_body = body.to_string();
        let handle = std::thread::spawn(move || {
            if let Ok((stream, _)) = listener.accept() {
                let _ = handle_connection(stream, status, &response_body, &tx);
            }
        });
        Self {
            base_url: format!("http://{addr}"),
            requests: rx,
            handle,
        }
    }

    /// The raw request the server saw, head and body. Call after the client
    /// has finished.
    pub fn request(self) -> String {
        let _ = self.handle.join();
        self.requests.try_recv().unwrap_or_default()
    }
}

fn handle_connection(
    mut stream: TcpStream,
    status: u16,
    body: &str,
    tx: &Sender<String>,
) -> std::io::Result<()> {
    let request = read_request(&mut stream)?;
    let _ = tx.send(request);

    let reason = match status {
        200 => "OK",
        401 => "Unauthorized",
        404 => "Not Found",
        500 => "Internal Server Error",
        _ => "Status",
    };
    let response = format!(
        "HTTP/1.1 {status} {reason}\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{body}",
        body.len(),
    );
    stream.write_all(response.as_bytes())?;
    stream.flush()
}

/// Reads the request head plus any content-length body.
fn read_request(stream: &mut TcpStream) -> std::io::Result<String> {
    let mut buf = Vec::new();
    let mut chunk = [0u8; 1024];
    loop {
        let n = stream.read(&mut chunk)?;
        if n == 0 {
            break;
        }
        buf.extend_from_slice(&chunk[..n]);
        if let Some(header_end) = find_header_end(&buf) {
            let head = String::from_utf8_lossy(&buf[..header_end]);
            if buf.len() >= header_end + 4 + content_length(&head) {
                break;
            }
        }
    }
    Ok(String::from_utf8_lossy(&buf).to_string())
}

fn find_header_end(buf: &[u8]) -> Option<usize> {
    buf.windows(4).position(|window| window == b"\r\n\r\n")
}

fn content_length(head: &str) -> usize {
    head.lines()
        .find_map(|line| {
            let (name, value) = line.split_once(':')?;
            name.eq_ignore_ascii_case("content-length")
                .then(|| value.trim().parse().ok())?
        })
        .unwrap_or(0)
}
