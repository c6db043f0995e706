//! Response handling shared by the HTTP clients in this crate.

/// Placeholder used when an error response body cannot be read.
pub(crate) const UNREADABLE_BODY: &str = "<unreadable body>";

/// Pass a 2xx response through; otherwise drain it into `(status, body)`
/// for the calling client to wrap in its own error type.
pub(crate) async fn check_status(
    response: reqwest::Response,
) -> Result<reqwest::Response, (u16, String)> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response
        .text()
        .await
        .unwrap_or_else(|_| UNREADABLE_BODY.to_string());
    Err((status.as_u16(), body))
}

/// Single-threaded HTTP/1.1 responder on a loopback port for client tests.
///
/// Serves one scripted reply per accepted connection, in order, and
/// records each request before answering it.
#[cfg(test)]
pub(crate) mod test_server {
    use std::net::SocketAddr;
    use std::sync::{Arc, Mutex};

    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::{TcpListener, TcpStream};

    pub(crate) struct Reply {
        status: u16,
        content_type: &'static str,
        body: Vec<u8>,
    }

    impl Reply {
        pub(crate) fn json(status: u16, body: serde_json::Value) -> Self {
            Self {
                status,
                content_type: "application/json",
                body: body.to_string().into_bytes(),
            }
        }

        pub(crate) fn bytes(status: u16, content_type: &'static str, body: &[u8]) -> Self {
            Self {
                status,
                content_type,
                body: body.to_vec(),
            }
        }
    }

    #[derive(Debug, Clone)]
    pub(crate) struct Recorded {
        pub(crate) method: String,
        pub(crate) target: String,
        pub(crate) headers: Vec<(String, String)>,
        pub(crate) body: Vec<u8>,
    }

    impl Recorded {
        pub(crate) fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub(crate) fn body_contains(&self, needle: &[u8]) -> bool {
            self.body.windows(needle.len()).any(|w| w == needle)
        }
    }

    pub(crate) struct TestServer {
        addr: SocketAddr,
        requests: Arc<Mutex<Vec<Recorded>>>,
    }

    impl TestServer {
        pub(crate) async fn start(replies: Vec<Reply>) -> Self {
            let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
            let addr = listener.local_addr().unwrap();
            let requests = Arc::new(Mutex::new(Vec::new()));
            let recorded = Arc::clone(&requests);

            tokio::spawn(async move {
                for reply in replies {
                    let Ok((mut stream, _)) = listener.accept().await else {
                        return;
                    };
                    let request = read_request(&mut stream).await;
                    recorded.lock().unwrap().push(request);

                    let head = format!(
                        "HTTP/1.1 {} Scripted\r\ncontent-type: {}\r\ncontent-length: {}\r\nconnection: close\r\n\r\n",
                        reply.status,
                        reply.content_type,
                        reply.body.len(),
                    );
                    stream.write_all(head.as_bytes()).await.unwrap();
                    stream.write_all(&reply.body).await.unwrap();
                    stream.shutdown().await.ok();
                }
            });

            Self { addr, requests }
        }

        /// `host:port`, usable as a capability identifier.
        pub(crate) fn host(&self) -> String {
            self.addr.to_string()
        }

        pub(crate) fn requests(&self) -> Vec<Recorded> {
            self.requests.lock().unwrap().clone()
        }
    }

    async fn read_request(stream: &mut TcpStream) -> Recorded {
        let mut buf = Vec::new();
        let mut chunk = [0u8; 4096];
        let head_end = loop {
            if let Some(pos) = find(&buf, b"\r\n\r\n") {
                break pos;
            }
            let n = stream.read(&mut chunk).await.unwrap();
            assert!(n > 0, "connection closed before request head");
            buf.extend_from_slice(&chunk[..n]);
        };

        let head = String::from_utf8_lossy(&buf[..head_end]).into_owned();
        let mut lines = head.split("\r\n");
        let mut request_line = lines.next().unwrap_or_default().split(' ');
        let method = request_line.next().unwrap_or_default().to_string();
        let target = request_line.next().unwrap_or_default().to_string();
        let headers: Vec<(String, String)> = lines
            .filter_map(|l| l.split_once(':'))
            .map(|(k, v)| (k.trim().to_ascii_lowercase(), v.trim().to_string()))
            .collect();

        let mut body = buf[head_end + 4..].to_vec();
        let lookup = |name: &str| {
            headers
                .iter()
                .find(|(k, _)| k == name)
                .map(|(_, v)| v.clone())
        };

        if let Some(len) = lookup("content-length").and_then(|v| v.parse::<usize>().ok()) {
            while body.len() < len {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed mid-body");
                body.extend_from_slice(&chunk[..n]);
            }
        } else if lookup("transfer-encoding").is_some_and(|v| v.contains("chunked")) {
            while !body.ends_with(b"0\r\n\r\n") {
                let n = stream.read(&mut chunk).await.unwrap();
                assert!(n > 0, "connection closed mid-body");
                body.extend_from_slice(&chunk[..n]);
            }
            body = dechunk(&body);
        }

        Recorded {
            method,
            target,
            headers,
            body,
        }
    }

    fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack.windows(needle.len()).position(|w| w == needle)
    }

    fn dechunk(raw: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        let mut rest = raw;
        while let Some(line_end) = find(rest, b"\r\n") {
            let size_hex = String::from_utf8_lossy(&rest[..line_end]);
            let size = usize::from_str_radix(size_hex.trim(), 16).unwrap_or(0);
            if size == 0 {
                break;
            }
            let start = line_end + 2;
            out.extend_from_slice(&rest[start..start + size]);
            rest = &rest[start + size + 2..];
        }
        out
    }
}
