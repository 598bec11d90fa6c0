#![allow(dead_code)]

pub mod http {
    use std::io::{Read, Write};
    use std::net::{SocketAddr, TcpStream};
    use std::time::Duration;

    /// Send a raw HTTP/1.1 request and collect whatever arrives before the
    /// read timeout.
    pub fn send_request(addr: &SocketAddr, req: &str) -> String {
        let mut stream = TcpStream::connect(addr).unwrap();
        stream.write_all(req.as_bytes()).unwrap();
        stream
            .set_read_timeout(Some(Duration::from_millis(200)))
            .unwrap();
        let mut buf = Vec::new();
        loop {
            let mut tmp = [0u8; 1024];
            match stream.read(&mut tmp) {
                Ok(0) => break,
                Ok(n) => buf.extend_from_slice(&tmp[..n]),
                Err(ref e)
                    if e.kind() == std::io::ErrorKind::WouldBlock
                        || e.kind() == std::io::ErrorKind::TimedOut =>
                {
                    break
                }
                Err(e) => panic!("read error: {e:?}"),
            }
        }
        String::from_utf8_lossy(&buf).to_string()
    }

    pub struct ParsedResponse {
        pub status: u16,
        pub headers: Vec<(String, String)>,
        pub body: String,
    }

    impl ParsedResponse {
        pub fn header(&self, name: &str) -> Option<&str> {
            self.headers
                .iter()
                .find(|(n, _)| n.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        }

        pub fn json(&self) -> serde_json::Value {
            serde_json::from_str(&self.body).unwrap()
        }
    }

    pub fn parse_response(resp: &str) -> ParsedResponse {
        let (head, body) = resp.split_once("\r\n\r\n").unwrap_or((resp, ""));
        let mut status = 0;
        let mut headers = Vec::new();
        for line in head.lines() {
            if line.starts_with("HTTP/1.1") {
                status = line
                    .split_whitespace()
                    .nth(1)
                    .unwrap_or("0")
                    .parse()
                    .unwrap();
            } else if let Some((name, val)) = line.split_once(':') {
                headers.push((name.trim().to_string(), val.trim().to_string()));
            }
        }
        ParsedResponse {
            status,
            headers,
            body: body.to_string(),
        }
    }

    pub fn get(addr: &SocketAddr, path: &str) -> ParsedResponse {
        request(addr, "GET", path)
    }

    pub fn request(addr: &SocketAddr, method: &str, path: &str) -> ParsedResponse {
        let raw = send_request(
            addr,
            &format!("{method} {path} HTTP/1.1\r\nHost: localhost\r\nContent-Length: 0\r\n\r\n"),
        );
        parse_response(&raw)
    }
}

pub mod test_server {
    use routedoc::middleware::{ErrorStatusPolicy, ProcedureExt};
    use routedoc::server::{AppService, HttpServer, ServerHandle};
    use routedoc::RouteTable;
    use std::net::SocketAddr;
    use std::sync::Once;

    /// Ensures May coroutines are configured only once
    static MAY_INIT: Once = Once::new();

    pub fn setup_may_runtime() {
        MAY_INIT.call_once(|| {
            may::config().set_stack_size(0x8000);
        });
    }

    /// The demo item service on an ephemeral port; stopped on drop.
    pub struct ItemsServer {
        handle: Option<ServerHandle>,
        addr: SocketAddr,
    }

    impl ItemsServer {
        /// Statuses left as the handlers set them.
        pub fn start() -> Self {
            Self::with_policy(ErrorStatusPolicy::default())
        }

        pub fn with_policy(policy: ErrorStatusPolicy) -> Self {
            setup_may_runtime();
            let registry = RouteTable::new(routedoc_demo_items::serving_routes())
                .registry()
                .unwrap();
            let service = AppService::new(
                registry
                    .with_recovery()
                    .with_status_policy(policy)
                    .with_tracing(),
            );
            let handle = HttpServer(service).start("127.0.0.1:0").unwrap();
            handle.wait_ready().unwrap();
            let addr = handle.addr();
            Self {
                handle: Some(handle),
                addr,
            }
        }

        pub fn addr(&self) -> SocketAddr {
            self.addr
        }
    }

    impl Drop for ItemsServer {
        fn drop(&mut self) {
            if let Some(handle) = self.handle.take() {
                handle.stop();
            }
        }
    }
}
