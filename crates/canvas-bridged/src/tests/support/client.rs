//! Line-oriented JSON client for exercising a running bridge.

use std::io::{BufRead, BufReader, ErrorKind, Write};
use std::net::{SocketAddr, TcpStream};
use std::time::Duration;

use serde_json::Value;

const READ_TIMEOUT: Duration = Duration::from_secs(5);

pub struct BridgeClient {
    writer: TcpStream,
    reader: BufReader<TcpStream>,
}

impl BridgeClient {
    pub fn connect(addr: SocketAddr) -> Self {
        let writer = TcpStream::connect(addr).expect("connect to bridge");
        writer
            .set_read_timeout(Some(READ_TIMEOUT))
            .expect("set read timeout");
        let reader = BufReader::new(writer.try_clone().expect("clone stream"));
        Self { writer, reader }
    }

    /// Writes raw bytes without waiting for a reply.
    pub fn send_raw(&mut self, bytes: &[u8]) {
        self.writer.write_all(bytes).expect("write request");
        self.writer.flush().expect("flush request");
    }

    /// Reads one reply line.
    pub fn read_reply(&mut self) -> Value {
        let mut line = String::new();
        let read = self.reader.read_line(&mut line).expect("read reply");
        assert!(read > 0, "bridge closed the connection");
        serde_json::from_str(&line).expect("reply is JSON")
    }

    /// Whether the bridge closed the connection before the read timeout.
    pub fn is_closed(&mut self) -> bool {
        let mut line = String::new();
        match self.reader.read_line(&mut line) {
            Ok(read) => read == 0,
            Err(error) => !matches!(error.kind(), ErrorKind::WouldBlock | ErrorKind::TimedOut),
        }
    }

    /// Sends one request line and returns its reply.
    pub fn request(&mut self, request: &Value) -> Value {
        let mut bytes = serde_json::to_vec(request).expect("encode request");
        bytes.push(b'\n');
        self.send_raw(&bytes);
        self.read_reply()
    }

    /// Creates a component and returns its identifier.
    pub fn create(&mut self, component_name: &str, parameters: Value) -> String {
        let reply = self.request(&serde_json::json!({
            "command": "create_component",
            "component_name": component_name,
            "parameters": parameters,
        }));
        assert_eq!(reply["success"], Value::Bool(true), "create failed: {reply}");
        reply["component_guid"]
            .as_str()
            .expect("component_guid")
            .to_owned()
    }
}
