//! テスト用のHTTPスタブサーバー
//!
//! SDKクライアントのエンドポイントを向け、固定のエラーレスポンスを返させる。

use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::time::timeout;

const READ_TIMEOUT: Duration = Duration::from_millis(500);

/// 固定レスポンス
pub struct StubResponse {
    pub status: u16,
    pub reason: &'static str,
    pub headers: Vec<(&'static str, &'static str)>,
    pub body: &'static str,
}

impl StubResponse {
    fn to_bytes(&self) -> Vec<u8> {
        let mut response = format!(
            "HTTP/1.1 {} {}\r\nContent-Length: {}\r\nConnection: close\r\n",
            self.status,
            self.reason,
            self.body.len()
        );
        for (name, value) in &self.headers {
            response.push_str(&format!("{}: {}\r\n", name, value));
        }
        response.push_str("\r\n");
        response.push_str(self.body);
        response.into_bytes()
    }
}

/// スタブサーバーを起動し、エンドポイントURL（`http://127.0.0.1:<port>`）を返す
///
/// 接続ごとにリクエストを読み切ってから同じレスポンスを返す。
pub async fn spawn(response: StubResponse) -> String {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let bytes = response.to_bytes();

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let bytes = bytes.clone();
            tokio::spawn(async move {
                drain_request(&mut socket).await;
                let _ = socket.write_all(&bytes).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    format!("http://{}", addr)
}

/// ヘッダーとContent-Length分の本文を読み捨てる
async fn drain_request(socket: &mut TcpStream) {
    let mut received = Vec::new();
    let mut buf = [0u8; 8192];
    let mut expected_len: Option<usize> = None;

    loop {
        if expected_len.is_some_and(|len| received.len() >= len) {
            break;
        }
        match timeout(READ_TIMEOUT, socket.read(&mut buf)).await {
            Ok(Ok(n)) if n > 0 => received.extend_from_slice(&buf[..n]),
            _ => break,
        }
        if expected_len.is_none() {
            expected_len = request_len(&received);
        }
    }
}

/// ヘッダー終端が見つかれば、ヘッダー込みのリクエスト全体の長さを返す
fn request_len(received: &[u8]) -> Option<usize> {
    let header_end = received.windows(4).position(|w| w == b"\r\n\r\n")? + 4;
    let headers = String::from_utf8_lossy(&received[..header_end]);
    let content_length = headers
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    Some(header_end + content_length)
}

#[test]
fn test_request_len() {
    let request = b"PUT /b/k HTTP/1.1\r\nHost: x\r\ncontent-length: 5\r\n\r\nhel";
    assert_eq!(request_len(request), Some(request.len() - 3 + 5));
    assert_eq!(request_len(b"PUT /b/k HTTP/1.1\r\nHost"), None);
}
