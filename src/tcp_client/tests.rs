use std::{
    future::Future,
    net::SocketAddr,
    time::{Duration, Instant},
};

use serde_json::json;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpSocket, TcpStream},
};

use super::*;
use crate::{error::ErrorKind, types::ErrorCode};

/// Accepts `connections` connections on a loopback port, handing each to `handler`.
async fn spawn_server<F, Fut>(connections: usize, handler: F) -> SocketAddr
where
    F: Fn(TcpStream) -> Fut + Send + 'static,
    Fut: Future<Output = ()> + Send + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        for _ in 0..connections {
            let (stream, _) = listener.accept().await.unwrap();
            tokio::spawn(handler(stream));
        }
    });
    addr
}

/// Reads until the bytes parse as one JSON value or the client half-closes.
async fn read_request(stream: &mut TcpStream) -> Vec<u8> {
    let mut received = Vec::new();
    let mut chunk = [0u8; 256];
    loop {
        let n = stream.read(&mut chunk).await.unwrap();
        if n == 0 {
            return received;
        }
        received.extend_from_slice(&chunk[..n]);
        if serde_json::from_slice::<Value>(&received).is_ok() {
            return received;
        }
    }
}

/// Keeps the connection open until the client goes away.
async fn hold_open(mut stream: TcpStream) {
    let mut buf = [0u8; 64];
    while let Ok(n) = stream.read(&mut buf).await {
        if n == 0 {
            break;
        }
    }
}

fn client(addr: SocketAddr) -> TcpClient {
    TcpClient::builder()
        .timeout(Duration::from_secs(5))
        .connect_timeout(Duration::from_secs(5))
        .build(addr.ip().to_string(), addr.port())
        .unwrap()
}

#[tokio::test]
async fn echoed_method_comes_back_unchanged() {
    let methods = vec!["ping", "GetProcMeminfo", "rpc.discover", "with \"quotes\"", "获取"];
    let addr = spawn_server(methods.len(), |mut stream| async move {
        let request = read_request(&mut stream).await;
        stream.write_all(&request).await.unwrap();
    })
    .await;

    let client = client(addr);
    for method in methods {
        let response = client.call(method, None).await.unwrap();
        assert_eq!(response, json!({ "method": method }));
    }
}

#[tokio::test]
async fn ping_pong_with_connection_left_open() {
    let addr = spawn_server(1, |mut stream| async move {
        let request = read_request(&mut stream).await;
        assert_eq!(request, br#"{"method":"ping"}"#.to_vec());
        stream.write_all(br#"{"result": "pong"}"#).await.unwrap();
        hold_open(stream).await;
    })
    .await;

    let started = Instant::now();
    let response = crate::call(&addr.ip().to_string(), addr.port(), "ping", None).await.unwrap();
    assert_eq!(response, json!({"result": "pong"}));
    assert!(started.elapsed() < Duration::from_secs(5));
}

#[tokio::test]
async fn params_are_sent_when_given() {
    let addr = spawn_server(1, |mut stream| async move {
        let request = read_request(&mut stream).await;
        stream.write_all(&request).await.unwrap();
    })
    .await;

    let params = Params::Array(vec![json!("meminfo")]);
    let response = client(addr).call("GetProcMeminfo", Some(params)).await.unwrap();
    assert_eq!(response, json!({"method": "GetProcMeminfo", "params": ["meminfo"]}));
}

#[tokio::test]
async fn reply_split_across_writes() {
    let addr = spawn_server(1, |mut stream| async move {
        read_request(&mut stream).await;
        for byte in b"{\n\t\"result\":\t\"Hello!\",\n\t\"id\":\t1\n}" {
            stream.write_all(&[*byte]).await.unwrap();
            stream.flush().await.unwrap();
            tokio::time::sleep(Duration::from_millis(1)).await;
        }
        hold_open(stream).await;
    })
    .await;

    let client = TcpClient::builder().buffer_size(4).build("127.0.0.1", addr.port()).unwrap();
    let response = client.call("SayHello", None).await.unwrap();
    assert_eq!(response, json!({"result": "Hello!", "id": 1}));
}

#[tokio::test]
async fn peer_closes_without_replying() {
    let addr = spawn_server(1, |stream| async move {
        drop(stream);
    })
    .await;

    let err = client(addr).call("ping", None).await.unwrap_err();
    assert!(
        matches!(err.kind(), ErrorKind::Transport | ErrorKind::Connection),
        "unexpected error: {}",
        err
    );
}

#[tokio::test]
async fn invalid_json_is_protocol_error() {
    let addr = spawn_server(2, |mut stream| async move {
        read_request(&mut stream).await;
        stream.write_all(b"{\"result\": pong}").await.unwrap();
        hold_open(stream).await;
    })
    .await;

    let started = Instant::now();
    let err = client(addr).call("ping", None).await.unwrap_err();
    assert!(matches!(err, TcpClientError::Protocol(_)), "unexpected error: {}", err);
    assert!(started.elapsed() < Duration::from_secs(5));

    let err = client(addr).call("ping", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Protocol);
}

#[tokio::test]
async fn silent_peer_times_out() {
    let addr = spawn_server(1, |mut stream| async move {
        read_request(&mut stream).await;
        hold_open(stream).await;
    })
    .await;

    let client = TcpClient::builder()
        .timeout(Duration::from_millis(200))
        .build("127.0.0.1", addr.port())
        .unwrap();
    let started = Instant::now();
    let err = client.call("ping", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Timeout);
    assert!(matches!(err, TcpClientError::Timeout { phase: Phase::Request, .. }));
    assert!(started.elapsed() < Duration::from_secs(2));
}

#[tokio::test]
async fn oversized_reply_is_rejected() {
    let addr = spawn_server(1, |mut stream| async move {
        read_request(&mut stream).await;
        let reply = json!({ "result": "x".repeat(4096) }).to_string();
        let _ = stream.write_all(reply.as_bytes()).await;
        hold_open(stream).await;
    })
    .await;

    let client = TcpClient::builder()
        .max_response_size(64)
        .build("127.0.0.1", addr.port())
        .unwrap();
    let err = client.call("GetCmdDmesg", None).await.unwrap_err();
    assert!(matches!(err, TcpClientError::ResponseTooLarge { limit: 64 }));
}

#[tokio::test]
async fn shutdown_write_for_servers_waiting_on_eof() {
    let addr = spawn_server(1, |mut stream| async move {
        let mut request = Vec::new();
        stream.read_to_end(&mut request).await.unwrap();
        let request: Value = serde_json::from_slice(&request).unwrap();
        let reply = json!({ "result": request["method"] });
        stream.write_all(reply.to_string().as_bytes()).await.unwrap();
    })
    .await;

    let client = TcpClient::builder()
        .shutdown_write(true)
        .timeout(Duration::from_secs(5))
        .build("127.0.0.1", addr.port())
        .unwrap();
    let response = client.call("ListAllMethod", None).await.unwrap();
    assert_eq!(response, json!({"result": "ListAllMethod"}));
}

#[tokio::test]
async fn bare_number_reply_completes_on_close() {
    let addr = spawn_server(1, |mut stream| async move {
        read_request(&mut stream).await;
        stream.write_all(b"42").await.unwrap();
    })
    .await;

    assert_eq!(client(addr).call("answer", None).await.unwrap(), json!(42));
}

#[tokio::test]
async fn number_ended_by_newline_completes_while_open() {
    let addr = spawn_server(1, |mut stream| async move {
        read_request(&mut stream).await;
        stream.write_all(b"42").await.unwrap();
        tokio::time::sleep(Duration::from_millis(50)).await;
        stream.write_all(b"\n").await.unwrap();
        hold_open(stream).await;
    })
    .await;

    let client = TcpClient::builder()
        .timeout(Duration::from_secs(2))
        .build("127.0.0.1", addr.port())
        .unwrap();
    assert_eq!(client.call("answer", None).await.unwrap(), json!(42));
}

#[tokio::test]
async fn number_longer_than_budget_is_rejected() {
    let addr = spawn_server(1, |mut stream| async move {
        read_request(&mut stream).await;
        let _ = stream.write_all(b"123456789").await;
        hold_open(stream).await;
    })
    .await;

    let client = TcpClient::builder()
        .buffer_size(2)
        .max_response_size(4)
        .timeout(Duration::from_secs(2))
        .build("127.0.0.1", addr.port())
        .unwrap();
    let err = client.call("answer", None).await.unwrap_err();
    assert!(matches!(err, TcpClientError::ResponseTooLarge { limit: 4 }));
}

#[tokio::test]
async fn request_assigns_ids_and_decodes_replies() {
    let addr = spawn_server(3, |mut stream| async move {
        let request: Value = serde_json::from_slice(&read_request(&mut stream).await).unwrap();
        assert_eq!(request["jsonrpc"], json!("2.0"));
        let reply = match request["method"].as_str() {
            Some("SayHello") => json!({ "result": "Hello!", "id": request["id"] }),
            _ => json!({
                "error": { "code": -32601, "message": "Method not found." },
                "id": request["id"],
            }),
        };
        let reply = serde_json::to_string_pretty(&reply).unwrap();
        stream.write_all(reply.as_bytes()).await.unwrap();
        hold_open(stream).await;
    })
    .await;

    let client = client(addr);

    let response = client.request("SayHello", None).await.unwrap();
    assert_eq!(response.id(), Some(&Id::Num(1)));
    assert_eq!(response.into_result(), Ok(json!("Hello!")));

    let response = client.request("SayHello", Some(Params::default())).await.unwrap();
    assert_eq!(response.id(), Some(&Id::Num(2)));

    let response = client.request("Nope", None).await.unwrap();
    assert_eq!(response.id(), Some(&Id::Num(3)));
    let error = response.into_result().unwrap_err();
    assert_eq!(error.code, ErrorCode::MethodNotFound);
}

#[tokio::test]
async fn request_rejects_non_rpc_replies() {
    let addr = spawn_server(2, |mut stream| async move {
        let request: Value = serde_json::from_slice(&read_request(&mut stream).await).unwrap();
        let reply = if request["id"] == json!(1) {
            json!([1, 2])
        } else {
            json!({ "result": true, "id": 999 })
        };
        stream.write_all(reply.to_string().as_bytes()).await.unwrap();
        hold_open(stream).await;
    })
    .await;

    let client = client(addr);
    let err = client.request("foo", None).await.unwrap_err();
    assert!(matches!(err, TcpClientError::InvalidResponse(_)));
    assert_eq!(err.kind(), ErrorKind::Protocol);

    let err = client.request("foo", None).await.unwrap_err();
    assert_eq!(err.to_string(), "Invalid JSON-RPC response: expected id 2, got 999");
}

#[tokio::test]
async fn refused_connection() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let err = TcpClient::new("127.0.0.1", port).unwrap().call("ping", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Connection);
}

#[tokio::test]
async fn unanswered_connect_times_out() {
    // A listener that never accepts drops new SYNs once its backlog is full.
    let socket = TcpSocket::new_v4().unwrap();
    socket.bind("127.0.0.1:0".parse().unwrap()).unwrap();
    let listener = socket.listen(1).unwrap();
    let addr = listener.local_addr().unwrap();
    let mut backlog = Vec::new();
    for _ in 0..32 {
        match timeout(Duration::from_millis(200), TcpStream::connect(addr)).await {
            Ok(Ok(stream)) => backlog.push(stream),
            _ => break,
        }
    }

    let client = TcpClient::builder()
        .connect_timeout(Duration::from_millis(300))
        .build("127.0.0.1", addr.port())
        .unwrap();
    let started = Instant::now();
    let err = client.call("ping", None).await.unwrap_err();
    assert!(matches!(err, TcpClientError::Timeout { phase: Phase::Connect, .. }), "{}", err);
    assert!(started.elapsed() < Duration::from_secs(2));
    drop(listener);
}

#[tokio::test]
async fn empty_method_is_rejected_before_connecting() {
    let client = TcpClient::new("127.0.0.1", 9).unwrap();
    let err = client.call("", None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
    let err = client.request(String::new(), None).await.unwrap_err();
    assert_eq!(err.kind(), ErrorKind::InvalidInput);
}

#[tokio::test]
async fn clients_are_shared_across_tasks() {
    let addr = spawn_server(8, |mut stream| async move {
        let request = read_request(&mut stream).await;
        stream.write_all(&request).await.unwrap();
    })
    .await;

    let client = client(addr);
    let handles = (0..8)
        .map(|i| {
            let client = client.clone();
            tokio::spawn(async move { client.call(format!("m{}", i), None).await })
        })
        .collect::<Vec<_>>();
    for (i, handle) in handles.into_iter().enumerate() {
        let response = handle.await.unwrap().unwrap();
        assert_eq!(response, json!({ "method": format!("m{}", i) }));
    }
}
