//! Integration tests for the tabletop server: real WebSocket clients
//! against a server bound to an OS-assigned port.

use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde_json::{Value, json};
use tabletop::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

/// Starts a server on a random port and returns the address plus a
/// handle for inspecting the table.
async fn start_server() -> (String, tabletop::TableHandle) {
    let server = TabletopServerBuilder::new()
        .bind("127.0.0.1:0")
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let table = server.table();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, table)
}

async fn connect(addr: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}"))
        .await
        .expect("should connect");
    ws
}

async fn send_command(ws: &mut ClientWs, client: &str, event_id: &str, command: &str, payload: Value) {
    let cmd = ClientCommand::new(client, event_id, command, payload);
    let text = serde_json::to_string(&cmd).expect("encode");
    ws.send(Message::text(text)).await.expect("send command");
}

/// Waits up to a second for the next JSON message.
async fn recv_json(ws: &mut ClientWs) -> Value {
    let msg = tokio::time::timeout(Duration::from_secs(1), ws.next())
        .await
        .expect("timed out waiting for server")
        .expect("stream ended")
        .expect("recv error");
    serde_json::from_slice(&msg.into_data()).expect("server sends JSON")
}

/// Asserts nothing arrives within a short window.
async fn assert_silent(ws: &mut ClientWs) {
    let result = tokio::time::timeout(Duration::from_millis(150), ws.next()).await;
    assert!(result.is_err(), "expected no message, got {result:?}");
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_events_are_broadcast_in_order() {
    let (addr, _table) = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    send_command(&mut alice, "alice", "a1", "JOIN", json!({"name": "Alice"})).await;
    let first = recv_json(&mut alice).await;
    assert_eq!(
        first,
        json!({
            "type": "event",
            "seq": 1,
            "event_id": "a1",
            "event_type": "JOIN",
            "payload": {"client_id": "alice", "name": "Alice"}
        })
    );

    send_command(&mut bob, "bob", "b1", "JOIN", json!({"name": "Bob"})).await;
    let to_alice = recv_json(&mut alice).await;
    let to_bob = recv_json(&mut bob).await;
    assert_eq!(to_alice, to_bob);
    assert_eq!(to_bob["seq"], 2);

    send_command(&mut alice, "alice", "a2", "ROLL_DICE", json!({"sides": 20})).await;
    for ws in [&mut alice, &mut bob] {
        let roll = recv_json(ws).await;
        assert_eq!(roll["seq"], 3);
        let result = roll["payload"]["result"].as_i64().unwrap();
        assert!((1..=20).contains(&result));
    }
}

#[tokio::test]
async fn test_invalid_json_gets_error_and_consumes_no_seq() {
    let (addr, table) = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("{not json".to_string())).await.unwrap();
    assert_eq!(
        recv_json(&mut ws).await,
        json!({"type": "error", "message": "Invalid JSON."})
    );

    send_command(&mut ws, "p", "1", "CHAT", json!({"text": "hi"})).await;
    assert_eq!(recv_json(&mut ws).await["seq"], 1);
    assert_eq!(table.info().await.unwrap().last_seq, 1);
}

#[tokio::test]
async fn test_envelope_errors_are_specific() {
    let (addr, _table) = start_server().await;
    let mut ws = connect(&addr).await;

    ws.send(Message::text("[1,2,3]".to_string())).await.unwrap();
    assert_eq!(recv_json(&mut ws).await["message"], "Message must be a JSON object.");

    let no_payload = json!({"type": "command", "client_id": "p", "event_id": "e", "command": "CHAT"});
    ws.send(Message::text(no_payload.to_string())).await.unwrap();
    assert_eq!(
        recv_json(&mut ws).await["message"],
        "Missing/invalid payload (must be object)."
    );
}

#[tokio::test]
async fn test_command_errors_are_unicast() {
    let (addr, table) = start_server().await;
    let mut alice = connect(&addr).await;
    let mut bob = connect(&addr).await;

    send_command(&mut alice, "alice", "a1", "CHAT", json!({"text": "hey"})).await;
    recv_json(&mut alice).await;
    send_command(&mut bob, "bob", "b1", "CHAT", json!({"text": "yo"})).await;
    recv_json(&mut alice).await;
    recv_json(&mut bob).await;

    send_command(&mut bob, "bob", "b2", "JOIN", json!({"name": "   "})).await;
    assert_eq!(
        recv_json(&mut bob).await,
        json!({"type": "error", "message": "JOIN requires payload.name as non-empty string."})
    );
    send_command(&mut bob, "bob", "b3", "TELEPORT", json!({})).await;
    assert_eq!(recv_json(&mut bob).await["message"], "Unknown command: TELEPORT");

    assert_silent(&mut alice).await;
    assert_eq!(table.info().await.unwrap().last_seq, 2);
}

#[tokio::test]
async fn test_retransmitted_command_is_silently_ignored() {
    let (addr, table) = start_server().await;
    let mut ws = connect(&addr).await;

    for _ in 0..3 {
        send_command(&mut ws, "dm", "hit", "SET_HP", json!({"target_id": "orc", "delta": -999})).await;
    }
    send_command(&mut ws, "dm", "move", "MOVE_TOKEN", json!({"token_id": "orc", "x": 3, "y": 4})).await;

    let hit = recv_json(&mut ws).await;
    assert_eq!(hit["seq"], 1);
    assert_eq!(hit["payload"], json!({"target_id": "orc", "delta": -999, "new_hp": 0}));

    let moved = recv_json(&mut ws).await;
    assert_eq!(moved["seq"], 2);
    assert_eq!(moved["event_type"], "MOVE_TOKEN");

    let info = table.info().await.unwrap();
    assert_eq!(info.last_seq, 2);
    assert_eq!(info.players, 1);
    assert_eq!(info.tokens, 1);
}

#[tokio::test]
async fn test_reconnect_takes_over_and_stale_close_does_not_evict() {
    let (addr, table) = start_server().await;
    let mut old = connect(&addr).await;
    let mut new = connect(&addr).await;
    let mut other = connect(&addr).await;

    send_command(&mut old, "p", "1", "JOIN", json!({"name": "P"})).await;
    recv_json(&mut old).await;

    // Same client id from a second connection: last registration wins.
    send_command(&mut new, "p", "2", "CHAT", json!({"text": "back"})).await;
    assert_eq!(recv_json(&mut new).await["seq"], 2);
    assert_silent(&mut old).await;

    send_command(&mut other, "q", "1", "CHAT", json!({"text": "hi p"})).await;
    recv_json(&mut other).await;
    assert_eq!(recv_json(&mut new).await["seq"], 3);
    assert_silent(&mut old).await;

    // Closing the displaced connection must leave the newer one registered.
    old.close(None).await.unwrap();
    drop(old);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(table.info().await.unwrap().connections, 2);

    send_command(&mut other, "q", "2", "CHAT", json!({"text": "still there?"})).await;
    recv_json(&mut other).await;
    assert_eq!(recv_json(&mut new).await["seq"], 4);
}

#[tokio::test]
async fn test_closed_connection_is_unregistered() {
    let (addr, table) = start_server().await;
    let mut ws = connect(&addr).await;

    send_command(&mut ws, "p", "1", "CHAT", json!({"text": "bye"})).await;
    recv_json(&mut ws).await;
    assert_eq!(table.info().await.unwrap().connections, 1);

    ws.close(None).await.unwrap();
    drop(ws);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(table.info().await.unwrap().connections, 0);
}
