// Integration tests for the RTMP play client
//
// Full sessions against the scripted server in `common`, over in-memory
// transports and over loopback TCP.

mod common;

use common::*;
use rtmp::{
    Amf0Value, ClientState, Error, MemoryTransport, MonotonicClock, RtmpClient, TcpTransport,
};
use std::sync::Arc;
use tokio::net::TcpListener;

async fn run_memory_session(
    script: ServerScript,
    send_chunk_size: u32,
) -> (rtmp::Result<ClientState>, Option<u32>, ServerLog, Recorded) {
    let (client_end, server_end) = MemoryTransport::pair();
    let server = tokio::spawn(serve(server_end, script));

    let (handler, recorded) = RecordingHandler::new();
    let mut client = RtmpClient::new(
        client_end,
        live_test(1935),
        fast_config(send_chunk_size),
        Arc::new(MonotonicClock::new()),
    )
    .with_handler(Box::new(handler));

    let result = client.run().await;
    let stream_id = client.stream_id();
    drop(client);

    let log = server.await.unwrap();
    let recorded = Arc::try_unwrap(recorded).unwrap().into_inner().unwrap();
    (result, stream_id, log, recorded)
}

#[tokio::test]
async fn test_full_play_session() {
    let (result, stream_id, log, recorded) =
        run_memory_session(ServerScript::default(), 128).await;

    assert_eq!(result.unwrap(), ClientState::Playing);
    assert_eq!(stream_id, Some(1));

    assert_eq!(recorded.video, vec![300, 300, 300]);
    assert_eq!(recorded.video_timestamps, vec![0, 40, 80]);
    assert_eq!(recorded.audio, vec![10, 10, 10]);
    assert_eq!(recorded.script_data, 1);
    assert_eq!(recorded.commands, vec!["_result", "_result", "onStatus"]);

    assert_eq!(log.command_names(), vec!["connect", "createStream", "play"]);
}

#[tokio::test]
async fn test_handshake_wire_layout() {
    let (result, _, log, _) = run_memory_session(ServerScript::default(), 128).await;
    assert!(result.is_ok());

    assert_eq!(log.c0, Some(3));
    assert_eq!(&log.c1[0..8], &[0u8; 8]);

    let s1 = s1_packet();
    assert_eq!(&log.c2[0..4], &S1_EPOCH.to_be_bytes());
    assert_eq!(&log.c2[8..], &s1[8..]);
}

#[tokio::test]
async fn test_commands_on_csid_3_and_control_on_csid_2() {
    let (_, _, log, _) = run_memory_session(ServerScript::default(), 4096).await;

    let commands = log.commands();
    assert_eq!(commands.len(), 3);
    assert!(commands.iter().all(|(csid, _)| *csid == 3));

    // Chunk size announcement comes first, then window ack
    let control: Vec<_> = log
        .messages
        .iter()
        .filter(|(_, m)| matches!(m.message_type_id, 1 | 5 | 6))
        .collect();
    assert_eq!(control.len(), 2);
    assert!(control.iter().all(|(csid, m)| *csid == 2 && m.message_stream_id == 0));
    assert_eq!(control[0].1.message_type_id, 1);
    assert_eq!(control[0].1.payload, 4096u32.to_be_bytes().to_vec());
    assert_eq!(control[1].1.message_type_id, 5);
    assert_eq!(control[1].1.payload, 6_000_000u32.to_be_bytes().to_vec());

    assert_eq!(log.messages[0].0, 2);
    assert_eq!(log.messages[0].1.message_type_id, 1);
}

#[tokio::test]
async fn test_command_payloads() {
    let (_, _, log, _) = run_memory_session(ServerScript::default(), 128).await;
    let commands = log.commands();

    let connect = &commands[0].1;
    assert_eq!(connect[0], Amf0Value::String("connect".into()));
    assert_eq!(connect[1], Amf0Value::Number(1.0));
    let object = &connect[2];
    assert_eq!(object.get_property("app").and_then(|v| v.as_string()), Some("live"));
    assert_eq!(
        object.get_property("tcUrl").and_then(|v| v.as_string()),
        Some("rtmp://127.0.0.1:1935/live")
    );
    assert_eq!(object.get_property("flashVer").and_then(|v| v.as_string()), Some("FMSc/1.0"));
    assert_eq!(object.get_property("videoFunction").and_then(|v| v.as_number()), Some(1.0));

    assert_eq!(
        commands[1].1,
        vec![
            Amf0Value::String("createStream".into()),
            Amf0Value::Number(2.0),
            Amf0Value::Null,
        ]
    );
    assert_eq!(
        commands[2].1,
        vec![
            Amf0Value::String("play".into()),
            Amf0Value::Number(3.0),
            Amf0Value::Null,
            Amf0Value::String("test".into()),
            Amf0Value::Number(-2000.0),
        ]
    );
}

#[tokio::test]
async fn test_server_chunk_size_change() {
    let script = ServerScript {
        chunk_size: 4096,
        video_size: 5000,
        ..ServerScript::default()
    };
    let (result, _, _, recorded) = run_memory_session(script, 128).await;

    assert_eq!(result.unwrap(), ClientState::Playing);
    assert_eq!(recorded.video, vec![5000, 5000, 5000]);
}

#[tokio::test]
async fn test_s2_echo_mismatch_fails_handshake() {
    let script = ServerScript {
        corrupt_s2: Some(1000),
        ..ServerScript::default()
    };
    let (result, stream_id, log, recorded) = run_memory_session(script, 128).await;

    let err = result.unwrap_err();
    assert!(matches!(err, Error::HandshakeMismatch(_)));
    assert_eq!(stream_id, None);
    assert!(!log.handshake_done);
    assert!(log.messages.is_empty());
    assert!(recorded.commands.is_empty());
}

#[tokio::test]
async fn test_s2_time_mismatch_is_tolerated() {
    let script = ServerScript {
        corrupt_s2: Some(2),
        ..ServerScript::default()
    };
    let (result, _, log, _) = run_memory_session(script, 128).await;

    assert_eq!(result.unwrap(), ClientState::Playing);
    assert!(log.handshake_done);
}

#[tokio::test]
async fn test_play_session_over_tcp() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let server = tokio::spawn(async move {
        let (socket, _) = listener.accept().await.unwrap();
        serve(TcpTransport::from_stream(socket).unwrap(), ServerScript::default()).await
    });

    let (handler, recorded) = RecordingHandler::new();
    let mut client = RtmpClient::connect_tcp(live_test(port), fast_config(128))
        .await
        .unwrap()
        .with_handler(Box::new(handler));

    let state = client.run().await.unwrap();
    assert_eq!(state, ClientState::Playing);
    assert_eq!(client.stream_id(), Some(1));
    client.close();
    drop(client);

    let log = server.await.unwrap();
    assert_eq!(log.command_names(), vec!["connect", "createStream", "play"]);

    let recorded = recorded.lock().unwrap();
    assert_eq!(recorded.video, vec![300, 300, 300]);
    assert_eq!(recorded.script_data, 1);
}

#[tokio::test]
async fn test_connect_refused_is_network_error() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let result = RtmpClient::connect_tcp(live_test(port), fast_config(128)).await;
    assert!(matches!(result, Err(Error::Network(_))));
}
