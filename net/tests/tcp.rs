use net::{Exception, Frame, Server, ServerBuilder};

use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;
use tokio_modbus::prelude::*;

async fn start(builder: ServerBuilder) -> (Server, SocketAddr) {
    let server = builder.build();
    let addr = server.listen_tcp("127.0.0.1:0").await.unwrap();
    (server, addr)
}

/// Send a raw packet and read back one MBAP framed response
async fn exchange(stream: &mut TcpStream, request: &[u8]) -> Vec<u8> {
    stream.write_all(request).await.unwrap();
    let mut response = vec![0u8; 6];
    stream.read_exact(&mut response).await.unwrap();
    let length = u16::from_be_bytes([response[4], response[5]]) as usize;
    let mut body = vec![0u8; length];
    stream.read_exact(&mut body).await.unwrap();
    response.extend(body);
    response
}

#[tokio::test]
async fn it_registered_function_payload() {
    let (server, addr) = start(ServerBuilder::new().function(0x41, |_, frame| {
        let mut payload = vec![0xCA, 0xFE];
        payload.extend_from_slice(frame.data());
        Ok(payload)
    }))
    .await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let response = exchange(&mut stream, &[0x00, 0x07, 0x00, 0x00, 0x00, 0x03, 0x11, 0x41, 0x01]).await;
    assert_eq!(
        response,
        vec![0x00, 0x07, 0x00, 0x00, 0x00, 0x05, 0x11, 0x41, 0xCA, 0xFE, 0x01]
    );

    server.shutdown().await;
}

#[tokio::test]
async fn it_unregistered_function() {
    let (server, addr) = start(ServerBuilder::new()).await;

    let mut stream = TcpStream::connect(addr).await.unwrap();
    let response = exchange(&mut stream, &[0x00, 0x08, 0x00, 0x00, 0x00, 0x02, 0x01, 0x42]).await;
    assert_eq!(response, vec![0x00, 0x08, 0x00, 0x00, 0x00, 0x03, 0x01, 0xC2, 0x01]);

    // The connection survives an exception response
    let response = exchange(
        &mut stream,
        &[0x00, 0x09, 0x00, 0x00, 0x00, 0x06, 0x01, 0x03, 0x00, 0x00, 0x00, 0x01],
    )
    .await;
    assert_eq!(
        response,
        vec![0x00, 0x09, 0x00, 0x00, 0x00, 0x05, 0x01, 0x03, 0x02, 0x00, 0x00]
    );

    server.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn it_concurrent_writes_are_serialized() {
    let (server, addr) = start(ServerBuilder::new()).await;

    let mut tasks = Vec::new();
    for i in 1..=16u16 {
        tasks.push(tokio::spawn(async move {
            let mut ctx = tcp::connect(addr).await.unwrap();
            for _ in 0..10 {
                ctx.write_single_register(10, i).await.unwrap().unwrap();
                ctx.write_multiple_registers(20, &[i, i, i, i])
                    .await
                    .unwrap()
                    .unwrap();
                let words = ctx.read_holding_registers(20, 4).await.unwrap().unwrap();
                // Another requester may have won, but a block is always written as a whole
                assert!(words.iter().all(|w| *w == words[0]));
            }
        }));
    }
    for task in tasks {
        task.await.unwrap();
    }

    let (single, block) = server
        .with_memory(|memory| {
            let registers = memory.holding_registers();
            let block: Vec<u16> = (20..24).map(|a| registers.get(a).unwrap()).collect();
            (registers.get(10).unwrap(), block)
        })
        .await
        .unwrap();
    assert!((1..=16).contains(&single));
    assert!((1..=16).contains(&block[0]));
    assert!(block.iter().all(|w| *w == block[0]));

    server.shutdown().await;
}

#[tokio::test]
async fn it_malformed_frame_closes_only_its_connection() {
    let closed = Arc::new(AtomicUsize::new(0));
    let (server, addr) = start(ServerBuilder::new().on_connection_closed({
        let closed = closed.clone();
        move |_| {
            closed.fetch_add(1, Ordering::SeqCst);
        }
    }))
    .await;

    let mut healthy = tcp::connect(addr).await.unwrap();
    healthy.write_single_register(3, 0xBEEF).await.unwrap().unwrap();

    let mut broken = TcpStream::connect(addr).await.unwrap();
    // Declared length does not match the payload
    broken
        .write_all(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x09, 0x01, 0x03, 0x00])
        .await
        .unwrap();
    let mut received = Vec::new();
    let size = tokio::time::timeout(Duration::from_secs(5), broken.read_to_end(&mut received))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(size, 0);
    assert!(received.is_empty());
    assert_eq!(closed.load(Ordering::SeqCst), 1);

    let words = healthy.read_holding_registers(3, 1).await.unwrap().unwrap();
    assert_eq!(words, vec![0xBEEF]);

    server.shutdown().await;
}

#[tokio::test]
async fn it_override_affects_only_its_code() {
    let (server, addr) = start(
        ServerBuilder::new().function(0x03, |_, _| Err(Exception::IllegalDataValue)),
    )
    .await;

    let mut ctx = tcp::connect(addr).await.unwrap();
    assert_eq!(
        ctx.read_holding_registers(0, 1).await.unwrap(),
        Err(ExceptionCode::IllegalDataValue)
    );
    assert_eq!(ctx.read_input_registers(0, 2).await.unwrap(), Ok(vec![0, 0]));

    // Runtime changes apply to later requests
    server.unregister_function(0x04).unwrap();
    assert_eq!(
        ctx.read_input_registers(0, 2).await.unwrap(),
        Err(ExceptionCode::IllegalFunction)
    );
    server
        .register_function(0x04, |_, _| Ok(vec![0x02, 0x12, 0x34]))
        .unwrap();
    assert_eq!(ctx.read_input_registers(0, 1).await.unwrap(), Ok(vec![0x1234]));

    server.shutdown().await;
}

#[tokio::test]
async fn it_write_then_read() {
    let (server, addr) = start(ServerBuilder::new()).await;

    let mut ctx = tcp::connect(addr).await.unwrap();
    ctx.write_single_register(10, 0x1234).await.unwrap().unwrap();
    assert_eq!(
        ctx.read_holding_registers(10, 1).await.unwrap(),
        Ok(vec![0x1234])
    );

    ctx.write_multiple_coils(5, &[true, false, true]).await.unwrap().unwrap();
    assert_eq!(
        ctx.read_coils(4, 5).await.unwrap(),
        Ok(vec![false, true, false, true, false])
    );
    assert_eq!(
        ctx.read_holding_registers(65535, 2).await.unwrap(),
        Err(ExceptionCode::IllegalDataAddress)
    );

    server.shutdown().await;
}

#[tokio::test]
async fn it_preset_memory() {
    let mut memory = net::Memory::default();
    memory.input_registers_mut().set(100, 0xABCD).unwrap();
    memory.discrete_inputs_mut().set(7, true).unwrap();
    let (server, addr) = start(ServerBuilder::new().memory(memory)).await;

    let mut ctx = tcp::connect(addr).await.unwrap();
    assert_eq!(
        ctx.read_input_registers(100, 1).await.unwrap(),
        Ok(vec![0xABCD])
    );
    assert_eq!(
        ctx.read_discrete_inputs(6, 2).await.unwrap(),
        Ok(vec![false, true])
    );

    server.shutdown().await;
}

#[tokio::test]
async fn it_hooks_fire_in_lifecycle_order() {
    let events = Arc::new(std::sync::Mutex::new(Vec::new()));
    let push = |name: &'static str| {
        let events = events.clone();
        move || events.lock().unwrap().push(name)
    };
    let (started, accepted, received, sent, stopped) = (
        push("started"),
        push("accepted"),
        push("received"),
        push("sent"),
        push("stopped"),
    );
    let builder = ServerBuilder::new()
        .on_server_started(move |_| started())
        .on_connection_accepted(move |_| accepted())
        .on_request_received(move |_, _| received())
        .on_response_sent(move |_, frame| {
            assert_eq!(frame.function(), 0x06);
            sent()
        })
        .on_server_stopped(move |_| stopped());
    let (server, addr) = start(builder).await;

    let mut ctx = tcp::connect(addr).await.unwrap();
    ctx.write_single_register(1, 1).await.unwrap().unwrap();
    server.shutdown().await;

    assert_eq!(
        *events.lock().unwrap(),
        vec!["started", "accepted", "received", "sent", "stopped"]
    );
}

#[tokio::test]
async fn it_shutdown_closes_listeners() {
    let stopped = Arc::new(AtomicUsize::new(0));
    let server = ServerBuilder::new()
        .on_server_stopped({
            let stopped = stopped.clone();
            move |_| {
                stopped.fetch_add(1, Ordering::SeqCst);
            }
        })
        .build();
    let first = server.listen_tcp("127.0.0.1:0").await.unwrap();
    let second = server.listen_tcp("127.0.0.1:0").await.unwrap();

    // Binding an address in use fails without affecting the running listeners
    assert!(matches!(
        server.listen_tcp(first).await,
        Err(net::Error::Bind { .. })
    ));
    assert!(TcpStream::connect(second).await.is_ok());

    server.shutdown().await;

    assert_eq!(stopped.load(Ordering::SeqCst), 2);
    assert!(TcpStream::connect(first).await.is_err());
    assert!(TcpStream::connect(second).await.is_err());
}
