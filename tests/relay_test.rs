//! End-to-end relay scenarios
//!
//! Drives the forwarding engine against real sockets and FIFOs, with
//! in-memory duplex streams standing in for the terminal.

use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;
use tokio::time::timeout;

use procom::endpoint::{Connection, EndpointSet, SocketRole};
use procom::relay::{
    Coordinator, Pump, PumpDirection, PumpOutcome, RoutePlan, SessionConfig, SessionStatus,
    SocketConfig, Topology,
};

const WAIT: Duration = Duration::from_secs(5);

/// Spawn a pump wired to the coordinator the way a session wires it
fn spawn_pump(
    coordinator: &Arc<Coordinator>,
    direction: PumpDirection,
    route: procom::relay::Route,
    reader: Box<dyn tokio::io::AsyncRead + Send + Unpin>,
    writer: Box<dyn tokio::io::AsyncWrite + Send + Unpin>,
) -> JoinHandle<PumpOutcome> {
    let pump = Pump::new(direction, route, reader, writer, coordinator.token(direction));
    let coordinator = coordinator.clone();
    coordinator.start(direction);
    tokio::spawn(async move {
        let outcome = pump.run().await;
        coordinator.finish(direction, outcome);
        outcome
    })
}

/// Client session with only a socket configured: terminal lines reach the
/// peer, peer lines come back, and closing the peer cancels the inbound
/// pump even while it is blocked on a silent terminal.
#[tokio::test]
async fn test_socket_session_end_to_end() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let plan = RoutePlan::resolve(Topology {
        fifo_in: false,
        fifo_out: false,
        socket: true,
    });
    let outbound_route = plan.outbound.expect("socket topology needs an outbound pump");

    let mut connection = Connection::establish("127.0.0.1", port).await.unwrap();
    assert_eq!(connection.role(), SocketRole::Client);
    let (mut peer, _) = listener.accept().await.unwrap();

    // Terminal stand-ins: one duplex pair per direction
    let (mut terminal_in, stdin_stream) = tokio::io::duplex(4096);
    let (stdout_stream, mut terminal_out) = tokio::io::duplex(4096);

    let coordinator = Arc::new(Coordinator::new());
    let inbound = spawn_pump(
        &coordinator,
        PumpDirection::Inbound,
        plan.inbound,
        Box::new(stdin_stream),
        Box::new(connection.take_writer().unwrap()),
    );
    let outbound = spawn_pump(
        &coordinator,
        PumpDirection::Outbound,
        outbound_route,
        Box::new(connection.take_reader().unwrap()),
        Box::new(stdout_stream),
    );

    // Typed line reaches the peer exactly
    terminal_in.write_all(b"hello\n").await.unwrap();
    let mut buf = [0u8; 6];
    timeout(WAIT, peer.read_exact(&mut buf)).await.unwrap().unwrap();
    assert_eq!(&buf, b"hello\n");

    // Peer line is echoed to the terminal
    peer.write_all(b"world\n").await.unwrap();
    let mut buf = [0u8; 6];
    timeout(WAIT, terminal_out.read_exact(&mut buf)).await.unwrap().unwrap();
    assert_eq!(&buf, b"world\n");

    // Closing the peer ends the outbound pump with EOF and cancels the
    // inbound pump, which is still blocked reading the silent terminal
    drop(peer);

    let outbound_outcome = timeout(WAIT, outbound).await.unwrap().unwrap();
    assert_eq!(outbound_outcome, PumpOutcome::Eof);

    let inbound_outcome = timeout(Duration::from_secs(1), inbound)
        .await
        .expect("inbound pump must unblock within bounded time")
        .unwrap();
    assert_eq!(inbound_outcome, PumpOutcome::Cancelled);

    assert_eq!(coordinator.status(), SessionStatus::Clean);
}

/// Lines are forwarded in order and undivided; an over-capacity line is
/// truncated to 1024 bytes and never split into two forwarded lines.
#[tokio::test]
async fn test_ordering_and_truncation_across_a_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let plan = RoutePlan::resolve(Topology {
        fifo_in: false,
        fifo_out: false,
        socket: true,
    });

    let mut connection = Connection::establish("127.0.0.1", port).await.unwrap();
    let (mut peer, _) = listener.accept().await.unwrap();

    let (mut terminal_in, stdin_stream) = tokio::io::duplex(8192);

    let coordinator = Arc::new(Coordinator::new());
    let inbound = spawn_pump(
        &coordinator,
        PumpDirection::Inbound,
        plan.inbound,
        Box::new(stdin_stream),
        Box::new(connection.take_writer().unwrap()),
    );

    let mut long = vec![b'x'; 2000];
    long.push(b'\n');
    terminal_in.write_all(b"L1\nL2\nL3\n").await.unwrap();
    terminal_in.write_all(&long).await.unwrap();
    terminal_in.write_all(b"L4\n").await.unwrap();
    drop(terminal_in);

    let outcome = timeout(WAIT, inbound).await.unwrap().unwrap();
    assert_eq!(outcome, PumpOutcome::Eof);

    let mut received = Vec::new();
    timeout(WAIT, peer.read_to_end(&mut received)).await.unwrap().unwrap();

    let mut expected = b"L1\nL2\nL3\n".to_vec();
    expected.extend_from_slice(&vec![b'x'; 1024]);
    expected.extend_from_slice(b"L4\n");
    assert_eq!(received, expected);
}

/// Session with only the stdin FIFO configured: terminal input is moved
/// into the FIFO, no outbound pump exists, and the session ends when the
/// terminal reaches end of input.
#[tokio::test]
async fn test_stdin_fifo_feed_session() {
    let dir = tempfile::tempdir().unwrap();
    let fifo_path = dir.path().join("feed");
    nix::unistd::mkfifo(&fifo_path, nix::sys::stat::Mode::S_IRWXU).unwrap();

    let config = SessionConfig {
        fifo_in: Some(fifo_path.clone()),
        fifo_out: None,
        socket: None,
        reverse_fifo_open: false,
    };
    let plan = RoutePlan::resolve(config.topology());
    assert!(plan.outbound.is_none(), "feed sessions run a single pump");

    let opener = tokio::spawn({
        let config = config.clone();
        async move { EndpointSet::open(&config, &RoutePlan::resolve(config.topology())).await }
    });

    // The peer process reads from the FIFO
    let mut peer_opts = tokio::fs::OpenOptions::new();
    let peer = peer_opts.read(true).open(&fifo_path);
    let mut peer = timeout(WAIT, peer).await.unwrap().unwrap();

    let mut endpoints = timeout(WAIT, opener).await.unwrap().unwrap().unwrap();

    let (mut terminal_in, stdin_stream) = tokio::io::duplex(4096);
    let coordinator = Arc::new(Coordinator::new());
    let inbound = spawn_pump(
        &coordinator,
        PumpDirection::Inbound,
        plan.inbound,
        Box::new(stdin_stream),
        Box::new(endpoints.take_fifo_in().unwrap()),
    );

    terminal_in.write_all(b"into the pipe\n").await.unwrap();
    let mut buf = [0u8; 14];
    timeout(WAIT, peer.read_exact(&mut buf)).await.unwrap().unwrap();
    assert_eq!(&buf, b"into the pipe\n");

    // Terminal end of input winds the session down
    drop(terminal_in);
    let outcome = timeout(WAIT, inbound).await.unwrap().unwrap();
    assert_eq!(outcome, PumpOutcome::Eof);
    assert_eq!(coordinator.status(), SessionStatus::Clean);

    endpoints.teardown().await;

    // With the write end closed, the peer sees EOF
    let mut rest = Vec::new();
    let n = timeout(WAIT, peer.read_to_end(&mut rest)).await.unwrap().unwrap();
    assert_eq!(n, 0);
}

/// Endpoint-open failure after the socket is up closes the socket too:
/// nothing leaks out of a failed startup sequence.
#[tokio::test]
async fn test_failed_fifo_open_closes_the_socket() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let port = listener.local_addr().unwrap().port();
    let dir = tempfile::tempdir().unwrap();

    let config = SessionConfig {
        fifo_in: Some(dir.path().join("missing")),
        fifo_out: None,
        socket: Some(SocketConfig {
            address: "127.0.0.1".to_string(),
            port,
        }),
        reverse_fifo_open: false,
    };
    let plan = RoutePlan::resolve(config.topology());

    let result = EndpointSet::open(&config, &plan).await;
    assert!(result.is_err(), "missing FIFO must fail the open sequence");

    // The already-accepted socket was closed during rollback
    let (mut peer, _) = timeout(WAIT, listener.accept()).await.unwrap().unwrap();
    let mut buf = Vec::new();
    let n = timeout(WAIT, peer.read_to_end(&mut buf)).await.unwrap().unwrap();
    assert_eq!(n, 0, "socket must be shut down after rollback");
}
