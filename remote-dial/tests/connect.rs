use std::{
    cell::Cell,
    io::{self, ErrorKind},
};

use remote_dial::{Config, Connector, Kind, Signal, Signals, Target};
use rstest::rstest;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

const LOCALHOST: &str = "127.0.0.1";

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn connector() -> Connector<remote_dial::Tcp> {
    Connector::from_config(serde_json::from_str(r#"{ "default_host": "127.0.0.1" }"#).unwrap())
}

/// A port nothing listens on anymore.
async fn refused_port() -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Accepts forever, greeting each peer with `greeting`.
async fn greeter(greeting: u32) -> u16 {
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();
    tokio::spawn(async move {
        while let Ok((mut peer, _)) = listener.accept().await {
            let _ = peer.write_u32(greeting).await;
        }
    });
    port
}

#[tokio::test]
async fn refused_port_fails() {
    init_tracing();
    let port = refused_port().await;
    let calls = Cell::new(0);
    connector()
        .connect_with(port, async |_: &mut TcpStream| (), |outcome| {
            calls.set(calls.get() + 1);
            let failure = outcome.unwrap_err();
            assert_eq!(failure.kind(), ErrorKind::ConnectionRefused);
            assert_eq!(failure.endpoint().port(), port);
        })
        .await;
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn immediate_handshake_succeeds() {
    init_tracing();
    let port = greeter(0).await;
    let calls = Cell::new(0);
    connector()
        .connect_with(port, async |_: &mut TcpStream| 42, |outcome| {
            calls.set(calls.get() + 1);
            assert_eq!(outcome.unwrap().into_session(), 42);
        })
        .await;
    assert_eq!(calls.get(), 1);
}

#[tokio::test]
async fn handshake_reads_from_the_stream() {
    init_tracing();
    let port = greeter(7).await;
    let handle = remote_dial::connect((LOCALHOST, port), async |stream: &mut TcpStream| {
        stream.read_u32().await
    })
    .await
    .unwrap();
    assert_eq!(handle.session().as_ref().unwrap(), &7);
    assert_eq!(handle.stream().peer_addr().unwrap().port(), port);
}

#[rstest]
#[case::port_only(false)]
#[case::host_and_port(true)]
#[tokio::test]
async fn both_target_forms_behave_alike(#[case] with_host: bool) {
    init_tracing();
    let target = |port| if with_host { Target::new(LOCALHOST, port) } else { Target::local(port) };

    let port = greeter(3).await;
    let handle = connector()
        .connect(target(port), async |stream: &mut TcpStream| stream.read_u32().await)
        .await
        .unwrap();
    assert_eq!(handle.into_session().unwrap(), 3);

    let port = refused_port().await;
    let failure = connector()
        .connect(target(port), async |_: &mut TcpStream| ())
        .await
        .unwrap_err();
    assert_eq!(failure.kind(), ErrorKind::ConnectionRefused);
    assert_eq!(failure.endpoint().to_string(), format!("{LOCALHOST}:{port}"));
}

#[tokio::test]
async fn no_error_listener_left_after_success() {
    init_tracing();
    let port = greeter(0).await;
    let signals = Signals::new();
    let handle = connector()
        .connect_on(port, async |_: &mut TcpStream| (), &signals)
        .await
        .unwrap();

    assert_eq!(signals.listener_count(Kind::Error), 0);
    assert_eq!(signals.emit(Signal::error(io::Error::from(ErrorKind::ConnectionReset))), 0);
    drop(handle);
}

#[tokio::test]
async fn caller_can_abort_a_stuck_handshake() {
    init_tracing();
    // accepts, but never says anything
    let listener = TcpListener::bind((LOCALHOST, 0)).await.unwrap();
    let port = listener.local_addr().unwrap().port();

    let signals = Signals::new();
    let aborter = signals.clone();
    let attempt = async {
        connector()
            .connect_on(port, async |stream: &mut TcpStream| stream.read_u32().await, &signals)
            .await
    };
    let abort = async {
        let _peer = listener.accept().await.unwrap();
        tokio::task::yield_now().await;
        aborter.emit(Signal::error(io::Error::from(ErrorKind::TimedOut)));
        std::future::pending::<()>().await
    };

    let outcome = tokio::select! {
        outcome = attempt => outcome,
        _ = abort => unreachable!(),
    };
    assert_eq!(outcome.unwrap_err().kind(), ErrorKind::TimedOut);
}

#[rstest]
#[case::on(true)]
#[case::off(false)]
#[tokio::test]
async fn nodelay_reaches_the_stream(#[case] nodelay: bool) {
    init_tracing();
    let port = greeter(0).await;
    let config: Config = serde_json::from_str(&format!(
        r#"{{ "default_host": "{LOCALHOST}", "nodelay": {nodelay} }}"#
    ))
    .unwrap();
    let handle = Connector::from_config(config)
        .connect(port, async |_: &mut TcpStream| ())
        .await
        .unwrap();
    assert_eq!(handle.stream().nodelay().unwrap(), nodelay);
}

#[test]
fn config_defaults() {
    let config: Config = serde_json::from_str("{}").unwrap();
    assert_eq!(config, Config::default());
    assert_eq!(config.default_host, remote_dial::DEFAULT_HOST);
    assert!(!config.nodelay);

    let config: Config = serde_json::from_str(r#"{ "nodelay": true }"#).unwrap();
    assert!(config.nodelay);
    assert_eq!(*Connector::from_config(config).transport(), remote_dial::Tcp::new().nodelay(true));
}
