// Dials a local listener and reads the protocol version it announces.
use remote_dial::Connector;
use tokio::{
    io::{AsyncReadExt, AsyncWriteExt},
    net::{TcpListener, TcpStream},
};

const VERSION: u32 = 1;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let port = listener.local_addr()?.port();
    tokio::spawn(async move {
        while let Ok((mut peer, addr)) = listener.accept().await {
            println!("[server] Hello, {addr}");
            let _ = peer.write_u32(VERSION).await;
        }
    });

    let connector = Connector::new().default_host("127.0.0.1");
    let handle = connector
        .connect(port, async |stream: &mut TcpStream| stream.read_u32().await)
        .await?;
    let (stream, version) = handle.into_parts();
    println!("[client] {} speaks version {}", stream.peer_addr()?, version?);

    // nothing listens on port 1
    if let Err(failure) = connector.connect(1, async |_: &mut TcpStream| ()).await {
        println!("[client] {failure}");
    }
    Ok(())
}
