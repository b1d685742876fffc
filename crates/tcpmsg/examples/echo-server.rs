//! Minimal echo server — replies to `echo <body>` with the same body.
//!
//! Run with:
//!   cargo run --example echo-server --features peer
//!
//! In another terminal:
//!   cargo run --features cli -- send 127.0.0.1:7070 \
//!     --action echo --data "hello" --wait

use std::sync::Arc;

use tcpmsg::peer::{Handler, Message, Origin, RegistryBuilder, Server};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let registry = Arc::new(
        RegistryBuilder::new()
            .register(
                "echo",
                Handler::with_origin_async(|origin: Origin, message: Message| async move {
                    origin.send("echo", &message.body()).await?;
                    Ok(())
                }),
            )?
            .register("ping", Handler::unit(|| Ok(())))?
            .build(),
    );

    let server = Server::bind("127.0.0.1:7070").await?;
    eprintln!("Listening on {}", server.local_addr()?);

    server.serve(registry).await?;
    Ok(())
}
