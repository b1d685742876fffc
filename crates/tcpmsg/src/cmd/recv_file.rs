use tcpmsg_peer::Connection;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpListener;
use tracing::info;

use crate::cmd::RecvFileArgs;
use crate::exit::{io_error, peer_error, CliError, CliResult, FAILURE, SUCCESS};

/// Wait for one sender, read its notice message, then receive the
/// length-prefixed raw stream into the output file.
pub async fn run(args: RecvFileArgs) -> CliResult<i32> {
    let listener = TcpListener::bind(&args.addr)
        .await
        .map_err(|err| io_error("bind failed", err))?;

    let (stream, _) = listener
        .accept()
        .await
        .map_err(|err| io_error("accept failed", err))?;
    let connection =
        Connection::new(stream).map_err(|err| peer_error("connection setup failed", err))?;

    let notice = connection
        .read_message()
        .await
        .map_err(|err| peer_error("receive failed", err))?
        .ok_or_else(|| CliError::new(FAILURE, "sender disconnected before the notice"))?;
    info!(
        action = notice.action().unwrap_or("<none>"),
        name = notice.body_utf8().unwrap_or(""),
        "incoming transfer"
    );

    let mut file = tokio::fs::File::create(&args.output)
        .await
        .map_err(|err| io_error(&format!("failed creating {}", args.output.display()), err))?;

    let received = connection
        .receive_stream(&mut file, None, args.chunk_size)
        .await
        .map_err(|err| peer_error("stream receive failed", err))?;
    file.flush()
        .await
        .map_err(|err| io_error("flush failed", err))?;

    info!(bytes = received, output = %args.output.display(), "file received");
    Ok(SUCCESS)
}
