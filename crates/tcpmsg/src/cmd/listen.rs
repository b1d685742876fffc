use tcpmsg_peer::{Connection, PeerError};
use tokio::net::TcpListener;

use crate::cmd::ListenArgs;
use crate::exit::{io_error, peer_error, CliResult, SUCCESS};
use crate::output::{print_message, OutputFormat};

/// Accept one connection at a time and print every message it delivers.
pub async fn run(args: ListenArgs, format: OutputFormat) -> CliResult<i32> {
    let listener = TcpListener::bind(&args.addr)
        .await
        .map_err(|err| io_error("bind failed", err))?;

    let mut printed = 0usize;

    loop {
        let (stream, _) = tokio::select! {
            res = listener.accept() => res.map_err(|err| io_error("accept failed", err))?,
            _ = tokio::signal::ctrl_c() => return Ok(SUCCESS),
        };

        let connection =
            Connection::new(stream).map_err(|err| peer_error("connection setup failed", err))?;

        loop {
            let message = tokio::select! {
                res = connection.read_message() => match res {
                    Ok(Some(message)) => message,
                    Ok(None) => break,
                    Err(PeerError::Disconnected(_)) => break,
                    Err(err) => return Err(peer_error("receive failed", err)),
                },
                _ = tokio::signal::ctrl_c() => return Ok(SUCCESS),
            };

            print_message(&message, format);
            printed = printed.saturating_add(1);

            if let Some(count) = args.count {
                if printed >= count {
                    return Ok(SUCCESS);
                }
            }
        }
    }
}
