use tcpmsg_peer::Client;
use tracing::info;

use crate::cmd::SendFileArgs;
use crate::exit::{io_error, peer_error, CliError, CliResult, SUCCESS, USAGE};

/// Announce the transfer with an envelope message, then push the file bytes
/// as a length-prefixed raw stream.
pub async fn run(args: SendFileArgs) -> CliResult<i32> {
    let metadata = tokio::fs::metadata(&args.file)
        .await
        .map_err(|err| io_error(&format!("failed reading {}", args.file.display()), err))?;
    if !metadata.is_file() {
        return Err(CliError::new(
            USAGE,
            format!("{} is not a regular file", args.file.display()),
        ));
    }
    let size = metadata.len();

    let file_name = args
        .file
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();

    let client = Client::connect(&args.addr)
        .await
        .map_err(|err| peer_error("connect failed", err))?;

    client
        .send(&args.action, file_name.as_bytes())
        .await
        .map_err(|err| peer_error("send failed", err))?;

    let mut file = tokio::fs::File::open(&args.file)
        .await
        .map_err(|err| io_error(&format!("failed opening {}", args.file.display()), err))?;

    let sent = client
        .send_stream(&mut file, Some(size), args.chunk_size)
        .await
        .map_err(|err| peer_error("stream send failed", err))?;

    info!(bytes = sent, file = %args.file.display(), "file sent");
    Ok(SUCCESS)
}
