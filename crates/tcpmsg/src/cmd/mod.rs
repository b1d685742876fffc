use std::path::PathBuf;

use clap::{Args, Subcommand};

use crate::exit::CliResult;
use crate::output::OutputFormat;

pub mod listen;
pub mod recv_file;
pub mod send;
pub mod send_file;
pub mod version;

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Listen and print received messages.
    Listen(ListenArgs),
    /// Send a single action message.
    Send(SendArgs),
    /// Send a file as a raw byte stream.
    SendFile(SendFileArgs),
    /// Receive one raw byte stream into a file.
    RecvFile(RecvFileArgs),
    /// Show version information.
    Version(VersionArgs),
}

pub async fn run(command: Command, format: OutputFormat) -> CliResult<i32> {
    match command {
        Command::Listen(args) => listen::run(args, format).await,
        Command::Send(args) => send::run(args, format).await,
        Command::SendFile(args) => send_file::run(args).await,
        Command::RecvFile(args) => recv_file::run(args).await,
        Command::Version(args) => version::run(args),
    }
}

#[derive(Args, Debug)]
pub struct ListenArgs {
    /// Address to bind, e.g. 127.0.0.1:7070.
    pub addr: String,
    /// Exit after receiving N messages.
    #[arg(long)]
    pub count: Option<usize>,
}

#[derive(Args, Debug)]
pub struct SendArgs {
    /// Address to connect to, e.g. 127.0.0.1:7070.
    pub addr: String,
    /// Action identifier for the message.
    #[arg(long, short = 'a', default_value = "message")]
    pub action: String,
    /// JSON body.
    #[arg(long, conflicts_with_all = ["data", "file"])]
    pub json: Option<String>,
    /// Raw string body.
    #[arg(long, conflicts_with_all = ["json", "file"])]
    pub data: Option<String>,
    /// Read body from file.
    #[arg(long, conflicts_with_all = ["json", "data"])]
    pub file: Option<PathBuf>,
    /// Wait for one response message and print it.
    #[arg(long)]
    pub wait: bool,
    /// Maximum time to wait for response when --wait is set (e.g. 5s, 500ms).
    #[arg(long, default_value = "5s")]
    pub wait_timeout: String,
}

#[derive(Args, Debug)]
pub struct SendFileArgs {
    /// Address to connect to.
    pub addr: String,
    /// File to send.
    pub file: PathBuf,
    /// Action identifier for the notice message preceding the stream.
    #[arg(long, default_value = "file")]
    pub action: String,
    /// Chunk size for the raw stream copy.
    #[arg(long, default_value_t = tcpmsg_frame::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct RecvFileArgs {
    /// Address to bind while waiting for the sender.
    pub addr: String,
    /// Path to write the received bytes to.
    pub output: PathBuf,
    /// Chunk size for the raw stream copy.
    #[arg(long, default_value_t = tcpmsg_frame::DEFAULT_CHUNK_SIZE)]
    pub chunk_size: usize,
}

#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Show extended build information.
    #[arg(long)]
    pub extended: bool,
}
