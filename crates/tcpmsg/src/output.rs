use std::io::{IsTerminal, Write};
use std::time::{SystemTime, UNIX_EPOCH};

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;
use tcpmsg_peer::Message;

#[derive(Clone, Debug, Copy, ValueEnum)]
pub enum OutputFormat {
    Json,
    Table,
    Pretty,
    Raw,
}

impl OutputFormat {
    pub fn default_for_stdout() -> Self {
        if std::io::stdout().is_terminal() {
            Self::Table
        } else {
            Self::Json
        }
    }
}

#[derive(Serialize)]
struct MessageOutput<'a> {
    action: Option<&'a str>,
    body_size: usize,
    body: String,
    peer: String,
    timestamp: String,
}

pub fn print_message(message: &Message, format: OutputFormat) {
    let body = message.body();
    match format {
        OutputFormat::Json => {
            let out = MessageOutput {
                action: message.action(),
                body_size: body.len(),
                body: payload_preview(&body),
                peer: message.origin().peer_addr().to_string(),
                timestamp: now_unix_seconds(),
            };
            println!(
                "{}",
                serde_json::to_string(&out).unwrap_or_else(|_| "{}".to_string())
            );
        }
        OutputFormat::Table => {
            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .set_content_arrangement(ContentArrangement::Dynamic)
                .set_header(vec!["ACTION", "SIZE", "PEER", "BODY"])
                .add_row(vec![
                    message.action().unwrap_or("<none>").to_string(),
                    body.len().to_string(),
                    message.origin().peer_addr().to_string(),
                    payload_preview(&body),
                ]);
            println!("{table}");
        }
        OutputFormat::Pretty => {
            println!(
                "action={} size={} peer={} body={}",
                message.action().unwrap_or("<none>"),
                body.len(),
                message.origin().peer_addr(),
                payload_preview(&body)
            );
        }
        OutputFormat::Raw => {
            print_raw(message.payload().as_ref());
        }
    }
}

pub fn print_raw(data: &[u8]) {
    let mut out = std::io::stdout();
    let _ = out.write_all(data);
    let _ = out.flush();
}

fn payload_preview(payload: &[u8]) -> String {
    match std::str::from_utf8(payload) {
        Ok(text) => text.to_string(),
        Err(_) => format!("<binary {} bytes>", payload.len()),
    }
}

fn now_unix_seconds() -> String {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs().to_string())
        .unwrap_or_else(|_| "0".to_string())
}
