#![forbid(unsafe_code)]

use clap::{Parser, Subcommand};
use eiptag_lib::{blocking, Options, Result};
use tracing::error;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about = "EtherNet/IP tag read/write client")]
struct Cli {
    /// PLC host, either an IP/hostname (port 44818 implied) or host:port
    #[arg(long)]
    ip: String,

    /// Backplane route path, e.g. "1,0"
    #[arg(long)]
    path: Option<String>,

    /// Per-operation timeout in milliseconds
    #[arg(long, default_value_t = 5000)]
    timeout_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read a REAL tag
    ReadFloat { tag: String },
    /// Write a REAL tag
    WriteFloat { tag: String, value: f32 },
    /// Read a DINT tag
    ReadDint { tag: String },
    /// Write a DINT tag
    WriteDint { tag: String, value: i32 },
    /// Write a BOOL tag or a single bit (`Word[7]` or `i=Word.7`)
    WriteBool { tag: String, value: bool },
    /// Read a STRING tag
    ReadString { tag: String },
    /// Write a STRING tag
    WriteString { tag: String, value: String },
}

fn main() {
    init_tracing();

    let cli = Cli::parse();
    let options = Options {
        ip: cli.ip,
        path: cli.path,
        timeout_ms: cli.timeout_ms,
    };
    let client = match blocking::Client::new(options) {
        Ok(client) => client,
        Err(err) => {
            error!(%err, "failed to build client");
            std::process::exit(1);
        }
    };

    let outcome = run(&client, cli.command);
    client.close();
    if let Err(err) = outcome {
        error!(%err, "tag operation failed");
        std::process::exit(1);
    }
}

fn run(client: &blocking::Client, command: Command) -> Result<()> {
    match command {
        Command::ReadFloat { tag } => println!("{}", client.read_float(&tag)?),
        Command::WriteFloat { tag, value } => client.write_float(&tag, value)?,
        Command::ReadDint { tag } => println!("{}", client.read_dint(&tag)?),
        Command::WriteDint { tag, value } => client.write_dint(&tag, value)?,
        Command::WriteBool { tag, value } => client.write_bool(&tag, value)?,
        Command::ReadString { tag } => println!("{}", client.read_string(&tag)?),
        Command::WriteString { tag, value } => client.write_string(&tag, &value)?,
    }
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .init();
}
