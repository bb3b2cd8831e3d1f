use std::{convert::TryFrom, process, time::Duration};

use clap::Parser;
use tcp_jsonrpc_client::{
    ErrorKind, Id, Params, Request, TcpClient, TcpClientError, Value, DEFAULT_BUFFER_SIZE, DEFAULT_MAX_RESPONSE_SIZE,
};

/// Send one JSON-RPC request over TCP and print the reply.
#[derive(Parser, Debug)]
#[command(name = "tcp-jsonrpc", version, about, long_about = None)]
struct Args {
    /// Name of the remote procedure, e.g. ListAllMethod
    method: String,

    /// Parameters, as a JSON array or object
    #[arg(short, long, value_parser = parse_params)]
    params: Option<Params>,

    /// Request id; numeric when it parses as one
    #[arg(long, value_parser = parse_id)]
    id: Option<Id>,

    /// Add "jsonrpc":"2.0" to the request
    #[arg(long)]
    jsonrpc: bool,

    /// Server host name or address
    #[arg(long, env = "JSONRPC_HOST", default_value = "127.0.0.1")]
    host: String,

    /// Server port
    #[arg(long, env = "JSONRPC_PORT", default_value_t = 1234)]
    port: u16,

    /// Bytes requested per receive call
    #[arg(long, env = "JSONRPC_BUFFER_SIZE", default_value_t = DEFAULT_BUFFER_SIZE)]
    buffer_size: usize,

    /// Largest reply accepted, in bytes
    #[arg(long, env = "JSONRPC_MAX_RESPONSE_SIZE", default_value_t = DEFAULT_MAX_RESPONSE_SIZE)]
    max_response_size: usize,

    /// Seconds to wait for the reply
    #[arg(long, env = "JSONRPC_TIMEOUT_SECS", default_value = "30", value_parser = parse_secs)]
    timeout: Duration,

    /// Seconds to wait for the connection
    #[arg(long, env = "JSONRPC_CONNECT_TIMEOUT_SECS", default_value = "10", value_parser = parse_secs)]
    connect_timeout: Duration,

    /// Half-close the connection after sending
    #[arg(long)]
    shutdown_write: bool,
}

fn parse_params(s: &str) -> Result<Params, String> {
    let value = serde_json::from_str::<Value>(s).map_err(|err| err.to_string())?;
    Params::try_from(value).map_err(|_| "params must be a JSON array or object".to_string())
}

fn parse_id(s: &str) -> Result<Id, String> {
    Ok(s.parse::<u64>().map(Id::Num).unwrap_or_else(|_| Id::Str(s.to_owned())))
}

fn parse_secs(s: &str) -> Result<Duration, String> {
    let secs = s.parse::<f64>().map_err(|err| err.to_string())?;
    if !secs.is_finite() || secs <= 0.0 {
        return Err("expected a positive number of seconds".to_string());
    }
    Duration::try_from_secs_f64(secs).map_err(|err| err.to_string())
}

fn exit_code(kind: ErrorKind) -> i32 {
    match kind {
        ErrorKind::InvalidInput => 2,
        ErrorKind::Connection => 3,
        ErrorKind::Transport => 4,
        ErrorKind::Timeout => 5,
        ErrorKind::Protocol => 6,
    }
}

async fn run(args: Args) -> Result<(), TcpClientError> {
    let mut request = Request::try_new(args.method, args.params)?;
    if args.jsonrpc {
        request = request.with_version();
    }
    if let Some(id) = args.id {
        request = request.with_id(id);
    }

    let client = TcpClient::builder()
        .buffer_size(args.buffer_size)
        .max_response_size(args.max_response_size)
        .timeout(args.timeout)
        .connect_timeout(args.connect_timeout)
        .shutdown_write(args.shutdown_write)
        .build(args.host, args.port)?;

    println!("{}", request);

    let response = client.send(&request).await?;
    println!("{:#}", response);
    Ok(())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let args = Args::parse();
    log::debug!("{:?}", args);

    if let Err(err) = run(args).await {
        eprintln!("error ({}): {}", err.kind(), err);
        process::exit(exit_code(err.kind()));
    }
}
