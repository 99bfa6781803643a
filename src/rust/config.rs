use std::env;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;

use clap::Parser;

use crate::runtime::RuntimeConfig;
use crate::ModelManager;

const DEFAULT_PORT: u16 = 8080;

#[derive(Parser, Debug, Clone)]
#[command(author, version, about = "Detect the emotional tone of a text", long_about = None)]
pub struct Args {
    /// Force a fresh download of the model files
    #[arg(short, long)]
    pub fresh: bool,

    /// Address to bind the web server to
    #[arg(long, default_value_t = IpAddr::V4(Ipv4Addr::UNSPECIFIED))]
    pub host: IpAddr,

    /// Port to listen on, falls back to $PORT and then 8080
    #[arg(short, long)]
    pub port: Option<u16>,

    /// Directory holding downloaded models, defaults to the user cache
    #[arg(long)]
    pub models_dir: Option<PathBuf>,

    /// Intra-op threads for ONNX Runtime, 0 lets the runtime decide
    #[arg(long, default_value_t = 0)]
    pub threads: usize,

    /// Analyze this text once, print the result and exit instead of serving
    #[arg(short, long)]
    pub text: Option<String>,
}

/// Resolved settings for one run of the binary
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub addr: SocketAddr,
    pub models_dir: PathBuf,
    pub runtime: RuntimeConfig,
    pub fresh: bool,
    pub text: Option<String>,
}

impl AppConfig {
    pub fn from_args(args: Args) -> Self {
        let port = resolve_port(args.port, env::var("PORT").ok());

        Self {
            addr: SocketAddr::new(args.host, port),
            models_dir: args.models_dir.unwrap_or_else(ModelManager::get_default_models_dir),
            runtime: RuntimeConfig::with_intra_threads(args.threads),
            fresh: args.fresh,
            text: args.text,
        }
    }
}

/// `--port` wins, then a parseable `$PORT`, then 8080.
pub fn resolve_port(arg: Option<u16>, env_port: Option<String>) -> u16 {
    arg.or_else(|| env_port.and_then(|value| value.trim().parse::<u16>().ok()))
        .unwrap_or(DEFAULT_PORT)
}
