use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;

mod cmd;
mod config;
mod discovery;
mod error;
mod grpc;
mod resolve;
mod utils;

use cmd::{Dispatcher, OpContext, OutputMode};
use config::{Overrides, Settings};
use grpc::{GrpcCli, PayloadFormat, ToolClient};

/// grpc-ctl - call gRPC services across a directory of local sockets
///
/// Every file in the socket directory is one gRPC server (`unix:<path>`).
/// Services, methods and types are addressed by short names; grpc-ctl finds
/// the one server and fully qualified name they belong to.
///
/// Commands:
///   grpc-ctl list                          short names of all services
///   grpc-ctl list <SERVICE>                methods of a service
///   grpc-ctl list <SERVICE> <METHOD>       request / response type of a method
///   grpc-ctl type <SERVICE> <METHOD> <TYPE>
///   grpc-ctl call <SERVICE> <METHOD> <PAYLOAD>
///
/// Anything after `--` is passed to the reflection tool unchanged.
///
/// Global flags / env:
///   -d / --socket-dir   Socket directory (or GRPC_CTL_SOCKET_DIR)
///   --tool              Reflection tool command line (or GRPC_CTL_TOOL)
///   -c / --config       YAML / JSON settings file
///   -v / -vv            Increase verbosity
///   -q / --quiet        Errors only
///
/// Examples:
///   grpc-ctl -d /run/cvd/grpc list
///   grpc-ctl -d /run/cvd/grpc list Wmediumd SetTxpower
///   grpc-ctl -d /run/cvd/grpc call Wmediumd SetTxpower '{"mac_address":"..","tx_power":10}'
///   grpc-ctl -d /run/cvd/grpc call Foo Echo '{}' -- --metadata=k:v
#[derive(Parser, Debug)]
#[command(
    name = "grpc-ctl",
    version,
    author,
    about = "grpc-ctl - resolve and call gRPC services across local sockets",
    propagate_version = true,
    disable_help_subcommand = true
)]
pub struct Cli {
    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Silence all non-error output
    #[arg(short, long, global = true)]
    quiet: bool,

    /// Directory with one socket file per gRPC server
    #[arg(short = 'd', long, env = "GRPC_CTL_SOCKET_DIR", global = true, value_name = "DIR")]
    socket_dir: Option<PathBuf>,

    /// Settings file (.yaml/.yml or .json)
    #[arg(short = 'c', long, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Reflection tool command line (default: grpc_cli)
    #[arg(long, env = "GRPC_CTL_TOOL", global = true, value_name = "CMDLINE")]
    tool: Option<String>,

    /// Payload encoding for `call`
    #[arg(long, value_enum, global = true)]
    payload_format: Option<PayloadFormat>,

    /// Inject `-l=false --json_input --json_output` into every tool call
    #[arg(long, global = true, overrides_with = "no_force_default_flags")]
    force_default_flags: bool,

    /// Only inject payload flags into `call`
    #[arg(long, global = true, overrides_with = "force_default_flags")]
    no_force_default_flags: bool,

    /// Print the tool's text instead of reshaped JSON
    #[arg(long, global = true)]
    raw: bool,

    /// Per tool call timeout in seconds
    #[arg(long, global = true, value_name = "SECS")]
    timeout: Option<u64>,

    /// Match short names only at `.`/`/` boundaries (differs from the default raw suffix match)
    #[arg(long, global = true)]
    strict_names: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List services, a service's methods, or a method's types
    #[command(visible_alias = "ls")]
    List(OpArgs),

    /// Describe a request or response type of a method
    Type(OpArgs),

    /// Invoke a unary method
    Call(OpArgs),

    #[command(external_subcommand)]
    External(Vec<String>),
}

#[derive(Args, Debug)]
pub struct OpArgs {
    /// Positional arguments (SERVICE, METHOD, TYPE / PAYLOAD)
    pub args: Vec<String>,

    /// Options forwarded to the reflection tool
    #[arg(last = true, value_name = "TOOL OPTIONS")]
    pub options: Vec<String>,
}

impl Cli {
    fn overrides(&self) -> Overrides {
        let force_default_flags = if self.no_force_default_flags {
            Some(false)
        } else if self.force_default_flags {
            Some(true)
        } else {
            None
        };
        Overrides {
            socket_dir: self.socket_dir.clone(),
            tool: self.tool.clone(),
            payload_format: self.payload_format,
            force_default_flags,
            output: self.raw.then_some(OutputMode::Passthrough),
            timeout_secs: self.timeout,
            strict_names: self.strict_names.then_some(true),
        }
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let level = utils::derive_level(cli.verbose, cli.quiet);
    utils::init_logging(level);

    match run(cli) {
        Ok(rendered) => {
            print!("{rendered}");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log_error!("{e:#}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<String> {
    let overrides = cli.overrides();
    let (command, args, options) = match cli.command {
        Commands::List(a) => ("list".to_string(), a.args, a.options),
        Commands::Type(a) => ("type".to_string(), a.args, a.options),
        Commands::Call(a) => ("call".to_string(), a.args, a.options),
        Commands::External(mut raw) => {
            let command = if raw.is_empty() {
                String::new()
            } else {
                raw.remove(0)
            };
            (command, raw, Vec::new())
        }
    };

    // Unknown commands and bad argument counts are reported even when no
    // socket directory is configured.
    let dispatcher = Dispatcher::default();
    dispatcher.operation(&command)?.check_args(&args)?;

    let settings = match &cli.config {
        Some(path) => {
            let settings = Settings::load_file(path)?;
            log_info!("loaded settings from {}", path.display());
            settings
        }
        None => Settings::default(),
    }
    .apply(overrides);

    let socket_dir = settings
        .socket_dir
        .clone()
        .context("no socket directory (use --socket-dir, GRPC_CTL_SOCKET_DIR or socket_dir in config)")?;

    let spec = grpc::parse_tool(&settings.tool)
        .with_context(|| format!("Failed to parse tool command: '{}'", settings.tool))?;
    let runner = GrpcCli::new(spec, settings.timeout())?;
    let client = ToolClient::new(&runner, settings.flag_policy());
    let matcher = settings.matcher();
    let ctx = OpContext::new(&client, &*matcher, settings.output);

    let output = dispatcher.execute(
        &ctx,
        &socket_dir,
        &settings.transport_prefix,
        &command,
        &args,
        &options,
    )?;
    Ok(output.render())
}
