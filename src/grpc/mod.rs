//! Reflection tool access (the external `grpc_cli`-style binary).
//!
//! parse_tool -> ToolSpec { program, args }
//! Invocation: one self-contained argv per tool call, assembled under a FlagPolicy.
//! ReflectionTool: the seam between argv assembly and process spawning.
//! ToolClient: policy + tool, with tracing of every call.
//!
use anyhow::{Result, bail};
use serde::Deserialize;
use shell_words::split as shell_split;
use std::fmt;

use crate::discovery::EndpointAddress;
use crate::error::DispatchResult;
use crate::{log_debug, log_trace};

pub mod catalog;
pub mod runner;

pub use runner::GrpcCli;

/* ---- Tool Command Line ---- */

/// A parsed tool command line (program plus leading arguments).
#[derive(Debug, Clone)]
pub struct ToolSpec {
    pub program: String,
    pub args: Vec<String>,
}

impl fmt::Display for ToolSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.args.is_empty() {
            write!(f, "{}", self.program)
        } else {
            write!(f, "{} {}", self.program, self.args.join(" "))
        }
    }
}

/// Split a configured tool command line with shell-style rules.
///
/// Examples:
/// - "grpc_cli" -> program `grpc_cli`, no args
/// - "bazel run //:grpc_cli --" -> program `bazel`, args `[run, //:grpc_cli, --]`
pub fn parse_tool(raw: &str) -> Result<ToolSpec> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        bail!("Tool command is empty");
    }
    let mut parts = shell_split(trimmed)?;
    if parts.is_empty() || parts[0].is_empty() {
        bail!("Empty program name in tool command");
    }
    let program = parts.remove(0);
    Ok(ToolSpec {
        program,
        args: parts,
    })
}

/* ---- Operations & Flags ---- */

/// Leading operation token of a tool call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ToolOp {
    Ls,
    Type,
    Call,
}

impl ToolOp {
    pub fn as_str(&self) -> &'static str {
        match self {
            ToolOp::Ls => "ls",
            ToolOp::Type => "type",
            ToolOp::Call => "call",
        }
    }
}

/// Encoding of request payloads and responses exchanged with the tool.
#[derive(clap::ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum PayloadFormat {
    /// JSON-encoded messages
    #[default]
    Json,
    /// Protobuf text format
    Text,
}

/// Which flags get injected ahead of an invocation's own arguments.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FlagPolicy {
    pub payload_format: PayloadFormat,
    pub force_default_flags: bool,
}

impl Default for FlagPolicy {
    fn default() -> Self {
        Self {
            payload_format: PayloadFormat::Json,
            force_default_flags: true,
        }
    }
}

impl FlagPolicy {
    fn payload_flags(&self) -> [String; 2] {
        let json = self.payload_format == PayloadFormat::Json;
        [
            format!("--json_input={json}"),
            format!("--json_output={json}"),
        ]
    }

    /// Short listing plus the payload flags.
    pub fn default_flags(&self) -> Vec<String> {
        let mut flags = vec!["-l=false".to_string()];
        flags.extend(self.payload_flags());
        flags
    }

    /// Flags placed directly after the operation token. Anything later in the
    /// argv wins, since the tool resolves repeated flags last-wins.
    pub fn injected_flags(&self, op: ToolOp) -> Vec<String> {
        if self.force_default_flags {
            self.default_flags()
        } else if op == ToolOp::Call && self.payload_format == PayloadFormat::Json {
            self.payload_flags().to_vec()
        } else {
            Vec::new()
        }
    }
}

/* ---- Invocation ---- */

/// One tool call: `[op, injected.., address, operands.., flags.., options..]`.
#[derive(Debug, Clone)]
pub struct Invocation {
    op: ToolOp,
    address: EndpointAddress,
    operands: Vec<String>,
    flags: Vec<String>,
    options: Vec<String>,
}

impl Invocation {
    pub fn new(op: ToolOp, address: &EndpointAddress) -> Self {
        Self {
            op,
            address: address.clone(),
            operands: Vec::new(),
            flags: Vec::new(),
            options: Vec::new(),
        }
    }

    /// Qualified name or payload argument.
    pub fn operand(mut self, value: impl Into<String>) -> Self {
        self.operands.push(value.into());
        self
    }

    /// Flag needed by the caller of this invocation (e.g. `-l` for long form).
    pub fn flag(mut self, flag: impl Into<String>) -> Self {
        self.flags.push(flag.into());
        self
    }

    /// User passthrough options, appended verbatim and last.
    pub fn options(mut self, options: &[String]) -> Self {
        self.options.extend_from_slice(options);
        self
    }

    pub fn to_argv(&self, policy: &FlagPolicy) -> Vec<String> {
        let mut argv = Vec::with_capacity(
            2 + self.operands.len() + self.flags.len() + self.options.len() + 3,
        );
        argv.push(self.op.as_str().to_string());
        argv.extend(policy.injected_flags(self.op));
        argv.push(self.address.to_string());
        argv.extend(self.operands.iter().cloned());
        argv.extend(self.flags.iter().cloned());
        argv.extend(self.options.iter().cloned());
        argv
    }
}

/* ---- Tool Seam ---- */

/// Anything that can run one reflection tool call and return its stdout.
pub trait ReflectionTool {
    fn run(&self, argv: &[String]) -> DispatchResult<String>;
}

/// A reflection tool paired with the flag policy every call is built under.
pub struct ToolClient<'a> {
    tool: &'a dyn ReflectionTool,
    policy: FlagPolicy,
}

impl<'a> ToolClient<'a> {
    pub fn new(tool: &'a dyn ReflectionTool, policy: FlagPolicy) -> Self {
        Self { tool, policy }
    }

    pub fn execute(&self, invocation: Invocation) -> DispatchResult<String> {
        let argv = invocation.to_argv(&self.policy);
        log_trace!("tool argv: {:?}", argv);
        let out = self.tool.run(&argv);
        match &out {
            Ok(text) => log_trace!("tool returned {} bytes", text.len()),
            Err(e) => log_debug!("tool call `{}` failed: {e}", argv.join(" ")),
        }
        out
    }
}

/* ---- Test Support ---- */


#[cfg(test)]
mod tests {
    use super::*;

    fn addr() -> EndpointAddress {
        EndpointAddress::new("unix:/tmp/s/a.sock")
    }

    #[test]
    fn parse_tool_simple() {
        let spec = parse_tool("grpc_cli").unwrap();
        assert_eq!(spec.program, "grpc_cli");
        assert!(spec.args.is_empty());
    }

    #[test]
    fn parse_tool_quoted() {
        let spec = parse_tool(r#""/opt/my tools/grpc_cli" --channel "a b""#).unwrap();
        assert_eq!(spec.program, "/opt/my tools/grpc_cli");
        assert_eq!(spec.args, vec!["--channel", "a b"]);
    }

    #[test]
    fn empty_tool_rejected() {
        let err = parse_tool("   ").unwrap_err();
        assert!(err.to_string().contains("empty"));
    }

    #[test]
    fn forced_defaults_follow_op_token() {
        let argv = Invocation::new(ToolOp::Ls, &addr())
            .operand("pkg.Foo/Echo")
            .flag("-l")
            .options(&["--metadata=k:v".to_string()])
            .to_argv(&FlagPolicy::default());
        assert_eq!(
            argv,
            vec![
                "ls",
                "-l=false",
                "--json_input=true",
                "--json_output=true",
                "unix:/tmp/s/a.sock",
                "pkg.Foo/Echo",
                "-l",
                "--metadata=k:v",
            ]
        );
    }

    #[test]
    fn text_payload_flips_payload_flags() {
        let policy = FlagPolicy {
            payload_format: PayloadFormat::Text,
            force_default_flags: true,
        };
        assert_eq!(
            policy.default_flags(),
            vec!["-l=false", "--json_input=false", "--json_output=false"]
        );
    }

    #[test]
    fn unforced_policy_only_touches_json_calls() {
        let json = FlagPolicy {
            payload_format: PayloadFormat::Json,
            force_default_flags: false,
        };
        assert!(json.injected_flags(ToolOp::Ls).is_empty());
        assert!(json.injected_flags(ToolOp::Type).is_empty());
        assert_eq!(
            json.injected_flags(ToolOp::Call),
            vec!["--json_input=true", "--json_output=true"]
        );

        let text = FlagPolicy {
            payload_format: PayloadFormat::Text,
            force_default_flags: false,
        };
        assert!(text.injected_flags(ToolOp::Call).is_empty());
    }
}
