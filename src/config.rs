//! Settings: defaults, optional config file (YAML or JSON), CLI/env overrides.
//!
//! Precedence: CLI flag > environment > config file > default.

use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::cmd::OutputMode;
use crate::discovery::DEFAULT_TRANSPORT_PREFIX;
use crate::grpc::{FlagPolicy, PayloadFormat};
use crate::resolve::{NameMatcher, SegmentMatcher, SuffixMatcher};

pub const DEFAULT_TOOL: &str = "grpc_cli";

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory holding one socket per endpoint
    pub socket_dir: Option<PathBuf>,
    /// Reflection tool command line (shell-split)
    pub tool: String,
    pub payload_format: PayloadFormat,
    /// Inject `-l=false --json_input --json_output` into every tool call
    pub force_default_flags: bool,
    pub output: OutputMode,
    /// Per tool call; unset waits forever
    pub timeout_secs: Option<u64>,
    pub transport_prefix: String,
    /// Require short names to start at a `.`/`/` boundary
    pub strict_names: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            socket_dir: None,
            tool: DEFAULT_TOOL.to_string(),
            payload_format: PayloadFormat::Json,
            force_default_flags: true,
            output: OutputMode::Structured,
            timeout_secs: None,
            transport_prefix: DEFAULT_TRANSPORT_PREFIX.to_string(),
            strict_names: false,
        }
    }
}

/// Values supplied on the command line or through the environment.
#[derive(Debug, Default, Clone)]
pub struct Overrides {
    pub socket_dir: Option<PathBuf>,
    pub tool: Option<String>,
    pub payload_format: Option<PayloadFormat>,
    pub force_default_flags: Option<bool>,
    pub output: Option<OutputMode>,
    pub timeout_secs: Option<u64>,
    pub strict_names: Option<bool>,
}

impl Settings {
    /// Read a config file; `.yaml`/`.yml` as YAML, anything else as JSON.
    pub fn load_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;
        let lower = path.to_string_lossy().to_ascii_lowercase();

        if lower.ends_with(".yaml") || lower.ends_with(".yml") {
            serde_yaml::from_str(&raw).context("failed to parse YAML config file")
        } else {
            serde_json::from_str(&raw).context("failed to parse JSON config file")
        }
    }

    pub fn apply(mut self, o: Overrides) -> Self {
        if o.socket_dir.is_some() {
            self.socket_dir = o.socket_dir;
        }
        if let Some(tool) = o.tool {
            self.tool = tool;
        }
        if let Some(fmt) = o.payload_format {
            self.payload_format = fmt;
        }
        if let Some(force) = o.force_default_flags {
            self.force_default_flags = force;
        }
        if let Some(mode) = o.output {
            self.output = mode;
        }
        if o.timeout_secs.is_some() {
            self.timeout_secs = o.timeout_secs;
        }
        if let Some(strict) = o.strict_names {
            self.strict_names = strict;
        }
        self
    }

    pub fn flag_policy(&self) -> FlagPolicy {
        FlagPolicy {
            payload_format: self.payload_format,
            force_default_flags: self.force_default_flags,
        }
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn matcher(&self) -> Box<dyn NameMatcher> {
        if self.strict_names {
            Box::new(SegmentMatcher)
        } else {
            Box::new(SuffixMatcher)
        }
    }
}
