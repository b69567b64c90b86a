/*!
format.rs

Output shaping for command results.

Two modes:
  - structured  : fixed JSON documents (`services`, `methods`, `request_type`/`response_type`)
  - passthrough : the tool's raw text, unchanged

Operations that only ever return tool text (`type`, `call`) produce
`Output::Text` in both modes.
*/

use serde::Deserialize;
use serde_json::Value;

#[derive(clap::ValueEnum, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum OutputMode {
    /// Reshape listings into JSON
    #[default]
    Structured,
    /// Print the tool's text as-is
    Passthrough,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Output {
    Text(String),
    Json(Value),
}

impl Output {
    /// Final text for stdout. JSON is pretty-printed with a trailing newline.
    pub fn render(&self) -> String {
        match self {
            Output::Text(text) => text.clone(),
            Output::Json(value) => {
                let mut s = serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string());
                s.push('\n');
                s
            }
        }
    }
}
