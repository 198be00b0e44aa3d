use crate::classify::SHELL_TOOL;
use crate::render::RenderOptions;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::Path;

pub const FILENAME: &str = "transcriptor.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Html,
}

/// User-facing preferences, read from `transcriptor.toml`.
///
/// ```toml
/// format = "html"
/// shell_tool = "Bash"
/// show_thinking = false
/// max_output_chars = 2000
/// title = "Refactoring session"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Preferences {
    #[serde(default)]
    pub format: OutputFormat,

    /// Tool whose call/result pairs render as shell commands.
    #[serde(default = "default_shell_tool")]
    pub shell_tool: String,

    #[serde(default = "default_true")]
    pub show_thinking: bool,

    /// Tool output is cut after this many characters; 0 disables the cut.
    #[serde(default = "default_max_output_chars")]
    pub max_output_chars: usize,

    /// Used when the transcript carries no summary title of its own.
    #[serde(default)]
    pub title: Option<String>,
}

fn default_shell_tool() -> String {
    SHELL_TOOL.into()
}

fn default_true() -> bool {
    true
}

fn default_max_output_chars() -> usize {
    4000
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            format: OutputFormat::default(),
            shell_tool: default_shell_tool(),
            show_thinking: default_true(),
            max_output_chars: default_max_output_chars(),
            title: None,
        }
    }
}

impl Preferences {
    /// Load preferences from an explicit file, which must exist.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("reading {}", path.display()))?;
        Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
    }

    /// Load `transcriptor.toml` from `dir` if present, else defaults.
    /// Missing keys in an existing file are filled in with defaults via serde.
    pub fn discover(dir: &Path) -> Result<Self> {
        let path = dir.join(FILENAME);
        match fs::read_to_string(&path) {
            Ok(contents) => {
                Self::parse(&contents).with_context(|| format!("parsing {}", path.display()))
            }
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
        }
    }

    fn parse(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn render_options(&self) -> RenderOptions {
        RenderOptions {
            title: self
                .title
                .clone()
                .unwrap_or_else(|| RenderOptions::default().title),
            show_thinking: self.show_thinking,
            max_output_chars: (self.max_output_chars > 0).then_some(self.max_output_chars),
        }
    }
}
