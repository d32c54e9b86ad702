//! External renderer invocation.
//!
//! ```text
//! [interpreter] <program> [args..] <template> -o <output> [strip args] [-D<NAME>=<value>..]
//! ```
//!
//! Strip args (default `--line-directive=`) are only passed when annotation is
//! off: tools like gyb emit source locations by default and need to be told
//! not to.

use std::ffi::OsString;
use std::process::Command;

use regen_core::config::CommandConfig;

use crate::engine::{RenderOutput, RenderRequest, Renderer};
use crate::error::{io_err, RenderError};

/// Runs a configured tool once per output file.
pub struct CommandRenderer {
    config: CommandConfig,
}

impl CommandRenderer {
    pub fn new(config: CommandConfig) -> Self {
        CommandRenderer { config }
    }

    /// Full argv for `request`, program first.
    pub fn argv(&self, request: &RenderRequest<'_>) -> Vec<OsString> {
        let mut argv: Vec<OsString> = Vec::new();
        if let Some(interpreter) = &self.config.interpreter {
            argv.push(interpreter.into());
        }
        argv.push(self.config.program.clone().into());
        argv.extend(self.config.args.iter().map(OsString::from));
        argv.push(request.template.into());
        argv.push("-o".into());
        argv.push(request.output.into());
        if !request.annotate {
            argv.extend(self.config.strip_locations_args.iter().map(OsString::from));
        }
        argv.extend(request.flags.iter().map(|f| OsString::from(format!("-D{f}"))));
        argv
    }
}

impl Renderer for CommandRenderer {
    fn render(&self, request: &RenderRequest<'_>) -> Result<RenderOutput, RenderError> {
        let argv = self.argv(request);
        let command_line = escape_command(&argv);

        if let Some(parent) = request.output.parent() {
            std::fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
        }

        let output = Command::new(&argv[0])
            .args(&argv[1..])
            .envs(&self.config.env)
            .output()
            .map_err(|source| RenderError::Spawn {
                command: command_line.clone(),
                source,
            })?;

        let mut captured = String::from_utf8_lossy(&output.stdout).into_owned();
        captured.push_str(&String::from_utf8_lossy(&output.stderr));

        if !output.status.success() {
            return Err(RenderError::Failed {
                command: command_line,
                status: output.status.to_string(),
                output: captured,
            });
        }

        if !captured.is_empty() {
            tracing::debug!("{command_line}: {}", captured.trim_end());
        }
        Ok(RenderOutput { output: captured })
    }

    fn preflight(&self) -> Result<(), RenderError> {
        match &self.config.interpreter {
            Some(interpreter) => {
                which::which(interpreter).map_err(|_| RenderError::ToolNotFound {
                    tool: "renderer interpreter",
                    path: interpreter.clone(),
                })?;
                // The script itself need not be executable when run through an interpreter.
                if !self.config.program.is_file() {
                    return Err(RenderError::ToolNotFound {
                        tool: "renderer script",
                        path: self.config.program.clone(),
                    });
                }
            }
            None => {
                which::which(&self.config.program).map_err(|_| RenderError::ToolNotFound {
                    tool: "renderer",
                    path: self.config.program.clone(),
                })?;
            }
        }
        Ok(())
    }

    fn describe(&self, request: &RenderRequest<'_>) -> String {
        escape_command(&self.argv(request))
    }
}

/// Quote an argument for display when it contains spaces or quotes.
pub fn escape_arg(arg: &str) -> String {
    if arg.contains('"') || arg.contains(' ') {
        format!("\"{}\"", arg.replace('"', "\\\""))
    } else {
        arg.to_string()
    }
}

/// Render an argv as a single copy-pasteable line.
pub fn escape_command(argv: &[OsString]) -> String {
    argv.iter()
        .map(|a| escape_arg(&a.to_string_lossy()))
        .collect::<Vec<_>>()
        .join(" ")
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
