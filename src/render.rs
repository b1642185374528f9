//! Command-line and script text rendering. Pure string assembly, no
//! filesystem access.

use serde::{Deserialize, Serialize};

use crate::expand::RunArgs;
use crate::run::RunDefinition;

/// File inside each run's output directory that receives redirected stdout.
pub const STD_OUTPUT_FILE: &str = "std.output";

/// How `--name value` pairs are spelled on the generated command lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ArgStyle {
    /// `--name value`
    #[default]
    Space,
    /// `--name=value`
    Equals,
}

/// Invocation-line settings shared by every generated script.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields, default)]
pub struct InvocationConfig {
    pub style: ArgStyle,
    /// Echo each command before running it, as the batch logs expect.
    pub echo: bool,
    /// Flag that tells the target program where to write its artifacts.
    pub output_flag: String,
}

impl Default for InvocationConfig {
    fn default() -> Self {
        InvocationConfig {
            style: ArgStyle::Space,
            echo: true,
            output_flag: "--output_dir".to_string(),
        }
    }
}

/// Render `cmd` plus every argument in run order, without the output flag or
/// redirection.
pub fn render_command(cmd: &str, args: &RunArgs, style: ArgStyle) -> String {
    let mut line = cmd.to_string();
    for (name, value) in args.iter() {
        let rendered = match style {
            ArgStyle::Space => format!(" --{name} {value}"),
            ArgStyle::Equals => format!(" --{name}={value}"),
        };
        line.push_str(&rendered);
    }
    line
}

/// Render one script block for a run: optional echo line, then the command
/// with its output flag and stdout redirection into the run's directory.
pub fn render_run_block(run: &RunDefinition, invocation: &InvocationConfig) -> String {
    let output_dir = run.output_dir.display();
    let full = match invocation.style {
        ArgStyle::Space => format!("{} {} {output_dir}", run.command, invocation.output_flag),
        ArgStyle::Equals => format!("{} {}={output_dir}", run.command, invocation.output_flag),
    };
    let mut block = String::new();
    if invocation.echo {
        block.push_str("echo ");
        block.push_str(&full);
        block.push('\n');
    }
    block.push_str(&full);
    block.push_str(" > ");
    block.push_str(&run.output_dir.join(STD_OUTPUT_FILE).display().to_string());
    block
}

/// Assemble a full script document: prologue, one block per run, epilogue,
/// each section separated by a blank line, single trailing newline.
pub fn render_script(prologue: &str, blocks: &[String], epilogue: &str) -> String {
    let mut doc = String::new();
    doc.push_str(prologue.trim_end_matches('\n'));
    doc.push('\n');
    for block in blocks {
        doc.push('\n');
        doc.push_str(block);
        doc.push('\n');
    }
    doc.push('\n');
    doc.push_str(epilogue.trim_end_matches('\n'));
    doc.push('\n');
    doc
}
