//! Concrete run definitions produced by planning.

use std::path::PathBuf;

use crate::expand::RunArgs;

/// One concrete parameter combination bound to an output directory and a
/// rendered command line. Immutable once planned.
#[derive(Debug, Clone)]
pub struct RunDefinition {
    /// Arguments in declaration order.
    pub args: RunArgs,
    /// Derived, collision-checked directory name under the outputs root.
    pub path_segment: String,
    /// Absolute or config-relative output directory for this run.
    pub output_dir: PathBuf,
    /// Command line without the output flag or redirection.
    pub command: String,
}
