//! Output formatting for CLI commands.
//!
//! Text output is meant for people and uses color when the terminal allows
//! it; JSON output (`--json`) is stable and meant for scripts.
//!
//! Semantic Color Theme:
//!   - Success:   green  (graphs that build)
//!   - Error:     red    (construction errors)
//!   - Warning:   yellow (cycles, which are legal but worth knowing about)
//!   - Reference: cyan   (type and property names)
//!   - Muted:     dimmed (arrows, counts)

use crate::config::PropagationOrder;
use crate::domain::PropertyName;
use crate::graph::DependencyGraph;
use colored::Colorize;
use serde::Serialize;
use serde_json::{json, Value};
use std::env;
use std::io::{self, Write};

/// Output mode for CLI commands
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text
    Text,
    /// Pretty-printed JSON
    Json,
}

/// Configuration for text output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `RIPPLE_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        // Respect NO_COLOR standard (https://no-color.org/)
        let use_colors = env::var("NO_COLOR").is_err()
            && env::var("RIPPLE_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self { use_colors }
    }

    /// Configuration with colors disabled
    pub fn plain() -> Self {
        Self { use_colors: false }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { use_colors: true }
    }
}

fn paint(text: &str, config: &OutputConfig, style: fn(&str) -> colored::ColoredString) -> String {
    if config.use_colors {
        style(text).to_string()
    } else {
        text.to_string()
    }
}

fn cyan(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.cyan())
}

fn green(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.green())
}

fn red(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.red())
}

fn yellow(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.yellow())
}

fn dimmed(text: &str, config: &OutputConfig) -> String {
    paint(text, config, |t| t.dimmed())
}

/// Print a value as pretty JSON to stdout
///
/// # Errors
///
/// Returns an error if serialization or the write to stdout fails.
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{json}")
}

fn join(names: &[PropertyName]) -> String {
    names
        .iter()
        .map(PropertyName::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// JSON form of one type's graph.
pub fn graph_to_json(type_name: &str, graph: &DependencyGraph) -> Value {
    let mut nodes: Vec<_> = graph.nodes().collect();
    nodes.sort_by(|a, b| a.name().cmp(b.name()));

    json!({
        "name": type_name,
        "nodes": nodes
            .iter()
            .map(|node| json!({
                "name": node.name(),
                "dependents": node.dependent_names(),
            }))
            .collect::<Vec<_>>(),
        "cycles": graph.cycles(),
    })
}

/// Write one type's graph as an indented edge list.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_graph<W: Write>(
    w: &mut W,
    type_name: &str,
    graph: &DependencyGraph,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} {}",
        cyan(type_name, config),
        dimmed(
            &format!("({} nodes, {} edges)", graph.len(), graph.edge_count()),
            config
        )
    )?;

    let mut nodes: Vec<_> = graph.nodes().collect();
    nodes.sort_by(|a, b| a.name().cmp(b.name()));

    for node in nodes {
        let dependents = node.dependent_names();
        if dependents.is_empty() {
            writeln!(w, "  {}", node.name())?;
        } else {
            let list: Vec<&str> = dependents.iter().map(|n| n.as_str()).collect();
            writeln!(w, "  {} {} {}", node.name(), dimmed("->", config), list.join(", "))?;
        }
    }

    for cycle in graph.cycles() {
        writeln!(w, "  {} {}", yellow("cycle:", config), join(&cycle))?;
    }
    Ok(())
}

/// Write the notification sequence for a simulated change.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_propagation<W: Write>(
    w: &mut W,
    type_name: &str,
    changed: &str,
    order: PropagationOrder,
    notified: &[PropertyName],
    config: &OutputConfig,
) -> io::Result<()> {
    if notified.is_empty() {
        return writeln!(
            w,
            "Changing {} on {} notifies nothing",
            cyan(changed, config),
            cyan(type_name, config)
        );
    }

    writeln!(
        w,
        "Changing {} on {} notifies {}:",
        cyan(changed, config),
        cyan(type_name, config),
        dimmed(&format!("({order})"), config)
    )?;
    for (i, name) in notified.iter().enumerate() {
        writeln!(w, "  {}. {}", i + 1, name)?;
    }
    Ok(())
}

/// Write one line of `check` output.
///
/// # Errors
///
/// Returns any error from the underlying writer.
pub fn write_check_line<W: Write>(
    w: &mut W,
    type_name: &str,
    result: &crate::error::Result<DependencyGraph>,
    config: &OutputConfig,
) -> io::Result<()> {
    match result {
        Ok(graph) => {
            writeln!(
                w,
                "{} {} {}",
                green("ok  ", config),
                type_name,
                dimmed(
                    &format!("({} nodes, {} edges)", graph.len(), graph.edge_count()),
                    config
                )
            )?;
            for cycle in graph.cycles() {
                writeln!(w, "      {} {}", yellow("cycle:", config), join(&cycle))?;
            }
            Ok(())
        }
        Err(e) => writeln!(w, "{} {}: {}", red("FAIL", config), type_name, e),
    }
}
