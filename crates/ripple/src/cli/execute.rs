//! Command execution logic.

use anyhow::{bail, Result};
use serde_json::json;
use std::io;
use std::path::Path;

use super::args::{CheckArgs, GraphArgs, PropagateArgs};
use crate::config::EngineConfig;
use crate::error::Error;
use crate::manifest::Manifest;
use crate::output::{self, OutputConfig, OutputMode};

/// Load the engine configuration, or the defaults when no file is given
///
/// # Errors
///
/// Returns an error if the given file cannot be read or parsed.
pub fn load_engine_config(path: Option<&Path>) -> Result<EngineConfig> {
    match path {
        Some(path) => {
            let config = EngineConfig::load(path)?;
            tracing::debug!(path = %path.display(), order = %config.propagation_order, "Loaded engine config");
            Ok(config)
        }
        None => Ok(EngineConfig::default()),
    }
}

/// Execute the graph command
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the requested type is
/// missing, or a graph fails to build.
pub fn execute_graph(
    args: &GraphArgs,
    output_mode: OutputMode,
    output_config: &OutputConfig,
) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;

    let type_names: Vec<&str> = match &args.type_name {
        Some(name) => {
            manifest.declarations(name)?;
            vec![name.as_str()]
        }
        None => manifest.type_names().collect(),
    };

    let mut graphs = Vec::with_capacity(type_names.len());
    for name in type_names {
        graphs.push((name, manifest.build_graph(name)?));
    }

    match output_mode {
        OutputMode::Json => {
            let types: Vec<_> = graphs
                .iter()
                .map(|(name, graph)| output::graph_to_json(name, graph))
                .collect();
            output::print_json(&json!({ "types": types }))?;
        }
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for (name, graph) in &graphs {
                output::write_graph(&mut handle, name, graph, output_config)?;
            }
        }
    }

    Ok(())
}

/// Execute the check command
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded or any type fails to
/// build.
pub fn execute_check(
    args: &CheckArgs,
    output_mode: OutputMode,
    output_config: &OutputConfig,
) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let results = manifest.build_all();
    let failures = results.iter().filter(|(_, result)| result.is_err()).count();

    match output_mode {
        OutputMode::Json => {
            let types: Vec<_> = results
                .iter()
                .map(|(name, result)| match result {
                    Ok(graph) => json!({
                        "name": name,
                        "ok": true,
                        "nodes": graph.len(),
                        "edges": graph.edge_count(),
                        "cycles": graph.cycles(),
                    }),
                    Err(e) => json!({
                        "name": name,
                        "ok": false,
                        "error": e.to_string(),
                    }),
                })
                .collect();
            output::print_json(&json!({ "types": types, "failures": failures }))?;
        }
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            for (name, result) in &results {
                output::write_check_line(&mut handle, name, result, output_config)?;
            }
        }
    }

    if failures > 0 {
        bail!("{failures} of {} types failed to build", results.len());
    }
    Ok(())
}

/// Execute the propagate command
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the type or changed
/// property is unknown, or the graph fails to build.
pub fn execute_propagate(
    args: &PropagateArgs,
    engine_config: &EngineConfig,
    output_mode: OutputMode,
    output_config: &OutputConfig,
) -> Result<()> {
    let manifest = Manifest::load(&args.manifest)?;
    let decls = manifest.declarations(&args.type_name)?;
    if !decls.contains(&args.changed) {
        return Err(Error::UnknownProperty(args.changed.clone()).into());
    }

    let graph = manifest.build_graph(&args.type_name)?;
    let order = args
        .order
        .map_or(engine_config.propagation_order, Into::into);
    let notified = graph.propagation_order(&args.changed, order);

    match output_mode {
        OutputMode::Json => {
            output::print_json(&json!({
                "type": args.type_name,
                "changed": args.changed,
                "order": order.to_string(),
                "notified": notified,
            }))?;
        }
        OutputMode::Text => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            output::write_propagation(
                &mut handle,
                &args.type_name,
                &args.changed,
                order,
                &notified,
                output_config,
            )?;
        }
    }

    Ok(())
}
