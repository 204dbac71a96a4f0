//! Nodegraph - inspect node manifests from the command line
//!
//! Prints the same payloads the editor front end consumes, which makes it
//! easy to check a manifest before wiring it into a host.

use std::error::Error;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use nodegraph::{Config, Manifest, NodeRegistry, TypeSystem};

#[derive(Parser)]
#[command(name = "nodegraph")]
#[command(about = "Inspect node registries and inferred type hierarchies", long_about = None)]
struct Cli {
    /// Configuration file (defaults to nodegraph.toml or the user config)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Indent JSON output
    #[arg(long, global = true)]
    pretty: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the node-list payload for a manifest
    Nodes {
        /// Path to a JSON node manifest
        manifest: PathBuf,
    },
    /// Print the parent-type map for a manifest
    ParentTypes {
        /// Path to a JSON node manifest
        manifest: PathBuf,
    },
    /// Check whether an output type may feed an input type
    CanConnect {
        /// Path to a JSON node manifest
        manifest: PathBuf,
        /// Output port type
        from: String,
        /// Input port type
        to: String,
    },
    /// Print the default configuration
    DefaultConfig,
}

fn load_registry(config: &Config, manifest: &Path) -> Result<NodeRegistry, Box<dyn Error>> {
    let manifest = Manifest::from_file(manifest)?;
    Ok(manifest.build_registry(TypeSystem::from_config(&config.types))?)
}

/// Run a parsed command line, writing its payload to `out`
fn execute(cli: Cli, out: &mut impl Write) -> Result<(), Box<dyn Error>> {
    let config = Config::load_from(cli.config.as_ref())?;
    // The flag can only switch indentation on
    let pretty = cli.pretty || config.output.pretty;

    match cli.command {
        Commands::Nodes { manifest } => {
            let registry = load_registry(&config, &manifest)?;
            let json = if pretty {
                registry.get_nodes_as_json_pretty()?
            } else {
                registry.get_nodes_as_json()?
            };
            writeln!(out, "{}", json)?;
        }
        Commands::ParentTypes { manifest } => {
            let registry = load_registry(&config, &manifest)?;
            let json = if pretty {
                registry.get_parent_types_as_json_pretty()?
            } else {
                registry.get_parent_types_as_json()?
            };
            writeln!(out, "{}", json)?;
        }
        Commands::CanConnect { manifest, from, to } => {
            let registry = load_registry(&config, &manifest)?;
            writeln!(out, "{}", registry.can_connect(&from, &to)?)?;
        }
        Commands::DefaultConfig => {
            write!(out, "{}", Config::default_config_string())?;
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let stdout = io::stdout();
    match execute(Cli::parse(), &mut stdout.lock()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const MANIFEST: &str = r#"{
        "nodes": [
            { "name": "is_even",
              "parameters": [ {"name": "n", "type": "int"} ],
              "returns": "bool",
              "source": "def is_even(n: int) -> bool: ..." }
        ]
    }"#;

    struct Fixture {
        temp: TempDir,
        manifest: String,
        pretty_config: String,
        plain_config: String,
    }

    fn fixture() -> Fixture {
        let temp = TempDir::new().unwrap();
        let put = |name: &str, content: &str| {
            let path = temp.path().join(name);
            fs::write(&path, content).unwrap();
            path.to_string_lossy().to_string()
        };
        let manifest = put("manifest.json", MANIFEST);
        let pretty_config = put("pretty.toml", "[output]\npretty = true\n");
        let plain_config = put("plain.toml", "[output]\npretty = false\n");
        Fixture {
            temp,
            manifest,
            pretty_config,
            plain_config,
        }
    }

    fn run(args: &[&str]) -> Result<String, Box<dyn Error>> {
        let cli = Cli::try_parse_from(std::iter::once("nodegraph").chain(args.iter().copied()))?;
        let mut out = Vec::new();
        execute(cli, &mut out)?;
        Ok(String::from_utf8(out)?)
    }

    #[test]
    fn test_parent_types_compact_by_default() {
        let fx = fixture();
        let out = run(&["--config", &fx.plain_config, "parent-types", &fx.manifest]).unwrap();
        assert_eq!(out, "{\"bool\":\"int\"}\n");
    }

    #[test]
    fn test_pretty_flag_indents() {
        let fx = fixture();
        let out = run(&["--config", &fx.plain_config, "--pretty", "parent-types", &fx.manifest]).unwrap();
        assert_eq!(out, "{\n  \"bool\": \"int\"\n}\n");
    }

    #[test]
    fn test_config_enables_pretty_output() {
        let fx = fixture();
        let out = run(&["--config", &fx.pretty_config, "nodes", &fx.manifest]).unwrap();
        assert!(out.starts_with("{\n  \"is_even\": {"));
    }

    #[test]
    fn test_nodes_payload() {
        let fx = fixture();
        let out = run(&["--config", &fx.plain_config, "nodes", &fx.manifest]).unwrap();
        let payload: serde_json::Value = serde_json::from_str(&out).unwrap();
        assert_eq!(payload["is_even"]["inputs"]["n"]["optional"], false);
        assert_eq!(payload["is_even"]["outputs"]["output"]["type"], "bool");
    }

    #[test]
    fn test_can_connect_command() {
        let fx = fixture();
        let yes = run(&["--config", &fx.plain_config, "can-connect", &fx.manifest, "bool", "int"]).unwrap();
        let no = run(&["--config", &fx.plain_config, "can-connect", &fx.manifest, "int", "bool"]).unwrap();
        assert_eq!(yes, "true\n");
        assert_eq!(no, "false\n");
    }

    #[test]
    fn test_missing_manifest_fails() {
        let fx = fixture();
        let missing = fx.temp.path().join("missing.json");
        let missing = missing.to_string_lossy();
        assert!(run(&["--config", &fx.plain_config, "nodes", &missing]).is_err());
    }

    #[test]
    fn test_default_config_command() {
        let fx = fixture();
        let out = run(&["--config", &fx.plain_config, "default-config"]).unwrap();
        assert!(out.contains("[types]"));
        assert!(out.contains("[output]"));
    }
}
