//! Command-line interface for the quadrille engine
//!
//! Reads a diagram model as JSON and writes the computed layout, the drawing
//! primitives or the detected structural patterns as JSON.

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use std::fs;
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use quadrille::core::logging::init_logging;
use quadrille::patterns::PatternMatch;
use quadrille::{Diagram, DiagramLayout, DrawList, LayoutConfig, LayoutStrategy, Orchestrator};

/// Quadrille - layered layout, orthogonal routing and pattern templates for diagrams
#[derive(Parser)]
#[command(name = "quadrille")]
#[command(about = "Lay out class, state, flow and sequence diagram models")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// JSON file with layout settings; missing fields keep their defaults
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Override the layout strategy from the config file
    #[arg(long, value_enum, global = true)]
    pub strategy: Option<StrategyChoice>,

    /// Set log level (trace|debug|info|warn|error|off)
    #[arg(long, value_enum, default_value_t = LogLevel::Warn, global = true)]
    pub log_level: LogLevel,

    /// Set log format (compact|pretty|json)
    #[arg(long, value_enum, default_value_t = LogFormat::Compact, global = true)]
    pub log_format: LogFormat,
}

/// Log level options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
    Off,
}

impl LogLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
            LogLevel::Off => "off",
        }
    }
}

/// Log format options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum LogFormat {
    Compact,
    Pretty,
    Json,
}

impl LogFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Compact => "compact",
            LogFormat::Pretty => "pretty",
            LogFormat::Json => "json",
        }
    }
}

/// Layout strategy options
#[derive(Copy, Clone, Debug, ValueEnum, PartialEq, Eq)]
pub enum StrategyChoice {
    /// Use a template when a good match covers the whole diagram
    Auto,
    /// Always use layered layout
    Heuristic,
    /// Require a template; fail when none matches
    Pattern,
}

impl From<StrategyChoice> for LayoutStrategy {
    fn from(value: StrategyChoice) -> Self {
        match value {
            StrategyChoice::Auto => LayoutStrategy::Auto,
            StrategyChoice::Heuristic => LayoutStrategy::Heuristic,
            StrategyChoice::Pattern => LayoutStrategy::Pattern,
        }
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Compute node boxes and edge paths
    Layout {
        /// Diagram model JSON (use - or omit for stdin)
        input: Option<PathBuf>,

        /// Output file (use - or omit for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Compute the layout and the drawing primitives
    Render {
        /// Diagram model JSON (use - or omit for stdin)
        input: Option<PathBuf>,

        /// Output file (use - or omit for stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,

        /// Include the layout next to the primitives
        #[arg(long)]
        with_layout: bool,
    },

    /// List the structural patterns found in a diagram
    Patterns {
        /// Diagram model JSON (use - or omit for stdin)
        input: Option<PathBuf>,

        /// Pretty-print the JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// List the registered layout templates
    Templates {
        /// Show in JSON format
        #[arg(long)]
        json: bool,
    },
}

/// `render --with-layout` output
#[derive(Serialize)]
struct RenderOutput<'a> {
    layout: &'a DiagramLayout,
    drawing: &'a DrawList,
}

/// `patterns` output entry
#[derive(Serialize)]
struct DetectedPattern<'a> {
    #[serde(flatten)]
    pattern: &'a PatternMatch,
    /// Whether `auto` would pick this match
    selected: bool,
}

/// Main CLI application
pub struct QuadrilleApp;

impl QuadrilleApp {
    pub fn new() -> Self {
        Self
    }

    /// Run the application with the given CLI arguments
    pub fn run(&self, cli: Cli) -> Result<()> {
        // Environment variables take precedence over flags
        let log_level = std::env::var("QUADRILLE_LOG_LEVEL")
            .ok()
            .or_else(|| std::env::var("RUST_LOG").ok())
            .unwrap_or_else(|| cli.log_level.as_str().to_string());
        let log_format = std::env::var("QUADRILLE_LOG_FORMAT")
            .ok()
            .unwrap_or_else(|| cli.log_format.as_str().to_string());
        if let Err(e) = init_logging(Some(&log_level), Some(&log_format)) {
            eprintln!("Warning: Failed to initialize logging: {}", e);
        }

        if cli.verbose {
            eprintln!("Quadrille v{}", env!("CARGO_PKG_VERSION"));
        }

        let config = self.load_config(cli.config.as_deref(), cli.strategy)?;
        let orchestrator = Orchestrator::with_config(config);

        match cli.command {
            Commands::Layout {
                input,
                output,
                pretty,
            } => self.layout_command(&orchestrator, input, output, pretty, cli.verbose),
            Commands::Render {
                input,
                output,
                pretty,
                with_layout,
            } => self.render_command(&orchestrator, input, output, pretty, with_layout, cli.verbose),
            Commands::Patterns { input, pretty } => self.patterns_command(&orchestrator, input, pretty),
            Commands::Templates { json } => self.templates_command(&orchestrator, json),
        }
    }

    /// Read the config file, if any, and apply the strategy override
    pub fn load_config(&self, path: Option<&Path>, strategy: Option<StrategyChoice>) -> Result<LayoutConfig> {
        let mut config = match path {
            Some(path) => {
                let content = fs::read_to_string(path)
                    .with_context(|| format!("Failed to read config file '{}'", path.display()))?;
                serde_json::from_str::<LayoutConfig>(&content)
                    .with_context(|| format!("Invalid config file '{}'", path.display()))?
            }
            None => LayoutConfig::default(),
        };
        if let Some(strategy) = strategy {
            config.strategy = strategy.into();
        }
        debug!(strategy = ?config.strategy, "Configuration loaded");
        Ok(config)
    }

    fn read_diagram(&self, input: Option<PathBuf>, verbose: bool) -> Result<Diagram> {
        let content = self.read_input(input)?;
        if verbose {
            eprintln!("Read {} bytes of input", content.len());
        }
        let diagram: Diagram = serde_json::from_str(&content).context("Invalid diagram model")?;
        info!(kind = %diagram.kind(), elements = diagram.element_count(), "Diagram loaded");
        Ok(diagram)
    }

    fn layout_command(
        &self,
        orchestrator: &Orchestrator,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        pretty: bool,
        verbose: bool,
    ) -> Result<()> {
        let diagram = self.read_diagram(input, verbose)?;
        let layout = orchestrator.layout(&diagram)?;
        if verbose {
            eprintln!(
                "Laid out {} diagram ({}) at {}x{}",
                diagram.kind(),
                layout.template().unwrap_or("layered"),
                layout.width(),
                layout.height()
            );
        }
        self.write_output(output, &to_json(&layout, pretty)?)
    }

    fn render_command(
        &self,
        orchestrator: &Orchestrator,
        input: Option<PathBuf>,
        output: Option<PathBuf>,
        pretty: bool,
        with_layout: bool,
        verbose: bool,
    ) -> Result<()> {
        let diagram = self.read_diagram(input, verbose)?;
        let mut canvas = DrawList::new();
        let layout = orchestrator.render(&diagram, &mut canvas)?;
        if verbose {
            eprintln!("Rendered {} primitives", canvas.len());
        }
        let json = if with_layout {
            to_json(
                &RenderOutput {
                    layout: &layout,
                    drawing: &canvas,
                },
                pretty,
            )?
        } else {
            to_json(&canvas, pretty)?
        };
        self.write_output(output, &json)
    }

    fn patterns_command(&self, orchestrator: &Orchestrator, input: Option<PathBuf>, pretty: bool) -> Result<()> {
        let diagram = self.read_diagram(input, false)?;
        let matches = orchestrator.detect(&diagram);
        let selected = match orchestrator.layout(&diagram) {
            Ok(layout) => layout.template().map(str::to_string),
            Err(_) => None,
        };
        let entries: Vec<DetectedPattern> = matches
            .iter()
            .map(|pattern| DetectedPattern {
                pattern,
                selected: selected.as_deref() == Some(pattern.template.as_str()),
            })
            .collect();
        self.write_output(None, &to_json(&entries, pretty)?)
    }

    fn templates_command(&self, orchestrator: &Orchestrator, json: bool) -> Result<()> {
        let registry = orchestrator.registry();
        if json {
            let templates: Vec<serde_json::Value> = registry
                .templates()
                .map(|t| {
                    serde_json::json!({
                        "name": t.name,
                        "kind": t.kind,
                        "roles": t.roles().collect::<Vec<_>>(),
                    })
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&templates)?);
        } else {
            println!("Registered templates:");
            for template in registry.templates() {
                println!(
                    "  {:<26} {:<9} {}",
                    template.name,
                    template.kind,
                    template.roles().collect::<Vec<_>>().join(", ")
                );
            }
            println!();
            println!("Total: {} templates", registry.len());
        }
        Ok(())
    }

    /// Read input from file or stdin
    pub fn read_input(&self, input: Option<PathBuf>) -> Result<String> {
        match input {
            Some(path) if path.to_string_lossy() != "-" => fs::read_to_string(&path)
                .map_err(|e| anyhow!("Failed to read input file '{}': {}", path.display(), e)),
            _ => {
                let mut content = String::new();
                io::stdin().read_to_string(&mut content)?;
                Ok(content)
            }
        }
    }

    /// Write output to file or stdout
    pub fn write_output(&self, output: Option<PathBuf>, content: &str) -> Result<()> {
        match output {
            Some(path) if path.to_string_lossy() != "-" => {
                fs::write(&path, content)
                    .map_err(|e| anyhow!("Failed to write output file '{}': {}", path.display(), e))?;
            }
            _ => {
                let mut stdout = io::stdout().lock();
                writeln!(stdout, "{}", content)?;
                stdout.flush()?;
            }
        }
        Ok(())
    }
}

impl Default for QuadrilleApp {
    fn default() -> Self {
        Self::new()
    }
}

fn to_json<T: Serialize + ?Sized>(value: &T, pretty: bool) -> Result<String> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    Ok(json)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    const FLOW: &str = r#"{
        "kind": "flow",
        "nodes": [
            {"id": "D", "label": "ok?", "shape": "decision"},
            {"id": "T", "label": "ship"},
            {"id": "F", "label": "fix"},
            {"id": "M", "label": "done"}
        ],
        "edges": [
            {"from": "D", "to": "T", "label": "yes"},
            {"from": "D", "to": "F", "label": "no"},
            {"from": "T", "to": "M"},
            {"from": "F", "to": "M"}
        ]
    }"#;

    fn cli(args: &[&str]) -> Cli {
        let mut full = vec!["quadrille"];
        full.extend_from_slice(args);
        Cli::try_parse_from(full).unwrap()
    }

    #[test]
    fn test_cli_parsing_layout_command() {
        let cli = cli(&["layout", "diagram.json", "-o", "out.json", "--strategy", "heuristic"]);
        assert_eq!(cli.strategy, Some(StrategyChoice::Heuristic));
        assert_eq!(cli.log_level, LogLevel::Warn);
        match cli.command {
            Commands::Layout {
                input,
                output,
                pretty,
            } => {
                assert_eq!(input.unwrap().to_string_lossy(), "diagram.json");
                assert_eq!(output.unwrap().to_string_lossy(), "out.json");
                assert!(!pretty);
            }
            _ => panic!("Expected Layout command"),
        }
    }

    #[test]
    fn test_cli_parsing_render_command() {
        let cli = cli(&["--log-format", "json", "render", "--with-layout", "--pretty"]);
        assert_eq!(cli.log_format, LogFormat::Json);
        match cli.command {
            Commands::Render {
                input,
                with_layout,
                pretty,
                ..
            } => {
                assert!(input.is_none());
                assert!(with_layout);
                assert!(pretty);
            }
            _ => panic!("Expected Render command"),
        }
    }

    #[test]
    fn test_cli_parsing_rejects_unknown_strategy() {
        assert!(Cli::try_parse_from(["quadrille", "layout", "--strategy", "random"]).is_err());
    }

    #[test]
    fn test_load_config_with_override() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, r#"{"node_sep": 80, "strategy": "pattern", "patterns": {"min_score": 0.9}}"#).unwrap();

        let app = QuadrilleApp::new();
        let config = app.load_config(Some(&path), None).unwrap();
        assert_eq!(config.node_sep, 80);
        assert_eq!(config.strategy, LayoutStrategy::Pattern);
        assert_eq!(config.patterns.min_score, 0.9);
        assert!(config.patterns.require_full_coverage);

        let config = app.load_config(Some(&path), Some(StrategyChoice::Auto)).unwrap();
        assert_eq!(config.strategy, LayoutStrategy::Auto);
    }

    #[test]
    fn test_load_config_reports_bad_file() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        fs::write(&path, "not json").unwrap();
        let err = QuadrilleApp::new().load_config(Some(&path), None).unwrap_err();
        assert!(err.to_string().contains("Invalid config file"));

        let missing = dir.path().join("missing.json");
        assert!(QuadrilleApp::new().load_config(Some(&missing), None).is_err());
    }

    #[test]
    fn test_layout_command_writes_file() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("flow.json");
        let output = dir.path().join("layout.json");
        fs::write(&input, FLOW).unwrap();

        let args = cli(&[
            "layout",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
        ]);
        QuadrilleApp::new().run(args).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["layout"], "pattern");
        assert_eq!(written["template"], "If Else");
    }

    #[test]
    fn test_render_command_with_layout() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("flow.json");
        let output = dir.path().join("drawing.json");
        fs::write(&input, FLOW).unwrap();

        let args = cli(&[
            "render",
            input.to_str().unwrap(),
            "-o",
            output.to_str().unwrap(),
            "--with-layout",
            "--strategy",
            "heuristic",
        ]);
        QuadrilleApp::new().run(args).unwrap();

        let written: serde_json::Value = serde_json::from_str(&fs::read_to_string(&output).unwrap()).unwrap();
        assert_eq!(written["layout"]["layout"], "layered");
        assert!(written["drawing"]["primitives"].as_array().unwrap().len() > 4);
    }

    #[test]
    fn test_invalid_model_is_an_error() {
        let dir = tempdir().unwrap();
        let input = dir.path().join("bad.json");
        fs::write(&input, r#"{"kind": "mindmap"}"#).unwrap();
        let args = cli(&["layout", input.to_str().unwrap()]);
        let err = QuadrilleApp::new().run(args).unwrap_err();
        assert!(err.to_string().contains("Invalid diagram model"));
    }

    #[test]
    fn test_missing_input_file() {
        let result = QuadrilleApp::new().read_input(Some(PathBuf::from("/nonexistent/diagram.json")));
        assert!(result.unwrap_err().to_string().contains("Failed to read input file"));
    }
}
