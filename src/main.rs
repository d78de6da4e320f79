//! html-templating CLI
//!
//! Usage:
//!   html-templating [OPTIONS] <TEMPLATE>
//!
//! Options:
//!   -V, --values <FILE>   Scenario TOML with sub-templates and value frames
//!   -c, --config <FILE>   Engine configuration (TOML format)
//!   -m, --mutations       Print the number of tree mutations per frame to stderr
//!   -v, --verbose         Enable debug logging
//!   -h, --help            Print help

use std::fs;
use std::path::PathBuf;
use std::rc::Rc;

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use html_templating::{Document, Engine, EngineConfig, Invocation, Scenario, Statics};

#[derive(Parser)]
#[command(name = "html-templating")]
#[command(about = "Render a markup template through a sequence of value frames")]
struct Cli {
    /// Template file; `{}` marks a slot, `{{` and `}}` are literal braces
    template: PathBuf,

    /// Scenario file with named sub-templates and value frames (TOML format)
    #[arg(short = 'V', long)]
    values: Option<PathBuf>,

    /// Engine configuration file (TOML format)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the number of tree mutations each frame caused to stderr
    #[arg(short, long)]
    mutations: bool,

    /// Enable debug logging for the engine
    #[arg(short, long)]
    verbose: bool,
}

fn main() {
    let cli = Cli::parse();

    let default_filter = if cli.verbose {
        "html_templating=debug"
    } else {
        "warn"
    };
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default_filter.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Load engine configuration
    let config = match &cli.config {
        Some(path) => match EngineConfig::from_file(path) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => EngineConfig::default(),
    };

    // Read the root template
    let source = match fs::read_to_string(&cli.template) {
        Ok(content) => content,
        Err(e) => {
            eprintln!("Error reading file '{}': {}", cli.template.display(), e);
            std::process::exit(1);
        }
    };
    let statics = Rc::new(Statics::parse(&source));

    // Load value frames
    let scenario = match &cli.values {
        Some(path) => match Scenario::from_file(path) {
            Ok(s) => s,
            Err(e) => {
                eprintln!("Error loading values '{}': {}", path.display(), e);
                std::process::exit(1);
            }
        },
        None => Scenario::default(),
    };
    let frames: Vec<_> = if scenario.frames().is_empty() {
        vec![Vec::new()]
    } else {
        scenario.frames().to_vec()
    };

    let mut engine = match Engine::with_config(config) {
        Ok(engine) => engine,
        Err(e) => {
            eprintln!("Error in engine configuration: {}", e);
            std::process::exit(1);
        }
    };
    let mut doc = Document::new();
    let container = doc.create_element("body");
    doc.observe();

    // Compile up front so errors can point into the root template
    if let Err(e) = engine.compile(&statics) {
        let filename = cli.template.display().to_string();
        eprintln!(
            "{}",
            e.format(&statics.join(&engine.config().marker), &filename)
        );
        std::process::exit(1);
    }

    for (index, values) in frames.into_iter().enumerate() {
        let invocation = Invocation::new(Rc::clone(&statics), values);
        if let Err(e) = engine.render(&mut doc, &invocation, container) {
            eprintln!("Error in frame {}: {}", index + 1, e);
            std::process::exit(1);
        }
        let mutations = doc.take_records().len();
        if cli.mutations {
            eprintln!("frame {}: {} mutations", index + 1, mutations);
        }
        println!("{}", doc.inner_html(container));
    }
}
