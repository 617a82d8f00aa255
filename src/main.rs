//! Command-line interface for iso20022-xsd

#[cfg(feature = "cli")]
use clap::{Parser, Subcommand};

#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::path::{Path, PathBuf};

#[cfg(feature = "cli")]
use iso20022_xsd::builder::{CodeSetResolver, NoCodeSets, StaticCodeSets};
#[cfg(feature = "cli")]
use iso20022_xsd::{build_model, diff, generate, FileImportResolver, GenOptions, Limits, SchemaModel};

#[cfg(feature = "cli")]
#[derive(Parser, Debug)]
#[command(name = "iso20022-xsd")]
#[command(author, version, about = "ISO 20022 schema inspection, sample generation and version diffing", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[cfg(feature = "cli")]
#[derive(Subcommand, Debug)]
enum Commands {
    /// Inspect an XSD schema and display its constraint model
    Inspect {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Show detailed information about a specific type
        #[arg(short = 't', long)]
        type_name: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Generate conforming sample instances from a schema
    Generate {
        /// Path to the XSD schema file
        #[arg(value_name = "SCHEMA")]
        schema: PathBuf,

        /// Root element to generate from (defaults to the first declared)
        #[arg(short, long)]
        root: Option<String>,

        /// Number of instances to generate
        #[arg(short = 'n', long, default_value_t = 1)]
        count: usize,

        /// RNG seed for reproducible output
        #[arg(short, long, default_value_t = 0)]
        seed: u64,

        /// Probability of xsi:nil on eligible nillable elements
        #[arg(long, default_value_t = 0.0)]
        nil_probability: f64,

        /// Repetition ceiling for unbounded maxOccurs
        #[arg(long, default_value_t = 3)]
        bounded_cap: u32,

        /// Path to an external code set JSON file
        #[arg(long)]
        code_sets: Option<PathBuf>,
    },

    /// Diff two schema versions structurally
    Diff {
        /// Path to the old schema version
        #[arg(value_name = "OLD")]
        old: PathBuf,

        /// Path to the new schema version
        #[arg(value_name = "NEW")]
        new: PathBuf,

        /// Root element to compare from (defaults to the first declared)
        #[arg(short, long)]
        root: Option<String>,

        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Inspect {
            schema,
            type_name,
            json,
        } => cmd_inspect(schema, type_name, json),
        Commands::Generate {
            schema,
            root,
            count,
            seed,
            nil_probability,
            bounded_cap,
            code_sets,
        } => cmd_generate(schema, root, count, seed, nil_probability, bounded_cap, code_sets),
        Commands::Diff {
            old,
            new,
            root,
            json,
        } => cmd_diff(old, new, root, json),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

#[cfg(feature = "cli")]
fn load_model(
    schema_path: &Path,
    code_sets: &dyn CodeSetResolver,
) -> Result<SchemaModel, Box<dyn std::error::Error>> {
    let xsd = fs::read_to_string(schema_path)?;
    let base_dir = schema_path
        .parent()
        .unwrap_or_else(|| Path::new("."))
        .to_path_buf();
    let resolver = FileImportResolver::new(base_dir);
    let model = build_model(&xsd, &resolver, code_sets, &Limits::default())?;
    Ok(model)
}

#[cfg(feature = "cli")]
fn cmd_inspect(
    schema_path: PathBuf,
    type_name: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = load_model(&schema_path, &NoCodeSets)?;

    if let Some(type_name) = type_name {
        let type_node = model
            .types
            .get(&type_name)
            .ok_or_else(|| format!("no such type: '{}'", type_name))?;
        println!("{} ({:?})", type_node.name, type_node.kind);
        if let Some(base) = &type_node.base {
            println!("  base: {:?}", base);
        }
        for kind in iso20022_xsd::FacetKind::ALL {
            if let Some(value) = type_node.facets.value_of(kind) {
                println!("  {}: {}", kind, value);
            }
        }
        return Ok(());
    }

    let summary = model.summary();
    if json_output {
        println!("{}", serde_json::to_string_pretty(&summary)?);
    } else {
        println!("iso20022-xsd v{}", iso20022_xsd::VERSION);
        println!();
        match &summary.target_namespace {
            Some(ns) => println!("Target Namespace: {}", ns),
            None => println!("Target Namespace: (none)"),
        }
        println!("Root Elements: {}", summary.root_elements.join(", "));
        println!("Simple Types: {}", summary.simple_types);
        println!("Complex Types: {}", summary.complex_types);
        for warning in &summary.warnings {
            println!("Warning: {}", warning);
        }
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_generate(
    schema_path: PathBuf,
    root: Option<String>,
    count: usize,
    seed: u64,
    nil_probability: f64,
    bounded_cap: u32,
    code_sets: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    let model = match code_sets {
        Some(path) => {
            let json = fs::read_to_string(path)?;
            let resolver = StaticCodeSets::from_json(&json)?;
            load_model(&schema_path, &resolver)?
        }
        None => load_model(&schema_path, &NoCodeSets)?,
    };

    for warning in &model.warnings {
        eprintln!("Warning: {}", warning);
    }

    let options = GenOptions {
        count,
        seed,
        nil_probability,
        bounded_cap,
        ..Default::default()
    };
    let instances = generate(&model, root.as_deref(), &options)?;
    for instance in &instances {
        println!("{}", instance.to_xml()?);
    }

    Ok(())
}

#[cfg(feature = "cli")]
fn cmd_diff(
    old_path: PathBuf,
    new_path: PathBuf,
    root: Option<String>,
    json_output: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    let old_model = load_model(&old_path, &NoCodeSets)?;
    let new_model = load_model(&new_path, &NoCodeSets)?;

    let records = diff(&old_model, &new_model, root.as_deref());
    if json_output {
        println!("{}", serde_json::to_string_pretty(&records)?);
    } else if records.is_empty() {
        println!("No structural differences");
    } else {
        for record in &records {
            let value_change = match (&record.old, &record.new) {
                (Some(old), Some(new)) => format!(" {} -> {}", old, new),
                (Some(old), None) => format!(" {}", old),
                (None, Some(new)) => format!(" {}", new),
                (None, None) => String::new(),
            };
            let facet = record
                .facet
                .map(|f| format!(" [{}]", f))
                .unwrap_or_default();
            println!(
                "{} {} {}{}{}",
                record.severity,
                record.kind,
                record.path.join("/"),
                facet,
                value_change
            );
        }
    }

    Ok(())
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Rebuild with --features cli");
    std::process::exit(1);
}
