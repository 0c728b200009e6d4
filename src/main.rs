//! brlyt CLI - decode, edit and re-encode BRLYT layout files.
//!
//! This is the main entry point for the brlyt command-line application.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use tracing::Level;

use brlyt_layout::{Layout, Node};

/// brlyt - BRLYT layout decoder and encoder
#[derive(Parser)]
#[command(name = "brlyt")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Decode a BRLYT file to an XML or JSON document
    Decode {
        /// Input BRLYT file
        #[arg(short, long, env = "BRLYT_INPUT")]
        input: PathBuf,

        /// Output document
        #[arg(short, long, env = "BRLYT_OUTPUT")]
        output: PathBuf,

        /// Document format
        #[arg(short, long, value_enum, default_value_t = Format::Xml)]
        format: Format,
    },

    /// Encode an XML or JSON document to a BRLYT file
    Encode {
        /// Input document
        #[arg(short, long, env = "BRLYT_INPUT")]
        input: PathBuf,

        /// Output BRLYT file
        #[arg(short, long, env = "BRLYT_OUTPUT")]
        output: PathBuf,

        /// Document format (detected from the file extension when omitted)
        #[arg(short, long, value_enum)]
        format: Option<Format>,
    },

    /// Decode and re-encode a BRLYT file, checking that the bytes are unchanged
    Verify {
        /// Input BRLYT file
        #[arg(short, long, env = "BRLYT_INPUT")]
        input: PathBuf,

        /// Print the decoded tree
        #[arg(short, long)]
        tree: bool,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Xml,
    Json,
}

impl Format {
    fn from_path(path: &Path) -> Self {
        match path.extension().and_then(|e| e.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Format::Json,
            _ => Format::Xml,
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => Level::WARN,
        1 => Level::INFO,
        2 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Decode {
            input,
            output,
            format,
        } => {
            cmd_decode(&input, &output, format)?;
        }
        Commands::Encode {
            input,
            output,
            format,
        } => {
            let format = format.unwrap_or_else(|| Format::from_path(&input));
            cmd_encode(&input, &output, format)?;
        }
        Commands::Verify { input, tree } => {
            cmd_verify(&input, tree)?;
        }
    }

    Ok(())
}

fn cmd_decode(input: &Path, output: &Path, format: Format) -> Result<()> {
    println!("Decoding: {} -> {}", input.display(), output.display());

    let start = Instant::now();
    let layout = Layout::open(input).context("Failed to decode BRLYT file")?;
    println!(
        "Loaded in {:?}: {} nodes, {} materials",
        start.elapsed(),
        layout.node_count(),
        layout.materials.len()
    );

    let document = match format {
        Format::Xml => layout.to_xml_string().context("Failed to convert to XML")?,
        Format::Json => layout.to_json().context("Failed to convert to JSON")?,
    };
    fs::write(output, document).context("Failed to write output file")?;

    println!("Conversion complete");
    Ok(())
}

fn cmd_encode(input: &Path, output: &Path, format: Format) -> Result<()> {
    println!("Encoding: {} -> {}", input.display(), output.display());

    let document = fs::read_to_string(input).context("Failed to read input document")?;
    let layout = match format {
        Format::Xml => Layout::from_xml(&document).context("Failed to parse XML document")?,
        Format::Json => Layout::from_json(&document).context("Failed to parse JSON document")?,
    };

    let bytes = layout.to_bytes().context("Failed to encode layout")?;
    fs::write(output, &bytes).context("Failed to write output file")?;

    println!("Wrote {} bytes", bytes.len());
    Ok(())
}

fn cmd_verify(input: &Path, show_tree: bool) -> Result<()> {
    println!("Verifying: {}", input.display());

    let data = fs::read(input).context("Failed to read input file")?;
    let layout = Layout::parse(&data).context("Failed to decode BRLYT file")?;

    if show_tree {
        print_node_line(0, "pan1", &layout.root_pane.properties.name);
        print_tree(&layout.root_pane.children, 1);
        if let Some(group) = &layout.root_group {
            print_node_line(0, "grp1", &group.name);
            print_tree(&group.children, 1);
        }
    }

    let encoded = layout.to_bytes().context("Failed to re-encode layout")?;
    if encoded == data {
        println!("OK: {} bytes re-encode identically", data.len());
        return Ok(());
    }

    let first_difference = data
        .iter()
        .zip(&encoded)
        .position(|(a, b)| a != b)
        .unwrap_or(data.len().min(encoded.len()));
    anyhow::bail!(
        "re-encoded file differs at byte {:#x} (input {} bytes, re-encoded {} bytes)",
        first_difference,
        data.len(),
        encoded.len()
    )
}

fn print_tree(nodes: &[Node], depth: usize) {
    for node in nodes {
        print_node_line(depth, &node.kind().to_string(), node.name());
        print_tree(node.children(), depth + 1);
    }
}

fn print_node_line(depth: usize, kind: &str, name: &str) {
    println!("{}{} {}", "  ".repeat(depth), kind, name);
}
