//! kf-cli - KF export and inspection tool.

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

use kf_export::kf::{ChunkView, KfReader, Value};
use kf_export::prelude::{ExportOptions, Exporter, MemoryScene};

#[derive(Parser)]
#[command(name = "kf-cli")]
#[command(about = "Export scenes to the KF binary format and inspect KF files")]
struct Cli {
    /// More log output (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Only warnings and errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export a JSON scene description to a KF file
    Export {
        /// Input scene (.json)
        scene: PathBuf,

        /// Output .kf file
        output: PathBuf,

        /// Skip the material list
        #[arg(long)]
        no_materials: bool,

        /// Write world transforms instead of parent-relative ones
        #[arg(long)]
        flatten: bool,

        /// Skip uv mapping chunks
        #[arg(long)]
        no_uvs: bool,

        /// Write skins to a companion file
        #[arg(long)]
        skin: bool,

        /// Suffix appended to the output stem for the skin file
        #[arg(long, default_value = "_skin")]
        skin_suffix: String,
    },

    /// Print the chunk tree with decoded values
    Dump {
        /// Input .kf file
        input: PathBuf,
    },

    /// Print top-level chunk counts and sizes
    Info {
        /// Input .kf file
        input: PathBuf,
    },

    /// Print version and build date
    Version,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose, cli.quiet);

    match cli.command {
        Commands::Export { scene, output, no_materials, flatten, no_uvs, skin, skin_suffix } => {
            let mut options = ExportOptions::new()
                .with_materials(!no_materials)
                .with_hierarchy(!flatten)
                .with_uv_mapping(!no_uvs);
            if skin {
                options = options.with_skin(&skin_suffix);
            }
            cmd_export(&scene, &output, options)
        }
        Commands::Dump { input } => cmd_dump(&input),
        Commands::Info { input } => cmd_info(&input),
        Commands::Version => {
            println!(
                "kf-cli {} (built {} {})",
                env!("CARGO_PKG_VERSION"),
                env!("KF_BUILD_DATE"),
                env!("KF_BUILD_TIME")
            );
            Ok(())
        }
    }
}

fn init_logging(verbose: u8, quiet: bool) {
    let default = match (quiet, verbose) {
        (true, _) => "warn",
        (false, 0) => "info",
        (false, 1) => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default)))
        .with_target(false)
        .init();
}

fn cmd_export(scene_path: &Path, output: &Path, options: ExportOptions) -> Result<()> {
    let scene = MemoryScene::from_json_file(scene_path)
        .with_context(|| format!("Failed to load scene {}", scene_path.display()))?;

    let summary = match Exporter::new(&scene, options).export(output) {
        Ok(summary) => summary,
        Err(e) if e.is_skin_error() => {
            return Err(anyhow::Error::new(e)
                .context(format!("Failed to export skin for {} (retry without --skin)", output.display())));
        }
        Err(e) => return Err(anyhow::Error::new(e).context(format!("Failed to export {}", output.display()))),
    };

    let s = &summary.stats;
    println!("Wrote {}", summary.primary_path.display());
    if let Some(skin_path) = &summary.skin_path {
        println!("Wrote {} ({} skins)", skin_path.display(), s.skins);
    }
    println!(
        "  meshes: {}  materials: {}  submeshes: {}  vertices: {}  triangles: {}",
        s.meshes, s.materials, s.submeshes, s.vertices, s.triangles
    );
    Ok(())
}

fn read_file(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).with_context(|| format!("Failed to read {}", path.display()))
}

fn chunk_label(chunk: &ChunkView<'_>) -> String {
    match chunk.kind() {
        Some(id) => id.name().to_string(),
        None => format!("0x{:04X}", chunk.id),
    }
}

fn cmd_info(path: &Path) -> Result<()> {
    let data = read_file(path)?;
    let chunks = KfReader::new(&data).read_chunks().context("Malformed chunk stream")?;

    println!("{}: {} bytes, {} top-level chunks", path.display(), data.len(), chunks.len());

    let mut rows: Vec<(String, usize, usize)> = Vec::new();
    for chunk in &chunks {
        let label = chunk_label(chunk);
        match rows.iter_mut().find(|(name, _, _)| *name == label) {
            Some(row) => {
                row.1 += 1;
                row.2 += chunk.size();
            }
            None => rows.push((label, 1, chunk.size())),
        }
    }
    for (name, count, bytes) in rows {
        println!("  {:<18} {:>6} x  {:>10} bytes", name, count, bytes);
    }
    Ok(())
}

fn cmd_dump(path: &Path) -> Result<()> {
    let data = read_file(path)?;
    let mut reader = KfReader::new(&data);
    dump_values(&mut reader, 0)
}

fn dump_values(reader: &mut KfReader<'_>, depth: usize) -> Result<()> {
    let indent = "  ".repeat(depth);
    while !reader.is_at_end() {
        let offset = reader.position();
        let value = reader
            .read_value()
            .with_context(|| format!("Bad value at offset {}", offset))?;
        match value {
            Value::Chunk(chunk) => {
                println!(
                    "{}[{}] id=0x{:04X} v{} size={}",
                    indent,
                    chunk_label(&chunk),
                    chunk.id,
                    chunk.version,
                    chunk.size()
                );
                let mut inner = chunk.reader();
                dump_values(&mut inner, depth + 1)?;
            }
            Value::Marker => println!("{}--", indent),
            other => println!("{}{:?}", indent, other),
        }
    }
    Ok(())
}

