//! NX CLI - Command-line tool for inspecting NX container files.
//!
//! This is the main entry point for the `nx` command-line application.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use nx_reader::{LoadOptions, Node, NodeStrategy, NodeType, NxFile};

/// nx - NX container inspection and extraction tool
#[derive(Parser)]
#[command(name = "nx")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Decode node records one field at a time instead of in bulk
    #[arg(long, global = true)]
    field_by_field: bool,

    /// Replace invalid UTF-8 in the string table instead of failing
    #[arg(long, global = true)]
    lossy_strings: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show header information
    Info {
        /// Path to the NX file
        #[arg(short, long, env = "NX_FILE")]
        input: PathBuf,
    },

    /// Print the value of the node at a path
    Get {
        /// Path to the NX file
        #[arg(short, long, env = "NX_FILE")]
        input: PathBuf,

        /// Node path, e.g. `Mob/0100100.img/info/level`
        path: String,
    },

    /// List the children of a node
    Ls {
        /// Path to the NX file
        #[arg(short, long, env = "NX_FILE")]
        input: PathBuf,

        /// Node path (defaults to the root)
        #[arg(default_value = "")]
        path: String,
    },

    /// Print the subtree under a node
    Tree {
        /// Path to the NX file
        #[arg(short, long, env = "NX_FILE")]
        input: PathBuf,

        /// Node path (defaults to the root)
        #[arg(default_value = "")]
        path: String,

        /// Maximum depth to descend
        #[arg(short, long, default_value_t = 2)]
        depth: usize,
    },

    /// Extract bitmap or audio blobs under a node
    Extract {
        /// Path to the NX file
        #[arg(short, long, env = "NX_FILE")]
        input: PathBuf,

        /// Output directory
        #[arg(short, long, env = "OUTPUT_FOLDER")]
        output: PathBuf,

        /// Node path (defaults to the root)
        #[arg(default_value = "")]
        path: String,

        /// Which blobs to extract
        #[arg(short, long, value_enum, default_value_t = BlobKind::All)]
        kind: BlobKind,
    },
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum BlobKind {
    Bitmap,
    Audio,
    All,
}

impl BlobKind {
    fn matches(self, node_type: NodeType) -> bool {
        match self {
            Self::Bitmap => node_type == NodeType::Bitmap,
            Self::Audio => node_type == NodeType::Audio,
            Self::All => matches!(node_type, NodeType::Bitmap | NodeType::Audio),
        }
    }
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    let mut options = LoadOptions::new().lossy_strings(cli.lossy_strings);
    if cli.field_by_field {
        options = options.node_strategy(NodeStrategy::FieldByField);
    }

    match cli.command {
        Commands::Info { input } => cmd_info(&input, options)?,
        Commands::Get { input, path } => cmd_get(&input, &path, options)?,
        Commands::Ls { input, path } => cmd_ls(&input, &path, options)?,
        Commands::Tree { input, path, depth } => cmd_tree(&input, &path, depth, options)?,
        Commands::Extract {
            input,
            output,
            path,
            kind,
        } => cmd_extract(&input, &output, &path, kind, options)?,
    }

    Ok(())
}

fn init_tracing(verbose: u8) {
    let default = match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(input: &Path, options: LoadOptions) -> Result<NxFile> {
    let start = Instant::now();
    let nx = NxFile::open_with(input, options)
        .with_context(|| format!("Failed to load NX file {}", input.display()))?;
    tracing::info!(elapsed = ?start.elapsed(), "loaded {}", input.display());
    Ok(nx)
}

/// Resolve a path, treating an empty path or `/` as the root.
fn resolve<'a>(nx: &'a NxFile, path: &str) -> Result<&'a Node> {
    let node = if path.trim_start_matches('/').is_empty() {
        nx.root()
    } else {
        nx.find(path)
    };
    node.with_context(|| format!("Node not found: {path}"))
}

fn cmd_info(input: &Path, options: LoadOptions) -> Result<()> {
    let start = Instant::now();
    let nx = load(input, options)?;
    let header = nx.header();

    println!("File:     {}", input.display());
    println!("Loaded in {:?}", start.elapsed());
    for (label, location) in [
        ("Nodes", header.nodes()),
        ("Strings", header.strings()),
        ("Bitmaps", header.bitmaps()),
        ("Audio", header.audio()),
    ] {
        println!(
            "{:<9} {:>10} @ 0x{:X}",
            format!("{label}:"),
            location.count,
            location.offset
        );
    }

    Ok(())
}

fn cmd_get(input: &Path, path: &str, options: LoadOptions) -> Result<()> {
    let nx = load(input, options)?;
    let node = resolve(&nx, path)?;
    let value = nx.value(node).context("Failed to decode node value")?;

    println!("{value}");

    Ok(())
}

fn cmd_ls(input: &Path, path: &str, options: LoadOptions) -> Result<()> {
    let nx = load(input, options)?;
    let node = resolve(&nx, path)?;

    let mut count = 0;
    for child in nx.children(node) {
        println!("{}", describe(&nx, child));
        count += 1;
    }

    println!("\nTotal: {} children", count);

    Ok(())
}

fn cmd_tree(input: &Path, path: &str, depth: usize, options: LoadOptions) -> Result<()> {
    let nx = load(input, options)?;
    let node = resolve(&nx, path)?;

    println!("{}", describe(&nx, node));
    print_tree(&nx, node, 1, depth);

    Ok(())
}

fn print_tree(nx: &NxFile, node: &Node, level: usize, max_depth: usize) {
    if level > max_depth {
        return;
    }
    for child in nx.children(node) {
        println!("{}{}", "  ".repeat(level), describe(nx, child));
        print_tree(nx, child, level + 1, max_depth);
    }
}

/// One-line summary: name, type, and value or child count.
fn describe(nx: &NxFile, node: &Node) -> String {
    let name = nx.name(node).unwrap_or("?");
    let detail = match nx.value(node) {
        Ok(nx_reader::NodeValue::Empty) => format!("[{} children]", node.child_count()),
        Ok(value) => value.to_string(),
        Err(e) => format!("<{e}>"),
    };
    format!("{name} ({}) {detail}", node.node_type())
}

fn cmd_extract(
    input: &Path,
    output: &Path,
    path: &str,
    kind: BlobKind,
    options: LoadOptions,
) -> Result<()> {
    let nx = load(input, options)?;
    let root = resolve(&nx, path)?;

    let targets = collect_targets(&nx, root, kind, path)?;

    println!("Extracting {} blobs...", targets.len());

    let pb = ProgressBar::new(targets.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
            .progress_chars("#>-"),
    );

    fs::create_dir_all(output)?;

    let start = Instant::now();
    let mut failed = 0;
    for (node, rel) in &targets {
        let data = match node.node_type() {
            NodeType::Bitmap => nx.resolve_bitmap(node).map(|b| b.data),
            _ => nx.resolve_audio(node),
        };

        match data {
            Ok(data) => {
                let output_path = output.join(rel);
                if let Some(parent) = output_path.parent() {
                    fs::create_dir_all(parent)?;
                }
                fs::write(&output_path, data)
                    .with_context(|| format!("Failed to write {}", output_path.display()))?;
            }
            Err(e) => {
                tracing::warn!(path = %rel.display(), error = %e, "skipping blob");
                failed += 1;
            }
        }

        pb.inc(1);
    }

    pb.finish_with_message("Done");
    println!(
        "Extraction completed in {:?} ({} skipped)",
        start.elapsed(),
        failed
    );

    Ok(())
}

/// Walk the subtree under `root` and pair every matching blob node with a
/// relative output file path.
///
/// Paths are unique: when sibling names collide, later nodes in traversal
/// order get a numeric suffix before the extension.
fn collect_targets<'a>(
    nx: &'a NxFile,
    root: &'a Node,
    kind: BlobKind,
    path: &str,
) -> Result<Vec<(&'a Node, PathBuf)>> {
    let mut targets = Vec::new();
    let mut used = HashSet::new();
    let mut stack = vec![(root, PathBuf::new())];
    let mut visited = 0usize;
    while let Some((node, rel)) = stack.pop() {
        visited += 1;
        if visited > nx.nodes().len() {
            anyhow::bail!("Node tree under {path:?} contains a cycle");
        }
        for child in nx.children(node) {
            let name = file_component(nx.name(child).unwrap_or("_"));
            if kind.matches(child.node_type()) {
                let extension = match child.node_type() {
                    NodeType::Bitmap => "bitmap",
                    _ => "audio",
                };
                targets.push((child, unique_path(&mut used, &rel, &name, extension)));
            }
            stack.push((child, rel.join(name)));
        }
    }
    Ok(targets)
}

/// First of `name.ext`, `name.1.ext`, `name.2.ext`, ... under `dir` not yet
/// in `used`.
fn unique_path(used: &mut HashSet<PathBuf>, dir: &Path, name: &str, extension: &str) -> PathBuf {
    let mut candidate = dir.join(format!("{name}.{extension}"));
    let mut suffix = 1u32;
    while !used.insert(candidate.clone()) {
        candidate = dir.join(format!("{name}.{suffix}.{extension}"));
        suffix += 1;
    }
    candidate
}

/// Make a node name safe to use as a single path component.
fn file_component(name: &str) -> String {
    match name {
        "" | "." | ".." => "_".to_string(),
        _ => name.replace(['/', '\\'], "_"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Assemble an NX image from `(name_id, child_start, child_count, tag, payload)`
    /// records, a string table and a bitmap table. The audio table is empty.
    fn image(
        nodes: &[(u32, u32, u16, u16, [u8; 8])],
        strings: &[&str],
        bitmaps: &[&[u8]],
    ) -> Vec<u8> {
        let node_offset = 52u64;
        let string_table = node_offset + 20 * nodes.len() as u64;
        let string_data = string_table + 8 * strings.len() as u64;
        let string_len: u64 = strings.iter().map(|s| 2 + s.len() as u64).sum();
        let bitmap_table = string_data + string_len;
        let bitmap_data = bitmap_table + 8 * bitmaps.len() as u64;
        let bitmap_len: u64 = bitmaps.iter().map(|b| 2 + b.len() as u64).sum();
        let end = bitmap_data + bitmap_len;

        let mut out = Vec::new();
        out.extend_from_slice(b"PKG4");
        for (count, offset) in [
            (nodes.len(), node_offset),
            (strings.len(), string_table),
            (bitmaps.len(), bitmap_table),
            (0, end),
        ] {
            out.extend_from_slice(&(count as u32).to_le_bytes());
            out.extend_from_slice(&(offset as i64).to_le_bytes());
        }

        for &(name_id, child_start, child_count, tag, payload) in nodes {
            out.extend_from_slice(&name_id.to_le_bytes());
            out.extend_from_slice(&child_start.to_le_bytes());
            out.extend_from_slice(&child_count.to_le_bytes());
            out.extend_from_slice(&tag.to_le_bytes());
            out.extend_from_slice(&payload);
        }

        let blobs: Vec<&[u8]> = strings.iter().map(|s| s.as_bytes()).collect();
        for (table, data, entries) in [
            (string_table, string_data, &blobs[..]),
            (bitmap_table, bitmap_data, bitmaps),
        ] {
            assert_eq!(out.len() as u64, table);
            let mut offset = data;
            for entry in entries {
                out.extend_from_slice(&(offset as i64).to_le_bytes());
                offset += 2 + entry.len() as u64;
            }
            for entry in entries {
                out.extend_from_slice(&(entry.len() as u16).to_le_bytes());
                out.extend_from_slice(entry);
            }
        }

        assert_eq!(out.len() as u64, end);
        out
    }

    fn bitmap_payload(id: u32) -> [u8; 8] {
        let mut payload = [0u8; 8];
        payload[..4].copy_from_slice(&id.to_le_bytes());
        payload
    }

    /// root -> [x (bitmap 0), x (bitmap 1)]
    fn duplicate_siblings() -> Vec<u8> {
        let bitmap = NodeType::Bitmap.tag();
        image(
            &[
                (0, 1, 2, 0, [0; 8]),
                (1, 0, 0, bitmap, bitmap_payload(0)),
                (1, 0, 0, bitmap, bitmap_payload(1)),
            ],
            &["", "x"],
            &[&[1], &[2]],
        )
    }

    #[test]
    fn test_unique_path_suffixes_collisions() {
        let mut used = HashSet::new();
        let dir = Path::new("img");

        assert_eq!(unique_path(&mut used, dir, "x", "bitmap"), dir.join("x.bitmap"));
        assert_eq!(unique_path(&mut used, dir, "x", "bitmap"), dir.join("x.1.bitmap"));
        assert_eq!(unique_path(&mut used, dir, "x", "audio"), dir.join("x.audio"));
        assert_eq!(unique_path(&mut used, dir, "x", "bitmap"), dir.join("x.2.bitmap"));
    }

    #[test]
    fn test_collect_targets_duplicate_names() {
        let nx = NxFile::parse(&duplicate_siblings()).unwrap();
        let root = nx.root().unwrap();
        let targets = collect_targets(&nx, root, BlobKind::All, "").unwrap();

        let paths: Vec<_> = targets.iter().map(|(_, rel)| rel.clone()).collect();
        assert_eq!(paths, vec![PathBuf::from("x.bitmap"), PathBuf::from("x.1.bitmap")]);

        assert!(collect_targets(&nx, root, BlobKind::Audio, "").unwrap().is_empty());
    }

    #[test]
    fn test_extract_keeps_duplicate_sibling_blobs() {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("sample.nx");
        let output = dir.path().join("out");
        fs::write(&input, duplicate_siblings()).unwrap();

        cmd_extract(&input, &output, "", BlobKind::All, LoadOptions::new()).unwrap();

        assert_eq!(fs::read(output.join("x.bitmap")).unwrap(), vec![1]);
        assert_eq!(fs::read(output.join("x.1.bitmap")).unwrap(), vec![2]);
    }
}
