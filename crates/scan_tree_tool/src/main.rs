//! Scan tree inspector.
//!
//! Reads serialized octree (or, with `--2d`, quadtree) files of carving
//! data and reports on, verifies, simplifies or filters them.

mod config;

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use glam::{DVec2, DVec3};
use scan_tree::{CarveData, LeafData, Space, Tree};

use config::ToolConfig;

/// Inspect and maintain serialized scan trees.
#[derive(Parser, Debug)]
#[command(name = "scan_tree")]
#[command(about = "Inspect, verify, simplify and filter scan tree files")]
struct Args {
  /// Path to a tool configuration TOML file.
  #[arg(short, long, global = true)]
  config: Option<PathBuf>,

  #[command(subcommand)]
  command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
  /// Print depth, resolution, geometry and counts.
  Info {
    file: PathBuf,
    /// Read a quadtree instead of an octree.
    #[arg(long = "2d")]
    planar: bool,
  },
  /// Check structural invariants; exits non-zero on a violation.
  Verify {
    file: PathBuf,
    #[arg(long = "2d")]
    planar: bool,
  },
  /// Collapse agreeing siblings and write the result.
  Simplify {
    input: PathBuf,
    output: PathBuf,
    #[arg(long = "2d")]
    planar: bool,
  },
  /// Drop leaves with too few samples (or exterior leaves) and write the
  /// result.
  Filter {
    input: PathBuf,
    output: PathBuf,
    /// Minimum sample count a leaf must hold to survive.
    #[arg(long, default_value_t = 1)]
    min_samples: u32,
    /// Also drop leaves classified as exterior.
    #[arg(long)]
    interior_only: bool,
    #[arg(long = "2d")]
    planar: bool,
  },
}

fn main() -> Result<()> {
  let args = Args::parse();

  let config = match &args.config {
    Some(path) => {
      println!("Loading config from: {}", path.display());
      ToolConfig::load(path)?
    }
    None => ToolConfig::default(),
  };

  match args.command {
    Command::Info { file, planar } => {
      if planar {
        info::<DVec2>(&file, &config)
      } else {
        info::<DVec3>(&file, &config)
      }
    }
    Command::Verify { file, planar } => {
      if planar {
        verify::<DVec2>(&file)
      } else {
        verify::<DVec3>(&file)
      }
    }
    Command::Simplify {
      input,
      output,
      planar,
    } => {
      if planar {
        simplify::<DVec2>(&input, &output, &config)
      } else {
        simplify::<DVec3>(&input, &output, &config)
      }
    }
    Command::Filter {
      input,
      output,
      min_samples,
      interior_only,
      planar,
    } => {
      let keep = move |data: &CarveData| {
        data.count() >= min_samples && (!interior_only || data.is_interior())
      };
      if planar {
        filter::<DVec2, _>(&input, &output, keep, &config)
      } else {
        filter::<DVec3, _>(&input, &output, keep, &config)
      }
    }
  }
}

/// Read a tree file, verifying it when configured to.
fn load<P: Space>(path: &Path, config: &ToolConfig) -> Result<Tree<P, CarveData>> {
  let mut tree = Tree::new();
  tree
    .parse(path)
    .with_context(|| format!("Failed to read tree: {}", path.display()))?;
  if config.verify_on_load {
    tree
      .verify()
      .with_context(|| format!("Tree failed verification: {}", path.display()))?;
  }
  Ok(tree)
}

fn save<P: Space>(tree: &mut Tree<P, CarveData>, path: &Path, config: &ToolConfig) -> Result<()> {
  if config.simplify {
    tree.simplify();
  }
  tree
    .serialize(path)
    .with_context(|| format!("Failed to write tree: {}", path.display()))?;
  println!("Wrote {} nodes to {}", tree.num_nodes(), path.display());
  Ok(())
}

fn info<P: Space>(path: &Path, config: &ToolConfig) -> Result<()> {
  // report on broken trees instead of refusing them
  let config = ToolConfig {
    verify_on_load: false,
    ..config.clone()
  };
  let tree = load::<P>(path, &config)?;

  println!("File: {}", path.display());
  println!("Dimensions: {}", P::DIM);
  println!("Max depth: {}", tree.max_depth());
  if let Some(resolution) = tree.get_resolution() {
    println!("Resolution: {}", resolution);
  }
  if let Some(root) = tree.root() {
    println!("Root center: {:?}", root.center());
    println!("Root halfwidth: {}", root.halfwidth());
  }
  println!("Nodes: {}", tree.num_nodes());
  println!("Leaves: {}", tree.num_leaves());

  let mut populated = 0;
  let mut interior = 0;
  let mut carved = 0;
  let mut samples = 0u64;
  for leaf in tree.leaves() {
    let Some(data) = leaf.data() else { continue };
    populated += 1;
    samples += u64::from(data.count());
    if data.is_interior() {
      interior += 1;
    }
    if data.is_carved() {
      carved += 1;
    }
  }
  println!("Populated leaves: {} ({} interior, {} carved)", populated, interior, carved);
  println!("Samples: {}", samples);

  match tree.verify() {
    Ok(()) => println!("Verify: ok"),
    Err(violation) => println!("Verify: FAILED ({})", violation),
  }
  Ok(())
}

fn verify<P: Space>(path: &Path) -> Result<()> {
  let config = ToolConfig {
    verify_on_load: false,
    ..ToolConfig::default()
  };
  let tree = load::<P>(path, &config)?;
  if let Err(violation) = tree.verify() {
    bail!("{}: {}", path.display(), violation);
  }
  println!("{}: ok ({} nodes)", path.display(), tree.num_nodes());
  Ok(())
}

fn simplify<P: Space>(input: &Path, output: &Path, config: &ToolConfig) -> Result<()> {
  let mut tree = load::<P>(input, config)?;
  let before = tree.num_nodes();
  tree.simplify();
  println!("Simplified {} -> {} nodes", before, tree.num_nodes());
  save(&mut tree, output, config)
}

fn filter<P: Space, F: FnMut(&CarveData) -> bool>(
  input: &Path,
  output: &Path,
  keep: F,
  config: &ToolConfig,
) -> Result<()> {
  let mut tree = load::<P>(input, config)?;
  let removed = tree.filter(keep);
  println!("Removed {} leaves", removed);
  save(&mut tree, output, config)
}
