use glam::{DVec2, DVec3};

use crate::constants::{MAX_TREE_DEPTH, OCTFILE_MAGIC};
use crate::data::CarveData;
use crate::error::TreeError;
use crate::shape::{CarveSegment, PointSample};
use crate::tree::Tree;

type Octree = Tree<DVec3, CarveData>;
type Quadtree = Tree<DVec2, CarveData>;

/// Offset of the root's has-data flag: header plus center and halfwidth.
const ROOT_FLAG_OFFSET_3D: usize = 8 + 4 + 4 + 3 * 8 + 8;

fn carved_tree() -> Octree {
  let mut tree = Octree::with_resolution(0.25);
  tree
    .insert(&mut CarveSegment::new(DVec3::ZERO, DVec3::new(2.1, 0.7, -0.4), 0.9))
    .unwrap();
  let mut sample = PointSample::new(DVec3::new(2.1, 0.7, -0.4), 0.1, 0.6, 0.3);
  tree.insert(&mut sample).unwrap();
  tree
}

fn to_bytes<P: crate::space::Space>(tree: &Tree<P, CarveData>) -> Vec<u8> {
  let mut buf = Vec::new();
  tree.write_to(&mut buf).unwrap();
  buf
}

// =========================================================================
// Round trips
// =========================================================================

#[test]
fn test_roundtrip_preserves_structure_and_payload() {
  let tree = carved_tree();
  let bytes = to_bytes(&tree);
  let parsed = Octree::read_from(&mut bytes.as_slice()).unwrap();

  assert_eq!(parsed.max_depth(), tree.max_depth());
  assert_eq!(parsed.num_nodes(), tree.num_nodes());
  assert!(parsed.verify().is_ok(), "Parsed tree verifies");

  let original: Vec<_> = tree.leaves().map(|n| (n.center(), n.halfwidth(), n.data().cloned())).collect();
  let restored: Vec<_> = parsed.leaves().map(|n| (n.center(), n.halfwidth(), n.data().cloned())).collect();
  assert_eq!(original, restored);
  assert_eq!(to_bytes(&parsed), bytes, "Re-serializing is byte-identical");
}

#[test]
fn test_roundtrip_quadtree() {
  let mut tree = Quadtree::with_bounds(DVec2::new(1.0, -1.0), 4.0, 0.5);
  tree
    .insert(&mut PointSample::new(DVec2::new(2.2, 0.3), 0.7, 0.0, 0.0))
    .unwrap();
  let bytes = to_bytes(&tree);
  assert_eq!(&bytes[..8], b"quadfile");

  let parsed = Quadtree::read_from(&mut bytes.as_slice()).unwrap();
  assert_eq!(parsed.num_nodes(), tree.num_nodes());
  assert_eq!(parsed.retrieve(DVec2::new(2.2, 0.3)), tree.retrieve(DVec2::new(2.2, 0.3)));
}

#[test]
fn test_roundtrip_through_file() {
  let tree = carved_tree();
  let path = std::env::temp_dir().join(format!("scan_tree_roundtrip_{}.oct", std::process::id()));
  tree.serialize(&path).unwrap();

  let mut parsed = Octree::new();
  parsed.parse(&path).unwrap();
  let _ = std::fs::remove_file(&path);

  assert_eq!(parsed.num_nodes(), tree.num_nodes());
  assert_eq!(parsed.get_resolution(), tree.get_resolution());
}

#[test]
fn test_header_layout() {
  let tree = carved_tree();
  let bytes = to_bytes(&tree);
  assert_eq!(&bytes[..8], b"octfile\0");
  assert_eq!(&bytes[8..12], &tree.max_depth().to_le_bytes());
  assert_eq!(&bytes[12..16], &(tree.num_nodes() as u32).to_le_bytes());
}

#[test]
fn test_single_leaf_root() {
  let tree = Octree::with_resolution(1.0);
  let bytes = to_bytes(&tree);
  assert_eq!(bytes.len(), ROOT_FLAG_OFFSET_3D + 1 + 8, "Header, geometry, data flag, 8 child flags");
  let parsed = Octree::read_from(&mut bytes.as_slice()).unwrap();
  assert!(parsed.root().unwrap().is_empty());
}

// =========================================================================
// Failures
// =========================================================================

#[test]
fn test_uninitialized_tree_cannot_be_written() {
  let mut buf = Vec::new();
  let err = Octree::new().write_to(&mut buf).unwrap_err();
  assert!(matches!(err, TreeError::Uninitialized));
  assert!(buf.is_empty());
}

#[test]
fn test_bad_magic() {
  let mut bytes = to_bytes(&carved_tree());
  bytes[0] = b'x';
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::BadMagic)));

  let quad = to_bytes(&Quadtree::with_resolution(1.0));
  assert!(
    matches!(Octree::read_from(&mut quad.as_slice()), Err(TreeError::BadMagic)),
    "Quadtree files are not octree files"
  );
}

#[test]
fn test_truncated_stream() {
  let bytes = to_bytes(&carved_tree());
  for cut in [4, 14, 30, bytes.len() / 2, bytes.len() - 1] {
    let result = Octree::read_from(&mut &bytes[..cut]);
    assert!(
      matches!(result, Err(TreeError::Corrupt(_))),
      "Cut at {} should be corrupt, got {:?}",
      cut,
      result.map(|t| t.num_nodes())
    );
  }
}

#[test]
fn test_invalid_flag_byte() {
  let mut bytes = to_bytes(&carved_tree());
  bytes[ROOT_FLAG_OFFSET_3D] = 7;
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))));
}

#[test]
fn test_node_count_mismatch() {
  let tree = carved_tree();
  let mut bytes = to_bytes(&tree);
  bytes[12..16].copy_from_slice(&999u32.to_le_bytes());
  match Octree::read_from(&mut bytes.as_slice()) {
    Err(TreeError::NodeCountMismatch { expected, found }) => {
      assert_eq!(expected, 999);
      assert_eq!(found, tree.num_nodes());
    }
    other => panic!("Expected count mismatch, got {:?}", other.map(|t| t.num_nodes())),
  }
}

#[test]
fn test_nesting_deeper_than_max_depth() {
  let mut bytes = to_bytes(&carved_tree());
  bytes[8..12].copy_from_slice(&1i32.to_le_bytes());
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))));

  bytes[8..12].copy_from_slice(&(-2i32).to_le_bytes());
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))));
}

/// Octree stream of a single chain of `len` nodes down child 0, with the
/// halfwidth of each node given by `halfwidth(level)`.
fn chain_stream(max_depth: i32, len: usize, halfwidth: impl Fn(usize) -> f64) -> Vec<u8> {
  let mut bytes = OCTFILE_MAGIC.to_vec();
  bytes.extend_from_slice(&max_depth.to_le_bytes());
  bytes.extend_from_slice(&(len as u32).to_le_bytes());
  for level in 0..len {
    for _ in 0..3 {
      bytes.extend_from_slice(&0f64.to_le_bytes());
    }
    bytes.extend_from_slice(&halfwidth(level).to_le_bytes());
    bytes.push(0);
    if level + 1 < len {
      bytes.push(1);
    }
  }
  bytes.extend_from_slice(&[0; 8]);
  bytes.extend(std::iter::repeat(0).take(7 * len.saturating_sub(1)));
  bytes
}

#[test]
fn test_chain_stream_parses() {
  let bytes = chain_stream(3, 4, |level| 0.5f64.powi(level as i32));
  let tree = Octree::read_from(&mut bytes.as_slice()).unwrap();
  assert_eq!(tree.num_nodes(), 4);
  assert_eq!(tree.max_depth(), 3);
}

#[test]
fn test_header_depth_beyond_cap() {
  let bytes = chain_stream(i32::MAX, 2, |level| 0.5f64.powi(level as i32));
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))));

  let bytes = chain_stream(MAX_TREE_DEPTH + 1, 2, |level| 0.5f64.powi(level as i32));
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))));
}

#[test]
fn test_deep_chain_is_rejected_without_overflow() {
  let len = MAX_TREE_DEPTH as usize + 100;
  let bytes = chain_stream(MAX_TREE_DEPTH, len, |level| 1e100 * 0.5f64.powi(level as i32));
  let result = Octree::read_from(&mut bytes.as_slice());
  assert!(matches!(result, Err(TreeError::Corrupt(_))), "Nesting past the cap is corrupt");
}

#[test]
fn test_child_halfwidth_must_halve() {
  let bytes = chain_stream(2, 2, |level| if level == 0 { 1.0 } else { 0.75 });
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))));

  let bytes = chain_stream(2, 1, |_| -1.0);
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))), "Negative root");

  let bytes = chain_stream(2, 1, |_| f64::NAN);
  assert!(matches!(Octree::read_from(&mut bytes.as_slice()), Err(TreeError::Corrupt(_))), "NaN root");
}

#[test]
fn test_failed_parse_leaves_tree_untouched() {
  let path = std::env::temp_dir().join(format!("scan_tree_garbage_{}.oct", std::process::id()));
  std::fs::write(&path, b"not a tree at all").unwrap();

  let mut tree = carved_tree();
  let before = tree.num_nodes();
  assert!(tree.parse(&path).is_err());
  let _ = std::fs::remove_file(&path);

  assert_eq!(tree.num_nodes(), before);
  assert!(matches!(
    tree.parse(std::path::Path::new("/nonexistent/tree.oct")),
    Err(TreeError::Io(_))
  ));
  assert_eq!(tree.num_nodes(), before);
}
