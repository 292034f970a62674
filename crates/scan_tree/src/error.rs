//! Error types for tree operations and structural verification.

use thiserror::Error;

/// Errors returned by fallible tree operations.
#[derive(Debug, Error)]
pub enum TreeError {
  /// Underlying read or write failed.
  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),

  /// Stream does not start with the expected file tag.
  #[error("not a tree file: bad magic number")]
  BadMagic,

  /// Stream is truncated or holds values no valid tree can produce.
  #[error("corrupt tree stream: {0}")]
  Corrupt(String),

  /// Header node count disagrees with the parsed structure.
  #[error("header declares {expected} nodes, stream holds {found}")]
  NodeCountMismatch {
    /// Count declared in the header.
    expected: u32,
    /// Count actually parsed.
    found: usize,
  },

  /// Operation needs a root, but no resolution has been set.
  #[error("tree has no root; set a resolution first")]
  Uninitialized,

  /// A point with NaN or infinite coordinates cannot be placed in the domain.
  #[error("point has non-finite coordinates")]
  NonFinitePoint,

  /// Configuration is missing or out of range.
  #[error("invalid configuration: {0}")]
  Config(String),
}

impl TreeError {
  /// Convert an i/o error raised while decoding. Early EOF and undecodable
  /// values are corruption, anything else is a genuine i/o failure.
  pub(crate) fn from_read(err: std::io::Error) -> Self {
    match err.kind() {
      std::io::ErrorKind::UnexpectedEof => TreeError::Corrupt("unexpected end of stream".to_string()),
      std::io::ErrorKind::InvalidData => TreeError::Corrupt(err.to_string()),
      _ => TreeError::Io(err),
    }
  }
}

/// Structural invariant violations reported by `verify`.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum Violation {
  /// Halfwidth is zero, negative, or not finite.
  #[error("node halfwidth {halfwidth} is not a positive finite number")]
  BadHalfwidth {
    /// Offending halfwidth.
    halfwidth: f64,
  },

  /// A leaf below the root carries no data.
  #[error("leaf node carries no data")]
  EmptyLeaf,

  /// A node with children also carries data.
  #[error("internal node carries data")]
  DataOnInternalNode,

  /// Child center does not sit in the octant its index names.
  #[error("child {index} is not centered in its octant")]
  MisplacedChild {
    /// Child slot index.
    index: usize,
  },

  /// Child halfwidth is not half of its parent's.
  #[error("child {index} halfwidth is not half its parent's")]
  ChildHalfwidth {
    /// Child slot index.
    index: usize,
  },

  /// Leaf payload is out of its documented ranges.
  #[error("invalid leaf data: {0}")]
  InvalidData(String),

  /// Tree has a root but a negative max depth.
  #[error("tree has a root but negative max depth {0}")]
  NegativeDepth(i32),
}
