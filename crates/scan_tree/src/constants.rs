//! Shared constants for tree geometry and the binary file format.

/// Children per quadtree node (2^2).
pub const QUAD_CHILDREN: usize = 4;

/// Children per octree node (2^3).
pub const OCT_CHILDREN: usize = 8;

/// Length of the magic tag at the start of a tree file.
pub const MAGIC_LEN: usize = 8;

/// File tag for serialized octrees.
pub const OCTFILE_MAGIC: [u8; MAGIC_LEN] = *b"octfile\0";

/// File tag for serialized quadtrees.
pub const QUADFILE_MAGIC: [u8; MAGIC_LEN] = *b"quadfile";

/// Room label meaning "intersects no floorplan room".
pub const NO_ROOM: i32 = -1;

/// Relative tolerance used when checking child geometry against its parent.
///
/// Scaled by the parent's halfwidth, so it holds for any tree size.
pub const GEOMETRY_TOLERANCE: f64 = 1e-9;

/// Deepest tree that is built or parsed.
///
/// 2^512 spans far more than any scan resolution range, and the bound keeps
/// recursive traversal and file parsing within a small stack.
pub const MAX_TREE_DEPTH: i32 = 512;

/// Size in bytes of one serialized `CarveData` record.
///
/// count (u32) + 4 sums (f64) + fp_room (i32) + is_carved (u8)
pub const CARVE_RECORD_LEN: usize = 4 + 4 * 8 + 4 + 1;

#[cfg(test)]
#[path = "constants_test.rs"]
mod constants_test;
