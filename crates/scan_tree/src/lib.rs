//! scan_tree - Growing-domain octree and quadtree for laser-scan carving
//!
//! This crate indexes 3D (and 2D) space with an adaptive tree whose domain
//! grows on demand. Callers carve shapes into it (free space along scan
//! rays, samples at scan points, floorplan rooms), and the tree only
//! allocates cells that a shape actually touches.
//!
//! # Features
//!
//! - **Growing domain**: points outside the root wrap it in larger parents
//!   without changing the resolution
//! - **Shape carving**: any [`Shape`] can be inserted (creating cells) or
//!   applied to existing cells with `find`
//! - **Simplification**: agreeing siblings collapse into their parent with
//!   merged statistics
//! - **Traversal**: ordered raytracing, first-hit probes and segment carving
//! - **Proximity**: nearest populated cell and cells within a radius
//! - **Persistence**: a compact little-endian binary format
//!
//! # Example
//!
//! ```ignore
//! use glam::DVec3;
//! use scan_tree::{CarveData, CarveSegment, Octree};
//!
//! let mut tree: Octree<CarveData> = Octree::with_resolution(0.05);
//! let mut ray = CarveSegment::new(DVec3::ZERO, DVec3::new(4.0, 1.0, 0.2), 0.9);
//! tree.insert(&mut ray)?;
//!
//! for data in tree.raytrace(DVec3::ZERO, DVec3::new(4.0, 1.0, 0.2)) {
//!     println!("p = {:.2}", data.probability());
//! }
//! tree.serialize("scan.oct".as_ref())?;
//! ```

mod codec;
pub mod config;
pub mod constants;
pub mod data;
pub mod error;
pub mod node;
pub mod shape;
pub mod space;
pub mod tree;

mod neighbors;
mod raytrace;
mod serialize;
mod verify;

// Re-export commonly used items
pub use config::TreeConfig;
pub use constants::{NO_ROOM, OCTFILE_MAGIC, QUADFILE_MAGIC};
pub use data::{CarveData, LeafData};
pub use error::{TreeError, Violation};
pub use node::{Leaves, Node};
pub use shape::{CarveSegment, LineSegment, PointSample, RoomRegion, Shape};
pub use space::Space;
pub use tree::Tree;

pub use glam::{DVec2, DVec3};

/// Volumetric tree.
pub type Octree<D> = Tree<DVec3, D>;

/// Planar tree.
pub type Quadtree<D> = Tree<DVec2, D>;

pub type OctNode<D> = Node<DVec3, D>;

pub type QuadNode<D> = Node<DVec2, D>;
