//! # Property Graph Model
//!
//! Plain DTOs for the graph the spreading activation runs over.
//! These types cross every boundary: storage ↔ engine ↔ spread graph ↔ user.
//!
//! Design rule: this module is pure data without I/O or locks.

pub mod vertex;
pub mod edge;
pub mod value;
pub mod property_map;

pub use vertex::{Vertex, VertexId};
pub use edge::{Edge, EdgeId, Direction};
pub use value::Value;
pub use property_map::{PropertyMap, props};
