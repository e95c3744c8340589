mod shape;
mod mass;
mod disk;
mod edge;
mod polygon;
mod chain;

pub use self::shape::{Shape, Geometry};
pub use self::mass::MassData;
pub use self::disk::DiskShape;
pub use self::edge::EdgeShape;
pub use self::polygon::PolygonShape;
pub use self::chain::ChainShape;
