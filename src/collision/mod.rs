mod filter;
mod distance_proxy;
mod simplex;
pub mod distance;
mod separation_finder;
mod manifold;
mod clip_list;
mod collide_shapes;
mod world_manifold;
mod dynamic_tree;
mod time_of_impact;
pub mod contact_solver;

pub use self::filter::{should_collide, CollisionGroup, Filter};
pub use self::distance_proxy::{ray_cast_disk, ray_cast_edge, ray_cast_proxy, DistanceProxy};
pub use self::simplex::{IndexPair, Simplex, SimplexCache, SimplexEdge, INVALID_INDEX};
pub use self::distance::{distance, test_overlap, DistanceConf, DistanceOutput, DistanceState};
pub use self::separation_finder::{LengthIndexPair, SeparationFinder, SeparationType};
pub use self::manifold::{ContactFeature, ContactFeatureType, Manifold, ManifoldConf, ManifoldPoint, ManifoldType};
pub use self::clip_list::{clip_segment_to_line, ClipList, ClipVertex};
pub use self::collide_shapes::collide_shapes;
pub use self::world_manifold::WorldManifold;
pub use self::dynamic_tree::{DynamicTree, ProxyId};
pub use self::time_of_impact::{get_toi_via_sat, ToiConf, ToiOutput, ToiState, ToiStats};
pub use self::contact_solver::{ContactImpulses, PositionConstraint, VelocityConstraint};
