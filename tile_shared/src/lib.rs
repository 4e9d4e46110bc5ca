//! `tile_shared`
//!
//! Shared libraries for the tile-world client and anything that speaks its
//! wire protocol.
//!
//! Design goals:
//! - Value types with plain, deterministic semantics (math, player model).
//! - Sparse sync messages that serialize only what changed.
//! - Traits at the collaborator seams (render surface, image loading).
//! - No `unsafe`.

pub mod config;
pub mod math;
pub mod net;
pub mod player;
pub mod render;
pub mod resources;
pub mod sync;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::math::*;
    pub use crate::player::*;
    pub use crate::sync::*;
}
