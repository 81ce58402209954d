//! `skyfx_shared`
//!
//! Shared libraries used by the application shell and its tools.
//!
//! Design goals:
//! - Deterministic and modular where practical.
//! - Clear separation of concerns (math, events, config, collaborators).
//! - Traits for the external collaborators (renderer, window, frame clock).
//! - No `unsafe`.

pub mod config;
pub mod error;
pub mod event;
pub mod math;
pub mod render;
pub mod timing;
pub mod window;

pub mod prelude {
    //! Commonly used exports.

    pub use crate::config::*;
    pub use crate::error::*;
    pub use crate::event::*;
    pub use crate::math::*;
    pub use crate::render::*;
    pub use crate::timing::*;
    pub use crate::window::*;
}
