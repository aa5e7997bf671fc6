//! Container windows: item layout inside a scaled container sprite,
//! minimize/restore, corpse eye animation, cascading disposal of nested
//! windows and versioned persistence of open windows.

pub mod assets;
pub mod clamp;
pub mod config;
pub mod context;
pub mod definitions;
pub mod error;
pub mod eye;
pub mod gump;
pub mod minimize;
pub mod persist;
pub mod scale;
pub mod text;
pub mod window;
pub mod windows;
pub mod world;
