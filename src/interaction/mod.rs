//! Pointer-driven manipulation of scene entities.

pub mod drag;
