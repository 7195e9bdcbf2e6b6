//! Resolution: relative import paths, per-file call targets, and cross-file
//! function dependencies.

pub mod calls;
pub mod imports;
pub mod linker;
