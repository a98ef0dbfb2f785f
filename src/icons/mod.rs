//! Icon asset pipeline
//!
//! Turns one source image into the full launcher icon set of an Android
//! project: five density buckets in square and round variants, plus the
//! adaptive icon layers and descriptors.

pub mod adaptive;
mod pipeline;
pub mod render;
mod source;

pub use pipeline::{apply, IconReport};
pub use source::*;
