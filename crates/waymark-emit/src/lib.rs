pub mod class;
pub mod manifest;

pub use class::{render_class, EmitOptions};
pub use manifest::{render_manifest, Manifest};
