pub use skiff_core::*;
pub use skiff_macros::*;
