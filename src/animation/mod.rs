pub mod interpolation;
pub mod tweening;

// Re-export commonly used types and functions for convenience
pub use interpolation::{EasingFunction, Interpolation};
pub use tweening::PropertyAnimation;
