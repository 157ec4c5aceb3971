pub mod core;
mod video;

// The video queries hang off Database, so only the types need exporting
pub use self::core::Database;
pub use self::video::{IntensityCount, VideoRow};
