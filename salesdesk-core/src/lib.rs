pub mod config;
pub mod ids;
pub mod notice;
pub mod offer;
pub mod script;
pub mod transcript;
pub mod types;

// Keep the public surface small and intentional.
pub use config::*;
pub use ids::*;
pub use notice::*;
pub use offer::*;
pub use script::*;
pub use transcript::*;
pub use types::*;
