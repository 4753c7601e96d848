pub mod identity;
pub mod model_loaders;

pub use identity::require_user;
pub use model_loaders::*;
