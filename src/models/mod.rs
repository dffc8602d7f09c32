pub mod module;
pub mod settings;
pub mod usage;

pub use module::*;
pub use settings::*;
pub use usage::*;
