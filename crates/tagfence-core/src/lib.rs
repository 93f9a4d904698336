pub mod config;
pub mod error;
pub mod observer;
pub mod package;
pub mod policy;
pub mod types;

pub use config::*;
pub use error::*;
pub use observer::*;
pub use package::*;
pub use policy::*;
pub use types::*;
