pub mod error;
pub mod extensions;
pub mod models;

pub mod prelude {
    pub use crate::error::Error;
    pub use crate::extensions::Extension;
    pub use crate::models::*;
}

