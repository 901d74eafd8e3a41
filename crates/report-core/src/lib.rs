pub mod error;
pub mod sanitize;
pub mod section;
pub mod table;
pub mod traits;
pub mod ts_code;
pub mod types;

pub use error::*;
pub use sanitize::*;
pub use section::*;
pub use traits::*;
pub use ts_code::*;
pub use types::*;
