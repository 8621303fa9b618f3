pub mod editing;
pub mod io;
pub mod markup;


// Re-export key types for easier usage
pub use editing::*;
pub use io::*;
pub use markup::{MarkupError, MarkupOptions};
