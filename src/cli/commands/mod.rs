//! CLI command implementations

pub mod batch;
pub mod catalog;
pub mod config;
pub mod generate;
pub mod prompt;
pub mod quota;
pub mod status;

pub use batch::execute as batch;
pub use catalog::execute as catalog;
pub use config::execute as config;
pub use generate::execute as generate;
pub use prompt::execute as prompt;
pub use quota::execute as quota;
pub use status::execute as status;
