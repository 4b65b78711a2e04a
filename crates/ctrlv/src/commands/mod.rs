//! Command handlers for the ctrlv CLI.

pub mod diff;
pub mod info;
pub mod logging;
pub mod share;
pub mod versions;
pub mod view;

pub use diff::*;
pub use info::*;
pub use logging::*;
pub use share::*;
pub use versions::*;
pub use view::*;
