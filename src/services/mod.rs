pub mod dom;
pub mod droid;
pub mod extractor;
pub mod monitor;
pub mod oracle;
pub mod paginator;
pub mod resolver;
pub mod scanner;
pub mod snapshot;
#[cfg(test)]
pub mod testing;
pub mod traversal;

pub use dom::*;
pub use droid::*;
pub use extractor::*;
pub use monitor::*;
pub use oracle::*;
pub use paginator::*;
pub use resolver::*;
pub use scanner::*;
pub use snapshot::*;
pub use traversal::*;
