pub mod layout;
pub mod store;
pub mod table;

#[cfg(test)]
mod tests;

pub use layout::DataLayout;
pub use store::{write_comments, CorpusStore, PostRow, SaveSummary};
pub use table::Table;
