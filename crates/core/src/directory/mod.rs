//! Directory views over the ticket service.
//!
//! Each view holds one page of items plus loading/error/pagination state.
//! Loads replace the visible set; failed loads keep whatever was displayed
//! and record the error instead.

mod analyzed;
mod runs;
mod tickets;
mod types;

pub use analyzed::AnalyzedDirectory;
pub use runs::RunDirectory;
pub use tickets::TicketDirectory;
pub use types::PageCursor;
