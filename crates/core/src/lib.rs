pub mod api;
pub mod config;
pub mod coordinator;
pub mod directory;
pub mod import;
pub mod metrics;
pub mod testing;

pub use api::{
    ActiveRun, AnalysisRun, AnalyzedPage, AnalyzedTicket, ApiError, HttpTicketService, NewTicket,
    Priority, RunId, RunPage, RunReceipt, RunStatus, RunSummary, Ticket, TicketAnalysis, TicketId,
    TicketPage, TicketQuery, TicketService, TicketStatus,
};
pub use config::{
    load_config, load_config_from_str, validate_config, Config, ConfigError, DirectoryConfig,
    ServiceConfig,
};
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorError, CoordinatorStatus, ProcessingTicket,
    RecoveryReport, RunEvent, RunEvents,
};
pub use directory::{AnalyzedDirectory, RunDirectory, TicketDirectory};
pub use import::{import_tickets, parse_tickets_csv, CsvTickets, ImportReport, SkippedRow};
