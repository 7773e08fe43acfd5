//! CSV ticket import.
//!
//! Rows are `title,description`. Parsing is deliberately lenient: quoting
//! is tolerated loosely (an unterminated quote consumes the rest of its
//! line) and malformed rows are skipped with a warning, never a hard
//! failure for the whole file.

use std::sync::Arc;

use tracing::{info, warn};

use crate::api::{ApiError, NewTicket, Ticket, TicketService};
use crate::metrics;

/// A row that could not be imported.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the input.
    pub line: usize,
    pub reason: String,
}

/// Result of parsing a CSV document.
#[derive(Debug, Default)]
pub struct CsvTickets {
    pub tickets: Vec<NewTicket>,
    pub skipped: Vec<SkippedRow>,
}

/// Result of a full import: parse + batch creation.
#[derive(Debug)]
pub struct ImportReport {
    pub created: Vec<Ticket>,
    pub skipped: Vec<SkippedRow>,
}

/// Parse ticket rows out of a CSV document.
///
/// The first row is treated as a header and dropped when it looks like
/// one (`title,description`, any case). Extra columns are folded into the
/// description. Rows without a title are skipped.
pub fn parse_tickets_csv(input: &str) -> CsvTickets {
    let mut out = CsvTickets::default();

    for (idx, line) in input.lines().enumerate() {
        let number = idx + 1;
        if line.trim().is_empty() {
            continue;
        }

        let fields = split_row(line);
        if idx == 0 && is_header(&fields) {
            continue;
        }

        let title = fields.first().map(|f| f.trim()).unwrap_or_default();
        if title.is_empty() {
            warn!(line = number, "Skipping CSV row without a title");
            metrics::IMPORT_ROWS_SKIPPED.inc();
            out.skipped.push(SkippedRow {
                line: number,
                reason: "missing title".to_string(),
            });
            continue;
        }

        let description = fields
            .iter()
            .skip(1)
            .map(|f| f.trim())
            .filter(|f| !f.is_empty())
            .collect::<Vec<_>>()
            .join(", ");

        out.tickets.push(NewTicket::new(title, description));
    }

    out
}

/// Parse the rows and create the surviving tickets in one batch.
pub async fn import_tickets(
    service: &Arc<dyn TicketService>,
    input: &str,
) -> Result<ImportReport, ApiError> {
    let parsed = parse_tickets_csv(input);
    let created = if parsed.tickets.is_empty() {
        Vec::new()
    } else {
        service.create_tickets(parsed.tickets).await?
    };

    info!(
        created = created.len(),
        skipped = parsed.skipped.len(),
        "CSV import finished"
    );
    Ok(ImportReport {
        created,
        skipped: parsed.skipped,
    })
}

fn is_header(fields: &[String]) -> bool {
    let mut names = fields.iter().map(|f| f.trim().to_ascii_lowercase());
    names.next().as_deref() == Some("title")
        && matches!(names.next().as_deref(), Some("description") | None)
}

/// Split one CSV line into fields, tolerating sloppy quoting.
fn split_row(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                // Doubled quote is an escaped quote; anything else ends the
                // quoted section.
                if chars.peek() == Some(&'"') {
                    chars.next();
                    current.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' if current.trim().is_empty() => {
                current.clear();
                in_quotes = true;
            }
            '"' => current.push('"'),
            ',' if !in_quotes => {
                fields.push(std::mem::take(&mut current));
            }
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::MockTicketService;

    #[test]
    fn test_parse_plain_rows() {
        let csv = "title,description\nLogin broken,Cannot sign in\nSlow search,Takes minutes\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets.len(), 2);
        assert!(parsed.skipped.is_empty());
        assert_eq!(parsed.tickets[0].title, "Login broken");
        assert_eq!(parsed.tickets[1].description, "Takes minutes");
    }

    #[test]
    fn test_parse_without_header() {
        let csv = "Crash on save,App closes unexpectedly\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets.len(), 1);
        assert_eq!(parsed.tickets[0].title, "Crash on save");
    }

    #[test]
    fn test_quoted_field_with_comma() {
        let csv = "\"Billing, annual plan\",\"Charged twice, need refund\"\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets[0].title, "Billing, annual plan");
        assert_eq!(parsed.tickets[0].description, "Charged twice, need refund");
    }

    #[test]
    fn test_escaped_quotes() {
        let csv = "\"The \"\"export\"\" button\",does nothing\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets[0].title, "The \"export\" button");
    }

    #[test]
    fn test_unterminated_quote_consumes_line() {
        let csv = "\"Unclosed quote, still imported\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets.len(), 1);
        assert_eq!(parsed.tickets[0].title, "Unclosed quote, still imported");
    }

    #[test]
    fn test_missing_title_skipped_with_reason() {
        let csv = "title,description\n,no title here\nGood row,fine\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets.len(), 1);
        assert_eq!(parsed.skipped.len(), 1);
        assert_eq!(parsed.skipped[0].line, 2);
        assert_eq!(parsed.skipped[0].reason, "missing title");
    }

    #[test]
    fn test_blank_lines_ignored() {
        let csv = "\n\nOnly row,text\n\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets.len(), 1);
        assert!(parsed.skipped.is_empty());
    }

    #[test]
    fn test_extra_columns_fold_into_description() {
        let csv = "Printer,paper jam,third floor,urgent\n";
        let parsed = parse_tickets_csv(csv);
        assert_eq!(parsed.tickets[0].description, "paper jam, third floor, urgent");
    }

    #[tokio::test]
    async fn test_import_creates_tickets() {
        let service: Arc<dyn TicketService> = Arc::new(MockTicketService::new());
        let csv = "title,description\nA,first\n,broken\nB,second\n";

        let report = import_tickets(&service, csv).await.unwrap();
        assert_eq!(report.created.len(), 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(report.created[0].title, "A");
    }

    #[tokio::test]
    async fn test_import_empty_file_creates_nothing() {
        let service: Arc<dyn TicketService> = Arc::new(MockTicketService::new());
        let report = import_tickets(&service, "title,description\n").await.unwrap();
        assert!(report.created.is_empty());
        assert!(report.skipped.is_empty());
    }
}
