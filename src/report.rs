use comfy_table::{Attribute, Cell, Table};

use crate::model::{InvoiceSummary, format_date};

/// Terminal rendering of the invoice history, newest first as the backend
/// returns it.
pub fn history_table(invoices: &[InvoiceSummary]) -> Table {
    let mut table = Table::new();
    table.set_header(vec![
        Cell::new("Number").add_attribute(Attribute::Bold),
        Cell::new("Service"),
        Cell::new("Invoice Date"),
        Cell::new("Due Date"),
        Cell::new("Created"),
    ]);

    for invoice in invoices {
        table.add_row(vec![
            Cell::new(&invoice.invoice_number),
            Cell::new(&invoice.service),
            Cell::new(format_date(&invoice.invoice_date)),
            Cell::new(format_date(&invoice.due_date)),
            Cell::new(format_date(&invoice.created_at)),
        ]);
    }
    table
}
