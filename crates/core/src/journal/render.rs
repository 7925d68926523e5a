//! Plain-text rendering of a journal for inspection.

use tabled::builder::Builder;
use tabled::settings::Style;

use crate::store::records::Alignment;

use super::types::JournalView;

/// Renders a journal as a header block plus a table listing all debit legs
/// first, then all credit legs, with the column sums in the footer row.
#[must_use]
pub fn render_journal(view: &JournalView) -> String {
    let mut builder = Builder::default();
    builder.push_record(["TRX ID", "ACCOUNT", "DESCRIPTION", "DEBIT", "CREDIT"]);

    for leg in view
        .legs
        .iter()
        .filter(|leg| leg.alignment == Alignment::Debit)
    {
        builder.push_record([
            leg.transaction_id.clone(),
            leg.account_number.clone(),
            leg.description.clone(),
            leg.amount.to_string(),
            String::new(),
        ]);
    }
    for leg in view
        .legs
        .iter()
        .filter(|leg| leg.alignment == Alignment::Credit)
    {
        builder.push_record([
            leg.transaction_id.clone(),
            leg.account_number.clone(),
            leg.description.clone(),
            String::new(),
            leg.amount.to_string(),
        ]);
    }
    builder.push_record([
        String::new(),
        String::new(),
        String::new(),
        view.total_debit().to_string(),
        view.total_credit().to_string(),
    ]);

    let mut table = builder.build();
    table.with(Style::ascii());

    format!(
        "Journal Entry : {}\nJournal Date  : {}\nDescription   : {}\n{}\n",
        view.journal.journal_id,
        view.journal.journaling_time.to_rfc3339(),
        view.journal.description,
        table
    )
}
