pub mod model;
pub mod reminder;

pub use model::{resolve_fund_choice, EmailDateEntry, Fund, FundIssue, MailSelection, FUND_CHOICES};
pub use reminder::{reminder_rows, ReminderRow, RowEmphasis};
