//! Console and report output.

pub mod console;
pub mod progress;
pub mod report;

pub use console::{print_error, print_info, print_success, print_warning};
pub use progress::create_item_bar;
pub use report::{format_size_mb, history_report, interrupted_report, scan_report};
