//! Terminal output helpers

mod printer;
pub mod report;

pub use printer::{
    print_header, print_info, print_key_value, print_next_steps, print_success, print_warning,
};
pub use report::{print_report, render_report, truncate};
