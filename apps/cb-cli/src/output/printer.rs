//! Status lines for commands

/// Check if color output is enabled
fn use_color() -> bool {
    std::env::var("NO_COLOR").is_err()
}

/// Print a success message (green checkmark)
pub fn print_success(message: &str) {
    if use_color() {
        println!("\x1b[32m✓\x1b[0m {message}");
    } else {
        println!("OK: {message}");
    }
}

/// Warnings go to stderr so that JSON and YAML output stay parseable.
pub fn print_warning(message: &str) {
    if use_color() {
        eprintln!("\x1b[33mWarning:\x1b[0m {message}");
    } else {
        eprintln!("Warning: {message}");
    }
}

pub fn print_info(message: &str) {
    if use_color() {
        println!("\x1b[34mℹ\x1b[0m {message}");
    } else {
        println!("Info: {message}");
    }
}

/// Print a title between two rules
pub fn print_header(title: &str) {
    let rule = "═".repeat(59);
    println!();
    println!("{rule}");
    println!("{title:^59}");
    println!("{rule}");
    println!();
}

pub fn print_key_value(key: &str, value: &str) {
    if use_color() {
        println!("  \x1b[1m{key}:\x1b[0m {value}");
    } else {
        println!("  {key}: {value}");
    }
}

pub fn print_next_steps(steps: &[String]) {
    println!("\nNext steps:");
    for (i, step) in steps.iter().enumerate() {
        println!("  {}. {step}", i + 1);
    }
}
