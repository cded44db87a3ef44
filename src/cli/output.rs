//! Terminal output formatting with colors
//!
//! Respects NO_COLOR, CLICOLOR, CLICOLOR_FORCE automatically.

use colored::Colorize;

/// Print error (red bold "error:" prefix) to stderr
pub fn error(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "error".red().bold(), msg);
}

/// Print warning (yellow "Warning:" prefix) to stderr
pub fn warning(msg: &(impl std::fmt::Display + ?Sized)) {
    eprintln!("{}: {}", "Warning".yellow(), msg);
}

/// Print success status (green checkmark)
pub fn success(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{} {}", "✓".green(), msg);
}

/// Print section header (cyan bold)
pub fn header(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg.to_string().cyan().bold());
}

/// Print indented detail (no color)
pub fn detail(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("  {}", msg);
}

/// Print plain output (no color)
pub fn info(msg: &(impl std::fmt::Display + ?Sized)) {
    println!("{}", msg);
}

/// Color an already padded amount by sign: green owed, red owing, dimmed settled
pub fn signed(text: &str, value: f64, tolerance: f64) -> String {
    if value > tolerance {
        text.green().to_string()
    } else if value < -tolerance {
        text.red().to_string()
    } else {
        text.dimmed().to_string()
    }
}

/// Print one settlement transfer ("Ana pays Bia $12.50")
pub fn transfer(from: &str, to: &str, amount: &str) {
    println!("  {} {} {} {}", from.bold(), "pays".dimmed(), to.bold(), amount.yellow());
}
