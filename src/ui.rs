use colored::Colorize;

/// Print an info message
pub fn info(msg: &str) {
    println!("{} {}", "ℹ".blue(), msg);
}

/// Print a success message
pub fn success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

/// Print a warning message
pub fn warn(msg: &str) {
    println!("{} {}", "⚠".yellow(), msg);
}

/// Print an error message
pub fn error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}

/// Print a dim/muted message
pub fn dim(msg: &str) {
    println!("  {}", msg.dimmed());
}

/// Print a header/title
pub fn header(title: &str) {
    println!();
    println!("{}", title.bold());
    println!("{}", "─".repeat(title.len()).dimmed());
}

/// Print a section header
pub fn section(title: &str) {
    println!();
    println!("{}", title.cyan().bold());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Colored status label for a check result
pub fn status_label(status: preflight::CheckStatus) -> colored::ColoredString {
    match status {
        preflight::CheckStatus::Success => "PASS".green().bold(),
        preflight::CheckStatus::Failed => "FAIL".red().bold(),
        preflight::CheckStatus::Skipped => "SKIP".yellow(),
    }
}

/// Join a list of addresses for display
pub fn address_list(addresses: &[String]) -> String {
    if addresses.is_empty() {
        "(none)".to_string()
    } else {
        addresses.join(", ")
    }
}
