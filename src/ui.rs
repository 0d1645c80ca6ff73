use colored::Colorize;

use crate::dispatch::InstallOutcome;

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
    println!("{}", "─".repeat(title.chars().count()).dimmed());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// One line describing how an installation ended
pub fn install_line(outcome: &InstallOutcome) -> String {
    let host = &outcome.hostname;
    match &outcome.result {
        Ok(status) if status.success() => format!("{host}: installation finished"),
        Ok(status) => match status.code() {
            Some(code) => format!("{host}: installation failed with exit status {code} (see {host}.log)"),
            None => format!("{host}: installation killed by signal (see {host}.log)"),
        },
        Err(e) => format!("{host}: installation could not start: {e}"),
    }
}
