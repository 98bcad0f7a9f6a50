//! Colored terminal output for provisioning runs
//!
//! Uses owo-colors for terminal colors. Progress bars live in
//! `helpers::internal::progress`.

use owo_colors::OwoColorize;

/// Print an action header (blue, bold)
/// Example: "==> Provisioning tomcat instance 'web'"
pub fn action(message: &str) {
    println!("{} {}", "==>".blue().bold(), message.bold());
}

/// Print a step header with counter
/// Example: "(4/8) download artifact"
pub fn step_numbered(current: usize, total: usize, message: &str) {
    println!(
        "{} {}",
        format!("({}/{})", current, total).cyan(),
        message.bold()
    );
}

/// Print a sub-action (cyan arrow)
/// Example: "  -> created group tomcat_web"
pub fn sub_action(message: &str) {
    println!("  {} {}", "->".cyan(), message);
}

/// Print a detail line (dimmed)
/// Example: "     checksum uri http://..."
pub fn detail(message: &str) {
    println!("     {}", message.dimmed());
}

/// Print a success message (green)
pub fn success(message: &str) {
    println!("{} {}", "==>".green().bold(), message.green());
}

/// Print an error message (red)
pub fn error(message: &str) {
    eprintln!("{} {}", "error:".red().bold(), message.red());
}

/// Print a skip message (dimmed)
/// Example: "  -> extract: LICENSE present, skipping"
pub fn skip(message: &str) {
    println!("  {} {}", "->".dimmed(), message.dimmed());
}

/// Print a key/value line for the `plan` command
pub fn field(key: &str, value: &str) {
    println!("  {:<16} {}", key.dimmed(), value);
}
