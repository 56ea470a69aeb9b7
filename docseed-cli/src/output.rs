//! Styled terminal output for seeding runs.

use owo_colors::OwoColorize;

/// Print a command title, underlined.
pub fn header(text: &str) {
    println!();
    println!("{}", text.bold().cyan());
    println!("{}", "─".repeat(text.chars().count()).dimmed());
    println!();
}

/// Print the `docseed <version>` banner.
pub fn banner(version: &str) {
    println!(
        "{} {} {}",
        "◆".bright_cyan().bold(),
        "docseed".bright_cyan().bold(),
        version.dimmed()
    );
}

/// Print a section header
pub fn section(text: &str) {
    println!("{}", text.bold().white());
}

/// Print a key-value pair
pub fn kv(key: &str, value: &str) {
    println!("  {}: {}", key.dimmed(), value);
}

/// Print the `[n/total] model` line that starts seeding a model.
pub fn step(current: usize, total: usize, model: &str) {
    println!("{} {}", format!("[{current}/{total}]").dimmed(), model.bold());
}

/// Report how many records a model ended up with.
pub fn seeded(model: &str, count: usize) {
    if count == 0 {
        println!("  {} {}", "ℹ".blue().bold(), format!("{model}: nothing to seed").dimmed());
    } else {
        println!("  {} {model}: {} {}", "✔".green().bold(), count.green(), plural(count, "record"));
    }
}

/// Report the totals of a run.
pub fn summary(records: usize, models: usize) {
    println!(
        "{} Seeded {} {} across {} {}",
        "✔".green().bold(),
        records.to_string().green().bold(),
        plural(records, "record"),
        models,
        plural(models, "model")
    );
}

/// Print an error message
pub fn error(text: &str) {
    eprintln!("{} {}", "✖".red().bold(), text.red());
}

/// Print a newline
pub fn newline() {
    println!();
}

/// Print dimmed text
pub fn dim(text: &str) {
    println!("{}", text.dimmed());
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        noun.to_string()
    } else {
        format!("{noun}s")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plural() {
        assert_eq!(plural(0, "record"), "records");
        assert_eq!(plural(1, "record"), "record");
        assert_eq!(plural(2, "model"), "models");
    }
}
