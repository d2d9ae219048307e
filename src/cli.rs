//! Shared console output helpers for clusterbank binaries.

use std::time::Instant;

use colored::Colorize;

pub fn banner(subtitle: &str) {
    eprintln!();
    eprintln!("{} {}", "clusterbank".bold().cyan(), subtitle.dimmed());
    eprintln!();
}

pub fn section(title: &str) {
    let bar = "─".repeat(50);
    eprintln!("{} {}", title.bold().blue(), bar.dimmed());
}

pub fn kv(key: &str, value: &str) {
    eprintln!("  {:<16} {}", key.dimmed(), value);
}

pub fn success(msg: &str) {
    eprintln!("  {} {}", "✓".green().bold(), msg);
}

pub fn warning(msg: &str) {
    eprintln!("  {} {}", "⚠".yellow(), msg.yellow());
}

pub fn print_summary(start: Instant) {
    let elapsed = start.elapsed();
    eprintln!();
    eprintln!(
        "{}  {}",
        "Time".dimmed(),
        format!("{:.1} s", elapsed.as_secs_f64()).bold()
    );
    eprintln!();
}
