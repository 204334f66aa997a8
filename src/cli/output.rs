//! CLI output formatting utilities.

use crate::aggregate::ResourceGroup;
use console::style;
use indicatif::{ProgressBar, ProgressStyle};

/// Output helper for CLI formatting.
pub struct Output;

impl Output {
    /// Print an info message.
    pub fn info(msg: &str) {
        println!("{} {}", style(">>").cyan().bold(), msg);
    }

    /// Print a success message.
    pub fn success(msg: &str) {
        println!("{} {}", style(">>").green().bold(), msg);
    }

    /// Print a warning message.
    pub fn warning(msg: &str) {
        eprintln!("{} {}", style(">>").yellow().bold(), msg);
    }

    /// Print an error message.
    pub fn error(msg: &str) {
        eprintln!("{} {}", style(">>").red().bold(), msg);
    }

    /// Print a header.
    pub fn header(msg: &str) {
        println!("\n{}", style(msg).bold().underlined());
    }

    /// Print a key-value pair.
    pub fn kv(key: &str, value: &str) {
        println!("  {}: {}", style(key).dim(), value);
    }

    /// Print an answer.
    pub fn answer(answer: &str) {
        println!("\n{}\n", answer.trim());
    }

    /// Print one grouped source with its moments.
    pub fn resource_group(group: &ResourceGroup) {
        println!(
            "\n{} {}",
            style(">>").green(),
            style(group.display_title()).bold(),
        );
        if !group.parent_url.is_empty() {
            println!("   {}", style(&group.parent_url).dim());
        }

        let description = group.description();
        if !description.trim().is_empty() {
            println!("   {}", description.trim().replace('\n', "\n   "));
        }

        for moments in &group.child_moments {
            println!(
                "   {} {} {}",
                style("*").cyan(),
                style(moments.label()).cyan(),
                style(&moments.url).dim()
            );
        }
    }

    /// Print every grouped source under a header.
    pub fn sources(groups: &[ResourceGroup]) {
        if groups.is_empty() {
            return;
        }
        Output::header("Sources");
        for group in groups {
            Output::resource_group(group);
        }
        println!();
    }

    /// Create a spinner.
    pub fn spinner(msg: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(spinner_style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(spinner_style);
        }
        pb.set_message(msg.to_string());
        pb.enable_steady_tick(std::time::Duration::from_millis(100));
        pb
    }
}
