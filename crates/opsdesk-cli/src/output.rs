use crate::cli::OutputFormat;
use colored::Colorize;
use opsdesk_notifications::{NavigationIntent, ToastItem};
use tabled::builder::Builder;
use tabled::settings::Style;

pub fn print_intent(intent: &NavigationIntent, format: OutputFormat) {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(intent) {
            Ok(json) => println!("{json}"),
            Err(e) => print_error(&format!("Failed to serialize intent: {e}")),
        },
        OutputFormat::Table => {
            let mut builder = Builder::default();
            builder.push_record(["Path", "Highlight order", "Highlight milestone"]);
            builder.push_record([
                intent.path.as_str(),
                intent.highlight_order_id.as_deref().unwrap_or("-"),
                intent.highlight_milestone_id.as_deref().unwrap_or("-"),
            ]);
            println!("{}", builder.build().with(Style::rounded()));
        }
    }
}

pub fn print_navigation(intent: &NavigationIntent) {
    let highlight = intent
        .highlight_order_id
        .as_deref()
        .map(|id| format!(" (order {id})"))
        .or_else(|| {
            intent
                .highlight_milestone_id
                .as_deref()
                .map(|id| format!(" (milestone {id})"))
        })
        .unwrap_or_default();
    println!("{} {}{}", "→".cyan(), intent.path.cyan(), highlight);
}

pub fn print_toasts(items: &[ToastItem]) {
    if items.is_empty() {
        println!("{}", "No visible notifications.".dimmed());
        return;
    }
    let mut builder = Builder::default();
    builder.push_record(["ID", "Origin", "Title", "Body", "View"]);
    for item in items {
        let short_id: String = item.id.chars().take(8).collect();
        builder.push_record([
            short_id,
            item.origin.to_string(),
            item.event.title.clone(),
            item.event.body.clone(),
            if item.has_view_action() { "yes" } else { "-" }.to_string(),
        ]);
    }
    println!("{}", builder.build().with(Style::rounded()));
}

pub fn print_success(msg: &str) {
    println!("{} {}", "✓".green(), msg);
}

pub fn print_warning(msg: &str) {
    eprintln!("{} {}", "!".yellow(), msg);
}

pub fn print_error(msg: &str) {
    eprintln!("{} {}", "✗".red(), msg);
}
