//! Output formatting for CLI

use clap::ValueEnum;
use comfy_table::{presets::UTF8_FULL, ContentArrangement, Table};
use serde::Serialize;

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable table format
    #[default]
    Table,
    /// JSON format
    Json,
    /// YAML format
    Yaml,
    /// Plain text format
    Plain,
}

/// Items that can be displayed as a table row
pub trait TableDisplay {
    fn headers() -> Vec<&'static str>;
    fn row(&self) -> Vec<String>;
}

fn table<'a, T: TableDisplay + 'a>(items: impl IntoIterator<Item = &'a T>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(T::headers());
    for item in items {
        table.add_row(item.row());
    }
    table
}

fn print_plain<T: TableDisplay>(item: &T) {
    for (header, value) in T::headers().iter().zip(item.row()) {
        println!("{}: {}", header, value);
    }
}

/// Print a single item
pub fn print_item<T: Serialize + TableDisplay>(item: &T, format: OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Table => println!("{}", table([item])),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(item)?),
        OutputFormat::Plain => print_plain(item),
    }
    Ok(())
}

/// Print a list of items
pub fn print_list<T: Serialize + TableDisplay>(items: &[T], format: OutputFormat) -> anyhow::Result<()> {
    if items.is_empty() && format == OutputFormat::Table {
        println!("No items found.");
        return Ok(());
    }

    match format {
        OutputFormat::Table => println!("{}", table(items)),
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(items)?),
        OutputFormat::Yaml => print!("{}", serde_yaml::to_string(items)?),
        OutputFormat::Plain => {
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    println!("---");
                }
                print_plain(item);
            }
        }
    }
    Ok(())
}

pub fn print_success(message: &str) {
    println!("✅ {}", message);
}

pub fn print_error(message: &str) {
    eprintln!("❌ {}", message);
}

pub fn print_info(message: &str) {
    println!("ℹ️  {}", message);
}
