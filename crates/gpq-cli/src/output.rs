use console::style;
use serde::Serialize;
use std::fmt::Display;
use tabled::{settings::Style, Table, Tabled};

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Human,
    Json,
}

pub struct OutputWriter {
    mode: OutputMode,
}

fn to_json(value: &serde_json::Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

impl OutputWriter {
    pub fn new(json: bool) -> Self {
        Self {
            mode: if json { OutputMode::Json } else { OutputMode::Human },
        }
    }

    pub fn is_json(&self) -> bool {
        self.mode == OutputMode::Json
    }

    pub fn success(&self, message: impl Display) {
        match self.mode {
            OutputMode::Human => {
                println!("{} {}", style("✓").green().bold(), message);
            }
            OutputMode::Json => {
                let output = serde_json::json!({
                    "status": "success",
                    "message": message.to_string(),
                });
                println!("{}", to_json(&output));
            }
        }
    }

    /// Informational line; JSON mode sends it to stderr so stdout stays one document
    pub fn info(&self, message: impl Display) {
        match self.mode {
            OutputMode::Human => {
                println!("{} {}", style("ℹ").blue().bold(), message);
            }
            OutputMode::Json => {
                let output = serde_json::json!({
                    "status": "info",
                    "message": message.to_string(),
                });
                eprintln!("{}", to_json(&output));
            }
        }
    }

    pub fn warning(&self, message: impl Display) {
        match self.mode {
            OutputMode::Human => {
                eprintln!("{} {}", style("⚠").yellow().bold(), message);
            }
            OutputMode::Json => {
                let output = serde_json::json!({
                    "status": "warning",
                    "message": message.to_string(),
                });
                eprintln!("{}", to_json(&output));
            }
        }
    }

    pub fn table<T: Tabled>(&self, data: Vec<T>) {
        if data.is_empty() {
            println!("{}", style("(no data)").dim());
        } else {
            let mut table = Table::new(data);
            table.with(Style::rounded());
            println!("{}", table);
        }
    }

    pub fn result<T: Serialize>(&self, data: T) -> anyhow::Result<()> {
        let output = serde_json::json!({
            "status": "success",
            "data": data,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
        Ok(())
    }

    pub fn kv(&self, key: impl Display, value: impl Display) {
        println!("{}: {}", style(key).bold(), value);
    }

    pub fn section(&self, title: impl Display) {
        println!("\n{}", style(title).bold().underlined());
    }
}
