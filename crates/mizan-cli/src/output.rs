//! Output formatting

use clap::ValueEnum;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Table,
    Json,
    Yaml,
}

impl OutputFormat {
    /// Serialize `data`, or build the table view for `Table`
    pub fn render<T: Serialize>(&self, data: &T, table: impl FnOnce() -> String) -> anyhow::Result<String> {
        Ok(match self {
            OutputFormat::Json => serde_json::to_string_pretty(data)?,
            OutputFormat::Yaml => serde_yaml::to_string(data)?,
            OutputFormat::Table => table(),
        })
    }
}

pub fn table<R: Tabled>(rows: impl IntoIterator<Item = R>) -> String {
    Table::new(rows).with(Style::rounded()).to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Serialize, Tabled)]
    struct Row {
        id: String,
    }

    #[test]
    fn test_render_formats() {
        let rows = vec![Row { id: "PDPL-G.1".into() }];
        let json = OutputFormat::Json.render(&rows, || unreachable!()).unwrap();
        assert!(json.contains("\"id\": \"PDPL-G.1\""));

        let yaml = OutputFormat::Yaml.render(&rows, || unreachable!()).unwrap();
        assert!(yaml.contains("id: PDPL-G.1"));

        let text = OutputFormat::Table.render(&rows, || table(&rows)).unwrap();
        assert!(text.contains("PDPL-G.1"));
    }
}
