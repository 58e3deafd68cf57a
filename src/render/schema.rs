use super::{escape_html, Column, RecordTable, UNKNOWN_DATABASE};
use crate::client::{SchemaContext, SchemaOverview};
use serde_json::Value;

pub const NO_TABLES: &str = "No tables found";

fn key_class(key: &str) -> Option<&'static str> {
    match key {
        "PRI" => Some("key-pri"),
        "MUL" => Some("key-mul"),
        "UNI" => Some("key-uni"),
        _ => None,
    }
}

fn known_key(key: &str) -> String {
    match key {
        "PRI" | "MUL" | "UNI" => key.to_string(),
        _ => "—".to_string(),
    }
}

fn null_class(nullable: &str) -> Option<&'static str> {
    (nullable == "YES").then_some("null-yes")
}

fn nullable_mark(nullable: &str) -> String {
    if nullable == "YES" {
        "✓ YES".to_string()
    } else {
        "✗ NO".to_string()
    }
}

fn key_role(key: &str) -> String {
    match key {
        "PRI" => "PRIMARY".to_string(),
        "MUL" => "FOREIGN".to_string(),
        other => other.to_string(),
    }
}

/// Column descriptors come either from `information_schema.COLUMNS` or from
/// `SHOW COLUMNS`; both spellings are accepted.
fn context_columns() -> Vec<Column> {
    vec![
        Column::new("Field", "COLUMN_NAME").or_key("Field").fallback("—"),
        Column::new("Type", "COLUMN_TYPE").or_key("Type").fallback("—"),
        Column::new("Null", "IS_NULLABLE")
            .or_key("Null")
            .fallback("NO")
            .class(null_class),
        Column::new("Key", "COLUMN_KEY")
            .or_key("Key")
            .fallback("—")
            .display(known_key)
            .class(key_class),
        Column::new("Default", "COLUMN_DEFAULT")
            .or_key("Default")
            .fallback("null"),
        Column::new("Extra", "EXTRA").or_key("Extra").fallback("—"),
    ]
}

fn overview_columns() -> Vec<Column> {
    vec![
        Column::new("Column", "COLUMN_NAME").or_key("Field").fallback("—"),
        Column::new("Type", "COLUMN_TYPE").or_key("Type").fallback("—"),
        Column::new("Nullable", "IS_NULLABLE")
            .or_key("Null")
            .display(nullable_mark),
        Column::new("Key", "COLUMN_KEY")
            .or_key("Key")
            .fallback("—")
            .display(key_role)
            .class(key_class),
    ]
}

fn table_heading(name: &str) -> String {
    format!("<h4>Table: <code>{}</code></h4>", escape_html(name))
}

/// Schema context embedded in an analysis response
pub fn render_schema_context(context: &SchemaContext) -> String {
    let mut html = String::from("<h3>Schema Context</h3>");

    for (table, columns) in context {
        html.push_str("<div class=\"schema-table\">");
        html.push_str(&table_heading(table));
        match columns {
            Value::Array(rows) => {
                html.push_str(&RecordTable::from_values(context_columns(), rows).render());
            }
            Value::Object(_) => {
                html.push_str(&format!("<p>{}</p>", escape_html(&columns.to_string())));
            }
            _ => {}
        }
        html.push_str("</div>");
    }

    html
}

/// Result of the standalone schema fetch
pub fn render_schema_overview(overview: &SchemaOverview) -> String {
    let database = overview
        .database
        .as_deref()
        .filter(|d| !d.is_empty())
        .unwrap_or(UNKNOWN_DATABASE);
    let mut html = format!(
        "<h3>Schema Overview</h3><p><strong>Database:</strong> {}</p>",
        escape_html(database)
    );

    let tables: Vec<(&String, &Vec<Value>)> = overview
        .tables
        .iter()
        .flatten()
        .filter_map(|(name, columns)| columns.as_array().map(|rows| (name, rows)))
        .collect();

    if tables.is_empty() {
        html.push_str(&format!("<p>{}</p>", NO_TABLES));
        return html;
    }

    for (name, rows) in tables {
        html.push_str("<div class=\"schema-table\">");
        html.push_str(&table_heading(name));
        html.push_str(&RecordTable::from_values(overview_columns(), rows).render());
        html.push_str("</div>");
    }

    html
}
