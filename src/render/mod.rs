//! HTML rendering of analysis results
//!
//! Everything that originates outside this crate (SQL text, database rows,
//! backend advisor output) goes through [`escape_html`] before it reaches
//! markup. Tabular data is rendered only through [`RecordTable`].

pub mod page;
pub mod schema;
pub mod sql;

pub use page::{render_page, render_vault_summary};
pub use schema::{render_schema_context, render_schema_overview};
pub use sql::format_sql;

use crate::client::{value_text, AnalysisResponse, Record};
use serde_json::Value;

pub const NO_DATA: &str = "No data";
pub const UNKNOWN_DATABASE: &str = "unknown";
pub const DEFAULT_FINDINGS: &str = "Query analyzed";
pub const OPTIMIZATION_UNAVAILABLE: &str = "Optimization analysis unavailable";
pub const DEFAULT_WHY_FASTER: &str = "See recommendations below";
pub const NO_RECOMMENDATIONS: &str = "No specific optimizations needed";
pub const NO_WARNINGS: &str = "No issues detected";
pub const COST_UNAVAILABLE: &str = "Cost analysis unavailable";
pub const SCHEMA_UNSAFE: &str = "Query contains unsafe operations";
pub const SCHEMA_UNAVAILABLE: &str = "Schema analysis unavailable";
pub const SCHEMA_WELL_DESIGNED: &str = "Current schema is well-designed";
pub const QUALITY_UNAVAILABLE: &str = "Data validation unavailable";
pub const QUALITY_GOOD: &str = "Data quality looks good";
pub const NO_EXPLAIN_PLAN: &str = "No explain plan available";
pub const NO_SAMPLE_DATA: &str = "No sample data available";
pub const NO_SCHEMA_CONTEXT: &str = "No schema context available";

/// Escape text for use in HTML element content and quoted attributes.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            other => out.push(other),
        }
    }
    out
}

/// Reduce an untrusted level ("High", "medium ") to a CSS-safe token.
fn level_token(level: Option<&str>, default: &str) -> String {
    let token = level
        .map(|l| l.trim().to_lowercase())
        .filter(|l| !l.is_empty())
        .unwrap_or_else(|| default.to_string());
    if token
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        token
    } else {
        default.to_string()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

fn notice(symbol: &str, text: &str) -> String {
    format!("<p>{} {}</p>", symbol, escape_html(text))
}

fn list_items(items: &[String]) -> String {
    let mut html = String::from("<ul>");
    for item in items {
        html.push_str(&format!("<li>{}</li>", escape_html(item)));
    }
    html.push_str("</ul>");
    html
}

fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|s| !s.trim().is_empty())
}

/// One column of a [`RecordTable`]
pub struct Column {
    header: String,
    keys: Vec<String>,
    fallback: String,
    display: Option<fn(&str) -> String>,
    class: Option<fn(&str) -> Option<&'static str>>,
}

impl Column {
    pub fn new(header: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            header: header.into(),
            keys: vec![key.into()],
            fallback: String::new(),
            display: None,
            class: None,
        }
    }

    /// Additional keys tried in order when the primary key is missing, null or empty.
    pub fn or_key(mut self, key: impl Into<String>) -> Self {
        self.keys.push(key.into());
        self
    }

    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }

    /// Map the raw cell text before escaping.
    pub fn display(mut self, f: fn(&str) -> String) -> Self {
        self.display = Some(f);
        self
    }

    /// CSS class for a cell, chosen from its raw text.
    pub fn class(mut self, f: fn(&str) -> Option<&'static str>) -> Self {
        self.class = Some(f);
        self
    }

    fn raw_text(&self, record: &Record) -> String {
        self.keys
            .iter()
            .filter_map(|key| record.get(key))
            .filter(|v| !v.is_null())
            .map(value_text)
            .find(|s| !s.is_empty())
            .unwrap_or_else(|| self.fallback.clone())
    }

    fn cell(&self, record: &Record) -> String {
        let raw = self.raw_text(record);
        let class = self.class.and_then(|f| f(&raw));
        let text = match self.display {
            Some(f) => f(&raw),
            None => raw,
        };
        match class {
            Some(class) => format!("<td class=\"{}\">{}</td>", class, escape_html(&text)),
            None => format!("<td>{}</td>", escape_html(&text)),
        }
    }
}

/// Ordered list of uniform key-value records rendered as an escaped table
pub struct RecordTable<'a> {
    columns: Vec<Column>,
    records: Vec<&'a Record>,
}

impl<'a> RecordTable<'a> {
    pub fn new(columns: Vec<Column>, records: impl IntoIterator<Item = &'a Record>) -> Self {
        Self {
            columns,
            records: records.into_iter().collect(),
        }
    }

    /// Columns follow the key order of the first record.
    pub fn from_records(records: &'a [Record]) -> Self {
        let columns = records
            .first()
            .map(|first| first.keys().map(|k| Column::new(k.clone(), k.clone())).collect())
            .unwrap_or_default();
        Self::new(columns, records)
    }

    /// Rows are JSON values; anything that is not an object is skipped.
    pub fn from_values(columns: Vec<Column>, values: &'a [Value]) -> Self {
        Self::new(columns, values.iter().filter_map(Value::as_object))
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty() || self.columns.is_empty()
    }

    pub fn render(&self) -> String {
        if self.is_empty() {
            return format!("<p>{}</p>", NO_DATA);
        }

        let mut html = String::from("<div class=\"table-wrap\"><table><thead><tr>");
        for column in &self.columns {
            html.push_str(&format!("<th>{}</th>", escape_html(&column.header)));
        }
        html.push_str("</tr></thead><tbody>");

        for record in &self.records {
            html.push_str("<tr>");
            for column in &self.columns {
                html.push_str(&column.cell(record));
            }
            html.push_str("</tr>");
        }

        html.push_str("</tbody></table></div>");
        html
    }
}

/// Rendered analysis, one HTML fragment per results section
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RenderedView {
    pub summary: String,
    pub optimized_query: String,
    pub recommendations: String,
    pub warnings: String,
    pub impact: String,
    pub ai_notes: String,
    pub plan: String,
    pub rows: String,
    pub raw: String,
}

impl RenderedView {
    /// Sections in page order, with their element ids
    pub fn sections(&self) -> [(&'static str, &str); 9] {
        [
            ("summary", self.summary.as_str()),
            ("opt-query", self.optimized_query.as_str()),
            ("recommendations", self.recommendations.as_str()),
            ("warnings", self.warnings.as_str()),
            ("impact", self.impact.as_str()),
            ("ai-notes", self.ai_notes.as_str()),
            ("plan", self.plan.as_str()),
            ("rows", self.rows.as_str()),
            ("raw", self.raw.as_str()),
        ]
    }
}

pub fn render_analysis(resp: &AnalysisResponse) -> RenderedView {
    let opt = resp.optimization.clone().unwrap_or_default();

    RenderedView {
        summary: render_summary(resp),
        optimized_query: render_optimized_query(resp),
        recommendations: if opt.recommendations.is_empty() {
            notice("✓", NO_RECOMMENDATIONS)
        } else {
            format!(
                "<strong>Optimization Tips:</strong>{}",
                list_items(&opt.recommendations)
            )
        },
        warnings: if opt.warnings.is_empty() {
            notice("✓", NO_WARNINGS)
        } else {
            format!("<strong>⚠ Warnings:</strong>{}", list_items(&opt.warnings))
        },
        impact: render_impact(resp),
        ai_notes: render_ai_notes(resp),
        plan: render_plan(resp),
        rows: render_rows(resp),
        raw: match resp.schema_context() {
            Some(ctx) if !ctx.is_empty() => render_schema_context(ctx),
            _ => notice("⚠", NO_SCHEMA_CONTEXT),
        },
    }
}

fn render_summary(resp: &AnalysisResponse) -> String {
    let summary = resp.summary.clone().unwrap_or_default();
    let impact = level_token(summary.performance_impact.as_deref(), "unknown");

    format!(
        "<h3>Analysis Summary</h3>\
         <p><strong>Database:</strong> {}</p>\
         <p><strong>Performance Impact:</strong> <span class=\"impact-{}\">{}</span></p>\
         <p><strong>Key Findings:</strong> {}</p>",
        escape_html(resp.database_name().unwrap_or(UNKNOWN_DATABASE)),
        impact,
        escape_html(&capitalize(&impact)),
        escape_html(non_empty(summary.optimization_reason.as_deref()).unwrap_or(DEFAULT_FINDINGS)),
    )
}

fn render_optimized_query(resp: &AnalysisResponse) -> String {
    let Some(opt) = resp
        .optimization
        .as_ref()
        .filter(|o| o.status.as_deref() == Some("success"))
    else {
        return notice("⚠", OPTIMIZATION_UNAVAILABLE);
    };

    let query = non_empty(opt.optimized_query.as_deref())
        .or(resp.original_query.as_deref())
        .unwrap_or_default();

    format!(
        "<strong>Optimized Query:</strong><pre>{}</pre>\
         <p><strong>Why Faster:</strong> {}</p>",
        escape_html(&format_sql(query)),
        escape_html(non_empty(opt.why_faster.as_deref()).unwrap_or(DEFAULT_WHY_FASTER)),
    )
}

fn render_impact(resp: &AnalysisResponse) -> String {
    let opt = resp.optimization.clone().unwrap_or_default();
    let level = level_token(opt.estimated_impact.as_deref(), "unknown");

    let mut html = format!(
        "<strong>Impact Level:</strong> <span class=\"impact-{}\">{}</span>",
        level,
        escape_html(&capitalize(&level))
    );
    if !opt.engine_advice.is_empty() {
        html.push_str(&format!(
            "<br><strong>Engine Tips:</strong>{}",
            list_items(&opt.engine_advice)
        ));
    }
    html
}

fn render_ai_notes(resp: &AnalysisResponse) -> String {
    let mut html = String::from("<h4>Cost Analysis</h4>");
    let cost = resp.cost_analysis.clone().unwrap_or_default();
    if cost.status.as_deref() == Some("success") {
        let level = level_token(cost.estimated_cost.as_deref(), "medium");
        html.push_str(&format!(
            "<p><strong>Estimated Cost:</strong> <strong class=\"cost-{}\">{}</strong></p>",
            level,
            escape_html(&capitalize(&level))
        ));
        if !cost.cost_saving_tips.is_empty() {
            html.push_str(&list_items(&cost.cost_saving_tips));
        }
        if !cost.warnings.is_empty() {
            html.push_str("<p><strong>Warnings:</strong></p>");
            html.push_str(&list_items(&cost.warnings));
        }
    } else {
        html.push_str(&notice(
            "⚠",
            non_empty(cost.error.as_deref()).unwrap_or(COST_UNAVAILABLE),
        ));
    }

    html.push_str("<h4>Schema Improvements</h4>");
    let schema = resp.schema_improvements.clone().unwrap_or_default();
    match schema.status.as_deref() {
        Some("success") => {
            if !schema.recommended_indexes.is_empty() {
                html.push_str("<p><strong>Recommended Indexes:</strong></p><ul>");
                for index in &schema.recommended_indexes {
                    html.push_str(&format!("<li><code>{}</code></li>", escape_html(index)));
                }
                html.push_str("</ul>");
            }
            if !schema.schema_changes.is_empty() {
                html.push_str("<p><strong>Schema Changes:</strong></p>");
                html.push_str(&list_items(&schema.schema_changes));
            }
            if schema.recommended_indexes.is_empty() && schema.schema_changes.is_empty() {
                html.push_str(&notice("✓", SCHEMA_WELL_DESIGNED));
            }
        }
        Some("unsafe") => html.push_str(&notice("⚠", SCHEMA_UNSAFE)),
        _ => html.push_str(&notice(
            "⚠",
            non_empty(schema.error.as_deref()).unwrap_or(SCHEMA_UNAVAILABLE),
        )),
    }

    html.push_str("<h4>Data Quality</h4>");
    let quality = resp.data_quality.clone().unwrap_or_default();
    if quality.status.as_deref() == Some("success") {
        if quality.issues.is_empty() {
            html.push_str(&notice("✓", QUALITY_GOOD));
        } else {
            html.push_str(&format!(
                "<p><strong>Issues Found ({} confidence):</strong></p>",
                escape_html(non_empty(quality.confidence.as_deref()).unwrap_or("Medium"))
            ));
            html.push_str(&list_items(&quality.issues));
        }
        if let Some(reasoning) = non_empty(quality.reasoning.as_deref()) {
            html.push_str(&format!("<p><em>{}</em></p>", escape_html(reasoning)));
        }
    } else {
        html.push_str(&notice(
            "⚠",
            non_empty(quality.error.as_deref()).unwrap_or(QUALITY_UNAVAILABLE),
        ));
    }

    html
}

fn render_plan(resp: &AnalysisResponse) -> String {
    match resp
        .technical_details
        .as_ref()
        .and_then(|t| t.explain_plan.as_deref())
    {
        Some(plan) if !plan.is_empty() => RecordTable::from_records(plan).render(),
        _ => notice("⚠", NO_EXPLAIN_PLAN),
    }
}

fn render_rows(resp: &AnalysisResponse) -> String {
    let Some(sample) = resp
        .technical_details
        .as_ref()
        .and_then(|t| t.sample_rows.as_ref())
    else {
        return notice("⚠", NO_SAMPLE_DATA);
    };

    match sample.rows.as_deref() {
        Some(rows) if !rows.is_empty() => {
            let mut html = RecordTable::from_records(rows).render();
            if let Some(message) = non_empty(sample.message.as_deref()) {
                html.push_str(&format!("<p><em>{}</em></p>", escape_html(message)));
            }
            html
        }
        _ => notice(
            "⚠",
            non_empty(sample.error.as_deref()).unwrap_or(NO_SAMPLE_DATA),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn response(value: Value) -> AnalysisResponse {
        serde_json::from_value(value).unwrap()
    }

    fn records(value: Value) -> Vec<Record> {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn test_escape_html() {
        assert_eq!(
            escape_html(r#"<script>alert("x")</script> & 'y'"#),
            "&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt; &amp; &#039;y&#039;"
        );
        assert_eq!(escape_html("plain"), "plain");
    }

    #[test]
    fn test_record_table_headers_from_first_record() {
        let rows = records(json!([
            { "id": 1, "table": "orders", "key": null },
            { "id": 2, "extra": "ignored" }
        ]));
        let html = RecordTable::from_records(&rows).render();

        assert!(html.contains("<th>id</th><th>table</th><th>key</th>"));
        assert!(!html.contains("<th>extra</th>"));
        assert!(html.contains("<tr><td>1</td><td>orders</td><td></td></tr>"));
        assert!(html.contains("<tr><td>2</td><td></td><td></td></tr>"));
    }

    #[test]
    fn test_record_table_escapes_headers_and_cells() {
        let rows = records(json!([{ "<b>": "<script>x</script>", "q": "\"" }]));
        let html = RecordTable::from_records(&rows).render();
        assert!(!html.contains("<script>"));
        assert!(!html.contains("<b>"));
        assert!(html.contains("&lt;script&gt;x&lt;/script&gt;"));
        assert!(html.contains("<td>&quot;</td>"));
    }

    #[test]
    fn test_record_table_empty() {
        assert_eq!(RecordTable::from_records(&[]).render(), "<p>No data</p>");
    }

    #[test]
    fn test_column_aliases_and_fallback() {
        let rows = vec![json!({ "Field": "id", "COLUMN_NAME": "" }), json!("not a record")];
        let table = RecordTable::from_values(
            vec![
                Column::new("Field", "COLUMN_NAME").or_key("Field"),
                Column::new("Extra", "EXTRA").fallback("—"),
            ],
            &rows,
        );
        assert_eq!(
            table.render(),
            "<div class=\"table-wrap\"><table><thead><tr><th>Field</th><th>Extra</th></tr></thead>\
             <tbody><tr><td>id</td><td>—</td></tr></tbody></table></div>"
        );
    }

    #[test]
    fn test_empty_response_renders_placeholders() {
        let view = render_analysis(&response(json!({})));

        assert!(view.summary.contains(UNKNOWN_DATABASE));
        assert!(view.summary.contains("Unknown"));
        assert!(view.summary.contains(DEFAULT_FINDINGS));
        assert!(view.optimized_query.contains(OPTIMIZATION_UNAVAILABLE));
        assert!(view.recommendations.contains(NO_RECOMMENDATIONS));
        assert!(view.warnings.contains(NO_WARNINGS));
        assert!(view.impact.contains("Unknown"));
        assert!(view.ai_notes.contains(COST_UNAVAILABLE));
        assert!(view.ai_notes.contains(SCHEMA_UNAVAILABLE));
        assert!(view.ai_notes.contains(QUALITY_UNAVAILABLE));
        assert!(view.plan.contains(NO_EXPLAIN_PLAN));
        assert!(view.rows.contains(NO_SAMPLE_DATA));
        assert!(view.raw.contains(NO_SCHEMA_CONTEXT));
    }

    #[test]
    fn test_empty_sections_render_placeholders() {
        let view = render_analysis(&response(json!({
            "summary": {},
            "optimization": {},
            "cost_analysis": {},
            "schema_improvements": {},
            "data_quality": {},
            "technical_details": { "explain_plan": [], "sample_rows": {}, "schema_context": {} }
        })));
        assert!(view.plan.contains(NO_EXPLAIN_PLAN));
        assert!(view.rows.contains(NO_SAMPLE_DATA));
        assert!(view.raw.contains(NO_SCHEMA_CONTEXT));
        assert!(view.optimized_query.contains(OPTIMIZATION_UNAVAILABLE));
    }

    #[test]
    fn test_every_text_field_is_escaped() {
        let evil = "<script>alert(\"x\")</script>";
        let view = render_analysis(&response(json!({
            "database": evil,
            "original_query": evil,
            "summary": { "performance_impact": evil, "optimization_reason": evil },
            "optimization": {
                "status": "success", "optimized_query": evil, "why_faster": evil,
                "recommendations": [evil], "warnings": [evil],
                "estimated_impact": evil, "engine_advice": [evil]
            },
            "cost_analysis": { "status": "success", "estimated_cost": evil,
                               "cost_saving_tips": [evil], "warnings": [evil] },
            "schema_improvements": { "status": "success",
                                     "recommended_indexes": [evil], "schema_changes": [evil] },
            "data_quality": { "status": "success", "issues": [evil],
                              "confidence": evil, "reasoning": evil },
            "technical_details": {
                "explain_plan": [{ evil: evil }],
                "sample_rows": { "rows": [{ "c": evil }], "message": evil },
                "schema_context": { evil: [{ "COLUMN_NAME": evil, "COLUMN_TYPE": evil }] }
            }
        })));

        for (id, html) in view.sections() {
            assert!(!html.contains("<script>"), "raw tag in section {}", id);
            assert!(!html.contains("\"x\""), "raw quote in section {}", id);
        }
        assert!(view.recommendations.contains("&lt;script&gt;"));
        assert!(view.summary.contains("impact-unknown"));
    }

    #[test]
    fn test_error_texts_replace_placeholders() {
        let view = render_analysis(&response(json!({
            "cost_analysis": { "status": "error", "error": "LLM timeout" },
            "schema_improvements": { "status": "unsafe" },
            "data_quality": { "status": "error", "error": "no rows" },
            "technical_details": { "sample_rows": { "error": "Access denied" } }
        })));
        assert!(view.ai_notes.contains("LLM timeout"));
        assert!(view.ai_notes.contains(SCHEMA_UNSAFE));
        assert!(view.ai_notes.contains("no rows"));
        assert!(view.rows.contains("Access denied"));
    }

    #[test]
    fn test_success_sections() {
        let view = render_analysis(&response(json!({
            "database_used": "shop",
            "original_query": "select * from orders where id = 1",
            "summary": { "performance_impact": "High", "optimization_reason": "Full scan" },
            "optimization": { "status": "success", "estimated_impact": "medium",
                              "engine_advice": ["Raise innodb_buffer_pool_size"] },
            "cost_analysis": { "status": "success" },
            "schema_improvements": { "status": "success" },
            "data_quality": { "status": "success", "reasoning": "Sample is clean" },
            "technical_details": {
                "explain_plan": [{ "id": 1, "type": "ALL", "rows": 1200 }],
                "sample_rows": { "rows": [{ "id": 1 }], "message": "Showing 1 row" }
            }
        })));

        assert!(view.summary.contains("<span class=\"impact-high\">High</span>"));
        assert!(view.summary.contains("shop"));
        assert!(view.optimized_query.contains("SELECT *\nFROM orders\nWHERE id = 1"));
        assert!(view.optimized_query.contains(DEFAULT_WHY_FASTER));
        assert!(view.impact.contains("impact-medium"));
        assert!(view.impact.contains("<li>Raise innodb_buffer_pool_size</li>"));
        assert!(view.ai_notes.contains("cost-medium"));
        assert!(view.ai_notes.contains(SCHEMA_WELL_DESIGNED));
        assert!(view.ai_notes.contains(QUALITY_GOOD));
        assert!(view.ai_notes.contains("<em>Sample is clean</em>"));
        assert!(view.plan.contains("<th>id</th><th>type</th><th>rows</th>"));
        assert!(view.plan.contains("<td>1200</td>"));
        assert!(view.rows.contains("<em>Showing 1 row</em>"));
    }

    #[test]
    fn test_stray_rows_keep_the_valid_ones() {
        let view = render_analysis(&response(json!({
            "technical_details": {
                "explain_plan": [{ "id": 1, "type": "ALL" }, null],
                "sample_rows": { "rows": [{ "id": 7 }, "x"] }
            }
        })));
        assert!(view.plan.contains("<th>id</th><th>type</th>"));
        assert!(view.plan.contains("<td>ALL</td>"));
        assert!(!view.plan.contains(NO_EXPLAIN_PLAN));
        assert!(view.rows.contains("<td>7</td>"));
        assert!(!view.rows.contains(NO_SAMPLE_DATA));

        let view = render_analysis(&response(json!({
            "technical_details": { "explain_plan": [null, "x"] }
        })));
        assert!(view.plan.contains(NO_EXPLAIN_PLAN));
    }

    #[test]
    fn test_level_token() {
        assert_eq!(level_token(Some(" High "), "unknown"), "high");
        assert_eq!(level_token(Some("x\" onmouseover"), "unknown"), "unknown");
        assert_eq!(level_token(None, "medium"), "medium");
    }
}
