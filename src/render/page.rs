use super::escape_html;
use crate::connection::ConnectionConfig;
use crate::studio::{ButtonState, Notice, NoticeLevel, PageKind, StudioPage};

/// Card describing the saved connection, without any secret.
pub fn render_vault_summary(config: &ConnectionConfig, studio_path: &str) -> String {
    format!(
        "<div class=\"guide-card\">\
         <h4>Saved Connection</h4>\
         <p><strong>Host:</strong> {}</p>\
         <p><strong>Database:</strong> {}</p>\
         <p><strong>User:</strong> {}</p>\
         <a class=\"btn btn-secondary\" href=\"{}\">Use in Studio</a>\
         </div>",
        escape_html(&config.host),
        escape_html(&config.database),
        escape_html(&config.user),
        escape_html(studio_path),
    )
}

fn level_class(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "info",
        NoticeLevel::Error => "error",
    }
}

fn render_alert(alert: &Notice) -> String {
    format!(
        "<div class=\"alert {}\" role=\"alert\">{}</div>",
        level_class(alert.level),
        escape_html(&alert.text)
    )
}

fn render_button(id: &str, button: &ButtonState) -> String {
    format!(
        "<button id=\"{}\"{}>{}</button>",
        id,
        if button.disabled { " disabled" } else { "" },
        escape_html(&button.label)
    )
}

fn field(label: &str, value: &str) -> String {
    format!("<p><strong>{}:</strong> {}</p>", label, escape_html(value))
}

fn render_connection(page: &StudioPage) -> String {
    let form = &page.form;
    let mut html = String::from("<section id=\"connection\">");
    html.push_str(&field("Host", &form.db_host));
    html.push_str(&field("Port", &form.db_port));
    html.push_str(&field("User", &form.db_user));
    html.push_str(&field("Database", &form.db_name));

    if form.ssh_section_visible() {
        html.push_str("<div id=\"ssh-config\">");
        html.push_str(&field("SSH Host", &form.ssh_host));
        html.push_str(&field("SSH Port", &form.ssh_port));
        html.push_str(&field("SSH User", &form.ssh_user));
        html.push_str("</div>");
    } else {
        html.push_str("<div id=\"ssh-config\" class=\"hidden\"></div>");
    }

    html.push_str(&format!(
        "<p><strong>Sandbox:</strong> {}</p>",
        if page.sandbox { "yes" } else { "no" }
    ));
    html.push_str("</section>");
    html
}

fn render_studio(page: &StudioPage, html: &mut String) {
    html.push_str(&render_connection(page));
    html.push_str(&format!(
        "<section id=\"query\"><pre id=\"sql\">{}</pre>{}{}</section>",
        escape_html(&page.sql),
        render_button("run-btn", &page.run_button),
        render_button("schema-btn", &page.schema_button),
    ));

    match &page.message {
        Some(message) => html.push_str(&format!(
            "<div id=\"message\" class=\"message-container {}\">{}</div>",
            level_class(message.level),
            escape_html(&message.text)
        )),
        None => html.push_str("<div id=\"message\" class=\"hidden\"></div>"),
    }

    match &page.results {
        Some(view) => {
            html.push_str("<section id=\"results\">");
            for (id, fragment) in view.sections() {
                html.push_str(&format!("<div id=\"{}\">{}</div>", id, fragment));
            }
            html.push_str("</section>");
        }
        None => html.push_str("<section id=\"results\" class=\"hidden\"></section>"),
    }

    match &page.schema_results {
        Some(fragment) => html.push_str(&format!("<div id=\"schema-results\">{}</div>", fragment)),
        None => html.push_str("<div id=\"schema-results\" class=\"hidden\"></div>"),
    }
}

/// Whole page as a standalone HTML document
pub fn render_page(page: &StudioPage) -> String {
    let title = match page.kind {
        PageKind::Studio => "QueryVault Studio",
        PageKind::Vault => "QueryVault Vault",
    };
    let mut html = format!(
        "<!DOCTYPE html>\n<html><head><meta charset=\"utf-8\"><title>{}</title></head><body>",
        title
    );

    if let Some(alert) = &page.alert {
        html.push_str(&render_alert(alert));
    }

    match page.kind {
        PageKind::Studio => render_studio(page, &mut html),
        PageKind::Vault => match &page.vault_list {
            Some(card) => html.push_str(&format!("<div id=\"vault-list\">{}</div>", card)),
            None => html.push_str("<div id=\"vault-list\"></div>"),
        },
    }

    html.push_str("</body></html>\n");
    html
}
