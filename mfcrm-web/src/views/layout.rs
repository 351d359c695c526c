//! Page shell and formatting helpers shared by every view

use axum::http::StatusCode;
use chrono::{NaiveDate, NaiveDateTime};

use crate::flash::{Flash, FlashKind};

/// Escape text for HTML element content and quoted attributes
pub fn esc(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            c => out.push(c),
        }
    }
    out
}

/// Escaped optional text, empty when absent
pub fn esc_opt(raw: Option<&str>) -> String {
    raw.map(esc).unwrap_or_default()
}

/// `$1,250,000` (cents shown only when present)
pub fn money(value: f64) -> String {
    let negative = value < 0.0;
    let cents = (value.abs() * 100.0).round() as u64;
    let (whole, frac) = (cents / 100, cents % 100);

    let digits = whole.to_string();
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }

    let sign = if negative { "-" } else { "" };
    if frac == 0 {
        format!("{}${}", sign, grouped)
    } else {
        format!("{}${}.{:02}", sign, grouped, frac)
    }
}

pub fn money_opt(value: Option<f64>) -> String {
    value.map(money).unwrap_or_default()
}

pub fn date(value: NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

pub fn date_opt(value: Option<NaiveDate>) -> String {
    value.map(date).unwrap_or_default()
}

pub fn timestamp(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%d %H:%M").to_string()
}

/// Value for an `<input type="datetime-local">`
pub fn datetime_local(value: NaiveDateTime) -> String {
    value.format("%Y-%m-%dT%H:%M").to_string()
}

/// `<option>` list; `selected` is compared against each value
pub fn options<I>(items: I, selected: Option<&str>) -> String
where
    I: IntoIterator<Item = (String, String)>,
{
    items
        .into_iter()
        .map(|(value, label)| {
            let mark = if selected == Some(value.as_str()) {
                " selected"
            } else {
                ""
            };
            format!(
                r#"<option value="{}"{}>{}</option>"#,
                esc(&value),
                mark,
                esc(&label)
            )
        })
        .collect()
}

/// POST-only action rendered as a small inline form
pub fn post_button(action: &str, label: &str) -> String {
    format!(
        r#"<form method="post" action="{}" class="inline"><button type="submit">{}</button></form>"#,
        esc(action),
        esc(label)
    )
}

fn flash_html(flash: Option<&Flash>) -> String {
    match flash {
        Some(flash) => {
            let class = match flash.kind {
                FlashKind::Success => "flash flash-success",
                FlashKind::Error => "flash flash-error",
            };
            format!(r#"<div class="{}">{}</div>"#, class, esc(&flash.message))
        }
        None => String::new(),
    }
}

/// Full HTML document with navigation and the pending flash message
pub fn page(title: &str, flash: Option<&Flash>, body: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - Multifamily CRM</title>
    <link rel="stylesheet" href="/static/crm.css">
</head>
<body>
    <header>
        <nav>
            <a class="brand" href="/">Multifamily CRM</a>
            <a href="/">Dashboard</a>
            <a href="/deals/">Deals</a>
            <a href="/properties/">Properties</a>
            <a href="/contacts/">Contacts</a>
            <a href="/touchpoints/">Touchpoints</a>
            <form method="get" action="/search/" class="nav-search">
                <input type="search" name="q" placeholder="Search">
            </form>
        </nav>
    </header>
    <main>
        {flash}
        <h1>{title}</h1>
        {body}
    </main>
    <footer>
        <a href="/backup/download_db">Download database</a>
        <a href="/backup/export_contacts">Contacts CSV</a>
        <a href="/backup/export_properties">Properties CSV</a>
        <a href="/backup/export_deals">Deals CSV</a>
        <span class="version">v{version}</span>
    </footer>
</body>
</html>
"#,
        title = esc(title),
        flash = flash_html(flash),
        body = body,
        version = env!("CARGO_PKG_VERSION"),
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let title = status
        .canonical_reason()
        .map(|reason| format!("{} {}", status.as_u16(), reason))
        .unwrap_or_else(|| status.as_u16().to_string());
    let body = format!(
        r#"<p class="error-detail">{}</p><p><a href="/">Back to dashboard</a></p>"#,
        esc(message)
    );
    page(&title, None, &body)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_esc() {
        assert_eq!(
            esc(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
        assert_eq!(esc("Elm Gardens"), "Elm Gardens");
    }

    #[test]
    fn test_money() {
        assert_eq!(money(2_450_000.0), "$2,450,000");
        assert_eq!(money(999.0), "$999");
        assert_eq!(money(1234.5), "$1,234.50");
        assert_eq!(money(0.0), "$0");
        assert_eq!(money(-1500.0), "-$1,500");
    }

    #[test]
    fn test_options_marks_selection() {
        let html = options(
            vec![
                ("1".to_string(), "Elm".to_string()),
                ("2".to_string(), "Oak & Pine".to_string()),
            ],
            Some("2"),
        );
        assert!(html.contains(r#"<option value="1">Elm</option>"#));
        assert!(html.contains(r#"<option value="2" selected>Oak &amp; Pine</option>"#));
    }

    #[test]
    fn test_page_escapes_flash() {
        let flash = Flash::error("<b>bad</b>");
        let html = page("Contacts", Some(&flash), "<p>body</p>");
        assert!(html.contains("&lt;b&gt;bad&lt;/b&gt;"));
        assert!(html.contains("<p>body</p>"));
    }

    #[test]
    fn test_error_page_title() {
        let html = error_page(StatusCode::NOT_FOUND, "Deal 9");
        assert!(html.contains("404 Not Found"));
        assert!(html.contains("Deal 9"));
    }
}
