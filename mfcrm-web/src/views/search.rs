//! Global search results

use mfcrm_common::db::search::SearchResults;

use super::layout::{esc, esc_opt, page};
use crate::flash::Flash;

fn section(title: &str, items: Vec<String>) -> String {
    if items.is_empty() {
        return String::new();
    }
    format!(
        r#"<section><h2>{} ({})</h2><ul>{}</ul></section>"#,
        title,
        items.len(),
        items.concat()
    )
}

pub fn render(query: &str, results: &SearchResults, flash: Option<&Flash>) -> String {
    let form = format!(
        r#"<form method="get" action="/search/"><input type="search" name="q" value="{}"> <button type="submit">Search</button></form>"#,
        esc(query)
    );

    let body = if query.trim().is_empty() {
        form
    } else if results.is_empty() {
        format!(
            r#"{}<p class="empty">No results for &quot;{}&quot;.</p>"#,
            form,
            esc(query)
        )
    } else {
        let contacts = results
            .contacts
            .iter()
            .map(|c| {
                format!(
                    r#"<li><a href="/contacts/{}">{}</a> {}</li>"#,
                    c.id,
                    esc(&c.name),
                    esc_opt(c.company.as_deref())
                )
            })
            .collect();
        let properties = results
            .properties
            .iter()
            .map(|p| {
                format!(
                    r#"<li><a href="/properties/{}">{}</a> {}</li>"#,
                    p.id,
                    esc(p.display_name()),
                    esc_opt(p.city.as_deref())
                )
            })
            .collect();
        let deals = results
            .deals
            .iter()
            .map(|d| {
                format!(
                    r#"<li><a href="/deals/{}">{}</a> {} &middot; {}</li>"#,
                    d.deal.id,
                    esc(&d.deal.deal_name),
                    esc(&d.property_label),
                    d.deal.stage.label()
                )
            })
            .collect();

        format!(
            r#"{form}<p>{total} results</p>{contacts}{properties}{deals}"#,
            form = form,
            total = results.total(),
            contacts = section("Contacts", contacts),
            properties = section("Properties", properties),
            deals = section("Deals", deals),
        )
    };

    page("Search", flash, &body)
}
