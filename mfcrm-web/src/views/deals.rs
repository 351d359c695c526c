//! Deal pipeline and deal pages

use chrono::NaiveDate;
use mfcrm_common::db::deals::group_by_stage;
use mfcrm_common::models::{
    Contact, ContactRole, DealListing, DealStage, Property, RoleListing, TaskListing,
    TouchpointListing,
};

use super::layout::{date_opt, esc, esc_opt, money_opt, options, page, post_button};
use super::{tasks, touchpoints};
use crate::flash::Flash;

fn stage_filter(active: Option<DealStage>) -> String {
    let mut links = vec![if active.is_none() {
        r#"<strong>All</strong>"#.to_string()
    } else {
        r#"<a href="/deals/">All</a>"#.to_string()
    }];
    for stage in DealStage::ALL {
        if active == Some(*stage) {
            links.push(format!("<strong>{}</strong>", stage.label()));
        } else {
            links.push(format!(
                r#"<a href="/deals/?stage={}">{}</a>"#,
                stage.as_str(),
                stage.label()
            ));
        }
    }
    format!(r#"<nav class="stage-filter">{}</nav>"#, links.join(" "))
}

fn deal_card(d: &DealListing) -> String {
    format!(
        r#"<li class="deal-card"><a href="/deals/{id}">{name}</a><div>{property}</div><div>{price} {close}</div></li>"#,
        id = d.deal.id,
        name = esc(&d.deal.deal_name),
        property = esc(&d.property_label),
        price = money_opt(d.deal.asking_price),
        close = date_opt(d.deal.target_close_date),
    )
}

/// Pipeline grouped by stage; `notice` carries the unknown-stage message
pub fn list(
    deals: &[DealListing],
    active: Option<DealStage>,
    notice: Option<&str>,
    flash: Option<&Flash>,
) -> String {
    let notice = notice
        .map(|m| format!(r#"<div class="flash flash-error">{}</div>"#, esc(m)))
        .unwrap_or_default();

    let columns: String = group_by_stage(deals)
        .into_iter()
        .filter(|(stage, _)| active.map_or(true, |a| a == *stage))
        .map(|(stage, group)| {
            let count = group.len();
            let cards: String = group.into_iter().map(deal_card).collect();
            format!(
                r#"<section class="stage stage-{wire}"><h2>{label} ({count})</h2><ul>{cards}</ul></section>"#,
                wire = stage.as_str(),
                label = stage.label(),
                count = count,
                cards = cards,
            )
        })
        .collect();

    let body = format!(
        r#"{notice}
{filter}
<p><a class="button" href="/deals/create">New deal</a></p>
<div class="pipeline">{columns}</div>"#,
        notice = notice,
        filter = stage_filter(active),
        columns = columns,
    );
    page("Deals", flash, &body)
}

/// Only web URLs become anchors; anything else is shown as plain text
fn link_item(link: &str) -> String {
    let lower = link.to_ascii_lowercase();
    if lower.starts_with("http://") || lower.starts_with("https://") {
        format!(r#"<li><a href="{0}" rel="noopener">{0}</a></li>"#, esc(link))
    } else {
        format!("<li>{}</li>", esc(link))
    }
}

/// Everything shown on a deal's page
pub struct DealDetail<'a> {
    pub deal: &'a DealListing,
    pub roles: &'a [RoleListing],
    pub open_tasks: &'a [TaskListing],
    pub touchpoints: &'a [TouchpointListing],
    pub all_contacts: &'a [Contact],
    pub all_deals: &'a [DealListing],
}

pub fn detail(view: &DealDetail<'_>, today: NaiveDate, flash: Option<&Flash>) -> String {
    let d = &view.deal.deal;

    let roles: String = view
        .roles
        .iter()
        .map(|r| {
            format!(
                r#"<tr><td><a href="/contacts/{cid}">{name}</a></td><td>{role}</td><td>{notes}</td><td>{remove}</td></tr>"#,
                cid = r.role.contact_id,
                name = esc(&r.contact_name),
                role = r.role.role.label(),
                notes = esc_opt(r.role.notes.as_deref()),
                remove = post_button(
                    &format!("/deals/{}/remove_contact/{}", d.id, r.role.id),
                    "Remove"
                ),
            )
        })
        .collect();

    let links: String = d
        .link_list()
        .into_iter()
        .map(link_item)
        .collect();

    let contact_options = options(
        view.all_contacts
            .iter()
            .map(|c| (c.id.to_string(), c.name.clone())),
        None,
    );
    let role_options = options(
        ContactRole::ALL
            .iter()
            .map(|r| (r.as_str().to_string(), r.label())),
        None,
    );

    let body = format!(
        r#"<section class="card">
    <dl>
        <dt>Property</dt><dd><a href="/properties/{pid}">{property}</a></dd>
        <dt>Stage</dt><dd>{stage}</dd>
        <dt>Target close</dt><dd>{close}</dd>
        <dt>Asking price</dt><dd>{price}</dd>
        <dt>Links</dt><dd><ul>{links}</ul></dd>
        <dt>Notes</dt><dd class="notes">{notes}</dd>
    </dl>
    <p><a class="button" href="/deals/{id}/edit">Edit</a> {delete}</p>
</section>
<section>
    <h2>Contacts</h2>
    <table><thead><tr><th>Contact</th><th>Role</th><th>Notes</th><th></th></tr></thead><tbody>{roles}</tbody></table>
    <form method="post" action="/deals/{id}/add_contact" class="inline-form">
        <select name="contact_id"><option value="">Select contact</option>{contact_options}</select>
        <select name="role"><option value="">Select role</option>{role_options}</select>
        <input type="text" name="notes" placeholder="Notes">
        <button type="submit">Add contact</button>
    </form>
</section>
<section><h2>Open tasks</h2><p><a href="/tasks/create?deal_id={id}">Add task</a></p>{tasks}</section>
<section><h2>Log a touchpoint</h2>{log_form}</section>
<section><h2>Touchpoints</h2>{history}</section>"#,
        id = d.id,
        pid = d.property_id,
        property = esc(&view.deal.property_label),
        stage = d.stage.label(),
        close = date_opt(d.target_close_date),
        price = money_opt(d.asking_price),
        links = links,
        notes = esc_opt(d.notes.as_deref()),
        delete = post_button(&format!("/deals/{}/delete", d.id), "Delete"),
        roles = roles,
        contact_options = contact_options,
        role_options = role_options,
        tasks = tasks::task_table(view.open_tasks, today),
        log_form = touchpoints::log_form(view.all_contacts, view.all_deals, None, Some(d.id)),
        history = touchpoints::history(view.touchpoints),
    );

    page(&d.deal_name, flash, &body)
}

/// Create form when `deal` is `None`, edit form otherwise
pub fn form(deal: Option<&DealListing>, properties: &[Property], flash: Option<&Flash>) -> String {
    let (title, action) = match deal {
        Some(d) => ("Edit Deal".to_string(), format!("/deals/{}/edit", d.deal.id)),
        None => ("New Deal".to_string(), "/deals/create".to_string()),
    };
    let deal = deal.map(|d| &d.deal);

    let property_selected = deal.map(|d| d.property_id.to_string());
    let property_options = options(
        properties.iter().map(|p| (p.id.to_string(), p.address.clone())),
        property_selected.as_deref(),
    );
    let stage_options = options(
        DealStage::ALL
            .iter()
            .map(|s| (s.as_str().to_string(), s.label())),
        Some(deal.map(|d| d.stage).unwrap_or_default().as_str()),
    );

    let body = format!(
        r#"<form method="post" action="{action}" class="stacked">
    <label>Deal name <input type="text" name="deal_name" value="{name}" required></label>
    <label>Property <select name="property_id" required><option value="">Select property</option>{property_options}</select>
        <a href="/properties/create">New property</a></label>
    <label>Stage <select name="stage">{stage_options}</select></label>
    <label>Target close <input type="date" name="target_close_date" value="{close}"></label>
    <label>Asking price <input type="text" name="asking_price" value="{price}"></label>
    <label>Links <textarea name="links" placeholder="One URL per line">{links}</textarea></label>
    <label>Notes <textarea name="notes">{notes}</textarea></label>
    <button type="submit">Save</button>
</form>"#,
        action = action,
        name = esc_opt(deal.map(|d| d.deal_name.as_str())),
        property_options = property_options,
        stage_options = stage_options,
        close = date_opt(deal.and_then(|d| d.target_close_date)),
        price = deal
            .and_then(|d| d.asking_price)
            .map(|v| v.to_string())
            .unwrap_or_default(),
        links = esc_opt(deal.and_then(|d| d.links.as_deref())),
        notes = esc_opt(deal.and_then(|d| d.notes.as_deref())),
    );

    page(&title, flash, &body)
}
