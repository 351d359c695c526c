//! Contact pages

use chrono::NaiveDate;
use mfcrm_common::models::{Contact, DealListing, OwnerListing, RoleListing, TaskListing, TouchpointListing};

use super::layout::{esc, esc_opt, page, post_button};
use super::{tasks, touchpoints};
use crate::flash::Flash;

fn tags_html(contact: &Contact) -> String {
    contact
        .tag_list()
        .into_iter()
        .map(|tag| format!(r#"<span class="tag">{}</span>"#, esc(tag)))
        .collect()
}

pub fn list(contacts: &[Contact], flash: Option<&Flash>) -> String {
    let rows: String = contacts
        .iter()
        .map(|c| {
            format!(
                r#"<tr><td><a href="/contacts/{id}">{name}</a></td><td>{company}</td><td>{role}</td><td>{phone}</td><td>{email}</td><td>{tags}</td></tr>"#,
                id = c.id,
                name = esc(&c.name),
                company = esc_opt(c.company.as_deref()),
                role = esc_opt(c.role_type.as_deref()),
                phone = esc_opt(c.phone.as_deref()),
                email = esc_opt(c.email.as_deref()),
                tags = tags_html(c),
            )
        })
        .collect();

    let body = format!(
        r#"<p><a class="button" href="/contacts/create">New contact</a></p>
<table>
<thead><tr><th>Name</th><th>Company</th><th>Role</th><th>Phone</th><th>Email</th><th>Tags</th></tr></thead>
<tbody>{}</tbody>
</table>"#,
        rows
    );
    page("Contacts", flash, &body)
}

/// Everything shown on a contact's page
pub struct ContactDetail<'a> {
    pub contact: &'a Contact,
    pub roles: &'a [RoleListing],
    pub ownerships: &'a [OwnerListing],
    pub open_tasks: &'a [TaskListing],
    pub touchpoints: &'a [TouchpointListing],
    pub all_contacts: &'a [Contact],
    pub deals: &'a [DealListing],
}

pub fn detail(view: &ContactDetail<'_>, today: NaiveDate, flash: Option<&Flash>) -> String {
    let c = view.contact;

    let roles: String = view
        .roles
        .iter()
        .map(|r| {
            format!(
                r#"<li><a href="/deals/{}">{}</a> &middot; {}</li>"#,
                r.role.deal_id,
                esc(&r.deal_name),
                r.role.role.label()
            )
        })
        .collect();

    let ownerships: String = view
        .ownerships
        .iter()
        .map(|o| {
            let pct = o
                .owner
                .ownership_percentage
                .map(|p| format!(" ({}%)", p))
                .unwrap_or_default();
            format!(
                r#"<li><a href="/properties/{}">{}</a>{}</li>"#,
                o.owner.property_id,
                esc(&o.property_label),
                pct
            )
        })
        .collect();

    let body = format!(
        r#"<section class="card">
    <dl>
        <dt>Company</dt><dd>{company}</dd>
        <dt>Role</dt><dd>{role}</dd>
        <dt>Phone</dt><dd>{phone}</dd>
        <dt>Email</dt><dd>{email}</dd>
        <dt>Tags</dt><dd>{tags}</dd>
        <dt>Notes</dt><dd class="notes">{notes}</dd>
    </dl>
    <p><a class="button" href="/contacts/{id}/edit">Edit</a> {delete}</p>
</section>
<section><h2>Deals</h2><ul>{roles}</ul></section>
<section><h2>Properties owned</h2><ul>{ownerships}</ul></section>
<section><h2>Open tasks</h2><p><a href="/tasks/create?contact_id={id}">Add task</a></p>{tasks}</section>
<section><h2>Log a touchpoint</h2>{log_form}</section>
<section><h2>Recent touchpoints</h2>{history}</section>"#,
        id = c.id,
        company = esc_opt(c.company.as_deref()),
        role = esc_opt(c.role_type.as_deref()),
        phone = esc_opt(c.phone.as_deref()),
        email = esc_opt(c.email.as_deref()),
        tags = tags_html(c),
        notes = esc_opt(c.notes.as_deref()),
        delete = post_button(&format!("/contacts/{}/delete", c.id), "Delete"),
        roles = roles,
        ownerships = ownerships,
        tasks = tasks::task_table(view.open_tasks, today),
        log_form = touchpoints::log_form(view.all_contacts, view.deals, Some(c.id), None),
        history = touchpoints::history(view.touchpoints),
    );

    page(&c.name, flash, &body)
}

/// Create form when `contact` is `None`, edit form otherwise
pub fn form(contact: Option<&Contact>, flash: Option<&Flash>) -> String {
    let (title, action) = match contact {
        Some(c) => ("Edit Contact".to_string(), format!("/contacts/{}/edit", c.id)),
        None => ("New Contact".to_string(), "/contacts/create".to_string()),
    };
    let value = |f: fn(&Contact) -> Option<&str>| esc_opt(contact.and_then(f));

    let body = format!(
        r#"<form method="post" action="{action}" class="stacked">
    <label>Name <input type="text" name="name" value="{name}" required></label>
    <label>Company <input type="text" name="company" value="{company}"></label>
    <label>Role <input type="text" name="role_type" value="{role}" placeholder="Broker, Owner, Lender..."></label>
    <label>Phone <input type="tel" name="phone" value="{phone}"></label>
    <label>Email <input type="email" name="email" value="{email}"></label>
    <label>Tags <input type="text" name="tags" value="{tags}" placeholder="comma, separated"></label>
    <label>Notes <textarea name="notes">{notes}</textarea></label>
    <button type="submit">Save</button>
</form>"#,
        action = action,
        name = value(|c| Some(c.name.as_str())),
        company = value(|c| c.company.as_deref()),
        role = value(|c| c.role_type.as_deref()),
        phone = value(|c| c.phone.as_deref()),
        email = value(|c| c.email.as_deref()),
        tags = value(|c| c.tags.as_deref()),
        notes = value(|c| c.notes.as_deref()),
    );

    page(&title, flash, &body)
}
