//! Property pages

use mfcrm_common::models::{Contact, Deal, OwnerListing, Property};

use super::layout::{esc,esc_opt, money_opt, options, page, post_button};
use crate::flash::Flash;

/// Raw filter values echoed back into the filter form
#[derive(Debug, Clone, Default)]
pub struct FilterEcho {
    pub city: String,
    pub min_units: String,
    pub max_units: String,
}

fn value_range(p: &Property) -> String {
    match (p.estimated_value_min, p.estimated_value_max) {
        (Some(min), Some(max)) => format!("{} - {}", money_opt(Some(min)), money_opt(Some(max))),
        (min, max) => format!("{}{}", money_opt(min), money_opt(max)),
    }
}

fn opt_num(value: Option<i64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

pub fn list(
    properties: &[Property],
    filters: &FilterEcho,
    messages: &[String],
    flash: Option<&Flash>,
) -> String {
    let notices: String = messages
        .iter()
        .map(|m| format!(r#"<div class="flash flash-error">{}</div>"#, esc(m)))
        .collect();

    let rows: String = properties
        .iter()
        .map(|p| {
            format!(
                r#"<tr><td><a href="/properties/{id}">{name}</a></td><td>{address}</td><td>{city}</td><td>{units}</td><td>{class}</td><td>{value}</td></tr>"#,
                id = p.id,
                name = esc(p.display_name()),
                address = esc(&p.address),
                city = esc_opt(p.city.as_deref()),
                units = opt_num(p.units),
                class = esc_opt(p.property_class.as_deref()),
                value = value_range(p),
            )
        })
        .collect();

    let body = format!(
        r#"{notices}
<form method="get" action="/properties/" class="filters">
    <label>City <input type="text" name="city" value="{city}"></label>
    <label>Min units <input type="text" name="min_units" value="{min}"></label>
    <label>Max units <input type="text" name="max_units" value="{max}"></label>
    <button type="submit">Filter</button> <a href="/properties/">Clear</a>
</form>
<p><a class="button" href="/properties/create">New property</a></p>
<table>
<thead><tr><th>Name</th><th>Address</th><th>City</th><th>Units</th><th>Class</th><th>Est. value</th></tr></thead>
<tbody>{rows}</tbody>
</table>"#,
        notices = notices,
        city = esc(&filters.city),
        min = esc(&filters.min_units),
        max = esc(&filters.max_units),
        rows = rows,
    );
    page("Properties", flash, &body)
}

pub fn detail(
    property: &Property,
    deals: &[Deal],
    owners: &[OwnerListing],
    all_contacts: &[Contact],
    flash: Option<&Flash>,
) -> String {
    let p = property;

    let deal_rows: String = deals
        .iter()
        .map(|d| {
            format!(
                r#"<li><a href="/deals/{}">{}</a> &middot; {}</li>"#,
                d.id,
                esc(&d.deal_name),
                d.stage.label()
            )
        })
        .collect();

    let owner_rows: String = owners
        .iter()
        .map(|o| {
            let pct = o
                .owner
                .ownership_percentage
                .map(|v| format!("{}%", v))
                .unwrap_or_default();
            format!(
                r#"<tr><td><a href="/contacts/{cid}">{name}</a></td><td>{pct}</td><td>{notes}</td><td>{remove}</td></tr>"#,
                cid = o.owner.contact_id,
                name = esc(&o.contact_name),
                pct = pct,
                notes = esc_opt(o.owner.notes.as_deref()),
                remove = post_button(
                    &format!("/properties/{}/remove_owner/{}", p.id, o.owner.id),
                    "Remove"
                ),
            )
        })
        .collect();

    let contact_options = options(
        all_contacts.iter().map(|c| (c.id.to_string(), c.name.clone())),
        None,
    );

    let score = |v: Option<i64>| v.map(|s| format!("{}/10", s)).unwrap_or_default();

    let body = format!(
        r#"<section class="card">
    <dl>
        <dt>Address</dt><dd>{address}</dd>
        <dt>City</dt><dd>{city}</dd>
        <dt>State</dt><dd>{state}</dd>
        <dt>Zip</dt><dd>{zip}</dd>
        <dt>Units</dt><dd>{units}</dd>
        <dt>Year built</dt><dd>{year}</dd>
        <dt>Class</dt><dd>{class}</dd>
        <dt>Est. value</dt><dd>{value}</dd>
        <dt>Buyer interest</dt><dd>{interest}</dd>
        <dt>Seller motivation</dt><dd>{motivation}</dd>
        <dt>Notes</dt><dd class="notes">{notes}</dd>
    </dl>
    <p><a class="button" href="/properties/{id}/edit">Edit</a> {delete}</p>
</section>
<section><h2>Deals</h2><ul>{deals}</ul><p><a href="/deals/create">New deal</a></p></section>
<section>
    <h2>Owners</h2>
    <table><thead><tr><th>Contact</th><th>Share</th><th>Notes</th><th></th></tr></thead><tbody>{owners}</tbody></table>
    <form method="post" action="/properties/{id}/add_owner" class="inline-form">
        <select name="contact_id"><option value="">Select contact</option>{contact_options}</select>
        <input type="text" name="ownership_percentage" placeholder="% owned">
        <input type="text" name="notes" placeholder="Notes">
        <button type="submit">Add owner</button>
    </form>
</section>
<section><h2>Tasks</h2><p><a href="/tasks/create?property_id={id}">Add task</a></p></section>"#,
        id = p.id,
        address = esc(&p.address),
        city = esc_opt(p.city.as_deref()),
        state = esc_opt(p.state.as_deref()),
        zip = esc_opt(p.zip_code.as_deref()),
        units = opt_num(p.units),
        year = opt_num(p.year_built),
        class = esc_opt(p.property_class.as_deref()),
        value = value_range(p),
        interest = score(p.buyer_interest),
        motivation = score(p.seller_motivation),
        notes = esc_opt(p.notes.as_deref()),
        delete = post_button(&format!("/properties/{}/delete", p.id), "Delete"),
        deals = deal_rows,
        owners = owner_rows,
        contact_options = contact_options,
    );

    page(p.display_name(), flash, &body)
}

/// Create form when `property` is `None`, edit form otherwise
pub fn form(property: Option<&Property>, flash: Option<&Flash>) -> String {
    let (title, action) = match property {
        Some(p) => ("Edit Property".to_string(), format!("/properties/{}/edit", p.id)),
        None => ("New Property".to_string(), "/properties/create".to_string()),
    };
    let text = |f: fn(&Property) -> Option<&str>| esc_opt(property.and_then(f));
    let int = |f: fn(&Property) -> Option<i64>| opt_num(property.and_then(f));
    let real = |f: fn(&Property) -> Option<f64>| {
        property
            .and_then(f)
            .map(|v| v.to_string())
            .unwrap_or_default()
    };

    let body = format!(
        r#"<form method="post" action="{action}" class="stacked">
    <label>Name <input type="text" name="name" value="{name}" placeholder="Defaults to the address"></label>
    <label>Address <input type="text" name="address" value="{address}" required></label>
    <label>City <input type="text" name="city" value="{city}"></label>
    <label>State <input type="text" name="state" value="{state}"></label>
    <label>Zip <input type="text" name="zip_code" value="{zip}"></label>
    <label>Units <input type="number" name="units" value="{units}"></label>
    <label>Year built <input type="number" name="year_built" value="{year}"></label>
    <label>Class <input type="text" name="property_class" value="{class}" placeholder="A, B, C"></label>
    <label>Est. value min <input type="text" name="estimated_value_min" value="{vmin}"></label>
    <label>Est. value max <input type="text" name="estimated_value_max" value="{vmax}"></label>
    <label>Buyer interest (1-10) <input type="number" name="buyer_interest" min="1" max="10" value="{interest}"></label>
    <label>Seller motivation (1-10) <input type="number" name="seller_motivation" min="1" max="10" value="{motivation}"></label>
    <label>Notes <textarea name="notes">{notes}</textarea></label>
    <button type="submit">Save</button>
</form>"#,
        action = action,
        name = text(|p| p.name.as_deref()),
        address = text(|p| Some(p.address.as_str())),
        city = text(|p| p.city.as_deref()),
        state = text(|p| p.state.as_deref()),
        zip = text(|p| p.zip_code.as_deref()),
        units = int(|p| p.units),
        year = int(|p| p.year_built),
        class = text(|p| p.property_class.as_deref()),
        vmin = real(|p| p.estimated_value_min),
        vmax = real(|p| p.estimated_value_max),
        interest = int(|p| p.buyer_interest),
        motivation = int(|p| p.seller_motivation),
        notes = text(|p| p.notes.as_deref()),
    );

    page(&title, flash, &body)
}
