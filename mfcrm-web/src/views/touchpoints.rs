//! Touchpoint history and the log form

use mfcrm_common::models::{Contact, DealListing, TaskPriority, TouchpointListing, TouchpointType};

use super::layout::{esc, options, page, timestamp};
use crate::flash::Flash;

/// Touchpoint history, newest first as given
pub fn history(touchpoints: &[TouchpointListing]) -> String {
    if touchpoints.is_empty() {
        return r#"<p class="empty">No touchpoints yet.</p>"#.to_string();
    }

    let items: String = touchpoints
        .iter()
        .map(|tp| {
            let who = match (tp.touchpoint.contact_id, tp.contact_name.as_deref()) {
                (Some(id), Some(name)) => format!(r#"<a href="/contacts/{}">{}</a>"#, id, esc(name)),
                _ => String::new(),
            };
            let deal = match (tp.touchpoint.deal_id, tp.deal_name.as_deref()) {
                (Some(id), Some(name)) => format!(r#" &middot; <a href="/deals/{}">{}</a>"#, id, esc(name)),
                _ => String::new(),
            };
            let next = tp
                .touchpoint
                .next_step
                .as_deref()
                .map(|n| format!(r#"<div class="next-step">Next: {}</div>"#, esc(n)))
                .unwrap_or_default();
            format!(
                r#"<li class="touchpoint"><span class="badge">{kind}</span> <time>{when}</time> {who}{deal}<div>{summary}</div>{next}</li>"#,
                kind = tp.touchpoint.touchpoint_type,
                when = timestamp(tp.touchpoint.occurred_at),
                who = who,
                deal = deal,
                summary = esc(&tp.touchpoint.summary),
                next = next,
            )
        })
        .collect();

    format!(r#"<ul class="touchpoints">{}</ul>"#, items)
}

/// Log form; `contact_id`/`deal_id` preselect the matching option
pub fn log_form(
    contacts: &[Contact],
    deals: &[DealListing],
    contact_id: Option<i64>,
    deal_id: Option<i64>,
) -> String {
    let contact_selected = contact_id.map(|id| id.to_string());
    let deal_selected = deal_id.map(|id| id.to_string());

    format!(
        r#"<form method="post" action="/touchpoints/create" class="stacked">
    <label>Contact <select name="contact_id" required><option value="">Select contact</option>{contacts}</select></label>
    <label>Deal <select name="deal_id"><option value="">(none)</option>{deals}</select></label>
    <label>Type <select name="touchpoint_type" required>{types}</select></label>
    <label>When <input type="datetime-local" name="occurred_at"></label>
    <label>Summary <textarea name="summary" required></textarea></label>
    <label>Next step <input type="text" name="next_step"></label>
    <fieldset>
        <label><input type="checkbox" name="create_task" value="yes"> Create follow-up task</label>
        <label>Due <input type="date" name="task_due_date"></label>
        <label>Task <input type="text" name="task_description" placeholder="Defaults to next step"></label>
        <label>Priority <select name="task_priority">{priorities}</select></label>
    </fieldset>
    <button type="submit">Log touchpoint</button>
</form>"#,
        contacts = options(
            contacts.iter().map(|c| (c.id.to_string(), c.name.clone())),
            contact_selected.as_deref()
        ),
        deals = options(
            deals.iter().map(|d| (d.deal.id.to_string(), d.deal.deal_name.clone())),
            deal_selected.as_deref()
        ),
        types = options(
            TouchpointType::ALL
                .iter()
                .map(|t| (t.as_str().to_string(), t.label())),
            None
        ),
        priorities = options(
            TaskPriority::ALL
                .iter()
                .map(|p| (p.as_str().to_string(), p.label())),
            Some(TaskPriority::default().as_str())
        ),
    )
}

pub fn list(
    touchpoints: &[TouchpointListing],
    contacts: &[Contact],
    deals: &[DealListing],
    flash: Option<&Flash>,
) -> String {
    let body = format!(
        r#"<section class="log"><h2>Log a touchpoint</h2>{form}</section>
<section><h2>History ({count})</h2>{history}</section>"#,
        form = log_form(contacts, deals, None, None),
        count = touchpoints.len(),
        history = history(touchpoints),
    );
    page("Touchpoints", flash, &body)
}
