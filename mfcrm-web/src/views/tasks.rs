//! Task tables and the new-task form

use chrono::NaiveDate;
use mfcrm_common::models::{Contact, DealListing, Property, TaskListing, TaskPriority, TaskStatus};

use super::layout::{date, esc, options, page, post_button};
use crate::flash::Flash;

/// Links preselected on the new-task form
#[derive(Debug, Clone, Copy, Default)]
pub struct TaskLinks {
    pub deal_id: Option<i64>,
    pub contact_id: Option<i64>,
    pub property_id: Option<i64>,
}

fn due_marker(task: &TaskListing, today: NaiveDate) -> &'static str {
    if task.task.is_overdue(today) {
        r#"<span class="badge badge-overdue">Overdue</span>"#
    } else if task.task.is_due_today(today) {
        r#"<span class="badge badge-today">Due today</span>"#
    } else {
        ""
    }
}

fn linked_to(task: &TaskListing) -> String {
    let mut links = Vec::new();
    if let (Some(id), Some(name)) = (task.task.contact_id, task.contact_name.as_deref()) {
        links.push(format!(r#"<a href="/contacts/{}">{}</a>"#, id, esc(name)));
    }
    if let (Some(id), Some(name)) = (task.task.deal_id, task.deal_name.as_deref()) {
        links.push(format!(r#"<a href="/deals/{}">{}</a>"#, id, esc(name)));
    }
    if let (Some(id), Some(label)) = (task.task.property_id, task.property_label.as_deref()) {
        links.push(format!(r#"<a href="/properties/{}">{}</a>"#, id, esc(label)));
    }
    links.join(", ")
}

fn actions(task: &TaskListing) -> String {
    let id = task.task.id;
    let mut html = String::new();
    match task.task.status {
        TaskStatus::Open => {
            html.push_str(&post_button(&format!("/tasks/{}/complete", id), "Done"));
            html.push_str(&post_button(&format!("/tasks/{}/snooze", id), "Snooze"));
        }
        TaskStatus::Snoozed | TaskStatus::Done => {
            html.push_str(&post_button(&format!("/tasks/{}/reopen", id), "Reopen"));
        }
    }
    html.push_str(&post_button(&format!("/tasks/{}/delete", id), "Delete"));
    html
}

/// Task table with due markers and status actions
pub fn task_table(tasks: &[TaskListing], today: NaiveDate) -> String {
    if tasks.is_empty() {
        return r#"<p class="empty">No open tasks.</p>"#.to_string();
    }

    let rows: String = tasks
        .iter()
        .map(|t| {
            format!(
                r#"<tr class="priority-{priority}"><td>{due} {marker}</td><td>{description}</td><td>{priority}</td><td>{links}</td><td>{actions}</td></tr>"#,
                due = date(t.task.due_date),
                marker = due_marker(t, today),
                description = esc(&t.task.description),
                priority = t.task.priority,
                links = linked_to(t),
                actions = actions(t),
            )
        })
        .collect();

    format!(
        r#"<table class="tasks">
<thead><tr><th>Due</th><th>Task</th><th>Priority</th><th>Linked to</th><th></th></tr></thead>
<tbody>{}</tbody>
</table>"#,
        rows
    )
}

/// New-task form with optional preselected links
pub fn create_form(
    links: TaskLinks,
    contacts: &[Contact],
    deals: &[DealListing],
    properties: &[Property],
    today: NaiveDate,
    flash: Option<&Flash>,
) -> String {
    let selected = |id: Option<i64>| id.map(|v| v.to_string());

    let contact_options = options(
        contacts.iter().map(|c| (c.id.to_string(), c.name.clone())),
        selected(links.contact_id).as_deref(),
    );
    let deal_options = options(
        deals.iter().map(|d| (d.deal.id.to_string(), d.deal.deal_name.clone())),
        selected(links.deal_id).as_deref(),
    );
    let property_options = options(
        properties
            .iter()
            .map(|p| (p.id.to_string(), p.display_name().to_string())),
        selected(links.property_id).as_deref(),
    );
    let priority_options = options(
        TaskPriority::ALL
            .iter()
            .map(|p| (p.as_str().to_string(), p.label())),
        Some(TaskPriority::default().as_str()),
    );

    let body = format!(
        r#"<form method="post" action="/tasks/create" class="stacked">
    <label>Description <textarea name="description" required></textarea></label>
    <label>Due date <input type="date" name="due_date" value="{today}" required></label>
    <label>Priority <select name="priority">{priority_options}</select></label>
    <label>Contact <select name="contact_id"><option value="">(none)</option>{contact_options}</select></label>
    <label>Deal <select name="deal_id"><option value="">(none)</option>{deal_options}</select></label>
    <label>Property <select name="property_id"><option value="">(none)</option>{property_options}</select></label>
    <button type="submit">Create task</button>
</form>"#,
        today = date(today),
        priority_options = priority_options,
        contact_options = contact_options,
        deal_options = deal_options,
        property_options = property_options,
    );

    page("New Task", flash, &body)
}
