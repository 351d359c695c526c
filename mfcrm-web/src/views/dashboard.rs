//! Dashboard: the open-task worklist

use chrono::NaiveDate;
use mfcrm_common::models::TaskListing;

use super::layout::page;
use super::tasks::task_table;
use crate::flash::Flash;

/// Overdue and due-today counts for the summary strip
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskSummary {
    pub open: usize,
    pub overdue: usize,
    pub due_today: usize,
}

impl TaskSummary {
    pub fn of(tasks: &[TaskListing], today: NaiveDate) -> Self {
        Self {
            open: tasks.len(),
            overdue: tasks.iter().filter(|t| t.task.is_overdue(today)).count(),
            due_today: tasks.iter().filter(|t| t.task.is_due_today(today)).count(),
        }
    }
}

pub fn render(
    tasks: &[TaskListing],
    snoozed: &[TaskListing],
    today: NaiveDate,
    flash: Option<&Flash>,
) -> String {
    let summary = TaskSummary::of(tasks, today);
    let snoozed_section = if snoozed.is_empty() {
        String::new()
    } else {
        format!(
            r#"
<section class="snoozed">
<h2>Snoozed ({})</h2>
{}
</section>"#,
            snoozed.len(),
            task_table(snoozed, today)
        )
    };
    let body = format!(
        r#"<section class="summary">
    <div class="stat"><span class="stat-value">{open}</span> open</div>
    <div class="stat stat-overdue"><span class="stat-value">{overdue}</span> overdue</div>
    <div class="stat stat-today"><span class="stat-value">{due_today}</span> due today</div>
</section>
<p><a class="button" href="/tasks/create">New task</a> <a class="button" href="/touchpoints/">Log touchpoint</a></p>
{table}{snoozed_section}"#,
        open = summary.open,
        overdue = summary.overdue,
        due_today = summary.due_today,
        table = task_table(tasks, today),
        snoozed_section = snoozed_section,
    );

    page("Dashboard", flash, &body)
}
