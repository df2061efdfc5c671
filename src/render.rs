//! Coloured terminal output for plans and reports.

use chrono::{DateTime, FixedOffset};
use lectio_core::diff::PendingUpdate;
use lectio_core::{CalendarEvent, DiffKind, Module, SyncPlan, SyncReport};
use owo_colors::OwoColorize;

pub trait Render {
    fn render(&self) -> String;
}

impl Render for DiffKind {
    fn render(&self) -> String {
        colorize(*self, self.symbol())
    }
}

fn colorize(kind: DiffKind, text: &str) -> String {
    match kind {
        DiffKind::Insert => text.green().to_string(),
        DiffKind::Update => text.yellow().to_string(),
        DiffKind::Delete => text.red().to_string(),
    }
}

fn render_time(start: Option<DateTime<FixedOffset>>) -> String {
    start
        .map(|start| start.format("%a %d %b %H:%M").to_string())
        .unwrap_or_else(|| "(no time)".to_string())
}

fn render_module(kind: DiffKind, module: &Module) -> String {
    format!(
        "{} {} {}",
        kind.render(),
        colorize(kind, &module.to_string()),
        render_time(Some(module.start)).dimmed()
    )
}

fn render_deleted(event: &CalendarEvent) -> String {
    let kind = DiffKind::Delete;
    format!(
        "{} {} {}",
        kind.render(),
        colorize(kind, &event.to_string()),
        render_time(event.start).dimmed()
    )
}

/// What an update changes on the stored event.
fn render_field_diffs(update: &PendingUpdate) -> Vec<String> {
    let module = &update.module;
    let event = &update.event;
    let mut lines = Vec::new();

    if event.is_cancelled() {
        lines.push(format!("{}: {}", "event".dimmed(), "restored".green()));
    }
    if event.room != module.room {
        lines.push(format!(
            "{}: {} → {}",
            "room".dimmed(),
            event.room.red(),
            module.room.green()
        ));
    }
    if event.start != Some(module.start) {
        lines.push(format!(
            "{}: {} → {}",
            "start".dimmed(),
            render_time(event.start).red(),
            render_time(Some(module.start)).green()
        ));
    }
    if event.end != Some(module.end) {
        lines.push(format!(
            "{}: {} → {}",
            "end".dimmed(),
            render_time(event.end).red(),
            render_time(Some(module.end)).green()
        ));
    }
    let stored_status = event.color.status();
    if stored_status != module.status {
        lines.push(format!(
            "{}: {} → {}",
            "status".dimmed(),
            stored_status.to_string().red(),
            module.status.to_string().green()
        ));
    }

    lines
}

/// Above this many entries of one kind, only a count is shown.
const COMPACT_THRESHOLD: usize = 5;

fn pluralize(word: &str, count: usize) -> String {
    if count == 1 {
        word.to_string()
    } else {
        format!("{word}s")
    }
}

fn render_count(kind: DiffKind, count: usize, label: &str, lines: &mut Vec<String>) {
    if count > 0 {
        let text = format!("({count} {label} {})", pluralize("event", count));
        lines.push(format!("   {} {}", kind.render(), colorize(kind, &text)));
    }
}

pub fn render_plan(plan: &SyncPlan, all: bool) -> String {
    if plan.is_empty() {
        return "   No changes".dimmed().to_string();
    }

    let mut lines = Vec::new();

    if all || plan.to_insert.len() <= COMPACT_THRESHOLD {
        for module in &plan.to_insert {
            lines.push(format!("   {}", render_module(DiffKind::Insert, module)));
        }
    } else {
        render_count(DiffKind::Insert, plan.to_insert.len(), "new", &mut lines);
    }

    if all || plan.to_update.len() <= COMPACT_THRESHOLD {
        for update in &plan.to_update {
            lines.push(format!("   {}", render_module(DiffKind::Update, &update.module)));
            lines.extend(
                render_field_diffs(update)
                    .into_iter()
                    .map(|line| format!("      {line}")),
            );
        }
    } else {
        render_count(DiffKind::Update, plan.to_update.len(), "changed", &mut lines);
    }

    if all || plan.to_delete.len() <= COMPACT_THRESHOLD {
        for event in &plan.to_delete {
            lines.push(format!("   {}", render_deleted(event)));
        }
    } else {
        render_count(DiffKind::Delete, plan.to_delete.len(), "removed", &mut lines);
    }

    lines.join("\n")
}

pub fn render_report(report: &SyncReport) -> String {
    let result = &report.result;
    let mut lines = vec![
        format!("   {} Inserted {} events", DiffKind::Insert.render(), result.inserted),
        format!("   {} Updated {} events", DiffKind::Update.render(), result.updated),
        format!("   {} Deleted {} events", DiffKind::Delete.render(), result.deleted),
    ];

    if result.is_clean() {
        lines.push(format!("   {}", "No failures".dimmed()));
    } else {
        lines.push(format!("   {}", format!("Failed {} operations", result.failed.len()).red()));
        for failure in &result.failed {
            lines.push(format!("      {}", failure.to_string().red()));
        }
    }

    lines.push(format!("   {}", format!("Took {}", report.elapsed_display()).dimmed()));
    lines.join("\n")
}
