use std::io::{self, IsTerminal, Write};

use chrono::Local;
use unicode_width::UnicodeWidthStr;

use crate::config::Config;
use crate::dashboard::DashboardSnapshot;
use crate::task::{Task, priority_style};

const DESCRIPTION_PREVIEW_CHARS: usize = 40;

#[derive(Debug, Clone)]
pub struct Renderer {
    color: bool,
}

impl Renderer {
    /// Color follows the `color` setting and is only used on a terminal.
    pub fn new(cfg: &Config) -> Self {
        let color = cfg.get_bool("color").unwrap_or(true) && io::stdout().is_terminal();
        Self { color }
    }

    pub fn plain() -> Self {
        Self { color: false }
    }

    #[tracing::instrument(skip(self, out, tasks))]
    pub fn write_task_table<'a, W, I>(&self, out: &mut W, tasks: I) -> anyhow::Result<()>
    where
        W: Write,
        I: IntoIterator<Item = &'a Task>,
    {
        let headers = ["ID", "Estado", "Prioridad", "Título", "Descripción", "Creada"]
            .map(str::to_string)
            .to_vec();

        let rows = tasks
            .into_iter()
            .map(|task| self.task_row(task))
            .collect::<Vec<_>>();

        if rows.is_empty() {
            writeln!(out, "No hay tareas")?;
            return Ok(());
        }

        write_table(out, headers, rows)
    }

    pub fn write_task<W: Write>(&self, out: &mut W, task: &Task) -> anyhow::Result<()> {
        let style = priority_style(task.priority);
        writeln!(out, "id           {}", task.id)?;
        writeln!(out, "título       {}", task.title)?;
        writeln!(out, "descripción  {}", task.description)?;
        writeln!(
            out,
            "prioridad    {}",
            self.paint(&format!("{} {}", style.marker, style.label), style.color)
        )?;
        writeln!(
            out,
            "estado       {}",
            if task.is_done { "completada" } else { "pendiente" }
        )?;
        writeln!(
            out,
            "creada       {}",
            task.created_at.with_timezone(&Local).format("%Y-%m-%d %H:%M")
        )?;
        Ok(())
    }

    pub fn write_stats<W: Write>(
        &self,
        out: &mut W,
        snapshot: &DashboardSnapshot,
    ) -> anyhow::Result<()> {
        writeln!(out, "Total        {}", snapshot.task_count())?;
        writeln!(
            out,
            "Pendientes   {}",
            self.paint(&snapshot.pending_count().to_string(), "33")
        )?;
        writeln!(
            out,
            "Completadas  {}",
            self.paint(&snapshot.completed_count().to_string(), "32")
        )?;
        Ok(())
    }

    fn task_row(&self, task: &Task) -> Vec<String> {
        let style = priority_style(task.priority);
        let status = if task.is_done { "[x]" } else { "[ ]" };
        let title = if task.is_done {
            self.paint(&task.title, "9")
        } else {
            task.title.clone()
        };

        vec![
            self.paint(&task.id, "36"),
            status.to_string(),
            self.paint(&format!("{} {}", style.marker, style.label), style.color),
            title,
            preview(&task.description, DESCRIPTION_PREVIEW_CHARS),
            task.created_at
                .with_timezone(&Local)
                .format("%Y-%m-%d")
                .to_string(),
        ]
    }

    fn paint(&self, text: &str, code: &str) -> String {
        if !self.color {
            return text.to_string();
        }
        format!("\x1b[{code}m{text}\x1b[0m")
    }
}

fn preview(text: &str, max_chars: usize) -> String {
    let single_line = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if single_line.chars().count() <= max_chars {
        return single_line;
    }
    let mut cut = single_line
        .chars()
        .take(max_chars.saturating_sub(1))
        .collect::<String>();
    cut.push('…');
    cut
}

fn write_table<W: Write>(
    out: &mut W,
    headers: Vec<String>,
    rows: Vec<Vec<String>>,
) -> anyhow::Result<()> {
    let mut widths = headers
        .iter()
        .map(|header| UnicodeWidthStr::width(header.as_str()))
        .collect::<Vec<_>>();

    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(visible_width(cell));
        }
    }

    let header_line = headers
        .iter()
        .zip(&widths)
        .map(|(header, width)| pad(header, *width))
        .collect::<Vec<_>>();
    writeln!(out, "{}", header_line.join(" ").trim_end())?;

    let rule = widths
        .iter()
        .map(|width| "-".repeat(*width))
        .collect::<Vec<_>>();
    writeln!(out, "{}", rule.join(" "))?;

    for row in rows {
        let line = row
            .iter()
            .zip(&widths)
            .map(|(cell, width)| pad(cell, *width))
            .collect::<Vec<_>>();
        writeln!(out, "{}", line.join(" ").trim_end())?;
    }

    Ok(())
}

fn pad(cell: &str, width: usize) -> String {
    let padding = width.saturating_sub(visible_width(cell));
    format!("{cell}{}", " ".repeat(padding))
}

fn visible_width(cell: &str) -> usize {
    UnicodeWidthStr::width(strip_ansi(cell).as_str())
}

fn strip_ansi(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut in_escape = false;

    for ch in s.chars() {
        match (in_escape, ch) {
            (true, 'm') => in_escape = false,
            (true, _) => {}
            (false, '\x1b') => in_escape = true,
            (false, _) => out.push(ch),
        }
    }

    out
}
