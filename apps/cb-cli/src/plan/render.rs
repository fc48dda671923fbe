//! Plan output: colored table for review, JSON/YAML for scripting

use std::fmt::Write as _;
use std::io::IsTerminal;

use clap::ValueEnum;

use super::ChangePlan;
use crate::error::CliResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Sections per kind (default)
    #[default]
    Table,
    Json,
    Yaml,
}

const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const BOLD: &str = "\x1b[1m";
const RESET: &str = "\x1b[0m";

/// Check if we should use colored output
pub fn should_use_color(no_color_flag: bool) -> bool {
    if no_color_flag {
        return false;
    }
    if std::env::var("NO_COLOR").is_ok() {
        return false;
    }
    std::io::stdout().is_terminal()
}

struct Painter {
    color: bool,
}

impl Painter {
    fn paint(&self, code: &str, text: &str) -> String {
        if self.color {
            format!("{code}{text}{RESET}")
        } else {
            text.to_string()
        }
    }
}

pub fn render_plan(plan: &ChangePlan, format: OutputFormat, use_color: bool) -> CliResult<String> {
    match format {
        OutputFormat::Table => Ok(render_table(plan, use_color)),
        OutputFormat::Json => Ok(serde_json::to_string_pretty(plan)? + "\n"),
        OutputFormat::Yaml => Ok(serde_yaml::to_string(plan)?),
    }
}

fn render_table(plan: &ChangePlan, use_color: bool) -> String {
    let p = Painter { color: use_color };
    let mut out = String::new();

    for (kind, changes) in plan.sections() {
        let _ = writeln!(out, "{}", p.paint(BOLD, kind.section_title()));
        for name in &changes.to_create {
            let _ = writeln!(out, "  {} {name}", p.paint(GREEN, "+ create"));
        }
        for name in &changes.to_update {
            let _ = writeln!(out, "  {} {name}", p.paint(YELLOW, "~ update"));
        }
        if let Some(columns) = &changes.columns {
            for column in &columns.to_add {
                let _ = writeln!(out, "  {} {column}", p.paint(GREEN, "+ column"));
            }
            for column in &columns.to_remove {
                let _ = writeln!(out, "  {} {column}", p.paint(RED, "- column"));
            }
        }
        out.push('\n');
    }

    if !plan.warnings.is_empty() {
        let _ = writeln!(out, "{}", p.paint(YELLOW, "Warnings:"));
        for warning in &plan.warnings {
            let _ = writeln!(out, "  ! {warning}");
        }
        out.push('\n');
    }

    if plan.is_blocked() {
        let _ = writeln!(out, "{}", p.paint(RED, "Errors:"));
        for error in &plan.errors {
            let _ = writeln!(out, "  ✗ {error}");
        }
        let _ = writeln!(
            out,
            "\nPlan is blocked by {} error(s); nothing will be applied.",
            plan.errors.len()
        );
        return out;
    }

    if !plan.has_changes() {
        out.push_str("No changes. Local assets match the remote system.\n");
        return out;
    }

    let (mut create, mut update, mut add, mut remove) = (0, 0, 0, 0);
    for (_, changes) in plan.sections() {
        create += changes.to_create.len();
        update += changes.to_update.len();
        if let Some(columns) = &changes.columns {
            add += columns.to_add.len();
            remove += columns.to_remove.len();
        }
    }
    let _ = write!(out, "Plan: {create} to create, {update} to update");
    if add + remove > 0 {
        let _ = write!(out, ", {add} column(s) to add, {remove} to drop");
    }
    out.push_str(".\n");
    out
}
