// 出力整形
//
// コマンド出力をテキスト（枠付きパネル、番号付きテーブル）またはJSONに整形します。
// 整形結果は文字列として返し、標準出力への書き込みは呼び出し側が行います。

use crate::cli::OutputFormat;
use crate::services::command_registrar::{CommandOutput, NoticeLevel};
use anyhow::{Context, Result};
use colored::{ColoredString, Colorize};
use std::fmt::Write;
use unicode_width::UnicodeWidthStr;

/// 番号列の幅
const INDEX_WIDTH: usize = 4;

/// 指定フォーマットで出力を整形
pub fn render(output: &CommandOutput, format: OutputFormat) -> Result<String> {
    match format {
        OutputFormat::Text => Ok(render_text(output)),
        OutputFormat::Json => {
            serde_json::to_string_pretty(output).context("Failed to serialize output as JSON")
        }
    }
}

/// テキスト形式で整形
pub fn render_text(output: &CommandOutput) -> String {
    match output {
        CommandOutput::Listing { title, rows } => table(title, rows),
        other => panel(other.level().unwrap_or(NoticeLevel::Info), &other.body()),
    }
}

/// パネルのタイトル
pub fn panel_title(level: NoticeLevel) -> &'static str {
    match level {
        NoticeLevel::Info => "Info",
        NoticeLevel::Warning => "Warning",
        NoticeLevel::Error => "Error",
    }
}

fn border(level: NoticeLevel, text: &str) -> ColoredString {
    match level {
        NoticeLevel::Info => text.white(),
        NoticeLevel::Warning => text.yellow(),
        NoticeLevel::Error => text.red(),
    }
}

/// 左寄せタイトル付きの枠でメッセージを囲む
///
/// 幅は端末上の表示幅（全角文字は2桁）で揃えます。
///
/// ```text
/// ╭─ Warning ──────────────────╮
/// │ No TASK instances found.   │
/// ╰────────────────────────────╯
/// ```
pub fn panel(level: NoticeLevel, message: &str) -> String {
    let title = panel_title(level);
    let lines: Vec<&str> = message.lines().collect();
    let inner = lines
        .iter()
        .map(|line| line.width())
        .max()
        .unwrap_or(0)
        .max(title.width() + 2);

    let mut out = String::new();
    let top_rest = "─".repeat(inner + 2 - title.width() - 3);
    let _ = writeln!(
        out,
        "{}{}{}",
        border(level, "╭─ "),
        title.bold(),
        border(level, &format!(" {}╮", top_rest))
    );

    for line in &lines {
        let pad = " ".repeat(inner - line.width());
        let _ = writeln!(
            out,
            "{} {}{} {}",
            border(level, "│"),
            line.bold(),
            pad,
            border(level, "│")
        );
    }

    let _ = write!(out, "{}", border(level, &format!("╰{}╯", "─".repeat(inner + 2))));
    out
}

/// 番号付きの一覧テーブル
///
/// 1列目は1始まりの連番、2列目がタイトル列です。
pub fn table(title: &str, rows: &[String]) -> String {
    let width = rows
        .iter()
        .map(|row| row.width())
        .max()
        .unwrap_or(0)
        .max(title.width());

    let rule = |left: &str, mid: &str, right: &str| {
        format!(
            "{}{}{}{}{}",
            left,
            "─".repeat(INDEX_WIDTH + 2),
            mid,
            "─".repeat(width + 2),
            right
        )
    };

    let mut out = String::new();
    let _ = writeln!(out, "{}", rule("┏", "┳", "┓"));
    let _ = writeln!(
        out,
        "│ {} │ {}{} │",
        format!("{:<iw$}", "#", iw = INDEX_WIDTH).bold(),
        title.bold(),
        " ".repeat(width - title.width())
    );
    let _ = writeln!(out, "{}", rule("┡", "╇", "┩"));

    for (i, row) in rows.iter().enumerate() {
        let _ = writeln!(
            out,
            "│ {} │ {}{} │",
            format!("{:<iw$}", i + 1, iw = INDEX_WIDTH).dimmed(),
            row.bold(),
            " ".repeat(width - row.width())
        );
    }

    let _ = write!(out, "{}", rule("└", "┴", "┘"));
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn no_color() {
        colored::control::set_override(false);
    }

    #[test]
    fn test_panel_contains_title_and_message() {
        no_color();
        let rendered = panel(NoticeLevel::Warning, "No TASK instances found.");
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 3);
        assert!(lines[0].starts_with("╭─ Warning "));
        assert_eq!(lines[1], "│ No TASK instances found. │");
        assert_eq!(
            lines[0].chars().count(),
            lines[1].chars().count(),
            "borders line up"
        );
        assert_eq!(lines[2].chars().count(), lines[1].chars().count());
    }

    #[test]
    fn test_panel_multiline() {
        no_color();
        let rendered = panel(NoticeLevel::Info, "* id: 1\n* title: buy milk");
        assert!(rendered.contains("│ * id: 1           │"));
        assert!(rendered.contains("│ * title: buy milk │"));
    }

    #[test]
    fn test_table_numbers_rows() {
        no_color();
        let rendered = table("TASK", &["<Task: 1>".to_string(), "<Task: 2>".to_string()]);
        let lines: Vec<&str> = rendered.lines().collect();

        assert_eq!(lines.len(), 6);
        assert!(lines[1].contains("TASK"));
        assert!(lines[3].starts_with("│ 1    │ <Task: 1>"));
        assert!(lines[4].starts_with("│ 2    │ <Task: 2>"));
    }

    #[test]
    fn test_wide_characters_keep_borders_aligned() {
        no_color();
        let rendered = panel(NoticeLevel::Info, "* id: 1\n* title: 牛乳を買う 🥛");
        let widths: Vec<usize> = rendered.lines().map(|line| line.width()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]), "{:?}", widths);
        assert!(rendered.contains("│ * title: 牛乳を買う 🥛 │"));

        let rendered = table("TASK", &["<Task: 牛乳>".to_string(), "<Task: 2>".to_string()]);
        let widths: Vec<usize> = rendered.lines().map(|line| line.width()).collect();
        assert!(widths.iter().all(|w| *w == widths[0]), "{:?}", widths);
    }

    #[test]
    fn test_render_json() {
        let json = render(&CommandOutput::error("boom"), OutputFormat::Json).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["type"], "notice");
        assert_eq!(value["level"], "error");
        assert_eq!(value["message"], "boom");
    }
}
