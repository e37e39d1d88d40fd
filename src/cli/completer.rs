//! コマンド補完: Tab キーでコマンド名とファイルパスを補完
//!
//! - 行頭: 既知のコマンド（`открыть сайт` のような 2 語のものも含む）
//! - それ以降: カレントディレクトリ基準のファイル / ディレクトリ名

use std::env;
use std::fs;

use reedline::{Completer, Span, Suggestion};

use crate::engine::classifier::command_words;

pub struct CommandCompleter {
    /// 補完候補のコマンド（ソート済み）
    commands: Vec<&'static str>,
}

impl CommandCompleter {
    pub fn new() -> Self {
        let mut commands = command_words();
        commands.sort_unstable();
        commands.dedup();
        Self { commands }
    }

    /// 行頭からカーソルまでをコマンド名として補完する。
    fn complete_command(&self, partial: &str, span: Span) -> Vec<Suggestion> {
        let lower = partial.to_lowercase();
        self.commands
            .iter()
            .filter(|cmd| cmd.starts_with(&lower))
            .map(|cmd| suggestion(cmd.to_string(), span, true))
            .collect()
    }

    /// ファイル / ディレクトリパス補完
    fn complete_path(&self, partial: &str, span: Span) -> Vec<Suggestion> {
        let (search_dir, prefix) = split_path_prefix(partial);

        let entries = match fs::read_dir(&search_dir) {
            Ok(e) => e,
            Err(_) => return vec![],
        };

        let mut suggestions: Vec<Suggestion> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().to_string();
                if !name.starts_with(&prefix) {
                    return None;
                }
                // ドットファイルは入力が `.` で始まるときのみ表示
                if name.starts_with('.') && !prefix.starts_with('.') {
                    return None;
                }

                let is_dir = entry.file_type().map(|ft| ft.is_dir()).unwrap_or(false);

                let dir_part = partial.rfind('/').map(|idx| &partial[..=idx]).unwrap_or("");
                let value = if is_dir {
                    format!("{dir_part}{name}/")
                } else {
                    format!("{dir_part}{name}")
                };

                Some(suggestion(value, span, !is_dir))
            })
            .collect();

        suggestions.sort_by(|a, b| a.value.cmp(&b.value));
        suggestions
    }
}

fn suggestion(value: String, span: Span, append_whitespace: bool) -> Suggestion {
    Suggestion {
        value,
        description: None,
        style: None,
        extra: None,
        span,
        append_whitespace,
        match_indices: None,
    }
}

/// 部分パス文字列を「検索ディレクトリ」と「ファイル名プレフィックス」に分割する。
///
/// 例:
/// - `"src/ma"` → (`"src/"`, `"ma"`)
/// - `"file"` → (`"."`, `"file"`)
/// - `"~/do"` → (`"$HOME/"`, `"do"`)
fn split_path_prefix(partial: &str) -> (String, String) {
    let Some(idx) = partial.rfind('/') else {
        return (".".to_string(), partial.to_string());
    };

    let dir_part = &partial[..=idx];
    let file_part = &partial[idx + 1..];

    let expanded = match (dir_part.strip_prefix('~'), env::var_os("HOME")) {
        (Some(rest), Some(home)) if rest.starts_with('/') => {
            format!("{}{rest}", home.to_string_lossy())
        }
        _ => dir_part.to_string(),
    };

    (expanded, file_part.to_string())
}

/// カーソルより前の文字列から、補完対象トークンの開始位置を返す。
fn token_start(line: &str, pos: usize) -> usize {
    line[..pos].rfind(' ').map(|i| i + 1).unwrap_or(0)
}

impl Completer for CommandCompleter {
    fn complete(&mut self, line: &str, pos: usize) -> Vec<Suggestion> {
        let before = &line[..pos];

        // 2 語のコマンドがあるので、空白を含んでいてもまずコマンド名として試す
        let commands = self.complete_command(before, Span::new(0, pos));
        if !commands.is_empty() {
            return commands;
        }

        let start = token_start(line, pos);
        if start == 0 {
            return commands;
        }
        self.complete_path(&line[start..pos], Span::new(start, pos))
    }
}
