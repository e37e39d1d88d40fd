//! 入力分類器: テキストを接頭辞の優先順位表で意図に振り分ける
//!
//! 判定は小文字化した入力に対して行い、引数は元の大文字小文字のまま取り出す。
//! 表は上から順に試し、最初に一致した規則が勝つ。
//!
//! 接頭辞は単語境界を見ない。このため次の重なりがある:
//! - `=` は先頭にあれば常に計算になる（`=` の後ろが文字でも同じ）
//! - `calc` は `calculate` も拾う
//! - `rm` / `ls` / `dir` / `cat` は `rmdir` / `lsblk` / `directory` / `catalog` のような語も拾う
//! - `delete` は `dir` より先に試されるが、互いの接頭辞にはならない
//! - `?` は表の最後（`спроси` と同じ規則）なので `=?` は計算になる
//! - 固定語 (`привет`, `время`, `очистить`, `забыть` と英語版) はどの接頭辞にも一致しない

use tracing::debug;

/// 分類結果。引数が空の場合は各ハンドラが使い方を返す。
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Intent {
    AskAi { question: String },
    OpenSite { url: String },
    Calculate { expr: String },
    SetApiKey { key: String },
    SetModel { model: String },
    ShowConfig,
    CreateFile { path: String, content: String },
    SetContextLength { value: String },
    Delete { path: String },
    ListDirectory { path: Option<String> },
    ReadFile { path: String },
    Greeting,
    Time,
    ClearOutput,
    ForgetContext,
    Unknown,
}

/// 接頭辞規則: いずれかの接頭辞で始まれば `build` で意図を組み立てる。
pub struct PrefixRule {
    pub name: &'static str,
    pub prefixes: &'static [&'static str],
    build: fn(&str) -> Intent,
}

/// 優先順位表（上ほど優先）
pub const PREFIX_RULES: &[PrefixRule] = &[
    PrefixRule {
        name: "open-site",
        prefixes: &["открыть сайт", "open site"],
        build: |text| Intent::OpenSite {
            url: arg(text, 3, 2),
        },
    },
    PrefixRule {
        name: "calculate",
        prefixes: &["посчитать", "calc", "="],
        build: |text| Intent::Calculate {
            expr: match text.strip_prefix('=') {
                Some(rest) => rest.trim().to_string(),
                None => arg(text, 2, 1),
            },
        },
    },
    PrefixRule {
        name: "set-key",
        prefixes: &["setkey", "apikey"],
        build: |text| Intent::SetApiKey {
            key: arg(text, 2, 1),
        },
    },
    PrefixRule {
        name: "set-model",
        prefixes: &["setmodel"],
        build: |text| Intent::SetModel {
            model: arg(text, 2, 1),
        },
    },
    PrefixRule {
        name: "show-config",
        prefixes: &["showconfig"],
        build: |_| Intent::ShowConfig,
    },
    PrefixRule {
        name: "create-file",
        prefixes: &["создать файл", "create file"],
        build: |text| Intent::CreateFile {
            path: arg(text, 4, 2),
            content: arg(text, 4, 3),
        },
    },
    PrefixRule {
        name: "set-context-length",
        prefixes: &["setcontext"],
        build: |text| Intent::SetContextLength {
            value: arg(text, 2, 1),
        },
    },
    PrefixRule {
        name: "delete",
        prefixes: &["удалить", "rm", "delete"],
        build: |text| Intent::Delete {
            path: arg(text, 2, 1),
        },
    },
    PrefixRule {
        name: "list-directory",
        prefixes: &["dir", "ls"],
        build: |text| {
            let path = arg(text, 2, 1);
            Intent::ListDirectory {
                path: (!path.is_empty()).then_some(path),
            }
        },
    },
    PrefixRule {
        name: "read-file",
        prefixes: &["читать", "cat"],
        build: |text| Intent::ReadFile {
            path: arg(text, 2, 1),
        },
    },
    PrefixRule {
        name: "ask-ai",
        prefixes: &["спроси", "?"],
        build: |text| Intent::AskAi {
            question: match text.strip_prefix('?') {
                Some(rest) => rest.trim().to_string(),
                None => arg(text, 2, 1),
            },
        },
    },
];

/// 入力テキストを意図に分類する。
pub fn classify(input: &str) -> Intent {
    let text = input.trim();
    let lower = text.to_lowercase();

    for rule in PREFIX_RULES {
        if rule.prefixes.iter().any(|p| lower.starts_with(p)) {
            debug!(input = %text, rule = rule.name, "Classified by prefix rule");
            return (rule.build)(text);
        }
    }

    let intent = match lower.as_str() {
        "привет" | "hello" => Intent::Greeting,
        "время" | "time" => Intent::Time,
        "очистить" | "clear" => Intent::ClearOutput,
        "забыть" | "forget" => Intent::ForgetContext,
        _ => Intent::Unknown,
    };
    debug!(input = %text, intent = ?intent, "Classified by fixed word");
    intent
}

/// 完全一致で判定する固定語
pub const FIXED_WORDS: &[&str] = &[
    "привет", "hello", "время", "time", "очистить", "clear", "забыть", "forget",
];

/// 補完候補用: 文字で始まる接頭辞と固定語の一覧（記号の接頭辞は除く）
pub fn command_words() -> Vec<&'static str> {
    PREFIX_RULES
        .iter()
        .flat_map(|rule| rule.prefixes.iter().copied())
        .filter(|p| p.chars().next().is_some_and(char::is_alphabetic))
        .chain(FIXED_WORDS.iter().copied())
        .collect()
}

/// 入力先頭の既知コマンド部分のバイト長を返す（ハイライト用）。
pub fn command_prefix_len(input: &str) -> Option<usize> {
    let lower = input.to_lowercase();
    if FIXED_WORDS.contains(&lower.trim_end()) {
        return Some(input.trim_end().len());
    }
    PREFIX_RULES
        .iter()
        .flat_map(|rule| rule.prefixes.iter())
        .find(|p| lower.starts_with(*p))
        .and_then(|p| {
            // 小文字化でバイト長が変わり得るので文字数で数える
            let chars = p.chars().count();
            input.char_indices().nth(chars).map(|(i, _)| i).or(Some(input.len()))
        })
}

/// 空白で最大 `limit` 個に分割し、`index` 番目を返す（なければ空文字列）。
/// 最後の要素には残り全体が入る。連続する空白は区切り 1 つとして扱う。
fn arg(text: &str, limit: usize, index: usize) -> String {
    split_words(text, limit)
        .get(index)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

fn split_words(text: &str, limit: usize) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut rest = text.trim_start_matches(' ');

    while !rest.is_empty() {
        if parts.len() + 1 == limit {
            parts.push(rest);
            break;
        }
        match rest.find(' ') {
            Some(i) => {
                parts.push(&rest[..i]);
                rest = rest[i..].trim_start_matches(' ');
            }
            None => {
                parts.push(rest);
                break;
            }
        }
    }

    parts
}
