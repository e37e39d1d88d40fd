//! ファイル操作ハンドラ（作成・読み込み・一覧・削除）

use std::path::{Path, PathBuf};

use tokio::fs;
use tracing::{info, warn};

use crate::error::AssistantError;

/// `создать файл <путь> [содержимое]`: ファイルを作成（既存なら上書き）する。
///
/// 内容に含まれる `\n` などのエスケープ列は実際の制御文字に戻してから書き込む。
pub async fn create_file(path: &str, content: &str) -> Result<String, AssistantError> {
    if path.is_empty() {
        return Err(AssistantError::validation(
            "Укажите путь к файлу, например: создать файл notes.txt Привет, мир!",
        ));
    }

    let decoded = decode_escapes(content);
    match fs::write(path, &decoded).await {
        Ok(()) => {
            info!(path = %path, bytes = decoded.len(), "File created");
            Ok(format!("Файл успешно создан: {path}"))
        }
        Err(e) => {
            warn!(path = %path, error = %e, "Failed to create file");
            Err(AssistantError::file_system(format!(
                "Ошибка при создании файла: {e}"
            )))
        }
    }
}

/// `читать <путь>`: ファイル内容をそのまま返す。
pub async fn read_file(path: &str) -> Result<String, AssistantError> {
    if path.is_empty() {
        return Err(AssistantError::validation(
            "Укажите путь к файлу, например: читать notes.txt",
        ));
    }

    fs::read_to_string(path).await.map_err(|e| {
        warn!(path = %path, error = %e, "Failed to read file");
        AssistantError::file_system(format!("Ошибка при чтении файла: {e}"))
    })
}

/// `dir [путь]`: 直下のエントリをファイル/フォルダの印付きで一覧する。
/// パス省略時はカレントディレクトリ。
pub async fn list_directory(path: Option<&str>) -> Result<String, AssistantError> {
    let path = path.unwrap_or(".");

    let is_dir = fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false);
    if !is_dir {
        return Err(AssistantError::file_system(format!(
            "Папка не найдена: {path}"
        )));
    }

    let access_error =
        |e: std::io::Error| AssistantError::file_system(format!("Ошибка доступа к папке: {e}"));

    let mut reader = fs::read_dir(path).await.map_err(access_error)?;
    let mut entries = Vec::new();
    while let Some(entry) = reader.next_entry().await.map_err(access_error)? {
        // シンボリックリンクは辿った先の種類で判定する
        let entry_is_dir = fs::metadata(entry.path())
            .await
            .map(|m| m.is_dir())
            .unwrap_or(false);
        entries.push((entry.file_name().to_string_lossy().into_owned(), entry_is_dir));
    }

    if entries.is_empty() {
        return Ok(format!("Папка '{path}' пуста."));
    }

    entries.sort();
    let lines: Vec<String> = entries
        .iter()
        .map(|(name, is_dir)| {
            let icon = if *is_dir { "📁" } else { "📄" };
            format!("{icon} {name}")
        })
        .collect();

    Ok(format!("Содержимое папки '{path}':\n{}", lines.join("\n")))
}

/// 削除対象が存在することを確認する。ファイルシステムには触れない。
pub async fn resolve_delete_target(path: &str) -> Result<PathBuf, AssistantError> {
    if path.is_empty() {
        return Err(AssistantError::validation(
            "Укажите путь к файлу или папке для удаления.",
        ));
    }
    if fs::symlink_metadata(path).await.is_err() {
        return Err(AssistantError::file_system(format!(
            "Файл или папка не найдены: {path}"
        )));
    }
    Ok(PathBuf::from(path))
}

/// 確認済みの削除を実行する。ディレクトリは中身ごと削除する。
/// 途中で失敗した場合の巻き戻しはしない。
pub async fn delete_path(path: &Path) -> Result<String, AssistantError> {
    let metadata = fs::symlink_metadata(path).await.map_err(|_| {
        AssistantError::file_system(format!(
            "Файл или папка не найдены: {}",
            path.display()
        ))
    })?;

    let delete_error = |e: std::io::Error| {
        warn!(path = %path.display(), error = %e, "Deletion failed");
        AssistantError::file_system(format!("Ошибка при удалении: {e}"))
    };

    if metadata.is_dir() {
        fs::remove_dir_all(path).await.map_err(delete_error)?;
        info!(path = %path.display(), "Directory deleted");
        Ok(format!("Папка удалена: {}", path.display()))
    } else {
        fs::remove_file(path).await.map_err(delete_error)?;
        info!(path = %path.display(), "File deleted");
        Ok(format!("Файл удален: {}", path.display()))
    }
}

/// `\n` `\t` `\r` `\0` `\\` `\"` `\'` `\uXXXX` `\xHH` を対応する文字に置き換える。
/// 解釈できない列はそのまま残す。
pub fn decode_escapes(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.peek().copied() {
            Some('n') => push_escaped(&mut out, &mut chars, '\n'),
            Some('t') => push_escaped(&mut out, &mut chars, '\t'),
            Some('r') => push_escaped(&mut out, &mut chars, '\r'),
            Some('0') => push_escaped(&mut out, &mut chars, '\0'),
            Some('\\') => push_escaped(&mut out, &mut chars, '\\'),
            Some('"') => push_escaped(&mut out, &mut chars, '"'),
            Some('\'') => push_escaped(&mut out, &mut chars, '\''),
            Some(kind @ ('u' | 'x')) => {
                let width = if kind == 'u' { 4 } else { 2 };
                let hex: String = chars.clone().skip(1).take(width).collect();
                let decoded = (hex.len() == width)
                    .then(|| u32::from_str_radix(&hex, 16).ok())
                    .flatten()
                    .and_then(char::from_u32);
                match decoded {
                    Some(ch) => {
                        out.push(ch);
                        for _ in 0..=width {
                            chars.next();
                        }
                    }
                    None => out.push('\\'),
                }
            }
            _ => out.push('\\'),
        }
    }

    out
}

fn push_escaped(
    out: &mut String,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
    decoded: char,
) {
    out.push(decoded);
    chars.next();
}
