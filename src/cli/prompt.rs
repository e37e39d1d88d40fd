use std::borrow::Cow;
use std::env;
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use chrono::Local;
use reedline::{Color, Prompt, PromptEditMode, PromptHistorySearch, PromptHistorySearchStatus};

use super::color::{cyan, green, red, white, yellow};

/// ホームディレクトリのパスを `~` に短縮する。
///
/// - `$HOME` そのもの → `~`
/// - `$HOME/foo/bar` → `~/foo/bar`
/// - ホーム外のパス → そのまま返す
pub fn shorten_path(path: &Path) -> String {
    if let Some(home) = dirs_home() {
        if path == home {
            return "~".to_string();
        }
        if let Ok(rel) = path.strip_prefix(&home) {
            return format!("~/{}", rel.display());
        }
    }
    path.display().to_string()
}

fn dirs_home() -> Option<std::path::PathBuf> {
    env::var_os("HOME").map(std::path::PathBuf::from)
}

/// アシスタントのプロンプト。
///
/// ```text
/// zai in ~/dev/project
/// ❯
/// ```
///
/// 削除の確認待ちの間はインジケータが `[да/нет] ❯` に変わる。
pub struct AssistantPrompt {
    /// 確認待ちかどうか。REPL ループから共有される。
    awaiting_confirmation: Arc<AtomicBool>,
}

impl AssistantPrompt {
    pub fn new(awaiting_confirmation: Arc<AtomicBool>) -> Self {
        Self {
            awaiting_confirmation,
        }
    }

    fn indicator(&self) -> String {
        if self.awaiting_confirmation.load(Ordering::Relaxed) {
            format!("{} {}", red("[да/нет]"), green("\u{276f} "))
        } else {
            green("\u{276f} ")
        }
    }
}

impl Prompt for AssistantPrompt {
    fn render_prompt_left(&self) -> Cow<'_, str> {
        let cwd = env::current_dir()
            .map(|p| shorten_path(&p))
            .unwrap_or_else(|_| "?".to_string());

        Cow::Owned(format!("{} in {}\n", cyan("zai"), yellow(&cwd)))
    }

    fn get_prompt_color(&self) -> Color {
        Color::White
    }

    fn render_prompt_right(&self) -> Cow<'_, str> {
        let now = Local::now().format("%H:%M:%S").to_string();
        Cow::Owned(white(&now))
    }

    fn render_prompt_indicator(&self, _edit_mode: PromptEditMode) -> Cow<'_, str> {
        Cow::Owned(self.indicator())
    }

    fn render_prompt_multiline_indicator(&self) -> Cow<'_, str> {
        Cow::Borrowed(" :: ")
    }

    fn render_prompt_history_search_indicator(
        &self,
        history_search: PromptHistorySearch,
    ) -> Cow<'_, str> {
        let prefix = match history_search.status {
            PromptHistorySearchStatus::Passing => "",
            PromptHistorySearchStatus::Failing => "(не найдено) ",
        };
        Cow::Owned(format!("{prefix}(поиск: '{}') ", history_search.term))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    #[test]
    fn shorten_home_dir_itself() {
        if let Some(home) = dirs_home() {
            assert_eq!(shorten_path(&home), "~");
        }
    }

    #[test]
    fn shorten_home_subdir() {
        if let Some(home) = dirs_home() {
            let sub = home.join("dev").join("project");
            assert_eq!(shorten_path(&sub), "~/dev/project");
        }
    }

    #[test]
    fn shorten_outside_home() {
        let path = PathBuf::from("/tmp");
        assert_eq!(shorten_path(&path), "/tmp");
    }

    #[test]
    fn indicator_marks_pending_confirmation() {
        let flag = Arc::new(AtomicBool::new(false));
        let prompt = AssistantPrompt::new(Arc::clone(&flag));
        assert!(!prompt.indicator().contains("[да/нет]"));

        flag.store(true, Ordering::Relaxed);
        assert!(prompt.indicator().contains("[да/нет]"));
    }
}
