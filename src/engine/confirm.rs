//! 削除確認の状態機械
//!
//! `Idle` と `AwaitingConfirmation(path)` の 2 状態のみ。待機中は次の入力が
//! 内容に関係なく回答として消費され、必ず `Idle` に戻る。タイムアウトはない。

use std::path::{Path, PathBuf};

use tracing::info;

/// 肯定として受け付ける回答（小文字化・前後空白除去後に比較）
const AFFIRMATIVE: &[&str] = &["да", "yes"];

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum ConfirmationState {
    #[default]
    Idle,
    AwaitingConfirmation(PathBuf),
}

/// 待機中の確認に回答した結果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Confirmed(PathBuf),
    Cancelled(PathBuf),
}

#[derive(Debug, Default)]
pub struct ConfirmationStateMachine {
    state: ConfirmationState,
}

impl ConfirmationStateMachine {
    pub fn new() -> Self {
        Self::default()
    }

    /// 削除対象を登録して確認待ちにする。既存の待機は置き換える。
    pub fn arm(&mut self, path: PathBuf) {
        info!(path = %path.display(), "Awaiting deletion confirmation");
        self.state = ConfirmationState::AwaitingConfirmation(path);
    }

    pub fn pending(&self) -> Option<&Path> {
        match &self.state {
            ConfirmationState::AwaitingConfirmation(path) => Some(path),
            ConfirmationState::Idle => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.pending().is_some()
    }

    /// 回答を消費して `Idle` に戻る。待機していなければ `None`。
    pub fn resolve(&mut self, answer: &str) -> Option<Resolution> {
        match std::mem::take(&mut self.state) {
            ConfirmationState::Idle => None,
            ConfirmationState::AwaitingConfirmation(path) => {
                let resolution = if is_affirmative(answer) {
                    Resolution::Confirmed(path)
                } else {
                    Resolution::Cancelled(path)
                };
                info!(resolution = ?resolution, "Deletion confirmation resolved");
                Some(resolution)
            }
        }
    }
}

pub fn is_affirmative(answer: &str) -> bool {
    let answer = answer.trim().to_lowercase();
    AFFIRMATIVE.contains(&answer.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_idle() {
        let sm = ConfirmationStateMachine::new();
        assert!(!sm.is_pending());
    }

    #[test]
    fn affirmative_answers_are_case_insensitive() {
        assert!(is_affirmative("да"));
        assert!(is_affirmative("ДА"));
        assert!(is_affirmative(" Yes "));
        assert!(!is_affirmative("нет"));
        assert!(!is_affirmative("y"));
        assert!(!is_affirmative("да, конечно"));
    }

    #[test]
    fn confirm_clears_state() {
        let mut sm = ConfirmationStateMachine::new();
        sm.arm(PathBuf::from("report.txt"));
        assert_eq!(sm.pending(), Some(Path::new("report.txt")));

        assert_eq!(
            sm.resolve("да"),
            Some(Resolution::Confirmed(PathBuf::from("report.txt")))
        );
        assert!(!sm.is_pending());
    }

    #[test]
    fn anything_else_cancels_and_clears_state() {
        let mut sm = ConfirmationStateMachine::new();
        sm.arm(PathBuf::from("dir"));

        assert_eq!(
            sm.resolve("удалить другое"),
            Some(Resolution::Cancelled(PathBuf::from("dir")))
        );
        assert!(!sm.is_pending());
        // 3 回目の入力ではもう待機していない
        assert_eq!(sm.resolve("да"), None);
    }

    #[test]
    fn rearming_replaces_target() {
        let mut sm = ConfirmationStateMachine::new();
        sm.arm(PathBuf::from("a"));
        sm.arm(PathBuf::from("b"));
        assert_eq!(sm.pending(), Some(Path::new("b")));
    }
}
