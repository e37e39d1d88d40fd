use nu_ansi_term::{Color, Style};
use reedline::{Highlighter, StyledText};

use crate::engine::classifier::command_prefix_len;

/// 入力行のハイライター
///
/// - 既知のコマンド部分: Magenta + Bold
/// - 引数: LightGray
/// - 未知の入力: 装飾なし
pub struct CommandHighlighter;

impl Highlighter for CommandHighlighter {
    fn highlight(&self, line: &str, _cursor: usize) -> StyledText {
        let mut styled = StyledText::new();

        let leading = line.len() - line.trim_start().len();
        let (indent, body) = line.split_at(leading);
        if !indent.is_empty() {
            styled.push((Style::default(), indent.to_string()));
        }

        match command_prefix_len(body) {
            Some(len) => {
                let (command, rest) = body.split_at(len);
                styled.push((Style::new().fg(Color::Magenta).bold(), command.to_string()));
                if !rest.is_empty() {
                    styled.push((Style::new().fg(Color::LightGray), rest.to_string()));
                }
            }
            None => styled.push((Style::default(), body.to_string())),
        }

        styled
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn highlight_segments(input: &str) -> Vec<(Style, String)> {
        CommandHighlighter.highlight(input, 0).buffer
    }

    fn cmd_style() -> Style {
        Style::new().fg(Color::Magenta).bold()
    }
    fn arg_style() -> Style {
        Style::new().fg(Color::LightGray)
    }

    #[test]
    fn command_and_argument_are_split() {
        assert_eq!(
            highlight_segments("посчитать 2+2"),
            vec![
                (cmd_style(), "посчитать".into()),
                (arg_style(), " 2+2".into()),
            ]
        );
    }

    #[test]
    fn fixed_word_is_highlighted_whole() {
        assert_eq!(highlight_segments("Привет"), vec![(cmd_style(), "Привет".into())]);
    }

    #[test]
    fn leading_whitespace_is_kept() {
        let segs = highlight_segments("  ? погода");
        assert_eq!(segs[0], (Style::default(), "  ".into()));
        assert_eq!(segs[1], (cmd_style(), "?".into()));
    }

    #[test]
    fn unknown_input_is_plain() {
        assert_eq!(
            highlight_segments("как дела"),
            vec![(Style::default(), "как дела".into())]
        );
    }
}
