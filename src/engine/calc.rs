//! 四則演算の評価
//!
//! 許可する文字は `0-9 + - * / ( ) , .` と空白のみ。小数点のカンマはドットに置き換える。
//! 再帰下降で通常の演算子優先順位（単項マイナス > 乗除 > 加減）に従って評価する。

use crate::error::AssistantError;

const ALLOWED: &str = "0123456789+-*/()., ";

/// 括弧・単項演算子の入れ子の上限
const MAX_DEPTH: usize = 256;

/// `посчитать` / `calc` / `=` の処理。`"<式> = <結果>"` を返す。
pub fn calculate(expr: &str) -> Result<String, AssistantError> {
    if expr.trim().is_empty() {
        return Err(AssistantError::validation(
            "Укажите выражение для вычисления, например: посчитать 2+2",
        ));
    }
    let value = evaluate(expr)?;
    Ok(format!("{expr} = {}", format_number(value)))
}

/// 式を評価する。
pub fn evaluate(expr: &str) -> Result<f64, AssistantError> {
    if expr.chars().any(|c| !ALLOWED.contains(c)) {
        return Err(AssistantError::validation(
            "Ошибка вычисления выражения: выражение содержит недопустимые символы",
        ));
    }

    let normalized = expr.replace(',', ".");
    let tokens = tokenize(&normalized)?;
    let mut parser = Parser {
        tokens,
        pos: 0,
        depth: 0,
    };
    let value = parser.expression()?;
    if parser.pos != parser.tokens.len() {
        return Err(malformed());
    }
    if !value.is_finite() {
        return Err(AssistantError::validation(
            "Ошибка вычисления выражения: результат не является числом",
        ));
    }
    Ok(value)
}

/// 整数値は小数点なしで、それ以外は浮動小数点の丸め誤差を落として表示する。
pub fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        return format!("{}", value as i64);
    }
    let rounded = (value * 1e10).round() / 1e10;
    if rounded.is_finite() && rounded != 0.0 {
        format!("{rounded}")
    } else {
        format!("{value}")
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Number(f64),
    Plus,
    Minus,
    Star,
    Slash,
    LParen,
    RParen,
}

fn malformed() -> AssistantError {
    AssistantError::validation("Ошибка вычисления выражения: некорректное выражение")
}

fn tokenize(expr: &str) -> Result<Vec<Token>, AssistantError> {
    let mut tokens = Vec::new();
    let mut chars = expr.char_indices().peekable();

    while let Some(&(start, c)) = chars.peek() {
        let token = match c {
            ' ' => {
                chars.next();
                continue;
            }
            '+' => Token::Plus,
            '-' => Token::Minus,
            '*' => Token::Star,
            '/' => Token::Slash,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => {
                let mut end = start;
                while let Some(&(i, d)) = chars.peek() {
                    if d.is_ascii_digit() || d == '.' {
                        end = i + d.len_utf8();
                        chars.next();
                    } else {
                        break;
                    }
                }
                let number = expr[start..end].parse::<f64>().map_err(|_| malformed())?;
                tokens.push(Token::Number(number));
                continue;
            }
        };
        chars.next();
        tokens.push(token);
    }

    Ok(tokens)
}

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
    depth: usize,
}

impl Parser {
    fn peek(&self) -> Option<Token> {
        self.tokens.get(self.pos).copied()
    }

    fn next(&mut self) -> Option<Token> {
        let token = self.peek();
        self.pos += 1;
        token
    }

    /// 入れ子を 1 段深くする。上限を超えたらエラー。
    fn descend(&mut self) -> Result<(), AssistantError> {
        self.depth += 1;
        if self.depth > MAX_DEPTH {
            return Err(AssistantError::validation(
                "Ошибка вычисления выражения: слишком глубокая вложенность",
            ));
        }
        Ok(())
    }

    // expression := term (('+' | '-') term)*
    fn expression(&mut self) -> Result<f64, AssistantError> {
        let mut value = self.term()?;
        while let Some(op @ (Token::Plus | Token::Minus)) = self.peek() {
            self.pos += 1;
            let rhs = self.term()?;
            value = if op == Token::Plus { value + rhs } else { value - rhs };
        }
        Ok(value)
    }

    // term := unary (('*' | '/') unary)*
    fn term(&mut self) -> Result<f64, AssistantError> {
        let mut value = self.unary()?;
        while let Some(op @ (Token::Star | Token::Slash)) = self.peek() {
            self.pos += 1;
            let rhs = self.unary()?;
            if op == Token::Star {
                value *= rhs;
            } else {
                if rhs == 0.0 {
                    return Err(AssistantError::validation(
                        "Ошибка вычисления выражения: деление на ноль",
                    ));
                }
                value /= rhs;
            }
        }
        Ok(value)
    }

    fn unary(&mut self) -> Result<f64, AssistantError> {
        match self.peek() {
            Some(Token::Minus) => {
                self.pos += 1;
                self.descend()?;
                let value = -self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            Some(Token::Plus) => {
                self.pos += 1;
                self.descend()?;
                let value = self.unary()?;
                self.depth -= 1;
                Ok(value)
            }
            _ => self.primary(),
        }
    }

    fn primary(&mut self) -> Result<f64, AssistantError> {
        match self.next() {
            Some(Token::Number(n)) => Ok(n),
            Some(Token::LParen) => {
                self.descend()?;
                let value = self.expression()?;
                self.depth -= 1;
                match self.next() {
                    Some(Token::RParen) => Ok(value),
                    _ => Err(malformed()),
                }
            }
            _ => Err(malformed()),
        }
    }
}
