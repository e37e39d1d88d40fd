use nu_ansi_term::{Color, Style};

fn styled(color: Color, text: &str, is_bold: bool) -> String {
    let style = if is_bold {
        color.bold()
    } else {
        Style::new().fg(color)
    };
    style.paint(text).to_string()
}

pub fn red(text: &str) -> String {
    styled(Color::LightRed, text, false)
}

pub fn green(text: &str) -> String {
    styled(Color::LightGreen, text, false)
}

pub fn yellow(text: &str) -> String {
    styled(Color::Yellow, text, false)
}

pub fn cyan(text: &str) -> String {
    styled(Color::Cyan, text, false)
}

pub fn white(text: &str) -> String {
    styled(Color::LightGray, text, false)
}

pub fn gray(text: &str) -> String {
    styled(Color::DarkGray, text, false)
}

pub fn bold_cyan(text: &str) -> String {
    styled(Color::Cyan, text, true)
}
