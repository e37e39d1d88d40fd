//! サイトを開くハンドラ

use std::process::{Command, Stdio};

use anyhow::{Context, Result};
use tracing::{info, warn};

use crate::error::AssistantError;

/// URL をブラウザで開く手段。テストでは記録するだけの実装に差し替える。
pub trait SiteOpener: Send + Sync {
    fn open(&self, url: &str) -> Result<()>;
}

/// OS 標準のオープナー（`xdg-open` / `open` / `cmd /C start`）で開く。
pub struct SystemOpener;

impl SiteOpener for SystemOpener {
    fn open(&self, url: &str) -> Result<()> {
        let (program, args) = opener_command(url);
        let resolved = which::which(program)
            .with_context(|| format!("{program} not found in PATH"))?;
        Command::new(resolved)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .with_context(|| format!("failed to launch {program}"))?;
        Ok(())
    }
}

#[cfg(target_os = "macos")]
fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    ("open", vec![url.to_string()])
}

#[cfg(target_os = "windows")]
fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    (
        "cmd",
        vec!["/C".to_string(), "start".to_string(), String::new(), url.to_string()],
    )
}

#[cfg(not(any(target_os = "macos", target_os = "windows")))]
fn opener_command(url: &str) -> (&'static str, Vec<String>) {
    ("xdg-open", vec![url.to_string()])
}

/// スキームがなければ `https://` を補う。
pub fn normalize_url(url: &str) -> String {
    if url.starts_with("http://") || url.starts_with("https://") {
        url.to_string()
    } else {
        format!("https://{url}")
    }
}

/// `открыть сайт <url>`
pub fn open_site(opener: &dyn SiteOpener, url: &str) -> Result<String, AssistantError> {
    if url.is_empty() {
        return Err(AssistantError::validation(
            "Укажите URL после команды, например: открыть сайт google.com",
        ));
    }

    let url = normalize_url(url);
    match opener.open(&url) {
        Ok(()) => {
            info!(url = %url, "Site opened");
            Ok(format!("Открываю сайт: {url}"))
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Failed to open site");
            Ok(format!("Не удалось открыть сайт {url}: {e}"))
        }
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use std::sync::{Arc, Mutex};

    use super::*;

    /// 開こうとした URL を記録するだけのオープナー
    #[derive(Clone, Default)]
    pub(crate) struct RecordingOpener {
        pub(crate) opened: Arc<Mutex<Vec<String>>>,
    }

    impl SiteOpener for RecordingOpener {
        fn open(&self, url: &str) -> Result<()> {
            self.opened.lock().unwrap().push(url.to_string());
            Ok(())
        }
    }
}
