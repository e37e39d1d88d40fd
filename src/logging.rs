//! ログ初期化モジュール
//!
//! `tracing` + `tracing-subscriber` でログを追記専用のテキストファイルに出力する。
//! ログファイルはデータディレクトリの `logs/` に日次ローテーション（ローカル時刻基準）で保存される。
//! ログ出力はベストエフォートで、初期化や書き込みの失敗がコマンド処理を止めることはない。

use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDate};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::FormatTime;
use tracing_subscriber::{fmt, EnvFilter};

/// ログファイル名のプレフィックス
const LOG_PREFIX: &str = "zai.log";

/// ログ行のタイムスタンプをローカル時刻で出力するタイマー
struct LocalTimer;

impl FormatTime for LocalTimer {
    fn format_time(&self, w: &mut tracing_subscriber::fmt::format::Writer<'_>) -> std::fmt::Result {
        write!(w, "{}", Local::now().format("%Y-%m-%d %H:%M:%S%.3f"))
    }
}

/// ローカル日付で日次ローテーションするファイルアペンダー。
///
/// 書き込み時に日付を確認し、変わっていれば新しいファイルを開く。
struct DailyAppender {
    dir: PathBuf,
    current_date: NaiveDate,
    file: File,
}

impl DailyAppender {
    fn new(dir: PathBuf) -> std::io::Result<Self> {
        let today = Local::now().date_naive();
        let file = Self::open_log_file(&dir, today)?;
        Ok(Self {
            dir,
            current_date: today,
            file,
        })
    }

    fn open_log_file(dir: &Path, date: NaiveDate) -> std::io::Result<File> {
        OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(log_file_name(date)))
    }
}

impl Write for DailyAppender {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        let today = Local::now().date_naive();
        if today != self.current_date {
            self.file = Self::open_log_file(&self.dir, today)?;
            self.current_date = today;
        }
        self.file.write(buf)
    }

    fn flush(&mut self) -> std::io::Result<()> {
        self.file.flush()
    }
}

fn log_file_name(date: NaiveDate) -> String {
    format!("{LOG_PREFIX}.{}", date.format("%Y-%m-%d"))
}

/// ログシステムを初期化する。
///
/// - ログレベルは `ZAI_LOG` 環境変数で制御（デフォルト: `info`）
/// - 出力先は `<log_dir>/zai.log.YYYY-MM-DD`
///
/// ログファイルを開けない場合は警告だけ出して `None` を返す（ログなしで続行）。
/// 返されたガードは `main()` の終了まで保持すること。
pub fn init_logging(log_dir: &Path) -> Option<WorkerGuard> {
    if let Err(e) = std::fs::create_dir_all(log_dir) {
        eprintln!(
            "zai: warning: failed to create log directory {}: {e}",
            log_dir.display()
        );
        return None;
    }

    let appender = match DailyAppender::new(log_dir.to_path_buf()) {
        Ok(a) => a,
        Err(e) => {
            eprintln!(
                "zai: warning: failed to open log file in {}: {e}",
                log_dir.display()
            );
            return None;
        }
    };

    let (non_blocking, guard) = tracing_appender::non_blocking(appender);

    let env_filter =
        EnvFilter::try_from_env("ZAI_LOG").unwrap_or_else(|_| EnvFilter::new("info"));

    // 二重初期化（テスト等）はエラーになるが無視する
    let _ = fmt()
        .with_env_filter(env_filter)
        .with_writer(non_blocking)
        .with_timer(LocalTimer)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true)
        .with_file(true)
        .try_init();

    Some(guard)
}
