mod ai;
mod cli;
mod config;
mod engine;
mod error;
mod logging;
mod shell;
mod storage;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use tracing::{info, warn};

use ai::{AiGateway, ReqwestTransport};
use cli::assistant::render_state;
use config::AppConfig;
use engine::handlers::site::SystemOpener;
use engine::CommandRouter;
use shell::Shell;
use storage::ResponseCache;

/// 自然言語でファイル操作・計算・AI への質問を行うアシスタント
#[derive(Parser, Debug)]
#[command(name = "zai", version, about)]
struct Cli {
    /// 設定ファイルのパス（省略時は ~/.config/zai/config.toml）
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// 応答キャッシュのパス（省略時はデータディレクトリの cache.json）
    #[arg(long, value_name = "PATH")]
    cache: Option<PathBuf>,

    /// コマンドを 1 つだけ実行して終了する
    #[arg(short = 'c', long = "command", value_name = "TEXT")]
    command: Option<String>,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // .env ファイルから環境変数を読み込む
    dotenvy::dotenv().ok();

    let data_dir = AppConfig::data_dir().unwrap_or_else(|e| {
        eprintln!("zai: warning: {e}; using current directory");
        PathBuf::from(".")
    });

    // _guard は main 終了まで保持する必要がある
    let _guard = logging::init_logging(&data_dir.join("logs"));
    info!(data_dir = %data_dir.display(), "zai started");

    let config = match &cli.config {
        Some(path) => AppConfig::load_from(path),
        None => AppConfig::load(),
    };
    if !config.ai.has_api_key() {
        warn!("API key is not configured; AI questions will be rejected");
    }

    let cache_path = cli.cache.unwrap_or_else(|| data_dir.join("cache.json"));
    let cache = Arc::new(ResponseCache::open(cache_path));
    info!(
        path = %cache.path().display(),
        entries = cache.len(),
        "Response cache ready"
    );

    let gateway =
        AiGateway::new(cache, Arc::new(ReqwestTransport::new())).with_dump_dir(data_dir.clone());
    let mut router = CommandRouter::new(&config, gateway, Box::new(SystemOpener));

    let code = match cli.command {
        Some(command) => {
            let state = router.execute(&command).await;
            render_state(&state);
            0
        }
        None => {
            let mut shell = Shell::new(router, data_dir.join("history.txt"));
            shell.run().await
        }
    };

    info!(exit_code = code, "zai shutting down");
    ExitCode::from(code)
}
