//! # LaTeX 公式插入工具 — 命令行入口
//!
//! 本文件只负责参数解析、日志初始化与依赖装配。
//! 业务逻辑分布在各子模块中，详见 `lib.rs` 架构文档。

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use latex_insert::config::{self, AppConfig};
use latex_insert::error::AppError;
use latex_insert::formula::DisplaySize;
use latex_insert::renderer::{HttpFetcher, ImageFetcher};
use latex_insert::settings::{self, SettingsScope, SqliteSettingsStore};

#[derive(Parser)]
#[command(version, about = "Render LaTeX formulas through a web service and round-trip them through locators.")]
struct Cli {
    /// JSON config file (defaults to the platform config directory).
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Settings database (overrides `settings_db` from the config).
    #[arg(long, value_name = "FILE")]
    db: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Print the image and link locators of a formula.
    Encode {
        formula: String,
        /// Display size, defaults to the persisted preference.
        #[arg(long)]
        size: Option<DisplaySize>,
    },
    /// Extract the formula back out of a link locator.
    Decode {
        link: String,
        /// Size assumed when stripping the prefix, defaults to the persisted preference.
        #[arg(long)]
        size: Option<DisplaySize>,
    },
    /// Fetch the rendered image of a formula.
    Render {
        formula: String,
        #[arg(long)]
        size: Option<DisplaySize>,
        /// Output file for the image bytes.
        #[arg(long, value_name = "FILE", required_unless_present = "data_url")]
        out: Option<PathBuf>,
        /// Print the image as a data URL instead of writing a file.
        #[arg(long)]
        data_url: bool,
    },
    /// Print the preferred size, or persist a new one.
    Size { size: Option<DisplaySize> },
    /// List every display size.
    Sizes,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            log::error!("❌ {}", err);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<(), AppError> {
    let config_path = match cli.config {
        Some(path) => path,
        None => config::default_config_path()?,
    };
    let app_config = AppConfig::load_from_path(&config_path);
    let service = app_config.service.clone();
    let db = cli.db;

    // 只有用到设置的子命令才打开数据库
    let open_store = || -> Result<SqliteSettingsStore, AppError> {
        let db_path = match db {
            Some(path) => path,
            None => app_config.resolve_settings_db_path(&config::default_data_dir()?)?,
        };
        log::debug!("设置数据库: {}", db_path.display());
        SqliteSettingsStore::open(&db_path, SettingsScope::User)
    };

    match cli.command {
        Command::Sizes => {
            for size in settings::font_sizes() {
                println!("{}", size);
            }
        }
        Command::Encode { formula, size } => {
            let store = open_store()?;
            let size = size.map_or_else(|| settings::latex_font_size(&store), Ok)?;
            let locators = service.encode(&formula, size);
            println!("{}", locators.image);
            println!("{}", locators.link);
        }
        Command::Decode { link, size } => {
            let store = open_store()?;
            let size = size.map_or_else(|| settings::latex_font_size(&store), Ok)?;
            println!("{}", service.decode(Some(&link), size));
            match service.recover(&link) {
                Some((formula, encoded_size)) if encoded_size != size => {
                    log::warn!("⚠️ 链接按尺寸 {} 生成，按该尺寸还原: {}", encoded_size, formula);
                }
                Some(_) => {}
                None => log::warn!("⚠️ 链接不是当前渲染服务生成的"),
            }
        }
        Command::Render {
            formula,
            size,
            out,
            data_url,
        } => {
            let mut store = open_store()?;
            let size = size.map_or_else(|| settings::latex_font_size(&store), Ok)?;
            let locators = service.encode(&formula, size);
            let fetcher = HttpFetcher::new(app_config.fetch.clone())?;
            let image = fetcher.fetch(&locators.image).await?;
            settings::set_latest_formula(&mut store, &formula)?;

            if data_url {
                println!("{}", image.to_data_url());
            }
            if let Some(out) = out {
                std::fs::write(&out, &image.bytes)?;
                log::info!(
                    "✅ 已写入 {} ({}x{}, {} 字节)",
                    out.display(),
                    image.width,
                    image.height,
                    image.len()
                );
            }
        }
        Command::Size { size: Some(size) } => {
            let mut store = open_store()?;
            settings::set_latex_font_size(&mut store, size)?;
            log::info!("✅ 默认尺寸已设为 {}", size);
        }
        Command::Size { size: None } => {
            let store = open_store()?;
            println!("{}", settings::latex_font_size(&store)?);
        }
    }

    Ok(())
}
