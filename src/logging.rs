use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::{Level, Subscriber};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::filter::filter_fn;
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

use crate::config::LogConfig;

pub const SERVICE_NAME: &str = "calculate-service";

/// ファイル出力用ワーカーのガード。drop 時に未書き込みの行がフラッシュされる。
#[must_use = "dropping the guards stops the log file writers"]
pub struct LogGuards {
    _guards: Vec<WorkerGuard>,
}

fn file_appender(dir: &Path, name: &str) -> Result<RollingFileAppender> {
    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(name)
        .filename_suffix("log")
        .build(dir)
        .with_context(|| format!("{}.log を {} に作成できません", name, dir.display()))
}

/// 設定からサブスクライバを組み立てる。インストールは呼び出し側が行う。
///
/// - `combined.log`: 設定レベル以上の全イベント（JSON）
/// - `error.log`: error イベントのみ（JSON）。スパンは通すので `service` などが残る
/// - コンソール: `console` が有効な場合のみ
pub fn build_subscriber(
    config: &LogConfig,
) -> Result<(impl Subscriber + Send + Sync + 'static, LogGuards)> {
    fs::create_dir_all(&config.dir)
        .with_context(|| format!("ログディレクトリを作成できません: {}", config.dir.display()))?;

    let filter = EnvFilter::try_new(&config.level)
        .with_context(|| format!("LOG_LEVEL の値が不正です: {:?}", config.level))?;

    let (combined, combined_guard) =
        tracing_appender::non_blocking(file_appender(&config.dir, "combined")?);
    let (errors, error_guard) = tracing_appender::non_blocking(file_appender(&config.dir, "error")?);

    let console = config
        .console
        .then(|| fmt::layer().compact().with_target(false));

    let subscriber = tracing_subscriber::registry()
        .with(filter)
        .with(fmt::layer().json().with_ansi(false).with_writer(combined))
        .with(
            fmt::layer()
                .json()
                .with_ansi(false)
                .with_writer(errors)
                .with_filter(filter_fn(|meta| meta.is_span() || *meta.level() == Level::ERROR)),
        )
        .with(console);

    Ok((
        subscriber,
        LogGuards {
            _guards: vec![combined_guard, error_guard],
        },
    ))
}
