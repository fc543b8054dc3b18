//! Chatview Desktop Application
//!
//! GPUI-based chat client with attachment previews.
//!
//! Usage: `chatview [--transcript <file>] [--temp-code <code> | --auth-callback <url>]`

use anyhow::{bail, Context};
use chatview_core::auth::temp_code_from_url;
use chatview_core::{
    AppConfig, AuthCallback, AuthScreen, HttpTokenExchange, KeyValueStore, SqliteStore,
};
use chatview_ui::{load_transcript, PreviewServer, Transcript};
use gpui::*;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::runtime::Runtime;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod window;

use window::ChatWindow;

#[derive(Debug, Default)]
struct Args {
    transcript: Option<PathBuf>,
    /// `Some` when launched as an OAuth callback; the inner code may be absent
    auth: Option<Option<String>>,
}

impl Args {
    fn parse(mut args: impl Iterator<Item = String>) -> anyhow::Result<Self> {
        let mut parsed = Self::default();
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--transcript" => {
                    let path = args.next().context("--transcript needs a path")?;
                    parsed.transcript = Some(PathBuf::from(path));
                }
                "--temp-code" => {
                    parsed.auth = Some(args.next().filter(|c| !c.is_empty()));
                }
                "--auth-callback" => {
                    let url = args.next().context("--auth-callback needs a URL")?;
                    parsed.auth = Some(temp_code_from_url(&url));
                }
                other => bail!("Unknown argument: {}", other),
            }
        }
        Ok(parsed)
    }
}

/// Exchange the temp code before the window opens
fn run_auth(
    runtime: &Runtime,
    config: &AppConfig,
    store: Arc<dyn KeyValueStore>,
    temp_code: Option<String>,
) -> anyhow::Result<AuthScreen> {
    let exchange = HttpTokenExchange::new(config.server_base())?;
    let mut callback = AuthCallback::new(store, exchange);
    let screen = runtime.block_on(callback.run(temp_code.as_deref())).clone();
    Ok(screen)
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Chatview v{}", env!("CARGO_PKG_VERSION"));

    let args = Args::parse(std::env::args().skip(1))?;
    let mut config = AppConfig::load()?;
    if let Some(path) = args.transcript {
        config.transcript_path = Some(path);
    }

    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new_with_path(&config.data_dir)?);

    let runtime = Runtime::new()?;
    let auth_screen = match args.auth {
        Some(temp_code) => Some(run_auth(&runtime, &config, store.clone(), temp_code)?),
        None => None,
    };
    let preview_server = PreviewServer::start(runtime)?;

    let transcript = match &config.transcript_path {
        Some(path) => load_transcript(path).unwrap_or_else(|e| {
            warn!("{:#}", e);
            Transcript::default()
        }),
        None => Transcript::default(),
    };

    let cache_dir = dirs::cache_dir()
        .unwrap_or_else(std::env::temp_dir)
        .join("chatview");

    App::new().run(move |cx: &mut AppContext| {
        let window_options = WindowOptions {
            titlebar: Some(TitlebarOptions {
                title: Some("Chatview".into()),
                appears_transparent: false,
                traffic_light_position: None,
            }),
            window_bounds: Some(WindowBounds::Windowed(Bounds {
                origin: point(px(100.0), px(100.0)),
                size: size(px(1200.0), px(800.0)),
            })),
            focus: true,
            show: true,
            kind: WindowKind::Normal,
            is_movable: true,
            window_background: WindowBackgroundAppearance::Opaque,
            app_id: Some("com.chatview.app".to_string()),
            ..Default::default()
        };

        let opened = cx.open_window(window_options, |cx| {
            cx.new_view(|cx| {
                ChatWindow::new(cx, config, store, transcript, auth_screen, cache_dir, preview_server)
            })
        });
        if let Err(e) = opened {
            tracing::error!("Failed to open window: {}", e);
            cx.quit();
        }
    });

    Ok(())
}
