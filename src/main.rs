mod app_service;
mod app_state;
mod branding;
mod catalog;
mod commands;
mod config;
mod document;
mod error;
mod funds;
mod session;
mod storage;
mod ui;

use chrono::Local;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyEventKind},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io;
use std::sync::Arc;
use tokio::sync::mpsc;

use crate::app_service::{load_preferences, AppService, StoredPreferences};
use crate::app_state::{App, AppEvent};
use crate::branding::AppContext;
use crate::catalog::{AssetSource, CatalogAssets};
use crate::commands::backend;
use crate::commands::document::DocumentBases;
use crate::commands::AppCommand;
use crate::config::{load_env_file, AppConfig};
use crate::document::{DocumentResolver, HttpProbe};
use crate::session::{BackendSession, HttpSession};
use crate::ui::draw;

#[tokio::main(flavor = "multi_thread")]
async fn main() -> io::Result<()> {
    let ts = Local::now().format("%Y%m%d-%H%M%S").to_string();
    let log_dir = std::path::PathBuf::from("logs");
    std::fs::create_dir_all(&log_dir)?;
    let log_path = log_dir.join(format!("app-{}.log", ts));
    let log_file = std::fs::File::create(log_path)?;
    env_logger::Builder::from_default_env()
        .target(env_logger::Target::Pipe(Box::new(log_file))) // 日志写文件，避免打乱终端界面
        .filter_level(log::LevelFilter::Warn)
        .filter_module("agentdesk", log::LevelFilter::Info)
        .filter_module("sqlx", log::LevelFilter::Error)
        .filter_module("sea_orm", log::LevelFilter::Error)
        .init();

    let current_dir = std::env::current_dir().unwrap_or_else(|_| std::path::PathBuf::from("."));
    let mut session_info = load_env_file(&current_dir);

    let config = match AppConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            session_info.push(format!("✗ 配置有误，使用默认值: {}", e));
            log::warn!("配置有误: {}", e);
            AppConfig::from_lookup(|_: &str| None)
                .map_err(|e| io::Error::new(io::ErrorKind::Other, e.to_string()))?
        }
    };
    session_info.push(format!(
        "后端: {} ({})",
        config.backend_url,
        if config.is_production { "生产" } else { "开发" }
    ));

    // 初始化数据库
    session_info.push("正在初始化数据库...".to_string());
    let db = match storage::establish_connection(&config.database_url).await {
        Ok(connection) => {
            session_info.push("✓ 数据库连接成功".to_string());
            Arc::new(connection)
        }
        Err(e) => {
            eprintln!("无法连接数据库: {}", e);
            return Err(io::Error::new(
                io::ErrorKind::Other,
                format!("数据库连接失败: {}", e),
            ));
        }
    };

    let prefs = match load_preferences(&db).await {
        Ok(p) => p,
        Err(e) => {
            session_info.push(format!("⚠ 读取本地偏好失败: {}", e));
            StoredPreferences::default()
        }
    };

    let ctx = AppContext {
        brand: prefs.brand,
        language: prefs.language.unwrap_or_default(),
        is_production: config.is_production,
        user_email: config.user_email.clone(),
        admin_emails: config.admin_emails.clone(),
    };

    let http = HttpSession::new(config.http_timeout)
        .map_err(|e| io::Error::new(io::ErrorKind::Other, format!("HTTP 客户端创建失败: {}", e)))?;
    let client = http.client().clone();
    let mut backend_session = BackendSession::new(http, config.backend_url.clone());
    if let Some(nonce) = config.wp_nonce.as_deref() {
        backend_session.set_wp_nonce(nonce);
    }
    let backend_session = Arc::new(backend_session);

    let assets = Arc::new(CatalogAssets::new(AssetSource::from_root(
        &config.asset_root,
        client.clone(),
    )));
    let resolver = Arc::new(DocumentResolver::new(
        config.doc_base_url.clone(),
        HttpProbe::new(client),
    ));
    let bases = DocumentBases {
        product: config.pdf_base_url.clone(),
        information: config.info_doc_base_url.clone(),
    };

    // 创建核心 Channel
    let (cmd_tx, cmd_rx) = mpsc::unbounded_channel::<AppCommand>();
    let (evt_tx, evt_rx) = mpsc::unbounded_channel::<AppEvent>();

    // 后台服务 (Actor)
    let service = AppService::new(
        db.clone(),
        assets,
        backend_session.clone(),
        resolver,
        bases,
        config.fetch_debounce,
        evt_tx.clone(),
    );
    tokio::spawn(service.run(cmd_rx));

    if config.user_email.is_none() {
        if let Some(wp_root) = config.wp_api_root.clone() {
            let session = backend_session.clone();
            let tx = evt_tx.clone();
            tokio::spawn(async move {
                backend::fetch_login_email(&session, &wp_root, tx).await;
            });
        }
    }

    // TUI 初始化
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let mut app = App::new(session_info, ctx, prefs, cmd_tx, evt_rx);
    app.bootstrap();

    let res = match app.evt_rx.take() {
        Some(rx) => run_app_loop(&mut terminal, &mut app, rx).await,
        None => Ok(()),
    };

    // 恢复终端
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = res {
        log::error!("界面循环异常退出: {}", e);
        return Err(e);
    }
    Ok(())
}

async fn run_app_loop<B: ratatui::backend::Backend>(
    terminal: &mut Terminal<B>,
    app: &mut App,
    mut evt_rx: mpsc::UnboundedReceiver<AppEvent>,
) -> io::Result<()> {
    loop {
        terminal.draw(|f| draw(f, app))?;

        while let Ok(event) = evt_rx.try_recv() {
            app.apply_event(event);
        }

        if event::poll(std::time::Duration::from_millis(100))? {
            if let Event::Key(key) = event::read()? {
                if key.kind == KeyEventKind::Press && app.handle_key_event(key.code) {
                    return Ok(());
                }
            }
        }
    }
}
