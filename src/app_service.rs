use crate::app_state::AppEvent;
use crate::branding::{Brand, Language};
use crate::catalog::CatalogAssets;
use crate::commands::document::DocumentBases;
use crate::commands::{backend, detail, document, AppCommand};
use crate::document::{DocumentResolver, HttpProbe};
use crate::session::{BackendSession, UserData};
use crate::storage::repository::{PreferenceKey, PreferenceRepository};
use log::{error, info, warn};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// 启动时从本地数据库读出的偏好
#[derive(Debug, Clone, Default)]
pub struct StoredPreferences {
    pub brand: Option<Brand>,
    pub language: Option<Language>,
    pub selected_funds: Vec<String>,
    pub user_data: Option<UserData>,
}

pub async fn load_preferences(db: &DatabaseConnection) -> anyhow::Result<StoredPreferences> {
    let brand = PreferenceRepository::get(db, PreferenceKey::BrandColor)
        .await?
        .and_then(|c| Brand::from_color(&c));
    let language = PreferenceRepository::get(db, PreferenceKey::Language)
        .await?
        .and_then(|c| Language::from_code(&c));
    let selected_funds = PreferenceRepository::get_json(db, PreferenceKey::SelectedFunds)
        .await?
        .unwrap_or_default();
    let user_data = PreferenceRepository::get_json(db, PreferenceKey::EmailSettings).await?;
    Ok(StoredPreferences {
        brand,
        language,
        selected_funds,
        user_data,
    })
}

/// 加载产品与公司列表；任一失败时该列表为空并提示
pub async fn load_catalog(assets: &CatalogAssets, tx: &mpsc::UnboundedSender<AppEvent>) {
    let (products, companies) = tokio::join!(assets.load_products(), assets.load_companies());
    let products = products.unwrap_or_else(|e| {
        error!("产品列表加载失败: {}", e);
        let _ = tx.send(AppEvent::Error(format!("✗ 产品列表加载失败: {}", e.user_message())));
        Vec::new()
    });
    let companies = companies.unwrap_or_else(|e| {
        error!("公司列表加载失败: {}", e);
        let _ = tx.send(AppEvent::Error(format!("✗ 公司列表加载失败: {}", e.user_message())));
        Vec::new()
    });
    let _ = tx.send(AppEvent::Catalog {
        products,
        companies,
    });
}

/// 后台服务：持有所有 IO 资源，按命令执行
pub struct AppService {
    pub db: Arc<DatabaseConnection>,
    pub assets: Arc<CatalogAssets>,
    pub backend: Arc<BackendSession>,
    pub resolver: Arc<DocumentResolver<HttpProbe>>,
    pub bases: Arc<DocumentBases>,
    pub fetch_debounce: Duration,
    pub evt_tx: mpsc::UnboundedSender<AppEvent>,
    fund_fetch: Option<JoinHandle<()>>,
}

impl AppService {
    pub fn new(
        db: Arc<DatabaseConnection>,
        assets: Arc<CatalogAssets>,
        backend: Arc<BackendSession>,
        resolver: Arc<DocumentResolver<HttpProbe>>,
        bases: DocumentBases,
        fetch_debounce: Duration,
        evt_tx: mpsc::UnboundedSender<AppEvent>,
    ) -> Self {
        Self {
            db,
            assets,
            backend,
            resolver,
            bases: Arc::new(bases),
            fetch_debounce,
            evt_tx,
            fund_fetch: None,
        }
    }

    /// 命令循环，直到发送端关闭
    pub async fn run(mut self, mut cmd_rx: mpsc::UnboundedReceiver<AppCommand>) {
        while let Some(cmd) = cmd_rx.recv().await {
            self.handle(cmd).await;
        }
        if let Some(handle) = self.fund_fetch.take() {
            handle.abort();
        }
        info!("后台命令循环已结束");
    }

    pub async fn handle(&mut self, cmd: AppCommand) {
        match cmd {
            AppCommand::LoadCatalog => {
                let assets = self.assets.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    load_catalog(&assets, &tx).await;
                });
            }
            AppCommand::LoadProductDetail { code } => {
                let assets = self.assets.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    detail::product(&assets, &code, tx).await;
                });
            }
            AppCommand::LoadCompanyDetail { code } => {
                let assets = self.assets.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    detail::company(&assets, &code, tx).await;
                });
            }
            AppCommand::LoadInformation { id } => {
                let assets = self.assets.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    detail::information(&assets, &id, tx).await;
                });
            }
            AppCommand::ResolveDocument {
                owner,
                code,
                file_name,
            } => {
                let resolver = self.resolver.clone();
                let bases = self.bases.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    document::run(&*resolver, &*bases, owner, &code, &file_name, tx).await;
                });
            }
            AppCommand::FetchFunds { funds, generation } => {
                if let Some(handle) = self.fund_fetch.take() {
                    handle.abort();
                }
                self.fund_fetch = Some(backend::spawn_fund_fetch(
                    self.backend.clone(),
                    funds,
                    generation,
                    self.fetch_debounce,
                    self.evt_tx.clone(),
                ));
            }
            AppCommand::FetchUserData { email } => {
                let session = self.backend.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    backend::load_user_data(&session, &email, tx).await;
                });
            }
            AppCommand::SaveUserData(data) => {
                let session = self.backend.clone();
                let db = self.db.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    backend::save_user_data(&session, &db, &data, tx).await;
                });
            }
            AppCommand::SendTestEmail { email } => {
                let session = self.backend.clone();
                let tx = self.evt_tx.clone();
                tokio::spawn(async move {
                    backend::send_test_email(&session, &email, tx).await;
                });
            }
            AppCommand::StorePreference { key, value } => {
                if let Err(e) = PreferenceRepository::set(&self.db, key, &value).await {
                    warn!("保存偏好 {} 失败: {}", key.as_str(), e);
                    let _ = self
                        .evt_tx
                        .send(AppEvent::Error(format!("✗ 保存偏好失败: {}", e)));
                }
            }
            other => {
                // 其余命令由界面自己处理
                warn!("后台忽略命令: {:?}", other);
            }
        }
    }
}
