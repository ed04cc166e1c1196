use crate::app_service::StoredPreferences;
use crate::branding::{AppContext, Brand, Language, DEFAULT_BRAND_COLOR};
use crate::catalog::{
    filter_records, product_facets, Company, CompanyDetail, FilterCriteria, InformationDetail,
    Pager, Product, ProductDetail, ProductFacets, PAGE_SIZES,
};
use crate::catalog::model::DocumentFile;
use crate::commands::app_command::{parse_bool, COMMAND_NAMES, HELP_LINES};
use crate::commands::{AppCommand, DocOwner, FilterField, PageMove, TabTarget};
use crate::document::Resolution;
use crate::funds::{reminder_rows, EmailDateEntry, Fund, MailSelection, ReminderRow};
use crate::session::UserData;
use crate::storage::repository::PreferenceKey;
use chrono::NaiveDate;
use crossterm::event::KeyCode;
use log::{debug, info};
use serde_json::{Map, Value};
use std::collections::HashMap;
use std::str::FromStr;
use tokio::sync::mpsc;

pub const DEFAULT_DAYS_AHEAD: u8 = 2;
const MENU_ITEMS: usize = 4;

#[derive(PartialEq, Debug, Clone, Copy)]
pub enum ViewMode {
    Products,
    Companies,
    Funds,
    Settings,
    Detail,
}

impl ViewMode {
    fn menu_index(&self) -> Option<usize> {
        match self {
            ViewMode::Products => Some(0),
            ViewMode::Companies => Some(1),
            ViewMode::Funds => Some(2),
            ViewMode::Settings => Some(3),
            ViewMode::Detail => None,
        }
    }

    fn from_menu_index(i: usize) -> ViewMode {
        match i {
            1 => ViewMode::Companies,
            2 => ViewMode::Funds,
            3 => ViewMode::Settings,
            _ => ViewMode::Products,
        }
    }
}

impl From<TabTarget> for ViewMode {
    fn from(t: TabTarget) -> Self {
        match t {
            TabTarget::Products => ViewMode::Products,
            TabTarget::Companies => ViewMode::Companies,
            TabTarget::Funds => ViewMode::Funds,
            TabTarget::Settings => ViewMode::Settings,
        }
    }
}

#[derive(PartialEq, Debug, Clone)]
pub enum InputMode {
    Normal,
    Command,
}

#[derive(PartialEq, Debug, Clone)]
pub enum FocusArea {
    Menu,     // 焦点在左侧菜单
    MainView, // 焦点在主视图
}

/// 当前请求/展示的详情
#[derive(Debug, Clone, PartialEq)]
pub enum DetailKey {
    Product(String),
    Company(String),
    Information(String),
}

#[derive(Debug, Clone)]
pub enum DetailContent {
    Product(Box<ProductDetail>),
    Company(Box<CompanyDetail>),
    Information(Box<InformationDetail>),
}

#[derive(Debug)]
pub enum AppEvent {
    Log(String),
    Message(String),
    Error(String),
    Catalog {
        products: Vec<Product>,
        companies: Vec<Company>,
    },
    ProductDetail {
        code: String,
        detail: Box<ProductDetail>,
    },
    CompanyDetail {
        code: String,
        detail: Box<CompanyDetail>,
    },
    Information(Box<InformationDetail>),
    DocumentUrl {
        file_name: String,
        resolution: Resolution,
    },
    Funds {
        generation: u64,
        result: Result<Vec<Fund>, String>,
    },
    UserData(Box<UserData>),
    LoginEmail(String),
}

pub struct App {
    pub view_mode: ViewMode,
    pub previous_view: ViewMode,
    pub input_mode: InputMode,
    pub focus_area: FocusArea,
    pub menu_selected_index: usize,
    pub ctx: AppContext,

    // 产品与公司列表
    pub products_all: Vec<Product>,
    pub companies_all: Vec<Company>,
    pub products: Vec<Product>,
    pub companies: Vec<Company>,
    pub product_criteria: FilterCriteria,
    pub company_criteria: FilterCriteria,
    pub product_pager: Pager,
    pub company_pager: Pager,
    pub selected_index: usize,
    pub catalog_loaded: bool,
    pub facets: ProductFacets,

    // 详情（可叠加：公司详情 -> 资讯）
    pub detail_key: Option<DetailKey>,
    pub detail: Option<DetailContent>,
    pub detail_stack: Vec<(DetailKey, Option<DetailContent>)>,
    pub detail_scroll: u16,
    pub last_document: Option<(String, Resolution)>,

    // 基金日历与邮件设置
    pub selected_funds: Vec<String>,
    pub fund_generation: u64,
    pub funds: Vec<Fund>,
    pub funds_loading: bool,
    pub funds_error: Option<String>,
    pub fund_selected: usize,
    pub mail_selection: MailSelection,
    pub email: String,
    pub days_ahead: u8,
    pub email_dates: HashMap<String, Vec<EmailDateEntry>>,
    pub user_extra: Map<String, Value>,

    pub command_input: String,
    pub command_cursor: usize,
    pub command_history: Vec<String>,
    pub command_history_index: Option<usize>,
    pub log_messages: Vec<String>,
    pub cmd_tx: mpsc::UnboundedSender<AppCommand>,
    pub evt_rx: Option<mpsc::UnboundedReceiver<AppEvent>>,
}

impl App {
    pub fn new(
        session_info: Vec<String>,
        ctx: AppContext,
        prefs: StoredPreferences,
        cmd_tx: mpsc::UnboundedSender<AppCommand>,
        evt_rx: mpsc::UnboundedReceiver<AppEvent>,
    ) -> App {
        let mut log_messages = vec!["应用已启动".to_string()];
        log_messages.extend(session_info);

        let mut app = App {
            view_mode: ViewMode::Products,
            previous_view: ViewMode::Products,
            input_mode: InputMode::Normal,
            focus_area: FocusArea::Menu,
            menu_selected_index: 0,
            email: ctx.user_email.clone().unwrap_or_default(),
            ctx,
            products_all: Vec::new(),
            companies_all: Vec::new(),
            products: Vec::new(),
            companies: Vec::new(),
            product_criteria: FilterCriteria::default(),
            company_criteria: FilterCriteria::default(),
            product_pager: Pager::default(),
            company_pager: Pager::default(),
            selected_index: 0,
            catalog_loaded: false,
            facets: ProductFacets::default(),
            detail_key: None,
            detail: None,
            detail_stack: Vec::new(),
            detail_scroll: 0,
            last_document: None,
            selected_funds: Vec::new(),
            fund_generation: 0,
            funds: Vec::new(),
            funds_loading: false,
            funds_error: None,
            fund_selected: 0,
            mail_selection: MailSelection::default(),
            days_ahead: DEFAULT_DAYS_AHEAD,
            email_dates: HashMap::new(),
            user_extra: Map::new(),
            command_input: String::new(),
            command_cursor: 0,
            command_history: Vec::new(),
            command_history_index: None,
            log_messages,
            cmd_tx,
            evt_rx: Some(evt_rx),
        };

        if let Some(data) = prefs.user_data {
            app.apply_user_data(data, false);
        }
        if !prefs.selected_funds.is_empty() {
            app.selected_funds = prefs.selected_funds;
        }
        app
    }

    /// 启动后的首批请求：目录数据与已保存的基金
    pub fn bootstrap(&mut self) {
        let _ = self.cmd_tx.send(AppCommand::LoadCatalog);
        if !self.selected_funds.is_empty() {
            let funds = self.selected_funds.clone();
            self.set_selected_funds(funds, false);
        }
    }

    pub fn add_log(&mut self, msg: String) {
        self.log_messages.push(msg);
    }

    fn send(&self, cmd: AppCommand) {
        let _ = self.cmd_tx.send(cmd);
    }

    fn store_preference(&self, key: PreferenceKey, value: String) {
        self.send(AppCommand::StorePreference { key, value });
    }

    // ---------- 目录 ----------

    /// 当前操作的列表：详情/基金/设置页下回退到产品列表
    fn catalog_is_companies(&self) -> bool {
        match self.view_mode {
            ViewMode::Companies => true,
            ViewMode::Detail => self.previous_view == ViewMode::Companies,
            _ => false,
        }
    }

    pub fn active_pager(&self) -> &Pager {
        if self.catalog_is_companies() {
            &self.company_pager
        } else {
            &self.product_pager
        }
    }

    fn active_pager_mut(&mut self) -> &mut Pager {
        if self.catalog_is_companies() {
            &mut self.company_pager
        } else {
            &mut self.product_pager
        }
    }

    pub fn active_total(&self) -> usize {
        if self.catalog_is_companies() {
            self.companies.len()
        } else {
            self.products.len()
        }
    }

    pub fn page_products(&self) -> &[Product] {
        self.product_pager.slice(&self.products)
    }

    pub fn page_companies(&self) -> &[Company] {
        self.company_pager.slice(&self.companies)
    }

    fn page_len(&self) -> usize {
        if self.catalog_is_companies() {
            self.page_companies().len()
        } else {
            self.page_products().len()
        }
    }

    /// 重新过滤两个列表；任何条件变化都回到第 0 页
    pub fn apply_filters(&mut self) {
        let priority = self.ctx.priority();
        self.products = filter_records(&self.products_all, &self.product_criteria, priority);
        self.companies = filter_records(&self.companies_all, &self.company_criteria, priority);
        self.product_pager.reset();
        self.company_pager.reset();
        self.selected_index = 0;
    }

    pub fn clamp_selection(&mut self) {
        let len = self.page_len();
        if self.selected_index >= len {
            self.selected_index = len.saturating_sub(1);
        }
    }

    fn switch_view(&mut self, view: ViewMode) {
        if let Some(i) = view.menu_index() {
            self.menu_selected_index = i;
        }
        if view != ViewMode::Detail {
            self.detail_stack.clear();
        }
        match view {
            ViewMode::Products => self.product_pager.reset(),
            ViewMode::Companies => self.company_pager.reset(),
            _ => {}
        }
        self.selected_index = 0;
        self.view_mode = view;
    }

    fn ensure_catalog_view(&mut self) {
        if !matches!(self.view_mode, ViewMode::Products | ViewMode::Companies) {
            let target = if self.catalog_is_companies() {
                ViewMode::Companies
            } else {
                ViewMode::Products
            };
            self.switch_view(target);
        }
    }

    fn set_filter(&mut self, field: FilterField, value: Option<String>) {
        if self.catalog_is_companies() {
            if field != FilterField::Region {
                self.add_log("✗ 公司列表只支持 region 过滤".to_string());
                return;
            }
            self.company_criteria.region = value;
        } else {
            let c = &mut self.product_criteria;
            match field {
                FilterField::Company => c.company = value,
                FilterField::Category => c.category = value,
                FilterField::Type => c.product_type = value,
                FilterField::Status => c.status = value,
                FilterField::Region => c.region = value,
                FilterField::Hot => c.hot = value.as_deref().and_then(parse_bool),
            }
        }
        self.apply_filters();
    }

    fn move_page(&mut self, m: PageMove) {
        let total = self.active_total();
        let pager = self.active_pager_mut();
        match m {
            PageMove::Next => pager.next(total),
            PageMove::Prev => pager.prev(),
            PageMove::First => pager.go_to(0, total),
            PageMove::Last => pager.go_to(usize::MAX, total),
            PageMove::To(n) => pager.go_to(n.saturating_sub(1), total),
        }
        self.selected_index = 0;
    }

    fn set_page_size(&mut self, size: Option<usize>) {
        match size {
            Some(n) if !PAGE_SIZES.contains(&n) => {
                self.add_log(format!("✗ 每页条数只能是 {:?}", PAGE_SIZES));
                return;
            }
            Some(n) => {
                self.active_pager_mut().set_size(n);
            }
            None => self.active_pager_mut().cycle_size(),
        }
        self.selected_index = 0;
    }

    // ---------- 详情 ----------

    fn request_detail(&mut self, key: DetailKey) {
        if self.view_mode == ViewMode::Detail {
            if let Some(current) = self.detail_key.take() {
                self.detail_stack.push((current, self.detail.take()));
            }
        } else {
            self.previous_view = self.view_mode;
            self.detail_stack.clear();
        }
        self.detail_scroll = 0;
        self.detail = None;
        self.last_document = None;
        self.view_mode = ViewMode::Detail;
        let cmd = match &key {
            DetailKey::Product(code) => AppCommand::LoadProductDetail { code: code.clone() },
            DetailKey::Company(code) => AppCommand::LoadCompanyDetail { code: code.clone() },
            DetailKey::Information(id) => AppCommand::LoadInformation { id: id.clone() },
        };
        self.detail_key = Some(key);
        self.send(cmd);
    }

    /// 打开当前页第 `row`（0 起始）条记录
    fn open_row(&mut self, row: usize) {
        let key = if self.catalog_is_companies() {
            self.page_companies()
                .get(row)
                .map(|c| DetailKey::Company(c.code.clone()))
        } else {
            self.page_products()
                .get(row)
                .map(|p| DetailKey::Product(p.product_code.clone()))
        };
        match key {
            Some(k) => self.request_detail(k),
            None => self.add_log(format!("✗ 当前页没有第 {} 行", row + 1)),
        }
    }

    /// 关闭详情：有上一层详情时回到上一层，否则回到列表
    pub fn close_detail(&mut self) {
        if let Some((key, content)) = self.detail_stack.pop() {
            self.detail_key = Some(key);
            self.detail = content;
            self.detail_scroll = 0;
            return;
        }
        self.detail_key = None;
        self.detail = None;
        self.last_document = None;
        self.view_mode = self.previous_view;
    }

    /// 当前详情可打开的文档（公司只列出 PDF）
    pub fn document_files(&self) -> Vec<&DocumentFile> {
        match &self.detail {
            Some(DetailContent::Product(d)) => d.files.iter().collect(),
            Some(DetailContent::Company(d)) => d.pdf_files(),
            Some(DetailContent::Information(d)) => d.files.iter().collect(),
            None => Vec::new(),
        }
    }

    fn open_document(&mut self, n: usize) {
        let Some(key) = self.detail_key.clone() else {
            self.add_log("✗ 请先打开产品、公司或资讯详情".to_string());
            return;
        };
        let file = n
            .checked_sub(1)
            .and_then(|i| self.document_files().get(i).map(|f| f.file_name.clone()));
        let Some(file) = file else {
            self.add_log(format!("✗ 没有第 {} 个文件", n));
            return;
        };
        let (owner, code) = match key {
            DetailKey::Product(code) => (DocOwner::Product, code),
            DetailKey::Company(code) => (DocOwner::Company, code),
            DetailKey::Information(id) => (DocOwner::Information, id),
        };
        self.send(AppCommand::ResolveDocument {
            owner,
            code,
            file_name: file,
        });
    }

    // ---------- 基金 ----------

    /// 更新所选基金；generation 自增，旧的响应随之作废
    pub fn set_selected_funds(&mut self, funds: Vec<String>, persist: bool) {
        self.fund_generation += 1;
        self.selected_funds = funds.clone();
        self.funds_error = None;
        self.funds_loading = !funds.is_empty();
        if funds.is_empty() {
            self.funds.clear();
        }
        self.fund_selected = 0;
        if persist {
            if let Ok(raw) = serde_json::to_string(&funds) {
                self.store_preference(PreferenceKey::SelectedFunds, raw);
            }
        }
        self.send(AppCommand::FetchFunds {
            funds,
            generation: self.fund_generation,
        });
    }

    pub fn fund_rows(&self, fund: &Fund, today: NaiveDate) -> Vec<ReminderRow> {
        let dates = self.email_dates.get(&fund.name).map(|v| v.as_slice());
        reminder_rows(fund, dates, today)
    }

    fn user_data(&self) -> UserData {
        UserData {
            email: self.email.clone(),
            selected_funds: self.selected_funds.clone(),
            selected_funds_for_mail: self.mail_selection.names().to_vec(),
            number_of_days_ahead: Some(self.days_ahead),
            email_dates: self.email_dates.clone(),
            extra: self.user_extra.clone(),
        }
    }

    fn apply_user_data(&mut self, data: UserData, refetch: bool) {
        if !data.email.trim().is_empty() {
            self.email = data.email.trim().to_string();
        }
        if let Some(d) = data.number_of_days_ahead.filter(|d| (1..=10).contains(d)) {
            self.days_ahead = d;
        }
        self.mail_selection = MailSelection::from_names(data.selected_funds_for_mail);
        self.email_dates = data.email_dates;
        self.user_extra = data.extra;
        if refetch {
            self.set_selected_funds(data.selected_funds, true);
        } else {
            self.selected_funds = data.selected_funds;
        }
    }

    fn require_email(&mut self) -> Option<String> {
        let email = self.email.trim().to_string();
        if email.is_empty() {
            self.add_log("✗ 请先用 email <地址> 设置邮箱".to_string());
            None
        } else {
            Some(email)
        }
    }

    // ---------- 品牌与语言 ----------

    fn set_brand(&mut self, brand: Option<Brand>) {
        if !self.ctx.can_switch_brand() {
            self.add_log("✗ 当前用户无权切换品牌".to_string());
            return;
        }
        self.ctx.brand = brand;
        self.apply_filters();
        let color = brand.map(|b| b.color()).unwrap_or(DEFAULT_BRAND_COLOR);
        self.store_preference(PreferenceKey::BrandColor, color.to_string());
        self.add_log(format!(
            "品牌: {}",
            brand.map(|b| b.company()).unwrap_or("默认")
        ));
    }

    fn set_language(&mut self, lang: Language) {
        self.ctx.language = lang;
        self.store_preference(PreferenceKey::Language, lang.code().to_string());
        self.add_log(format!("语言: {}", lang.label()));
    }

    // ---------- 命令 ----------

    /// 执行命令，返回 true 表示退出
    pub fn execute(&mut self, cmd: AppCommand) -> bool {
        match cmd {
            AppCommand::Search(q) => {
                self.ensure_catalog_view();
                if self.catalog_is_companies() {
                    self.company_criteria.search = q;
                } else {
                    self.product_criteria.search = q;
                }
                self.apply_filters();
            }
            AppCommand::Filter { field, value } => {
                self.ensure_catalog_view();
                self.set_filter(field, value);
            }
            AppCommand::Clear => {
                self.product_criteria.clear();
                self.company_criteria.clear();
                self.apply_filters();
            }
            AppCommand::Page(m) => self.move_page(m),
            AppCommand::Size(n) => self.set_page_size(n),
            AppCommand::Tab(t) => self.switch_view(t.into()),
            AppCommand::Open(row) => {
                if !matches!(self.view_mode, ViewMode::Products | ViewMode::Companies) {
                    self.add_log("✗ open 只能在产品或公司列表中使用".to_string());
                } else {
                    let r = row.map(|n| n.saturating_sub(1)).unwrap_or(self.selected_index);
                    self.open_row(r);
                }
            }
            AppCommand::Info(id) => self.request_detail(DetailKey::Information(id)),
            AppCommand::Doc(n) => self.open_document(n),
            AppCommand::Funds(list) => {
                self.switch_view(ViewMode::Funds);
                self.set_selected_funds(list, true);
            }
            AppCommand::Mail(name) => {
                self.mail_selection.toggle(&name);
                let state = if self.mail_selection.contains(&name) {
                    "开启"
                } else {
                    "关闭"
                };
                self.add_log(format!("邮件提醒{}: {}", state, name));
            }
            AppCommand::Email(e) => {
                self.email = e;
                self.add_log(format!("邮箱: {}", self.email));
            }
            AppCommand::Days(d) => {
                self.days_ahead = d;
                self.add_log(format!("提前 {} 天提醒", d));
            }
            AppCommand::Save => {
                if self.require_email().is_some() {
                    let data = self.user_data();
                    self.send(AppCommand::SaveUserData(Box::new(data)));
                }
            }
            AppCommand::Load => {
                if let Some(email) = self.require_email() {
                    self.send(AppCommand::FetchUserData { email });
                }
            }
            AppCommand::TestMail => {
                if let Some(email) = self.require_email() {
                    self.send(AppCommand::SendTestEmail { email });
                }
            }
            AppCommand::Brand(b) => self.set_brand(b),
            AppCommand::Lang(l) => self.set_language(l),
            AppCommand::Help => {
                for line in HELP_LINES {
                    self.add_log(line.to_string());
                }
            }
            AppCommand::Quit => return true,
            AppCommand::Unknown(msg) => {
                if !msg.is_empty() {
                    self.add_log(format!("✗ {}", msg));
                }
            }
            other => self.send(other),
        }
        false
    }

    pub fn apply_event(&mut self, event: AppEvent) {
        match event {
            AppEvent::Log(msg) | AppEvent::Message(msg) | AppEvent::Error(msg) => {
                self.log_messages.push(msg)
            }
            AppEvent::Catalog {
                products,
                companies,
            } => {
                info!("目录已加载: {} 个产品, {} 家公司", products.len(), companies.len());
                self.facets = product_facets(&products);
                self.products_all = products;
                self.companies_all = companies;
                self.catalog_loaded = true;
                self.apply_filters();
            }
            AppEvent::ProductDetail { code, detail } => {
                if self.detail_key == Some(DetailKey::Product(code.clone())) {
                    self.detail = Some(DetailContent::Product(detail));
                } else {
                    debug!("丢弃过期的产品详情: {}", code);
                }
            }
            AppEvent::CompanyDetail { code, detail } => {
                if self.detail_key == Some(DetailKey::Company(code.clone())) {
                    self.detail = Some(DetailContent::Company(detail));
                } else {
                    debug!("丢弃过期的公司详情: {}", code);
                }
            }
            AppEvent::Information(info) => {
                if self.detail_key == Some(DetailKey::Information(info.id.clone())) {
                    self.detail = Some(DetailContent::Information(info));
                } else {
                    debug!("丢弃过期的资讯: {}", info.id);
                }
            }
            AppEvent::DocumentUrl {
                file_name,
                resolution,
            } => {
                let note = match &resolution {
                    Resolution::Primary(_) => "",
                    Resolution::Fallback(_) => " (备用地址)",
                    Resolution::LastResort(_) => " (未能确认可访问)",
                };
                self.add_log(format!("📄 {}{}: {}", file_name, note, resolution.url()));
                self.last_document = Some((file_name, resolution));
            }
            AppEvent::Funds { generation, result } => {
                if generation != self.fund_generation {
                    debug!(
                        "丢弃过期的基金数据 (gen={}, 当前={})",
                        generation, self.fund_generation
                    );
                    return;
                }
                self.funds_loading = false;
                match result {
                    Ok(list) => {
                        self.funds = list;
                        self.funds_error = None;
                    }
                    Err(msg) => {
                        self.funds.clear();
                        self.funds_error = Some(msg);
                    }
                }
                if self.fund_selected >= self.funds.len() {
                    self.fund_selected = 0;
                }
            }
            AppEvent::UserData(data) => {
                self.add_log(format!("✓ 已读取 {} 的设置", data.email));
                self.apply_user_data(*data, true);
            }
            AppEvent::LoginEmail(email) => {
                self.ctx.user_email = Some(email.clone());
                self.email = email.clone();
                self.add_log(format!("✓ 登录用户: {}", email));
                self.send(AppCommand::FetchUserData { email });
            }
        }
    }

    // ---------- 命令行 ----------

    /// 获取当前的预测建议
    pub fn get_completion_hint(&self) -> Option<String> {
        let input = self.command_input.trim_start();
        if input.is_empty() {
            return None;
        }
        if input.contains(' ') {
            return self.facet_hint(input);
        }
        COMMAND_NAMES
            .iter()
            .find(|c| c.starts_with(input) && **c != input)
            .map(|c| c[input.len()..].to_string())
    }

    /// `filter <字段> <前缀>` 按目录中已有的取值补全
    fn facet_hint(&self, input: &str) -> Option<String> {
        let mut parts = input.splitn(3, ' ');
        if !matches!(parts.next()?, "filter" | "f") {
            return None;
        }
        let values = match FilterField::parse(parts.next()?)? {
            FilterField::Company => &self.facets.companies,
            FilterField::Category => &self.facets.categories,
            FilterField::Type => &self.facets.types,
            FilterField::Status => &self.facets.statuses,
            FilterField::Region | FilterField::Hot => return None,
        };
        let partial = parts.next()?;
        values
            .iter()
            .find(|v| v.starts_with(partial) && v.as_str() != partial)
            .map(|v| v[partial.len()..].to_string())
    }

    /// 光标（按字符计）对应的字节位置
    pub fn cursor_byte(&self) -> usize {
        self.command_input
            .char_indices()
            .nth(self.command_cursor)
            .map(|(i, _)| i)
            .unwrap_or(self.command_input.len())
    }

    fn input_len(&self) -> usize {
        self.command_input.chars().count()
    }

    fn leave_command_mode(&mut self) {
        self.command_input.clear();
        self.command_cursor = 0;
        self.input_mode = InputMode::Normal;
    }

    fn handle_command_key(&mut self, key: KeyCode) -> bool {
        match key {
            KeyCode::Enter => {
                let cmd_owned = self.command_input.trim().to_string();
                self.leave_command_mode();
                if cmd_owned.is_empty() {
                    return false;
                }
                self.command_history.push(cmd_owned.clone());
                self.command_history_index = None;
                let cmd = AppCommand::from_str(&cmd_owned)
                    .unwrap_or_else(|_| AppCommand::Unknown(cmd_owned.clone()));
                return self.execute(cmd);
            }
            KeyCode::Esc => self.leave_command_mode(),
            KeyCode::Tab => {
                if let Some(hint) = self.get_completion_hint() {
                    let insert = format!("{} ", hint);
                    let at = self.cursor_byte();
                    self.command_input.insert_str(at, &insert);
                    self.command_cursor += insert.chars().count();
                }
            }
            KeyCode::Up => {
                if self.command_history.is_empty() {
                    return false;
                }
                let next = match self.command_history_index {
                    None => self.command_history.len() - 1,
                    Some(i) => i.saturating_sub(1),
                };
                self.command_history_index = Some(next);
                self.command_input = self.command_history[next].clone();
                self.command_cursor = self.input_len();
            }
            KeyCode::Down => {
                let Some(i) = self.command_history_index else {
                    return false;
                };
                let n = i + 1;
                if n >= self.command_history.len() {
                    self.command_history_index = None;
                    self.command_input.clear();
                    self.command_cursor = 0;
                } else {
                    self.command_history_index = Some(n);
                    self.command_input = self.command_history[n].clone();
                    self.command_cursor = self.input_len();
                }
            }
            KeyCode::Backspace => {
                if self.command_cursor > 0 {
                    self.command_cursor -= 1;
                    let at = self.cursor_byte();
                    self.command_input.remove(at);
                }
            }
            KeyCode::Delete => {
                if self.command_cursor < self.input_len() {
                    let at = self.cursor_byte();
                    self.command_input.remove(at);
                }
            }
            KeyCode::Left => self.command_cursor = self.command_cursor.saturating_sub(1),
            KeyCode::Right => {
                if self.command_cursor < self.input_len() {
                    self.command_cursor += 1;
                }
            }
            KeyCode::Home => self.command_cursor = 0,
            KeyCode::End => self.command_cursor = self.input_len(),
            KeyCode::Char(c) => {
                let at = self.cursor_byte();
                self.command_input.insert(at, c);
                self.command_cursor += 1;
            }
            _ => {}
        }
        false
    }

    pub fn handle_key_event(&mut self, key: KeyCode) -> bool {
        if self.input_mode == InputMode::Command {
            return self.handle_command_key(key);
        }

        // 正常模式下的按键处理
        match key {
            KeyCode::Char('/') | KeyCode::Char(':') => {
                self.input_mode = InputMode::Command;
                self.command_input.clear();
                self.command_cursor = 0;
            }
            KeyCode::Char('q') => return true,
            KeyCode::Left => self.focus_area = FocusArea::Menu,
            KeyCode::Right => self.focus_area = FocusArea::MainView,
            KeyCode::Tab => {
                let base = self.view_mode.menu_index().unwrap_or(self.menu_selected_index);
                self.switch_view(ViewMode::from_menu_index((base + 1) % MENU_ITEMS));
            }
            KeyCode::Up => {
                if self.focus_area == FocusArea::Menu {
                    self.menu_selected_index = self.menu_selected_index.saturating_sub(1);
                } else {
                    match self.view_mode {
                        ViewMode::Detail => {
                            self.detail_scroll = self.detail_scroll.saturating_sub(1)
                        }
                        ViewMode::Funds => self.fund_selected = self.fund_selected.saturating_sub(1),
                        _ => self.selected_index = self.selected_index.saturating_sub(1),
                    }
                }
            }
            KeyCode::Down => {
                if self.focus_area == FocusArea::Menu {
                    if self.menu_selected_index < MENU_ITEMS - 1 {
                        self.menu_selected_index += 1;
                    }
                } else {
                    match self.view_mode {
                        ViewMode::Detail => {
                            self.detail_scroll = self.detail_scroll.saturating_add(1)
                        }
                        ViewMode::Funds => {
                            if self.fund_selected + 1 < self.funds.len() {
                                self.fund_selected += 1;
                            }
                        }
                        _ => {
                            if self.selected_index + 1 < self.page_len() {
                                self.selected_index += 1;
                            }
                        }
                    }
                }
            }
            KeyCode::Enter => {
                if self.focus_area == FocusArea::Menu {
                    self.switch_view(ViewMode::from_menu_index(self.menu_selected_index));
                    self.focus_area = FocusArea::MainView;
                } else {
                    match self.view_mode {
                        ViewMode::Products | ViewMode::Companies => {
                            self.open_row(self.selected_index)
                        }
                        ViewMode::Funds => {
                            if let Some(name) = self.funds.get(self.fund_selected).map(|f| f.name.clone()) {
                                self.execute(AppCommand::Mail(name));
                            }
                        }
                        _ => {}
                    }
                }
            }
            KeyCode::Esc | KeyCode::Char('x') => {
                if self.view_mode == ViewMode::Detail {
                    self.close_detail();
                }
            }
            KeyCode::Char('n') | KeyCode::Char(']') => self.move_page(PageMove::Next),
            KeyCode::Char('p') | KeyCode::Char('[') => self.move_page(PageMove::Prev),
            KeyCode::Char('s') => self.set_page_size(None),
            KeyCode::Char('c') => {
                self.execute(AppCommand::Clear);
            }
            KeyCode::Char('l') => self.set_language(self.ctx.language.next()),
            KeyCode::Char('r') => self.send(AppCommand::LoadCatalog),
            _ => {}
        }
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::model::DocumentFile;
    use crate::funds::FundIssue;

    fn app_with(ctx: AppContext) -> (App, mpsc::UnboundedReceiver<AppCommand>) {
        let (cmd_tx, cmd_rx) = mpsc::unbounded_channel();
        let (_evt_tx, evt_rx) = mpsc::unbounded_channel();
        let app = App::new(Vec::new(), ctx, StoredPreferences::default(), cmd_tx, evt_rx);
        (app, cmd_rx)
    }

    fn app() -> (App, mpsc::UnboundedReceiver<AppCommand>) {
        app_with(AppContext::default())
    }

    fn product(code: &str, name: &str, company: &str) -> Product {
        Product {
            product_code: code.to_string(),
            product_name: Some(name.to_string()),
            company_name: Some(company.to_string()),
            ..Default::default()
        }
    }

    fn company(code: &str, name: &str, region: &str) -> Company {
        Company {
            code: code.to_string(),
            name: Some(name.to_string()),
            region: Some(region.to_string()),
            ..Default::default()
        }
    }

    fn load_catalog(app: &mut App, n: usize) {
        let companies = ["AIA", "AXA", "FWD"];
        let products = (0..n)
            .map(|i| product(&format!("P{}", i), &format!("Plan {}", i), companies[i % 3]))
            .collect();
        app.apply_event(AppEvent::Catalog {
            products,
            companies: vec![company("AIA", "AIA", "HK"), company("AXA", "AXA", "MO")],
        });
    }

    fn drain(rx: &mut mpsc::UnboundedReceiver<AppCommand>) -> Vec<AppCommand> {
        let mut out = Vec::new();
        while let Ok(c) = rx.try_recv() {
            out.push(c);
        }
        out
    }

    fn type_line(app: &mut App, line: &str) -> bool {
        app.handle_key_event(KeyCode::Char('/'));
        for c in line.chars() {
            app.handle_key_event(KeyCode::Char(c));
        }
        app.handle_key_event(KeyCode::Enter)
    }

    #[test]
    fn search_filters_and_resets_page() {
        let (mut app, _rx) = app();
        load_catalog(&mut app, 30);
        app.execute(AppCommand::Page(PageMove::To(2)));
        assert_eq!(app.product_pager.page(), 1);

        type_line(&mut app, "search plan 1");
        assert_eq!(app.product_pager.page(), 0);
        // Plan 1, Plan 10..19
        assert_eq!(app.products.len(), 11);
    }

    #[test]
    fn size_change_resets_page_and_rejects_odd_sizes() {
        let (mut app, _rx) = app();
        load_catalog(&mut app, 60);
        app.execute(AppCommand::Page(PageMove::Last));
        assert_eq!(app.product_pager.page(), 5);
        app.execute(AppCommand::Size(Some(25)));
        assert_eq!(app.product_pager.page(), 0);
        assert_eq!(app.page_products().len(), 25);

        app.execute(AppCommand::Size(Some(7)));
        assert_eq!(app.product_pager.size(), 25);
    }

    #[test]
    fn tab_change_resets_page() {
        let (mut app, _rx) = app();
        load_catalog(&mut app, 30);
        app.execute(AppCommand::Page(PageMove::Next));
        app.execute(AppCommand::Tab(TabTarget::Funds));
        app.execute(AppCommand::Tab(TabTarget::Products));
        assert_eq!(app.product_pager.page(), 0);
        assert_eq!(app.view_mode, ViewMode::Products);
    }

    #[test]
    fn company_tab_only_filters_by_region() {
        let (mut app, _rx) = app();
        load_catalog(&mut app, 3);
        app.execute(AppCommand::Tab(TabTarget::Companies));
        app.execute(AppCommand::Filter {
            field: FilterField::Company,
            value: Some("AIA".to_string()),
        });
        assert_eq!(app.companies.len(), 2);
        app.execute(AppCommand::Filter {
            field: FilterField::Region,
            value: Some("MO".to_string()),
        });
        assert_eq!(app.companies.len(), 1);
        assert_eq!(app.companies[0].code, "AXA");
    }

    #[test]
    fn hot_filter_parses_boolean() {
        let (mut app, _rx) = app();
        app.execute(AppCommand::Filter {
            field: FilterField::Hot,
            value: Some("yes".to_string()),
        });
        assert_eq!(app.product_criteria.hot, Some(true));
        app.execute(AppCommand::Filter {
            field: FilterField::Hot,
            value: None,
        });
        assert_eq!(app.product_criteria.hot, None);
    }

    #[test]
    fn brand_moves_its_company_first() {
        let (mut app, mut rx) = app();
        load_catalog(&mut app, 6);
        app.execute(AppCommand::Brand(Some(Brand::Fwd)));
        let names: Vec<_> = app
            .products
            .iter()
            .map(|p| p.company_name.clone().unwrap_or_default())
            .collect();
        assert_eq!(&names[..2], &["FWD".to_string(), "FWD".to_string()]);
        assert!(drain(&mut rx).iter().any(|c| matches!(
            c,
            AppCommand::StorePreference { key: PreferenceKey::BrandColor, value } if value == "#e67e22"
        )));
    }

    #[test]
    fn brand_switch_requires_whitelist_in_production() {
        let (mut app, _rx) = app_with(AppContext {
            is_production: true,
            user_email: Some("agent@x.com".to_string()),
            admin_emails: vec!["boss@x.com".to_string()],
            ..Default::default()
        });
        app.execute(AppCommand::Brand(Some(Brand::Aia)));
        assert_eq!(app.ctx.brand, None);
    }

    #[test]
    fn fund_selection_bumps_generation_and_ignores_stale_results() {
        let (mut app, mut rx) = app();
        app.execute(AppCommand::Funds(vec!["A".to_string()]));
        app.execute(AppCommand::Funds(vec!["A".to_string(), "B".to_string()]));
        assert_eq!(app.fund_generation, 2);
        assert!(app.funds_loading);

        let fetches: Vec<u64> = drain(&mut rx)
            .into_iter()
            .filter_map(|c| match c {
                AppCommand::FetchFunds { generation, .. } => Some(generation),
                _ => None,
            })
            .collect();
        assert_eq!(fetches, vec![1, 2]);

        let fund = |name: &str| Fund {
            name: name.to_string(),
            issues: vec![FundIssue::default()],
        };
        app.apply_event(AppEvent::Funds {
            generation: 1,
            result: Ok(vec![fund("A")]),
        });
        assert!(app.funds.is_empty());
        assert!(app.funds_loading);

        app.apply_event(AppEvent::Funds {
            generation: 2,
            result: Ok(vec![fund("A"), fund("B")]),
        });
        assert_eq!(app.funds.len(), 2);
        assert!(!app.funds_loading);
    }

    #[test]
    fn fund_error_is_shown_for_current_generation() {
        let (mut app, _rx) = app();
        app.execute(AppCommand::Funds(vec!["A".to_string()]));
        app.apply_event(AppEvent::Funds {
            generation: 1,
            result: Err("fund not found".to_string()),
        });
        assert_eq!(app.funds_error.as_deref(), Some("fund not found"));
    }

    #[test]
    fn stale_detail_is_discarded_and_escape_returns_to_list() {
        let (mut app, mut rx) = app();
        load_catalog(&mut app, 3);
        app.execute(AppCommand::Open(Some(2)));
        assert_eq!(app.view_mode, ViewMode::Detail);
        assert!(drain(&mut rx)
            .iter()
            .any(|c| matches!(c, AppCommand::LoadProductDetail { code } if code == "P1")));

        app.apply_event(AppEvent::ProductDetail {
            code: "P0".to_string(),
            detail: Box::default(),
        });
        assert!(app.detail.is_none());
        app.apply_event(AppEvent::ProductDetail {
            code: "P1".to_string(),
            detail: Box::default(),
        });
        assert!(matches!(app.detail, Some(DetailContent::Product(_))));

        app.handle_key_event(KeyCode::Esc);
        assert_eq!(app.view_mode, ViewMode::Products);
        assert!(app.detail.is_none());
    }

    #[test]
    fn information_stacks_on_company_detail() {
        let (mut app, mut rx) = app();
        load_catalog(&mut app, 3);
        app.execute(AppCommand::Tab(TabTarget::Companies));
        app.execute(AppCommand::Open(Some(1)));
        app.apply_event(AppEvent::CompanyDetail {
            code: "AIA".to_string(),
            detail: Box::default(),
        });
        app.execute(AppCommand::Info("9".to_string()));
        assert_eq!(app.detail_key, Some(DetailKey::Information("9".to_string())));
        drain(&mut rx);

        app.close_detail();
        assert_eq!(app.detail_key, Some(DetailKey::Company("AIA".to_string())));
        assert!(matches!(app.detail, Some(DetailContent::Company(_))));
        app.close_detail();
        assert_eq!(app.view_mode, ViewMode::Companies);
    }

    #[test]
    fn company_documents_only_offer_pdfs() {
        let (mut app, mut rx) = app();
        load_catalog(&mut app, 3);
        app.execute(AppCommand::Tab(TabTarget::Companies));
        app.execute(AppCommand::Open(None));
        let detail = CompanyDetail {
            code: "AIA".to_string(),
            files: vec![
                DocumentFile {
                    file_name: "notes.docx".to_string(),
                },
                DocumentFile {
                    file_name: "Report_V202401.PDF".to_string(),
                },
            ],
            ..Default::default()
        };
        app.apply_event(AppEvent::CompanyDetail {
            code: "AIA".to_string(),
            detail: Box::new(detail),
        });
        drain(&mut rx);

        app.execute(AppCommand::Doc(1));
        match drain(&mut rx).pop() {
            Some(AppCommand::ResolveDocument {
                owner,
                code,
                file_name,
            }) => {
                assert_eq!(owner, DocOwner::Company);
                assert_eq!(code, "AIA");
                assert_eq!(file_name, "Report_V202401.PDF");
            }
            other => panic!("unexpected {:?}", other),
        }
        app.execute(AppCommand::Doc(2));
        assert!(drain(&mut rx).is_empty());
    }

    #[test]
    fn save_requires_email_then_sends_settings() {
        let (mut app, mut rx) = app();
        app.execute(AppCommand::Save);
        assert!(drain(&mut rx).is_empty());

        app.execute(AppCommand::Email("a@b.com".to_string()));
        app.execute(AppCommand::Days(5));
        app.execute(AppCommand::Mail("F".to_string()));
        app.execute(AppCommand::Save);
        match drain(&mut rx).pop() {
            Some(AppCommand::SaveUserData(data)) => {
                assert_eq!(data.email, "a@b.com");
                assert_eq!(data.number_of_days_ahead, Some(5));
                assert_eq!(data.selected_funds_for_mail, vec!["F".to_string()]);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn loaded_user_data_refetches_funds() {
        let (mut app, mut rx) = app();
        let data = UserData {
            email: "a@b.com".to_string(),
            selected_funds: vec!["F".to_string()],
            selected_funds_for_mail: vec!["F".to_string()],
            number_of_days_ahead: Some(4),
            ..Default::default()
        };
        app.apply_event(AppEvent::UserData(Box::new(data)));
        assert_eq!(app.days_ahead, 4);
        assert!(app.mail_selection.contains("F"));
        assert!(drain(&mut rx)
            .iter()
            .any(|c| matches!(c, AppCommand::FetchFunds { generation: 1, .. })));
    }

    #[test]
    fn filter_values_complete_from_catalog() {
        let (mut app, _rx) = app();
        load_catalog(&mut app, 6);
        assert_eq!(app.facets.companies, vec!["AIA", "AXA", "FWD"]);

        app.command_input = "filter company AX".to_string();
        assert_eq!(app.get_completion_hint().as_deref(), Some("A"));
        app.command_input = "filter company FWD".to_string();
        assert_eq!(app.get_completion_hint(), None);
        app.command_input = "filter region A".to_string();
        assert_eq!(app.get_completion_hint(), None);
        app.command_input = "search A".to_string();
        assert_eq!(app.get_completion_hint(), None);
    }

    #[test]
    fn command_line_history_and_completion() {
        let (mut app, _rx) = app();
        app.handle_key_event(KeyCode::Char('/'));
        app.handle_key_event(KeyCode::Char('t'));
        app.handle_key_event(KeyCode::Char('e'));
        assert_eq!(app.get_completion_hint().as_deref(), Some("stmail"));

        app.handle_key_event(KeyCode::Esc);
        type_line(&mut app, "days 3");
        type_line(&mut app, "email 張@例子.com");
        assert_eq!(app.email, "張@例子.com");

        app.handle_key_event(KeyCode::Char('/'));
        app.handle_key_event(KeyCode::Up);
        assert_eq!(app.command_input, "email 張@例子.com");
        app.handle_key_event(KeyCode::Backspace);
        assert_eq!(app.command_input, "email 張@例子.co");
        app.handle_key_event(KeyCode::Up);
        assert_eq!(app.command_input, "days 3");
    }

    #[test]
    fn quit_command_exits() {
        let (mut app, _rx) = app();
        assert!(type_line(&mut app, "quit"));
    }
}
