use crate::app_state::{App, DetailContent, FocusArea, InputMode, ViewMode};
use crate::branding::{localized, Language};
use crate::catalog::model::{info_date_label, DetailSection, InformationSummary};
use crate::document::Resolution;
use crate::funds::{RowEmphasis, FUND_CHOICES};
use chrono::Local;
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, List, ListItem, Paragraph, Row, Table, TableState, Wrap},
    Frame,
};

const MENU_LABELS: [&str; 4] = ["产品", "公司", "基金日历", "设置"];

pub fn draw(f: &mut Frame, app: &mut App) {
    let chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([
            Constraint::Length(3), // 顶部标题栏
            Constraint::Min(0),    // 中间内容区域
            Constraint::Length(12), // 底部命令/日志区域
        ])
        .split(f.size());

    render_top_bar(f, chunks[0], app);

    let middle_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Horizontal)
        .constraints([Constraint::Length(18), Constraint::Min(0)])
        .split(chunks[1]);

    render_left_menu(f, middle_chunks[0], app);
    render_main_view(f, middle_chunks[1], app);
    render_bottom_bar(f, chunks[2], app);
}

/// 标题栏颜色跟随品牌
fn brand_color(app: &App) -> Color {
    match app.ctx.brand {
        Some(b) => {
            let (r, g, b) = b.rgb();
            Color::Rgb(r, g, b)
        }
        None => Color::Green,
    }
}

fn render_top_bar(f: &mut Frame, area: Rect, app: &App) {
    let color = brand_color(app);
    let title = Block::default()
        .borders(Borders::ALL)
        .style(Style::default().fg(color));

    let brand = app.ctx.brand.map(|b| b.company()).unwrap_or("默认");
    let user = app.ctx.user_email.as_deref().unwrap_or("未登录");
    let title_text = Line::from(vec![
        Span::styled(
            " 保险产品资料库 ",
            Style::default()
                .fg(Color::White)
                .bg(color)
                .add_modifier(Modifier::BOLD),
        ),
        Span::raw(format!(
            "  品牌: {}  语言: {}  用户: {}{}",
            brand,
            app.ctx.language.label(),
            user,
            if app.ctx.is_production { "" } else { "  [开发环境]" }
        )),
    ]);

    let paragraph = Paragraph::new(title_text)
        .block(title)
        .alignment(ratatui::layout::Alignment::Center);

    f.render_widget(paragraph, area);
}

fn render_left_menu(f: &mut Frame, area: Rect, app: &App) {
    let active_index = match app.view_mode {
        ViewMode::Products => Some(0),
        ViewMode::Companies => Some(1),
        ViewMode::Funds => Some(2),
        ViewMode::Settings => Some(3),
        ViewMode::Detail => None,
    };
    let menu_items: Vec<ListItem> = MENU_LABELS
        .iter()
        .enumerate()
        .map(|(i, text)| {
            let is_selected = i == app.menu_selected_index;
            let is_active = active_index == Some(i);

            let style = if is_selected {
                if app.focus_area == FocusArea::Menu {
                    Style::default()
                        .fg(Color::Black)
                        .bg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                        .fg(Color::Magenta)
                        .add_modifier(Modifier::BOLD)
                }
            } else if is_active {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };

            let prefix = if is_active { "● " } else { "○ " };
            ListItem::new(format!("{}{}", prefix, text)).style(style)
        })
        .collect();

    let title = if app.focus_area == FocusArea::Menu {
        "菜单 (Enter 确认)"
    } else {
        "菜单 (← 切换)"
    };

    let menu =
        List::new(menu_items).block(Block::default().borders(Borders::ALL).title(title).style(
            if app.focus_area == FocusArea::Menu {
                Style::default().fg(Color::Cyan)
            } else {
                Style::default().fg(Color::White)
            },
        ));

    f.render_widget(menu, area);
}

fn render_main_view(f: &mut Frame, area: Rect, app: &mut App) {
    match app.view_mode {
        ViewMode::Products => render_products(f, area, app),
        ViewMode::Companies => render_companies(f, area, app),
        ViewMode::Funds => render_funds(f, area, app),
        ViewMode::Settings => render_settings(f, area, app),
        ViewMode::Detail => render_detail(f, area, app),
    }
}

fn main_block(title: String, app: &App) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .title(title)
        .style(if app.focus_area == FocusArea::MainView {
            Style::default().fg(Color::Cyan)
        } else {
            Style::default().fg(Color::White)
        })
}

fn opt(v: &Option<String>) -> String {
    v.clone().unwrap_or_else(|| "-".to_string())
}

fn table_state(app: &App) -> TableState {
    let mut state = TableState::default();
    if app.focus_area == FocusArea::MainView {
        state.select(Some(app.selected_index));
    }
    state
}

fn highlight_style() -> Style {
    Style::default()
        .fg(Color::Black)
        .bg(Color::White)
        .add_modifier(Modifier::BOLD)
}

fn render_products(f: &mut Frame, area: Rect, app: &App) {
    let offset = app.product_pager.page() * app.product_pager.size();
    let rows: Vec<Row> = app
        .page_products()
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let hot = if p.hot == Some(true) { "🔥" } else { "" };
            Row::new(vec![
                Cell::from(format!("{}", offset + i + 1)),
                Cell::from(p.product_code.clone()),
                Cell::from(format!("{}{}", opt(&p.product_name), hot)),
                Cell::from(opt(&p.company_name)),
                Cell::from(opt(&p.category_name)),
                Cell::from(opt(&p.product_type)),
                Cell::from(opt(&p.sell_status)),
                Cell::from(opt(&p.region)),
            ])
        })
        .collect();

    let title = if !app.catalog_loaded {
        "产品列表 (加载中...)".to_string()
    } else {
        format!(
            "产品列表 [{}] 共 {} 条 · {}",
            app.product_criteria.describe(),
            app.products.len(),
            app.product_pager.label(app.products.len())
        )
    };

    let header = Row::new(vec!["#", "代码", "名称", "公司", "类别", "类型", "状态", "地区"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(16),
            Constraint::Min(20),
            Constraint::Length(12),
            Constraint::Length(10),
            Constraint::Length(10),
            Constraint::Length(8),
            Constraint::Length(6),
        ],
    )
    .header(header)
    .block(main_block(title, app))
    .highlight_style(highlight_style());

    let mut state = table_state(app);
    f.render_stateful_widget(table, area, &mut state);
}

fn render_companies(f: &mut Frame, area: Rect, app: &App) {
    let offset = app.company_pager.page() * app.company_pager.size();
    let rows: Vec<Row> = app
        .page_companies()
        .iter()
        .enumerate()
        .map(|(i, c)| {
            Row::new(vec![
                Cell::from(format!("{}", offset + i + 1)),
                Cell::from(c.code.clone()),
                Cell::from(opt(&c.name)),
                Cell::from(opt(&c.region)),
                Cell::from(c.desc.clone().unwrap_or_default()),
            ])
        })
        .collect();

    let title = format!(
        "公司列表 [{}] 共 {} 家 · {}",
        app.company_criteria.describe(),
        app.companies.len(),
        app.company_pager.label(app.companies.len())
    );
    let header = Row::new(vec!["#", "代码", "名称", "地区", "简介"])
        .style(Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD));
    let table = Table::new(
        rows,
        [
            Constraint::Length(5),
            Constraint::Length(12),
            Constraint::Length(24),
            Constraint::Length(8),
            Constraint::Min(20),
        ],
    )
    .header(header)
    .block(main_block(title, app))
    .highlight_style(highlight_style());

    let mut state = table_state(app);
    f.render_stateful_widget(table, area, &mut state);
}

fn emphasis_style(e: RowEmphasis) -> Style {
    let fg = if e.dimmed {
        Color::DarkGray
    } else if e.today {
        Color::Yellow
    } else {
        Color::White
    };
    let style = Style::default().fg(fg);
    if e.today {
        style.add_modifier(Modifier::BOLD)
    } else {
        style
    }
}

fn render_funds(f: &mut Frame, area: Rect, app: &App) {
    let today = Local::now().date_naive();
    let mut lines: Vec<Line> = Vec::new();

    lines.push(Line::from(vec![
        Span::styled("已选基金: ", Style::default().fg(Color::Yellow)),
        Span::raw(if app.selected_funds.is_empty() {
            "无".to_string()
        } else {
            app.selected_funds.join(" | ")
        }),
    ]));
    lines.push(Line::from(Span::styled(
        "可选: ".to_string()
            + &FUND_CHOICES
                .iter()
                .enumerate()
                .map(|(i, n)| format!("{}. {}", i + 1, n))
                .collect::<Vec<_>>()
                .join("  "),
        Style::default().fg(Color::DarkGray),
    )));
    lines.push(Line::from(""));

    if app.funds_loading {
        lines.push(Line::from(Span::styled(
            "加载中...",
            Style::default().fg(Color::Cyan),
        )));
    } else if let Some(err) = &app.funds_error {
        lines.push(Line::from(Span::styled(
            format!("✗ {}", err),
            Style::default().fg(Color::Red),
        )));
    } else if app.funds.is_empty() {
        lines.push(Line::from("请至少选择一个基金 (funds <序号>)"));
    } else {
        for (fi, fund) in app.funds.iter().enumerate() {
            let mail = if app.mail_selection.contains(&fund.name) {
                "[✉ 提醒]"
            } else {
                "[  不提醒]"
            };
            let title_style = if fi == app.fund_selected && app.focus_area == FocusArea::MainView
            {
                highlight_style()
            } else {
                Style::default().fg(Color::Cyan).add_modifier(Modifier::BOLD)
            };
            lines.push(Line::from(vec![
                Span::styled(format!("{} ", fund.name), title_style),
                Span::styled(mail, Style::default().fg(Color::Magenta)),
            ]));
            lines.push(Line::from(Span::styled(
                format!(
                    "  {:<12} {:<12} {:<12} {:>8} {:<6}",
                    "派息日", "截止日", "邮件日", "距今", "已发"
                ),
                Style::default().fg(Color::Yellow),
            )));
            for row in app.fund_rows(fund, today) {
                let offset = row
                    .day_offset
                    .map(|d| format!("{}天", d))
                    .unwrap_or_else(|| "N/A".to_string());
                let sent = match row.sent {
                    Some(true) => "✓",
                    Some(false) => "✗",
                    None => "-",
                };
                lines.push(Line::from(Span::styled(
                    format!(
                        "  {:<12} {:<12} {:<12} {:>8} {:<6}",
                        row.issue_date.as_deref().unwrap_or("-"),
                        row.deadline_date.as_deref().unwrap_or("-"),
                        row.email_date.as_deref().unwrap_or("N/A"),
                        offset,
                        sent
                    ),
                    emphasis_style(row.emphasis),
                )));
            }
            lines.push(Line::from(""));
        }
    }

    let p = Paragraph::new(lines)
        .block(main_block(
            format!("基金日历 · 今天 {}", today.format("%Y/%m/%d")),
            app,
        ))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn render_settings(f: &mut Frame, area: Rect, app: &App) {
    let label = |s: &'static str| Span::styled(s, Style::default().fg(Color::Yellow));
    let mut lines = vec![
        Line::from(vec![
            label("邮箱: "),
            Span::raw(if app.email.is_empty() {
                "(未设置)".to_string()
            } else {
                app.email.clone()
            }),
        ]),
        Line::from(vec![
            label("提前天数: "),
            Span::raw(format!("{}", app.days_ahead)),
        ]),
        Line::from(vec![
            label("邮件提醒基金: "),
            Span::raw(if app.mail_selection.names().is_empty() {
                "无".to_string()
            } else {
                app.mail_selection.names().join(" | ")
            }),
        ]),
        Line::from(""),
        Line::from(vec![
            label("品牌: "),
            Span::styled(
                app.ctx.brand.map(|b| b.company()).unwrap_or("默认"),
                Style::default().fg(brand_color(app)),
            ),
            Span::raw(format!("  ({})", app.ctx.brand_color())),
            Span::styled(
                if app.ctx.can_switch_brand() {
                    "  可切换"
                } else {
                    "  无权切换"
                },
                Style::default().fg(Color::DarkGray),
            ),
        ]),
        Line::from(vec![label("语言: ")]),
    ];
    if let Some(last) = lines.last_mut() {
        for lang in Language::ALL {
            let style = if lang == app.ctx.language {
                Style::default().fg(Color::Green).add_modifier(Modifier::BOLD)
            } else {
                Style::default().fg(Color::DarkGray)
            };
            last.spans.push(Span::styled(format!("{} ", lang.label()), style));
        }
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "email <地址> · days <1-10> · mail <序号> · save · load · testmail · brand <名称> · lang <代码>",
        Style::default().fg(Color::DarkGray),
    )));

    let p = Paragraph::new(lines)
        .block(main_block("设置".to_string(), app))
        .wrap(Wrap { trim: false });
    f.render_widget(p, area);
}

fn section_lines(sections: &[DetailSection], lines: &mut Vec<Line<'static>>) {
    for section in sections {
        lines.push(Line::from(Span::styled(
            format!("【{}】", section.name),
            Style::default().fg(Color::Yellow),
        )));
        for attr in &section.attributes {
            lines.push(Line::from(format!(
                "  {}: {}",
                attr.name,
                attr.value.as_deref().unwrap_or("-")
            )));
        }
    }
}

fn information_lines(items: &[InformationSummary], lines: &mut Vec<Line<'static>>) {
    if items.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(
        "资讯 (info <id> 查看)",
        Style::default().fg(Color::Yellow),
    )));
    for item in items {
        lines.push(Line::from(format!(
            "  [{}] {} {} · {}",
            item.id,
            info_date_label(item.time.as_deref()),
            item.info_type,
            item.title
        )));
    }
}

fn file_lines(app: &App, lines: &mut Vec<Line<'static>>) {
    let files = app.document_files();
    if files.is_empty() {
        return;
    }
    lines.push(Line::from(Span::styled(
        "文档 (doc <序号> 获取链接)",
        Style::default().fg(Color::Yellow),
    )));
    for (i, file) in files.iter().enumerate() {
        lines.push(Line::from(format!("  {}. {}", i + 1, file.file_name)));
    }
    if let Some((name, resolution)) = &app.last_document {
        let color = match resolution {
            Resolution::Primary(_) => Color::Green,
            Resolution::Fallback(_) => Color::Cyan,
            Resolution::LastResort(_) => Color::Yellow,
        };
        lines.push(Line::from(vec![
            Span::raw(format!("  → {}: ", name)),
            Span::styled(resolution.url().to_string(), Style::default().fg(color)),
        ]));
    }
}

fn render_detail(f: &mut Frame, area: Rect, app: &App) {
    let lang = app.ctx.language;
    let mut lines: Vec<Line<'static>> = Vec::new();
    let title;

    match &app.detail {
        None => {
            title = "详情".to_string();
            lines.push(Line::from("加载中..."));
        }
        Some(DetailContent::Product(d)) => {
            title = format!("产品详情: {}", opt(&d.product_name));
            lines.push(Line::from(vec![
                Span::styled("公司: ", Style::default().fg(Color::Cyan)),
                Span::raw(opt(&d.company_name)),
                Span::styled("  类别: ", Style::default().fg(Color::Cyan)),
                Span::raw(opt(&d.category_name)),
                Span::styled("  类型: ", Style::default().fg(Color::Cyan)),
                Span::raw(opt(&d.product_type)),
            ]));
            if let Some(desc) = &d.desc {
                lines.push(Line::from(desc.clone()));
            }
            if !d.highlights.is_empty() {
                lines.push(Line::from(Span::styled("亮点", Style::default().fg(Color::Yellow))));
                for h in &d.highlights {
                    lines.push(Line::from(format!("  • {}", h)));
                }
            }
            if !d.currencies.is_empty() {
                lines.push(Line::from(format!("货币: {}", d.currencies.join(", "))));
            }
            if !d.frequencies.is_empty() {
                lines.push(Line::from(format!("缴费频率: {}", d.frequencies.join(", "))));
            }
            section_lines(&d.details, &mut lines);
            file_lines(app, &mut lines);
            information_lines(&d.information, &mut lines);
        }
        Some(DetailContent::Company(d)) => {
            let name = localized(d.name_i18n.as_ref(), d.name.as_deref(), lang)
                .unwrap_or(d.code.as_str())
                .to_string();
            title = format!("公司详情: {}", name);
            lines.push(Line::from(vec![
                Span::styled("代码: ", Style::default().fg(Color::Cyan)),
                Span::raw(d.code.clone()),
                Span::styled("  地区: ", Style::default().fg(Color::Cyan)),
                Span::raw(opt(&d.region)),
            ]));
            if let Some(desc) = localized(d.desc_i18n.as_ref(), d.desc.as_deref(), lang) {
                lines.push(Line::from(desc.to_string()));
            }
            if !d.credit_ratings.is_empty() {
                lines.push(Line::from(Span::styled("信用评级", Style::default().fg(Color::Yellow))));
                for r in &d.credit_ratings {
                    lines.push(Line::from(format!(
                        "  {} {} ({}) {}",
                        r.rating,
                        r.project.as_deref().unwrap_or(""),
                        r.rating_agency.as_deref().unwrap_or("-"),
                        info_date_label(r.time.as_deref())
                    )));
                }
            }
            if !d.links.is_empty() {
                lines.push(Line::from(Span::styled("链接", Style::default().fg(Color::Yellow))));
                for l in &d.links {
                    let desc = localized(l.description_i18n.as_ref(), l.description.as_deref(), lang)
                        .unwrap_or("");
                    lines.push(Line::from(format!("  {} {}", desc, l.link)));
                }
            }
            section_lines(&d.details, &mut lines);
            file_lines(app, &mut lines);
            information_lines(&d.information_newest_first(), &mut lines);
        }
        Some(DetailContent::Information(d)) => {
            title = format!("资讯: {}", d.title);
            lines.push(Line::from(vec![
                Span::styled("时间: ", Style::default().fg(Color::Cyan)),
                Span::raw(info_date_label(d.time.as_deref())),
                Span::styled("  类型: ", Style::default().fg(Color::Cyan)),
                Span::raw(d.info_type.clone()),
                Span::styled("  公司: ", Style::default().fg(Color::Cyan)),
                Span::raw(opt(&d.company_name)),
            ]));
            if !d.tags.is_empty() {
                lines.push(Line::from(format!("标签: {}", d.tags.join(", "))));
            }
            if let Some(content) = &d.content {
                for l in content.lines() {
                    lines.push(Line::from(l.to_string()));
                }
            }
            file_lines(app, &mut lines);
        }
    }

    let depth = app.detail_stack.len();
    let full_title = if depth > 0 {
        format!("{} (Esc 返回上一层)", title)
    } else {
        format!("{} (Esc 返回)", title)
    };
    let p = Paragraph::new(lines)
        .block(main_block(full_title, app))
        .wrap(Wrap { trim: false })
        .scroll((app.detail_scroll, 0));
    f.render_widget(p, area);
}

fn render_bottom_bar(f: &mut Frame, area: Rect, app: &App) {
    let bottom_chunks = Layout::default()
        .direction(ratatui::layout::Direction::Vertical)
        .constraints([Constraint::Length(4), Constraint::Min(0)])
        .split(area);

    let command_prompt = if app.input_mode == InputMode::Command {
        let mut spans = vec![Span::styled(
            "命令: ",
            Style::default()
                .fg(Color::Green)
                .add_modifier(Modifier::BOLD),
        )];
        let (left, right) = app.command_input.split_at(app.cursor_byte());
        spans.push(Span::raw(left));
        spans.push(Span::styled("_", Style::default().fg(Color::Yellow)));
        spans.push(Span::raw(right));

        // 补全建议显示为灰色
        if let Some(hint) = app.get_completion_hint() {
            spans.push(Span::styled(hint, Style::default().fg(Color::DarkGray)));
        }

        vec![
            Line::from(spans),
            Line::from("Enter执行 Esc取消 Tab补全 ←→光标 Home/End ↑历史 ↓下一条"),
        ]
    } else {
        vec![
            Line::from(vec![
                Span::styled("命令: ", Style::default().fg(Color::Yellow)),
                Span::raw("(按 / 进入命令模式，help 查看命令)"),
            ]),
            Line::from("Tab切换页 ←→焦点 ↑↓选择 Enter打开 n/p翻页 s每页条数 c清除 l语言 x返回 q退出"),
        ]
    };
    let command_paragraph = Paragraph::new(command_prompt).block(
        Block::default()
            .borders(Borders::ALL)
            .title(if app.input_mode == InputMode::Command {
                "命令输入模式"
            } else {
                "命令输入"
            })
            .style(if app.input_mode == InputMode::Command {
                Style::default().fg(Color::Green)
            } else {
                Style::default().fg(Color::White)
            }),
    );
    f.render_widget(command_paragraph, bottom_chunks[0]);

    // 最新的日志在顶部
    let log_items: Vec<ListItem> = app
        .log_messages
        .iter()
        .rev()
        .take(20)
        .map(|msg| {
            let style = if msg.starts_with('✓') {
                Style::default().fg(Color::Green)
            } else if msg.starts_with('✗') {
                Style::default().fg(Color::Red)
            } else if msg.starts_with('⚠') {
                Style::default().fg(Color::Yellow)
            } else {
                Style::default().fg(Color::White)
            };
            ListItem::new(msg.as_str()).style(style)
        })
        .collect();

    let log = List::new(log_items).block(
        Block::default()
            .borders(Borders::ALL)
            .title(format!("日志 (共 {} 条)", app.log_messages.len()))
            .style(Style::default().fg(Color::White)),
    );
    f.render_widget(log, bottom_chunks[1]);
}
