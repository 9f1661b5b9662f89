use carebridge_core::{Route, Session};
use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Wrap},
    Frame,
};

use crate::app::{App, AppState, LoginFocus};

use super::styles;

/// Width of the toast column when notifications are showing
const TOAST_PANEL_WIDTH: u16 = 42;

pub fn render(frame: &mut Frame, app: &App) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(8),    // Page + toasts
            Constraint::Length(1), // Status bar
        ])
        .split(frame.area());

    render_header(frame, app, chunks[0]);

    if app.notifications.is_empty() {
        render_page(frame, app, chunks[1]);
    } else {
        let body = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Min(20), Constraint::Length(TOAST_PANEL_WIDTH)])
            .split(chunks[1]);
        render_page(frame, app, body[0]);
        render_toasts(frame, app, body[1]);
    }

    render_status_bar(frame, app, chunks[2]);

    // Render overlays
    match app.state {
        AppState::LoggingIn => render_login_overlay(frame, app),
        AppState::ShowingHelp => render_help_overlay(frame, app.nav_items().len()),
        AppState::ConfirmingQuit => render_quit_overlay(frame),
        AppState::Normal | AppState::Quitting => {}
    }
}

fn render_header(frame: &mut Frame, app: &App, area: Rect) {
    let current_path = app.current_route.path();

    let mut spans = vec![Span::styled("  CareBridge  ", styles::title_style())];
    for (i, item) in app.nav_items().iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled(" | ", styles::muted_style()));
        }
        spans.push(Span::styled(format!("[{}] ", i + 1), styles::help_key_style()));
        spans.push(Span::styled(
            item.label,
            styles::nav_style(item.route.is_active(current_path)),
        ));
    }

    let who = match &app.session {
        Session::Authenticated(user) => user.first_name().to_string(),
        Session::Unauthenticated => "Guest".to_string(),
        Session::Unknown => "...".to_string(),
    };
    let count = app.notification_count();
    let badge = format!(" {} ", count);
    let left_len: usize = spans.iter().map(|s| s.content.chars().count()).sum();
    let padding = header_padding(area.width, left_len, &who, &badge);
    spans.push(Span::raw(" ".repeat(padding)));
    spans.push(Span::styled(who, styles::highlight_style()));
    spans.push(Span::raw("  "));
    spans.push(Span::styled(badge, styles::badge_style(count > 0)));

    let block = Block::default()
        .borders(Borders::BOTTOM)
        .border_style(styles::muted_style());

    frame.render_widget(Paragraph::new(Line::from(spans)).block(block), area);
}

fn render_page(frame: &mut Frame, app: &App, area: Rect) {
    let route = app.current_route;
    let block = Block::default()
        .title(Span::styled(format!(" {} ", route.title()), styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(app.state == AppState::Normal));

    if route.is_protected() && app.session.is_resolving() {
        let lines = vec![
            Line::from(""),
            Line::from(Span::styled("  Resolving session...", styles::muted_style())),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    if route == Route::Patients {
        render_patients(frame, app, area, block);
        return;
    }

    let lines = page_lines(app, route);
    let paragraph = Paragraph::new(lines)
        .block(block)
        .wrap(Wrap { trim: false });
    frame.render_widget(paragraph, area);
}

fn text(s: &str) -> Line<'static> {
    Line::from(Span::styled(format!("  {}", s), styles::list_item_style()))
}

fn muted(s: &str) -> Line<'static> {
    Line::from(Span::styled(format!("  {}", s), styles::muted_style()))
}

fn page_lines(app: &App, route: Route) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from("")];
    match route {
        Route::Home => {
            lines.push(text("Maternal and family health, one place."));
            lines.push(Line::from(""));
            lines.push(muted(
                "Learn, find a facility near you, or sign in to manage care.",
            ));
            lines.push(muted("Press [l] to sign in, [?] for help."));
        }
        Route::Education => {
            lines.push(text("Health education"));
            lines.push(Line::from(""));
            for topic in [
                "Prenatal checkups and what to expect",
                "Nutrition during pregnancy",
                "Recognizing danger signs",
                "Newborn care and immunization",
            ] {
                lines.push(muted(&format!("- {}", topic)));
            }
        }
        Route::FacilityLocator => {
            lines.push(text("Find a facility"));
            lines.push(Line::from(""));
            lines.push(muted(
                "Search by town or region to see nearby clinics and hospitals.",
            ));
        }
        Route::UssdAccess => {
            lines.push(text("No smartphone? No problem."));
            lines.push(Line::from(""));
            lines.push(muted("Dial the USSD short code from any phone to book visits"));
            lines.push(muted("and receive reminders by SMS."));
        }
        Route::Dashboard => {
            if let Some(user) = app.user() {
                lines.push(text(&format!("Welcome back, {}.", user.name)));
            }
            lines.push(Line::from(""));
            lines.push(muted(&format!(
                "Patients registered: {}",
                app.core.patients().len()
            )));
            lines.push(muted(&format!(
                "Active notifications: {}",
                app.notification_count()
            )));
        }
        Route::Profile => {
            if let Some(user) = app.user() {
                lines.push(text(&format!("Name:  {}", user.name)));
                lines.push(text(&format!("Email: {}", user.email)));
                lines.push(muted(&format!("ID:    {}", user.id)));
            }
        }
        Route::Settings => {
            lines.push(text(&format!("Credential storage: {:?}", app.config.storage)));
            lines.push(text(&format!(
                "Notification lifetime: {} ms",
                app.core.notifications().default_expiry_ms()
            )));
        }
        Route::Appointments | Route::Inventory | Route::Analytics => {
            lines.push(muted("Nothing here yet."));
        }
        Route::Login | Route::Register | Route::ForgotPassword | Route::Patients => {
            lines.push(muted("Press [l] to sign in."));
        }
    }
    lines
}

fn render_patients(frame: &mut Frame, app: &App, area: Rect, block: Block) {
    let patients = app.core.patients().patients();
    if patients.is_empty() {
        let lines = vec![
            Line::from(""),
            muted("No patients yet. Press [a] to add one."),
        ];
        frame.render_widget(Paragraph::new(lines).block(block), area);
        return;
    }

    let items: Vec<ListItem> = patients
        .iter()
        .enumerate()
        .map(|(i, p)| {
            let style = if i == app.patient_selection {
                styles::selected_style()
            } else {
                styles::list_item_style()
            };
            ListItem::new(Line::from(vec![
                Span::styled(format!(" {:<8}", p.id), styles::muted_style()),
                Span::styled(format!("{:<22}", p.name), style),
                Span::styled(format!("{:>4}  ", p.age), style),
                Span::styled(p.condition_display().to_string(), styles::muted_style()),
            ]))
        })
        .collect();

    frame.render_widget(List::new(items).block(block), area);
}

fn render_toasts(frame: &mut Frame, app: &App, area: Rect) {
    let items: Vec<ListItem> = app
        .notifications
        .iter()
        .map(|n| {
            ListItem::new(vec![
                Line::from(vec![
                    Span::styled(
                        format!(" {} ", n.kind.label()),
                        styles::kind_style(n.kind),
                    ),
                    Span::styled(n.age_display(), styles::muted_style()),
                ]),
                Line::from(Span::styled(
                    format!(" {}", n.message),
                    styles::list_item_style(),
                )),
            ])
        })
        .collect();

    let block = Block::default()
        .title(Span::styled(" Notifications ", styles::title_style()))
        .borders(Borders::ALL)
        .border_style(styles::border_style(false));

    frame.render_widget(List::new(items).block(block), area);
}

fn render_status_bar(frame: &mut Frame, app: &App, area: Rect) {
    let left_text = match &app.session {
        Session::Authenticated(user) => format!(" Signed in as {} ", user.email),
        Session::Unauthenticated => " Not signed in ".to_string(),
        Session::Unknown => " Checking session... ".to_string(),
    };
    let right_text = if app.session.is_authenticated() {
        " [o]ut | [n]otify | [x] dismiss | [c]lear | [?] | [q]uit "
    } else {
        " [l]ogin | [n]otify | [x] dismiss | [c]lear | [?] | [q]uit "
    };

    let padding_len = (area.width as usize)
        .saturating_sub(left_text.len())
        .saturating_sub(right_text.len());
    let status_line = Line::from(vec![
        Span::styled(left_text, styles::muted_style()),
        Span::raw(" ".repeat(padding_len)),
        Span::styled(right_text, styles::muted_style()),
    ]);
    frame.render_widget(
        Paragraph::new(status_line).style(styles::status_bar_style()),
        area,
    );
}

fn render_help_overlay(frame: &mut Frame, nav_len: usize) {
    let area = centered_rect_fixed(52, 20, frame.area());
    frame.render_widget(Clear, area);

    let version = env!("CARGO_PKG_VERSION");
    let key = |k: &str, desc: &str| {
        Line::from(vec![
            Span::styled(format!("  {:<10}", k), styles::help_key_style()),
            Span::styled(desc.to_string(), styles::help_desc_style()),
        ])
    };

    let help_text = vec![
        Line::from(Span::styled("  CareBridge", styles::title_style())),
        Line::from(Span::styled(format!("  version {}", version), styles::muted_style())),
        Line::from(""),
        Line::from(Span::styled(" Navigation", styles::highlight_style())),
        key(&format!("1-{}", nav_len), "Open header link"),
        key("h / p / s", "Home / profile / settings"),
        Line::from(""),
        Line::from(Span::styled(" Session", styles::highlight_style())),
        key("l / o", "Sign in / sign out"),
        Line::from(""),
        Line::from(Span::styled(" Notifications", styles::highlight_style())),
        key("n", "Show a test notification"),
        key("x / c", "Dismiss newest / clear all"),
        Line::from(""),
        Line::from(Span::styled(" Patients page", styles::highlight_style())),
        key("a / d / ↑↓", "Add / remove / select"),
        Line::from(""),
        Line::from(vec![
            Span::styled("  Press ", styles::muted_style()),
            Span::styled("?", styles::help_key_style()),
            Span::styled(" or ", styles::muted_style()),
            Span::styled("Esc", styles::help_key_style()),
            Span::styled(" to close", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(help_text).block(block), area);
}

fn login_field<'a>(label: &'a str, value: String, focused: bool) -> Line<'a> {
    let style = if focused {
        styles::selected_style()
    } else {
        styles::list_item_style()
    };
    let cursor = if focused { "▌" } else { "" };
    Line::from(vec![
        Span::raw("  "),
        Span::styled(format!("{:<10}[", label), styles::muted_style()),
        Span::styled(format!("{:<24}{}", value, cursor), style),
        Span::styled("]", styles::muted_style()),
    ])
}

fn render_login_overlay(frame: &mut Frame, app: &App) {
    let height = if app.login_error.is_some() { 12 } else { 10 };
    let area = centered_rect_fixed(46, height, frame.area());
    frame.render_widget(Clear, area);

    let tail = |s: &str| -> String {
        let count = s.chars().count();
        s.chars().skip(count.saturating_sub(24)).collect()
    };

    let mut lines = vec![
        Line::from(Span::styled("  Sign in to CareBridge", styles::title_style())),
        Line::from(""),
        login_field(
            "Name:",
            tail(&app.login_name),
            app.login_focus == LoginFocus::Name,
        ),
        login_field(
            "Email:",
            tail(&app.login_email),
            app.login_focus == LoginFocus::Email,
        ),
        login_field(
            "Password:",
            "*".repeat(app.login_password.chars().count().min(24)),
            app.login_focus == LoginFocus::Password,
        ),
        Line::from(""),
    ];

    let button_focused = app.login_focus == LoginFocus::Button;
    let (label, style) = if button_focused {
        (" ▶ Sign in ◀ ", styles::selected_style())
    } else {
        ("   Sign in   ", styles::list_item_style())
    };
    lines.push(Line::from(vec![
        Span::raw("              ["),
        Span::styled(label, style),
        Span::raw("]"),
    ]));

    if let Some(ref error) = app.login_error {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            format!("  {}", error),
            styles::error_style(),
        )));
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

fn render_quit_overlay(frame: &mut Frame) {
    let area = centered_rect_fixed(46, 7, frame.area());
    frame.render_widget(Clear, area);

    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            "   Are you sure you want to quit?",
            styles::highlight_style(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("   Press ", styles::muted_style()),
            Span::styled("[Y]", styles::help_key_style()),
            Span::styled(" to quit, ", styles::muted_style()),
            Span::styled("[N]", styles::help_key_style()),
            Span::styled(" to cancel", styles::muted_style()),
        ]),
    ];

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(styles::border_style(true))
        .style(Style::default());

    frame.render_widget(Paragraph::new(lines).block(block), area);
}

/// Spaces between the nav links and the right-aligned user name and badge.
/// Widths are counted in characters so non-ASCII names line up.
fn header_padding(width: u16, left_len: usize, who: &str, badge: &str) -> usize {
    let right_len = who.chars().count() + badge.chars().count() + 3;
    (width as usize).saturating_sub(left_len + right_len + 1)
}

/// Create a centered rectangle with fixed dimensions
fn centered_rect_fixed(width: u16, height: u16, r: Rect) -> Rect {
    let x = r.x + (r.width.saturating_sub(width)) / 2;
    let y = r.y + (r.height.saturating_sub(height)) / 2;
    Rect::new(x, y, width.min(r.width), height.min(r.height))
}
