use crossterm::event::{self, Event, KeyCode, KeyEventKind, KeyModifiers};
use ratatui::{
    layout::{Constraint, Layout, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Paragraph},
    Frame,
};

use crate::announcements::{list_announcements, ALL_CATEGORIES};
use crate::auth::Principal;
use crate::db::get_metadata;
use crate::error::{Result, WargaError};
use crate::fmt::{compact, month_abbr, number};
use crate::models::{Announcement, FundType};
use crate::reports::{get_dashboard, DashboardStats};
use crate::tui::{money_span, status_span, wrap_text, BOLD, FOOTER_STYLE, HEADER_STYLE};

use super::{today, Session};

const RECENT_ANNOUNCEMENTS: usize = 3;

struct Dashboard {
    greeting: String,
    principal: Principal,
    stats: Option<DashboardStats>,
    announcements: Vec<Announcement>,
    status_message: Option<String>,
}

impl Dashboard {
    fn new(principal: Principal, community: Option<String>) -> Self {
        let first_name = principal
            .full_name
            .split_whitespace()
            .next()
            .unwrap_or(&principal.username)
            .to_string();
        let greeting = match community {
            Some(name) => format!("{name}: Halo, {first_name}."),
            None => format!("Warga: Halo, {first_name}."),
        };
        Self {
            greeting,
            principal,
            stats: None,
            announcements: Vec::new(),
            status_message: None,
        }
    }

    fn load_data(&mut self, conn: &rusqlite::Connection) -> Result<()> {
        self.stats = Some(get_dashboard(conn, &self.principal, today())?);
        let mut announcements = list_announcements(conn, ALL_CATEGORIES)?;
        announcements.truncate(RECENT_ANNOUNCEMENTS);
        self.announcements = announcements;
        Ok(())
    }

    fn refresh(&mut self, conn: &rusqlite::Connection) {
        self.status_message = match self.load_data(conn) {
            Ok(()) => None,
            Err(e) => Some(format!("Could not refresh: {e}")),
        };
    }

    fn draw(&self, frame: &mut Frame) {
        let area = frame.area();
        let border_style = Style::default().fg(Color::DarkGray);

        let [header_area, sep1, stats_area, sep2, charts_area, sep3, hints_area] =
            Layout::vertical([
                Constraint::Length(1),
                Constraint::Length(1),
                Constraint::Length(5),
                Constraint::Length(1),
                Constraint::Fill(1),
                Constraint::Length(1),
                Constraint::Length(1),
            ])
            .areas(area);

        frame.render_widget(
            Paragraph::new(format!(" {}", self.greeting)).style(HEADER_STYLE),
            header_area,
        );

        let sep_line = "━".repeat(area.width as usize);
        let sep_widget = Paragraph::new(sep_line.as_str()).style(border_style);
        frame.render_widget(sep_widget.clone(), sep1);
        frame.render_widget(sep_widget.clone(), sep2);
        frame.render_widget(sep_widget, sep3);

        if let Some(stats) = &self.stats {
            let [left_area, right_area] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(stats_area);
            frame.render_widget(Paragraph::new(self.summary_lines(stats)), left_area);
            frame.render_widget(Paragraph::new(balance_lines(stats)), right_area);

            let [chart_left, chart_right] =
                Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)])
                    .areas(charts_area);
            draw_cashflow(frame, chart_left, stats);
            self.draw_side_panel(frame, chart_right, stats);
        }

        let hints = match &self.status_message {
            Some(msg) => Paragraph::new(format!(" {msg}")).style(Style::default().fg(Color::Yellow)),
            None => Paragraph::new(" r=refresh  q=quit").style(FOOTER_STYLE),
        };
        frame.render_widget(hints, hints_area);
    }

    fn summary_lines(&self, stats: &DashboardStats) -> Vec<Line<'static>> {
        vec![
            Line::from(format!(" Residents        {}", number(stats.residents))),
            Line::from(format!(" Pending payments {}", number(stats.pending_payments))),
            Line::from(vec![
                Span::raw(format!(" Income {}      ", stats.year)),
                money_span(year_total(&stats.cashflow.income)),
            ]),
            Line::from(vec![
                Span::raw(format!(" Expenses {}    ", stats.year)),
                money_span(-year_total(&stats.cashflow.expense)),
            ]),
            Line::from(format!(
                " Signed in as     {} ({})",
                self.principal.username,
                self.principal.role.as_str()
            )),
        ]
    }

    /// Residents see their own dues status; admins see recent announcements.
    fn draw_side_panel(&self, frame: &mut Frame, area: Rect, stats: &DashboardStats) {
        let mut lines = Vec::new();
        if let Some(statuses) = &stats.resident_status {
            lines.push(Line::from(Span::styled(" Your dues this year", BOLD)));
            let mut spans = vec![Span::raw(" ")];
            for status in statuses {
                spans.push(status_span(*status));
                spans.push(Span::raw(" "));
            }
            lines.push(Line::from(spans));
            lines.push(Line::from(""));
        }

        lines.push(Line::from(Span::styled(" Announcements", BOLD)));
        if self.announcements.is_empty() {
            lines.push(Line::from(Span::styled(" Nothing posted yet.", FOOTER_STYLE)));
        }
        let width = area.width.saturating_sub(2) as usize;
        for a in &self.announcements {
            lines.push(Line::from(vec![
                Span::raw(format!(" {} ", a.title)),
                Span::styled(format!("[{}]", a.category), FOOTER_STYLE),
            ]));
            let (wrapped, _) = wrap_text(&a.content, width);
            for text in wrapped.lines() {
                lines.push(Line::from(Span::styled(format!(" {text}"), FOOTER_STYLE)));
            }
        }
        frame.render_widget(Paragraph::new(lines), area);
    }
}

fn year_total(months: &[i64; 12]) -> i64 {
    months.iter().fold(0i64, |acc, v| acc.saturating_add(*v))
}

fn balance_lines(stats: &DashboardStats) -> Vec<Line<'static>> {
    let mut lines = vec![Line::from(Span::styled(" Fund Balances", BOLD))];
    for fund in FundType::ALL {
        let balance = stats.balances.fund(fund).balance;
        lines.push(Line::from(vec![
            Span::raw(format!(" {:<16}", fund.label())),
            money_span(balance),
        ]));
    }
    lines.push(Line::from(vec![
        Span::styled(format!(" {:<16}", "Total"), BOLD),
        money_span(stats.balances.total.balance),
    ]));
    lines
}

fn draw_cashflow(frame: &mut Frame, area: Rect, stats: &DashboardStats) {
    let income_style = Style::default().fg(Color::Rgb(80, 220, 100));
    let expense_style = Style::default().fg(Color::Red);

    let max_val = stats
        .cashflow
        .income
        .iter()
        .chain(stats.cashflow.expense.iter())
        .copied()
        .max()
        .unwrap_or(0);
    let (top_tick, mid_tick) = y_axis_ticks(max_val);
    let top_label = compact(top_tick);
    let mid_label = compact(mid_tick);
    let y_label_width = top_label.len().max(mid_label.len()) as u16 + 1;

    let [y_axis_area, bar_area] =
        Layout::horizontal([Constraint::Length(y_label_width), Constraint::Fill(1)]).areas(area);

    // Title row, then the top tick, with the mid tick halfway down.
    let inner_height = bar_area.height.saturating_sub(2);
    let mid_row = inner_height / 2;
    let mut y_lines: Vec<Line> = vec![Line::from("")];
    for row in 0..inner_height {
        let label = if row == 0 {
            Some(&top_label)
        } else if row == mid_row {
            Some(&mid_label)
        } else {
            None
        };
        y_lines.push(match label {
            Some(l) => Line::from(Span::styled(
                format!("{:>width$}", l, width = y_label_width as usize),
                FOOTER_STYLE,
            )),
            None => Line::from(""),
        });
    }
    frame.render_widget(Paragraph::new(y_lines), y_axis_area);

    let block = Block::default()
        .title(format!("Cash Flow {}", stats.year))
        .title_style(BOLD)
        .borders(Borders::NONE);

    let mut chart = BarChart::default()
        .block(block)
        .bar_width(2)
        .bar_gap(0)
        .group_gap(1)
        .max(top_tick.max(1) as u64);
    for (idx, month) in (1..=12u32).enumerate() {
        let inc = stats.cashflow.income[idx].max(0) as u64;
        let exp = stats.cashflow.expense[idx].max(0) as u64;
        let bars = [
            Bar::default().value(inc).text_value(String::new()).style(income_style),
            Bar::default().value(exp).text_value(String::new()).style(expense_style),
        ];
        chart = chart.data(
            BarGroup::default()
                .label(Line::from(month_abbr(month)))
                .bars(&bars),
        );
    }
    frame.render_widget(chart, bar_area);
}

/// Round y-axis ticks (top and mid) covering `max_val` rupiah.
fn y_axis_ticks(max_val: i64) -> (i64, i64) {
    const STEPS: [i64; 12] = [
        100_000,
        250_000,
        500_000,
        1_000_000,
        2_500_000,
        5_000_000,
        10_000_000,
        25_000_000,
        50_000_000,
        100_000_000,
        250_000_000,
        500_000_000,
    ];
    let top = STEPS.iter().copied().find(|&s| s >= max_val).unwrap_or(max_val);
    (top, top / 2)
}

pub fn run(as_user: Option<&str>) -> Result<()> {
    let session = Session::open(as_user)?;
    let community = get_metadata(&session.conn, "community_name");
    let mut dashboard = Dashboard::new(session.principal.clone(), community);
    dashboard.load_data(&session.conn)?;

    let hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        ratatui::restore();
        hook(info);
    }));

    let mut terminal = ratatui::init();
    let result: std::result::Result<(), WargaError> = loop {
        if let Err(e) = terminal.draw(|frame| dashboard.draw(frame)) {
            break Err(e.into());
        }
        match event::read() {
            Err(e) => break Err(e.into()),
            Ok(Event::Key(key)) => {
                if key.kind != KeyEventKind::Press {
                    continue;
                }
                if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
                    break Ok(());
                }
                match key.code {
                    KeyCode::Char('q') | KeyCode::Esc => break Ok(()),
                    KeyCode::Char('r') => dashboard.refresh(&session.conn),
                    _ => {}
                }
            }
            _ => {}
        }
    };

    drop(terminal);
    ratatui::restore();
    result
}
