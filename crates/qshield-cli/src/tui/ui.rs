//! TUI rendering, one screen per dashboard view.
//!
//! ┌──────────────────────────────────────────────┐
//! │  🛡 Quantum Shield  Overview │ QKD │ QRNG …  │
//! ├──────────────────────┬───────────────────────┤
//! │  view body: gauges, lists and charts read    │
//! │  from the rendered surface                   │
//! ├──────────────────────┴───────────────────────┤
//! │  notifications                               │
//! ├──────────────────────────────────────────────┤
//! │  1-5 views  g qrng  t scan  u/U c/C uplink   │
//! └──────────────────────────────────────────────┘

use super::app::{App, ChartSnapshot, Snapshot, class_color};
use qshield_core::render::ids;
use qshield_core::{ChartId, ChartKind, Element, View};
use ratatui::{prelude::*, widgets::*};

pub fn draw(f: &mut Frame, app: &App) {
    let snap = app.snapshot();
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // title + tabs
            Constraint::Min(10),   // view body
            Constraint::Length(7), // notifications
            Constraint::Length(1), // keys / status
        ])
        .split(f.area());

    draw_title(f, rows[0], &snap);
    match snap.view {
        View::Overview => draw_overview(f, rows[1], &snap),
        View::Qkd => draw_qkd(f, rows[1], &snap),
        View::Qrng => draw_qrng(f, rows[1], &snap),
        View::Threats => draw_threats(f, rows[1], &snap),
        View::Analytics => draw_analytics(f, rows[1], &snap),
    }
    draw_rows(f, rows[2], " Notifications ", &snap.notifications);
    draw_keys(f, rows[3], app.status());
}

fn draw_title(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let selected = View::ALL.iter().position(|v| *v == snap.view).unwrap_or(0);
    let titles: Vec<String> = View::ALL
        .iter()
        .enumerate()
        .map(|(i, v)| format!("{} {}", i + 1, v.title()))
        .collect();

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(Color::Cyan))
        .title(Line::from(vec![
            Span::styled(" 🛡 Quantum Shield ", Style::default().bold().fg(Color::Cyan)),
            Span::styled(
                format!(" {}  security {} ", snap.time, snap.text(ids::SECURITY_SCORE)),
                Style::default().fg(Color::DarkGray),
            ),
        ]));
    let tabs = Tabs::new(titles)
        .block(block)
        .select(selected)
        .highlight_style(Style::default().bold().fg(Color::Yellow));
    f.render_widget(tabs, area);
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

fn draw_overview(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
        .split(area);

    let gauges = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Min(4),
        ])
        .split(cols[0]);

    let cpu = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" CPU "))
        .gauge_style(Style::default().fg(load_color(f64::from(snap.cpu_usage) / 100.0)))
        .ratio((f64::from(snap.cpu_usage) / 100.0).clamp(0.0, 1.0))
        .label(snap.text(ids::CPU_USAGE).to_string());
    f.render_widget(cpu, gauges[0]);

    let coherence = Gauge::default()
        .block(Block::default().borders(Borders::ALL).title(" Quantum coherence "))
        .gauge_style(Style::default().fg(Color::Green))
        .ratio(snap.quantum_coherence.clamp(0.0, 1.0))
        .label(snap.text(ids::QUANTUM_COHERENCE).to_string());
    f.render_widget(coherence, gauges[1]);

    let lines = vec![
        field_line("Network latency", snap.text(ids::NETWORK_LATENCY)),
        field_line("Security score", snap.text(ids::SECURITY_SCORE)),
        field_line("Active threats", snap.text(ids::THREAT_COUNT)),
        field_line("Secure protocols", snap.text(ids::PROTOCOL_COUNT)),
        field_line("QRNG rate", snap.text(ids::GENERATION_RATE)),
    ];
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" System "));
    f.render_widget(p, gauges[2]);

    let right = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(cols[1]);
    draw_rows(f, right[0], " Threat feed ", &snap.threats);
    draw_rows(
        f,
        right[1],
        &format!(" Platforms ({}) ", snap.text(ids::PLATFORM_COUNT)),
        &snap.platforms,
    );
}

fn draw_qkd(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area);
    draw_rows(
        f,
        rows[0],
        &format!(" QKD protocols ({} secure) ", snap.text(ids::PROTOCOL_COUNT)),
        &snap.protocols,
    );
    draw_rows(
        f,
        rows[1],
        &format!(" Defense platforms ({}) ", snap.text(ids::PLATFORM_COUNT)),
        &snap.platforms,
    );
}

fn draw_qrng(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(6), Constraint::Min(6)])
        .split(area);
    let lines = vec![
        field_line("Generation rate", snap.text(ids::GENERATION_RATE)),
        field_line("Entropy level", snap.text(ids::ENTROPY_LEVEL)),
        field_line("Tests passed", snap.text(ids::TESTS_PASSED)),
        field_line("Buffer", snap.text(ids::CURRENT_BUFFER)),
    ];
    let p = Paragraph::new(lines).block(Block::default().borders(Borders::ALL).title(" QRNG "));
    f.render_widget(p, rows[0]);
    draw_chart(f, rows[1], snap.chart(ChartId::Entropy), ChartId::Entropy);
}

fn draw_threats(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let cols = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(area);
    draw_rows(
        f,
        cols[0],
        &format!(" Threat feed ({}) ", snap.text(ids::THREAT_COUNT)),
        &snap.threats,
    );
    draw_chart(f, cols[1], snap.chart(ChartId::Detection), ChartId::Detection);
}

fn draw_analytics(f: &mut Frame, area: Rect, snap: &Snapshot) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Percentage(55),
            Constraint::Min(6),
        ])
        .split(area);

    let score = snap.text(ids::ANOMALY_SCORE);
    let over = score.parse::<f64>().is_ok_and(|s| s > snap.threshold);
    let line = Line::from(vec![
        Span::styled("Anomaly score ", Style::default().bold()),
        Span::styled(
            score.to_string(),
            Style::default().fg(if over { Color::Red } else { Color::Green }),
        ),
        Span::raw("   threshold "),
        Span::styled(
            snap.text(ids::ANOMALY_THRESHOLD).to_string(),
            Style::default().fg(Color::Yellow),
        ),
        Span::styled("   [ / ] adjust", Style::default().fg(Color::DarkGray)),
    ]);
    let p = Paragraph::new(line)
        .block(Block::default().borders(Borders::ALL).title(" AI analytics "));
    f.render_widget(p, rows[0]);

    draw_chart(f, rows[1], snap.chart(ChartId::Anomaly), ChartId::Anomaly);
    draw_chart(f, rows[2], snap.chart(ChartId::Performance), ChartId::Performance);
}

// ---------------------------------------------------------------------------
// Widgets
// ---------------------------------------------------------------------------

fn draw_rows(f: &mut Frame, area: Rect, title: &str, rows: &[Element]) {
    let items: Vec<ListItem> = rows
        .iter()
        .map(|row| {
            ListItem::new(Line::from(row.text.clone()))
                .style(Style::default().fg(class_color(&row.class)))
        })
        .collect();
    let list = List::new(items)
        .block(Block::default().borders(Borders::ALL).title(title.to_string()));
    f.render_widget(list, area);
}

fn draw_chart(f: &mut Frame, area: Rect, chart: Option<&ChartSnapshot>, id: ChartId) {
    let Some(chart) = chart.filter(|c| !c.is_empty()) else {
        let p = Paragraph::new("No data yet")
            .style(Style::default().fg(Color::DarkGray))
            .block(Block::default().borders(Borders::ALL).title(format!(" {} ", id.title())));
        f.render_widget(p, area);
        return;
    };
    match chart.kind {
        ChartKind::Line => draw_line_chart(f, area, chart),
        ChartKind::Bar => draw_bar_chart(f, area, chart),
    }
}

fn draw_line_chart(f: &mut Frame, area: Rect, chart: &ChartSnapshot) {
    let points: Vec<Vec<(f64, f64)>> = chart
        .datasets
        .iter()
        .map(|d| d.values.iter().enumerate().map(|(i, &v)| (i as f64, v)).collect())
        .collect();

    let datasets: Vec<Dataset> = chart
        .datasets
        .iter()
        .zip(&points)
        .map(|(d, data)| {
            let latest = d.values.last().copied().unwrap_or(0.0);
            Dataset::default()
                .name(format!("{} {latest:.3}", d.label))
                .marker(symbols::Marker::Braille)
                .graph_type(GraphType::Line)
                .style(Style::default().fg(d.color))
                .data(data)
        })
        .collect();

    let (y_min, y_max) = chart.y_range;
    let x_max = (chart.len().saturating_sub(1) as f64).max(1.0);
    let first = chart.labels.first().cloned().unwrap_or_default();
    let last = chart.labels.last().cloned().unwrap_or_default();

    let widget = Chart::new(datasets)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", chart.id.title())),
        )
        .x_axis(
            Axis::default()
                .bounds([0.0, x_max])
                .labels(vec![Line::from(first), Line::from(last)]),
        )
        .y_axis(Axis::default().bounds([y_min, y_max]).labels(vec![
            Line::from(format!("{y_min:.2}")),
            Line::from(format!("{y_max:.2}")),
        ]));
    f.render_widget(widget, area);
}

fn draw_bar_chart(f: &mut Frame, area: Rect, chart: &ChartSnapshot) {
    let mut widget = BarChart::default()
        .block(
            Block::default()
                .borders(Borders::ALL)
                .title(format!(" {} ", chart.id.title())),
        )
        .bar_width(3)
        .bar_gap(0)
        .group_gap(2);

    for (i, label) in chart.labels.iter().enumerate() {
        let bars: Vec<Bar> = chart
            .datasets
            .iter()
            .map(|d| {
                let value = d.values.get(i).copied().unwrap_or(0.0).max(0.0);
                Bar::default()
                    .value(value.round() as u64)
                    .style(Style::default().fg(d.color))
            })
            .collect();
        widget = widget.data(
            BarGroup::default()
                .label(Line::from(label.clone()))
                .bars(&bars),
        );
    }
    f.render_widget(widget, area);
}

fn draw_keys(f: &mut Frame, area: Rect, status: Option<&str>) {
    let keys =
        " 1-5/Tab views  g qrng  t scan  u/U quantum  c/C classical  [ ] threshold  s export  q quit";
    let text = match status {
        Some(s) => format!("{keys}   │ {s}"),
        None => keys.to_string(),
    };
    let bar = Paragraph::new(text).style(Style::default().bg(Color::DarkGray).fg(Color::White));
    f.render_widget(bar, area);
}

fn field_line(name: &str, value: &str) -> Line<'static> {
    Line::from(vec![
        Span::styled(format!("{name}: "), Style::default().bold()),
        Span::raw(value.to_string()),
    ])
}

fn load_color(ratio: f64) -> Color {
    if ratio >= 0.85 {
        Color::Red
    } else if ratio >= 0.6 {
        Color::Yellow
    } else {
        Color::Green
    }
}
