//! UI rendering for the debugger.

use ratatui::{
    prelude::*,
    widgets::{Block, Borders, Paragraph, List, ListItem},
    style::{Color, Style, Modifier},
};
use crate::control::RunMode;
use super::app::DebuggerApp;

/// Main draw function.
pub fn draw(frame: &mut Frame, app: &DebuggerApp) {
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(60),
            Constraint::Percentage(40),
        ])
        .split(frame.area());

    // Left side: code and status
    let left_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(6),
            Constraint::Length(3),
        ])
        .split(chunks[0]);

    draw_disassembly(frame, left_chunks[0], app);
    draw_registers(frame, left_chunks[1], app);
    draw_status(frame, left_chunks[2], app);

    // Right side: memory and help
    let right_chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Min(10),
            Constraint::Length(5),
        ])
        .split(chunks[1]);

    draw_memory(frame, right_chunks[0], app);
    draw_help(frame, right_chunks[1]);
}

/// Draw the classified listing; data cells are dimmed.
fn draw_disassembly(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let regs = &app.machine().regs;

    let items: Vec<ListItem> = app
        .listing()
        .iter()
        .map(|line| {
            let is_current = line.address == regs.ip;
            let is_break = line.address != 0 && (line.address == regs.br1 || line.address == regs.br2);
            let prefix = if is_current { "▶ " } else { "  " };
            let bp = if is_break { "●" } else { " " };

            let style = if is_current {
                Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD)
            } else if is_break {
                Style::default().fg(Color::Red)
            } else if line.is_code() {
                Style::default()
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(format!("{} {}{}", bp, prefix, line)).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(format!(" Disassembly ({}) ", app.machine().model().name()))
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Cyan)));

    frame.render_widget(list, area);
}

/// Draw registers and flags.
fn draw_registers(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let machine = app.machine();
    let regs = &machine.regs;

    let content = vec![
        Line::from(vec![
            Span::raw("IP: "),
            Span::styled(format!("{:02X}", regs.ip), Style::default().fg(Color::Yellow)),
            Span::raw("   CR: "),
            Span::styled(format!("{:04X}", regs.cr as u16), Style::default().fg(Color::White)),
            Span::raw("   SM: "),
            Span::styled(format!("{:04X}", regs.sm as u16), Style::default().fg(Color::White)),
            Span::raw(format!(" = {}", regs.sm)),
        ]),
        Line::from(vec![
            Span::raw("OP1: "),
            Span::styled(format!("{:04X}", regs.op1 as u16), Style::default().fg(Color::White)),
            Span::raw("   OP2: "),
            Span::styled(format!("{:04X}", regs.op2 as u16), Style::default().fg(Color::White)),
            Span::raw("   "),
            Span::styled(if regs.w { "W-" } else { "W+" }, flag_style(regs.w)),
            Span::raw(" "),
            Span::styled("OV", flag_style(regs.ov)),
            Span::raw(" "),
            Span::styled("D0", flag_style(regs.d0)),
        ]),
        Line::from(vec![
            Span::raw("Cycles: "),
            Span::styled(format!("{}", machine.cycles), Style::default().fg(Color::Cyan)),
            Span::raw("   Mode: "),
            Span::styled(app.mode().label(), mode_style(app.mode())),
            Span::raw(format!("   BR1: {:02X}  BR2: {:02X}", regs.br1, regs.br2)),
        ]),
        Line::from(vec![
            Span::raw("Output: "),
            Span::styled(
                app.control.printed.iter().map(|v| v.to_string()).collect::<Vec<_>>().join(" "),
                Style::default().fg(Color::Green),
            ),
        ]),
    ];

    let paragraph = Paragraph::new(content)
        .block(Block::default()
            .title(" Registers ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Green)));

    frame.render_widget(paragraph, area);
}

/// Draw memory view.
fn draw_memory(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let mem = &app.machine().mem;

    let items: Vec<ListItem> = mem
        .dump(0, mem.last_address())
        .into_iter()
        .map(|(addr, value)| {
            let text = format!("{:02X}: {:04X} = {:6}", addr, value as u16, value);

            let style = if addr == app.selected_addr {
                Style::default().fg(Color::Black).bg(Color::White)
            } else if value != 0 {
                Style::default().fg(Color::White)
            } else {
                Style::default().fg(Color::DarkGray)
            };

            ListItem::new(text).style(style)
        })
        .collect();

    let list = List::new(items)
        .block(Block::default()
            .title(" Memory ")
            .borders(Borders::ALL)
            .border_style(Style::default().fg(Color::Magenta)));

    frame.render_widget(list, area);
}

/// Draw status bar.
fn draw_status(frame: &mut Frame, area: Rect, app: &DebuggerApp) {
    let status = Paragraph::new(app.status.clone())
        .style(Style::default().fg(Color::White))
        .block(Block::default()
            .title(" Status ")
            .borders(Borders::ALL));

    frame.render_widget(status, area);
}

/// Draw help panel.
fn draw_help(frame: &mut Frame, area: Rect) {
    let help = Paragraph::new(vec![
        Line::from("a: Auto  s: Stop  t: Step mode  space: Step"),
        Line::from("b: Breakpoint  x: Reset  ↑↓: Select  q: Quit"),
    ])
    .style(Style::default().fg(Color::DarkGray))
    .block(Block::default()
        .title(" Help ")
        .borders(Borders::ALL));

    frame.render_widget(help, area);
}

fn flag_style(set: bool) -> Style {
    if set {
        Style::default().fg(Color::Red).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn mode_style(mode: RunMode) -> Style {
    match mode {
        RunMode::Auto => Style::default().fg(Color::Green),
        RunMode::Step => Style::default().fg(Color::Yellow),
        RunMode::Stop | RunMode::Quit => Style::default().fg(Color::Red),
    }
}
