//! Layout and drawing: login, board, HUD, message log, level transition, game over,
//! pause and quit overlays.

use crate::app::{QuitOption, Screen};
use crate::motion::Motion;
use crate::theme::Theme;
use blocktui::engine::{Cell, Grid, Symbol};
use blocktui::leaderboard::{Leaderboard, TOP_N};
use blocktui::palette::{GlyphSet, Palette};
use blocktui::session::Session;
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Direction, Layout, Position, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Widget};
use std::collections::HashSet;
use std::time::Instant;
use tachyonfx::{
    CellFilter, Duration as TfxDuration, Effect, EffectRenderer, Interpolation, fx, ref_count,
};

/// Terminal columns per tile; emoji take two of them.
const CELL_WIDTH: u16 = 6;
const CELL_HEIGHT: u16 = 3;
const SIDEBAR_WIDTH: u16 = 30;
const LOG_LINES: usize = 5;
/// Fade of cleared tiles, a bit shorter than the highlight pause.
pub const CLEAR_FADE_MS: u32 = 260;

/// What the board is doing this frame.
#[derive(Debug, Clone, Copy)]
pub enum BoardFx<'a> {
    Still,
    /// Cells about to be cleared.
    Clearing(&'a [Cell]),
    /// Tiles falling into place; progress in [0, 1].
    Falling(&'a Motion, f64),
}

/// Everything one frame needs, borrowed from the app.
pub struct View<'a> {
    pub screen: Screen,
    pub paused: bool,
    pub theme: &'a Theme,
    pub session: &'a Session,
    pub grid: &'a Grid,
    pub palette: &'a Palette,
    pub glyphs: GlyphSet,
    pub cursor: Cell,
    pub selected: Option<Cell>,
    pub board_fx: BoardFx<'a>,
    pub player: Option<&'a str>,
    pub name_input: &'a str,
    pub leaderboard: &'a Leaderboard,
    pub quit_selected: QuitOption,
    pub status: Option<&'a str>,
}

/// Board outer size (with border) in terminal cells.
fn board_size(grid: &Grid) -> (u16, u16) {
    (
        grid.cols() as u16 * CELL_WIDTH + 2,
        grid.rows() as u16 * CELL_HEIGHT + 2,
    )
}

/// Whether the board and sidebar fit the terminal at all.
pub fn fits(term_cols: u16, term_rows: u16, rows: usize, cols: usize) -> bool {
    let w = cols as u16 * CELL_WIDTH + 2 + SIDEBAR_WIDTH;
    let h = rows as u16 * CELL_HEIGHT + 2;
    term_cols >= w && term_rows >= h
}

fn centered(area: Rect, w: u16, h: u16) -> Rect {
    Rect {
        x: area.x + area.width.saturating_sub(w) / 2,
        y: area.y + area.height.saturating_sub(h) / 2,
        width: w.min(area.width),
        height: h.min(area.height),
    }
}

/// Board inner rect (no border); matches `draw_game`'s layout.
fn board_rect(area: Rect, grid: &Grid) -> Rect {
    let (bw, bh) = board_size(grid);
    let outer = centered(area, bw + SIDEBAR_WIDTH, bh);
    Rect {
        x: outer.x + 1,
        y: outer.y + 1,
        width: bw.saturating_sub(2).min(outer.width.saturating_sub(2)),
        height: bh.saturating_sub(2).min(outer.height.saturating_sub(2)),
    }
}

fn clearing_buffer_positions(board: Rect, cells: &[Cell]) -> HashSet<(u16, u16)> {
    let mut set = HashSet::new();
    for cell in cells {
        let x0 = board.x + cell.col as u16 * CELL_WIDTH;
        let y0 = board.y + cell.row as u16 * CELL_HEIGHT;
        for x in x0..(x0 + CELL_WIDTH).min(board.x + board.width) {
            for y in y0..(y0 + CELL_HEIGHT).min(board.y + board.height) {
                set.insert((x, y));
            }
        }
    }
    set
}

pub fn draw(
    frame: &mut Frame,
    view: &View<'_>,
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let area = frame.area();
    frame.buffer_mut().set_style(area, Style::default().bg(view.theme.bg));
    match view.screen {
        Screen::Login => draw_login(frame, view, area),
        Screen::Playing | Screen::QuitMenu
            if !fits(area.width, area.height, view.grid.rows(), view.grid.cols()) =>
        {
            Paragraph::new("Terminal too small for this board. Enlarge it or press q.")
                .style(Style::default().fg(view.theme.warning))
                .render(area, frame.buffer_mut());
        }
        Screen::Playing | Screen::QuitMenu => {
            draw_game(frame, view, area);
            if let BoardFx::Clearing(cells) = view.board_fx {
                apply_clear_effect(frame, view, area, cells, clear_effect, clear_effect_time, now);
            }
            if view.paused {
                draw_pause_overlay(frame, view, area);
            }
            if view.screen == Screen::QuitMenu {
                draw_quit_menu(frame, view, area);
            }
        }
        Screen::LevelTransition => draw_level_transition(frame, view, area),
        Screen::GameOver => draw_game_over(frame, view, area),
    }
}

/// Creates the fade on first use, then advances it by the frame delta.
fn apply_clear_effect(
    frame: &mut Frame,
    view: &View<'_>,
    area: Rect,
    cells: &[Cell],
    clear_effect: &mut Option<Effect>,
    clear_effect_time: &mut Option<Instant>,
    now: Instant,
) {
    let board = board_rect(area, view.grid);
    let delta = clear_effect_time
        .map(|t| now.saturating_duration_since(t))
        .unwrap_or_default();
    let delta = TfxDuration::from_millis(delta.as_millis().min(u128::from(u32::MAX)) as u32);
    *clear_effect_time = Some(now);

    if clear_effect.is_none() {
        let positions = clearing_buffer_positions(board, cells);
        let filter = CellFilter::PositionFn(ref_count(move |pos: Position| {
            positions.contains(&(pos.x, pos.y))
        }));
        let bg = view.theme.bg;
        *clear_effect = Some(
            fx::fade_to(bg, bg, (CLEAR_FADE_MS, Interpolation::QuadIn))
                .with_filter(filter)
                .with_area(board),
        );
    }
    if let Some(effect) = clear_effect {
        frame.render_effect(effect, board, delta);
    }
}

fn draw_game(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let (bw, bh) = board_size(view.grid);
    let outer = centered(area, bw + SIDEBAR_WIDTH, bh);
    let chunks = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Length(bw), Constraint::Length(SIDEBAR_WIDTH)])
        .split(outer);

    let title = format!(" {} · level {} ", view.palette.name, view.session.level);
    Block::default()
        .borders(Borders::ALL)
        .border_style(Style::default().fg(view.theme.border))
        .title(Span::styled(title, Style::default().fg(view.theme.title).bold()))
        .render(chunks[0], frame.buffer_mut());
    draw_board(frame, view, board_rect(area, view.grid));
    draw_sidebar(frame, view, chunks[1]);
}

fn draw_board(frame: &mut Frame, view: &View<'_>, board: Rect) {
    let buf = frame.buffer_mut();
    for (cell, tile) in view.grid.tiles() {
        let lift = match view.board_fx {
            BoardFx::Falling(motion, progress) => {
                (motion.remaining(tile.id, progress) * f64::from(CELL_HEIGHT)).round() as u16
            }
            _ => 0,
        };
        let x = board.x + cell.col as u16 * CELL_WIDTH;
        let bottom = board.y + cell.row as u16 * CELL_HEIGHT + CELL_HEIGHT;
        // tiles still above the board are clipped row by row
        let Some(y_end) = bottom.checked_sub(lift) else {
            continue;
        };
        let y_start = y_end.saturating_sub(CELL_HEIGHT);

        let tile_bg = match tile.symbol {
            Symbol::Regular(id) => view.theme.tile_color(id),
            Symbol::Special(_) => view.theme.special,
        };
        let mut style = Style::default().bg(tile_bg).fg(Color::Black);
        if view.selected == Some(cell) {
            style = style.bg(view.theme.selection).bold();
        }
        for y in y_start.max(board.y)..y_end.min(board.y + board.height) {
            for dx in 1..CELL_WIDTH - 1 {
                buf[(x + dx, y)].set_style(style);
            }
        }
        let mid = y_start + CELL_HEIGHT / 2;
        if mid >= board.y && mid < board.y + board.height {
            let glyph = view.palette.glyph(tile.symbol, view.glyphs);
            buf.set_string(x + 2, mid, glyph, style);
        }
    }

    let cur = view.cursor;
    let cx = board.x + cur.col as u16 * CELL_WIDTH;
    let cy = board.y + cur.row as u16 * CELL_HEIGHT + CELL_HEIGHT / 2;
    let cursor_style = Style::default().fg(view.theme.cursor).bold();
    buf.set_string(cx, cy, "▶", cursor_style);
    buf.set_string(cx + CELL_WIDTH - 1, cy, "◀", cursor_style);
}

fn draw_sidebar(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let session = view.session;
    let border_style = Style::default().fg(theme.border);
    let title_style = Style::default().fg(theme.title).bold();
    let text_style = Style::default().fg(theme.text);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(5),
            Constraint::Length(6),
            Constraint::Min(LOG_LINES as u16 + 2),
            Constraint::Length(1),
        ])
        .split(area);

    let stats = vec![
        Line::from(vec![
            Span::styled("Player: ", title_style),
            Span::styled(view.player.unwrap_or("-"), text_style),
        ]),
        Line::from(vec![
            Span::styled("Level:  ", title_style),
            Span::styled(session.level.to_string(), text_style),
        ]),
        Line::from(vec![
            Span::styled("Total:  ", title_style),
            Span::styled(session.total_cleared.to_string(), text_style),
        ]),
    ];
    Paragraph::new(stats)
        .block(Block::default().borders(Borders::ALL).border_style(border_style))
        .render(chunks[0], frame.buffer_mut());

    let gauges_block = Block::default().borders(Borders::ALL).border_style(border_style);
    let gauges_inner = gauges_block.inner(chunks[1]);
    gauges_block.render(chunks[1], frame.buffer_mut());
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1); 4])
        .split(gauges_inner);

    Paragraph::new(Span::styled(format!("Blocks left: {}", session.remaining), title_style))
        .render(rows[0], frame.buffer_mut());
    Gauge::default()
        .ratio(session.block_ratio())
        .label("")
        .gauge_style(Style::default().fg(theme.tiles[3]).bg(theme.border))
        .render(rows[1], frame.buffer_mut());

    Paragraph::new(Span::styled(format!("Time: {}s", session.time_left), title_style))
        .render(rows[2], frame.buffer_mut());
    let time_ratio = session.time_ratio();
    let bar_color = if time_ratio > 0.5 {
        theme.tiles[0]
    } else if time_ratio > 0.25 {
        theme.tiles[1]
    } else {
        theme.warning
    };
    Gauge::default()
        .ratio(time_ratio)
        .label("")
        .gauge_style(Style::default().fg(bar_color).bg(theme.border))
        .render(rows[3], frame.buffer_mut());

    let mut log: Vec<Line> = session
        .recent_messages(LOG_LINES)
        .map(|m| Line::from(Span::styled(m.to_string(), text_style)))
        .collect();
    if let Some(status) = view.status {
        let style = Style::default().fg(theme.warning);
        log.insert(0, Line::from(Span::styled(status.to_string(), style)));
    }
    Paragraph::new(log)
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(border_style)
                .title(Span::styled(" Log ", title_style)),
        )
        .render(chunks[2], frame.buffer_mut());

    Paragraph::new(Span::styled(
        "←↑↓→ move  ␣ select  p pause  q quit",
        Style::default().fg(theme.inactive),
    ))
    .render(chunks[3], frame.buffer_mut());
}

fn popup(frame: &mut Frame, view: &View<'_>, area: Rect, title: &str, lines: Vec<Line<'_>>) {
    let h = lines.len() as u16 + 2;
    let w = lines.iter().map(Line::width).max().unwrap_or(0) as u16 + 6;
    let rect = centered(area, w.max(30), h);
    Clear.render(rect, frame.buffer_mut());
    Paragraph::new(lines)
        .alignment(Alignment::Center)
        .style(Style::default().bg(view.theme.bg))
        .block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(view.theme.border))
                .title(Span::styled(
                    format!(" {title} "),
                    Style::default().fg(view.theme.title).bold(),
                )),
        )
        .render(rect, frame.buffer_mut());
}

fn draw_login(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let text = Style::default().fg(view.theme.text);
    let input = format!(" {}▏", view.name_input);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("🧱 Block Game", Style::default().fg(view.theme.title).bold())),
        Line::from(""),
        Line::from(Span::styled("Enter your name", text)),
        Line::from(Span::styled(
            format!("{input:<24}"),
            Style::default().fg(view.theme.cursor).bg(view.theme.border),
        )),
        Line::from(""),
        Line::from(Span::styled(
            "Enter start   Esc quit",
            Style::default().fg(view.theme.inactive),
        )),
        Line::from(""),
    ];
    popup(frame, view, area, "blocktui", lines);
}

fn draw_level_transition(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let text = Style::default().fg(view.theme.text);
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            format!("🎉 Level {} complete!", view.session.level),
            Style::default().fg(view.theme.title).bold(),
        )),
        Line::from(""),
        Line::from(Span::styled(
            format!("Blocks cleared so far: {}", view.session.total_cleared),
            text,
        )),
        Line::from(Span::styled(format!("Next up: level {}", view.session.level + 1), text)),
        Line::from(""),
        Line::from(Span::styled(
            "Enter continue   q quit",
            Style::default().fg(view.theme.inactive),
        )),
        Line::from(""),
    ];
    popup(frame, view, area, "Level up", lines);
}

fn draw_game_over(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let theme = view.theme;
    let text = Style::default().fg(theme.text);
    let mut lines = vec![
        Line::from(""),
        Line::from(Span::styled(
            " ⏰ Time's up! ",
            Style::default().fg(Color::White).bg(theme.warning),
        )),
        Line::from(""),
        Line::from(Span::styled(format!("Reached level {}", view.session.level), text)),
        Line::from(Span::styled(format!("Blocks cleared: {}", view.session.total_cleared), text)),
        Line::from(""),
        Line::from(Span::styled("Leaderboard", Style::default().fg(theme.title).bold())),
    ];
    let top = view.leaderboard.top(TOP_N);
    if top.is_empty() {
        lines.push(Line::from(Span::styled("no runs yet", Style::default().fg(theme.inactive))));
    }
    for (rank, record) in top.iter().enumerate() {
        let style = if view.player == Some(record.name.as_str()) {
            Style::default().fg(theme.selection).bold()
        } else {
            text
        };
        lines.push(Line::from(Span::styled(
            format!(
                "{:>2}. {:<16} {:>5} {:>7}",
                rank + 1,
                record.name,
                record.best_run,
                record.total_blocks
            ),
            style,
        )));
    }
    if let Some(status) = view.status {
        let style = Style::default().fg(theme.warning);
        lines.push(Line::from(Span::styled(status.to_string(), style)));
    }
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled(
        "r restart   s sign out   q quit",
        Style::default().fg(theme.inactive),
    )));
    lines.push(Line::from(""));
    popup(frame, view, area, "Game over", lines);
}

fn draw_pause_overlay(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let lines = vec![
        Line::from(""),
        Line::from(Span::styled("Paused", Style::default().fg(view.theme.title).bold())),
        Line::from(Span::styled("p resume   q quit", Style::default().fg(view.theme.inactive))),
        Line::from(""),
    ];
    popup(frame, view, area, "blocktui", lines);
}

fn draw_quit_menu(frame: &mut Frame, view: &View<'_>, area: Rect) {
    let options = [
        (QuitOption::Resume, "Resume"),
        (QuitOption::Restart, "Restart"),
        (QuitOption::Exit, "Exit"),
    ];
    let mut lines = vec![Line::from("")];
    for (opt, label) in options {
        let style = if opt == view.quit_selected {
            Style::default().fg(view.theme.bg).bg(view.theme.title).bold()
        } else {
            Style::default().fg(view.theme.title)
        };
        lines.push(Line::from(Span::styled(format!(" {label} "), style)));
        lines.push(Line::from(""));
    }
    popup(frame, view, area, "Quit?", lines);
}
