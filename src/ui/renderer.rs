/// Presentation layer: double-buffered, diff-based terminal renderer.
///
/// How it works:
///   1. Build the next frame into `front` buffer (grid of Cell)
///   2. Compare each cell with `back` buffer (previous frame)
///   3. Only emit terminal commands for cells that changed
///   4. All commands are batched with `queue!`, flushed once at the end
///   5. Swap front/back
///
/// One screen: title bar, scores, the phrase card, key help, plus the
/// install banner and the debug overlay when they apply.

use std::io::{self, BufWriter, Stdout, Write};

use crossterm::{
    cursor::{self, MoveTo},
    execute, queue,
    style::{Color, Print, SetBackgroundColor, SetForegroundColor},
    terminal::{self, Clear, ClearType},
};

use crate::debug::DebugReport;
use crate::domain::match_state::{MatchState, Team};
use crate::platform::install::InstallState;

// ── Cell: the unit of the back-buffer ──

#[derive(Clone, Copy, PartialEq)]
struct Cell {
    ch: char,
    fg: Color,
    bg: Color,
}

impl Cell {
    /// Explicit dark background for all "empty" cells, so inter-row gap
    /// pixels match on VTE-based terminals.
    const BASE_BG: Color = Color::Rgb { r: 28, g: 18, b: 38 };

    const BLANK: Cell = Cell { ch: ' ', fg: Color::White, bg: Cell::BASE_BG };

    /// Sentinel used to invalidate the back buffer: differs from any
    /// real cell, so every position gets diff'd.
    const INVALID: Cell = Cell { ch: '\0', fg: Color::Magenta, bg: Color::Magenta };
}

// ── Palette ──

const TITLE_FG: Color = Color::Rgb { r: 255, g: 170, b: 60 };
const CARD_BG: Color = Color::Rgb { r: 245, g: 240, b: 230 };
const CARD_FG: Color = Color::Rgb { r: 30, g: 24, b: 18 };
const CARD_HINT: Color = Color::Rgb { r: 120, g: 112, b: 104 };
const ACTIVE_FG: Color = Color::Rgb { r: 120, g: 255, b: 140 };
const DIM_FG: Color = Color::Rgb { r: 150, g: 140, b: 160 };
const BANNER_BG: Color = Color::Rgb { r: 60, g: 40, b: 90 };
const PANEL_BG: Color = Color::Rgb { r: 18, g: 12, b: 26 };

/// Everything the renderer needs for one frame.
pub struct Frame<'a> {
    pub title: &'a str,
    pub match_state: &'a MatchState,
    pub install: InstallState,
    pub offline_copy: bool,
    pub message: &'a str,
    pub debug: Option<&'a DebugReport>,
}

pub struct Renderer {
    writer: BufWriter<Stdout>,
    front: Vec<Cell>,
    back: Vec<Cell>,
    term_w: usize,
    term_h: usize,
}

impl Renderer {
    pub fn new() -> Self {
        Renderer {
            writer: BufWriter::new(io::stdout()),
            front: Vec::new(),
            back: Vec::new(),
            term_w: 0,
            term_h: 0,
        }
    }

    pub fn init(&mut self) -> io::Result<()> {
        terminal::enable_raw_mode()?;
        execute!(
            self.writer,
            terminal::EnterAlternateScreen,
            cursor::Hide,
            SetBackgroundColor(Cell::BASE_BG),
            Clear(ClearType::All)
        )?;
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        self.resize(tw as usize, th as usize);
        Ok(())
    }

    pub fn cleanup(&mut self) -> io::Result<()> {
        execute!(
            self.writer,
            cursor::Show,
            terminal::LeaveAlternateScreen
        )?;
        terminal::disable_raw_mode()
    }

    fn resize(&mut self, w: usize, h: usize) {
        self.term_w = w;
        self.term_h = h;
        self.front = vec![Cell::BLANK; w * h];
        // Full repaint on next diff.
        self.back = vec![Cell::INVALID; w * h];
    }

    pub fn render(&mut self, frame: &Frame) -> io::Result<()> {
        let (tw, th) = terminal::size().unwrap_or((80, 24));
        if tw as usize != self.term_w || th as usize != self.term_h {
            self.resize(tw as usize, th as usize);
            queue!(self.writer, SetBackgroundColor(Cell::BASE_BG), Clear(ClearType::All))?;
        }

        self.front.fill(Cell::BLANK);
        self.compose(frame);
        self.flush_diff()
    }

    // ── Frame composition ──

    fn compose(&mut self, frame: &Frame) {
        let w = self.term_w;
        if w < 20 || self.term_h < 14 {
            self.put_str(0, 0, "terminal too small", DIM_FG, Cell::BASE_BG);
            return;
        }

        // Title bar
        self.put_str_centered(1, frame.title, TITLE_FG, Cell::BASE_BG);
        let badge = match (frame.install, frame.offline_copy) {
            (_, true) => "offline copy",
            (InstallState::Installed, _) => "installed",
            _ => "",
        };
        if !badge.is_empty() {
            let x = w.saturating_sub(badge.len() + 1);
            self.put_str(x, 1, badge, DIM_FG, Cell::BASE_BG);
        }

        // Scores and turn
        let ms = frame.match_state;
        let scores = format!(
            "Team A: {}    |    Team B: {}",
            ms.score(Team::A),
            ms.score(Team::B)
        );
        self.put_str_centered(3, &scores, Color::White, Cell::BASE_BG);
        let turn = format!("Current turn: {}", ms.active.label());
        self.put_str_centered(4, &turn, ACTIVE_FG, Cell::BASE_BG);

        // Phrase card
        let card_w = (w - 4).min(44);
        let card_x = (w - card_w) / 2;
        self.draw_card(card_x, 6, card_w, 5, ms);

        // Selection and key help
        let selection = format!(
            "Language: {}    Category: {}",
            ms.language.label(),
            ms.category.label()
        );
        self.put_str_centered(12, &selection, Color::White, Cell::BASE_BG);
        self.put_str_centered(
            13,
            "[G] Guessed  [S] Skip  [R] Reveal  [L] Language  [C] Category",
            DIM_FG,
            Cell::BASE_BG,
        );
        self.put_str_centered(
            14,
            "[I] Install  [F10] Debug  [Q] Quit",
            DIM_FG,
            Cell::BASE_BG,
        );

        // Install banner
        if frame.install == InstallState::PromptAvailable && self.term_h > 16 {
            self.put_str_centered(
                16,
                " Install Dumb Charades: [I] install, [D] maybe later ",
                Color::White,
                BANNER_BG,
            );
        }

        // Status message
        if !frame.message.is_empty() && self.term_h > 17 {
            self.put_str_centered(self.term_h - 2, frame.message, TITLE_FG, Cell::BASE_BG);
        }

        // Debug overlay covers the middle of the screen
        if let Some(report) = frame.debug {
            self.draw_debug(report);
        }
    }

    fn draw_card(&mut self, x: usize, y: usize, w: usize, h: usize, ms: &MatchState) {
        for row in 0..h {
            for col in 0..w {
                self.put(x + col, y + row, ' ', CARD_FG, CARD_BG);
            }
        }
        let mid = y + h / 2;
        if ms.revealed {
            // Naive wrap: split the phrase when it overflows the card.
            let inner = w.saturating_sub(4);
            let phrase = ms.phrase;
            if phrase.chars().count() <= inner {
                self.put_str_centered_at(x, w, mid, phrase, CARD_FG, CARD_BG);
            } else {
                let (first, rest) = split_for_wrap(phrase, inner);
                self.put_str_centered_at(x, w, mid.saturating_sub(1), first, CARD_FG, CARD_BG);
                self.put_str_centered_at(x, w, mid, rest.trim_start(), CARD_FG, CARD_BG);
            }
        } else {
            self.put_str_centered_at(x, w, mid, "[R] to reveal the phrase", CARD_HINT, CARD_BG);
        }
    }

    fn draw_debug(&mut self, report: &DebugReport) {
        let rows = report.rows();
        let panel_w = (self.term_w - 2).min(52);
        let panel_h = rows.len() + 4;
        let x0 = (self.term_w - panel_w) / 2;
        let y0 = (self.term_h.saturating_sub(panel_h)) / 2;

        for row in 0..panel_h {
            for col in 0..panel_w {
                self.put(x0 + col, y0 + row, ' ', Color::White, PANEL_BG);
            }
        }
        self.put_str_centered_at(x0, panel_w, y0 + 1, "app diagnostics", TITLE_FG, PANEL_BG);
        for (i, (key, value)) in rows.iter().enumerate() {
            let line = format!("{key:>14}: {value}");
            self.put_str(x0 + 2, y0 + 2 + i, &line, Color::White, PANEL_BG);
        }
        self.put_str_centered_at(
            x0,
            panel_w,
            y0 + panel_h - 1,
            "[F5] reload  [U] unregister workers  [F10] close",
            DIM_FG,
            PANEL_BG,
        );
    }

    // ── Drawing primitives ──

    fn put(&mut self, x: usize, y: usize, ch: char, fg: Color, bg: Color) {
        if x < self.term_w && y < self.term_h {
            self.front[y * self.term_w + x] = Cell { ch, fg, bg };
        }
    }

    fn put_str(&mut self, x: usize, y: usize, s: &str, fg: Color, bg: Color) {
        for (i, ch) in s.chars().enumerate() {
            self.put(x + i, y, ch, fg, bg);
        }
    }

    fn put_str_centered(&mut self, y: usize, s: &str, fg: Color, bg: Color) {
        self.put_str_centered_at(0, self.term_w, y, s, fg, bg);
    }

    fn put_str_centered_at(
        &mut self,
        x0: usize,
        span: usize,
        y: usize,
        s: &str,
        fg: Color,
        bg: Color,
    ) {
        let len = s.chars().count();
        let x = x0 + span.saturating_sub(len) / 2;
        self.put_str(x, y, s, fg, bg);
    }

    // ── Diff + flush ──

    fn flush_diff(&mut self) -> io::Result<()> {
        let mut last_fg = None;
        let mut last_bg = None;
        let mut cursor_at: Option<(usize, usize)> = None;

        for y in 0..self.term_h {
            for x in 0..self.term_w {
                let idx = y * self.term_w + x;
                let cell = self.front[idx];
                if cell == self.back[idx] {
                    continue;
                }
                if cursor_at != Some((x, y)) {
                    queue!(self.writer, MoveTo(x as u16, y as u16))?;
                }
                if last_fg != Some(cell.fg) {
                    queue!(self.writer, SetForegroundColor(cell.fg))?;
                    last_fg = Some(cell.fg);
                }
                if last_bg != Some(cell.bg) {
                    queue!(self.writer, SetBackgroundColor(cell.bg))?;
                    last_bg = Some(cell.bg);
                }
                queue!(self.writer, Print(cell.ch))?;
                cursor_at = Some((x + 1, y));
            }
        }
        self.writer.flush()?;
        std::mem::swap(&mut self.front, &mut self.back);
        Ok(())
    }
}

/// Break `s` near the middle at a space so two card lines hold it.
fn split_for_wrap(s: &str, width: usize) -> (&str, &str) {
    let bytes_limit = s
        .char_indices()
        .nth(width)
        .map(|(i, _)| i)
        .unwrap_or(s.len());
    match s[..bytes_limit].rfind(' ') {
        Some(i) => (&s[..i], &s[i + 1..]),
        None => s.split_at(bytes_limit),
    }
}
