use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers, MouseEvent, MouseEventKind,
};
use crossterm::execute;
use ratatui::layout::{Constraint, Direction, Layout, Rect};
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::Paragraph;
use ratatui::{DefaultTerminal, Frame};
use tracing::{debug, info};

use crate::core::poller::Poller;
use crate::core::ranker::RankMetric;
use crate::core::snapshot::SystemSnapshot;
use crate::widgets::{
    DiskTableWidget,
    NetworkWidget,
    ProcessTableWidget,
    SummaryWidget,
    UsageWidget,
};

const NARROW_WIDTH: u16 = 80;
const TOP_TABLE_HEIGHT: u16 = 9;

pub struct App {
    pub summary_widget: SummaryWidget,
    pub network_widget: NetworkWidget,
    pub usage_widget: UsageWidget,
    pub disk_table_widget: DiskTableWidget,
    pub process_table_widgets: [ProcessTableWidget; 4],
    pub poller: Poller,
    pub has_snapshot: bool,
    pub exit: bool,
    pub last_tick: Instant,
    pub tick_rate: Duration,
    pub mouse_enabled: bool,
}

impl App {
    pub fn new(poller: Poller, refresh: Duration) -> Self {
        App {
            summary_widget: SummaryWidget::new(),
            network_widget: NetworkWidget::new(refresh),
            usage_widget: UsageWidget::new(),
            disk_table_widget: DiskTableWidget::new(),
            process_table_widgets: RankMetric::ALL.map(ProcessTableWidget::new),
            poller,
            has_snapshot: false,
            exit: false,
            last_tick: Instant::now(),
            tick_rate: Duration::from_millis(100),
            mouse_enabled: false,
        }
    }

    pub fn run(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        if let Ok(()) = execute!(std::io::stdout(), EnableMouseCapture) {
            self.mouse_enabled = true;
        }

        let result = self.run_loop(terminal);

        if self.mouse_enabled {
            let _ = execute!(std::io::stdout(), DisableMouseCapture);
        }

        self.poller.stop();
        info!("dashboard closed");
        result
    }

    fn run_loop(&mut self, terminal: &mut DefaultTerminal) -> io::Result<()> {
        while !self.exit {
            let timeout = self.tick_rate
                .checked_sub(self.last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_secs(0));

            if event::poll(timeout)? {
                self.handle_events()?;
            }

            if self.last_tick.elapsed() >= self.tick_rate {
                self.tick();
                self.last_tick = Instant::now();
            }

            terminal.draw(|frame| self.draw(frame))?;
        }
        Ok(())
    }

    fn tick(&mut self) {
        if let Some(snapshot) = self.poller.latest() {
            debug!(processes = snapshot.process_count, "snapshot received");
            self.apply_snapshot(&snapshot);
        }
    }

    pub fn apply_snapshot(&mut self, snapshot: &SystemSnapshot) {
        self.summary_widget.update(snapshot);
        self.network_widget.update(snapshot);
        self.usage_widget.update(snapshot);
        self.disk_table_widget.update(snapshot);
        for widget in &mut self.process_table_widgets {
            widget.update(snapshot);
        }
        self.has_snapshot = true;
    }

    fn draw(&mut self, frame: &mut Frame) {
        let area = frame.area();
        let narrow = area.width < NARROW_WIDTH;
        self.usage_widget.set_stacked(narrow);

        let (info_height, usage_height, tables_height) = if narrow {
            (14, 6, TOP_TABLE_HEIGHT * 2)
        } else {
            (7, 3, TOP_TABLE_HEIGHT)
        };

        let main_chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),             // Title
                Constraint::Length(info_height),   // System + Network
                Constraint::Length(usage_height),  // CPU + Memory
                Constraint::Min(4),                // Disks
                Constraint::Length(tables_height), // Top-N tables
                Constraint::Length(1),             // Status bar
            ])
            .split(area);

        let title = Paragraph::new(Line::from(Span::styled(
            " HOSTSTAT ",
            Style::default()
                .fg(Color::White)
                .bg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
        )));
        frame.render_widget(title, main_chunks[0]);

        if !self.has_snapshot {
            frame.render_widget(Paragraph::new("Collecting..."), main_chunks[1]);
            self.draw_status_bar(frame, main_chunks[5]);
            return;
        }

        let info_chunks = split_pair(main_chunks[1], narrow);
        frame.render_widget(&self.summary_widget, info_chunks[0]);
        frame.render_widget(&self.network_widget, info_chunks[1]);

        frame.render_widget(&self.usage_widget, main_chunks[2]);
        frame.render_widget(&self.disk_table_widget, main_chunks[3]);

        for (widget, cell) in self.process_table_widgets.iter().zip(top_table_cells(main_chunks[4], narrow)) {
            frame.render_widget(widget, cell);
        }

        self.draw_status_bar(frame, main_chunks[5]);
    }

    fn draw_status_bar(&self, frame: &mut Frame, area: Rect) {
        let key_style = Style::default().fg(Color::Green);
        let status_text = vec![
            Span::styled("↑↓/jk", key_style),
            Span::raw(": Scroll disks "),
            Span::styled("PgUp/PgDn", key_style),
            Span::raw(": Page "),
            Span::styled("q", key_style),
            Span::raw(": Quit"),
        ];
        frame.render_widget(Paragraph::new(Line::from(status_text)), area);
    }

    fn handle_events(&mut self) -> io::Result<()> {
        match event::read()? {
            Event::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                self.handle_key_event(key_event)
            }
            Event::Mouse(mouse_event) => {
                self.handle_mouse_event(mouse_event)
            }
            // Resize needs nothing: layout comes from the frame area on every draw
            _ => {}
        };
        Ok(())
    }

    pub fn handle_key_event(&mut self, key_event: KeyEvent) {
        match key_event.code {
            KeyCode::Char('q') | KeyCode::Esc => self.exit(),
            KeyCode::Char('c') if key_event.modifiers.contains(KeyModifiers::CONTROL) => self.exit(),
            KeyCode::Up | KeyCode::Char('k') => self.disk_table_widget.scroll_up(1),
            KeyCode::Down | KeyCode::Char('j') => self.disk_table_widget.scroll_down(1),
            KeyCode::PageUp => self.disk_table_widget.scroll_up(10),
            KeyCode::PageDown => self.disk_table_widget.scroll_down(10),
            KeyCode::Home => self.disk_table_widget.scroll_to_top(),
            KeyCode::End => self.disk_table_widget.scroll_to_bottom(),
            _ => {}
        }
    }

    fn handle_mouse_event(&mut self, mouse_event: MouseEvent) {
        if !self.mouse_enabled {
            return;
        }

        match mouse_event.kind {
            MouseEventKind::ScrollUp => self.disk_table_widget.scroll_up(3),
            MouseEventKind::ScrollDown => self.disk_table_widget.scroll_down(3),
            _ => {}
        }
    }

    fn exit(&mut self) {
        self.exit = true
    }
}

fn split_pair(area: Rect, stacked: bool) -> Vec<Rect> {
    let direction = if stacked {
        Direction::Vertical
    } else {
        Direction::Horizontal
    };
    Layout::default()
        .direction(direction)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(area)
        .to_vec()
}

/// One row of four tables, or a 2x2 grid on narrow terminals.
fn top_table_cells(area: Rect, narrow: bool) -> Vec<Rect> {
    if !narrow {
        return Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Ratio(1, 4); 4])
            .split(area)
            .to_vec();
    }

    split_pair(area, true)
        .into_iter()
        .flat_map(|row| split_pair(row, false))
        .collect()
}
