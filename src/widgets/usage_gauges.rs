use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, BorderType, Gauge, Widget},
};

use crate::core::snapshot::{MemoryInfo, SystemSnapshot};
use crate::core::utils::format_bytes;

/// CPU and memory utilization bars.
#[derive(Default)]
pub struct UsageWidget {
    cpu_percent: f64,
    memory: MemoryInfo,
    stacked: bool,
}

impl UsageWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, snapshot: &SystemSnapshot) {
        self.cpu_percent = snapshot.cpu_percent;
        self.memory = snapshot.memory.clone();
    }

    pub fn set_stacked(&mut self, stacked: bool) {
        self.stacked = stacked;
    }
}

fn gauge<'a>(title: &'a str, ratio: f64, label: String) -> Gauge<'a> {
    Gauge::default()
        .block(
            Block::bordered()
                .title(title)
                .title_style(Style::new().bold().fg(Color::Cyan))
                .border_type(BorderType::Rounded)
                .border_style(Style::new().fg(Color::Blue))
        )
        .gauge_style(Style::new().fg(Color::Magenta).bg(Color::Black))
        .ratio(ratio.clamp(0.0, 1.0))
        .label(label)
}

impl Widget for &UsageWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let direction = if self.stacked {
            Direction::Vertical
        } else {
            Direction::Horizontal
        };
        let chunks = Layout::default()
            .direction(direction)
            .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
            .split(area);

        gauge(
            "CPU Usage",
            self.cpu_percent / 100.0,
            format!("{:.2}%", self.cpu_percent),
        )
        .render(chunks[0], buf);

        gauge(
            "Memory",
            self.memory.used_ratio(),
            format!("{} / {}", format_bytes(self.memory.used), format_bytes(self.memory.total)),
        )
        .render(chunks[1], buf);
    }
}
