use std::cell::Cell as StdCell;

use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Constraint, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, BorderType, Cell, Paragraph, Row, Table, Widget},
};

use crate::core::snapshot::{DiskInfo, SystemSnapshot};
use crate::core::utils::format_bytes;

pub struct DiskTableWidget {
    disks: Vec<DiskInfo>,
    scroll_offset: usize,
    visible_rows: StdCell<usize>,
}

impl DiskTableWidget {
    pub fn new() -> Self {
        Self {
            disks: Vec::new(),
            scroll_offset: 0,
            visible_rows: StdCell::new(1),
        }
    }

    pub fn update(&mut self, snapshot: &SystemSnapshot) {
        self.disks = snapshot.disks.clone();
        self.scroll_offset = self.scroll_offset.min(self.max_scroll());
    }

    fn max_scroll(&self) -> usize {
        self.disks.len().saturating_sub(self.visible_rows.get())
    }

    pub fn scroll_up(&mut self, amount: usize) {
        self.scroll_offset = self.scroll_offset.saturating_sub(amount);
    }

    pub fn scroll_down(&mut self, amount: usize) {
        self.scroll_offset = (self.scroll_offset + amount).min(self.max_scroll());
    }

    pub fn scroll_to_top(&mut self) {
        self.scroll_offset = 0;
    }

    pub fn scroll_to_bottom(&mut self) {
        self.scroll_offset = self.max_scroll();
    }

    pub fn scroll_offset(&self) -> usize {
        self.scroll_offset
    }
}

impl Default for DiskTableWidget {
    fn default() -> Self {
        Self::new()
    }
}

impl Widget for &DiskTableWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title("Disks")
            .title_style(Style::new().bold().fg(Color::Cyan))
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Color::Blue));

        if self.disks.is_empty() {
            Paragraph::new("No disks found")
                .block(block)
                .alignment(Alignment::Center)
                .render(area, buf);
            return;
        }

        let content_height = area.height.saturating_sub(4);
        let visible_rows = (content_height as usize).max(1);
        self.visible_rows.set(visible_rows);

        let total_rows = self.disks.len();
        let start_idx = self.scroll_offset.min(total_rows);
        let end_idx = (start_idx + visible_rows).min(total_rows);

        let rows: Vec<Row> = self.disks[start_idx..end_idx].iter().map(|disk| {
            let usage_style = if disk.used_percent >= 90.0 {
                Style::new().fg(Color::Red)
            } else if disk.used_percent >= 75.0 {
                Style::new().fg(Color::Yellow)
            } else {
                Style::new().fg(Color::Green)
            };

            Row::new(vec![
                Cell::from(disk.path.to_string_lossy().into_owned()),
                Cell::from(format!("{:.1}%", disk.used_percent)).style(usage_style),
                Cell::from(format_bytes(disk.used)),
                Cell::from(format_bytes(disk.total)),
                Cell::from(format_bytes(disk.free)),
            ])
        }).collect();

        let widths = [
            Constraint::Percentage(40),  // Mount
            Constraint::Percentage(12),  // Usage
            Constraint::Percentage(16),  // Used
            Constraint::Percentage(16),  // Total
            Constraint::Percentage(16),  // Free
        ];

        let table = Table::new(rows, widths)
            .header(
                Row::new(vec!["Mount", "Usage", "Used", "Total", "Free"])
                    .style(Style::new().bold().fg(Color::White))
                    .bottom_margin(1)
            )
            .block(block);

        table.render(area, buf);
    }
}
