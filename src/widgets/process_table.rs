use ratatui::{
    buffer::Buffer,
    layout::{Constraint, Rect},
    style::{Color, Style, Stylize},
    widgets::{Block, BorderType, Cell, Row, Table, Widget},
};

use crate::core::process::ProcessSample;
use crate::core::ranker::RankMetric;
use crate::core::snapshot::SystemSnapshot;
use crate::core::utils::{format_bytes, format_rate};

const NAME_WIDTH: usize = 18;

/// One ranked Top-N view.
pub struct ProcessTableWidget {
    metric: RankMetric,
    rows: Vec<ProcessSample>,
}

impl ProcessTableWidget {
    pub fn new(metric: RankMetric) -> Self {
        Self {
            metric,
            rows: Vec::new(),
        }
    }

    pub fn update(&mut self, snapshot: &SystemSnapshot) {
        let rows = match self.metric {
            RankMetric::Cpu => &snapshot.top_cpu,
            RankMetric::Memory => &snapshot.top_memory,
            RankMetric::DiskRate => &snapshot.top_disk,
            RankMetric::Connections => &snapshot.top_net,
        };
        self.rows = rows.clone();
    }
}

pub fn metric_value(metric: RankMetric, sample: &ProcessSample) -> String {
    match metric {
        RankMetric::Cpu => format!("{:.1}%", sample.cpu_percent),
        RankMetric::Memory => format_bytes(sample.resident_memory_bytes),
        RankMetric::DiskRate => format_rate(sample.disk_rate_bytes_per_sec),
        RankMetric::Connections => sample.net_connection_count.to_string(),
    }
}

impl Widget for &ProcessTableWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let rows: Vec<Row> = self.rows.iter().map(|sample| {
            Row::new(vec![
                Cell::from(sample.pid.to_string()).style(Style::new().fg(Color::Green)),
                Cell::from(sample.short_name(NAME_WIDTH)),
                Cell::from(metric_value(self.metric, sample)),
            ])
        }).collect();

        let widths = [
            Constraint::Length(7),   // PID
            Constraint::Min(10),     // Name
            Constraint::Length(11),  // Value
        ];

        let table = Table::new(rows, widths)
            .header(
                Row::new(vec!["PID", "Name", "Value"])
                    .style(Style::new().bold().fg(Color::White))
                    .bottom_margin(1)
            )
            .block(
                Block::bordered()
                    .title(self.metric.as_str())
                    .title_style(Style::new().bold().fg(Color::Cyan))
                    .border_type(BorderType::Plain)
                    .border_style(Style::new().fg(Color::Blue))
            );

        table.render(area, buf);
    }
}
