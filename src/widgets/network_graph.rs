use std::cmp;
use std::time::Duration;

use ratatui::{
    buffer::Buffer,
    layout::Rect,
    style::{Color, Style, Stylize},
    symbols,
    text::{Line, Span},
    widgets::{Block, BorderType, Paragraph, Sparkline, Widget},
};

use crate::core::snapshot::SystemSnapshot;
use crate::core::utils::{format_bytes, format_rate};

const DEFAULT_HISTORY_POINTS: usize = 40;

/// Bandwidth derived from consecutive cumulative sent+received totals.
#[derive(Debug, Clone)]
pub struct BandwidthHistory {
    points: Vec<u64>,
    max_points: usize,
    last_total: Option<u64>,
    interval_secs: f64,
}

impl BandwidthHistory {
    pub fn new(max_points: usize, interval: Duration) -> Self {
        let secs = interval.as_secs_f64();
        Self {
            points: vec![0; max_points],
            max_points,
            last_total: None,
            interval_secs: if secs > 0.0 { secs } else { 1.0 },
        }
    }

    /// Records one snapshot's cumulative total. Returns the bandwidth in bytes/s.
    pub fn push_total(&mut self, total: u64) -> u64 {
        let rate = match self.last_total {
            Some(previous) if previous > 0 && total >= previous => {
                ((total - previous) as f64 / self.interval_secs) as u64
            }
            _ => 0,
        };
        self.last_total = Some(total);

        self.points.push(rate);
        if self.points.len() > self.max_points {
            let excess = self.points.len() - self.max_points;
            self.points.drain(..excess);
        }
        rate
    }

    pub fn current(&self) -> u64 {
        self.points.last().copied().unwrap_or(0)
    }

    pub fn points(&self) -> &[u64] {
        &self.points
    }

    fn max_value(&self) -> u64 {
        self.points.iter().fold(0, |max, &val| cmp::max(max, val))
    }
}

pub struct NetworkWidget {
    history: BandwidthHistory,
    total_sent: u64,
    total_recv: u64,
}

impl NetworkWidget {
    pub fn new(refresh: Duration) -> Self {
        Self {
            history: BandwidthHistory::new(DEFAULT_HISTORY_POINTS, refresh),
            total_sent: 0,
            total_recv: 0,
        }
    }

    pub fn update(&mut self, snapshot: &SystemSnapshot) {
        self.total_sent = snapshot.net_sent;
        self.total_recv = snapshot.net_recv;
        self.history.push_total(snapshot.net_total());
    }
}

impl Widget for &NetworkWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let block = Block::bordered()
            .title("Network Activity")
            .title_style(Style::new().bold().fg(Color::Cyan))
            .border_type(BorderType::Rounded)
            .border_style(Style::new().fg(Color::Blue));

        let inner_area = block.inner(area);
        block.render(area, buf);

        if inner_area.width < 1 || inner_area.height < 1 {
            return;
        }

        let value_style = Style::default().fg(Color::Green).bold();
        let text = vec![
            Line::from(vec![
                Span::raw("Total Sent:   "),
                Span::styled(format_bytes(self.total_sent), value_style),
            ]),
            Line::from(vec![
                Span::raw("Total Recv:   "),
                Span::styled(format_bytes(self.total_recv), value_style),
            ]),
            Line::from(vec![
                Span::raw("Current Rate: "),
                Span::styled(format_rate(self.history.current()), value_style),
            ]),
        ];
        let text_height = cmp::min(text.len() as u16, inner_area.height);
        let text_area = Rect { height: text_height, ..inner_area };
        Paragraph::new(text).render(text_area, buf);

        let sparkline_area = Rect {
            x: inner_area.x,
            y: inner_area.y + text_height,
            width: inner_area.width,
            height: inner_area.height - text_height,
        };
        if sparkline_area.height == 0 {
            return;
        }

        let points = self.history.points();
        let available_points = sparkline_area.width as usize;
        let data_slice: Vec<u64> = points
            .iter()
            .skip(points.len().saturating_sub(available_points))
            .cloned()
            .collect();

        let sparkline = Sparkline::default()
            .data(&data_slice)
            .max(cmp::max(self.history.max_value(), 1))
            .style(Style::default().fg(Color::Cyan))
            .bar_set(symbols::bar::NINE_LEVELS);

        sparkline.render(sparkline_area, buf);
    }
}
