use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style, Stylize},
    text::{Line, Span, Text},
    widgets::{Block, BorderType, Paragraph, Widget},
};

use crate::core::snapshot::{HostInfo, SystemSnapshot};
use crate::core::utils::format_uptime;

#[derive(Default)]
pub struct SummaryWidget {
    host: HostInfo,
    process_count: usize,
}

impl SummaryWidget {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn update(&mut self, snapshot: &SystemSnapshot) {
        self.host = snapshot.host.clone();
        self.process_count = snapshot.process_count;
    }
}

fn labelled<'a>(label: &'a str, value: String) -> Line<'a> {
    Line::from(vec![
        Span::styled(format!("{:<11}", label), Style::default().fg(Color::Gray)),
        Span::styled(value, Style::default().fg(Color::Green).bold()),
    ])
}

impl Widget for &SummaryWidget {
    fn render(self, area: Rect, buf: &mut Buffer) {
        let text = Text::from(vec![
            labelled("Hostname:", self.host.hostname.clone()),
            labelled("OS:", self.host.os.clone()),
            labelled("Platform:", self.host.platform.clone()),
            labelled("Uptime:", format_uptime(self.host.uptime_secs)),
            labelled("Processes:", self.process_count.to_string()),
        ]);

        let paragraph = Paragraph::new(text)
            .block(
                Block::bordered()
                    .title("System")
                    .title_style(Style::new().bold().fg(Color::Cyan))
                    .border_type(BorderType::Rounded)
                    .border_style(Style::new().fg(Color::Blue))
            )
            .alignment(Alignment::Left);

        paragraph.render(area, buf);
    }
}
