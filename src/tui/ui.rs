use ratatui::{
    prelude::*,
    widgets::{Block, List, ListItem, Paragraph},
};

use super::app::App;

/// Render the two-panel view: ball positions on a vertical scale on top,
/// the animation queue below, one status line at the bottom.
pub fn render_ui(f: &mut Frame, app: &App) {
    let snapshot = app.snapshot();

    let chunks = Layout::vertical([
        Constraint::Percentage(60),
        Constraint::Min(4),
        Constraint::Length(1),
    ])
    .split(f.area());

    // Positions panel
    let positions_block = Block::bordered().title("Ball Positions");
    let inner = positions_block.inner(chunks[0]);
    f.render_widget(positions_block, chunks[0]);

    if inner.height > 0 && inner.width > 0 {
        let rows = inner.height as usize;
        let cols = inner.width as usize;
        let mut grid = vec![vec![' '; cols]; rows];

        for (index, &position) in snapshot.positions.iter().enumerate() {
            let col = index * 2;
            if col >= cols {
                break;
            }
            let clamped = position.clamp(0.0, 1.0);
            let row = ((1.0 - clamped) * (rows.saturating_sub(1)) as f64).round() as usize;
            grid[row.min(rows - 1)][col] = 'O';
        }

        let lines: Vec<Line> = grid
            .into_iter()
            .map(|row| Line::from(row.into_iter().collect::<String>()))
            .collect();
        f.render_widget(Paragraph::new(lines), inner);
    }

    // Queue panel
    let items: Vec<ListItem> = snapshot
        .queue
        .iter()
        .enumerate()
        .map(|(index, detail)| {
            let item = ListItem::new(detail.clone());
            if index == 0 {
                item.style(Style::default().fg(Color::Cyan).bold())
            } else {
                item
            }
        })
        .collect();
    let queue = List::new(items).block(Block::bordered().title("Animation Queue"));
    f.render_widget(queue, chunks[1]);

    // Status line
    let status_line = if let Some(error) = &app.error {
        Line::styled(
            format!("error: {error}  (c to clear)"),
            Style::default().fg(Color::Red),
        )
    } else {
        Line::from(format!(
            "frames {} | skipped {} | {} | q quit, p pause, d delete head",
            snapshot.frames_sent,
            snapshot.frames_skipped,
            if snapshot.paused { "paused" } else { "running" }
        ))
    };
    f.render_widget(Paragraph::new(status_line), chunks[2]);
}
