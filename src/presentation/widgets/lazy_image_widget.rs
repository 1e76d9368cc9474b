//! Terminal rendering of a lazy image snapshot.

use image::{DynamicImage, GenericImageView};
use ratatui::{
    buffer::Buffer,
    layout::{Alignment, Rect},
    style::{Color, Style},
    widgets::{Block, Paragraph, Widget, Wrap},
};

use crate::domain::entities::ImageStatus;
use crate::presentation::lazy_image::ImageView;

const UPPER_HALF: &str = "▀";

/// Draws a loaded image with half-block cells, or a framed label while the
/// placeholder or error visual is displayed.
#[derive(Debug, Clone)]
pub struct LazyImageWidget<'a> {
    view: &'a ImageView,
    border_style: Style,
    error_style: Style,
}

impl<'a> LazyImageWidget<'a> {
    /// Creates a widget for `view`.
    #[must_use]
    pub fn new(view: &'a ImageView) -> Self {
        Self {
            view,
            border_style: Style::default().fg(Color::DarkGray),
            error_style: Style::default().fg(Color::Red),
        }
    }

    /// Sets the frame style.
    #[must_use]
    pub const fn border_style(mut self, style: Style) -> Self {
        self.border_style = style;
        self
    }

    /// Sets the label style used after a failure.
    #[must_use]
    pub const fn error_style(mut self, style: Style) -> Self {
        self.error_style = style;
        self
    }

    fn label(&self) -> String {
        let alt = self.view.attributes.alt.as_deref();
        match &self.view.status {
            ImageStatus::Failed(_) => alt.map_or_else(|| "failed".to_string(), |a| format!("{a} (failed)")),
            ImageStatus::Loading => alt.map_or_else(|| "loading".to_string(), |a| format!("{a} (loading)")),
            _ => alt.unwrap_or("image").to_string(),
        }
    }

    fn render_frame(&self, area: Rect, buf: &mut Buffer) {
        let style = if self.view.status.is_failed() {
            self.error_style
        } else {
            self.border_style
        };
        Paragraph::new(self.label())
            .style(style)
            .alignment(Alignment::Center)
            .wrap(Wrap { trim: true })
            .block(Block::bordered().border_style(self.border_style))
            .render(area, buf);
    }
}

impl Widget for &LazyImageWidget<'_> {
    fn render(self, area: Rect, buf: &mut Buffer) {
        if area.is_empty() {
            return;
        }
        match (&self.view.status, &self.view.image) {
            (ImageStatus::Ready, Some(image)) => render_half_blocks(image, area, buf),
            _ => self.render_frame(area, buf),
        }
    }
}

/// Nearest-neighbour scale into `area`, two pixel rows per cell.
fn render_half_blocks(image: &DynamicImage, area: Rect, buf: &mut Buffer) {
    let (width, height) = image.dimensions();
    if width == 0 || height == 0 {
        return;
    }
    let rows = u32::from(area.height) * 2;
    let cols = u32::from(area.width);

    for cy in 0..area.height {
        for cx in 0..area.width {
            let x = u32::from(cx) * width / cols;
            let top_y = u32::from(cy) * 2 * height / rows;
            let bottom_y = (u32::from(cy) * 2 + 1) * height / rows;
            let top = pixel_color(image, x, top_y);
            let bottom = pixel_color(image, x, bottom_y);

            if let Some(cell) = buf.cell_mut((area.x + cx, area.y + cy)) {
                cell.set_symbol(UPPER_HALF).set_fg(top).set_bg(bottom);
            }
        }
    }
}

fn pixel_color(image: &DynamicImage, x: u32, y: u32) -> Color {
    let [r, g, b, _] = image.get_pixel(x, y).0;
    Color::Rgb(r, g, b)
}
