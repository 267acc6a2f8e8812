use tui::layout::{Constraint, Layout, Rect, Size};
pub const TAB_BAR_HEIGHT: u16 = 3;
pub const STATUS_HEIGHT: u16 = 1;
pub const LOG_HEIGHT: u16 = 8;

/// Pre-computed layout areas for the main draw loop.
pub struct LayoutAreas {
    pub tab_bar: [Rect; 2],
    pub main: Rect,
    pub logs: Option<Rect>,
    pub status: Rect,
}

impl LayoutAreas {
    pub fn new(size: Size) -> Self {
        let rect = Rect::new(0, 0, size.width, size.height);
        Self::from_rect(rect, false, false)
    }

    pub fn update(&mut self, area: Rect, full_screen: bool, show_logs: bool) {
        *self = Self::from_rect(area, full_screen, show_logs);
    }

    fn from_rect(area: Rect, full_screen: bool, show_logs: bool) -> Self {
        let log_height = if show_logs { LOG_HEIGHT } else { 0 };

        if full_screen {
            let [main, logs, status] = Layout::vertical([
                Constraint::Fill(1),
                Constraint::Length(log_height),
                Constraint::Length(STATUS_HEIGHT),
            ])
            .areas(area);
            return LayoutAreas {
                tab_bar: [Rect::ZERO, Rect::ZERO],
                main,
                logs: show_logs.then_some(logs),
                status,
            };
        }

        let [tab, main, logs, status] = Layout::vertical([
            Constraint::Length(TAB_BAR_HEIGHT),
            Constraint::Fill(1),
            Constraint::Length(log_height),
            Constraint::Length(STATUS_HEIGHT),
        ])
        .areas(area);

        LayoutAreas {
            tab_bar: Self::split_tab_bar(tab),
            main,
            logs: show_logs.then_some(logs),
            status,
        }
    }

    fn split_tab_bar(area: Rect) -> [Rect; 2] {
        Layout::horizontal([Constraint::Percentage(85), Constraint::Percentage(15)]).areas(area)
    }

    /// Grid of four equal panes, one per group, in A B / C D order.
    pub fn group_grid(area: Rect) -> [Rect; 4] {
        let [top, bottom] = Layout::vertical([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(area);
        let [a, b] = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(top);
        let [c, d] = Layout::horizontal([Constraint::Percentage(50), Constraint::Percentage(50)]).areas(bottom);
        [a, b, c, d]
    }

    /// A box of at most `width` x `height` centred in `area`.
    pub fn centered(area: Rect, width: u16, height: u16) -> Rect {
        let width = width.min(area.width);
        let height = height.min(area.height);
        Rect::new(
            area.x + (area.width - width) / 2,
            area.y + (area.height - height) / 2,
            width,
            height,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn logs_take_space_only_when_shown() {
        let area = Rect::new(0, 0, 80, 30);
        let mut layout = LayoutAreas::new(Size::new(80, 30));
        assert!(layout.logs.is_none());
        assert_eq!(layout.main.height, 30 - TAB_BAR_HEIGHT - STATUS_HEIGHT);

        layout.update(area, false, true);
        assert_eq!(layout.logs.map(|r| r.height), Some(LOG_HEIGHT));
        assert_eq!(layout.status.y, 29);
    }

    #[test]
    fn grid_and_centering_stay_inside_the_area() {
        let area = Rect::new(0, 0, 80, 24);
        let [a, _, _, d] = LayoutAreas::group_grid(area);
        assert_eq!((a.x, a.y), (0, 0));
        assert_eq!((d.x, d.y), (40, 12));

        let popup = LayoutAreas::centered(area, 100, 8);
        assert_eq!((popup.x, popup.y, popup.width, popup.height), (0, 8, 80, 8));
    }
}
