//! Vertical letter index beside the city list: paints a fixed ribbon of labels
//! and reports the label under the pointer while it is dragged.

use std::rc::Rc;

use log::trace;

/// Four category tags followed by `A`..=`Z`, top to bottom.
pub const LABELS: [&str; 30] = [
    "定位", "最近", "热门", "全部", "A", "B", "C", "D", "E", "F", "G", "H", "I", "J", "K", "L",
    "M", "N", "O", "P", "Q", "R", "S", "T", "U", "V", "W", "X", "Y", "Z",
];

pub const LABEL_COUNT: usize = LABELS.len();

/// Dim layer painted while the strip is pressed.
pub const PRESSED_BACKGROUND: Argb = Argb(0x4000_0000);
pub const LABEL_COLOR: Argb = Argb(0xFF8C_8C8C);
pub const LABEL_TEXT_SIZE: f32 = 26.0;

/// Packed `0xAARRGGBB` colour.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Argb(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rect {
    pub left: i32,
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
}

/// Text attributes for a single draw call; text is centred on its x.
#[derive(Debug, Clone, PartialEq)]
pub struct TextPaint {
    pub color: Argb,
    pub text_size: f32,
    pub anti_alias: bool,
}

impl TextPaint {
    fn label() -> Self {
        Self {
            color: LABEL_COLOR,
            text_size: LABEL_TEXT_SIZE,
            anti_alias: true,
        }
    }
}

/// The view the strip is mounted in.
pub trait StripHost {
    fn measured_width(&self) -> i32;
    fn measured_height(&self) -> i32;
    /// Schedules a repaint.
    fn invalidate(&mut self);
}

pub trait StripCanvas {
    fn draw_rect(&mut self, rect: Rect, color: Argb);
    /// Draws `text` horizontally centred on `x` with its baseline at `baseline_y`.
    fn draw_text(&mut self, text: &str, x: f32, baseline_y: f32, paint: &TextPaint);
}

/// Receives the label under the pointer each time a new cell is entered.
pub trait TouchingLetterListener {
    fn on_touching_letter_changed(&self, label: &str);
}

impl<F> TouchingLetterListener for F
where
    F: Fn(&str),
{
    fn on_touching_letter_changed(&self, label: &str) {
        self(label)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointerPhase {
    Down,
    Move,
    Up,
}

/// A pointer sample in view-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointerEvent {
    pub phase: PointerPhase,
    pub y: f32,
}

impl PointerEvent {
    pub fn new(phase: PointerPhase, y: f32) -> Self {
        Self { phase, y }
    }
}

#[derive(Default)]
pub struct IndexStrip {
    /// Index of the last notified cell during the current gesture.
    choose: Option<usize>,
    show_background: bool,
    listener: Option<Rc<dyn TouchingLetterListener>>,
}

impl IndexStrip {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replaces the listener; `None` clears it.
    pub fn set_listener(&mut self, listener: Option<Rc<dyn TouchingLetterListener>>) {
        self.listener = listener;
    }

    pub fn paint(&self, host: &impl StripHost, canvas: &mut impl StripCanvas) {
        let width = host.measured_width();
        let height = host.measured_height();
        if width <= 0 || height <= 0 {
            return;
        }

        if self.show_background {
            canvas.draw_rect(
                Rect {
                    left: 0,
                    top: 0,
                    right: width,
                    bottom: height,
                },
                PRESSED_BACKGROUND,
            );
        }

        // Remainder pixels stay below the last label.
        let cell_height = height / LABEL_COUNT as i32;
        let x = (width / 2) as f32;
        for (index, label) in LABELS.iter().enumerate() {
            let paint = TextPaint::label();
            let baseline = (cell_height * (index as i32 + 1)) as f32;
            canvas.draw_text(label, x, baseline, &paint);
        }
    }

    /// Feeds one pointer sample through the selection state machine.
    ///
    /// Always reports the event as handled.
    pub fn on_pointer_event(&mut self, host: &mut impl StripHost, event: PointerEvent) -> bool {
        let old_choose = self.choose;
        let listener = self.listener.clone();
        let cell = cell_at(event.y, host.measured_height());

        match event.phase {
            PointerPhase::Down => {
                self.show_background = true;
                self.enter_cell(host, cell, old_choose, listener);
            }
            PointerPhase::Move => {
                self.enter_cell(host, cell, old_choose, listener);
            }
            PointerPhase::Up => {
                self.show_background = false;
                self.choose = None;
                host.invalidate();
            }
        }
        true
    }

    fn enter_cell(
        &mut self,
        host: &mut impl StripHost,
        cell: Option<usize>,
        old_choose: Option<usize>,
        listener: Option<Rc<dyn TouchingLetterListener>>,
    ) {
        let (Some(cell), Some(listener)) = (cell, listener) else {
            return;
        };
        if old_choose == Some(cell) {
            return;
        }
        trace!("Index strip entered cell {} ({})", cell, LABELS[cell]);
        listener.on_touching_letter_changed(LABELS[cell]);
        self.choose = Some(cell);
        host.invalidate();
    }
}

/// Maps a view-local y to a cell, or `None` outside `[0, height)` or for an empty view.
pub fn cell_at(y: f32, height: i32) -> Option<usize> {
    if height <= 0 {
        return None;
    }
    let cell = (y / height as f32 * LABEL_COUNT as f32).floor();
    if cell >= 0.0 && cell < LABEL_COUNT as f32 {
        Some(cell as usize)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use std::{cell::RefCell, rc::Rc};

    use super::{
        cell_at, Argb, IndexStrip, PointerEvent, PointerPhase, Rect, StripCanvas, StripHost,
        TextPaint, TouchingLetterListener, LABELS, LABEL_COLOR, PRESSED_BACKGROUND,
    };

    struct TestHost {
        width: i32,
        height: i32,
        invalidations: usize,
    }

    impl TestHost {
        fn new(width: i32, height: i32) -> Self {
            Self {
                width,
                height,
                invalidations: 0,
            }
        }
    }

    impl StripHost for TestHost {
        fn measured_width(&self) -> i32 {
            self.width
        }

        fn measured_height(&self) -> i32 {
            self.height
        }

        fn invalidate(&mut self) {
            self.invalidations += 1;
        }
    }

    #[derive(Default)]
    struct TestCanvas {
        rects: Vec<(Rect, Argb)>,
        texts: Vec<(String, f32, f32, TextPaint)>,
    }

    impl StripCanvas for TestCanvas {
        fn draw_rect(&mut self, rect: Rect, color: Argb) {
            self.rects.push((rect, color));
        }

        fn draw_text(&mut self, text: &str, x: f32, baseline_y: f32, paint: &TextPaint) {
            self.texts.push((text.to_string(), x, baseline_y, paint.clone()));
        }
    }

    fn recording_strip() -> (IndexStrip, Rc<RefCell<Vec<String>>>) {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        let listener: Rc<dyn TouchingLetterListener> =
            Rc::new(move |label: &str| sink.borrow_mut().push(label.to_string()));
        let mut strip = IndexStrip::new();
        strip.set_listener(Some(listener));
        (strip, seen)
    }

    fn send(strip: &mut IndexStrip, host: &mut TestHost, phase: PointerPhase, y: f32) -> bool {
        strip.on_pointer_event(host, PointerEvent::new(phase, y))
    }

    #[test]
    fn test_labels_are_categories_then_alphabet() {
        assert_eq!(LABELS.len(), 30);
        assert_eq!(&LABELS[..4], &["定位", "最近", "热门", "全部"]);
        let letters: String = LABELS[4..].concat();
        assert_eq!(letters, "ABCDEFGHIJKLMNOPQRSTUVWXYZ");
        let strip = IndexStrip::new();
        assert_eq!(strip.choose, None);
        assert!(!strip.show_background);
    }

    #[test]
    fn test_cell_at_floors_and_rejects_out_of_range() {
        assert_eq!(cell_at(5.0, 600), Some(0));
        assert_eq!(cell_at(19.9, 600), Some(0));
        assert_eq!(cell_at(20.0, 600), Some(1));
        assert_eq!(cell_at(599.9, 600), Some(29));
        assert_eq!(cell_at(600.0, 600), None);
        assert_eq!(cell_at(-0.5, 600), None);
        assert_eq!(cell_at(f32::NAN, 600), None);
        assert_eq!(cell_at(10.0, 0), None);
    }

    #[test]
    fn test_down_then_move_across_cells_notifies_each_new_cell() {
        let (mut strip, seen) = recording_strip();
        let mut host = TestHost::new(40, 600);

        assert!(send(&mut strip, &mut host, PointerPhase::Down, 5.0));
        assert_eq!(*seen.borrow(), vec!["定位"]);
        assert_eq!(strip.choose, Some(0));
        assert!(strip.show_background);

        send(&mut strip, &mut host, PointerPhase::Move, 25.0);
        assert_eq!(strip.choose, Some(1));
        send(&mut strip, &mut host, PointerPhase::Move, 26.0);
        assert_eq!(seen.borrow().len(), 2);

        // 100 / 600 * 30 = 5.0, the sixth cell.
        send(&mut strip, &mut host, PointerPhase::Move, 100.0);
        assert_eq!(strip.choose, Some(5));
        send(&mut strip, &mut host, PointerPhase::Move, 80.0);
        assert_eq!(strip.choose, Some(4));

        assert!(send(&mut strip, &mut host, PointerPhase::Up, 80.0));
        assert_eq!(*seen.borrow(), vec!["定位", "最近", "B", "A"]);
        assert_eq!(strip.choose, None);
        assert!(!strip.show_background);
        assert_eq!(host.invalidations, 5);
    }

    #[test]
    fn test_out_of_range_drag_keeps_choice_and_skips_notification() {
        let (mut strip, seen) = recording_strip();
        let mut host = TestHost::new(40, 600);

        send(&mut strip, &mut host, PointerPhase::Down, 10.0);
        send(&mut strip, &mut host, PointerPhase::Move, 700.0);
        assert_eq!(strip.choose, Some(0));
        send(&mut strip, &mut host, PointerPhase::Move, -30.0);
        assert_eq!(strip.choose, Some(0));
        send(&mut strip, &mut host, PointerPhase::Move, 50.0);

        assert_eq!(*seen.borrow(), vec!["定位", "热门"]);
        assert_eq!(strip.choose, Some(2));
    }

    #[test]
    fn test_without_listener_state_still_tracks_pointer() {
        let mut strip = IndexStrip::new();
        let mut host = TestHost::new(40, 600);

        assert!(send(&mut strip, &mut host, PointerPhase::Down, 10.0));
        assert!(strip.show_background);
        assert_eq!(strip.choose, None);
        assert!(send(&mut strip, &mut host, PointerPhase::Move, 300.0));
        assert_eq!(strip.choose, None);
        assert!(send(&mut strip, &mut host, PointerPhase::Up, 300.0));
        assert!(!strip.show_background);
        assert_eq!(host.invalidations, 1);
    }

    #[test]
    fn test_repeated_down_on_same_cell_notifies_again() {
        let (mut strip, seen) = recording_strip();
        let mut host = TestHost::new(40, 600);

        send(&mut strip, &mut host, PointerPhase::Down, 10.0);
        send(&mut strip, &mut host, PointerPhase::Up, 10.0);
        send(&mut strip, &mut host, PointerPhase::Down, 12.0);

        assert_eq!(*seen.borrow(), vec!["定位", "定位"]);
    }

    #[test]
    fn test_cleared_listener_stops_notifications_mid_gesture() {
        let (mut strip, seen) = recording_strip();
        let mut host = TestHost::new(40, 600);

        send(&mut strip, &mut host, PointerPhase::Down, 10.0);
        strip.set_listener(None);
        send(&mut strip, &mut host, PointerPhase::Move, 300.0);

        assert_eq!(*seen.borrow(), vec!["定位"]);
        assert_eq!(strip.choose, Some(0));
    }

    #[test]
    fn test_zero_height_view_never_notifies() {
        let (mut strip, seen) = recording_strip();
        let mut host = TestHost::new(40, 0);
        send(&mut strip, &mut host, PointerPhase::Down, 0.0);
        send(&mut strip, &mut host, PointerPhase::Move, 10.0);
        assert!(seen.borrow().is_empty());

        let mut canvas = TestCanvas::default();
        strip.paint(&host, &mut canvas);
        assert!(canvas.rects.is_empty() && canvas.texts.is_empty());
        strip.paint(&TestHost::new(0, 600), &mut canvas);
        assert!(canvas.rects.is_empty() && canvas.texts.is_empty());
    }

    #[test]
    fn test_random_gestures_keep_choice_in_range_and_count_transitions() {
        let (mut strip, seen) = recording_strip();
        let mut host = TestHost::new(40, 617);
        let mut seed: u32 = 0x2545_f491;
        let mut next = || {
            seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
            seed >> 8
        };

        let mut expected = 0usize;
        let mut model_choice: Option<usize> = None;
        for _ in 0..2_000 {
            let phase = match next() % 10 {
                0 => PointerPhase::Down,
                1 => PointerPhase::Up,
                _ => PointerPhase::Move,
            };
            let y = (next() % 800) as f32 - 100.0 + 0.5;
            let cell = cell_at(y, host.height);
            match phase {
                PointerPhase::Up => model_choice = None,
                _ => {
                    if let Some(cell) = cell {
                        if model_choice != Some(cell) {
                            expected += 1;
                            model_choice = Some(cell);
                        }
                    }
                }
            }

            assert!(send(&mut strip, &mut host, phase, y));
            assert!(strip.choose.map_or(true, |choice| choice < LABELS.len()));
            assert_eq!(strip.choose, model_choice);
        }
        assert_eq!(seen.borrow().len(), expected);
    }

    #[test]
    fn test_paint_draws_every_label_top_aligned() {
        let strip = IndexStrip::new();
        let mut canvas = TestCanvas::default();
        strip.paint(&TestHost::new(41, 615), &mut canvas);

        assert!(canvas.rects.is_empty());
        assert_eq!(canvas.texts.len(), 30);
        for (index, (text, x, baseline, paint)) in canvas.texts.iter().enumerate() {
            assert_eq!(text, LABELS[index]);
            assert_eq!(*x, 20.0);
            // 615 / 30 = 20 with 15 spare pixels at the bottom.
            assert_eq!(*baseline, 20.0 * (index as f32 + 1.0));
            assert_eq!(paint.color, LABEL_COLOR);
            assert_eq!(paint.text_size, 26.0);
            assert!(paint.anti_alias);
        }
    }

    #[test]
    fn test_paint_dims_background_only_while_pressed() {
        let (mut strip, _seen) = recording_strip();
        let mut host = TestHost::new(40, 600);
        send(&mut strip, &mut host, PointerPhase::Down, 10.0);

        let mut canvas = TestCanvas::default();
        strip.paint(&host, &mut canvas);
        assert_eq!(
            canvas.rects,
            vec![(
                Rect {
                    left: 0,
                    top: 0,
                    right: 40,
                    bottom: 600
                },
                PRESSED_BACKGROUND
            )]
        );
        assert_eq!(PRESSED_BACKGROUND.0 >> 24, 0x40);
        assert_eq!(canvas.texts.len(), 30);

        send(&mut strip, &mut host, PointerPhase::Up, 10.0);
        let mut canvas = TestCanvas::default();
        strip.paint(&host, &mut canvas);
        assert!(canvas.rects.is_empty());
    }
}
