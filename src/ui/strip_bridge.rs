//! Hosts the index strip inside the Slint window: pointer callbacks feed the
//! strip, and its paint calls become the label model the markup renders.

use std::{cell::RefCell, rc::Rc};

use log::debug;
use slint::{Color, ComponentHandle, Model, ModelRc, VecModel};

use crate::{
    ui::index_strip::{
        Argb, IndexStrip, PointerEvent, PointerPhase, Rect, StripCanvas, StripHost, TextPaint,
    },
    AppWindow, StripLabelItem,
};

pub const POINTER_DOWN: i32 = 0;
pub const POINTER_MOVE: i32 = 1;
pub const POINTER_UP: i32 = 2;
pub const POINTER_CANCEL: i32 = 3;

/// Maps the markup's pointer codes; a cancelled gesture ends like a release.
pub fn phase_from_code(code: i32) -> Option<PointerPhase> {
    match code {
        POINTER_DOWN => Some(PointerPhase::Down),
        POINTER_MOVE => Some(PointerPhase::Move),
        POINTER_UP | POINTER_CANCEL => Some(PointerPhase::Up),
        _ => None,
    }
}

fn to_slint_color(color: Argb) -> Color {
    Color::from_argb_encoded(color.0)
}

struct WindowStripHost<'a> {
    ui: &'a AppWindow,
    repaint_requested: bool,
}

impl<'a> WindowStripHost<'a> {
    fn new(ui: &'a AppWindow) -> Self {
        Self {
            ui,
            repaint_requested: false,
        }
    }
}

impl StripHost for WindowStripHost<'_> {
    fn measured_width(&self) -> i32 {
        self.ui.get_strip_width().round() as i32
    }

    fn measured_height(&self) -> i32 {
        self.ui.get_strip_height().round() as i32
    }

    fn invalidate(&mut self) {
        self.repaint_requested = true;
    }
}

/// Collects one paint pass as markup data.
#[derive(Default)]
pub(crate) struct ModelCanvas {
    background: Option<Color>,
    items: Vec<StripLabelItem>,
}

impl StripCanvas for ModelCanvas {
    fn draw_rect(&mut self, rect: Rect, color: Argb) {
        // The strip only ever fills its whole bounds.
        if rect.right > rect.left && rect.bottom > rect.top {
            self.background = Some(to_slint_color(color));
        }
    }

    fn draw_text(&mut self, text: &str, x: f32, baseline_y: f32, paint: &TextPaint) {
        // Aliased text snaps to whole pixels.
        let snap = |value: f32| if paint.anti_alias { value } else { value.round() };
        self.items.push(StripLabelItem {
            text: text.into(),
            center_x: snap(x),
            top: snap(baseline_y - paint.text_size),
            font_size: paint.text_size,
            color: to_slint_color(paint.color),
        });
    }
}

fn update_or_replace_vec_model<T: Clone + 'static>(
    current_model: ModelRc<T>,
    next_values: Vec<T>,
) -> ModelRc<T> {
    if let Some(vec_model) = current_model.as_any().downcast_ref::<VecModel<T>>() {
        if vec_model.row_count() == next_values.len() {
            for (index, value) in next_values.into_iter().enumerate() {
                vec_model.set_row_data(index, value);
            }
        } else {
            vec_model.set_vec(next_values);
        }
        current_model
    } else {
        ModelRc::from(Rc::new(VecModel::from(next_values)))
    }
}

fn repaint(ui: &AppWindow, strip: &IndexStrip) {
    let host = WindowStripHost::new(ui);
    let mut canvas = ModelCanvas::default();
    strip.paint(&host, &mut canvas);
    ui.set_strip_background(canvas.background.unwrap_or_else(|| Color::from_argb_u8(0, 0, 0, 0)));
    ui.set_strip_labels(update_or_replace_vec_model(
        ui.get_strip_labels(),
        canvas.items,
    ));
}

/// Wires pointer and resize callbacks and paints the strip once.
pub fn install_index_strip(ui: &AppWindow, strip: Rc<RefCell<IndexStrip>>) {
    let ui_handle = ui.as_weak();
    let strip_for_pointer = Rc::clone(&strip);
    ui.on_strip_pointer(move |code, y| {
        let Some(ui) = ui_handle.upgrade() else {
            return;
        };
        let Some(phase) = phase_from_code(code) else {
            debug!("Ignoring unknown strip pointer code {}", code);
            return;
        };
        let mut host = WindowStripHost::new(&ui);
        strip_for_pointer
            .borrow_mut()
            .on_pointer_event(&mut host, PointerEvent::new(phase, y));
        if host.repaint_requested {
            repaint(&ui, &strip_for_pointer.borrow());
        }
    });

    let ui_handle = ui.as_weak();
    let strip_for_resize = Rc::clone(&strip);
    ui.on_strip_resized(move || {
        if let Some(ui) = ui_handle.upgrade() {
            repaint(&ui, &strip_for_resize.borrow());
        }
    });

    repaint(ui, &strip.borrow());
}
