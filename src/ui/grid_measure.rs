//! Measurement override for a grid nested inside a scrolling parent.

const MODE_SHIFT: u32 = 30;
const SIZE_MASK: u32 = (1 << MODE_SHIFT) - 1;

/// Largest height a nested grid asks for; it never scrolls on its own.
pub const UNBOUNDED_HEIGHT: i32 = i32::MAX >> 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MeasureMode {
    Unspecified,
    Exactly,
    AtMost,
}

/// A parent's size constraint for one axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeasureSpec {
    pub mode: MeasureMode,
    pub size: i32,
}

impl MeasureSpec {
    pub fn exactly(size: i32) -> Self {
        Self {
            mode: MeasureMode::Exactly,
            size,
        }
    }

    pub fn at_most(size: i32) -> Self {
        Self {
            mode: MeasureMode::AtMost,
            size,
        }
    }

    pub fn unspecified() -> Self {
        Self {
            mode: MeasureMode::Unspecified,
            size: 0,
        }
    }
}

// Packed form used by hosts that pass specs as a single integer.
#[allow(dead_code)]
impl MeasureSpec {
    /// Encodes as two mode bits over a 30-bit size.
    pub fn pack(self) -> i32 {
        let mode: u32 = match self.mode {
            MeasureMode::Unspecified => 0,
            MeasureMode::Exactly => 1,
            MeasureMode::AtMost => 2,
        };
        ((mode << MODE_SHIFT) | (self.size as u32 & SIZE_MASK)) as i32
    }

    pub fn unpack(packed: i32) -> Option<Self> {
        let bits = packed as u32;
        let mode = match bits >> MODE_SHIFT {
            0 => MeasureMode::Unspecified,
            1 => MeasureMode::Exactly,
            2 => MeasureMode::AtMost,
            _ => return None,
        };
        Some(Self {
            mode,
            size: (bits & SIZE_MASK) as i32,
        })
    }
}

/// Picks the final size for `content` under `spec`.
pub fn resolve_size(content: i32, spec: MeasureSpec) -> i32 {
    match spec.mode {
        MeasureMode::Exactly => spec.size,
        MeasureMode::AtMost => content.min(spec.size),
        MeasureMode::Unspecified => content,
    }
}

/// Grid that reports its full content height instead of scrolling.
#[derive(Debug, Default, Clone, Copy)]
pub struct UnboundedGrid;

impl UnboundedGrid {
    /// Width passes through; height becomes "at most [`UNBOUNDED_HEIGHT`]".
    pub fn measure(&self, width: MeasureSpec, _height: MeasureSpec) -> (MeasureSpec, MeasureSpec) {
        (width, MeasureSpec::at_most(UNBOUNDED_HEIGHT))
    }

    /// Height of `items` cells laid out `columns` per row, whatever the
    /// parent offers in `parent_height`.
    pub fn content_height(
        &self,
        items: usize,
        columns: usize,
        row_height: i32,
        parent_height: MeasureSpec,
    ) -> i32 {
        let rows = items.div_ceil(columns.max(1));
        let content = i32::try_from(rows)
            .unwrap_or(i32::MAX)
            .saturating_mul(row_height.max(0));
        let (_, height) = self.measure(MeasureSpec::unspecified(), parent_height);
        resolve_size(content, height)
    }
}
