use std::io::Write;

use crate::config::{Profile, RenderConfig};
use crate::context::AudioSink;
use crate::error::PersistError;
use crate::persist::SchemaVersion;
use crate::scale::{Point, Rect, Size};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MouseButton {
    Left,
    Right,
    Middle,
}

/// Keeps a window on the visible screen area after a size change.
pub trait ScreenFit {
    /// Returns the location the window should move to.
    fn fit(&self, bounds: Rect) -> Point;
}

/// A fixed-size screen area.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

impl ScreenFit for Viewport {
    fn fit(&self, bounds: Rect) -> Point {
        let max_x = (self.width - bounds.width).max(0);
        let max_y = (self.height - bounds.height).max(0);
        Point::new(bounds.x.clamp(0, max_x), bounds.y.clamp(0, max_y))
    }
}

#[derive(Debug, Clone, Copy)]
struct DragState {
    grab: Point,
    start: Point,
}

/// Generic window capability: location, size, visibility, dragging and the
/// disposed flag. Widgets embed it instead of deriving from a window type.
#[derive(Debug, Clone)]
pub struct WindowChrome {
    location: Point,
    size: Size,
    visible: bool,
    disposed: bool,
    pub can_move: bool,
    pub can_close_with_right_click: bool,
    drag: Option<DragState>,
}

impl WindowChrome {
    pub fn new(location: Point) -> Self {
        Self {
            location,
            size: Size::ZERO,
            visible: true,
            disposed: false,
            can_move: false,
            can_close_with_right_click: false,
            drag: None,
        }
    }

    pub fn location(&self) -> Point {
        self.location
    }

    pub fn set_location(&mut self, location: Point) {
        self.location = location;
    }

    pub fn size(&self) -> Size {
        self.size
    }

    pub fn set_size(&mut self, size: Size) {
        self.size = size;
    }

    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.location, self.size)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn set_visible(&mut self, visible: bool) {
        self.visible = visible;
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    pub fn mark_disposed(&mut self) {
        self.disposed = true;
        self.drag = None;
    }

    /// Screen point relative to the window's top-left corner.
    pub fn to_local(&self, screen: Point) -> Point {
        Point::new(screen.x - self.location.x, screen.y - self.location.y)
    }

    pub fn contains(&self, screen: Point) -> bool {
        self.bounds().contains(screen)
    }

    pub fn set_in_screen(&mut self, screen: &dyn ScreenFit) {
        self.location = screen.fit(self.bounds());
    }

    pub fn begin_drag(&mut self, mouse: Point) -> bool {
        if !self.can_move || self.disposed {
            return false;
        }
        self.drag = Some(DragState {
            grab: mouse,
            start: self.location,
        });
        true
    }

    pub fn is_dragging(&self) -> bool {
        self.drag.is_some()
    }

    pub fn drag_to(&mut self, mouse: Point) {
        if let Some(drag) = self.drag {
            self.location = drag
                .start
                .offset(mouse.x - drag.grab.x, mouse.y - drag.grab.y);
        }
    }

    /// Finish a drag. Returns the final location if a drag was in progress.
    pub fn end_drag(&mut self) -> Option<Point> {
        self.drag.take().map(|_| self.location)
    }
}

/// Hooks a widget supplies to the window machinery.
pub trait WindowHooks {
    /// Contents of the backing object changed; rebuild on the next tick.
    fn on_contents_changed(&mut self);

    /// The window is being closed with a right click.
    fn on_close_with_right_click(&mut self, audio: &mut dyn AudioSink);

    /// A drag of the window finished.
    fn on_drag_end(&mut self, config: &RenderConfig, profile: &mut Profile);

    /// Write the widget's binary record for `version`.
    fn save_binary<W: Write>(&self, version: SchemaVersion, writer: &mut W) -> Result<(), PersistError>;

    /// Write the widget's markup element.
    fn save_markup<W: Write>(&self, writer: &mut quick_xml::Writer<W>) -> Result<(), PersistError>;
}
