use std::io::Write;

use dashmap::DashMap;
use log::{debug, trace};

use crate::assets::TextureProvider;
use crate::clamp::BoundsClamper;
use crate::config::{Profile, RenderConfig};
use crate::context::{AudioSink, GumpContext};
use crate::definitions::ContainerDefinition;
use crate::error::PersistError;
use crate::eye::{CorpseEyeAnimator, EyeIcon, CORPSE_GRAPHIC};
use crate::minimize::{MinimizeState, MinimizeTrigger};
use crate::persist::{BinaryRecord, MarkupRecord, SchemaVersion, CONTAINER_KIND};
use crate::scale::{Point, Rect, ScaleContext, Size};
use crate::text::TextContainer;
use crate::window::{MouseButton, ScreenFit, WindowChrome, WindowHooks};
use crate::world::{Serial, StorageDirectory};

/// An item drawn inside a container window.
#[derive(Debug, Clone, PartialEq)]
pub struct ItemWidget {
    pub serial: Serial,
    pub graphic: u16,
    /// Device-space position relative to the window.
    pub position: Point,
    pub size: Size,
    pub visible: bool,
}

/// The container sprite behind everything else.
#[derive(Debug, Clone, PartialEq)]
pub struct Background {
    pub graphic: u16,
    pub size: Size,
    pub visible: bool,
}

/// Region that minimizes the window when released on.
#[derive(Debug, Clone, PartialEq)]
pub struct HitBox {
    pub area: Rect,
    pub visible: bool,
}

/// Result of a per-tick update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    Alive,
    /// The backing storage object is gone; the window must be disposed.
    StorageGone,
}

/// A window showing the items of one storage object.
#[derive(Debug, Clone)]
pub struct ContainerWidget {
    serial: Serial,
    graphic: u16,
    chrome: WindowChrome,
    definition: ContainerDefinition,
    state: MinimizeState,
    hide_if_empty: bool,
    is_corpse: bool,
    scale: ScaleContext,
    background: Background,
    hit_box: HitBox,
    eye: Option<EyeIcon>,
    eye_animator: CorpseEyeAnimator,
    items: Vec<ItemWidget>,
    text: TextContainer,
    contents_dirty: bool,
}

impl ContainerWidget {
    /// Open a window for `serial` drawn with container `graphic`.
    ///
    /// Returns `None` when the storage object does not exist.
    pub fn open(
        serial: Serial,
        graphic: u16,
        play_sound: bool,
        location: Point,
        ctx: &mut GumpContext,
        config: &RenderConfig,
    ) -> Option<Self> {
        if !ctx.storage.is_alive(serial) {
            debug!("Container {:#010X} not found, window not opened", serial);
            return None;
        }

        let definition = ctx.definitions.get(graphic);
        let mut chrome = WindowChrome::new(location);
        chrome.can_move = true;
        chrome.can_close_with_right_click = true;

        let mut widget = Self {
            serial,
            graphic,
            chrome,
            background: Background {
                graphic: definition.graphic,
                size: Size::ZERO,
                visible: true,
            },
            hit_box: HitBox {
                area: definition.minimizer_area,
                visible: true,
            },
            definition,
            state: MinimizeState::Open,
            hide_if_empty: false,
            is_corpse: graphic == CORPSE_GRAPHIC,
            scale: config.scale_context(),
            eye: None,
            eye_animator: CorpseEyeAnimator::default(),
            items: Vec::new(),
            text: TextContainer::default(),
            contents_dirty: false,
        };

        widget.update_contents(ctx, config);

        if play_sound && widget.definition.open_sound != 0 {
            ctx.audio.play(widget.definition.open_sound);
        }

        debug!(
            "Opened container {:#010X} (graphic {:#06X}) at {:?}",
            serial, graphic, widget.chrome.location()
        );
        Some(widget)
    }

    /// Rebuild every child from the storage contents and the current scale.
    pub fn update_contents(&mut self, ctx: &mut GumpContext, config: &RenderConfig) {
        self.items.clear();
        self.scale = config.scale_context();

        self.build(ctx, config);
        self.apply_minimize_visuals(ctx.textures, ctx.screen);
        self.populate_items(ctx.storage, ctx.textures, config);
        self.contents_dirty = false;

        trace!(
            "Rebuilt container {:#010X}: {} items, scale {}",
            self.serial,
            self.items.len(),
            self.scale.factor()
        );
    }

    fn build(&mut self, ctx: &mut GumpContext, config: &RenderConfig) {
        self.definition = ctx.definitions.get(self.graphic);
        self.is_corpse = self.graphic == CORPSE_GRAPHIC;

        if self.is_corpse {
            if ctx.corpses.take_manual(self.serial) {
                trace!("Corpse {:#010X} opened manually", self.serial);
            } else if ctx.corpses.is_auto(self.serial) && config.skip_empty_corpse {
                self.chrome.set_visible(false);
                self.hide_if_empty = true;
            }
        }

        self.hit_box = HitBox {
            area: self.scale.rect(self.definition.minimizer_area),
            visible: true,
        };

        // rebuilt at the base frame; the next flip picks up the animator's frame
        self.eye = self
            .is_corpse
            .then(|| EyeIcon::build(ctx.textures, self.scale));
    }

    fn apply_minimize_visuals(&mut self, textures: &dyn TextureProvider, screen: &dyn ScreenFit) {
        let minimized = self.state.is_minimized();
        let graphic = self.definition.background_graphic(minimized);

        let size = match textures.gump_size(graphic) {
            Some(natural) => self.scale.size(natural),
            None => {
                trace!("No gump texture {:#06X} for container background", graphic);
                Size::ZERO
            }
        };

        self.background = Background {
            graphic,
            size,
            visible: true,
        };
        self.hit_box.visible = true;
        self.chrome.set_size(size);

        let visible = self.state.children_visible();
        for item in &mut self.items {
            item.visible = visible;
        }
        if let Some(eye) = &mut self.eye {
            eye.visible = visible;
        }

        self.chrome.set_in_screen(screen);
    }

    fn populate_items(
        &mut self,
        storage: &dyn StorageDirectory,
        textures: &dyn TextureProvider,
        config: &RenderConfig,
    ) {
        let visible = self.state.children_visible();

        for item in storage.contents(self.serial) {
            if !item.lootable {
                continue;
            }

            let texture = textures.art(item.displayed_graphic);
            let mut widget = ItemWidget {
                serial: item.serial,
                graphic: item.displayed_graphic,
                position: self.scale.point(item.position),
                size: BoundsClamper::footprint(texture, config).unwrap_or(Size::ZERO),
                visible,
            };

            let placed = BoundsClamper::place(item.position, texture, &self.definition.bounds, config);
            if placed != widget.position {
                widget.position = placed;
            }

            if self.hide_if_empty && !self.chrome.is_visible() {
                self.chrome.set_visible(true);
            }

            self.items.push(widget);
        }
    }

    /// Per-frame update. Applies a queued rebuild, expires annotations and
    /// advances the corpse eye.
    pub fn update(&mut self, now_ms: f64, ctx: &mut GumpContext, config: &RenderConfig) -> TickOutcome {
        if self.chrome.is_disposed() || !ctx.storage.is_alive(self.serial) {
            return TickOutcome::StorageGone;
        }

        if self.contents_dirty || config.scale_context() != self.scale {
            self.update_contents(ctx, config);
        }

        self.text.expire(now_ms);

        if self.is_corpse {
            if let Some(graphic) = self.eye_animator.tick(now_ms) {
                if let Some(eye) = &mut self.eye {
                    eye.show_frame(graphic, ctx.textures, self.scale);
                }
            }
        }

        TickOutcome::Alive
    }

    /// Mouse release at a window-local point. Returns true if the window
    /// minimized.
    pub fn handle_mouse_up(&mut self, local: Point, button: MouseButton, ctx: &GumpContext) -> bool {
        if !self.hit_box.area.contains(local) {
            return false;
        }

        match self.state.next(MinimizeTrigger::MinimizerReleased(button)) {
            Some(transition) => {
                self.enter_state(transition.to, ctx);
                true
            }
            None => false,
        }
    }

    /// Double click at a window-local point. Returns true if the event was
    /// consumed and must not open the container item.
    pub fn handle_double_click(&mut self, local: Point, button: MouseButton, ctx: &GumpContext) -> bool {
        let background = Rect::from_origin_size(Point::default(), self.background.size);
        if !background.contains(local) {
            return false;
        }

        match self.state.next(MinimizeTrigger::BackgroundDoubleClicked(button)) {
            Some(transition) => {
                self.enter_state(transition.to, ctx);
                transition.consumed
            }
            None => false,
        }
    }

    /// Force the minimize state, e.g. when restoring a layout.
    pub fn set_minimized(&mut self, minimized: bool, ctx: &GumpContext) {
        self.enter_state(MinimizeState::from_minimized(minimized), ctx);
    }

    fn enter_state(&mut self, state: MinimizeState, ctx: &GumpContext) {
        self.state = state;
        self.apply_minimize_visuals(ctx.textures, ctx.screen);
    }

    /// Serials of the items directly held by this container.
    ///
    /// Only items whose container reference is exactly this serial count.
    pub fn nested_serials<'a>(&self, storage: &'a dyn StorageDirectory) -> impl Iterator<Item = Serial> + 'a {
        let serial = self.serial;
        storage
            .contents(serial)
            .filter(move |item| item.container == Some(serial))
            .map(|item| item.serial)
    }

    /// Release the window. Nested windows are disposed by the owner.
    pub fn dispose(&mut self, storage: &dyn StorageDirectory, config: &RenderConfig, saved: &DashMap<Serial, Point>) {
        if self.chrome.is_disposed() {
            return;
        }

        self.text.clear();

        if storage.item(self.serial).is_some() && config.remembers_every_container() {
            saved.insert(self.serial, self.chrome.location());
        }

        self.chrome.mark_disposed();
        debug!("Disposed container window {:#010X}", self.serial);
    }

    pub fn markup_record(&self) -> MarkupRecord {
        MarkupRecord {
            kind: CONTAINER_KIND.to_string(),
            location: self.chrome.location(),
            serial: self.serial,
            graphic: Some(self.graphic),
            minimized: Some(self.state.is_minimized()),
        }
    }

    pub fn serial(&self) -> Serial {
        self.serial
    }

    pub fn graphic(&self) -> u16 {
        self.graphic
    }

    pub fn chrome(&self) -> &WindowChrome {
        &self.chrome
    }

    pub fn chrome_mut(&mut self) -> &mut WindowChrome {
        &mut self.chrome
    }

    pub fn definition(&self) -> &ContainerDefinition {
        &self.definition
    }

    pub fn state(&self) -> MinimizeState {
        self.state
    }

    pub fn is_minimized(&self) -> bool {
        self.state.is_minimized()
    }

    pub fn is_corpse(&self) -> bool {
        self.is_corpse
    }

    pub fn hides_if_empty(&self) -> bool {
        self.hide_if_empty
    }

    pub fn scale(&self) -> ScaleContext {
        self.scale
    }

    pub fn background(&self) -> &Background {
        &self.background
    }

    pub fn hit_box(&self) -> &HitBox {
        &self.hit_box
    }

    pub fn eye(&self) -> Option<&EyeIcon> {
        self.eye.as_ref()
    }

    pub fn items(&self) -> &[ItemWidget] {
        &self.items
    }

    pub fn text(&self) -> &TextContainer {
        &self.text
    }

    pub fn text_mut(&mut self) -> &mut TextContainer {
        &mut self.text
    }

    pub fn has_pending_rebuild(&self) -> bool {
        self.contents_dirty
    }
}

impl WindowHooks for ContainerWidget {
    fn on_contents_changed(&mut self) {
        self.contents_dirty = true;
    }

    fn on_close_with_right_click(&mut self, audio: &mut dyn AudioSink) {
        if self.definition.close_sound != 0 {
            audio.play(self.definition.close_sound);
        }
    }

    fn on_drag_end(&mut self, config: &RenderConfig, profile: &mut Profile) {
        if config.records_dragged_position() {
            let center = self.chrome.bounds().center();
            trace!("Container {:#010X} dragged, centre {:?}", self.serial, center);
            profile.override_container_location_position = Some(center);
        }
    }

    fn save_binary<W: Write>(&self, version: SchemaVersion, writer: &mut W) -> Result<(), PersistError> {
        BinaryRecord::capture(version, self.serial, self.graphic, self.state.is_minimized()).write(writer)
    }

    fn save_markup<W: Write>(&self, writer: &mut quick_xml::Writer<W>) -> Result<(), PersistError> {
        self.markup_record().write(writer)
    }
}
