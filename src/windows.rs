use std::collections::HashMap;
use std::io::{Read, Write};
use std::sync::Arc;

use dashmap::DashMap;
use indextree::{Arena, NodeId};
use log::{debug, warn};
use quick_xml::events::{BytesEnd, BytesStart, Event};
use quick_xml::Writer;

use crate::config::{Profile, RenderConfig};
use crate::context::{GumpContext, Scene};
use crate::error::PersistError;
use crate::gump::{ContainerWidget, TickOutcome};
use crate::persist::{self, SchemaVersion, CONTAINER_KIND};
use crate::scale::Point;
use crate::window::WindowHooks;
use crate::world::{Serial, StorageDirectory};

const SESSION_ELEMENT: &str = "gumps";

/// A request to show the window of a storage object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OpenRequest {
    pub serial: Serial,
    pub graphic: u16,
    pub play_sound: bool,
    /// Where a newly created window is placed.
    pub location: Point,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OpenOutcome {
    Opened,
    /// Already open with the same graphic; a rebuild was queued.
    Refreshed,
    /// Already open with another graphic; the widget was replaced in place.
    Replaced,
    /// The storage object does not exist.
    Missing,
}

/// Every open container window, arranged as a tree that follows storage
/// containment: a window's children are the open windows of containers
/// inside it.
///
/// Holds at most one window per storage object.
pub struct ContainerWindows {
    arena: Arena<ContainerWidget>,
    by_serial: HashMap<Serial, NodeId>,
    saved_positions: Arc<DashMap<Serial, Point>>,
    // bottom to top; arena slots are recycled so arena order is not creation order
    z_order: Vec<Serial>,
    // reused across ticks
    scratch: Vec<NodeId>,
    doomed: Vec<Serial>,
}

impl Default for ContainerWindows {
    fn default() -> Self {
        Self::new()
    }
}

impl ContainerWindows {
    pub fn new() -> Self {
        Self::with_saved_positions(Arc::new(DashMap::new()))
    }

    pub fn with_saved_positions(saved_positions: Arc<DashMap<Serial, Point>>) -> Self {
        Self {
            arena: Arena::new(),
            by_serial: HashMap::new(),
            saved_positions,
            z_order: Vec::new(),
            scratch: Vec::new(),
            doomed: Vec::new(),
        }
    }

    /// Locations saved when windows were disposed, keyed by serial.
    pub fn saved_positions(&self) -> Arc<DashMap<Serial, Point>> {
        Arc::clone(&self.saved_positions)
    }

    pub fn open(&mut self, request: OpenRequest, ctx: &mut GumpContext, config: &RenderConfig) -> OpenOutcome {
        let OpenRequest {
            serial,
            graphic,
            play_sound,
            location,
        } = request;

        if let Some(&node_id) = self.by_serial.get(&serial) {
            return self.reopen(node_id, request, ctx, config);
        }

        let location = if config.remembers_every_container() {
            self.saved_positions
                .get(&serial)
                .map(|saved| *saved)
                .unwrap_or(location)
        } else {
            location
        };

        let Some(widget) = ContainerWidget::open(serial, graphic, play_sound, location, ctx, config) else {
            return OpenOutcome::Missing;
        };

        self.insert(widget, ctx.storage);
        OpenOutcome::Opened
    }

    fn insert(&mut self, widget: ContainerWidget, storage: &dyn StorageDirectory) {
        let serial = widget.serial();
        let node_id = self.arena.new_node(widget);
        self.by_serial.insert(serial, node_id);
        self.z_order.push(serial);
        self.reparent(storage);
    }

    fn reopen(
        &mut self,
        node_id: NodeId,
        request: OpenRequest,
        ctx: &mut GumpContext,
        config: &RenderConfig,
    ) -> OpenOutcome {
        let Some(node) = self.arena.get_mut(node_id) else {
            return OpenOutcome::Missing;
        };
        let widget = node.get_mut();

        if widget.graphic() == request.graphic {
            widget.on_contents_changed();
            return OpenOutcome::Refreshed;
        }

        debug!(
            "Container {:#010X} reopened as {:#06X}, replacing window",
            request.serial, request.graphic
        );
        let location = widget.chrome().location();
        self.dispose_node(node_id, ctx.storage, config);

        match ContainerWidget::open(
            request.serial,
            request.graphic,
            request.play_sound,
            location,
            ctx,
            config,
        ) {
            Some(replacement) => {
                self.insert(replacement, ctx.storage);
                OpenOutcome::Replaced
            }
            None => OpenOutcome::Missing,
        }
    }

    /// Queue a rebuild of the window showing `serial`.
    pub fn contents_changed(&mut self, serial: Serial) -> bool {
        match self.get_mut(serial) {
            Some(widget) => {
                widget.on_contents_changed();
                true
            }
            None => false,
        }
    }

    /// Per-frame refresh: follow containment changes, tick every window and
    /// dispose those whose storage object is gone. Returns how many windows
    /// were disposed.
    pub fn update(&mut self, now_ms: f64, ctx: &mut GumpContext, config: &RenderConfig) -> usize {
        self.reparent(ctx.storage);

        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(self.by_serial.values().copied());

        self.doomed.clear();
        for &node_id in &scratch {
            let Some(node) = self.arena.get_mut(node_id) else {
                continue;
            };
            let widget = node.get_mut();
            if widget.update(now_ms, ctx, config) == TickOutcome::StorageGone {
                self.doomed.push(widget.serial());
            }
        }
        self.scratch = scratch;

        let before = self.by_serial.len();
        let mut doomed = std::mem::take(&mut self.doomed);
        for &serial in &doomed {
            self.dispose(serial, ctx.storage, config);
        }
        doomed.clear();
        self.doomed = doomed;

        before - self.by_serial.len()
    }

    /// Right-click close: play the close sound, then dispose.
    pub fn close(&mut self, serial: Serial, ctx: &mut GumpContext, config: &RenderConfig) -> bool {
        let Some(widget) = self.get_mut(serial) else {
            return false;
        };
        if !widget.chrome().can_close_with_right_click {
            return false;
        }

        widget.on_close_with_right_click(&mut *ctx.audio);
        self.dispose(serial, ctx.storage, config)
    }

    /// Dispose the window of `serial` and, recursively, the windows of the
    /// containers it holds.
    pub fn dispose(&mut self, serial: Serial, storage: &dyn StorageDirectory, config: &RenderConfig) -> bool {
        match self.by_serial.get(&serial) {
            Some(&node_id) => {
                self.dispose_node(node_id, storage, config);
                true
            }
            None => false,
        }
    }

    fn dispose_node(&mut self, node_id: NodeId, storage: &dyn StorageDirectory, config: &RenderConfig) {
        let Some(node) = self.arena.get_mut(node_id) else {
            return;
        };
        let widget = node.get_mut();
        let serial = widget.serial();

        widget.dispose(storage, config, &self.saved_positions);
        self.by_serial.remove(&serial);
        self.z_order.retain(|&open| open != serial);

        let nested: Vec<NodeId> = widget
            .nested_serials(storage)
            .filter_map(|nested| self.by_serial.get(&nested).copied())
            .collect();

        if !nested.is_empty() {
            debug!(
                "Disposing {} nested window(s) of {:#010X}",
                nested.len(),
                serial
            );
        }
        for child in nested {
            self.dispose_node(child, storage, config);
        }

        // Windows whose item moved out since the last refresh survive.
        let survivors: Vec<NodeId> = node_id.children(&self.arena).collect();
        for child in survivors {
            child.detach(&mut self.arena);
        }

        node_id.remove(&mut self.arena);
    }

    /// Move each window under the open window of the container holding its
    /// storage object, or to the top level.
    fn reparent(&mut self, storage: &dyn StorageDirectory) {
        let mut scratch = std::mem::take(&mut self.scratch);
        scratch.clear();
        scratch.extend(self.by_serial.values().copied());

        for &node_id in &scratch {
            let Some(node) = self.arena.get(node_id) else {
                continue;
            };
            let serial = node.get().serial();
            let current = node.parent();
            let wanted = storage
                .item(serial)
                .and_then(|item| item.container)
                .and_then(|container| self.by_serial.get(&container).copied())
                .filter(|&parent| parent != node_id);

            if current == wanted {
                continue;
            }

            node_id.detach(&mut self.arena);
            if let Some(parent) = wanted {
                if let Err(err) = parent.checked_append(node_id, &mut self.arena) {
                    warn!("Cannot nest window {:#010X}: {}", serial, err);
                }
            }
        }

        self.scratch = scratch;
    }

    /// Finish dragging the window of `serial`. Returns its final location.
    pub fn end_drag(&mut self, serial: Serial, config: &RenderConfig, profile: &mut Profile) -> Option<Point> {
        let widget = self.get_mut(serial)?;
        let location = widget.chrome_mut().end_drag()?;
        widget.on_drag_end(config, profile);
        Some(location)
    }

    pub fn get(&self, serial: Serial) -> Option<&ContainerWidget> {
        let node_id = self.by_serial.get(&serial)?;
        self.arena.get(*node_id).map(|node| node.get())
    }

    pub fn get_mut(&mut self, serial: Serial) -> Option<&mut ContainerWidget> {
        let node_id = self.by_serial.get(&serial)?;
        self.arena.get_mut(*node_id).map(|node| node.get_mut())
    }

    pub fn contains(&self, serial: Serial) -> bool {
        self.by_serial.contains_key(&serial)
    }

    /// Open windows from the bottom of the stack to the top. A window
    /// opened later sits above every window opened before it.
    pub fn iter(&self) -> impl Iterator<Item = &ContainerWidget> + '_ {
        self.z_order.iter().filter_map(|&serial| self.get(serial))
    }

    /// The top-most visible window under a screen point.
    pub fn window_at(&self, screen: Point) -> Option<Serial> {
        self.iter()
            .filter(|w| w.chrome().is_visible() && w.chrome().contains(screen))
            .last()
            .map(|w| w.serial())
    }

    /// Serials of the windows nested directly in the window of `serial`.
    pub fn nested(&self, serial: Serial) -> Vec<Serial> {
        let Some(&node_id) = self.by_serial.get(&serial) else {
            return Vec::new();
        };
        node_id
            .children(&self.arena)
            .filter_map(|child| self.arena.get(child).map(|node| node.get().serial()))
            .collect()
    }

    pub fn parent_of(&self, serial: Serial) -> Option<Serial> {
        let node_id = self.by_serial.get(&serial)?;
        let parent = self.arena.get(*node_id)?.parent()?;
        self.arena.get(parent).map(|node| node.get().serial())
    }

    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }

    /// Write every open window: a `u32` count followed by one record each.
    pub fn save_binary<W: Write>(&self, version: SchemaVersion, writer: &mut W) -> Result<(), PersistError> {
        writer.write_all(&(self.len() as u32).to_le_bytes())?;
        for widget in self.iter() {
            widget.save_binary(version, writer)?;
        }
        Ok(())
    }

    /// Read a session written by [`save_binary`](Self::save_binary) and
    /// schedule every window to reopen.
    pub fn restore_binary<R: Read>(
        version: SchemaVersion,
        reader: &mut R,
        scene: &mut dyn Scene,
    ) -> Result<Vec<Serial>, PersistError> {
        let mut count = [0u8; 4];
        reader.read_exact(&mut count).map_err(PersistError::from_read)?;

        let count = u32::from_le_bytes(count);
        let mut restored = Vec::new();
        for _ in 0..count {
            restored.push(persist::restore_binary(version, &mut *reader, &mut *scene)?);
        }
        Ok(restored)
    }

    /// Write every open window as a `<gump>` element inside `<gumps>`.
    pub fn save_markup<W: Write>(&self, inner: W) -> Result<W, PersistError> {
        let mut writer = Writer::new_with_indent(inner, b' ', 2);
        writer.write_event(Event::Start(BytesStart::new(SESSION_ELEMENT)))?;
        for widget in self.iter() {
            widget.save_markup(&mut writer)?;
        }
        writer.write_event(Event::End(BytesEnd::new(SESSION_ELEMENT)))?;
        Ok(writer.into_inner())
    }

    /// Schedule a reopen for every container element of a markup session.
    pub fn restore_markup(xml: &str, scene: &mut dyn Scene) -> Result<Vec<Serial>, PersistError> {
        let restored = persist::parse_markup(xml)?
            .iter()
            .filter(|record| record.kind == CONTAINER_KIND)
            .map(|record| persist::restore_markup(record, scene))
            .collect();
        Ok(restored)
    }
}
