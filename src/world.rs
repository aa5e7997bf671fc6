use indextree::{Arena, NodeId};
use log::warn;
use std::collections::HashMap;

use crate::scale::Point;

/// Stable identifier of an in-world object.
pub type Serial = u32;

/// An in-world item, possibly a storage object holding other items.
#[derive(Debug, Clone, PartialEq)]
pub struct Item {
    pub serial: Serial,
    pub graphic: u16,
    /// Art id used to draw the item inside a container window.
    pub displayed_graphic: u16,
    /// Logical position assigned by the server or the client.
    pub position: Point,
    /// Serial of the storage object holding this item.
    pub container: Option<Serial>,
    pub lootable: bool,
    pub destroyed: bool,
}

impl Item {
    pub fn new(serial: Serial, graphic: u16) -> Self {
        Self {
            serial,
            graphic,
            displayed_graphic: graphic,
            position: Point::default(),
            container: None,
            lootable: true,
            destroyed: false,
        }
    }

    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Point::new(x, y);
        self
    }

    pub fn inside(mut self, container: Serial) -> Self {
        self.container = Some(container);
        self
    }

    pub fn not_lootable(mut self) -> Self {
        self.lootable = false;
        self
    }
}

/// Read access to storage objects and their contents.
pub trait StorageDirectory {
    fn item(&self, serial: Serial) -> Option<&Item>;

    /// Items directly inside `container`, in the container's native order.
    fn contents<'a>(&'a self, container: Serial) -> Box<dyn Iterator<Item = &'a Item> + 'a>;

    /// True if the object exists and has not been flagged as destroyed.
    fn is_alive(&self, serial: Serial) -> bool {
        self.item(serial).is_some_and(|item| !item.destroyed)
    }
}

/// In-memory item directory backed by an arena tree.
///
/// Containment is the tree structure: an item's children are its contents,
/// kept in insertion order.
pub struct World {
    arena: Arena<Item>,
    by_serial: HashMap<Serial, NodeId>,
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}

impl World {
    pub fn new() -> Self {
        Self {
            arena: Arena::new(),
            by_serial: HashMap::new(),
        }
    }

    /// Add an item, or replace the data of an existing one, and place it in
    /// its container (appended last).
    pub fn insert(&mut self, item: Item) {
        let serial = item.serial;
        let container = item.container;

        let node_id = match self.by_serial.get(&serial) {
            Some(&node_id) => {
                if let Some(node) = self.arena.get_mut(node_id) {
                    *node.get_mut() = item;
                }
                node_id
            }
            None => {
                let node_id = self.arena.new_node(item);
                self.by_serial.insert(serial, node_id);
                node_id
            }
        };

        self.attach(serial, node_id, container);
    }

    /// Move an item to another container (or to the ground) at `position`.
    pub fn move_item(&mut self, serial: Serial, container: Option<Serial>, position: Point) {
        let Some(&node_id) = self.by_serial.get(&serial) else {
            return;
        };

        if let Some(node) = self.arena.get_mut(node_id) {
            let item = node.get_mut();
            item.container = container;
            item.position = position;
        }

        self.attach(serial, node_id, container);
    }

    /// Flag an item and everything inside it as destroyed without removing it.
    pub fn mark_destroyed(&mut self, serial: Serial) {
        let Some(&node_id) = self.by_serial.get(&serial) else {
            return;
        };

        let subtree: Vec<NodeId> = node_id.descendants(&self.arena).collect();
        for id in subtree {
            if let Some(node) = self.arena.get_mut(id) {
                node.get_mut().destroyed = true;
            }
        }
    }

    /// Remove an item and everything inside it from the directory.
    pub fn remove(&mut self, serial: Serial) {
        let Some(&node_id) = self.by_serial.get(&serial) else {
            return;
        };

        let subtree: Vec<NodeId> = node_id.descendants(&self.arena).collect();
        for id in subtree {
            if let Some(node) = self.arena.get_mut(id) {
                let item = node.get_mut();
                item.destroyed = true;
                self.by_serial.remove(&item.serial);
            }
        }

        node_id.remove_subtree(&mut self.arena);
    }

    pub fn item_mut(&mut self, serial: Serial) -> Option<&mut Item> {
        let node_id = *self.by_serial.get(&serial)?;
        self.arena.get_mut(node_id).map(|node| node.get_mut())
    }

    pub fn len(&self) -> usize {
        self.by_serial.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_serial.is_empty()
    }

    fn attach(&mut self, serial: Serial, node_id: NodeId, container: Option<Serial>) {
        node_id.detach(&mut self.arena);

        let Some(container) = container else {
            return;
        };

        let Some(&parent_id) = self.by_serial.get(&container) else {
            warn!(
                "Item {:#010X} placed in unknown container {:#010X}",
                serial, container
            );
            return;
        };

        if let Err(err) = parent_id.checked_append(node_id, &mut self.arena) {
            warn!(
                "Cannot place item {:#010X} inside {:#010X}: {}",
                serial, container, err
            );
        }
    }
}

impl StorageDirectory for World {
    fn item(&self, serial: Serial) -> Option<&Item> {
        let node_id = self.by_serial.get(&serial)?;
        self.arena.get(*node_id).map(|node| node.get())
    }

    fn contents<'a>(&'a self, container: Serial) -> Box<dyn Iterator<Item = &'a Item> + 'a> {
        match self.by_serial.get(&container) {
            Some(&node_id) => Box::new(
                node_id
                    .children(&self.arena)
                    .filter_map(move |child| self.arena.get(child).map(|node| node.get())),
            ),
            None => Box::new(std::iter::empty()),
        }
    }
}
