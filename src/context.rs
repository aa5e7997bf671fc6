use std::collections::{HashSet, VecDeque};

use crate::assets::TextureProvider;
use crate::definitions::DefinitionRegistry;
use crate::window::ScreenFit;
use crate::world::{Serial, StorageDirectory};

/// Fire-and-forget sound playback.
pub trait AudioSink {
    fn play(&mut self, sound: u16);
}

/// The active game scene.
pub trait Scene {
    /// Schedule a deferred double click (open) of an object.
    fn double_click_delayed(&mut self, serial: Serial);
}

/// Collects played sounds in order.
#[derive(Debug, Clone, Default)]
pub struct SoundQueue {
    played: Vec<u16>,
}

impl SoundQueue {
    pub fn played(&self) -> &[u16] {
        &self.played
    }

    pub fn drain(&mut self) -> std::vec::Drain<'_, u16> {
        self.played.drain(..)
    }
}

impl AudioSink for SoundQueue {
    fn play(&mut self, sound: u16) {
        self.played.push(sound);
    }
}

/// Deferred open requests, consumed by the scene on its next frame.
#[derive(Debug, Clone, Default)]
pub struct DeferredOpens {
    pending: VecDeque<Serial>,
}

impl DeferredOpens {
    pub fn pending(&self) -> impl Iterator<Item = &Serial> {
        self.pending.iter()
    }

    pub fn pop(&mut self) -> Option<Serial> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

impl Scene for DeferredOpens {
    fn double_click_delayed(&mut self, serial: Serial) {
        self.pending.push_back(serial);
    }
}

/// Remembers how corpses were opened.
///
/// A manual open is consumed by the next build of that corpse's window; an
/// auto open stays recorded.
#[derive(Debug, Clone, Default)]
pub struct CorpseOpenTracker {
    manual: HashSet<Serial>,
    auto: HashSet<Serial>,
}

impl CorpseOpenTracker {
    pub fn mark_manual(&mut self, serial: Serial) {
        self.manual.insert(serial);
    }

    pub fn mark_auto(&mut self, serial: Serial) {
        self.auto.insert(serial);
    }

    /// Removes and reports a pending manual open.
    pub fn take_manual(&mut self, serial: Serial) -> bool {
        self.manual.remove(&serial)
    }

    pub fn is_auto(&self, serial: Serial) -> bool {
        self.auto.contains(&serial)
    }
}

/// External collaborators a container window consults while building and
/// updating.
pub struct GumpContext<'a> {
    pub storage: &'a dyn StorageDirectory,
    pub definitions: &'a dyn DefinitionRegistry,
    pub textures: &'a dyn TextureProvider,
    pub screen: &'a dyn ScreenFit,
    pub audio: &'a mut dyn AudioSink,
    pub corpses: &'a mut CorpseOpenTracker,
}
