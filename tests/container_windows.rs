use containerview::assets::TextureTable;
use containerview::config::{ContainerLocationPolicy, Profile, RenderConfig};
use containerview::context::{CorpseOpenTracker, DeferredOpens, GumpContext, SoundQueue};
use containerview::definitions::ContainerDefinitions;
use containerview::eye::{CORPSE_GRAPHIC, EYE_BASE_GRAPHIC};
use containerview::persist::SchemaVersion;
use containerview::scale::{Point, Size};
use containerview::window::{MouseButton, Viewport};
use containerview::windows::{ContainerWindows, OpenOutcome, OpenRequest};
use containerview::world::{Item, Serial, World};

const BACKPACK: Serial = 0x4000_0001;
const POUCH: Serial = 0x4000_0002;
const BAG: Serial = 0x4000_0003;
const CORPSE: Serial = 0x4000_0100;

/// In-memory collaborators the windows are built against.
struct Env {
    world: World,
    definitions: ContainerDefinitions,
    textures: TextureTable,
    screen: Viewport,
    audio: SoundQueue,
    corpses: CorpseOpenTracker,
}

impl Env {
    fn ctx(&mut self) -> GumpContext<'_> {
        GumpContext {
            storage: &self.world,
            definitions: &self.definitions,
            textures: &self.textures,
            screen: &self.screen,
            audio: &mut self.audio,
            corpses: &mut self.corpses,
        }
    }
}

struct Harness {
    env: Env,
    windows: ContainerWindows,
    profile: Profile,
}

impl Harness {
    fn new() -> Self {
        let mut world = World::new();
        world.insert(Item::new(BACKPACK, 0x0E75));
        world.insert(Item::new(0x4000_0010, 0x0EED).inside(BACKPACK).at(60, 80));
        world.insert(Item::new(POUCH, 0x0E79).inside(BACKPACK).at(120, 100));
        world.insert(Item::new(BAG, 0x0E76).inside(BACKPACK).at(150, 90));
        world.insert(Item::new(0x4000_0020, 0x0E21).inside(POUCH).at(40, 50));
        world.insert(Item::new(CORPSE, 0x2006));

        Self {
            env: Env {
                world,
                definitions: ContainerDefinitions::builtin(),
                textures: TextureTable::new()
                    .with_gump(0x003C, 230, 204)
                    .with_gump(0x0050, 64, 48)
                    .with_gump(0x003D, 160, 140)
                    .with_gump(CORPSE_GRAPHIC, 140, 210)
                    .with_gump(EYE_BASE_GRAPHIC, 15, 11)
                    .with_gump(EYE_BASE_GRAPHIC + 1, 16, 9)
                    .with_art(0x0EED, 18, 12)
                    .with_art(0x0E21, 20, 16),
                screen: Viewport::new(1280, 1024),
                audio: SoundQueue::default(),
                corpses: CorpseOpenTracker::default(),
            },
            windows: ContainerWindows::new(),
            profile: Profile::default(),
        }
    }

    fn config(&self) -> RenderConfig {
        self.profile.render_config()
    }

    fn open(&mut self, serial: Serial, graphic: u16) -> OpenOutcome {
        let config = self.config();
        let request = OpenRequest {
            serial,
            graphic,
            play_sound: true,
            location: Point::new(100, 100),
        };
        self.windows.open(request, &mut self.env.ctx(), &config)
    }

    fn tick(&mut self, now_ms: f64) -> usize {
        let config = self.config();
        self.windows.update(now_ms, &mut self.env.ctx(), &config)
    }
}

#[test]
fn empty_auto_opened_corpse_is_hidden_until_looted_into() {
    let mut h = Harness::new();
    h.profile.skip_empty_corpse = true;
    h.env.corpses.mark_auto(CORPSE);

    assert_eq!(h.open(CORPSE, CORPSE_GRAPHIC), OpenOutcome::Opened);
    assert!(!h.windows.get(CORPSE).unwrap().chrome().is_visible());

    h.env.world.insert(Item::new(0x4000_0200, 0x0EED).inside(CORPSE).at(30, 100));
    h.windows.contents_changed(CORPSE);
    h.tick(16.0);

    let corpse = h.windows.get(CORPSE).unwrap();
    assert!(corpse.chrome().is_visible());
    assert_eq!(corpse.items().len(), 1);
}

#[test]
fn manually_opened_corpse_is_visible() {
    let mut h = Harness::new();
    h.profile.skip_empty_corpse = true;
    h.env.corpses.mark_auto(CORPSE);
    h.env.corpses.mark_manual(CORPSE);

    h.open(CORPSE, CORPSE_GRAPHIC);
    assert!(h.windows.get(CORPSE).unwrap().chrome().is_visible());
}

#[test]
fn minimize_and_restore_through_input() {
    let mut h = Harness::new();
    h.open(BACKPACK, 0x003C);
    let open_size = h.windows.get(BACKPACK).unwrap().chrome().size();

    let ctx = h.env.ctx();
    let widget = h.windows.get_mut(BACKPACK).unwrap();
    let minimizer = widget.hit_box().area;
    let inside = Point::new(minimizer.x + 1, minimizer.y + 1);

    assert!(widget.handle_mouse_up(inside, MouseButton::Left, &ctx));
    assert_eq!(widget.chrome().size(), Size::new(64, 48));
    assert!(widget.items().iter().all(|item| !item.visible));

    assert!(widget.handle_double_click(Point::new(5, 5), MouseButton::Left, &ctx));
    assert_eq!(widget.chrome().size(), open_size);
    assert!(widget.items().iter().all(|item| item.visible));
}

#[test]
fn closing_parent_closes_nested_windows() {
    let mut h = Harness::new();
    h.open(BACKPACK, 0x003C);
    h.open(POUCH, 0x003D);
    h.open(BAG, 0x003D);
    h.open(CORPSE, CORPSE_GRAPHIC);
    assert_eq!(h.windows.len(), 4);

    let config = h.config();
    assert!(h.windows.close(BACKPACK, &mut h.env.ctx(), &config));
    assert_eq!(h.env.audio.played().last(), Some(&0x0058));

    assert_eq!(h.windows.len(), 1);
    assert!(h.windows.contains(CORPSE));
}

#[test]
fn destroyed_container_takes_its_nested_windows_down() {
    let mut h = Harness::new();
    h.open(BACKPACK, 0x003C);
    h.open(POUCH, 0x003D);

    h.env.world.mark_destroyed(BACKPACK);
    assert_eq!(h.tick(16.0), 2);
    assert!(h.windows.is_empty());
    assert_eq!(h.tick(32.0), 0);
}

#[test]
fn window_follows_item_moved_between_containers() {
    let mut h = Harness::new();
    h.open(BACKPACK, 0x003C);
    h.open(POUCH, 0x003D);
    h.open(BAG, 0x003D);
    assert_eq!(h.windows.parent_of(BAG), Some(BACKPACK));

    h.env.world.move_item(BAG, Some(POUCH), Point::new(10, 10));
    h.tick(16.0);
    assert_eq!(h.windows.parent_of(BAG), Some(POUCH));
}

#[test]
fn remembered_location_survives_close_and_reopen() {
    let mut h = Harness::new();
    h.profile.override_container_location_setting = ContainerLocationPolicy::RememberEveryContainer;

    h.open(POUCH, 0x003D);
    let chrome = h.windows.get_mut(POUCH).unwrap().chrome_mut();
    chrome.begin_drag(Point::new(110, 110));
    chrome.drag_to(Point::new(510, 310));

    let config = h.config();
    let mut profile = h.profile.clone();
    assert_eq!(
        h.windows.end_drag(POUCH, &config, &mut profile),
        Some(Point::new(500, 300))
    );
    // override disabled: no dragged-centre record
    assert_eq!(profile.override_container_location_position, None);

    h.windows.dispose(POUCH, &h.env.world, &config);
    h.open(POUCH, 0x003D);
    assert_eq!(
        h.windows.get(POUCH).unwrap().chrome().location(),
        Point::new(500, 300)
    );
}

#[test]
fn session_round_trip_reopens_windows() {
    let mut h = Harness::new();
    h.open(BACKPACK, 0x003C);
    h.open(POUCH, 0x003D);
    {
        let ctx = h.env.ctx();
        h.windows.get_mut(BACKPACK).unwrap().set_minimized(true, &ctx);
    }

    let version = SchemaVersion::try_from(h.profile.gumps_version).unwrap();
    let mut binary = Vec::new();
    h.windows.save_binary(version, &mut binary).unwrap();
    let xml = String::from_utf8(h.windows.save_markup(Vec::new()).unwrap()).unwrap();
    assert!(xml.contains(r#"isminimized="True""#));

    let config = h.config();
    h.windows.dispose(BACKPACK, &h.env.world, &config);
    assert!(h.windows.is_empty());

    let mut scene = DeferredOpens::default();
    let mut restored = ContainerWindows::restore_binary(version, &mut binary.as_slice(), &mut scene).unwrap();
    restored.sort_unstable();
    assert_eq!(restored, vec![BACKPACK, POUCH]);

    let mut from_markup = ContainerWindows::restore_markup(&xml, &mut scene).unwrap();
    from_markup.sort_unstable();
    assert_eq!(from_markup, vec![BACKPACK, POUCH]);

    // Reopening goes through the regular open path; nothing is minimized.
    while let Some(serial) = scene.pop() {
        let graphic = if serial == BACKPACK { 0x003C } else { 0x003D };
        h.open(serial, graphic);
    }
    assert_eq!(h.windows.len(), 2);
    assert!(!h.windows.get(BACKPACK).unwrap().is_minimized());
    assert_eq!(h.windows.parent_of(POUCH), Some(BACKPACK));
}

#[test]
fn profile_from_toml_drives_layout() {
    let mut h = Harness::new();
    h.profile = toml::from_str(
        r#"
        container_scale = 150
        scale_items_inside_containers = true
        "#,
    )
    .unwrap();

    h.open(BACKPACK, 0x003C);
    let widget = h.windows.get(BACKPACK).unwrap();
    assert_eq!(widget.chrome().size(), Size::new(345, 306));

    let dagger = &widget.items()[0];
    assert_eq!(dagger.position, Point::new(90, 120));
    assert_eq!(dagger.size, Size::new(27, 18));
}
