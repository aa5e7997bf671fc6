use eframe::egui;
use log::warn;
use tracing_subscriber::filter::LevelFilter;

use containerview::assets::TextureTable;
use containerview::config::Profile;
use containerview::context::{CorpseOpenTracker, DeferredOpens, GumpContext, SoundQueue};
use containerview::definitions::ContainerDefinitions;
use containerview::eye::{CORPSE_GRAPHIC, EYE_BASE_GRAPHIC};
use containerview::gump::ContainerWidget;
use containerview::scale::{Point, Rect};
use containerview::window::{MouseButton, Viewport};
use containerview::windows::{ContainerWindows, OpenRequest};
use containerview::world::{Item, Serial, StorageDirectory, World};

const BACKPACK: Serial = 0x4000_0001;
const POUCH: Serial = 0x4000_0002;
const CORPSE: Serial = 0x4000_0100;

const BACKPACK_ITEM: u16 = 0x0E75;
const POUCH_ITEM: u16 = 0x0E79;
const CORPSE_ITEM: u16 = 0x2006;

// Art sprites dropped into containers
const LOOT: &[u16] = &[0x0EED, 0x0F3F, 0x0E21, 0x0F0E, 0x13F6];

fn main() -> Result<(), eframe::Error> {
    // RUST_LOG picks the level; the library's `log` records are forwarded
    let level = std::env::var("RUST_LOG")
        .ok()
        .and_then(|value| value.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::INFO);
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .init();

    let options = eframe::NativeOptions {
        viewport: egui::ViewportBuilder::default()
            .with_inner_size([1200.0, 800.0])
            .with_title("Container View"),
        ..Default::default()
    };

    eframe::run_native(
        "containerview",
        options,
        Box::new(|_cc| Box::new(ContainerViewApp::default())),
    )
}

/// Container gump drawn for an item graphic, if the item is a container.
fn container_gump(item_graphic: u16) -> Option<u16> {
    match item_graphic {
        BACKPACK_ITEM => Some(0x003C),
        POUCH_ITEM => Some(0x003D),
        CORPSE_ITEM => Some(CORPSE_GRAPHIC),
        _ => None,
    }
}

fn demo_textures() -> TextureTable {
    let mut textures = TextureTable::new()
        .with_gump(0x003C, 230, 204)
        .with_gump(0x0050, 64, 48)
        .with_gump(0x003D, 160, 140)
        .with_gump(CORPSE_GRAPHIC, 140, 210)
        .with_gump(EYE_BASE_GRAPHIC, 15, 11)
        .with_gump(EYE_BASE_GRAPHIC + 1, 16, 9)
        .with_art(POUCH_ITEM, 24, 20);
    for (i, &art) in LOOT.iter().enumerate() {
        textures = textures.with_art(art, 14 + 4 * i as i32, 12 + 3 * i as i32);
    }
    textures
}

fn demo_world() -> World {
    let mut world = World::new();
    world.insert(Item::new(BACKPACK, BACKPACK_ITEM));
    world.insert(Item::new(0x4000_0010, 0x0EED).inside(BACKPACK).at(60, 80));
    world.insert(Item::new(0x4000_0011, 0x0F3F).inside(BACKPACK).at(400, 20));
    world.insert(Item::new(POUCH, POUCH_ITEM).inside(BACKPACK).at(120, 100));
    world.insert(Item::new(0x4000_0020, 0x0E21).inside(POUCH).at(40, 50));
    world.insert(Item::new(CORPSE, CORPSE_ITEM));
    world
}

/// World and collaborators the windows are built against.
struct Session {
    world: World,
    definitions: ContainerDefinitions,
    textures: TextureTable,
    screen: Viewport,
    audio: SoundQueue,
    corpses: CorpseOpenTracker,
}

impl Session {
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

struct ContainerViewApp {
    session: Session,
    windows: ContainerWindows,
    profile: Profile,
    scene: DeferredOpens,
    saved_layout: Option<String>,
    dragging: Option<Serial>,
    next_serial: Serial,
    recent_sounds: Vec<u16>,
}

impl Default for ContainerViewApp {
    fn default() -> Self {
        Self {
            session: Session {
                world: demo_world(),
                definitions: ContainerDefinitions::builtin(),
                textures: demo_textures(),
                screen: Viewport::new(900, 760),
                audio: SoundQueue::default(),
                corpses: CorpseOpenTracker::default(),
            },
            windows: ContainerWindows::new(),
            profile: Profile::default(),
            scene: DeferredOpens::default(),
            saved_layout: None,
            dragging: None,
            next_serial: 0x4000_1000,
            recent_sounds: Vec::new(),
        }
    }
}

impl ContainerViewApp {
    fn open(&mut self, serial: Serial, location: Point) {
        let Some(graphic) = self
            .session
            .world
            .item(serial)
            .and_then(|item| container_gump(item.graphic))
        else {
            return;
        };

        let config = self.profile.render_config();
        let request = OpenRequest {
            serial,
            graphic,
            play_sound: true,
            location,
        };
        self.windows.open(request, &mut self.session.ctx(), &config);
    }

    fn drop_loot(&mut self, container: Serial) {
        let serial = self.next_serial;
        self.next_serial += 1;

        let art = LOOT[serial as usize % LOOT.len()];
        let offset = (serial % 9) as i32 * 17;
        self.session
            .world
            .insert(Item::new(serial, art).inside(container).at(30 + offset, 60 + offset));
        self.windows.contents_changed(container);
    }

    fn take_first(&mut self, container: Serial) {
        let first = self
            .session
            .world
            .contents(container)
            .find(|item| item.lootable)
            .map(|item| item.serial);

        if let Some(serial) = first {
            self.session.world.remove(serial);
            self.windows.contents_changed(container);
        }
    }

    fn save_layout(&mut self) {
        match self.windows.save_markup(Vec::new()) {
            Ok(bytes) => self.saved_layout = String::from_utf8(bytes).ok(),
            Err(err) => warn!("Saving layout failed: {}", err),
        }
    }

    fn restore_layout(&mut self) {
        let Some(xml) = self.saved_layout.clone() else {
            return;
        };
        if let Err(err) = ContainerWindows::restore_markup(&xml, &mut self.scene) {
            warn!("Restoring layout failed: {}", err);
        }
    }

    fn controls(&mut self, ui: &mut egui::Ui) {
        ui.heading("Containers");
        ui.separator();

        if ui.button("Open backpack").clicked() {
            self.open(BACKPACK, Point::new(40, 40));
        }
        if ui.button("Open corpse (manual)").clicked() {
            self.session.corpses.mark_manual(CORPSE);
            self.open(CORPSE, Point::new(420, 60));
        }
        if ui.button("Open corpse (auto)").clicked() {
            self.session.corpses.mark_auto(CORPSE);
            self.open(CORPSE, Point::new(420, 60));
        }

        ui.separator();
        ui.label("Contents");
        if ui.button("Drop loot in backpack").clicked() {
            self.drop_loot(BACKPACK);
        }
        if ui.button("Drop loot in pouch").clicked() {
            self.drop_loot(POUCH);
        }
        if ui.button("Drop loot on corpse").clicked() {
            self.drop_loot(CORPSE);
        }
        if ui.button("Loot corpse").clicked() {
            self.take_first(CORPSE);
        }
        if ui.button("Destroy pouch").clicked() {
            self.session.world.mark_destroyed(POUCH);
        }
        if ui.button("Destroy corpse").clicked() {
            self.session.world.remove(CORPSE);
        }

        ui.separator();
        ui.label("Settings");
        ui.add(egui::Slider::new(&mut self.profile.container_scale, 50..=200).text("Scale %"));
        ui.checkbox(&mut self.profile.scale_items_inside_containers, "Scale items");
        ui.checkbox(&mut self.profile.skip_empty_corpse, "Skip empty corpse");

        ui.separator();
        ui.label("Layout");
        ui.horizontal(|ui| {
            if ui.button("Save").clicked() {
                self.save_layout();
            }
            if ui.button("Restore").clicked() {
                self.restore_layout();
            }
        });

        ui.separator();
        ui.label(format!("Open windows: {}", self.windows.len()));
        if let Some(position) = self.profile.override_container_location_position {
            ui.label(format!("Last drag centre: {}, {}", position.x, position.y));
        }
        if !self.recent_sounds.is_empty() {
            let sounds: Vec<String> = self.recent_sounds.iter().map(|s| format!("{:#06X}", s)).collect();
            ui.label(format!("Sounds: {}", sounds.join(" ")));
        }
    }

    fn interact(&mut self, ui: &mut egui::Ui, origin: egui::Pos2) {
        let pointer = ui.ctx().pointer_hover_pos().map(|p| to_point(p, origin));
        let target = self
            .dragging
            .or_else(|| pointer.and_then(|p| self.windows.window_at(p)));

        let Some(serial) = target else {
            return;
        };
        let Some(bounds) = self.windows.get(serial).map(|w| w.chrome().bounds()) else {
            self.dragging = None;
            return;
        };

        let rect = to_egui_rect(origin, bounds.origin(), bounds.width, bounds.height);
        let response = ui.interact(rect, ui.id().with(serial), egui::Sense::click_and_drag());
        let Some(mouse) = response.interact_pointer_pos().map(|p| to_point(p, origin)).or(pointer) else {
            return;
        };

        if response.drag_started() {
            if let Some(widget) = self.windows.get_mut(serial) {
                if widget.chrome_mut().begin_drag(mouse) {
                    self.dragging = Some(serial);
                }
            }
        }
        if response.dragged() {
            if let Some(widget) = self.windows.get_mut(serial) {
                widget.chrome_mut().drag_to(mouse);
            }
        }
        if response.drag_released() {
            let config = self.profile.render_config();
            self.windows.end_drag(serial, &config, &mut self.profile);
            self.dragging = None;
        }

        let ctx = self.session.ctx();
        if response.clicked() {
            if let Some(widget) = self.windows.get_mut(serial) {
                let local = widget.chrome().to_local(mouse);
                widget.handle_mouse_up(local, MouseButton::Left, &ctx);
            }
        }

        if response.double_clicked() {
            let mut open_nested = None;
            if let Some(widget) = self.windows.get_mut(serial) {
                let local = widget.chrome().to_local(mouse);
                if !widget.handle_double_click(local, MouseButton::Left, &ctx) {
                    open_nested = item_at(widget, local);
                }
            }
            if let Some(nested) = open_nested {
                self.open(nested, mouse.offset(16, 16));
            }
        }

        if response.secondary_clicked() {
            let config = self.profile.render_config();
            self.windows.close(serial, &mut self.session.ctx(), &config);
        }
    }

    fn draw(&self, painter: &egui::Painter, origin: egui::Pos2) {
        for widget in self.windows.iter() {
            if !widget.chrome().is_visible() {
                continue;
            }

            let location = widget.chrome().location();
            let size = widget.chrome().size();
            let frame = to_egui_rect(origin, location, size.width, size.height);
            let fill = if widget.is_corpse() {
                egui::Color32::from_rgb(70, 52, 48)
            } else {
                egui::Color32::from_rgb(92, 70, 42)
            };
            painter.rect(frame, 6.0, fill, egui::Stroke::new(1.0, egui::Color32::from_gray(20)));

            let hit_box = widget.hit_box().area;
            painter.rect_stroke(
                to_egui_rect(frame.min, hit_box.origin(), hit_box.width, hit_box.height),
                2.0,
                egui::Stroke::new(1.0, egui::Color32::from_rgb(220, 200, 120)),
            );

            for item in widget.items().iter().filter(|item| item.visible) {
                let rect = to_egui_rect(frame.min, item.position, item.size.width.max(4), item.size.height.max(4));
                painter.rect(rect, 2.0, egui::Color32::from_rgb(150, 170, 190), egui::Stroke::NONE);
            }

            if let Some(eye) = widget.eye().filter(|eye| eye.visible) {
                let rect = to_egui_rect(frame.min, eye.position, eye.size.width, eye.size.height);
                let color = if eye.graphic == EYE_BASE_GRAPHIC {
                    egui::Color32::from_rgb(200, 40, 40)
                } else {
                    egui::Color32::from_rgb(90, 20, 20)
                };
                painter.rect(rect, 4.0, color, egui::Stroke::NONE);
            }

            if !widget.is_minimized() {
                painter.text(
                    frame.left_top() + egui::vec2(6.0, 4.0),
                    egui::Align2::LEFT_TOP,
                    format!("{:#010X}", widget.serial()),
                    egui::FontId::monospace(10.0),
                    egui::Color32::from_gray(220),
                );
            }
        }
    }
}

impl eframe::App for ContainerViewApp {
    fn update(&mut self, ctx: &egui::Context, _frame: &mut eframe::Frame) {
        egui::SidePanel::left("controls").show(ctx, |ui| {
            self.controls(ui);
        });

        egui::CentralPanel::default().show(ctx, |ui| {
            let area = ui.available_rect_before_wrap();
            self.session.screen = Viewport::new(area.width() as i32, area.height() as i32);

            while let Some(serial) = self.scene.pop() {
                self.open(serial, Point::new(40, 40));
            }

            let now_ms = ctx.input(|i| i.time) * 1000.0;
            let config = self.profile.render_config();
            self.windows.update(now_ms, &mut self.session.ctx(), &config);

            for sound in self.session.audio.drain() {
                self.recent_sounds.push(sound);
            }
            let overflow = self.recent_sounds.len().saturating_sub(8);
            self.recent_sounds.drain(..overflow);

            self.interact(ui, area.min);
            self.draw(ui.painter(), area.min);
        });

        ctx.request_repaint_after(std::time::Duration::from_millis(50));
    }
}

fn item_at(widget: &ContainerWidget, local: Point) -> Option<Serial> {
    widget
        .items()
        .iter()
        .rev()
        .find(|item| Rect::from_origin_size(item.position, item.size).contains(local))
        .map(|item| item.serial)
}

fn to_point(pos: egui::Pos2, origin: egui::Pos2) -> Point {
    Point::new((pos.x - origin.x) as i32, (pos.y - origin.y) as i32)
}

fn to_egui_rect(origin: egui::Pos2, at: Point, width: i32, height: i32) -> egui::Rect {
    egui::Rect::from_min_size(
        origin + egui::vec2(at.x as f32, at.y as f32),
        egui::vec2(width as f32, height as f32),
    )
}
