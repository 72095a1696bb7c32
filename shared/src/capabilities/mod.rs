mod frames;
mod inventory;
mod layout;
mod navigation;

pub use self::frames::{FrameOperation, FrameOutput, Frames};
pub use self::inventory::{Inventory, InventoryOperation, InventoryOutput};
pub use self::layout::{Layout, LayoutOperation, LayoutOutput};
pub use self::navigation::{Navigation, NavigationOperation, Route};

pub use crux_core::render::Render;

#[allow(unused_imports)]
use crate::app::App;
use crate::event::Event;

#[derive(crux_core::macros::Effect)]
pub struct Capabilities {
    pub render: Render<Event>,
    pub layout: Layout<Event>,
    pub frames: Frames<Event>,
    pub inventory: Inventory<Event>,
    pub navigation: Navigation<Event>,
}
