pub mod model;
pub mod room;
pub mod world;

pub use model::{
    Actor, CharacterPresence, Conversant, Conversation, Exit, Inventory, InventoryFull, Item,
    MoveError, Visibility, Visible, WorldError, INVENTORY_CAPACITY,
};
pub use room::Room;
pub use world::{MoveOutcome, World};
