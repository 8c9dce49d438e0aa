// UI module - GUI logic and event loop bridge
//
// This module contains:
// - EventLoopBridge: Coordinates between tokio async runtime and Slint event loop
// - GuiController: Wires the table window to the StateManager

pub mod bridge;
pub mod controller;

pub use bridge::{EventLoopBridge, EventLoopBridgeHandle};
pub use controller::GuiController;
