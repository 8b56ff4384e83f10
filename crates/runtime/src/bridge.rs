//! Commands and inputs exchanged with the spatial picking surface.
//!
//! The engine owns "what is currently selectable/droppable" and publishes it
//! as [`BridgeCommand`]s on the `Bridge` topic. The surface owns "what was
//! just clicked/dragged" and reports it as [`BridgeInput`]s through
//! [`crate::SessionController::bridge_input`], the same mutation path as
//! button-driven input.

use serde::{Deserialize, Serialize};

use action_core::{Choice, ElementRef};

/// Outbound instruction for the picking surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeCommand {
    /// Elements that may currently be clicked to answer the prompt.
    SetValidElements { elements: Vec<ElementRef> },
    /// The element the player may pick up and drag, if any.
    SetDraggableSelectedElement { element: Option<ElementRef> },
    /// Elements that accept a drop for the current selection.
    SetDropTargets { targets: Vec<ElementRef> },
    /// Highlight for the choice the pointer is hovering, if any.
    SetHoveredChoice { choice: Option<Choice> },
    /// Release all selection/highlight state.
    ClearAll,
}

/// Inbound notification from the picking surface.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BridgeInput {
    /// The player clicked one of the valid elements.
    ElementClicked { element: ElementRef },
    /// The player dragged an element onto a drop target.
    DragDropped {
        element: ElementRef,
        target: ElementRef,
    },
}
