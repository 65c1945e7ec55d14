//! Drag gestures as explicit begin / move / end messages.

use crate::geometry::{Point, Position};
use crate::workflow::{InstanceId, Workflow};

/// An in-progress drag of one placed piece.
///
/// Holds no borrow of the workflow between messages, so pieces may be
/// removed mid-drag; later updates then do nothing.
#[derive(Debug, Clone, PartialEq)]
pub struct DragGesture {
    instance_id: InstanceId,
    grab_offset: Point,
}

impl DragGesture {
    /// Start dragging `instance_id`, grabbed at `pointer`.
    pub fn begin(workflow: &Workflow, instance_id: &InstanceId, pointer: Point) -> Option<Self> {
        let piece = workflow.get(instance_id)?;
        let origin = Point::from(piece.position);
        Some(Self {
            instance_id: instance_id.clone(),
            grab_offset: Point::new(pointer.x - origin.x, pointer.y - origin.y),
        })
    }

    pub fn instance_id(&self) -> &InstanceId {
        &self.instance_id
    }

    pub fn update(&self, workflow: &mut Workflow, pointer: Point) -> Option<Position> {
        let raw = Point::new(pointer.x - self.grab_offset.x, pointer.y - self.grab_offset.y);
        workflow.move_piece(&self.instance_id, raw)
    }

    /// Final resting position, if the piece survived the drag.
    pub fn end(self, workflow: &Workflow) -> Option<Position> {
        workflow.get(&self.instance_id).map(|p| p.position)
    }
}
