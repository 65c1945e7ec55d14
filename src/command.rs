//! Workflow Commands - Drop / Move / Delete / Validate Requests
//!
//! The request surface an editor front end sends to the core, in JSON form.

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::catalog::PieceCatalog;
use crate::geometry::{Point, Position};
use crate::validation::ValidationReport;
use crate::workflow::{ensure_finite, InstanceId, Workflow, WorkflowError};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum WorkflowCommand {
    #[serde(rename_all = "camelCase")]
    Drop { piece_type: String, x: f64, y: f64 },
    #[serde(rename_all = "camelCase")]
    Move { instance_id: InstanceId, x: f64, y: f64 },
    Delete { target: DeleteTarget },
    Validate,
}

/// `"all"` or a single instance id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteTarget {
    All,
    Instance(InstanceId),
}

impl Serialize for DeleteTarget {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            DeleteTarget::All => serializer.serialize_str("all"),
            DeleteTarget::Instance(id) => serializer.serialize_str(id.as_str()),
        }
    }
}

impl<'de> Deserialize<'de> for DeleteTarget {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        Ok(if raw == "all" {
            DeleteTarget::All
        } else {
            DeleteTarget::Instance(InstanceId::from(raw))
        })
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum CommandOutcome {
    #[serde(rename_all = "camelCase")]
    Placed { instance_id: InstanceId, position: Position },
    Moved { position: Option<Position> },
    Removed { count: usize },
    Validated { report: ValidationReport },
}

impl Workflow {
    /// Apply one external request. Unknown piece types and non-finite
    /// coordinates are errors; unknown instance ids are not.
    pub fn apply(
        &mut self,
        catalog: &PieceCatalog,
        command: WorkflowCommand,
    ) -> Result<CommandOutcome, WorkflowError> {
        match command {
            WorkflowCommand::Drop { piece_type, x, y } => {
                let placed = self.drop_piece(catalog, &piece_type, Point::new(x, y))?;
                Ok(CommandOutcome::Placed {
                    instance_id: placed.instance_id.clone(),
                    position: placed.position,
                })
            }
            WorkflowCommand::Move { instance_id, x, y } => {
                let raw = ensure_finite(Point::new(x, y))?;
                Ok(CommandOutcome::Moved {
                    position: self.move_piece(&instance_id, raw),
                })
            }
            WorkflowCommand::Delete { target } => {
                let count = match target {
                    DeleteTarget::All => self.remove_all(),
                    DeleteTarget::Instance(id) => usize::from(self.remove(&id)),
                };
                Ok(CommandOutcome::Removed { count })
            }
            WorkflowCommand::Validate => Ok(CommandOutcome::Validated {
                report: ValidationReport::build(self.pieces(), catalog),
            }),
        }
    }
}
