use moss_driver::{Advance, Computation, Progress};
use moss_types::{Instruction, ItemId, ItemState};
use serde_json::Value;

use crate::error::TodoError;
use crate::remote::{RemoteContext, Reply};

/// Apply one batch of instructions to the remote document and finish with the
/// service's status.
///
/// Remote failures are not recovered from.
#[derive(Debug)]
pub struct EditItem {
    remote: RemoteContext,
    instructions: Vec<Instruction>,
}

impl EditItem {
    #[must_use]
    pub fn new(remote: RemoteContext, instructions: Vec<Instruction>) -> Self {
        Self {
            remote,
            instructions,
        }
    }

    #[must_use]
    pub fn instructions(&self) -> &[Instruction] {
        &self.instructions
    }
}

impl Computation for EditItem {
    type Value = Reply;
    type Output = String;
    type Error = TodoError;

    fn start(&mut self) -> Advance<Self> {
        let instructions = std::mem::take(&mut self.instructions);
        Ok(Progress::wait(self.remote.apply_instructions(instructions)))
    }

    fn resume(&mut self, reply: Reply) -> Advance<Self> {
        Ok(Progress::Finished(reply.into_status()?))
    }
}

/// Set the item's text. An empty value is stored as a single space.
#[must_use]
pub fn update_item_value(remote: RemoteContext, id: &ItemId, value: &str) -> EditItem {
    let value = if value.is_empty() { " " } else { value };
    EditItem::new(
        remote,
        vec![Instruction::Set {
            key: id.field_key("value"),
            value: Value::String(value.to_string()),
        }],
    )
}

#[must_use]
pub fn toggle_done(remote: RemoteContext, id: &ItemId) -> EditItem {
    EditItem::new(
        remote,
        vec![Instruction::Toggle {
            key: id.field_key("isDone"),
        }],
    )
}

#[must_use]
pub fn set_item_state(remote: RemoteContext, id: &ItemId, state: ItemState) -> EditItem {
    EditItem::new(
        remote,
        vec![Instruction::Set {
            key: id.field_key("state"),
            value: Value::from(state.code()),
        }],
    )
}

#[must_use]
pub fn remove_item(remote: RemoteContext, id: &ItemId) -> EditItem {
    EditItem::new(
        remote,
        vec![Instruction::Unset {
            key: id.to_string(),
        }],
    )
}
