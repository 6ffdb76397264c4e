use inflections::Inflect;

use crate::models::giveaway::EndAutomation;

/// What the scheduler does to a giveaway once its end date has passed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EndActions {
    /// Set `ended` and lock entries.
    pub end: bool,
    /// Run the winner selection engine.
    pub roll: bool,
    /// Publish the winners and DM them.
    pub announce: bool,
}

impl EndAutomation {
    pub fn actions(self) -> EndActions {
        EndActions {
            end: self >= EndAutomation::End,
            roll: self >= EndAutomation::Roll,
            announce: self >= EndAutomation::Announce,
        }
    }

    /// Host-facing name, e.g. "Announce".
    pub fn label(self) -> String {
        self.to_string().to_title_case()
    }

    pub fn describe(self) -> &'static str {
        match self {
            EndAutomation::None => "nothing happens automatically, you will only be notified",
            EndAutomation::End => "entries are closed automatically",
            EndAutomation::Roll => "entries are closed and winners are drawn automatically",
            EndAutomation::Announce => {
                "entries are closed, winners are drawn, announced and messaged automatically"
            }
        }
    }
}
