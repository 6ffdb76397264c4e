const PREFIX: &str = "giveaway";

/// A button press on one of the giveaway messages, decoded from its custom id.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComponentAction {
    Enter { giveaway_id: i64 },
    /// Moves the end date by a signed number of milliseconds.
    Extend { giveaway_id: i64, offset_ms: i64 },
}

impl ComponentAction {
    /// Returns `None` for anything that is not a well formed giveaway button.
    pub fn parse(custom_id: &str) -> Option<ComponentAction> {
        let mut parts = custom_id.split(':');
        if parts.next()? != PREFIX {
            return None;
        }

        let action = parts.next()?;
        let giveaway_id = parts.next()?.parse::<i64>().ok()?;

        let parsed = match action {
            "enter" => ComponentAction::Enter { giveaway_id },
            "extend" => ComponentAction::Extend {
                giveaway_id,
                offset_ms: parts.next()?.parse::<i64>().ok()?,
            },
            _ => return None,
        };

        match parts.next() {
            Some(_) => None,
            None => Some(parsed),
        }
    }

    pub fn custom_id(&self) -> String {
        match self {
            ComponentAction::Enter { giveaway_id } => format!("{PREFIX}:enter:{giveaway_id}"),
            ComponentAction::Extend {
                giveaway_id,
                offset_ms,
            } => format!("{PREFIX}:extend:{giveaway_id}:{offset_ms}"),
        }
    }

    pub fn giveaway_id(&self) -> i64 {
        match self {
            ComponentAction::Enter { giveaway_id }
            | ComponentAction::Extend { giveaway_id, .. } => *giveaway_id,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_each_button() {
        assert_eq!(
            ComponentAction::parse("giveaway:enter:12"),
            Some(ComponentAction::Enter { giveaway_id: 12 })
        );
        assert_eq!(
            ComponentAction::parse("giveaway:extend:7:-3600000"),
            Some(ComponentAction::Extend {
                giveaway_id: 7,
                offset_ms: -3_600_000
            })
        );
    }

    #[test]
    fn offsets_are_plain_integers_only() {
        assert_eq!(ComponentAction::parse("giveaway:extend:7:60*60*1000"), None);
        assert_eq!(ComponentAction::parse("giveaway:extend:7:1e6"), None);
        assert_eq!(ComponentAction::parse("giveaway:extend:7"), None);
    }

    #[test]
    fn rejects_foreign_and_malformed_ids() {
        assert_eq!(ComponentAction::parse("enter"), None);
        assert_eq!(ComponentAction::parse("poll:enter:1"), None);
        assert_eq!(ComponentAction::parse("giveaway:enter:abc"), None);
        assert_eq!(ComponentAction::parse("giveaway:enter:1:2"), None);
        assert_eq!(ComponentAction::parse("giveaway:leave:1"), None);
        assert_eq!(ComponentAction::parse("giveaway:accept:1"), None);
    }

    #[test]
    fn custom_ids_parse_back() {
        let action = ComponentAction::Extend {
            giveaway_id: 42,
            offset_ms: 86_400_000,
        };
        assert_eq!(ComponentAction::parse(&action.custom_id()), Some(action));
        assert_eq!(action.giveaway_id(), 42);
    }
}
