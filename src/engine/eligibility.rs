use std::collections::{HashMap, HashSet};

use time::OffsetDateTime;

/// What the guild roster knows about one member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemberProfile {
    pub user_id: i64,
    pub role_ids: HashSet<i64>,
    pub account_created_at: OffsetDateTime,
}

/// Entrants that are still members, hold every required role, and whose
/// account is at least `minimum_account_age` old at `now`.
pub fn filter_eligible(
    entries: &HashSet<i64>,
    roster: &[MemberProfile],
    required_roles: &HashSet<i64>,
    minimum_account_age: Option<time::Duration>,
    now: OffsetDateTime,
) -> HashSet<i64> {
    let roster = roster
        .iter()
        .map(|member| (member.user_id, member))
        .collect::<HashMap<_, _>>();
    let minimum_account_age = minimum_account_age.filter(|age| age.is_positive());

    entries
        .iter()
        .copied()
        .filter(|user_id| {
            let Some(member) = roster.get(user_id) else {
                return false;
            };
            if !required_roles.is_subset(&member.role_ids) {
                return false;
            }
            match minimum_account_age {
                Some(age) => now - member.account_created_at >= age,
                None => true,
            }
        })
        .collect()
}
