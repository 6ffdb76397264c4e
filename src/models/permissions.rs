#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, strum::EnumIter, strum::Display, strum::EnumString,
)]
pub enum Permission {
    #[strum(serialize = "giveaway.create")]
    GiveawayCreate,
    #[strum(serialize = "giveaway.edit")]
    GiveawayEdit,
    #[strum(serialize = "giveaway.end")]
    GiveawayEnd,
    #[strum(serialize = "giveaway.roll")]
    GiveawayRoll,
    #[strum(serialize = "giveaway.reroll")]
    GiveawayReroll,
    #[strum(serialize = "giveaway.announce")]
    GiveawayAnnounce,
    #[strum(serialize = "giveaway.delete")]
    GiveawayDelete,
}
