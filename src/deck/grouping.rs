use std::fmt::Display;

/// Display bucket for a deck entry, derived from its free-text type line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum BaseType {
    Creature,
    Planeswalker,
    Instant,
    Sorcery,
    Artifact,
    Enchantment,
    Land,
    Other,
}

impl BaseType {
    /// Matching priority, which is also the display order of the buckets.
    pub const PRIORITY: [BaseType; 7] = [
        BaseType::Creature,
        BaseType::Planeswalker,
        BaseType::Instant,
        BaseType::Sorcery,
        BaseType::Artifact,
        BaseType::Enchantment,
        BaseType::Land,
    ];

    /// First match wins, so an "Artifact Creature" is a creature.
    pub fn classify(card_type: &str) -> Self {
        BaseType::PRIORITY
            .into_iter()
            .find(|base| card_type.contains(base.label()))
            .unwrap_or(BaseType::Other)
    }

    pub fn label(&self) -> &'static str {
        match self {
            BaseType::Creature => "Creature",
            BaseType::Planeswalker => "Planeswalker",
            BaseType::Instant => "Instant",
            BaseType::Sorcery => "Sorcery",
            BaseType::Artifact => "Artifact",
            BaseType::Enchantment => "Enchantment",
            BaseType::Land => "Land",
            BaseType::Other => "Other",
        }
    }
}

impl Display for BaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.label())
    }
}

pub trait Groupable {
    fn base_type(&self) -> BaseType;
    fn sort_name(&self) -> &str;
}

#[derive(Debug, Clone, PartialEq)]
pub struct CardGroup<T> {
    pub base_type: BaseType,
    pub entries: Vec<T>,
}

/// Buckets `entries` by base type in priority order, names sorted within each bucket.
///
/// Empty buckets are left out. Name comparison is plain byte order, so case matters.
pub fn group_entries<T: Groupable>(entries: Vec<T>) -> Vec<CardGroup<T>> {
    let mut groups: Vec<CardGroup<T>> = Vec::new();
    for entry in entries {
        let base_type = entry.base_type();
        match groups.iter_mut().find(|g| g.base_type == base_type) {
            Some(group) => group.entries.push(entry),
            None => groups.push(CardGroup {
                base_type,
                entries: vec![entry],
            }),
        }
    }

    // Stable sort: buckets with the same rank keep their insertion order.
    groups.sort_by_key(|g| g.base_type);
    for group in &mut groups {
        group
            .entries
            .sort_by(|a, b| a.sort_name().cmp(b.sort_name()));
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[derive(Debug, Clone, PartialEq)]
    struct Row(&'static str, BaseType);

    impl Groupable for Row {
        fn base_type(&self) -> BaseType {
            self.1
        }

        fn sort_name(&self) -> &str {
            self.0
        }
    }

    #[test]
    fn test_classify_first_match_wins() {
        assert_eq!(BaseType::classify("Artifact Creature — Golem"), BaseType::Creature);
        assert_eq!(BaseType::classify("Legendary Planeswalker — Jace"), BaseType::Planeswalker);
        assert_eq!(BaseType::classify("Basic Land — Island"), BaseType::Land);
        assert_eq!(BaseType::classify("Enchantment — Aura"), BaseType::Enchantment);
        assert_eq!(BaseType::classify("Tribal Sorcery"), BaseType::Sorcery);
        assert_eq!(BaseType::classify("Battle — Siege"), BaseType::Other);
        assert_eq!(BaseType::classify(""), BaseType::Other);
    }

    #[test]
    fn test_group_order_and_name_sorting() {
        let groups = group_entries(vec![
            Row("Swamp", BaseType::Land),
            Row("Zombie", BaseType::Creature),
            Row("Mystery", BaseType::Other),
            Row("Elf", BaseType::Creature),
            Row("bolt", BaseType::Instant),
            Row("Abrade", BaseType::Instant),
        ]);

        let order: Vec<BaseType> = groups.iter().map(|g| g.base_type).collect();
        assert_eq!(
            order,
            vec![BaseType::Creature, BaseType::Instant, BaseType::Land, BaseType::Other]
        );
        assert_eq!(
            groups[0].entries,
            vec![Row("Elf", BaseType::Creature), Row("Zombie", BaseType::Creature)]
        );
        // Uppercase sorts before lowercase.
        assert_eq!(groups[1].entries[0].0, "Abrade");
    }

    #[test]
    fn test_empty_deck_has_no_groups() {
        assert!(group_entries::<Row>(Vec::new()).is_empty());
    }

    fn any_base_type() -> impl Strategy<Value = BaseType> {
        prop_oneof![
            Just(BaseType::Creature),
            Just(BaseType::Planeswalker),
            Just(BaseType::Instant),
            Just(BaseType::Sorcery),
            Just(BaseType::Artifact),
            Just(BaseType::Enchantment),
            Just(BaseType::Land),
            Just(BaseType::Other),
        ]
    }

    proptest! {
        #[test]
        fn prop_buckets_follow_fixed_order(types in prop::collection::vec(any_base_type(), 0..40)) {
            let rows: Vec<Row> = types.iter().map(|t| Row("card", *t)).collect();
            let groups = group_entries(rows);

            let order: Vec<BaseType> = groups.iter().map(|g| g.base_type).collect();
            let mut expected: Vec<BaseType> = BaseType::PRIORITY
                .into_iter()
                .chain(std::iter::once(BaseType::Other))
                .filter(|t| types.contains(t))
                .collect();
            expected.dedup();
            prop_assert_eq!(order, expected);
            prop_assert_eq!(groups.iter().map(|g| g.entries.len()).sum::<usize>(), types.len());
        }
    }
}
