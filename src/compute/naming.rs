//! Unique resource names derived from a group.

use uuid::Uuid;

const SUFFIX_LEN: usize = 8;

/// Produces names that encode a group and can be parsed back.
pub trait NamingConvention: Send + Sync {
    /// Returns a fresh candidate name for `group`. Successive calls should
    /// return different names.
    fn unique_name_for_group(&self, group: &str) -> String;

    /// Recovers the group from a name produced by this convention.
    fn group_in_unique_name(&self, name: &str) -> Option<String>;
}

/// `<group>-<8 hex chars>` names with a random suffix.
#[derive(Clone, Copy, Debug, Default)]
pub struct RandomSuffixNaming;

impl NamingConvention for RandomSuffixNaming {
    fn unique_name_for_group(&self, group: &str) -> String {
        let suffix: String = Uuid::new_v4()
            .simple()
            .to_string()
            .chars()
            .take(SUFFIX_LEN)
            .collect();
        format!("{group}-{suffix}")
    }

    fn group_in_unique_name(&self, name: &str) -> Option<String> {
        let (group, suffix) = name.rsplit_once('-')?;
        let is_suffix =
            suffix.len() == SUFFIX_LEN && suffix.chars().all(|ch| ch.is_ascii_hexdigit());
        (is_suffix && !group.is_empty()).then(|| group.to_owned())
    }
}
