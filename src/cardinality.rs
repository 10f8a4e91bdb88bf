use std::fmt;

/// Required number of tree matches for one field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Cardinality {
    /// exactly this many matches
    Exactly(u32),
    /// zero or more; no match leaves the field unset
    NotSpecified,
    /// one or more
    MoreThanZero,
}

impl Cardinality {
    pub const OPTIONAL: Self = Self::NotSpecified;
    pub const MANDATORY: Self = Self::MoreThanZero;

    pub const fn exactly(count: u32) -> Self {
        Self::Exactly(count)
    }

    /// True only for exact counts.
    pub const fn is_certain(&self) -> bool {
        matches!(self, Self::Exactly(_))
    }

    pub const fn is_optional(&self) -> bool {
        matches!(self, Self::NotSpecified)
    }

    /// Whether `actual` matches satisfy this requirement.
    pub fn admits(&self, actual: usize) -> bool {
        match *self {
            Self::Exactly(count) => actual == count as usize,
            Self::NotSpecified => true,
            Self::MoreThanZero => actual >= 1,
        }
    }
}

impl Default for Cardinality {
    fn default() -> Self {
        Self::MoreThanZero
    }
}

impl From<u32> for Cardinality {
    fn from(count: u32) -> Self {
        Self::Exactly(count)
    }
}

impl fmt::Display for Cardinality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Exactly(count) => write!(f, "{count}"),
            Self::NotSpecified => f.write_str("not specified"),
            Self::MoreThanZero => f.write_str("more than 0"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_exact_counts_are_certain() {
        assert!(Cardinality::exactly(0).is_certain());
        assert!(Cardinality::exactly(3).is_certain());
        assert!(!Cardinality::NotSpecified.is_certain());
        assert!(!Cardinality::MoreThanZero.is_certain());
    }

    #[test]
    fn renders_sentinels_and_counts() {
        assert_eq!(Cardinality::NotSpecified.to_string(), "not specified");
        assert_eq!(Cardinality::MoreThanZero.to_string(), "more than 0");
        assert_eq!(Cardinality::exactly(2).to_string(), "2");
    }

    #[test]
    fn admits_follows_the_requirement() {
        let two = Cardinality::exactly(2);
        assert!(!two.admits(1));
        assert!(two.admits(2));
        assert!(!two.admits(3));

        assert!(Cardinality::OPTIONAL.admits(0));
        assert!(Cardinality::OPTIONAL.admits(5));

        assert!(!Cardinality::MANDATORY.admits(0));
        assert!(Cardinality::MANDATORY.admits(1));
        assert!(Cardinality::MANDATORY.admits(9));
    }

    #[test]
    fn default_is_mandatory() {
        assert_eq!(Cardinality::default(), Cardinality::MoreThanZero);
    }
}
