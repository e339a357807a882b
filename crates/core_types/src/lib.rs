use std::fmt;

/// Identifier of an element in the host document.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ElementId(pub u32);

impl fmt::Display for ElementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SpinDirection {
    Up,
    Down,
}

impl SpinDirection {
    pub fn as_str(self) -> &'static str {
        match self {
            SpinDirection::Up => "up",
            SpinDirection::Down => "down",
        }
    }

    /// `+1.0` for up, `-1.0` for down.
    pub fn sign(self) -> f64 {
        match self {
            SpinDirection::Up => 1.0,
            SpinDirection::Down => -1.0,
        }
    }

    pub fn opposite(self) -> Self {
        match self {
            SpinDirection::Up => SpinDirection::Down,
            SpinDirection::Down => SpinDirection::Up,
        }
    }
}

/// Lifetime token of one resolved settings value.
///
/// Bumped every time settings are replaced; anything that captured an older
/// generation must abandon itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Generation(pub u64);

impl Generation {
    pub const INITIAL: Generation = Generation(0);

    pub fn next(self) -> Self {
        Generation(self.0.wrapping_add(1))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn direction_sign_and_opposite() {
        assert_eq!(SpinDirection::Up.sign(), 1.0);
        assert_eq!(SpinDirection::Down.sign(), -1.0);
        assert_eq!(SpinDirection::Up.opposite(), SpinDirection::Down);
    }

    #[test]
    fn generation_advances() {
        let g = Generation::INITIAL;
        assert_eq!(g.next(), Generation(1));
        assert!(g.next() > g);
    }
}
