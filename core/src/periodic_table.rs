use std::{fmt, str::FromStr};

use serde::{Serialize, Serializer};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ElementError {
    #[error("unknown element symbol '{0}'")]
    UnknownSymbol(String),
    #[error("no element with atomic number {0}")]
    UnknownAtomicNumber(u32),
}

macro_rules! periodic_table {
    ($($element:ident = $number:literal),* $(,)?) => {
        /// A chemical element. The discriminant is the atomic number.
        #[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u32)]
        pub enum ElementType {
            $($element = $number),*
        }

        impl ElementType {
            pub fn symbol(&self) -> &'static str {
                match self {
                    $(Self::$element => stringify!($element)),*
                }
            }

            /// Looks up an element by its symbol, ignoring case (structure files often
            /// write `CL`). Atomic numbers are rejected.
            pub fn from_symbol(symbol: &str) -> Result<Self, ElementError> {
                let trimmed = symbol.trim();
                $(
                    if trimmed.eq_ignore_ascii_case(stringify!($element)) {
                        return Ok(Self::$element);
                    }
                )*
                Err(ElementError::UnknownSymbol(trimmed.to_owned()))
            }
        }

        impl TryFrom<u32> for ElementType {
            type Error = ElementError;

            fn try_from(value: u32) -> Result<Self, Self::Error> {
                match value {
                    $($number => Ok(Self::$element),)*
                    other => Err(ElementError::UnknownAtomicNumber(other)),
                }
            }
        }

        impl FromStr for ElementType {
            type Err = ElementError;

            /// Parses an element symbol or an atomic number (basis set exchange files key
            /// elements by `"8"`).
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim().parse::<u32>() {
                    Ok(number) => Self::try_from(number),
                    Err(_) => Self::from_symbol(s),
                }
            }
        }
    };
}

periodic_table! {
    H = 1, He = 2,
    Li = 3, Be = 4, B = 5, C = 6, N = 7, O = 8, F = 9, Ne = 10,
    Na = 11, Mg = 12, Al = 13, Si = 14, P = 15, S = 16, Cl = 17, Ar = 18,
    K = 19, Ca = 20, Sc = 21, Ti = 22, V = 23, Cr = 24, Mn = 25, Fe = 26, Co = 27, Ni = 28,
    Cu = 29, Zn = 30, Ga = 31, Ge = 32, As = 33, Se = 34, Br = 35, Kr = 36,
}

impl ElementType {
    pub fn atomic_number(&self) -> u32 {
        *self as u32
    }
}

impl fmt::Display for ElementType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

impl Serialize for ElementType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.symbol())
    }
}
