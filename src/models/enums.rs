use crate::db::DatabaseError;
use serde::{Deserialize, Serialize};

/// Macro to generate enum with as_str + std::str::FromStr pattern
macro_rules! str_enum {
    ($name:ident { $($variant:ident => $s:literal),+ $(,)? }) => {
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_str(&self) -> &'static str {
                match self {
                    $(Self::$variant => $s),+
                }
            }
        }

        impl std::str::FromStr for $name {
            type Err = DatabaseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($s => Ok(Self::$variant)),+,
                    _ => Err(DatabaseError::InvalidEnum {
                        field: stringify!($name).into(),
                        value: s.into(),
                    }),
                }
            }
        }
    };
}

// Which directory a token subject must resolve in.
str_enum!(Role {
    Admin => "admin",
    Doctor => "doctor",
    Patient => "patient",
});

// Patient-side appointment filter. Past maps to completed, future to scheduled.
str_enum!(VisitCondition {
    Past => "past",
    Future => "future",
});

impl Role {
    /// Case-insensitive parse of a role label. Unknown labels yield `None`.
    pub fn parse_label(label: &str) -> Option<Self> {
        label.to_ascii_lowercase().parse().ok()
    }
}

impl VisitCondition {
    /// Anything other than "past" (any case) is treated as future.
    pub fn from_label(label: &str) -> Self {
        if label.eq_ignore_ascii_case("past") {
            Self::Past
        } else {
            Self::Future
        }
    }

    /// Appointment status code this condition selects.
    pub fn status(self) -> i32 {
        match self {
            Self::Past => super::appointment::STATUS_COMPLETED,
            Self::Future => super::appointment::STATUS_SCHEDULED,
        }
    }
}
