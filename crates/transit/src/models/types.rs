//! Core enums and error types.

// ============================================================================
// Lines
// ============================================================================

/// The eight 'L' lines plus an explicit unknown variant.
///
/// Declaration order is load-bearing: equal-time arrivals are tie-broken by
/// this order when sorting for display.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Line {
    Red,
    Blue,
    Brown,
    Green,
    Orange,
    Pink,
    Purple,
    Yellow,
    Unknown,
}

impl Line {
    pub const ALL: [Line; 8] = [
        Line::Red,
        Line::Blue,
        Line::Brown,
        Line::Green,
        Line::Orange,
        Line::Pink,
        Line::Purple,
        Line::Yellow,
    ];

    /// Map the live feed's `rt` code. Distinct from the display-name mapping.
    ///
    /// Unrecognized codes collapse to [`Line::Unknown`] so a new or garbled
    /// route code never drops the record.
    pub fn from_feed_code(code: &str) -> Self {
        match code.trim() {
            "Red" => Line::Red,
            "Blue" => Line::Blue,
            "Brn" => Line::Brown,
            "G" => Line::Green,
            "Org" => Line::Orange,
            "Pink" => Line::Pink,
            "P" => Line::Purple,
            "Y" => Line::Yellow,
            _ => Line::Unknown,
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Line::Red => "Red Line",
            Line::Blue => "Blue Line",
            Line::Brown => "Brown Line",
            Line::Green => "Green Line",
            Line::Orange => "Orange Line",
            Line::Pink => "Pink Line",
            Line::Purple => "Purple Line",
            Line::Yellow => "Yellow Line",
            Line::Unknown => "N/A",
        }
    }

    /// Hex RGB color used by the map and list UIs.
    pub fn color(&self) -> &'static str {
        match self {
            Line::Red => "#C60C30",
            Line::Blue => "#00A1DE",
            Line::Brown => "#62361B",
            Line::Green => "#009B3A",
            Line::Orange => "#F9461C",
            Line::Pink => "#E27EA6",
            Line::Purple => "#522398",
            Line::Yellow => "#F9E300",
            Line::Unknown => "#000000",
        }
    }
}

// ============================================================================
// Directions
// ============================================================================

/// Platform / service direction.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    North,
    South,
    East,
    West,
}

impl Direction {
    /// Single-letter code used by the reference dataset.
    pub fn from_short_code(code: &str) -> Option<Self> {
        match code.trim() {
            "N" => Some(Direction::North),
            "S" => Some(Direction::South),
            "E" => Some(Direction::East),
            "W" => Some(Direction::West),
            _ => None,
        }
    }

    /// Loose match for the bus feed's bound strings ("North Bound",
    /// "NORTHBOUND", ...). Case-insensitive substring test.
    pub fn from_feed_text(text: &str) -> Result<Self> {
        let lowered = text.to_lowercase();
        if lowered.contains("north") {
            Ok(Direction::North)
        } else if lowered.contains("south") {
            Ok(Direction::South)
        } else if lowered.contains("east") {
            Ok(Direction::East)
        } else if lowered.contains("west") {
            Ok(Direction::West)
        } else {
            Err(TransitError::UnrecognizedDirection(text.to_string()))
        }
    }

    pub fn short_code(&self) -> &'static str {
        match self {
            Direction::North => "N",
            Direction::South => "S",
            Direction::East => "E",
            Direction::West => "W",
        }
    }

    pub fn display_text(&self) -> &'static str {
        match self {
            Direction::North => "North",
            Direction::South => "South",
            Direction::East => "East",
            Direction::West => "West",
        }
    }
}

// ============================================================================
// Errors
// ============================================================================

#[derive(Debug, thiserror::Error)]
pub enum TransitError {
    /// Transport failure from the connector. Retry policy, if any, belongs
    /// to the connector or its caller.
    #[error("connection failed: {0}")]
    Connection(String),

    /// The feed document itself is malformed; the whole fetch is aborted.
    #[error("feed unparseable: {0}")]
    FeedParse(String),

    /// One field of one record is unparseable. Absorbed inside the parser
    /// (field left unset, record kept), never propagated past it.
    #[error("bad value {value:?} for field {field}")]
    FieldParse { field: &'static str, value: String },

    /// The bundled reference dataset is missing or unreadable. Unlike a
    /// transient network failure, no retry will fix this.
    #[error("reference dataset unavailable: {0}")]
    DataLoad(String),

    /// A direction string from the bus feed matched no known bound.
    #[error("unrecognized direction {0:?}")]
    UnrecognizedDirection(String),
}

pub type Result<T> = std::result::Result<T, TransitError>;
