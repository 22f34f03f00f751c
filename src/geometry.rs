use std::str::FromStr;

/// Which screen edge a position is measured from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Anchor {
    /// Left or top edge.
    #[default]
    Near,
    /// Right or bottom edge.
    Far,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Unit {
    #[default]
    Absolute,
    /// Percent of the reference size.
    Percent,
}

/// One axis value, written on the command line as `[+|-]N[%]`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeometrySpec {
    pub magnitude: i32,
    pub anchor: Anchor,
    pub unit: Unit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum GeometryError {
    #[error("invalid geometry value `{0}`, expected [+|-]N[%]")]
    Malformed(String),

    #[error("too many geometry values, expected at most x,y,translate-x,translate-y")]
    TooMany,
}

impl GeometrySpec {
    pub const fn absolute(magnitude: i32, anchor: Anchor) -> Self {
        Self {
            magnitude,
            anchor,
            unit: Unit::Absolute,
        }
    }

    pub const fn percent(magnitude: i32, anchor: Anchor) -> Self {
        Self {
            magnitude,
            anchor,
            unit: Unit::Percent,
        }
    }

    /// The magnitude in pixels, before the anchor is applied.
    pub fn scaled(&self, reference: i32) -> i32 {
        match self.unit {
            Unit::Absolute => self.magnitude,
            Unit::Percent => (f64::from(self.magnitude) / 100.0 * f64::from(reference)) as i32,
        }
    }

    /// Resolves a position along one axis. `subject` is the size of the thing being placed,
    /// which only matters for [Anchor::Far].
    pub fn resolve(&self, reference: i32, subject: i32) -> i32 {
        let scaled = self.scaled(reference);
        match self.anchor {
            Anchor::Near => scaled,
            Anchor::Far => reference.saturating_sub(scaled).saturating_sub(subject),
        }
    }

    /// Resolves a relative nudge: the far anchor flips the direction instead of measuring
    /// from the opposite edge.
    pub fn offset(&self, reference: i32) -> i32 {
        let scaled = self.scaled(reference);
        match self.anchor {
            Anchor::Near => scaled,
            Anchor::Far => scaled.saturating_neg(),
        }
    }
}

impl FromStr for GeometrySpec {
    type Err = GeometryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = || GeometryError::Malformed(s.to_string());

        let (anchor, rest) = match s.as_bytes().first() {
            Some(b'-') => (Anchor::Far, &s[1..]),
            Some(b'+') => (Anchor::Near, &s[1..]),
            _ => (Anchor::Near, s),
        };
        let (digits, unit) = match rest.strip_suffix('%') {
            Some(digits) => (digits, Unit::Percent),
            None => (rest, Unit::Absolute),
        };
        if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
            return Err(malformed());
        }
        let magnitude = digits.parse().map_err(|_| malformed())?;

        Ok(Self {
            magnitude,
            anchor,
            unit,
        })
    }
}

/// Anchor-then-translate placement for one axis.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AxisPlacement {
    pub position: GeometrySpec,
    pub translate: GeometrySpec,
}

impl AxisPlacement {
    /// The window origin on this axis: `position` against the screen, then `translate`
    /// against the window itself.
    pub fn origin(&self, screen: i32, window: i32) -> i32 {
        self.position
            .resolve(screen, window)
            .saturating_add(self.translate.offset(window))
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Placement {
    pub x: AxisPlacement,
    pub y: AxisPlacement,
}

impl Placement {
    pub fn origin(&self, screen: (u32, u32), window: (u32, u32)) -> (i32, i32) {
        (
            self.x.origin(clamp(screen.0), clamp(window.0)),
            self.y.origin(clamp(screen.1), clamp(window.1)),
        )
    }
}

fn clamp(v: u32) -> i32 {
    i32::try_from(v).unwrap_or(i32::MAX)
}

impl FromStr for Placement {
    type Err = GeometryError;

    /// Parses `x,y,translate-x,translate-y`. Empty fields keep their default.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut placement = Placement::default();
        for (i, field) in s.split(',').enumerate() {
            let slot = match i {
                0 => &mut placement.x.position,
                1 => &mut placement.y.position,
                2 => &mut placement.x.translate,
                3 => &mut placement.y.translate,
                _ => return Err(GeometryError::TooMany),
            };
            if !field.is_empty() {
                *slot = field.parse()?;
            }
        }
        Ok(placement)
    }
}
